//! Fight Core - deterministic combat simulation for a two-character fighter
//!
//! - Input buffering and special-move matching
//! - Character state machine, physics, and hit resolution
//! - Fixed-timestep clock driven by a render callback
//! - Round flow, CPU opponents, and collaborator seams for rendering and audio

pub mod app;
pub mod config;
pub mod game;
pub mod host;
pub mod store;
pub mod util;

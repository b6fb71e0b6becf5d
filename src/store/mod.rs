//! Static game data loaded at startup

pub mod roster;

pub use roster::{Roster, RosterError};

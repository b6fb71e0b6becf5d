//! Application wiring

pub mod session;
pub mod state;

pub use session::{FrameReport, GameSession};
pub use state::AppState;

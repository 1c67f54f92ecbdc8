//! Study log application library
//!
//! This library provides functionality for logging study sessions, tracking
//! experience-point levels, keeping a rich-text journal grouped by date, and
//! running a break timer, all backed by flat files in a data folder.

mod break_timer;
mod cli;
mod config;
mod errors;
mod helper;
mod journal;
mod progression;
mod session;
mod storage;
mod subjects;
mod types;

// Re-export key components
pub use break_timer::*;
pub use cli::*;
pub use config::*;
pub use errors::*;
pub use helper::*;
pub use journal::*;
pub use progression::*;
pub use session::*;
pub use storage::*;
pub use subjects::*;
pub use types::*;

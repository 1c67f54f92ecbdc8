//! Command-line front end: argument parsing, the command dispatcher and the
//! terminal side of the break timer.
mod alarm;
mod app;
mod args;
mod editor;

pub use alarm::TerminalAlarm;
pub use app::{choose_data_dir, resolve_config, App};
pub use args::Cli;

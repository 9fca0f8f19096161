//! applecal command-line interface.
//!
//! Maps a command onto [`AppleCalendarProvider`](applecal_providers::AppleCalendarProvider)
//! and prints the result as JSON.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};

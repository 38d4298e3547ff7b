//! Command-line interface for the story tools.

mod commands;
mod helpers;
pub mod progress;

pub use commands::{is_verbose, run};

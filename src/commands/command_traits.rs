//! Command pattern interfaces
//!
//! This module defines the core Command pattern interfaces
//! for the CLI application, enabling a clean separation of concerns.

use crate::config::Config;
use crate::tiff::errors::TiffResult;

/// Represents an executable command in the application
pub trait Command {
    /// Execute the command
    fn execute(&self) -> TiffResult<()>;
}

/// Factory for creating commands from CLI arguments
///
/// Implementations inspect the parsed arguments and pick the command to
/// run, sharing the loaded configuration with it.
pub trait CommandFactory<'a> {
    fn create_command(&self, args: &clap::ArgMatches, config: &'a Config) -> TiffResult<Box<dyn Command + 'a>>;
}

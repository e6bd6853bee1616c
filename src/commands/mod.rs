//! CLI command implementations
//!
//! This module contains implementations of the commands supported by
//! the CLI application using the Command pattern.

pub mod command_traits;
pub mod analyze_command;
pub mod rewrite_command;

pub use command_traits::{Command, CommandFactory};
pub use analyze_command::AnalyzeCommand;
pub use rewrite_command::RewriteCommand;

use clap::ArgMatches;
use crate::config::Config;
use crate::tiff::errors::TiffResult;

/// Options that turn an analysis into a rewrite
const REWRITE_OPTIONS: [&str; 5] = ["rewrite", "edit", "set", "remove-tag", "remove-page"];

/// Factory for creating command instances based on CLI arguments
#[derive(Default)]
pub struct IfdkitCommandFactory;

impl IfdkitCommandFactory {
    pub fn new() -> Self {
        IfdkitCommandFactory
    }
}

impl<'a> CommandFactory<'a> for IfdkitCommandFactory {
    fn create_command(&self, args: &ArgMatches, config: &'a Config) -> TiffResult<Box<dyn Command + 'a>> {
        let rewrite = REWRITE_OPTIONS
            .iter()
            .any(|id| args.contains_id(id));

        if rewrite {
            Ok(Box::new(RewriteCommand::new(args, config)?))
        } else {
            // Default to analyze command
            Ok(Box::new(AnalyzeCommand::new(args, config)?))
        }
    }
}

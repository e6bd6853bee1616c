//! Rewrite and edit command
//!
//! Reads a file, applies the requested metadata edits, relocates the pixel
//! data and writes a fresh file. The output is first written to a
//! temporary file next to the destination and only renamed into place
//! after the whole write succeeded, so an input can be edited in place.

use clap::ArgMatches;
use log::{debug, info, warn};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::commands::command_traits::Command;
use crate::config::Config;
use crate::io::byte_order::ByteOrder;
use crate::tiff::edits::{parse_set_argument, parse_tag, EditOperation, EditScript};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::{TiffReader, TiffWriter};

/// Command for rewriting a TIFF file, optionally editing it
pub struct RewriteCommand<'a> {
    input_file: String,
    output_file: String,
    byte_order: Option<ByteOrder>,
    script: EditScript,
    config: &'a Config,
}

/// Collects the edits given on the command line into one script
pub fn script_from_args(args: &ArgMatches) -> TiffResult<EditScript> {
    let mut script = match args.get_one::<String>("edit") {
        Some(path) => EditScript::load(path)?,
        None => EditScript::new(),
    };

    if let Some(values) = args.get_many::<String>("set") {
        for value in values {
            script.push(EditOperation::SetField {
                page: None,
                field: parse_set_argument(value)?,
            });
        }
    }

    if let Some(values) = args.get_many::<String>("remove-tag") {
        for value in values {
            script.push(EditOperation::RemoveField {
                page: None,
                tag: parse_tag(value)?,
            });
        }
    }

    if let Some(values) = args.get_many::<String>("remove-page") {
        let pages = values
            .map(|v| {
                v.trim()
                    .parse::<usize>()
                    .map_err(|_| TiffError::InvalidConfig(format!("Invalid page index: {}", v)))
            })
            .collect::<TiffResult<Vec<usize>>>()?;
        script.push(EditOperation::RemovePages(pages));
    }

    Ok(script)
}

/// Sibling path the output is written to before it is renamed into place
fn temporary_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".ifdkit-tmp");
    output.with_file_name(name)
}

impl<'a> RewriteCommand<'a> {
    pub fn new(args: &ArgMatches, config: &'a Config) -> TiffResult<Self> {
        let input_file = args
            .get_one::<String>("input")
            .ok_or_else(|| TiffError::GenericError("Missing input file".to_string()))?
            .clone();

        // Edits without an explicit output rewrite the input in place
        let output_file = args
            .get_one::<String>("rewrite")
            .cloned()
            .unwrap_or_else(|| input_file.clone());

        let byte_order = match args.get_one::<String>("byte-order") {
            Some(name) => Some(ByteOrder::from_name(name)?),
            None => config.output_byte_order,
        };

        Ok(RewriteCommand {
            input_file,
            output_file,
            byte_order,
            script: script_from_args(args)?,
            config,
        })
    }

    fn write_output(&self, temp_path: &Path) -> TiffResult<()> {
        let reader = TiffReader::with_options(self.config.read);
        let mut source = BufReader::with_capacity(1024 * 1024, File::open(&self.input_file)?);
        let mut tiff = reader.read(&mut source)?;

        if !self.script.is_empty() {
            self.script.apply(&mut tiff)?;
        }
        if tiff.page_count() == 0 {
            return Err(TiffError::GenericError("Refusing to write a TIFF without pages".to_string()));
        }

        let mut writer = TiffWriter::new().with_progress(self.config.show_progress);
        if let Some(byte_order) = self.byte_order {
            writer = writer.with_byte_order(byte_order);
        }

        let mut output = BufWriter::with_capacity(1024 * 1024, File::create(temp_path)?);
        let written = writer.write(&tiff, &mut source, &mut output)?;
        debug!("Wrote {} page(s)", written.page_count());
        Ok(())
    }
}

impl<'a> Command for RewriteCommand<'a> {
    fn execute(&self) -> TiffResult<()> {
        info!("Rewriting {} to {}", self.input_file, self.output_file);

        let output = Path::new(&self.output_file);
        let temp_path = temporary_path(output);

        if let Err(e) = self.write_output(&temp_path) {
            if temp_path.exists() {
                if let Err(cleanup) = fs::remove_file(&temp_path) {
                    warn!("Could not remove {}: {}", temp_path.display(), cleanup);
                }
            }
            return Err(e);
        }

        fs::rename(&temp_path, output)?;
        info!("Wrote {}", self.output_file);
        Ok(())
    }
}

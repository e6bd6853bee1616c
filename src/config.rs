//! Runtime configuration
//!
//! Settings are read from an optional TOML file; every key is optional
//! and falls back to the built-in defaults.
//!
//! ```toml
//! [read]
//! max_directories = 1024
//! max_depth = 8
//!
//! [write]
//! byte_order = "mm"
//! progress = true
//! ```

use log::debug;
use std::fs;
use std::path::Path;

use crate::io::byte_order::ByteOrder;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::reader::ReadOptions;
use crate::tiff::validation::validate_range;

/// Upper bound accepted for `max_directories`
const MAX_DIRECTORY_LIMIT: usize = 1 << 20;

/// Upper bound accepted for `max_depth`
const MAX_DEPTH_LIMIT: usize = 64;

/// Settings shared by the commands
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    pub read: ReadOptions,
    /// Byte order of rewritten files, `None` keeps the input's
    pub output_byte_order: Option<ByteOrder>,
    pub show_progress: bool,
}

fn get_usize(table: &toml::Table, key: &str, default: usize) -> TiffResult<usize> {
    match table.get(key) {
        None => Ok(default),
        Some(toml::Value::Integer(i)) => {
            usize::try_from(*i).map_err(|_| TiffError::InvalidConfig(format!("'{}' must not be negative", key)))
        }
        Some(other) => Err(TiffError::InvalidConfig(format!("'{}' must be an integer, got {}", key, other))),
    }
}

fn section<'t>(document: &'t toml::Table, name: &str) -> TiffResult<Option<&'t toml::Table>> {
    match document.get(name) {
        None => Ok(None),
        Some(toml::Value::Table(table)) => Ok(Some(table)),
        Some(_) => Err(TiffError::InvalidConfig(format!("[{}] must be a table", name))),
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> TiffResult<Self> {
        let document: toml::Table = content
            .parse()
            .map_err(|e| TiffError::InvalidConfig(format!("Failed to parse TOML: {}", e)))?;

        let mut config = Config::default();

        if let Some(read) = section(&document, "read")? {
            let defaults = ReadOptions::default();
            config.read.max_directories = get_usize(read, "max_directories", defaults.max_directories)?;
            config.read.max_depth = get_usize(read, "max_depth", defaults.max_depth)?;
        }

        if let Some(write) = section(&document, "write")? {
            if let Some(name) = write.get("byte_order") {
                let name = name
                    .as_str()
                    .ok_or_else(|| TiffError::InvalidConfig("'byte_order' must be a string".to_string()))?;
                config.output_byte_order = Some(ByteOrder::from_name(name)?);
            }
            if let Some(progress) = write.get("progress") {
                config.show_progress = progress
                    .as_bool()
                    .ok_or_else(|| TiffError::InvalidConfig("'progress' must be true or false".to_string()))?;
            }
        }

        config.validate()?;
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> TiffResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> TiffResult<()> {
        validate_range(self.read.max_directories, 1, MAX_DIRECTORY_LIMIT, "max_directories")?;
        validate_range(self.read.max_depth, 0, MAX_DEPTH_LIMIT, "max_depth")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.read.max_directories, 1024);
        assert_eq!(config.read.max_depth, 8);
    }

    #[test]
    fn test_sections_are_read() {
        let config = Config::from_toml_str(
            r#"
            [read]
            max_depth = 2

            [write]
            byte_order = "MM"
            progress = true
            "#,
        )
        .unwrap();

        assert_eq!(config.read.max_depth, 2);
        assert_eq!(config.read.max_directories, 1024);
        assert_eq!(config.output_byte_order, Some(ByteOrder::BigEndian));
        assert!(config.show_progress);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_toml_str("[read]\nmax_directories = 0").is_err());
        assert!(Config::from_toml_str("[read]\nmax_depth = -1").is_err());
        assert!(Config::from_toml_str("[write]\nbyte_order = \"sideways\"").is_err());
        assert!(Config::from_toml_str("read = 3").is_err());
    }
}

//! Custom error types for TIFF processing

use std::fmt;
use std::io;

/// TIFF-specific error types
#[derive(Debug)]
pub enum TiffError {
    /// I/O error
    IoError(io::Error),
    /// Invalid byte order marker
    InvalidByteOrder(u16),
    /// Header magic is not 42
    InvalidMagic(u16),
    /// Recognised but unsupported TIFF version (BigTIFF)
    UnsupportedVersion(u16),
    /// Tag not found
    TagNotFound(u16),
    /// An offset points outside of the stream
    InvalidOffset { offset: u64, file_size: u64 },
    /// A directory offset was reached twice while reading
    CyclicDirectory(u32),
    /// Sub-IFD nesting exceeded the configured depth
    DepthLimitExceeded(usize),
    /// Page index outside of the page list
    PageOutOfRange { index: usize, count: usize },
    /// Image geometry tags are missing or inconsistent
    InvalidGeometry(String),
    /// A value does not fit the 32-bit offsets of classic TIFF
    ValueOutOfRange(u64),
    /// Image dimensions not found
    MissingDimensions,
    /// Malformed edit script or configuration file
    InvalidConfig(String),
    /// Generic error with message
    GenericError(String),
}

impl fmt::Display for TiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TiffError::IoError(e) => write!(f, "I/O error: {}", e),
            TiffError::InvalidByteOrder(v) => write!(f, "Invalid byte order marker: {:#06x}", v),
            TiffError::InvalidMagic(v) => write!(f, "Invalid TIFF magic number: {} (expected 42)", v),
            TiffError::UnsupportedVersion(v) => write!(f, "Unsupported TIFF version: {}", v),
            TiffError::TagNotFound(tag) => write!(f, "Tag not found: {}", tag),
            TiffError::InvalidOffset { offset, file_size } => {
                write!(f, "Invalid offset: {} (file size: {})", offset, file_size)
            }
            TiffError::CyclicDirectory(offset) => {
                write!(f, "Directory at offset {} was already visited", offset)
            }
            TiffError::DepthLimitExceeded(depth) => {
                write!(f, "Sub-IFD nesting deeper than {} levels", depth)
            }
            TiffError::PageOutOfRange { index, count } => {
                write!(f, "Page index {} out of range (page count: {})", index, count)
            }
            TiffError::InvalidGeometry(msg) => write!(f, "Invalid image geometry: {}", msg),
            TiffError::ValueOutOfRange(v) => write!(f, "Value {} does not fit in 32 bits", v),
            TiffError::MissingDimensions => write!(f, "Image dimensions not found"),
            TiffError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            TiffError::GenericError(msg) => write!(f, "TIFF error: {}", msg),
        }
    }
}

impl std::error::Error for TiffError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TiffError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TiffError {
    fn from(error: io::Error) -> Self {
        TiffError::IoError(error)
    }
}

/// Result type for TIFF operations
pub type TiffResult<T> = Result<T, TiffError>;

impl From<String> for TiffError {
    fn from(msg: String) -> Self {
        TiffError::GenericError(msg)
    }
}

/// Converts a stream position to a classic TIFF 32-bit offset
pub fn to_offset(position: u64) -> TiffResult<u32> {
    u32::try_from(position).map_err(|_| TiffError::ValueOutOfRange(position))
}

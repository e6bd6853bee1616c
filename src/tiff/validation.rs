//! TIFF validation utilities
//!
//! Bounds checks applied to offsets and user supplied limits before they
//! are trusted.

use std::io::SeekFrom;

use crate::io::seekable::SeekableReader;
use crate::tiff::constants::header;
use crate::tiff::errors::{TiffError, TiffResult};

/// Validates an IFD offset against the header size and the stream length
pub fn validate_ifd_offset(offset: u32, file_size: u64) -> TiffResult<()> {
    let position = offset as u64;
    if position >= file_size || offset < header::HEADER_SIZE {
        return Err(TiffError::InvalidOffset {
            offset: position,
            file_size,
        });
    }

    Ok(())
}

/// Gets the stream length, restoring the current position
pub fn get_file_size(reader: &mut dyn SeekableReader) -> TiffResult<u64> {
    let current_position = reader.stream_position()?;
    let file_size = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(current_position))?;

    Ok(file_size)
}

/// Validates a numeric setting to ensure it's within bounds
pub fn validate_range<T>(value: T, min: T, max: T, name: &str) -> TiffResult<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(TiffError::InvalidConfig(format!(
            "Invalid {}: {} (must be between {} and {})",
            name, value, min, max
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read, Seek};

    #[test]
    fn test_offsets_inside_header_are_rejected() {
        assert!(validate_ifd_offset(4, 100).is_err());
        assert!(validate_ifd_offset(8, 100).is_ok());
        assert!(validate_ifd_offset(100, 100).is_err());
    }

    #[test]
    fn test_file_size_keeps_position() {
        let mut cursor = Cursor::new(vec![0u8; 32]);
        cursor.set_position(5);
        assert_eq!(get_file_size(&mut cursor).unwrap(), 32);
        assert_eq!(cursor.position(), 5);
    }

    /// Stream whose end cannot be located
    struct Endless(Cursor<Vec<u8>>);

    impl Read for Endless {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.0.read(buf)
        }
    }

    impl Seek for Endless {
        fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
            match pos {
                SeekFrom::End(_) => Err(std::io::Error::new(std::io::ErrorKind::Unsupported, "no end")),
                other => self.0.seek(other),
            }
        }
    }

    #[test]
    fn test_file_size_error_is_returned() {
        let mut stream = Endless(Cursor::new(vec![0u8; 32]));
        assert!(matches!(get_file_size(&mut stream), Err(TiffError::IoError(_))));
    }
}

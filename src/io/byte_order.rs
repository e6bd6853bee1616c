//! Byte order handling for TIFF files
//!
//! This module implements the Strategy pattern for handling different
//! byte orders (little-endian vs big-endian) when reading and writing
//! TIFF data. The strategy is picked once from the header marker and is
//! then threaded through every directory read and write.

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Result;

use crate::io::seekable::{SeekableReader, SeekableWriter};
use crate::tiff::constants::header;
use crate::tiff::errors::{TiffError, TiffResult};

/// Represents the byte order of a TIFF file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian byte order (II)
    LittleEndian,
    /// Big-endian byte order (MM)
    BigEndian,
}

impl ByteOrder {
    /// Detects the byte order from the TIFF header
    pub fn detect(reader: &mut dyn SeekableReader) -> TiffResult<Self> {
        // Both markers are palindromes, so the read order does not matter
        let byte_order = reader.read_u16::<LittleEndian>()?;
        match byte_order {
            0x4949 => Ok(ByteOrder::LittleEndian), // "II" (Intel)
            0x4D4D => Ok(ByteOrder::BigEndian),    // "MM" (Motorola)
            _ => Err(TiffError::InvalidByteOrder(byte_order)),
        }
    }

    /// Parses a user supplied byte order name ("ii", "mm", "little", "big")
    pub fn from_name(name: &str) -> TiffResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ii" | "little" | "le" => Ok(ByteOrder::LittleEndian),
            "mm" | "big" | "be" => Ok(ByteOrder::BigEndian),
            other => Err(TiffError::GenericError(format!("Unknown byte order: {}", other))),
        }
    }

    /// Returns a string representation of this byte order
    pub fn name(&self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "Little Endian (II)",
            ByteOrder::BigEndian => "Big Endian (MM)",
        }
    }

    /// The two marker bytes written at the start of a file
    pub fn marker(&self) -> [u8; 2] {
        match self {
            ByteOrder::LittleEndian => header::LITTLE_ENDIAN_MARKER,
            ByteOrder::BigEndian => header::BIG_ENDIAN_MARKER,
        }
    }

    pub fn is_big_endian(&self) -> bool {
        *self == ByteOrder::BigEndian
    }

    /// Creates the appropriate handler for this byte order
    pub fn create_handler(&self) -> Box<dyn ByteOrderHandler> {
        match self {
            ByteOrder::LittleEndian => Box::new(LittleEndianHandler),
            ByteOrder::BigEndian => Box::new(BigEndianHandler),
        }
    }
}

/// Trait for byte order handling strategies
///
/// Every multi-byte value that crosses the stream boundary goes through
/// one of these methods, so swapping the handler is all it takes to emit
/// the same directory tree in the other byte order.
pub trait ByteOrderHandler: Send + Sync {
    /// The byte order this handler implements
    fn byte_order(&self) -> ByteOrder;

    fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16>;

    fn read_i16(&self, reader: &mut dyn SeekableReader) -> Result<i16>;

    fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32>;

    fn read_i32(&self, reader: &mut dyn SeekableReader) -> Result<i32>;

    fn read_f32(&self, reader: &mut dyn SeekableReader) -> Result<f32>;

    fn read_f64(&self, reader: &mut dyn SeekableReader) -> Result<f64>;

    /// Read a rational value (two u32 values as numerator/denominator)
    fn read_rational(&self, reader: &mut dyn SeekableReader) -> Result<(u32, u32)> {
        let numerator = self.read_u32(reader)?;
        let denominator = self.read_u32(reader)?;
        Ok((numerator, denominator))
    }

    /// Read a signed rational value (two i32 values as numerator/denominator)
    fn read_srational(&self, reader: &mut dyn SeekableReader) -> Result<(i32, i32)> {
        let numerator = self.read_i32(reader)?;
        let denominator = self.read_i32(reader)?;
        Ok((numerator, denominator))
    }

    fn write_u16(&self, writer: &mut dyn SeekableWriter, value: u16) -> Result<()>;

    fn write_i16(&self, writer: &mut dyn SeekableWriter, value: i16) -> Result<()>;

    fn write_u32(&self, writer: &mut dyn SeekableWriter, value: u32) -> Result<()>;

    fn write_i32(&self, writer: &mut dyn SeekableWriter, value: i32) -> Result<()>;

    fn write_f32(&self, writer: &mut dyn SeekableWriter, value: f32) -> Result<()>;

    fn write_f64(&self, writer: &mut dyn SeekableWriter, value: f64) -> Result<()>;
}

macro_rules! byte_order_handler {
    ($handler:ident, $order:ty, $variant:expr) => {
        impl ByteOrderHandler for $handler {
            fn byte_order(&self) -> ByteOrder {
                $variant
            }

            fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16> {
                reader.read_u16::<$order>()
            }

            fn read_i16(&self, reader: &mut dyn SeekableReader) -> Result<i16> {
                reader.read_i16::<$order>()
            }

            fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32> {
                reader.read_u32::<$order>()
            }

            fn read_i32(&self, reader: &mut dyn SeekableReader) -> Result<i32> {
                reader.read_i32::<$order>()
            }

            fn read_f32(&self, reader: &mut dyn SeekableReader) -> Result<f32> {
                reader.read_f32::<$order>()
            }

            fn read_f64(&self, reader: &mut dyn SeekableReader) -> Result<f64> {
                reader.read_f64::<$order>()
            }

            fn write_u16(&self, writer: &mut dyn SeekableWriter, value: u16) -> Result<()> {
                writer.write_u16::<$order>(value)
            }

            fn write_i16(&self, writer: &mut dyn SeekableWriter, value: i16) -> Result<()> {
                writer.write_i16::<$order>(value)
            }

            fn write_u32(&self, writer: &mut dyn SeekableWriter, value: u32) -> Result<()> {
                writer.write_u32::<$order>(value)
            }

            fn write_i32(&self, writer: &mut dyn SeekableWriter, value: i32) -> Result<()> {
                writer.write_i32::<$order>(value)
            }

            fn write_f32(&self, writer: &mut dyn SeekableWriter, value: f32) -> Result<()> {
                writer.write_f32::<$order>(value)
            }

            fn write_f64(&self, writer: &mut dyn SeekableWriter, value: f64) -> Result<()> {
                writer.write_f64::<$order>(value)
            }
        }
    };
}

/// Little-endian byte order handler
pub struct LittleEndianHandler;

/// Big-endian byte order handler
pub struct BigEndianHandler;

byte_order_handler!(LittleEndianHandler, LittleEndian, ByteOrder::LittleEndian);
byte_order_handler!(BigEndianHandler, BigEndian, ByteOrder::BigEndian);

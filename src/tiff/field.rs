//! Typed TIFF fields
//!
//! A `TiffField` couples a tag with a typed value. The field knows its own
//! wire size and how to serialize itself either into the 4-byte value slot
//! of its directory entry or into the external data area of the directory.

use std::fmt;
use std::io::{Read, Seek, SeekFrom, Write};

use log::trace;

use crate::io::byte_order::ByteOrderHandler;
use crate::io::seekable::{SeekableReader, SeekableWriter};
use crate::tiff::constants::layout;
use crate::tiff::errors::{to_offset, TiffError, TiffResult};
use crate::tiff::field_type::FieldType;

/// Number of elements shown by `display_value` before eliding the rest
const DISPLAY_LIMIT: usize = 8;

/// The typed payload of a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Byte(Vec<u8>),
    /// Raw text bytes without the NUL terminator, not necessarily UTF-8
    Ascii(Vec<u8>),
    Short(Vec<u16>),
    Long(Vec<u32>),
    /// (numerator, denominator) pairs
    Rational(Vec<(u32, u32)>),
    SByte(Vec<i8>),
    Undefined(Vec<u8>),
    SShort(Vec<i16>),
    SLong(Vec<i32>),
    SRational(Vec<(i32, i32)>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    /// Offsets of sub-IFDs
    Ifd(Vec<u32>),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Byte(_) => FieldType::Byte,
            FieldValue::Ascii(_) => FieldType::Ascii,
            FieldValue::Short(_) => FieldType::Short,
            FieldValue::Long(_) => FieldType::Long,
            FieldValue::Rational(_) => FieldType::Rational,
            FieldValue::SByte(_) => FieldType::SByte,
            FieldValue::Undefined(_) => FieldType::Undefined,
            FieldValue::SShort(_) => FieldType::SShort,
            FieldValue::SLong(_) => FieldType::SLong,
            FieldValue::SRational(_) => FieldType::SRational,
            FieldValue::Float(_) => FieldType::Float,
            FieldValue::Double(_) => FieldType::Double,
            FieldValue::Ifd(_) => FieldType::Ifd,
        }
    }

    /// Number of logical elements; ASCII counts its terminator
    pub fn count(&self) -> usize {
        match self {
            FieldValue::Byte(v) | FieldValue::Undefined(v) => v.len(),
            FieldValue::Ascii(s) => s.len() + 1,
            FieldValue::Short(v) => v.len(),
            FieldValue::Long(v) | FieldValue::Ifd(v) => v.len(),
            FieldValue::Rational(v) => v.len(),
            FieldValue::SByte(v) => v.len(),
            FieldValue::SShort(v) => v.len(),
            FieldValue::SLong(v) => v.len(),
            FieldValue::SRational(v) => v.len(),
            FieldValue::Float(v) => v.len(),
            FieldValue::Double(v) => v.len(),
        }
    }

    /// Decodes `count` elements of `field_type` at the reader's position
    pub fn decode(
        field_type: FieldType,
        count: u32,
        reader: &mut dyn SeekableReader,
        handler: &dyn ByteOrderHandler,
    ) -> TiffResult<Self> {
        let n = count as usize;
        let value = match field_type {
            FieldType::Byte => FieldValue::Byte(read_bytes(reader, n)?),
            FieldType::Undefined => FieldValue::Undefined(read_bytes(reader, n)?),
            FieldType::SByte => {
                FieldValue::SByte(read_bytes(reader, n)?.into_iter().map(|b| b as i8).collect())
            }
            FieldType::Ascii => {
                let mut bytes = read_bytes(reader, n)?;
                while bytes.last() == Some(&0) {
                    bytes.pop();
                }
                FieldValue::Ascii(bytes)
            }
            FieldType::Short => {
                FieldValue::Short((0..n).map(|_| handler.read_u16(reader)).collect::<Result<_, _>>()?)
            }
            FieldType::SShort => {
                FieldValue::SShort((0..n).map(|_| handler.read_i16(reader)).collect::<Result<_, _>>()?)
            }
            FieldType::Long => {
                FieldValue::Long((0..n).map(|_| handler.read_u32(reader)).collect::<Result<_, _>>()?)
            }
            FieldType::Ifd => {
                FieldValue::Ifd((0..n).map(|_| handler.read_u32(reader)).collect::<Result<_, _>>()?)
            }
            FieldType::SLong => {
                FieldValue::SLong((0..n).map(|_| handler.read_i32(reader)).collect::<Result<_, _>>()?)
            }
            FieldType::Rational => FieldValue::Rational(
                (0..n).map(|_| handler.read_rational(reader)).collect::<Result<_, _>>()?,
            ),
            FieldType::SRational => FieldValue::SRational(
                (0..n).map(|_| handler.read_srational(reader)).collect::<Result<_, _>>()?,
            ),
            FieldType::Float => {
                FieldValue::Float((0..n).map(|_| handler.read_f32(reader)).collect::<Result<_, _>>()?)
            }
            FieldType::Double => {
                FieldValue::Double((0..n).map(|_| handler.read_f64(reader)).collect::<Result<_, _>>()?)
            }
            FieldType::Unknown => {
                return Err(TiffError::GenericError("Cannot decode a field of unknown type".to_string()))
            }
        };
        Ok(value)
    }

    /// Writes every element at the writer's position
    fn encode(&self, writer: &mut dyn SeekableWriter, handler: &dyn ByteOrderHandler) -> TiffResult<()> {
        match self {
            FieldValue::Byte(v) | FieldValue::Undefined(v) => writer.write_all(v)?,
            FieldValue::SByte(v) => {
                let bytes: Vec<u8> = v.iter().map(|&b| b as u8).collect();
                writer.write_all(&bytes)?;
            }
            FieldValue::Ascii(s) => {
                writer.write_all(s)?;
                writer.write_all(&[0])?;
            }
            FieldValue::Short(v) => {
                for &x in v {
                    handler.write_u16(writer, x)?;
                }
            }
            FieldValue::SShort(v) => {
                for &x in v {
                    handler.write_i16(writer, x)?;
                }
            }
            FieldValue::Long(v) | FieldValue::Ifd(v) => {
                for &x in v {
                    handler.write_u32(writer, x)?;
                }
            }
            FieldValue::SLong(v) => {
                for &x in v {
                    handler.write_i32(writer, x)?;
                }
            }
            FieldValue::Rational(v) => {
                for &(num, den) in v {
                    handler.write_u32(writer, num)?;
                    handler.write_u32(writer, den)?;
                }
            }
            FieldValue::SRational(v) => {
                for &(num, den) in v {
                    handler.write_i32(writer, num)?;
                    handler.write_i32(writer, den)?;
                }
            }
            FieldValue::Float(v) => {
                for &x in v {
                    handler.write_f32(writer, x)?;
                }
            }
            FieldValue::Double(v) => {
                for &x in v {
                    handler.write_f64(writer, x)?;
                }
            }
        }
        Ok(())
    }

    /// Unsigned integer view of BYTE/SHORT/LONG/IFD values
    pub fn as_u32_vec(&self) -> Option<Vec<u32>> {
        match self {
            FieldValue::Byte(v) | FieldValue::Undefined(v) => Some(v.iter().map(|&x| x as u32).collect()),
            FieldValue::Short(v) => Some(v.iter().map(|&x| x as u32).collect()),
            FieldValue::Long(v) | FieldValue::Ifd(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn display_value(&self) -> String {
        fn join<T: fmt::Display>(items: impl Iterator<Item = T>, total: usize) -> String {
            let mut shown: Vec<String> = items.take(DISPLAY_LIMIT).map(|x| x.to_string()).collect();
            if total > DISPLAY_LIMIT {
                shown.push(format!("... ({} more)", total - DISPLAY_LIMIT));
            }
            shown.join(", ")
        }

        match self {
            FieldValue::Ascii(s) => format!("\"{}\"", String::from_utf8_lossy(s)),
            FieldValue::Byte(v) | FieldValue::Undefined(v) => join(v.iter(), v.len()),
            FieldValue::SByte(v) => join(v.iter(), v.len()),
            FieldValue::Short(v) => join(v.iter(), v.len()),
            FieldValue::SShort(v) => join(v.iter(), v.len()),
            FieldValue::Long(v) | FieldValue::Ifd(v) => join(v.iter(), v.len()),
            FieldValue::SLong(v) => join(v.iter(), v.len()),
            FieldValue::Rational(v) => join(v.iter().map(|(n, d)| format!("{}/{}", n, d)), v.len()),
            FieldValue::SRational(v) => join(v.iter().map(|(n, d)| format!("{}/{}", n, d)), v.len()),
            FieldValue::Float(v) => join(v.iter(), v.len()),
            FieldValue::Double(v) => join(v.iter(), v.len()),
        }
    }
}

fn read_bytes(reader: &mut dyn SeekableReader, n: usize) -> TiffResult<Vec<u8>> {
    let mut buffer = vec![0u8; n];
    reader.read_exact(&mut buffer)?;
    Ok(buffer)
}

/// Where a field's value is placed by the writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// Packed into the entry's own value slot
    Inline,
    /// Written to the external data area, the slot holds its offset
    External,
}

/// A tagged value of a directory
#[derive(Debug, Clone, PartialEq)]
pub struct TiffField {
    tag: u16,
    value: FieldValue,
    data_offset: Option<u32>,
}

impl TiffField {
    pub fn new(tag: u16, value: FieldValue) -> Self {
        TiffField {
            tag,
            value,
            data_offset: None,
        }
    }

    pub fn byte(tag: u16, values: Vec<u8>) -> Self {
        Self::new(tag, FieldValue::Byte(values))
    }

    /// ASCII field; surrounding whitespace is trimmed and a single NUL is
    /// appended when written
    pub fn ascii(tag: u16, text: &str) -> Self {
        Self::new(tag, FieldValue::Ascii(text.trim().as_bytes().to_vec()))
    }

    pub fn short(tag: u16, values: Vec<u16>) -> Self {
        Self::new(tag, FieldValue::Short(values))
    }

    pub fn long(tag: u16, values: Vec<u32>) -> Self {
        Self::new(tag, FieldValue::Long(values))
    }

    pub fn rational(tag: u16, values: Vec<(u32, u32)>) -> Self {
        Self::new(tag, FieldValue::Rational(values))
    }

    pub fn undefined(tag: u16, values: Vec<u8>) -> Self {
        Self::new(tag, FieldValue::Undefined(values))
    }

    pub fn double(tag: u16, values: Vec<f64>) -> Self {
        Self::new(tag, FieldValue::Double(values))
    }

    pub fn ifd(tag: u16, offsets: Vec<u32>) -> Self {
        Self::new(tag, FieldValue::Ifd(offsets))
    }

    pub fn tag(&self) -> u16 {
        self.tag
    }

    pub fn field_type(&self) -> FieldType {
        self.value.field_type()
    }

    /// Number of logical elements (not bytes)
    pub fn count(&self) -> u32 {
        self.value.count() as u32
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Replaces the value; any offset recorded by a previous write is stale
    pub fn set_value(&mut self, value: FieldValue) {
        self.value = value;
        self.data_offset = None;
    }

    /// Where the value bytes were placed by the last write pass
    pub fn data_offset(&self) -> Option<u32> {
        self.data_offset
    }

    pub fn total_byte_length(&self) -> u64 {
        self.count() as u64 * self.field_type().element_width() as u64
    }

    /// Storage decision for this field
    ///
    /// Byte-like and SHORT types stay inline whenever they fit the slot.
    /// The 32-bit types are inline only for a single element, and the
    /// 8-byte types always go to the data area.
    pub fn storage(&self) -> Storage {
        match self.field_type() {
            FieldType::Byte
            | FieldType::SByte
            | FieldType::Undefined
            | FieldType::Ascii
            | FieldType::Short
            | FieldType::SShort => {
                if self.total_byte_length() <= layout::VALUE_SLOT_SIZE as u64 {
                    Storage::Inline
                } else {
                    Storage::External
                }
            }
            FieldType::Long | FieldType::SLong | FieldType::Float | FieldType::Ifd => {
                if self.count() == 1 {
                    Storage::Inline
                } else {
                    Storage::External
                }
            }
            FieldType::Rational | FieldType::SRational | FieldType::Double | FieldType::Unknown => {
                Storage::External
            }
        }
    }

    /// Writes the value for an entry whose value slot is at the writer's
    /// current position
    ///
    /// Inline values are packed into the slot and zero padded. External
    /// values are written at `value_offset` and the slot receives that
    /// offset. Returns the number of bytes consumed from the data area.
    pub fn serialize_value(
        &mut self,
        writer: &mut dyn SeekableWriter,
        handler: &dyn ByteOrderHandler,
        value_offset: u32,
    ) -> TiffResult<u32> {
        match self.storage() {
            Storage::Inline => {
                let slot = to_offset(writer.stream_position()?)?;
                self.value.encode(writer, handler)?;
                let used = self.total_byte_length() as usize;
                let padding = layout::VALUE_SLOT_SIZE as usize - used;
                if padding > 0 {
                    writer.write_all(&vec![0u8; padding])?;
                }
                self.data_offset = Some(slot);
                trace!("Tag {} written inline at {}", self.tag, slot);
                Ok(0)
            }
            Storage::External => {
                let length = to_offset(self.total_byte_length())?;
                to_offset(value_offset as u64 + length as u64)?;
                handler.write_u32(writer, value_offset)?;
                writer.seek(SeekFrom::Start(value_offset as u64))?;
                self.value.encode(writer, handler)?;
                self.data_offset = Some(value_offset);
                trace!("Tag {} written to data area at {} ({} bytes)", self.tag, value_offset, length);
                Ok(length)
            }
        }
    }

    /// Replaces element `index` of a LONG or IFD pointer field in place,
    /// keeping the recorded data offset
    pub(crate) fn set_pointer(&mut self, index: usize, offset: u32) {
        if let FieldValue::Long(v) | FieldValue::Ifd(v) = &mut self.value {
            if let Some(slot) = v.get_mut(index) {
                *slot = offset;
            }
        }
    }

    /// First element as an unsigned integer
    pub fn first_u32(&self) -> Option<u32> {
        self.value.as_u32_vec().and_then(|v| v.first().copied())
    }

    pub fn as_u32_vec(&self) -> Option<Vec<u32>> {
        self.value.as_u32_vec()
    }

    /// Text of an ASCII field, `None` when it is not valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            FieldValue::Ascii(s) => std::str::from_utf8(s).ok(),
            _ => None,
        }
    }

    /// Value rendered for diagnostics, long arrays are elided
    pub fn display_value(&self) -> String {
        self.value.display_value()
    }
}

impl fmt::Display for TiffField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{} x{}]: {}", self.tag, self.field_type(), self.count(), self.display_value())
    }
}

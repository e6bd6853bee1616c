//! TIFF field types
//!
//! The field type of a directory entry decides how its value bytes are
//! interpreted and how many bytes each element occupies on the wire.

use std::fmt;

use crate::tiff::constants::field_types;

/// Wire type of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Byte,
    Ascii,
    Short,
    Long,
    Rational,
    SByte,
    Undefined,
    SShort,
    SLong,
    SRational,
    Float,
    Double,
    /// LONG-sized offset to a sub-IFD
    Ifd,
    /// Any type code this engine does not know about
    Unknown,
}

impl FieldType {
    /// Resolves a wire type code; unknown codes map to `Unknown`
    pub fn from_wire_code(code: u16) -> Self {
        match code {
            field_types::BYTE => FieldType::Byte,
            field_types::ASCII => FieldType::Ascii,
            field_types::SHORT => FieldType::Short,
            field_types::LONG => FieldType::Long,
            field_types::RATIONAL => FieldType::Rational,
            field_types::SBYTE => FieldType::SByte,
            field_types::UNDEFINED => FieldType::Undefined,
            field_types::SSHORT => FieldType::SShort,
            field_types::SLONG => FieldType::SLong,
            field_types::SRATIONAL => FieldType::SRational,
            field_types::FLOAT => FieldType::Float,
            field_types::DOUBLE => FieldType::Double,
            field_types::IFD => FieldType::Ifd,
            _ => FieldType::Unknown,
        }
    }

    /// The code written into the entry's type slot (0 for `Unknown`)
    pub fn wire_code(&self) -> u16 {
        match self {
            FieldType::Byte => field_types::BYTE,
            FieldType::Ascii => field_types::ASCII,
            FieldType::Short => field_types::SHORT,
            FieldType::Long => field_types::LONG,
            FieldType::Rational => field_types::RATIONAL,
            FieldType::SByte => field_types::SBYTE,
            FieldType::Undefined => field_types::UNDEFINED,
            FieldType::SShort => field_types::SSHORT,
            FieldType::SLong => field_types::SLONG,
            FieldType::SRational => field_types::SRATIONAL,
            FieldType::Float => field_types::FLOAT,
            FieldType::Double => field_types::DOUBLE,
            FieldType::Ifd => field_types::IFD,
            FieldType::Unknown => 0,
        }
    }

    /// Size in bytes of one element of this type
    pub fn element_width(&self) -> u32 {
        match self {
            FieldType::Byte | FieldType::Ascii | FieldType::SByte | FieldType::Undefined => 1,
            FieldType::Short | FieldType::SShort => 2,
            FieldType::Long | FieldType::SLong | FieldType::Float | FieldType::Ifd => 4,
            FieldType::Rational | FieldType::SRational | FieldType::Double => 8,
            FieldType::Unknown => 0,
        }
    }

    /// Name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Byte => "BYTE",
            FieldType::Ascii => "ASCII",
            FieldType::Short => "SHORT",
            FieldType::Long => "LONG",
            FieldType::Rational => "RATIONAL",
            FieldType::SByte => "SBYTE",
            FieldType::Undefined => "UNDEFINED",
            FieldType::SShort => "SSHORT",
            FieldType::SLong => "SLONG",
            FieldType::SRational => "SRATIONAL",
            FieldType::Float => "FLOAT",
            FieldType::Double => "DOUBLE",
            FieldType::Ifd => "IFD",
            FieldType::Unknown => "UNKNOWN",
        }
    }

    /// Parses a lower or upper case type name as used in edit scripts
    pub fn from_name(name: &str) -> Option<Self> {
        let field_type = match name.to_ascii_uppercase().as_str() {
            "BYTE" => FieldType::Byte,
            "ASCII" => FieldType::Ascii,
            "SHORT" => FieldType::Short,
            "LONG" => FieldType::Long,
            "RATIONAL" => FieldType::Rational,
            "SBYTE" => FieldType::SByte,
            "UNDEFINED" => FieldType::Undefined,
            "SSHORT" => FieldType::SShort,
            "SLONG" => FieldType::SLong,
            "SRATIONAL" => FieldType::SRational,
            "FLOAT" => FieldType::Float,
            "DOUBLE" => FieldType::Double,
            "IFD" => FieldType::Ifd,
            _ => return None,
        };
        Some(field_type)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

//! TIFF directory engine
//!
//! Structures and functions for reading TIFF directory trees, editing
//! them and writing them back with every internal offset kept consistent.

pub mod errors;
pub mod constants;
pub mod field_type;
pub mod field;
pub mod tag_sets;
pub mod ifd;
pub mod types;
pub mod reader;
pub mod writer;
pub mod builder;
pub mod edits;
pub(crate) mod validation;
#[cfg(test)]
mod tests;

pub use crate::io::byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use builder::TiffBuilder;
pub use edits::{EditOperation, EditScript};
pub use errors::{TiffError, TiffResult};
pub use field::{FieldValue, Storage, TiffField};
pub use field_type::FieldType;
pub use ifd::IFD;
pub use reader::{DirectoryReader, ReadOptions, TiffReader};
pub use tag_sets::{get_tag_name, tag_set_for, TagSet};
pub use types::TIFF;
pub use writer::{DirectoryWriter, TiffWriter};

//! Strip and tile handling
//!
//! Geometry of the pixel data referenced by a page, byte order
//! transcoding of uncompressed samples, and relocation of the data when a
//! file is rewritten.

pub mod endian;
pub mod geometry;
pub mod relocate;

pub use endian::flip_sample_endianness;
pub use geometry::{expected_byte_counts, DataLayout, ImageGeometry};
pub use relocate::Relocator;

//! Seekable reader and writer traits
//!
//! The directory engine always works on random-access streams: offsets read
//! from one directory entry are followed with a seek, and the writer jumps
//! back to patch placeholders once their targets are known.

use std::io::{Read, Seek, Write};

/// Trait for readers that can both read and seek
///
/// This trait combines the Read and Seek traits so that the reader can be
/// passed around as a trait object.
pub trait SeekableReader: Read + Seek + Send + Sync {}

// Blanket implementation for any type that implements the required traits
impl<T: Read + Seek + Send + Sync> SeekableReader for T {}

/// Trait for writers that can both write and seek
///
/// Writing past the current end of the stream must zero-fill the gap, which
/// holds for files and for `Cursor<Vec<u8>>`.
pub trait SeekableWriter: Write + Seek + Send + Sync {}

impl<T: Write + Seek + Send + Sync> SeekableWriter for T {}

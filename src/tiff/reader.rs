//! TIFF file reader implementation
//!
//! `TiffReader` validates the header and hands the stream to a
//! `DirectoryReader`, which walks the chain of top-level IFDs and decodes
//! the sub-IFDs hanging off pointer fields. Damaged optional directories
//! are dropped instead of failing the whole file.

use log::{debug, info, trace, warn};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{header, layout, limits, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::field::{FieldValue, TiffField};
use crate::tiff::field_type::FieldType;
use crate::tiff::ifd::IFD;
use crate::tiff::types::TIFF;
use crate::tiff::validation;

/// Limits applied while following offsets found in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Maximum number of top-level directories in the chain
    pub max_directories: usize,
    /// Maximum nesting of sub-IFDs below a top-level directory
    pub max_depth: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            max_directories: limits::DEFAULT_MAX_DIRECTORIES,
            max_depth: limits::DEFAULT_MAX_DEPTH,
        }
    }
}

/// States of the top-level chain walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    AwaitDirectoryHeader { offset: u32 },
    ReadEntries { remaining: u16 },
    AwaitNextOffset,
    Done,
}

/// Whether a field points at sub-IFDs that should be decoded as children
fn is_sub_ifd_pointer(field: &TiffField) -> bool {
    let pointer_tag = matches!(
        field.tag(),
        tags::SUB_IFDS | tags::EXIF_SUB_IFD | tags::GPS_SUB_IFD | tags::INTEROPERABILITY_SUB_IFD
    );

    match field.field_type() {
        FieldType::Ifd => true,
        FieldType::Long => pointer_tag,
        _ => false,
    }
}

/// Reads IFD chains and sub-IFD trees from one stream
pub struct DirectoryReader<'h> {
    handler: &'h dyn ByteOrderHandler,
    options: ReadOptions,
    file_size: u64,
    visited: HashSet<u32>,
}

impl<'h> DirectoryReader<'h> {
    pub fn new(handler: &'h dyn ByteOrderHandler, options: ReadOptions, file_size: u64) -> Self {
        DirectoryReader {
            handler,
            options,
            file_size,
            visited: HashSet::new(),
        }
    }

    /// Reads the chain of top-level IFDs starting at `first_offset`
    ///
    /// The first directory must be readable. Later directories that are
    /// out of range, repeat an earlier offset or exceed the directory
    /// limit end the chain with a warning, keeping the pages read so far.
    pub fn read_chain(&mut self, reader: &mut dyn SeekableReader, first_offset: u32) -> TiffResult<Vec<IFD>> {
        let mut pages: Vec<IFD> = Vec::new();
        let mut current = IFD::new();
        let mut state = ReadState::AwaitDirectoryHeader { offset: first_offset };

        loop {
            state = match state {
                ReadState::AwaitDirectoryHeader { offset } => {
                    if pages.len() >= self.options.max_directories {
                        warn!("Stopping IFD chain after {} directories", pages.len());
                        ReadState::Done
                    } else if !self.visited.insert(offset) {
                        warn!("IFD chain loops back to offset {}, stopping", offset);
                        ReadState::Done
                    } else {
                        match self.read_directory_header(reader, offset) {
                            Ok(count) => {
                                debug!("Reading IFD #{} at offset {} ({} entries)", pages.len(), offset, count);
                                current = IFD::at_offset(offset);
                                ReadState::ReadEntries { remaining: count }
                            }
                            Err(e) if pages.is_empty() => return Err(e),
                            Err(e) => {
                                warn!("Error reading IFD #{} at offset {}: {}", pages.len(), offset, e);
                                ReadState::Done
                            }
                        }
                    }
                }
                ReadState::ReadEntries { remaining: 0 } => ReadState::AwaitNextOffset,
                ReadState::ReadEntries { remaining } => {
                    self.read_entry(reader, &mut current)?;
                    ReadState::ReadEntries { remaining: remaining - 1 }
                }
                ReadState::AwaitNextOffset => {
                    let next_offset = self.handler.read_u32(reader)?;
                    let mut page = std::mem::take(&mut current);
                    self.read_sub_ifds(reader, &mut page, 1)?;
                    info!("Read IFD #{} with {} entries", pages.len(), page.field_count());
                    pages.push(page);

                    if next_offset == 0 {
                        ReadState::Done
                    } else {
                        ReadState::AwaitDirectoryHeader { offset: next_offset }
                    }
                }
                ReadState::Done => break,
            };
        }

        Ok(pages)
    }

    /// Seeks to a directory and returns its entry count after checking
    /// that the whole directory lies inside the stream
    fn read_directory_header(&self, reader: &mut dyn SeekableReader, offset: u32) -> TiffResult<u16> {
        validation::validate_ifd_offset(offset, self.file_size)?;
        reader.seek(SeekFrom::Start(offset as u64))?;
        let count = self.handler.read_u16(reader)?;

        let end = offset as u64
            + layout::ENTRY_COUNT_SIZE as u64
            + layout::ENTRY_SIZE as u64 * count as u64
            + layout::NEXT_IFD_POINTER_SIZE as u64;
        if end > self.file_size {
            return Err(TiffError::InvalidOffset {
                offset: end,
                file_size: self.file_size,
            });
        }

        Ok(count)
    }

    /// Reads one 12-byte entry at the reader's position into `ifd`
    ///
    /// Leaves the reader at the start of the next entry whatever happens to
    /// the field: unknown types and values outside the stream are skipped.
    fn read_entry(&self, reader: &mut dyn SeekableReader, ifd: &mut IFD) -> TiffResult<()> {
        let tag = self.handler.read_u16(reader)?;
        let type_code = self.handler.read_u16(reader)?;
        let count = self.handler.read_u32(reader)?;
        let field_type = FieldType::from_wire_code(type_code);

        if field_type == FieldType::Unknown {
            let mut slot = [0u8; layout::VALUE_SLOT_SIZE as usize];
            reader.read_exact(&mut slot)?;
            warn!("Skipping tag {} with unknown field type {}", tag, type_code);
            return Ok(());
        }

        let byte_length = count as u64 * field_type.element_width() as u64;
        let value = if byte_length <= layout::VALUE_SLOT_SIZE as u64 {
            let mut slot = [0u8; layout::VALUE_SLOT_SIZE as usize];
            reader.read_exact(&mut slot)?;
            FieldValue::decode(field_type, count, &mut Cursor::new(slot), self.handler)?
        } else {
            let value_offset = self.handler.read_u32(reader)?;
            let resume = reader.stream_position()?;

            if value_offset as u64 + byte_length > self.file_size {
                warn!(
                    "Skipping tag {}: {} bytes at offset {} exceed file size {}",
                    tag, byte_length, value_offset, self.file_size
                );
                return Ok(());
            }

            reader.seek(SeekFrom::Start(value_offset as u64))?;
            let value = FieldValue::decode(field_type, count, reader, self.handler)?;
            reader.seek(SeekFrom::Start(resume))?;
            value
        };

        let field = TiffField::new(tag, value);
        trace!("Read field {}", field);
        ifd.add_field(field);
        Ok(())
    }

    /// Decodes the directories referenced by the pointer fields of `ifd`
    ///
    /// A pointer whose target cannot be read is removed from `ifd` together
    /// with anything read under it.
    fn read_sub_ifds(&mut self, reader: &mut dyn SeekableReader, ifd: &mut IFD, depth: usize) -> TiffResult<()> {
        let pointers: Vec<(u16, Vec<u32>)> = ifd
            .fields()
            .filter(|f| is_sub_ifd_pointer(f))
            .filter_map(|f| f.as_u32_vec().map(|offsets| (f.tag(), offsets)))
            .collect();

        for (tag, offsets) in pointers {
            let mut children = Vec::with_capacity(offsets.len());
            let mut failure = None;

            for offset in offsets {
                match self.read_sub_ifd(reader, offset, depth) {
                    Ok(child) => children.push(child),
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }

            match failure {
                Some(e) => {
                    warn!("Dropping sub-IFD pointer tag {} at depth {}: {}", tag, depth, e);
                    ifd.remove_field(tag);
                }
                None => {
                    debug!("Attached {} sub-IFD(s) under tag {}", children.len(), tag);
                    ifd.add_children(tag, children);
                }
            }
        }

        Ok(())
    }

    fn read_sub_ifd(&mut self, reader: &mut dyn SeekableReader, offset: u32, depth: usize) -> TiffResult<IFD> {
        if depth > self.options.max_depth {
            return Err(TiffError::DepthLimitExceeded(self.options.max_depth));
        }
        if !self.visited.insert(offset) {
            return Err(TiffError::CyclicDirectory(offset));
        }

        let count = self.read_directory_header(reader, offset)?;
        let mut child = IFD::at_offset(offset);
        for _ in 0..count {
            self.read_entry(reader, &mut child)?;
        }

        // The next-IFD pointer of a sub-IFD is not followed
        self.read_sub_ifds(reader, &mut child, depth + 1)?;
        Ok(child)
    }
}

/// Reader for classic TIFF files
pub struct TiffReader {
    options: ReadOptions,
}

impl Default for TiffReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TiffReader {
    pub fn new() -> Self {
        Self::with_options(ReadOptions::default())
    }

    pub fn with_options(options: ReadOptions) -> Self {
        TiffReader { options }
    }

    /// Loads a TIFF file from the given path
    pub fn load<P: AsRef<Path>>(&self, path: P) -> TiffResult<TIFF> {
        info!("Loading TIFF file: {}", path.as_ref().display());
        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(1024 * 1024, file); // 1MB buffer

        self.read(&mut reader)
    }

    /// Reads a TIFF file from the given reader
    ///
    /// 1. Detect byte order (little/big endian)
    /// 2. Check the magic number
    /// 3. Read all IFDs and their sub-IFDs
    pub fn read(&self, reader: &mut dyn SeekableReader) -> TiffResult<TIFF> {
        let (byte_order, first_ifd_offset) = read_header(reader)?;
        debug!("First IFD offset: {}", first_ifd_offset);

        let file_size = validation::get_file_size(reader)?;
        let handler = byte_order.create_handler();
        let mut directory_reader = DirectoryReader::new(handler.as_ref(), self.options, file_size);
        let ifds = directory_reader.read_chain(reader, first_ifd_offset)?;

        info!("Read {} IFDs from TIFF file", ifds.len());
        Ok(TIFF::from_ifds(byte_order, ifds))
    }
}

/// Reads and validates the 8-byte header, returning the byte order and
/// the offset of the first IFD
pub fn read_header(reader: &mut dyn SeekableReader) -> TiffResult<(ByteOrder, u32)> {
    reader.seek(SeekFrom::Start(0))?;
    let byte_order = ByteOrder::detect(reader)?;
    debug!("Detected byte order: {}", byte_order.name());

    let handler = byte_order.create_handler();
    let magic = handler.read_u16(reader)?;
    match magic {
        header::TIFF_VERSION => {}
        header::BIG_TIFF_VERSION => return Err(TiffError::UnsupportedVersion(magic)),
        _ => return Err(TiffError::InvalidMagic(magic)),
    }

    let first_ifd_offset = handler.read_u32(reader)?;
    Ok((byte_order, first_ifd_offset))
}

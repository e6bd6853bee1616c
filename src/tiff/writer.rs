//! TIFF writing
//!
//! Writing follows "allocate forward, patch backward": every directory is
//! written at the next free offset, its external values directly after its
//! entries, its children after that. Pointers whose targets are only known
//! later (child pointers, next-IFD links, the header's first-IFD offset) are
//! written as placeholders and patched once the target has been placed.

use log::{debug, info, warn};
use std::io::{Seek, SeekFrom, Write};

use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::{SeekableReader, SeekableWriter};
use crate::strips::relocate::Relocator;
use crate::tiff::constants::{header, layout};
use crate::tiff::errors::{to_offset, TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::types::TIFF;
use crate::utils::progress::ProgressTracker;

/// Serializes directories with one byte order
pub struct DirectoryWriter<'h> {
    handler: &'h dyn ByteOrderHandler,
}

impl<'h> DirectoryWriter<'h> {
    pub fn new(handler: &'h dyn ByteOrderHandler) -> Self {
        DirectoryWriter { handler }
    }

    /// Writes `ifd` and its children at `offset`
    ///
    /// Returns the first offset after everything written. The next-IFD
    /// pointer is left as 0 and can be patched with
    /// `IFD::set_next_ifd_offset`.
    pub fn write(&self, ifd: &mut IFD, writer: &mut dyn SeekableWriter, offset: u32) -> TiffResult<u32> {
        let entry_count = ifd.field_count();
        let count = u16::try_from(entry_count).map_err(|_| TiffError::ValueOutOfRange(entry_count as u64))?;

        let entries_start = offset as u64 + layout::ENTRY_COUNT_SIZE as u64;
        let entry_area_end = entries_start + layout::ENTRY_SIZE as u64 * entry_count as u64;
        let end_offset = to_offset(entry_area_end + layout::NEXT_IFD_POINTER_SIZE as u64)?;
        let mut data_cursor = end_offset;

        debug!("Writing IFD at offset {} with {} entries", offset, count);
        writer.seek(SeekFrom::Start(offset as u64))?;
        self.handler.write_u16(writer, count)?;

        for (i, field) in ifd.fields_mut().enumerate() {
            writer.seek(SeekFrom::Start(entries_start + layout::ENTRY_SIZE as u64 * i as u64))?;
            self.handler.write_u16(writer, field.tag())?;
            self.handler.write_u16(writer, field.field_type().wire_code())?;
            self.handler.write_u32(writer, field.count())?;

            let used = field.serialize_value(writer, self.handler, data_cursor)?;
            data_cursor = to_offset(data_cursor as u64 + used as u64)?;
        }

        writer.seek(SeekFrom::Start(entry_area_end))?;
        self.handler.write_u32(writer, 0)?;
        ifd.set_offsets(offset, end_offset);

        data_cursor = self.write_children(ifd, writer, data_cursor)?;
        Ok(data_cursor)
    }

    /// Writes the children of `ifd` from `data_cursor` on, patching the
    /// parent's pointer fields with their new offsets
    fn write_children(&self, ifd: &mut IFD, writer: &mut dyn SeekableWriter, mut data_cursor: u32) -> TiffResult<u32> {
        let pointer_slots: Vec<(u16, Option<(u32, usize)>)> = ifd
            .child_entries()
            .map(|(tag, _)| {
                let slot = ifd
                    .get_field(tag)
                    .and_then(|f| f.data_offset().map(|at| (at, f.count() as usize)));
                (tag, slot)
            })
            .collect();

        let mut patched: Vec<(u16, usize, u32)> = Vec::new();
        for ((tag, children), (_, slot)) in ifd.child_entries_mut().zip(pointer_slots) {
            let (pointer_at, capacity) = match slot {
                Some(slot) => slot,
                None => {
                    warn!("Skipping {} child IFD(s) under tag {}: no pointer field", children.len(), tag);
                    continue;
                }
            };

            if children.len() > capacity {
                warn!(
                    "Tag {} holds {} pointer(s) but has {} children, extra children are not written",
                    tag,
                    capacity,
                    children.len()
                );
            }

            for (i, child) in children.iter_mut().take(capacity).enumerate() {
                let child_offset = data_cursor;
                writer.seek(SeekFrom::Start(pointer_at as u64 + layout::VALUE_SLOT_SIZE as u64 * i as u64))?;
                self.handler.write_u32(writer, child_offset)?;
                data_cursor = self.write(child, writer, child_offset)?;
                patched.push((tag, i, child_offset));
            }
        }

        for (tag, index, child_offset) in patched {
            if let Some(field) = ifd.get_field_mut(tag) {
                field.set_pointer(index, child_offset);
            }
        }

        Ok(data_cursor)
    }

    /// Writes a chain of top-level IFDs starting at `first_offset`
    ///
    /// Returns the next free offset and the offset of the first IFD (0 for
    /// an empty chain).
    pub fn write_chain(
        &self,
        ifds: &mut [IFD],
        writer: &mut dyn SeekableWriter,
        first_offset: u32,
    ) -> TiffResult<(u32, u32)> {
        let mut cursor = first_offset;
        let mut first_ifd_offset = 0;

        for i in 0..ifds.len() {
            let start = cursor;
            cursor = self.write(&mut ifds[i], writer, start)?;

            if i == 0 {
                first_ifd_offset = start;
            } else {
                ifds[i - 1].set_next_ifd_offset(writer, self.handler, start)?;
            }
        }

        debug!("Wrote chain of {} IFDs, next free offset {}", ifds.len(), cursor);
        Ok((cursor, first_ifd_offset))
    }
}

/// Writes the 8-byte header with a zero first-IFD placeholder
pub fn write_header(writer: &mut dyn SeekableWriter, handler: &dyn ByteOrderHandler) -> TiffResult<()> {
    writer.seek(SeekFrom::Start(0))?;
    writer.write_all(&handler.byte_order().marker())?;
    handler.write_u16(writer, header::TIFF_VERSION)?;
    handler.write_u32(writer, 0)?;
    Ok(())
}

/// Patches the header's first-IFD offset
pub fn patch_first_ifd_offset(
    writer: &mut dyn SeekableWriter,
    handler: &dyn ByteOrderHandler,
    first_ifd_offset: u32,
) -> TiffResult<()> {
    writer.seek(SeekFrom::Start(header::FIRST_IFD_OFFSET_POSITION))?;
    handler.write_u32(writer, first_ifd_offset)?;
    Ok(())
}

/// Writer for complete TIFF files
pub struct TiffWriter {
    /// Output byte order, `None` keeps the byte order of the source
    byte_order: Option<ByteOrder>,
    show_progress: bool,
}

impl Default for TiffWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TiffWriter {
    pub fn new() -> Self {
        TiffWriter {
            byte_order: None,
            show_progress: false,
        }
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = Some(byte_order);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Writes `tiff` to `writer`, copying its pixel data from `source`
    ///
    /// Pixel data of every page is placed right after the header, then the
    /// directory chain follows and the header is patched last. Returns the
    /// TIFF as written, with offsets pointing into the new stream.
    pub fn write(
        &self,
        tiff: &TIFF,
        source: &mut dyn SeekableReader,
        writer: &mut dyn SeekableWriter,
    ) -> TiffResult<TIFF> {
        let output_order = self.byte_order.unwrap_or(tiff.byte_order());
        info!(
            "Writing {} page(s) as {}",
            tiff.page_count(),
            output_order.name()
        );

        let handler = output_order.create_handler();
        write_header(writer, handler.as_ref())?;

        let mut ifds = tiff.pages().to_vec();
        let relocator = Relocator::new(tiff.byte_order(), output_order);
        let progress = if self.show_progress {
            Some(ProgressTracker::new(ifds.len() as u64, "Relocating image data"))
        } else {
            None
        };

        let mut cursor = header::HEADER_SIZE;
        for (index, ifd) in ifds.iter_mut().enumerate() {
            cursor = relocator.relocate_image_data(source, ifd, writer, cursor)?;
            debug!("Page {} image data relocated, cursor at {}", index, cursor);
            if let Some(progress) = &progress {
                progress.increment(1);
            }
        }
        if let Some(progress) = &progress {
            progress.finish();
        }

        let directory_writer = DirectoryWriter::new(handler.as_ref());
        let (end, first_ifd_offset) = directory_writer.write_chain(&mut ifds, writer, cursor)?;
        patch_first_ifd_offset(writer, handler.as_ref(), first_ifd_offset)?;

        writer.seek(SeekFrom::Start(end as u64))?;
        writer.flush()?;
        info!("Wrote {} bytes", end);

        Ok(TIFF::from_ifds(output_order, ifds))
    }
}

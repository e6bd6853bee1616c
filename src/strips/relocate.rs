//! Pixel data relocation
//!
//! When a file is rewritten the strips, tiles and embedded JPEG thumbnail
//! referenced by a page have to move to the new stream, and the fields
//! pointing at them have to follow. Uncompressed data also has its samples
//! transcoded if the output byte order differs.

use log::{debug, warn};
use std::io::{Read, Seek, SeekFrom, Write};

use crate::io::byte_order::ByteOrder;
use crate::io::seekable::{SeekableReader, SeekableWriter};
use crate::strips::endian::flip_sample_endianness;
use crate::strips::geometry::ImageGeometry;
use crate::tiff::constants::{compression, tags};
use crate::tiff::errors::{to_offset, TiffError, TiffResult};
use crate::tiff::field::TiffField;
use crate::tiff::ifd::IFD;
use crate::tiff::validation;

/// Offset field and the byte count field describing the same pieces
const PIECE_FIELDS: [(u16, u16); 2] = [
    (tags::STRIP_OFFSETS, tags::STRIP_BYTE_COUNTS),
    (tags::TILE_OFFSETS, tags::TILE_BYTE_COUNTS),
];

/// Copies the pixel data of pages from a source stream to an output stream
pub struct Relocator {
    source_order: ByteOrder,
    output_order: ByteOrder,
}

impl Relocator {
    pub fn new(source_order: ByteOrder, output_order: ByteOrder) -> Self {
        Relocator {
            source_order,
            output_order,
        }
    }

    /// Copies everything `ifd` and its children reference to `writer`,
    /// starting at `offset`, and rewrites the offset and byte count fields
    ///
    /// Returns the first offset after the copied data.
    pub fn relocate_image_data(
        &self,
        source: &mut dyn SeekableReader,
        ifd: &mut IFD,
        writer: &mut dyn SeekableWriter,
        offset: u32,
    ) -> TiffResult<u32> {
        let source_size = validation::get_file_size(source)?;
        let mut cursor = offset;

        for (offsets_tag, counts_tag) in PIECE_FIELDS {
            let offsets = match ifd.get_u32_values(offsets_tag) {
                Some(offsets) => offsets,
                None => continue,
            };

            let counts = self.resolve_byte_counts(ifd, counts_tag, offsets.len())?;
            let transcode = self.transcode_geometry(ifd);

            let mut new_offsets = Vec::with_capacity(offsets.len());
            for (&piece_offset, &count) in offsets.iter().zip(counts.iter()) {
                let data = read_piece(source, piece_offset, count, source_size)?;
                let data = match &transcode {
                    Some(geometry) => flip_sample_endianness(
                        &data,
                        geometry.bits_for_sample(0),
                        geometry.scan_line_stride(),
                        self.source_order.is_big_endian(),
                    ),
                    None => data,
                };

                new_offsets.push(cursor);
                cursor = write_piece(writer, cursor, &data)?;
            }

            debug!(
                "Relocated {} piece(s) of tag {} ending at {}",
                new_offsets.len(),
                offsets_tag,
                cursor
            );
            ifd.add_field(TiffField::long(offsets_tag, new_offsets));
            ifd.add_field(TiffField::long(counts_tag, counts));
        }

        cursor = self.relocate_thumbnail(source, ifd, writer, cursor, source_size)?;

        for (tag, children) in ifd.child_entries_mut() {
            for child in children.iter_mut() {
                debug!("Relocating image data of child IFD under tag {}", tag);
                cursor = self.relocate_image_data(source, child, writer, cursor)?;
            }
        }

        Ok(cursor)
    }

    /// Byte counts to copy for `piece_count` pieces
    ///
    /// Uncompressed data falls back on the counts derived from the image
    /// geometry when the stated ones are missing, have the wrong length or
    /// disagree for a single strip. Compressed data must state its counts.
    fn resolve_byte_counts(&self, ifd: &IFD, counts_tag: u16, piece_count: usize) -> TiffResult<Vec<u32>> {
        let stated = ifd.get_u32_values(counts_tag);

        if !is_uncompressed(ifd) {
            return match stated {
                Some(counts) if counts.len() == piece_count => Ok(counts),
                _ => Err(TiffError::InvalidGeometry(format!(
                    "Compressed data needs {} byte counts in tag {}",
                    piece_count, counts_tag
                ))),
            };
        }

        let expected = match ImageGeometry::from_ifd(ifd).and_then(|g| g.byte_counts(piece_count)) {
            Ok(expected) => expected,
            Err(e) => {
                return match stated {
                    Some(counts) if counts.len() == piece_count => {
                        debug!("Keeping stated byte counts, geometry unusable: {}", e);
                        Ok(counts)
                    }
                    _ => Err(e),
                }
            }
        };

        match stated {
            Some(counts) if counts.len() == piece_count => {
                if piece_count == 1 && counts[0] != expected[0] {
                    warn!(
                        "Tag {} states {} bytes for a single strip, using {} from the image geometry",
                        counts_tag, counts[0], expected[0]
                    );
                    Ok(expected)
                } else {
                    Ok(counts)
                }
            }
            Some(counts) => {
                warn!(
                    "Tag {} has {} byte counts for {} pieces, using the image geometry",
                    counts_tag,
                    counts.len(),
                    piece_count
                );
                Ok(expected)
            }
            None => Ok(expected),
        }
    }

    /// Geometry to transcode samples with, when the data needs it
    fn transcode_geometry(&self, ifd: &IFD) -> Option<ImageGeometry> {
        if self.source_order == self.output_order || !is_uncompressed(ifd) {
            return None;
        }

        let geometry = ImageGeometry::from_ifd(ifd).ok()?;
        if geometry.ycbcr_subsampling.is_some() {
            return None;
        }
        if !geometry.has_uniform_samples() {
            warn!("Samples of differing bit depths are copied without byte order conversion");
            return None;
        }
        Some(geometry)
    }

    /// Copies the JPEG thumbnail referenced by tags 513/514
    fn relocate_thumbnail(
        &self,
        source: &mut dyn SeekableReader,
        ifd: &mut IFD,
        writer: &mut dyn SeekableWriter,
        cursor: u32,
        source_size: u64,
    ) -> TiffResult<u32> {
        let (thumbnail_offset, length) = match (
            ifd.get_u32(tags::JPEG_INTERCHANGE_FORMAT),
            ifd.get_u32(tags::JPEG_INTERCHANGE_FORMAT_LENGTH),
        ) {
            (Some(offset), Some(length)) => (offset, length),
            _ => return Ok(cursor),
        };

        let data = read_piece(source, thumbnail_offset, length, source_size)?;
        let next = write_piece(writer, cursor, &data)?;
        debug!("Relocated {} byte JPEG thumbnail to {}", length, cursor);

        ifd.add_field(TiffField::long(tags::JPEG_INTERCHANGE_FORMAT, vec![cursor]));
        ifd.add_field(TiffField::long(tags::JPEG_INTERCHANGE_FORMAT_LENGTH, vec![length]));
        Ok(next)
    }
}

fn is_uncompressed(ifd: &IFD) -> bool {
    ifd.get_u32(tags::COMPRESSION).unwrap_or(compression::NONE as u32) == compression::NONE as u32
}

/// Reads `count` bytes at `offset`
///
/// A piece that runs past the end of the source is an error.
fn read_piece(source: &mut dyn SeekableReader, offset: u32, count: u32, source_size: u64) -> TiffResult<Vec<u8>> {
    let end = offset as u64 + count as u64;
    if end > source_size {
        warn!(
            "Piece of {} bytes at offset {} runs past the end of the source ({} bytes)",
            count, offset, source_size
        );
        return Err(TiffError::InvalidOffset {
            offset: end,
            file_size: source_size,
        });
    }

    let mut data = vec![0u8; count as usize];
    source.seek(SeekFrom::Start(offset as u64))?;
    source.read_exact(&mut data)?;

    Ok(data)
}

/// Writes `data` at `offset` and returns the offset after it
fn write_piece(writer: &mut dyn SeekableWriter, offset: u32, data: &[u8]) -> TiffResult<u32> {
    writer.seek(SeekFrom::Start(offset as u64))?;
    writer.write_all(data)?;
    to_offset(offset as u64 + data.len() as u64)
}

//! TIFF file construction utilities
//!
//! `TiffBuilder` assembles pages in memory, with their pixel data held
//! beside them, and writes a complete file in one pass.

use log::{debug, info};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use crate::io::byte_order::ByteOrder;
use crate::io::seekable::SeekableWriter;
use crate::tiff::constants::{compression, header, photometric, planar_config, tags};
use crate::tiff::errors::{to_offset, TiffError, TiffResult};
use crate::tiff::field::TiffField;
use crate::tiff::ifd::IFD;
use crate::tiff::types::TIFF;
use crate::tiff::writer::{patch_first_ifd_offset, write_header, DirectoryWriter};

/// Builder for creating TIFF files
pub struct TiffBuilder {
    byte_order: ByteOrder,
    ifds: Vec<IFD>,
    /// Single-strip pixel data per page index
    image_data: HashMap<usize, Vec<u8>>,
}

impl TiffBuilder {
    pub fn new(byte_order: ByteOrder) -> Self {
        debug!("Creating new TiffBuilder ({})", byte_order.name());
        TiffBuilder {
            byte_order,
            ifds: Vec::new(),
            image_data: HashMap::new(),
        }
    }

    /// Adds a page and returns its index
    pub fn add_ifd(&mut self, ifd: IFD) -> usize {
        let ifd_index = self.ifds.len();
        debug!("Adding IFD #{} to TiffBuilder", ifd_index);
        self.ifds.push(ifd);
        ifd_index
    }

    pub fn ifd_mut(&mut self, ifd_index: usize) -> TiffResult<&mut IFD> {
        let count = self.ifds.len();
        self.ifds
            .get_mut(ifd_index)
            .ok_or(TiffError::PageOutOfRange { index: ifd_index, count })
    }

    pub fn add_field(&mut self, ifd_index: usize, field: TiffField) -> TiffResult<()> {
        self.ifd_mut(ifd_index)?.add_field(field);
        Ok(())
    }

    /// BitsPerSample together with the matching SamplesPerPixel
    pub fn add_bits_per_sample(&mut self, ifd_index: usize, bits_per_channel: &[u16]) -> TiffResult<()> {
        let ifd = self.ifd_mut(ifd_index)?;
        ifd.add_field(TiffField::short(tags::BITS_PER_SAMPLE, bits_per_channel.to_vec()));
        ifd.add_field(TiffField::short(tags::SAMPLES_PER_PIXEL, vec![bits_per_channel.len() as u16]));
        Ok(())
    }

    fn add_image_tags(&mut self, ifd_index: usize, width: u32, height: u32, photometric: u16) -> TiffResult<()> {
        let ifd = self.ifd_mut(ifd_index)?;
        ifd.add_field(TiffField::long(tags::IMAGE_WIDTH, vec![width]));
        ifd.add_field(TiffField::long(tags::IMAGE_LENGTH, vec![height]));
        ifd.add_field(TiffField::short(tags::COMPRESSION, vec![compression::NONE]));
        ifd.add_field(TiffField::short(tags::PHOTOMETRIC_INTERPRETATION, vec![photometric]));
        ifd.add_field(TiffField::short(tags::PLANAR_CONFIGURATION, vec![planar_config::CHUNKY]));
        ifd.add_field(TiffField::rational(tags::X_RESOLUTION, vec![(72, 1)]));
        ifd.add_field(TiffField::rational(tags::Y_RESOLUTION, vec![(72, 1)]));
        ifd.add_field(TiffField::short(tags::RESOLUTION_UNIT, vec![2]));
        Ok(())
    }

    /// Tags of an uncompressed grayscale image
    pub fn add_basic_gray_tags(&mut self, ifd_index: usize, width: u32, height: u32, bits_per_sample: u16) -> TiffResult<()> {
        info!("Adding basic grayscale tags for {}x{} image", width, height);
        self.add_image_tags(ifd_index, width, height, photometric::BLACK_IS_ZERO)?;
        self.add_bits_per_sample(ifd_index, &[bits_per_sample])
    }

    /// Tags of an uncompressed 8-bit RGB image
    pub fn add_basic_rgb_tags(&mut self, ifd_index: usize, width: u32, height: u32) -> TiffResult<()> {
        info!("Adding basic RGB tags for {}x{} image", width, height);
        self.add_image_tags(ifd_index, width, height, photometric::RGB)?;
        self.add_bits_per_sample(ifd_index, &[8, 8, 8])
    }

    /// Stores the whole image as one strip
    pub fn setup_single_strip(&mut self, ifd_index: usize, strip_data: Vec<u8>) -> TiffResult<()> {
        debug!("Setting up single strip: {} bytes", strip_data.len());
        let ifd = self.ifd_mut(ifd_index)?;

        // The offset is assigned when the file is written
        ifd.add_field(TiffField::long(tags::STRIP_OFFSETS, vec![0]));
        ifd.add_field(TiffField::long(tags::STRIP_BYTE_COUNTS, vec![strip_data.len() as u32]));
        if let Some((_, height)) = ifd.get_dimensions() {
            ifd.add_field(TiffField::long(tags::ROWS_PER_STRIP, vec![height]));
        }

        self.image_data.insert(ifd_index, strip_data);
        Ok(())
    }

    /// Attaches a child directory together with its pointer field
    pub fn add_child(&mut self, ifd_index: usize, tag: u16, child: IFD) -> TiffResult<()> {
        let ifd = self.ifd_mut(ifd_index)?;
        ifd.add_field(TiffField::long(tag, vec![0]));
        ifd.add_child(tag, child);
        Ok(())
    }

    /// Writes the file to `writer` and returns the pages as written
    pub fn build_into(&self, writer: &mut dyn SeekableWriter) -> TiffResult<TIFF> {
        let handler = self.byte_order.create_handler();
        write_header(writer, handler.as_ref())?;

        let mut ifds = self.ifds.clone();
        let mut cursor = header::HEADER_SIZE;
        for (ifd_index, ifd) in ifds.iter_mut().enumerate() {
            if let Some(data) = self.image_data.get(&ifd_index) {
                writer.seek(SeekFrom::Start(cursor as u64))?;
                writer.write_all(data)?;
                ifd.add_field(TiffField::long(tags::STRIP_OFFSETS, vec![cursor]));
                cursor = to_offset(cursor as u64 + data.len() as u64)?;
            }
        }

        let directory_writer = DirectoryWriter::new(handler.as_ref());
        let (end, first_ifd_offset) = directory_writer.write_chain(&mut ifds, writer, cursor)?;
        patch_first_ifd_offset(writer, handler.as_ref(), first_ifd_offset)?;
        writer.seek(SeekFrom::Start(end as u64))?;
        writer.flush()?;

        Ok(TIFF::from_ifds(self.byte_order, ifds))
    }

    /// Writes the TIFF file to disk
    pub fn write<P: AsRef<Path>>(&self, output_path: P) -> TiffResult<()> {
        info!("Writing TIFF to {}", output_path.as_ref().display());
        let file = File::create(output_path)?;
        let mut writer = BufWriter::with_capacity(1024 * 1024, file);
        self.build_into(&mut writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_unknown_page_index() {
        let mut builder = TiffBuilder::new(ByteOrder::LittleEndian);
        assert!(matches!(
            builder.add_basic_gray_tags(0, 4, 4, 8),
            Err(TiffError::PageOutOfRange { index: 0, count: 0 })
        ));
    }

    #[test]
    fn test_strip_lands_after_header() {
        let mut builder = TiffBuilder::new(ByteOrder::BigEndian);
        let page = builder.add_ifd(IFD::new());
        builder.add_basic_gray_tags(page, 2, 2, 8).unwrap();
        builder.setup_single_strip(page, vec![1, 2, 3, 4]).unwrap();

        let mut cursor = Cursor::new(Vec::new());
        let written = builder.build_into(&mut cursor).unwrap();
        let bytes = cursor.into_inner();

        assert_eq!(&bytes[0..4], &[0x4D, 0x4D, 0, 42]);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 12]);
        assert_eq!(&bytes[8..12], &[1, 2, 3, 4]);
        assert_eq!(written.pages()[0].get_u32(tags::STRIP_OFFSETS), Some(8));
        assert_eq!(written.pages()[0].start_offset(), 12);
    }
}

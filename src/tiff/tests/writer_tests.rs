//! Tests for directory serialization and whole-file rewrites

extern crate std;

use std::io::Cursor;

use crate::io::byte_order::{ByteOrder, LittleEndianHandler};
use crate::tiff::builder::TiffBuilder;
use crate::tiff::field::{FieldValue, TiffField};
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;
use crate::tiff::writer::{patch_first_ifd_offset, write_header, DirectoryWriter, TiffWriter};
use super::test_utils::create_corrupt_exif_buffer;

fn le_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Writes a little-endian file holding only directories
fn write_file(ifds: &mut [IFD]) -> Vec<u8> {
    let handler = LittleEndianHandler;
    let mut cursor = Cursor::new(Vec::new());
    write_header(&mut cursor, &handler).unwrap();
    let (_, first) = DirectoryWriter::new(&handler).write_chain(ifds, &mut cursor, 8).unwrap();
    patch_first_ifd_offset(&mut cursor, &handler, first).unwrap();
    cursor.into_inner()
}

fn width_page(width: u32) -> IFD {
    let mut ifd = IFD::new();
    ifd.add_field(TiffField::long(256, vec![width]));
    ifd
}

#[test]
fn test_inline_and_external_values() {
    let mut ifd = IFD::new();
    ifd.add_field(TiffField::ascii(305, "abc"));
    ifd.add_field(TiffField::ascii(270, "abcd"));

    let mut cursor = Cursor::new(Vec::new());
    let end = DirectoryWriter::new(&LittleEndianHandler)
        .write(&mut ifd, &mut cursor, 8)
        .unwrap();
    let bytes = cursor.into_inner();

    std::assert_eq!(end, 43);
    std::assert_eq!(ifd.start_offset(), 8);
    std::assert_eq!(ifd.end_offset(), 38);

    // 270 goes first and points into the data area after the directory
    std::assert_eq!(le_u32(&bytes, 18), 38);
    std::assert_eq!(&bytes[38..43], b"abcd\0");
    std::assert_eq!(ifd.get_field(270).unwrap().data_offset(), Some(38));

    // "abc" plus its NUL fills the slot exactly
    std::assert_eq!(&bytes[30..34], b"abc\0");
    std::assert_eq!(ifd.get_field(305).unwrap().data_offset(), Some(30));

    std::assert_eq!(le_u32(&bytes, 34), 0);
}

#[test]
fn test_entries_are_sorted_by_tag() {
    let mut ifd = IFD::new();
    ifd.add_field(TiffField::short(305, vec![1]));
    ifd.add_field(TiffField::short(256, vec![2]));
    ifd.add_field(TiffField::short(270, vec![3]));

    let mut cursor = Cursor::new(Vec::new());
    DirectoryWriter::new(&LittleEndianHandler)
        .write(&mut ifd, &mut cursor, 8)
        .unwrap();
    let bytes = cursor.into_inner();

    std::assert_eq!(le_u16(&bytes, 8), 3);
    std::assert_eq!(le_u16(&bytes, 10), 256);
    std::assert_eq!(le_u16(&bytes, 22), 270);
    std::assert_eq!(le_u16(&bytes, 34), 305);
}

#[test]
fn test_chain_links() {
    let mut ifds = vec![width_page(1), width_page(2), width_page(3)];

    let mut cursor = Cursor::new(Vec::new());
    let (end, first) = DirectoryWriter::new(&LittleEndianHandler)
        .write_chain(&mut ifds, &mut cursor, 8)
        .unwrap();
    let bytes = cursor.into_inner();

    std::assert_eq!((end, first), (62, 8));
    std::assert_eq!(le_u32(&bytes, 22), 26);
    std::assert_eq!(le_u32(&bytes, 40), 44);
    std::assert_eq!(le_u32(&bytes, 58), 0);
}

#[test]
fn test_unwritten_ifd_cannot_be_linked() {
    let ifd = width_page(1);
    let mut cursor = Cursor::new(Vec::new());
    std::assert!(ifd.set_next_ifd_offset(&mut cursor, &LittleEndianHandler, 100).is_err());
}

#[test]
fn test_child_pointer_is_patched() {
    let mut exif = IFD::new();
    exif.add_field(TiffField::ascii(36867, "2024:01:01 00:00:00"));

    let mut page = width_page(64);
    page.add_field(TiffField::long(34665, vec![0]));
    page.add_child(34665, exif);

    let mut pages = vec![page];
    let bytes = write_file(&mut pages);

    std::assert_eq!(le_u32(&bytes, 30), 38);
    std::assert_eq!(pages[0].get_u32(34665), Some(38));
    std::assert_eq!(pages[0].child(34665).unwrap().start_offset(), 38);
    std::assert_eq!(bytes.len(), 76);

    let tiff = TiffReader::new().read(&mut Cursor::new(bytes)).unwrap();
    let exif = tiff.main_ifd().unwrap().child(34665).unwrap();
    std::assert_eq!(exif.get_field(36867).unwrap().as_str(), Some("2024:01:01 00:00:00"));
}

#[test]
fn test_sub_ifd_array_is_patched() {
    let mut page = width_page(1);
    page.add_field(TiffField::long(330, vec![0, 0]));
    page.add_children(330, vec![width_page(2), width_page(3)]);

    let mut pages = vec![page];
    let bytes = write_file(&mut pages);

    std::assert_eq!(pages[0].get_field(330).unwrap().data_offset(), Some(38));
    std::assert_eq!(le_u32(&bytes, 38), 46);
    std::assert_eq!(le_u32(&bytes, 42), 64);

    let tiff = TiffReader::new().read(&mut Cursor::new(bytes)).unwrap();
    let widths: Vec<u32> = tiff.main_ifd().unwrap()
        .children(330)
        .iter()
        .filter_map(|c| c.get_u32(256))
        .collect();
    std::assert_eq!(widths, vec![2, 3]);
}

#[test]
fn test_child_without_pointer_is_skipped() {
    let mut page = width_page(1);
    page.add_child(34665, width_page(2));

    let mut cursor = Cursor::new(Vec::new());
    let end = DirectoryWriter::new(&LittleEndianHandler)
        .write(&mut page, &mut cursor, 8)
        .unwrap();

    std::assert_eq!(end, 26);
    std::assert_eq!(cursor.into_inner().len(), 26);
}

#[test]
fn test_round_trip_keeps_values() {
    let mut page = IFD::new();
    page.add_field(TiffField::long(256, vec![320]));
    page.add_field(TiffField::short(258, vec![8, 8, 8]));
    page.add_field(TiffField::rational(282, vec![(300, 1)]));
    page.add_field(TiffField::double(33550, vec![0.5, 0.25, 0.0]));
    page.add_field(TiffField::new(339, FieldValue::SShort(vec![-1, 2])));
    page.add_field(TiffField::undefined(37500, vec![1, 2, 3, 4, 5, 6]));
    page.add_field(TiffField::ascii(305, "ifdkit"));

    let mut pages = vec![page.clone()];
    let bytes = write_file(&mut pages);
    let tiff = TiffReader::new().read(&mut Cursor::new(bytes)).unwrap();
    let read = tiff.main_ifd().unwrap();

    std::assert_eq!(read.field_count(), page.field_count());
    for field in page.fields() {
        std::assert_eq!(read.get_field(field.tag()).unwrap().value(), field.value());
    }
}

#[test]
fn test_rewrite_flips_byte_order() {
    let mut builder = TiffBuilder::new(ByteOrder::LittleEndian);
    let index = builder.add_ifd(IFD::new());
    builder.add_basic_gray_tags(index, 2, 1, 16).unwrap();
    builder.setup_single_strip(index, vec![0x01, 0x02, 0x03, 0x04]).unwrap();

    let mut source = Cursor::new(Vec::new());
    builder.build_into(&mut source).unwrap();
    let original = TiffReader::new().read(&mut source).unwrap();

    let mut output = Cursor::new(Vec::new());
    TiffWriter::new()
        .with_byte_order(ByteOrder::BigEndian)
        .write(&original, &mut source, &mut output)
        .unwrap();
    let bytes = output.into_inner();

    std::assert_eq!(&bytes[0..4], &[0x4D, 0x4D, 0, 42]);
    std::assert_eq!(&bytes[8..12], &[0x02, 0x01, 0x04, 0x03]);

    let rewritten = TiffReader::new().read(&mut Cursor::new(bytes)).unwrap();
    std::assert_eq!(rewritten.byte_order(), ByteOrder::BigEndian);

    let before = original.main_ifd().unwrap();
    let after = rewritten.main_ifd().unwrap();
    std::assert_eq!(after.field_count(), before.field_count());
    for field in before.fields() {
        std::assert_eq!(after.get_field(field.tag()).unwrap().value(), field.value());
    }
}

#[test]
fn test_rewrite_after_dropped_exif() {
    let mut source = create_corrupt_exif_buffer();
    let tiff = TiffReader::new().read(&mut source).unwrap();

    let mut output = Cursor::new(Vec::new());
    let written = TiffWriter::new().write(&tiff, &mut source, &mut output).unwrap();
    std::assert_eq!(written.page_count(), 1);

    let reread = TiffReader::new().read(&mut Cursor::new(output.into_inner())).unwrap();
    let page = reread.main_ifd().unwrap();
    std::assert_eq!(page.get_dimensions(), Some((640, 480)));
    std::assert!(!page.has_field(34665));
}

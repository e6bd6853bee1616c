//! Integration tests for the directory engine

extern crate std;

use std::io::Cursor;

use ifdkit::tiff::constants::tags;
use ifdkit::tiff::{EditOperation, TiffField};
use ifdkit::{expected_byte_counts, ByteOrder, EditScript, TiffBuilder, TiffReader, TiffWriter, IFD};

/// Two pages: 16-bit gray 4x2 with an EXIF directory, then 8-bit RGB 2x2
fn build_sample() -> Cursor<Vec<u8>> {
    let mut builder = TiffBuilder::new(ByteOrder::LittleEndian);

    let gray = builder.add_ifd(IFD::new());
    builder.add_basic_gray_tags(gray, 4, 2, 16).unwrap();
    builder
        .setup_single_strip(gray, (0u8..16).collect())
        .unwrap();
    builder
        .add_field(gray, TiffField::ascii(tags::SOFTWARE, "sample writer"))
        .unwrap();

    let mut exif = IFD::new();
    exif.add_field(TiffField::ascii(36867, "2021:06:01 12:00:00"));
    exif.add_field(TiffField::rational(33434, vec![(1, 250)]));
    builder.add_child(gray, tags::EXIF_SUB_IFD, exif).unwrap();

    let rgb = builder.add_ifd(IFD::new());
    builder.add_basic_rgb_tags(rgb, 2, 2).unwrap();
    builder.setup_single_strip(rgb, vec![7u8; 12]).unwrap();

    let mut cursor = Cursor::new(Vec::new());
    builder.build_into(&mut cursor).unwrap();
    cursor
}

#[test]
fn test_built_file_reads_back() {
    let mut source = build_sample();
    let tiff = TiffReader::new().read(&mut source).unwrap();

    std::assert_eq!(tiff.byte_order(), ByteOrder::LittleEndian);
    std::assert_eq!(tiff.page_count(), 2);

    let gray = tiff.page(0).unwrap();
    std::assert_eq!(gray.get_dimensions(), Some((4, 2)));
    std::assert_eq!(gray.get_u32(tags::STRIP_OFFSETS), Some(8));
    std::assert_eq!(gray.get_u32_values(tags::STRIP_BYTE_COUNTS), Some(vec![16]));
    std::assert_eq!(expected_byte_counts(gray, 1).unwrap(), vec![16]);

    let exif = gray.child(tags::EXIF_SUB_IFD).unwrap();
    std::assert_eq!(exif.get_field(36867).unwrap().as_str(), Some("2021:06:01 12:00:00"));

    let rgb = tiff.page(1).unwrap();
    std::assert_eq!(rgb.get_samples_per_pixel(), 3);
    std::assert_eq!(rgb.get_u32(tags::STRIP_OFFSETS), Some(24));
}

#[test]
fn test_edit_and_rewrite_big_endian() {
    let mut source = build_sample();
    let mut tiff = TiffReader::new().read(&mut source).unwrap();

    let script = EditScript::from_toml_str(
        r#"
        remove_pages = [1]

        [[set]]
        tag = "Software"
        type = "ascii"
        value = "ifdkit"
        page = 0

        [[set]]
        tag = "Artist"
        type = "ascii"
        value = "Nobody"
        "#,
    )
    .unwrap();
    let changes = script.apply(&mut tiff).unwrap();
    std::assert_eq!(changes, 4);
    std::assert_eq!(tiff.page_count(), 1);

    let mut output = Cursor::new(Vec::new());
    TiffWriter::new()
        .with_byte_order(ByteOrder::BigEndian)
        .write(&tiff, &mut source, &mut output)
        .unwrap();
    let bytes = output.into_inner();

    // 16-bit samples are swapped, the strip still follows the header
    std::assert_eq!(&bytes[0..2], b"MM");
    std::assert_eq!(&bytes[8..12], &[1, 0, 3, 2]);

    let rewritten = TiffReader::new().read(&mut Cursor::new(bytes)).unwrap();
    std::assert_eq!(rewritten.byte_order(), ByteOrder::BigEndian);
    std::assert_eq!(rewritten.page_count(), 1);

    let page = rewritten.main_ifd().unwrap();
    std::assert_eq!(page.get_field(tags::SOFTWARE).unwrap().as_str(), Some("ifdkit"));
    std::assert_eq!(page.get_field(tags::ARTIST).unwrap().as_str(), Some("Nobody"));
    std::assert_eq!(page.get_dimensions(), Some((4, 2)));

    let exif = page.child(tags::EXIF_SUB_IFD).unwrap();
    std::assert_eq!(exif.get_field(36867).unwrap().as_str(), Some("2021:06:01 12:00:00"));
    std::assert_eq!(page.get_u32(tags::EXIF_SUB_IFD), Some(exif.start_offset()));
}

#[test]
fn test_strip_exif_directory() {
    let mut source = build_sample();
    let mut tiff = TiffReader::new().read(&mut source).unwrap();

    let mut script = EditScript::new();
    script.push(EditOperation::StripSubIfd {
        page: Some(0),
        tag: tags::EXIF_SUB_IFD,
    });
    std::assert_eq!(script.apply(&mut tiff).unwrap(), 1);

    let mut output = Cursor::new(Vec::new());
    TiffWriter::new().write(&tiff, &mut source, &mut output).unwrap();

    let rewritten = TiffReader::new().read(&mut Cursor::new(output.into_inner())).unwrap();
    let page = rewritten.main_ifd().unwrap();
    std::assert!(!page.has_field(tags::EXIF_SUB_IFD));
    std::assert!(!page.has_children());
    std::assert_eq!(rewritten.page_count(), 2);
    std::assert_eq!(rewritten.page(1).unwrap().get_dimensions(), Some((2, 2)));
}

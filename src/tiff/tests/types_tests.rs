//! Tests for the TIFF types module

extern crate std;

use crate::io::byte_order::ByteOrder;
use crate::tiff::errors::TiffError;
use crate::tiff::field::TiffField;
use crate::tiff::ifd::IFD;
use crate::tiff::types::TIFF;

fn page(width: u32) -> IFD {
    let mut ifd = IFD::new();
    ifd.add_field(TiffField::long(256, vec![width]));
    ifd
}

fn widths(tiff: &TIFF) -> Vec<u32> {
    tiff.pages().iter().filter_map(|p| p.get_u32(256)).collect()
}

fn three_pages() -> TIFF {
    TIFF::from_ifds(ByteOrder::LittleEndian, vec![page(1), page(2), page(3)])
}

#[test]
fn test_tiff_creation() {
    let tiff = TIFF::new(ByteOrder::BigEndian);
    std::assert_eq!(tiff.byte_order(), ByteOrder::BigEndian);
    std::assert_eq!(tiff.page_count(), 0);
    std::assert!(tiff.main_ifd().is_none());
}

#[test]
fn test_page_access() {
    let mut tiff = three_pages();
    std::assert_eq!(tiff.main_ifd().unwrap().get_u32(256), Some(1));
    std::assert_eq!(tiff.page(2).unwrap().get_u32(256), Some(3));
    std::assert!(matches!(
        tiff.page(3),
        Err(TiffError::PageOutOfRange { index: 3, count: 3 })
    ));

    tiff.page_mut(1).unwrap().add_field(TiffField::long(256, vec![20]));
    std::assert_eq!(widths(&tiff), vec![1, 20, 3]);
}

#[test]
fn test_insert_and_push() {
    let mut tiff = three_pages();
    std::assert_eq!(tiff.insert_page(1, page(9)), 1);
    std::assert_eq!(tiff.insert_page(100, page(8)), 4);
    tiff.push_page(page(7));
    std::assert_eq!(widths(&tiff), vec![1, 9, 2, 3, 8, 7]);
}

#[test]
fn test_remove_pages() {
    let mut tiff = three_pages();
    let removed = tiff.remove_page(0).unwrap();
    std::assert_eq!(removed.get_u32(256), Some(1));
    std::assert!(tiff.remove_page(5).is_err());

    let mut tiff = three_pages();
    tiff.remove_pages(&[2, 0, 2]).unwrap();
    std::assert_eq!(widths(&tiff), vec![2]);

    // A bad index leaves the chain untouched
    let mut tiff = three_pages();
    std::assert!(tiff.remove_pages(&[1, 7]).is_err());
    std::assert_eq!(tiff.page_count(), 3);
}

#[test]
fn test_retain_pages_keeps_chain_order() {
    let mut tiff = three_pages();
    tiff.retain_pages(&[2, 0]).unwrap();
    std::assert_eq!(widths(&tiff), vec![1, 3]);
}

#[test]
fn test_display_lists_pages() {
    let text = three_pages().to_string();
    std::assert!(text.contains("Number of IFDs: 3"));
    std::assert!(text.contains("IFD #2:"));
    std::assert!(text.contains("ImageWidth"));
}

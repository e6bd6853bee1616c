//! Tests for the byte order module

extern crate std;

use std::io::Cursor;
use byteorder::{LittleEndian, BigEndian, WriteBytesExt};
use crate::io::byte_order::{ByteOrder, ByteOrderHandler, LittleEndianHandler, BigEndianHandler};

#[test]
fn test_byte_order_detection_little_endian() {
    let mut buffer = Vec::new();
    buffer.write_u16::<LittleEndian>(0x4949).unwrap(); // II
    let mut cursor = Cursor::new(buffer);

    let result = ByteOrder::detect(&mut cursor);
    std::assert!(result.is_ok());
    std::assert_eq!(result.unwrap(), ByteOrder::LittleEndian);
}

#[test]
fn test_byte_order_detection_big_endian() {
    let mut buffer = Vec::new();
    buffer.write_u16::<BigEndian>(0x4D4D).unwrap(); // MM
    let mut cursor = Cursor::new(buffer);

    let result = ByteOrder::detect(&mut cursor);
    std::assert!(result.is_ok());
    std::assert_eq!(result.unwrap(), ByteOrder::BigEndian);
}

#[test]
fn test_byte_order_detection_invalid() {
    let mut buffer = Vec::new();
    buffer.write_u16::<LittleEndian>(0x1234).unwrap(); // Invalid
    let mut cursor = Cursor::new(buffer);

    let result = ByteOrder::detect(&mut cursor);
    std::assert!(result.is_err());
}

#[test]
fn test_byte_order_names() {
    std::assert_eq!(ByteOrder::from_name("II").unwrap(), ByteOrder::LittleEndian);
    std::assert_eq!(ByteOrder::from_name("big").unwrap(), ByteOrder::BigEndian);
    std::assert!(ByteOrder::from_name("middle").is_err());
    std::assert_eq!(ByteOrder::BigEndian.marker(), *b"MM");
}

#[test]
fn test_little_endian_handler() {
    let mut buffer = Vec::new();
    buffer.write_u16::<LittleEndian>(0x1234).unwrap();
    buffer.write_u32::<LittleEndian>(0x12345678).unwrap();
    buffer.write_i16::<LittleEndian>(-2).unwrap();
    buffer.write_f64::<LittleEndian>(1.5).unwrap();
    let mut cursor = Cursor::new(buffer);

    let handler = LittleEndianHandler;

    std::assert_eq!(handler.read_u16(&mut cursor).unwrap(), 0x1234);
    std::assert_eq!(handler.read_u32(&mut cursor).unwrap(), 0x12345678);
    std::assert_eq!(handler.read_i16(&mut cursor).unwrap(), -2);
    std::assert_eq!(handler.read_f64(&mut cursor).unwrap(), 1.5);
}

#[test]
fn test_big_endian_handler() {
    let mut buffer = Vec::new();
    buffer.write_u16::<BigEndian>(0x1234).unwrap();
    buffer.write_u32::<BigEndian>(0x12345678).unwrap();
    buffer.write_u32::<BigEndian>(3).unwrap();
    buffer.write_u32::<BigEndian>(4).unwrap();
    let mut cursor = Cursor::new(buffer);

    let handler = BigEndianHandler;

    std::assert_eq!(handler.read_u16(&mut cursor).unwrap(), 0x1234);
    std::assert_eq!(handler.read_u32(&mut cursor).unwrap(), 0x12345678);
    std::assert_eq!(handler.read_rational(&mut cursor).unwrap(), (3, 4));
}

#[test]
fn test_handlers_write_in_their_order() {
    let mut little = Cursor::new(Vec::new());
    LittleEndianHandler.write_u32(&mut little, 0x0102_0304).unwrap();
    LittleEndianHandler.write_i16(&mut little, -1).unwrap();

    let mut big = Cursor::new(Vec::new());
    BigEndianHandler.write_u32(&mut big, 0x0102_0304).unwrap();
    BigEndianHandler.write_u16(&mut big, 0x0A0B).unwrap();

    std::assert_eq!(little.into_inner(), vec![4, 3, 2, 1, 0xFF, 0xFF]);
    std::assert_eq!(big.into_inner(), vec![1, 2, 3, 4, 0x0A, 0x0B]);
}

#[test]
fn test_create_handler_matches_order() {
    std::assert_eq!(ByteOrder::LittleEndian.create_handler().byte_order(), ByteOrder::LittleEndian);
    std::assert_eq!(ByteOrder::BigEndian.create_handler().byte_order(), ByteOrder::BigEndian);
}

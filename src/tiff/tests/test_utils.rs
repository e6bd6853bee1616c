use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use std::io::{Cursor, Seek, SeekFrom, Write};

/// One raw 12-byte directory entry
///
/// `slot` is written as a 32-bit value in the file's byte order, which is
/// what a single LONG or an offset looks like. Use `RawTiff::short_slot`
/// for an inline SHORT.
#[derive(Debug, Clone, Copy)]
pub struct RawEntry {
    pub tag: u16,
    pub field_type: u16,
    pub count: u32,
    pub slot: u32,
}

pub fn entry(tag: u16, field_type: u16, count: u32, slot: u32) -> RawEntry {
    RawEntry {
        tag,
        field_type,
        count,
        slot,
    }
}

/// Hand-assembles classic TIFF files at fixed offsets
pub struct RawTiff {
    cursor: Cursor<Vec<u8>>,
    big_endian: bool,
}

impl RawTiff {
    pub fn little_endian(first_ifd: u32) -> Self {
        Self::with_header(false, 42, first_ifd)
    }

    pub fn big_endian(first_ifd: u32) -> Self {
        Self::with_header(true, 42, first_ifd)
    }

    /// Header with an arbitrary version number
    pub fn with_header(big_endian: bool, version: u16, first_ifd: u32) -> Self {
        let mut raw = RawTiff {
            cursor: Cursor::new(Vec::new()),
            big_endian,
        };
        let marker: &[u8] = if big_endian { b"MM" } else { b"II" };
        raw.cursor.write_all(marker).unwrap();
        raw.u16(version);
        raw.u32(first_ifd);
        raw
    }

    fn u16(&mut self, value: u16) {
        if self.big_endian {
            self.cursor.write_u16::<BigEndian>(value).unwrap();
        } else {
            self.cursor.write_u16::<LittleEndian>(value).unwrap();
        }
    }

    fn u32(&mut self, value: u32) {
        if self.big_endian {
            self.cursor.write_u32::<BigEndian>(value).unwrap();
        } else {
            self.cursor.write_u32::<LittleEndian>(value).unwrap();
        }
    }

    /// Slot value that reads back as a single inline SHORT
    pub fn short_slot(&self, value: u16) -> u32 {
        if self.big_endian {
            (value as u32) << 16
        } else {
            value as u32
        }
    }

    /// Writes a directory at `offset`
    pub fn directory(&mut self, offset: u32, entries: &[RawEntry], next: u32) -> &mut Self {
        self.cursor.seek(SeekFrom::Start(offset as u64)).unwrap();
        self.u16(entries.len() as u16);
        for e in entries {
            self.u16(e.tag);
            self.u16(e.field_type);
            self.u32(e.count);
            self.u32(e.slot);
        }
        self.u32(next);
        self
    }

    /// Writes raw bytes at `offset`
    pub fn bytes(&mut self, offset: u32, data: &[u8]) -> &mut Self {
        self.cursor.seek(SeekFrom::Start(offset as u64)).unwrap();
        self.cursor.write_all(data).unwrap();
        self
    }

    /// Writes 32-bit values in the file's byte order at `offset`
    pub fn longs(&mut self, offset: u32, values: &[u32]) -> &mut Self {
        self.cursor.seek(SeekFrom::Start(offset as u64)).unwrap();
        for &v in values {
            self.u32(v);
        }
        self
    }

    pub fn cursor(&self) -> Cursor<Vec<u8>> {
        Cursor::new(self.cursor.get_ref().clone())
    }
}

/// Single page, 800x600, two LONG entries
pub fn create_test_tiff_buffer() -> Cursor<Vec<u8>> {
    RawTiff::little_endian(8)
        .directory(8, &[entry(256, 4, 1, 800), entry(257, 4, 1, 600)], 0)
        .cursor()
}

/// Three pages chained at offsets 8, 26 and 44, widths 1, 2 and 3
pub fn create_chained_tiff_buffer() -> Cursor<Vec<u8>> {
    RawTiff::little_endian(8)
        .directory(8, &[entry(256, 4, 1, 1)], 26)
        .directory(26, &[entry(256, 4, 1, 2)], 44)
        .directory(44, &[entry(256, 4, 1, 3)], 0)
        .cursor()
}

/// Single page whose EXIF pointer leads far outside the file
pub fn create_corrupt_exif_buffer() -> Cursor<Vec<u8>> {
    RawTiff::little_endian(8)
        .directory(
            8,
            &[
                entry(256, 4, 1, 640),
                entry(257, 4, 1, 480),
                entry(34665, 4, 1, 0x00FF_0000),
            ],
            0,
        )
        .cursor()
}

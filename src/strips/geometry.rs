//! Strip and tile geometry
//!
//! Derives how many bytes each strip or tile of an uncompressed image
//! should hold from the image description fields. Files in the wild often
//! state wrong byte counts (a StripByteCounts of 0, or the size of a
//! padded buffer), so relocation relies on these figures instead.

use log::trace;

use crate::tiff::constants::{photometric, planar_config, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;

/// How the pixel data of an image is cut into pieces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataLayout {
    Strips { rows_per_strip: u32 },
    Tiles { tile_width: u32, tile_length: u32 },
}

/// Image description fields relevant to the size of the pixel data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageGeometry {
    pub width: u32,
    pub height: u32,
    pub bits_per_sample: Vec<u32>,
    pub samples_per_pixel: u32,
    pub planar: bool,
    pub ycbcr_subsampling: Option<(u32, u32)>,
    pub layout: DataLayout,
}

fn round_up(value: u32, multiple: u32) -> u32 {
    if multiple <= 1 {
        return value;
    }
    let value = value as u64;
    let multiple = multiple as u64;
    (value.div_ceil(multiple) * multiple) as u32
}

/// Bytes needed for `samples` samples of `bits` bits each
fn packed_bytes(samples: u64, bits: u64) -> u64 {
    (samples * bits).div_ceil(8)
}

/// Rows held by strip `index` when every strip but the last holds
/// `rows_per_strip` rows
fn strip_rows(index: usize, rows_per_strip: u32, total_rows: u32) -> u32 {
    let start = index as u64 * rows_per_strip as u64;
    if start >= total_rows as u64 {
        return 0;
    }
    (total_rows as u64 - start).min(rows_per_strip as u64) as u32
}

impl ImageGeometry {
    /// Collects the geometry of the image described by `ifd`
    ///
    /// Missing BitsPerSample, SamplesPerPixel and PlanarConfiguration
    /// default to 1; a missing RowsPerStrip means a single strip.
    pub fn from_ifd(ifd: &IFD) -> TiffResult<Self> {
        let (width, height) = ifd.get_dimensions().ok_or(TiffError::MissingDimensions)?;
        let samples_per_pixel = ifd.get_samples_per_pixel();
        let bits_per_sample = ifd
            .get_u32_values(tags::BITS_PER_SAMPLE)
            .filter(|bits| !bits.is_empty())
            .unwrap_or_else(|| vec![1]);
        let planar = ifd.get_u32(tags::PLANAR_CONFIGURATION) == Some(planar_config::PLANAR as u32);

        let ycbcr_subsampling = if ifd.get_u32(tags::PHOTOMETRIC_INTERPRETATION) == Some(photometric::YCBCR as u32) {
            let factors = match ifd.get_u32_values(tags::YCBCR_SUBSAMPLING) {
                Some(v) if v.len() >= 2 => (v[0], v[1]),
                _ => (2, 2),
            };
            if factors.0 == 0 || factors.1 == 0 {
                return Err(TiffError::InvalidGeometry(format!(
                    "YCbCr subsampling {}x{} has a zero factor",
                    factors.0, factors.1
                )));
            }
            Some(factors)
        } else {
            None
        };

        let layout = match (ifd.get_u32(tags::TILE_WIDTH), ifd.get_u32(tags::TILE_LENGTH)) {
            (Some(tile_width), Some(tile_length)) => {
                if tile_width == 0 || tile_length == 0 {
                    return Err(TiffError::InvalidGeometry(format!(
                        "Tile size {}x{} is empty",
                        tile_width, tile_length
                    )));
                }
                DataLayout::Tiles { tile_width, tile_length }
            }
            _ => {
                // With subsampling a single strip covers the padded rows too
                let strip_height = match ycbcr_subsampling {
                    Some((_, v)) => round_up(height, v),
                    None => height,
                };
                let rows_per_strip = match ifd.get_u32(tags::ROWS_PER_STRIP) {
                    Some(rows) if rows < height => rows,
                    _ => strip_height,
                };
                if rows_per_strip == 0 && height > 0 {
                    return Err(TiffError::InvalidGeometry("RowsPerStrip is 0".to_string()));
                }
                DataLayout::Strips { rows_per_strip }
            }
        };

        Ok(ImageGeometry {
            width,
            height,
            bits_per_sample,
            samples_per_pixel,
            planar,
            ycbcr_subsampling,
            layout,
        })
    }

    /// Bits of one sample in `plane`
    pub fn bits_for_sample(&self, plane: usize) -> u32 {
        if self.bits_per_sample.len() == self.samples_per_pixel as usize {
            self.bits_per_sample.get(plane).copied().unwrap_or(1)
        } else {
            self.bits_per_sample.first().copied().unwrap_or(1)
        }
    }

    /// Bits of one interleaved pixel
    ///
    /// Sums BitsPerSample when it lists every sample, otherwise repeats
    /// its first value for each sample.
    pub fn bits_per_pixel(&self) -> u64 {
        if self.bits_per_sample.len() == self.samples_per_pixel as usize {
            self.bits_per_sample.iter().map(|&b| b as u64).sum()
        } else {
            self.bits_for_sample(0) as u64 * self.samples_per_pixel as u64
        }
    }

    /// Whether every sample has the same bit depth
    pub fn has_uniform_samples(&self) -> bool {
        self.bits_per_sample.windows(2).all(|w| w[0] == w[1])
    }

    /// Bytes per row of one strip or tile (of one plane if planar)
    pub fn scan_line_stride(&self) -> usize {
        let width = match self.layout {
            DataLayout::Strips { .. } => self.padded_dimensions().0,
            DataLayout::Tiles { tile_width, .. } => tile_width,
        };
        let bits = if self.planar {
            self.bits_for_sample(0) as u64
        } else {
            self.bits_per_pixel()
        };
        packed_bytes(width as u64, bits) as usize
    }

    /// Number of separately stored planes
    pub fn plane_count(&self) -> usize {
        if self.planar {
            self.samples_per_pixel as usize
        } else {
            1
        }
    }

    /// Width and height rounded up to whole subsampling blocks
    fn padded_dimensions(&self) -> (u32, u32) {
        match self.ycbcr_subsampling {
            Some((h, v)) => (round_up(self.width, h), round_up(self.height, v)),
            None => (self.width, self.height),
        }
    }

    /// Number of strips or tiles a well-formed file stores
    pub fn expected_piece_count(&self) -> usize {
        let (width, height) = self.padded_dimensions();
        let per_plane = match self.layout {
            DataLayout::Strips { rows_per_strip } => {
                if rows_per_strip == 0 {
                    0
                } else {
                    height.div_ceil(rows_per_strip) as usize
                }
            }
            DataLayout::Tiles { tile_width, tile_length } => {
                width.div_ceil(tile_width) as usize * height.div_ceil(tile_length) as usize
            }
        };
        per_plane * self.plane_count()
    }

    /// Bytes of a block `width` pixels wide and `rows` rows high
    ///
    /// `plane` is `None` for interleaved data. With YCbCr subsampling the
    /// luma plane keeps full resolution and each chroma plane is reduced
    /// by the subsampling factors.
    fn block_bytes(&self, width: u32, rows: u32, plane: Option<usize>) -> u64 {
        let rows = rows as u64;
        match (self.ycbcr_subsampling, plane) {
            (Some((h, v)), plane) => {
                let bits = self.bits_for_sample(0) as u64;
                let luma = packed_bytes(width as u64, bits) * rows;
                let chroma = packed_bytes((width / h) as u64, bits) * rows.div_ceil(v as u64);
                match plane {
                    None => luma + 2 * chroma,
                    Some(0) => luma,
                    Some(_) => chroma,
                }
            }
            (None, None) => packed_bytes(width as u64, self.bits_per_pixel()) * rows,
            (None, Some(p)) => packed_bytes(width as u64, self.bits_for_sample(p) as u64) * rows,
        }
    }

    /// Expected size of each of `piece_count` strips or tiles
    ///
    /// With separate planes the pieces are split evenly between the
    /// planes, and within each plane the last strip may be short.
    pub fn byte_counts(&self, piece_count: usize) -> TiffResult<Vec<u32>> {
        let planes = self.plane_count();
        if planes == 0 || piece_count % planes != 0 {
            return Err(TiffError::InvalidGeometry(format!(
                "{} pieces cannot be split across {} planes",
                piece_count, planes
            )));
        }

        let per_plane = piece_count / planes;
        let (width, height) = self.padded_dimensions();
        let mut counts = Vec::with_capacity(piece_count);

        for plane_index in 0..planes {
            let plane = if self.planar { Some(plane_index) } else { None };
            for index in 0..per_plane {
                let bytes = match self.layout {
                    DataLayout::Strips { rows_per_strip } => {
                        let rows = strip_rows(index, rows_per_strip, height);
                        self.block_bytes(width, rows, plane)
                    }
                    DataLayout::Tiles { tile_width, tile_length } => {
                        let tile_width = match self.ycbcr_subsampling {
                            Some((h, _)) => round_up(tile_width, h),
                            None => tile_width,
                        };
                        self.block_bytes(tile_width, tile_length, plane)
                    }
                };
                counts.push(u32::try_from(bytes).map_err(|_| TiffError::ValueOutOfRange(bytes))?);
            }
        }

        trace!("Expected byte counts: {:?}", counts);
        Ok(counts)
    }
}

/// Expected byte count of each of the `strip_count` strips (or tiles) of
/// the uncompressed image described by `ifd`
pub fn expected_byte_counts(ifd: &IFD, strip_count: usize) -> TiffResult<Vec<u32>> {
    ImageGeometry::from_ifd(ifd)?.byte_counts(strip_count)
}

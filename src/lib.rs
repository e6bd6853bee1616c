pub mod io;
pub mod tiff;
pub mod strips;
pub mod utils;
pub mod config;
pub mod commands;

pub use config::Config;
pub use strips::{expected_byte_counts, flip_sample_endianness};
pub use tiff::{ByteOrder, EditScript, TiffBuilder, TiffError, TiffReader, TiffResult, TiffWriter, IFD, TIFF};

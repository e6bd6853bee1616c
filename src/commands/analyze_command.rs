//! TIFF structure analysis command
//!
//! Prints the directory tree of every page with resolved tag names, and
//! compares the stated strip or tile byte counts with the ones derived
//! from the image geometry.

use clap::ArgMatches;
use log::{debug, info};

use crate::commands::command_traits::Command;
use crate::config::Config;
use crate::strips::geometry::ImageGeometry;
use crate::tiff::constants::{compression, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::tag_sets::BaselineTags;
use crate::tiff::types::TIFF;
use crate::tiff::TiffReader;

/// Command for analyzing TIFF file structure
pub struct AnalyzeCommand<'a> {
    input_file: String,
    config: &'a Config,
}

impl<'a> AnalyzeCommand<'a> {
    pub fn new(args: &ArgMatches, config: &'a Config) -> TiffResult<Self> {
        let input_file = args
            .get_one::<String>("input")
            .ok_or_else(|| TiffError::GenericError("Missing input file".to_string()))?
            .clone();

        Ok(AnalyzeCommand { input_file, config })
    }
}

/// Stated and expected byte counts of one page, formatted for the report
fn byte_count_report(ifd: &IFD) -> Option<String> {
    let (offsets_tag, counts_tag) = if ifd.is_tiled() {
        (tags::TILE_OFFSETS, tags::TILE_BYTE_COUNTS)
    } else {
        (tags::STRIP_OFFSETS, tags::STRIP_BYTE_COUNTS)
    };
    let piece_count = ifd.get_field(offsets_tag)?.count() as usize;
    let stated = ifd.get_u32_values(counts_tag).unwrap_or_default();
    let kind = if ifd.is_tiled() { "tile" } else { "strip" };

    let uncompressed = ifd.get_u32(tags::COMPRESSION).unwrap_or(compression::NONE as u32) == compression::NONE as u32;
    if !uncompressed {
        return Some(format!(
            "  {} {}(s), compressed, {} bytes stated\n",
            piece_count,
            kind,
            stated.iter().map(|&c| c as u64).sum::<u64>()
        ));
    }

    let geometry = match ImageGeometry::from_ifd(ifd) {
        Ok(geometry) => geometry,
        Err(e) => return Some(format!("  {} {}(s), geometry unavailable: {}\n", piece_count, kind, e)),
    };

    let mut out = format!(
        "  {} {}(s), {} expected from geometry\n",
        piece_count,
        kind,
        geometry.expected_piece_count()
    );
    match geometry.byte_counts(piece_count) {
        Ok(expected) if expected == stated => out.push_str("  Byte counts match geometry\n"),
        Ok(expected) => out.push_str(&format!("  Byte counts differ: stated {:?}, expected {:?}\n", stated, expected)),
        Err(e) => out.push_str(&format!("  Byte counts not checked: {}\n", e)),
    }
    Some(out)
}

/// Renders the analysis of a whole file
pub fn render_report(tiff: &TIFF) -> String {
    let mut out = String::new();
    out.push_str("TIFF Analysis Results:\n");
    out.push_str(&format!("  Byte order: {}\n", tiff.byte_order().name()));
    out.push_str(&format!("  Number of IFDs: {}\n", tiff.page_count()));

    for (index, ifd) in tiff.pages().iter().enumerate() {
        out.push_str(&format!("\nIFD #{}\n", index));
        match ifd.get_dimensions() {
            Some((width, height)) => out.push_str(&format!("  Dimensions: {}x{}\n", width, height)),
            None => out.push_str("  Dimensions: Not available\n"),
        }
        if let Some(report) = byte_count_report(ifd) {
            out.push_str(&report);
        }
        out.push_str(&ifd.describe(&BaselineTags, 2));
    }

    out
}

impl<'a> Command for AnalyzeCommand<'a> {
    fn execute(&self) -> TiffResult<()> {
        info!("Analyzing TIFF file: {}", self.input_file);
        debug!("Read limits: {:?}", self.config.read);

        let reader = TiffReader::with_options(self.config.read);
        let tiff = reader.load(&self.input_file)?;

        print!("{}", render_report(&tiff));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::byte_order::ByteOrder;
    use crate::tiff::field::TiffField;

    #[test]
    fn test_report_flags_wrong_byte_count() {
        let mut ifd = IFD::new();
        ifd.add_field(TiffField::long(tags::IMAGE_WIDTH, vec![100]));
        ifd.add_field(TiffField::long(tags::IMAGE_LENGTH, vec![10]));
        ifd.add_field(TiffField::short(tags::BITS_PER_SAMPLE, vec![8]));
        ifd.add_field(TiffField::long(tags::STRIP_OFFSETS, vec![8]));
        ifd.add_field(TiffField::long(tags::STRIP_BYTE_COUNTS, vec![999]));

        let tiff = TIFF::from_ifds(ByteOrder::LittleEndian, vec![ifd]);
        let report = render_report(&tiff);

        assert!(report.contains("Number of IFDs: 1"));
        assert!(report.contains("Dimensions: 100x10"));
        assert!(report.contains("stated [999], expected [1000]"));
        assert!(report.contains("ImageWidth (256)"));
    }

    #[test]
    fn test_report_lines_for_matching_and_missing_dimensions() {
        let mut sized = IFD::new();
        sized.add_field(TiffField::long(tags::IMAGE_WIDTH, vec![4]));
        sized.add_field(TiffField::long(tags::IMAGE_LENGTH, vec![2]));
        sized.add_field(TiffField::short(tags::BITS_PER_SAMPLE, vec![8]));
        sized.add_field(TiffField::long(tags::STRIP_OFFSETS, vec![8]));
        sized.add_field(TiffField::long(tags::STRIP_BYTE_COUNTS, vec![8]));

        let tiff = TIFF::from_ifds(ByteOrder::BigEndian, vec![sized, IFD::new()]);
        let report = render_report(&tiff);
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[0], "TIFF Analysis Results:");
        assert_eq!(lines[2], "  Number of IFDs: 2");
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "IFD #0");
        assert_eq!(lines[5], "  Dimensions: 4x2");
        assert!(lines.contains(&"  Byte counts match geometry"));
        assert!(lines.contains(&"IFD #1"));
        assert!(lines.contains(&"  Dimensions: Not available"));
    }
}

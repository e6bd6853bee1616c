//! Tag name lookup per directory namespace
//!
//! The same numeric tag means different things in the main image
//! directory, the EXIF sub-IFD, the GPS sub-IFD and the Interoperability
//! sub-IFD (GPS tag 1 is `GPSLatitudeRef`, Interop tag 1 is
//! `InteroperabilityIndex`). Each namespace implements `TagSet`.

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;

use crate::tiff::constants::tags;

/// A resolved tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub id: u16,
    pub name: &'static str,
    /// Whether the namespace knew this tag
    pub known: bool,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.known {
            write!(f, "{} ({})", self.name, self.id)
        } else {
            write!(f, "Unknown ({:#06x})", self.id)
        }
    }
}

/// A namespace of tags
pub trait TagSet: Sync {
    /// Name of the namespace, e.g. "EXIF"
    fn name(&self) -> &'static str;

    /// The name table backing this namespace
    fn table(&self) -> &'static HashMap<u16, &'static str>;

    fn resolve(&self, id: u16) -> Tag {
        match self.table().get(&id) {
            Some(&name) => Tag { id, name, known: true },
            None => Tag { id, name: "Unknown", known: false },
        }
    }

    /// Looks a tag up by name, ignoring case
    fn find(&self, name: &str) -> Option<u16> {
        self.table()
            .iter()
            .find(|(_, known)| known.eq_ignore_ascii_case(name))
            .map(|(&id, _)| id)
    }
}

lazy_static! {
    static ref BASELINE_NAMES: HashMap<u16, &'static str> = [
        (tags::NEW_SUBFILE_TYPE, "NewSubfileType"),
        (tags::SUBFILE_TYPE, "SubfileType"),
        (tags::IMAGE_WIDTH, "ImageWidth"),
        (tags::IMAGE_LENGTH, "ImageLength"),
        (tags::BITS_PER_SAMPLE, "BitsPerSample"),
        (tags::COMPRESSION, "Compression"),
        (tags::PHOTOMETRIC_INTERPRETATION, "PhotometricInterpretation"),
        (tags::FILL_ORDER, "FillOrder"),
        (tags::DOCUMENT_NAME, "DocumentName"),
        (tags::IMAGE_DESCRIPTION, "ImageDescription"),
        (tags::MAKE, "Make"),
        (tags::MODEL, "Model"),
        (tags::STRIP_OFFSETS, "StripOffsets"),
        (tags::ORIENTATION, "Orientation"),
        (tags::SAMPLES_PER_PIXEL, "SamplesPerPixel"),
        (tags::ROWS_PER_STRIP, "RowsPerStrip"),
        (tags::STRIP_BYTE_COUNTS, "StripByteCounts"),
        (tags::MIN_SAMPLE_VALUE, "MinSampleValue"),
        (tags::MAX_SAMPLE_VALUE, "MaxSampleValue"),
        (tags::X_RESOLUTION, "XResolution"),
        (tags::Y_RESOLUTION, "YResolution"),
        (tags::PLANAR_CONFIGURATION, "PlanarConfiguration"),
        (tags::PAGE_NAME, "PageName"),
        (tags::RESOLUTION_UNIT, "ResolutionUnit"),
        (tags::PAGE_NUMBER, "PageNumber"),
        (tags::TRANSFER_FUNCTION, "TransferFunction"),
        (tags::SOFTWARE, "Software"),
        (tags::DATE_TIME, "DateTime"),
        (tags::ARTIST, "Artist"),
        (tags::HOST_COMPUTER, "HostComputer"),
        (tags::PREDICTOR, "Predictor"),
        (tags::WHITE_POINT, "WhitePoint"),
        (tags::PRIMARY_CHROMATICITIES, "PrimaryChromaticities"),
        (tags::COLOR_MAP, "ColorMap"),
        (tags::TILE_WIDTH, "TileWidth"),
        (tags::TILE_LENGTH, "TileLength"),
        (tags::TILE_OFFSETS, "TileOffsets"),
        (tags::TILE_BYTE_COUNTS, "TileByteCounts"),
        (tags::SUB_IFDS, "SubIFDs"),
        (tags::INK_SET, "InkSet"),
        (tags::EXTRA_SAMPLES, "ExtraSamples"),
        (tags::SAMPLE_FORMAT, "SampleFormat"),
        (tags::JPEG_TABLES, "JPEGTables"),
        (tags::JPEG_INTERCHANGE_FORMAT, "JPEGInterchangeFormat"),
        (tags::JPEG_INTERCHANGE_FORMAT_LENGTH, "JPEGInterchangeFormatLength"),
        (tags::YCBCR_COEFFICIENTS, "YCbCrCoefficients"),
        (tags::YCBCR_SUBSAMPLING, "YCbCrSubSampling"),
        (tags::YCBCR_POSITIONING, "YCbCrPositioning"),
        (tags::REFERENCE_BLACK_WHITE, "ReferenceBlackWhite"),
        (tags::XMP, "XMP"),
        (tags::COPYRIGHT, "Copyright"),
        (tags::IPTC, "IPTC"),
        (tags::PHOTOSHOP, "Photoshop"),
        (tags::EXIF_SUB_IFD, "ExifIFD"),
        (tags::ICC_PROFILE, "ICCProfile"),
        (tags::GPS_SUB_IFD, "GPSIFD"),
    ]
    .into_iter()
    .collect();

    static ref EXIF_NAMES: HashMap<u16, &'static str> = [
        (0x829A, "ExposureTime"),
        (0x829D, "FNumber"),
        (0x8822, "ExposureProgram"),
        (0x8824, "SpectralSensitivity"),
        (0x8827, "ISOSpeedRatings"),
        (0x8828, "OECF"),
        (0x9000, "ExifVersion"),
        (0x9003, "DateTimeOriginal"),
        (0x9004, "DateTimeDigitized"),
        (0x9010, "OffsetTime"),
        (0x9011, "OffsetTimeOriginal"),
        (0x9101, "ComponentsConfiguration"),
        (0x9102, "CompressedBitsPerPixel"),
        (0x9201, "ShutterSpeedValue"),
        (0x9202, "ApertureValue"),
        (0x9203, "BrightnessValue"),
        (0x9204, "ExposureBiasValue"),
        (0x9205, "MaxApertureValue"),
        (0x9206, "SubjectDistance"),
        (0x9207, "MeteringMode"),
        (0x9208, "LightSource"),
        (0x9209, "Flash"),
        (0x920A, "FocalLength"),
        (0x9214, "SubjectArea"),
        (0x927C, "MakerNote"),
        (0x9286, "UserComment"),
        (0x9290, "SubSecTime"),
        (0x9291, "SubSecTimeOriginal"),
        (0x9292, "SubSecTimeDigitized"),
        (0xA000, "FlashpixVersion"),
        (0xA001, "ColorSpace"),
        (0xA002, "PixelXDimension"),
        (0xA003, "PixelYDimension"),
        (0xA004, "RelatedSoundFile"),
        (tags::INTEROPERABILITY_SUB_IFD, "InteroperabilityIFD"),
        (0xA20B, "FlashEnergy"),
        (0xA20E, "FocalPlaneXResolution"),
        (0xA20F, "FocalPlaneYResolution"),
        (0xA210, "FocalPlaneResolutionUnit"),
        (0xA215, "ExposureIndex"),
        (0xA217, "SensingMethod"),
        (0xA300, "FileSource"),
        (0xA301, "SceneType"),
        (0xA302, "CFAPattern"),
        (0xA401, "CustomRendered"),
        (0xA402, "ExposureMode"),
        (0xA403, "WhiteBalance"),
        (0xA404, "DigitalZoomRatio"),
        (0xA405, "FocalLengthIn35mmFilm"),
        (0xA406, "SceneCaptureType"),
        (0xA407, "GainControl"),
        (0xA408, "Contrast"),
        (0xA409, "Saturation"),
        (0xA40A, "Sharpness"),
        (0xA40C, "SubjectDistanceRange"),
        (0xA420, "ImageUniqueID"),
        (0xA430, "CameraOwnerName"),
        (0xA431, "BodySerialNumber"),
        (0xA432, "LensSpecification"),
        (0xA433, "LensMake"),
        (0xA434, "LensModel"),
        (0xA435, "LensSerialNumber"),
    ]
    .into_iter()
    .collect();

    static ref GPS_NAMES: HashMap<u16, &'static str> = [
        (0x00, "GPSVersionID"),
        (0x01, "GPSLatitudeRef"),
        (0x02, "GPSLatitude"),
        (0x03, "GPSLongitudeRef"),
        (0x04, "GPSLongitude"),
        (0x05, "GPSAltitudeRef"),
        (0x06, "GPSAltitude"),
        (0x07, "GPSTimeStamp"),
        (0x08, "GPSSatellites"),
        (0x09, "GPSStatus"),
        (0x0A, "GPSMeasureMode"),
        (0x0B, "GPSDOP"),
        (0x0C, "GPSSpeedRef"),
        (0x0D, "GPSSpeed"),
        (0x0E, "GPSTrackRef"),
        (0x0F, "GPSTrack"),
        (0x10, "GPSImgDirectionRef"),
        (0x11, "GPSImgDirection"),
        (0x12, "GPSMapDatum"),
        (0x13, "GPSDestLatitudeRef"),
        (0x14, "GPSDestLatitude"),
        (0x15, "GPSDestLongitudeRef"),
        (0x16, "GPSDestLongitude"),
        (0x17, "GPSDestBearingRef"),
        (0x18, "GPSDestBearing"),
        (0x19, "GPSDestDistanceRef"),
        (0x1A, "GPSDestDistance"),
        (0x1B, "GPSProcessingMethod"),
        (0x1C, "GPSAreaInformation"),
        (0x1D, "GPSDateStamp"),
        (0x1E, "GPSDifferential"),
        (0x1F, "GPSHPositioningError"),
    ]
    .into_iter()
    .collect();

    static ref INTEROP_NAMES: HashMap<u16, &'static str> = [
        (0x0001, "InteroperabilityIndex"),
        (0x0002, "InteroperabilityVersion"),
        (0x1000, "RelatedImageFileFormat"),
        (0x1001, "RelatedImageWidth"),
        (0x1002, "RelatedImageLength"),
    ]
    .into_iter()
    .collect();
}

/// Tags of the main image directories (TIFF 6.0 baseline and extensions)
pub struct BaselineTags;

/// Tags of the EXIF sub-IFD
pub struct ExifTags;

/// Tags of the GPS sub-IFD
pub struct GpsTags;

/// Tags of the Interoperability sub-IFD
pub struct InteropTags;

impl TagSet for BaselineTags {
    fn name(&self) -> &'static str {
        "TIFF"
    }

    fn table(&self) -> &'static HashMap<u16, &'static str> {
        &BASELINE_NAMES
    }
}

impl TagSet for ExifTags {
    fn name(&self) -> &'static str {
        "EXIF"
    }

    fn table(&self) -> &'static HashMap<u16, &'static str> {
        &EXIF_NAMES
    }
}

impl TagSet for GpsTags {
    fn name(&self) -> &'static str {
        "GPS"
    }

    fn table(&self) -> &'static HashMap<u16, &'static str> {
        &GPS_NAMES
    }
}

impl TagSet for InteropTags {
    fn name(&self) -> &'static str {
        "Interoperability"
    }

    fn table(&self) -> &'static HashMap<u16, &'static str> {
        &INTEROP_NAMES
    }
}

/// Namespace of the directory reached through `parent_tag`
///
/// Generic SubIFDs hold further image directories, so they resolve
/// against the baseline table like the top-level pages.
pub fn tag_set_for(parent_tag: u16) -> &'static dyn TagSet {
    match parent_tag {
        tags::EXIF_SUB_IFD => &ExifTags,
        tags::GPS_SUB_IFD => &GpsTags,
        tags::INTEROPERABILITY_SUB_IFD => &InteropTags,
        _ => &BaselineTags,
    }
}

/// Name of a tag in the top-level namespace
pub fn get_tag_name(tag: u16) -> &'static str {
    BaselineTags.resolve(tag).name
}

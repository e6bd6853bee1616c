//! Metadata edit scripts
//!
//! An edit script is a list of operations applied to the pages of a TIFF:
//! set a field, remove a field, drop a sub-IFD, remove pages. Scripts are
//! written in TOML:
//!
//! ```toml
//! remove_pages = [2]
//!
//! [[set]]
//! tag = "Software"
//! type = "ascii"
//! value = "ifdkit"
//!
//! [[remove]]
//! tag = 700
//! page = 0
//!
//! [[strip_subifd]]
//! tag = "GPSIFD"
//! ```
//!
//! Operations without a `page` apply to every page. Page removal always
//! runs last so page numbers refer to the file as it was read.

use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::field::{FieldValue, TiffField};
use crate::tiff::field_type::FieldType;
use crate::tiff::ifd::IFD;
use crate::tiff::tag_sets::{BaselineTags, ExifTags, GpsTags, TagSet};
use crate::tiff::types::TIFF;

lazy_static! {
    /// `TAG:TYPE=VALUE`, e.g. `Software:ascii=ifdkit` or `282:rational=300/1`
    static ref SET_ARGUMENT: Option<Regex> = Regex::new(r"^\s*([A-Za-z0-9_]+)\s*:\s*([A-Za-z]+)\s*=(.*)$").ok();
}

/// One change to a TIFF
#[derive(Debug, Clone, PartialEq)]
pub enum EditOperation {
    /// Adds or replaces a field on one page, or on all pages for `None`
    SetField { page: Option<usize>, field: TiffField },
    RemoveField { page: Option<usize>, tag: u16 },
    /// Drops a pointer field and the directories below it
    StripSubIfd { page: Option<usize>, tag: u16 },
    RemovePages(Vec<usize>),
}

/// An ordered list of edit operations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditScript {
    operations: Vec<EditOperation>,
}

/// Parses a tag given as a decimal number, a `0x` hex number or a name
/// known to the baseline, EXIF or GPS tables
pub fn parse_tag(text: &str) -> TiffResult<u16> {
    let text = text.trim();
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).ok()
    } else if text.chars().all(|c| c.is_ascii_digit()) {
        text.parse::<u16>().ok()
    } else {
        BaselineTags
            .find(text)
            .or_else(|| ExifTags.find(text))
            .or_else(|| GpsTags.find(text))
    };

    parsed.ok_or_else(|| TiffError::InvalidConfig(format!("Unknown tag: {}", text)))
}

fn parse_list<T: FromStr>(tokens: &[String], tag: u16) -> TiffResult<Vec<T>> {
    tokens
        .iter()
        .map(|token| {
            token
                .trim()
                .parse::<T>()
                .map_err(|_| TiffError::InvalidConfig(format!("Invalid value '{}' for tag {}", token, tag)))
        })
        .collect()
}

fn parse_fractions<T: FromStr>(tokens: &[String], tag: u16) -> TiffResult<Vec<(T, T)>> {
    tokens
        .iter()
        .map(|token| {
            let token = token.trim();
            let (numerator, denominator) = token.split_once('/').unwrap_or((token, "1"));
            let parse = |part: &str| {
                part.trim()
                    .parse::<T>()
                    .map_err(|_| TiffError::InvalidConfig(format!("Invalid fraction '{}' for tag {}", token, tag)))
            };
            Ok((parse(numerator)?, parse(denominator)?))
        })
        .collect()
}

/// Builds a field of `field_type` from textual values
///
/// ASCII takes the text as a whole; every other type takes one value per
/// token, rationals as `numerator/denominator`.
pub fn parse_field(tag: u16, field_type: FieldType, tokens: &[String]) -> TiffResult<TiffField> {
    let value = match field_type {
        FieldType::Ascii => return Ok(TiffField::ascii(tag, &tokens.join(","))),
        FieldType::Byte => FieldValue::Byte(parse_list(tokens, tag)?),
        FieldType::Undefined => FieldValue::Undefined(parse_list(tokens, tag)?),
        FieldType::SByte => FieldValue::SByte(parse_list(tokens, tag)?),
        FieldType::Short => FieldValue::Short(parse_list(tokens, tag)?),
        FieldType::SShort => FieldValue::SShort(parse_list(tokens, tag)?),
        FieldType::Long => FieldValue::Long(parse_list(tokens, tag)?),
        FieldType::SLong => FieldValue::SLong(parse_list(tokens, tag)?),
        FieldType::Float => FieldValue::Float(parse_list(tokens, tag)?),
        FieldType::Double => FieldValue::Double(parse_list(tokens, tag)?),
        FieldType::Rational => FieldValue::Rational(parse_fractions(tokens, tag)?),
        FieldType::SRational => FieldValue::SRational(parse_fractions(tokens, tag)?),
        FieldType::Ifd | FieldType::Unknown => {
            return Err(TiffError::InvalidConfig(format!(
                "Fields of type {} cannot be set by an edit",
                field_type
            )))
        }
    };

    if value.count() == 0 {
        return Err(TiffError::InvalidConfig(format!("No value given for tag {}", tag)));
    }
    Ok(TiffField::new(tag, value))
}

/// Parses a `TAG:TYPE=VALUE` argument, values separated by commas
pub fn parse_set_argument(argument: &str) -> TiffResult<TiffField> {
    let captures = SET_ARGUMENT
        .as_ref()
        .and_then(|pattern| pattern.captures(argument))
        .ok_or_else(|| TiffError::InvalidConfig(format!("Expected TAG:TYPE=VALUE, got '{}'", argument)))?;

    let tag = parse_tag(&captures[1])?;
    let field_type = FieldType::from_name(&captures[2])
        .ok_or_else(|| TiffError::InvalidConfig(format!("Unknown field type: {}", &captures[2])))?;
    let raw = &captures[3];

    let tokens: Vec<String> = if field_type == FieldType::Ascii {
        vec![raw.to_string()]
    } else {
        raw.split(',').map(|s| s.to_string()).collect()
    };
    parse_field(tag, field_type, &tokens)
}

/// Values of a TOML `value` key as text tokens
fn value_tokens(value: &toml::Value, field_type: FieldType) -> TiffResult<Vec<String>> {
    match value {
        toml::Value::String(s) if field_type == FieldType::Ascii => Ok(vec![s.clone()]),
        toml::Value::String(s) => Ok(s.split(',').map(|t| t.to_string()).collect()),
        toml::Value::Integer(i) => Ok(vec![i.to_string()]),
        toml::Value::Float(f) => Ok(vec![f.to_string()]),
        toml::Value::Array(items) => items
            .iter()
            .map(|item| match item {
                toml::Value::String(s) => Ok(s.clone()),
                toml::Value::Integer(i) => Ok(i.to_string()),
                toml::Value::Float(f) => Ok(f.to_string()),
                other => Err(TiffError::InvalidConfig(format!("Unsupported value: {}", other))),
            })
            .collect(),
        other => Err(TiffError::InvalidConfig(format!("Unsupported value: {}", other))),
    }
}

fn table_tag(table: &toml::Table) -> TiffResult<u16> {
    match table.get("tag") {
        Some(toml::Value::Integer(i)) => {
            u16::try_from(*i).map_err(|_| TiffError::InvalidConfig(format!("Tag out of range: {}", i)))
        }
        Some(toml::Value::String(s)) => parse_tag(s),
        _ => Err(TiffError::InvalidConfig("Edit entry is missing 'tag'".to_string())),
    }
}

fn table_page(table: &toml::Table) -> TiffResult<Option<usize>> {
    match table.get("page") {
        None => Ok(None),
        Some(toml::Value::Integer(i)) => usize::try_from(*i)
            .map(Some)
            .map_err(|_| TiffError::InvalidConfig(format!("Invalid page: {}", i))),
        Some(other) => Err(TiffError::InvalidConfig(format!("Invalid page: {}", other))),
    }
}

fn entries<'t>(document: &'t toml::Table, key: &str) -> TiffResult<Vec<&'t toml::Table>> {
    match document.get(key) {
        None => Ok(Vec::new()),
        Some(toml::Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_table()
                    .ok_or_else(|| TiffError::InvalidConfig(format!("Entries of '{}' must be tables", key)))
            })
            .collect(),
        Some(_) => Err(TiffError::InvalidConfig(format!("'{}' must be an array of tables", key))),
    }
}

impl EditScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, operation: EditOperation) {
        self.operations.push(operation);
    }

    pub fn operations(&self) -> &[EditOperation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Appends the operations of `other`
    pub fn extend(&mut self, other: EditScript) {
        self.operations.extend(other.operations);
    }

    /// Parses a TOML edit script
    pub fn from_toml_str(content: &str) -> TiffResult<Self> {
        let document: toml::Table = content
            .parse()
            .map_err(|e| TiffError::InvalidConfig(format!("Failed to parse edit script: {}", e)))?;

        let mut script = EditScript::new();

        for table in entries(&document, "set")? {
            let tag = table_tag(table)?;
            let type_name = table
                .get("type")
                .and_then(|v| v.as_str())
                .ok_or_else(|| TiffError::InvalidConfig(format!("Set of tag {} is missing 'type'", tag)))?;
            let field_type = FieldType::from_name(type_name)
                .ok_or_else(|| TiffError::InvalidConfig(format!("Unknown field type: {}", type_name)))?;
            let value = table
                .get("value")
                .ok_or_else(|| TiffError::InvalidConfig(format!("Set of tag {} is missing 'value'", tag)))?;

            let field = parse_field(tag, field_type, &value_tokens(value, field_type)?)?;
            script.push(EditOperation::SetField {
                page: table_page(table)?,
                field,
            });
        }

        for table in entries(&document, "remove")? {
            script.push(EditOperation::RemoveField {
                page: table_page(table)?,
                tag: table_tag(table)?,
            });
        }

        for table in entries(&document, "strip_subifd")? {
            script.push(EditOperation::StripSubIfd {
                page: table_page(table)?,
                tag: table_tag(table)?,
            });
        }

        if let Some(pages) = document.get("remove_pages") {
            let pages = pages
                .as_array()
                .ok_or_else(|| TiffError::InvalidConfig("'remove_pages' must be an array".to_string()))?
                .iter()
                .map(|p| {
                    p.as_integer()
                        .and_then(|i| usize::try_from(i).ok())
                        .ok_or_else(|| TiffError::InvalidConfig(format!("Invalid page: {}", p)))
                })
                .collect::<TiffResult<Vec<usize>>>()?;
            script.push(EditOperation::RemovePages(pages));
        }

        debug!("Parsed edit script with {} operations", script.operations.len());
        Ok(script)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> TiffResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Applies every operation in order; page removals run after all
    /// other operations. Returns the number of changes made.
    pub fn apply(&self, tiff: &mut TIFF) -> TiffResult<usize> {
        let mut changes = 0;
        let mut removed_pages: Vec<usize> = Vec::new();

        for operation in &self.operations {
            match operation {
                EditOperation::SetField { page, field } => {
                    changes += for_pages(tiff, *page, |ifd| {
                        ifd.add_field(field.clone());
                        true
                    })?;
                }
                EditOperation::RemoveField { page, tag } => {
                    changes += for_pages(tiff, *page, |ifd| {
                        let removed = ifd.remove_field(*tag).is_some();
                        ifd.remove_children(*tag);
                        removed
                    })?;
                }
                EditOperation::StripSubIfd { page, tag } => {
                    changes += for_pages(tiff, *page, |ifd| ifd.remove_sub_ifd(*tag))?;
                }
                EditOperation::RemovePages(pages) => removed_pages.extend(pages),
            }
        }

        if !removed_pages.is_empty() {
            removed_pages.sort_unstable();
            removed_pages.dedup();
            tiff.remove_pages(&removed_pages)?;
            changes += removed_pages.len();
        }

        info!("Applied edit script: {} change(s)", changes);
        Ok(changes)
    }
}

/// Runs `edit` on one page or on all pages, counting pages it changed
fn for_pages<F>(tiff: &mut TIFF, page: Option<usize>, mut edit: F) -> TiffResult<usize>
where
    F: FnMut(&mut IFD) -> bool,
{
    match page {
        Some(index) => Ok(edit(tiff.page_mut(index)?) as usize),
        None => {
            let mut changed = 0;
            for index in 0..tiff.page_count() {
                if edit(tiff.page_mut(index)?) {
                    changed += 1;
                }
            }
            if changed == 0 {
                warn!("Edit did not change any page");
            }
            Ok(changed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::byte_order::ByteOrder;
    use crate::tiff::constants::tags;

    fn two_pages() -> TIFF {
        let mut tiff = TIFF::new(ByteOrder::LittleEndian);
        for width in [10, 20] {
            let mut ifd = IFD::new();
            ifd.add_field(TiffField::long(tags::IMAGE_WIDTH, vec![width]));
            ifd.add_field(TiffField::long(tags::GPS_SUB_IFD, vec![0]));
            ifd.add_child(tags::GPS_SUB_IFD, IFD::new());
            tiff.push_page(ifd);
        }
        tiff
    }

    #[test]
    fn test_parse_tag_forms() {
        assert_eq!(parse_tag("305").unwrap(), 305);
        assert_eq!(parse_tag("0x0131").unwrap(), 305);
        assert_eq!(parse_tag("Software").unwrap(), 305);
        assert!(parse_tag("NotATag").is_err());
    }

    #[test]
    fn test_parse_set_argument() {
        let field = parse_set_argument("XResolution:rational=300/1").unwrap();
        assert_eq!(field.value(), &FieldValue::Rational(vec![(300, 1)]));

        let field = parse_set_argument("305:ascii= my tool ").unwrap();
        assert_eq!(field.as_str(), Some("my tool"));

        let field = parse_set_argument("BitsPerSample:short=8,8,8").unwrap();
        assert_eq!(field.as_u32_vec(), Some(vec![8, 8, 8]));

        assert!(parse_set_argument("Software=oops").is_err());
        assert!(parse_set_argument("ImageWidth:long=wide").is_err());
    }

    #[test]
    fn test_script_from_toml() {
        let script = EditScript::from_toml_str(
            r#"
            remove_pages = [1]

            [[set]]
            tag = "Artist"
            type = "ascii"
            value = "Someone"
            page = 0

            [[set]]
            tag = 282
            type = "rational"
            value = ["72/1"]

            [[remove]]
            tag = 700

            [[strip_subifd]]
            tag = "GPSIFD"
            "#,
        )
        .unwrap();

        assert_eq!(script.operations().len(), 5);
        assert!(matches!(script.operations()[4], EditOperation::RemovePages(ref p) if p == &vec![1]));
    }

    #[test]
    fn test_apply_script() {
        let mut tiff = two_pages();
        let mut script = EditScript::new();
        script.push(EditOperation::RemovePages(vec![0]));
        script.push(EditOperation::SetField {
            page: Some(1),
            field: TiffField::ascii(tags::SOFTWARE, "ifdkit"),
        });
        script.push(EditOperation::StripSubIfd {
            page: None,
            tag: tags::GPS_SUB_IFD,
        });

        assert_eq!(script.apply(&mut tiff).unwrap(), 4);
        assert_eq!(tiff.page_count(), 1);

        let page = tiff.page(0).unwrap();
        assert_eq!(page.get_u32(tags::IMAGE_WIDTH), Some(20));
        assert_eq!(page.get_field(tags::SOFTWARE).and_then(|f| f.as_str()), Some("ifdkit"));
        assert!(!page.has_field(tags::GPS_SUB_IFD));
        assert!(!page.has_children());
    }

    #[test]
    fn test_bad_page_is_an_error() {
        let mut tiff = two_pages();
        let mut script = EditScript::new();
        script.push(EditOperation::RemoveField {
            page: Some(5),
            tag: tags::IMAGE_WIDTH,
        });
        assert!(matches!(script.apply(&mut tiff), Err(TiffError::PageOutOfRange { .. })));
    }
}

//! Image File Directory (IFD) structures and methods
//!
//! An IFD is an ordered set of tagged fields plus the child directories
//! reached through pointer-valued fields (EXIF, GPS, Interoperability,
//! SubIFDs). The tree is owned top-down: a child never refers back to its
//! parent, the pointer field that has to be patched when the child moves
//! is found again by looking up the child's tag in the parent.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{Seek, SeekFrom};

use log::{debug, trace};

use crate::io::byte_order::ByteOrderHandler;
use crate::io::seekable::SeekableWriter;
use crate::tiff::constants::{layout, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::field::TiffField;
use crate::tiff::tag_sets::{tag_set_for, BaselineTags, TagSet};

/// Represents an Image File Directory (IFD) in a TIFF file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IFD {
    /// Fields keyed (and therefore ordered) by tag
    fields: BTreeMap<u16, TiffField>,
    /// Child directories keyed by the tag of the pointer field in this IFD
    children: BTreeMap<u16, Vec<IFD>>,
    /// Offset of this IFD in the stream it was read from or written to
    start_offset: u32,
    /// First byte past the next-IFD pointer, valid after a write
    end_offset: u32,
}

impl IFD {
    /// Creates a new, empty IFD
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty IFD that records where it was found
    pub fn at_offset(start_offset: u32) -> Self {
        IFD {
            start_offset,
            ..Self::default()
        }
    }

    /// Adds a field, replacing and returning any field with the same tag
    pub fn add_field(&mut self, field: TiffField) -> Option<TiffField> {
        trace!("Adding field {}", field);
        self.fields.insert(field.tag(), field)
    }

    pub fn remove_field(&mut self, tag: u16) -> Option<TiffField> {
        self.fields.remove(&tag)
    }

    pub fn get_field(&self, tag: u16) -> Option<&TiffField> {
        self.fields.get(&tag)
    }

    pub fn get_field_mut(&mut self, tag: u16) -> Option<&mut TiffField> {
        self.fields.get_mut(&tag)
    }

    pub fn has_field(&self, tag: u16) -> bool {
        self.fields.contains_key(&tag)
    }

    /// Fields in ascending tag order
    pub fn fields(&self) -> impl Iterator<Item = &TiffField> {
        self.fields.values()
    }

    pub(crate) fn fields_mut(&mut self) -> impl Iterator<Item = &mut TiffField> {
        self.fields.values_mut()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Attaches a child directory under `tag`, replacing any existing ones
    pub fn add_child(&mut self, tag: u16, child: IFD) {
        debug!("Attaching child directory under tag {}", tag);
        self.children.insert(tag, vec![child]);
    }

    /// Attaches several child directories under one pointer tag (SubIFDs)
    pub fn add_children(&mut self, tag: u16, children: Vec<IFD>) {
        self.children.insert(tag, children);
    }

    pub fn remove_children(&mut self, tag: u16) -> Vec<IFD> {
        self.children.remove(&tag).unwrap_or_default()
    }

    /// The first child under `tag`
    pub fn child(&self, tag: u16) -> Option<&IFD> {
        self.children.get(&tag).and_then(|c| c.first())
    }

    pub fn child_mut(&mut self, tag: u16) -> Option<&mut IFD> {
        self.children.get_mut(&tag).and_then(|c| c.first_mut())
    }

    /// All children under `tag`
    pub fn children(&self, tag: u16) -> &[IFD] {
        self.children.get(&tag).map(|c| c.as_slice()).unwrap_or(&[])
    }

    /// Iterates `(pointer tag, children)` in ascending tag order
    pub fn child_entries(&self) -> impl Iterator<Item = (u16, &[IFD])> {
        self.children.iter().map(|(tag, c)| (*tag, c.as_slice()))
    }

    pub(crate) fn child_entries_mut(&mut self) -> impl Iterator<Item = (u16, &mut Vec<IFD>)> {
        self.children.iter_mut().map(|(tag, c)| (*tag, c))
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Drops a pointer field together with the directories it points to
    pub fn remove_sub_ifd(&mut self, tag: u16) -> bool {
        let had_field = self.fields.remove(&tag).is_some();
        let had_children = self.children.remove(&tag).is_some();
        had_field || had_children
    }

    pub fn start_offset(&self) -> u32 {
        self.start_offset
    }

    pub fn end_offset(&self) -> u32 {
        self.end_offset
    }

    pub(crate) fn set_offsets(&mut self, start_offset: u32, end_offset: u32) {
        self.start_offset = start_offset;
        self.end_offset = end_offset;
    }

    /// Size of the directory itself: count, entries and next pointer
    pub fn directory_size(&self) -> u32 {
        layout::ENTRY_COUNT_SIZE + layout::ENTRY_SIZE * self.fields.len() as u32 + layout::NEXT_IFD_POINTER_SIZE
    }

    /// Overwrites the next-IFD placeholder written by the last write pass
    pub fn set_next_ifd_offset(
        &self,
        writer: &mut dyn SeekableWriter,
        handler: &dyn ByteOrderHandler,
        next_offset: u32,
    ) -> TiffResult<()> {
        if self.end_offset <= self.start_offset {
            return Err(TiffError::GenericError(
                "IFD has not been written yet, cannot link the next IFD".to_string(),
            ));
        }

        let position = self.end_offset - layout::NEXT_IFD_POINTER_SIZE;
        debug!("Linking IFD at {} to next IFD at {}", self.start_offset, next_offset);
        writer.seek(SeekFrom::Start(position as u64))?;
        handler.write_u32(writer, next_offset)?;
        Ok(())
    }

    /// First value of an integer field
    pub fn get_u32(&self, tag: u16) -> Option<u32> {
        self.get_field(tag).and_then(|f| f.first_u32())
    }

    /// All values of an integer field
    pub fn get_u32_values(&self, tag: u16) -> Option<Vec<u32>> {
        self.get_field(tag).and_then(|f| f.as_u32_vec())
    }

    /// Gets the dimensions of the image described by this IFD
    pub fn get_dimensions(&self) -> Option<(u32, u32)> {
        let width = self.get_u32(tags::IMAGE_WIDTH)?;
        let height = self.get_u32(tags::IMAGE_LENGTH)?;
        Some((width, height))
    }

    /// Returns number of samples per pixel (default 1 if not specified)
    pub fn get_samples_per_pixel(&self) -> u32 {
        self.get_u32(tags::SAMPLES_PER_PIXEL).unwrap_or(1)
    }

    /// Whether pixel data is organised in tiles rather than strips
    pub fn is_tiled(&self) -> bool {
        self.has_field(tags::TILE_OFFSETS)
    }

    /// Renders this directory and its children, resolving tag names
    /// against `tag_set`
    pub fn describe(&self, tag_set: &dyn TagSet, indent: usize) -> String {
        let pad = " ".repeat(indent);
        let mut out = String::new();
        out.push_str(&format!(
            "{}{} directory at offset {} ({} entries)\n",
            pad,
            tag_set.name(),
            self.start_offset,
            self.fields.len()
        ));

        for field in self.fields.values() {
            let tag = tag_set.resolve(field.tag());
            out.push_str(&format!(
                "{}  {}: {} [{} x{}]\n",
                pad,
                tag,
                field.display_value(),
                field.field_type(),
                field.count()
            ));

            for child in self.children(field.tag()) {
                out.push_str(&child.describe(tag_set_for(field.tag()), indent + 4));
            }
        }

        out
    }
}

impl fmt::Display for IFD {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe(&BaselineTags, 0))
    }
}

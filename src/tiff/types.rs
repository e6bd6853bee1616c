//! Core TIFF data structures

use log::debug;
use std::collections::BTreeSet;
use std::fmt;

use crate::io::byte_order::ByteOrder;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::tag_sets::BaselineTags;

/// Represents a TIFF file as its byte order and chain of pages
#[derive(Debug, Clone, PartialEq)]
pub struct TIFF {
    byte_order: ByteOrder,
    /// Top-level IFDs in chain order
    ifds: Vec<IFD>,
}

impl TIFF {
    /// Creates a new TIFF structure without pages
    pub fn new(byte_order: ByteOrder) -> Self {
        TIFF {
            byte_order,
            ifds: Vec::new(),
        }
    }

    pub fn from_ifds(byte_order: ByteOrder, ifds: Vec<IFD>) -> Self {
        TIFF { byte_order, ifds }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn set_byte_order(&mut self, byte_order: ByteOrder) {
        self.byte_order = byte_order;
    }

    /// Returns the main (first) IFD if available
    pub fn main_ifd(&self) -> Option<&IFD> {
        self.ifds.first()
    }

    pub fn page_count(&self) -> usize {
        self.ifds.len()
    }

    pub fn pages(&self) -> &[IFD] {
        &self.ifds
    }

    pub fn into_pages(self) -> Vec<IFD> {
        self.ifds
    }

    fn check_index(&self, index: usize) -> TiffResult<()> {
        if index >= self.ifds.len() {
            return Err(TiffError::PageOutOfRange {
                index,
                count: self.ifds.len(),
            });
        }
        Ok(())
    }

    pub fn page(&self, index: usize) -> TiffResult<&IFD> {
        self.check_index(index)?;
        Ok(&self.ifds[index])
    }

    pub fn page_mut(&mut self, index: usize) -> TiffResult<&mut IFD> {
        self.check_index(index)?;
        Ok(&mut self.ifds[index])
    }

    /// Appends a page to the end of the chain
    pub fn push_page(&mut self, ifd: IFD) {
        self.ifds.push(ifd);
    }

    /// Inserts a page before `index`; an index past the end appends
    pub fn insert_page(&mut self, index: usize, ifd: IFD) -> usize {
        let position = index.min(self.ifds.len());
        debug!("Inserting page at position {}", position);
        self.ifds.insert(position, ifd);
        position
    }

    pub fn remove_page(&mut self, index: usize) -> TiffResult<IFD> {
        self.check_index(index)?;
        Ok(self.ifds.remove(index))
    }

    /// Keeps only the listed pages, in their original order
    pub fn retain_pages(&mut self, indices: &[usize]) -> TiffResult<()> {
        for &index in indices {
            self.check_index(index)?;
        }

        let keep: BTreeSet<usize> = indices.iter().copied().collect();
        let pages = std::mem::take(&mut self.ifds);
        self.ifds = pages
            .into_iter()
            .enumerate()
            .filter(|(i, _)| keep.contains(i))
            .map(|(_, ifd)| ifd)
            .collect();
        Ok(())
    }

    /// Removes the listed pages; indices refer to the chain before removal
    pub fn remove_pages(&mut self, indices: &[usize]) -> TiffResult<()> {
        for &index in indices {
            self.check_index(index)?;
        }

        let drop: BTreeSet<usize> = indices.iter().copied().collect();
        let keep: Vec<usize> = (0..self.ifds.len()).filter(|i| !drop.contains(i)).collect();
        self.retain_pages(&keep)
    }
}

impl fmt::Display for TIFF {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TIFF File:")?;
        writeln!(f, "  Byte order: {}", self.byte_order.name())?;
        writeln!(f, "  Number of IFDs: {}", self.ifds.len())?;

        for (index, ifd) in self.ifds.iter().enumerate() {
            writeln!(f, "IFD #{}:", index)?;
            write!(f, "{}", ifd.describe(&BaselineTags, 2))?;
        }

        Ok(())
    }
}

//! I/O utilities for file handling
//!
//! This module provides the seekable stream traits and the byte order
//! strategies used by the directory reader and writer.

pub mod seekable;
pub mod byte_order;

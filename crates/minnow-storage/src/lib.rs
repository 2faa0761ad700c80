//! # minnow-storage
//!
//! Paged heap storage for MinnowDB.
//!
//! This crate provides:
//! - **Heap pages**: a bit-exact page format with an occupancy bitmap and
//!   fixed-width tuple slots
//! - **Heap files**: one file of pages per table, with insert, delete and
//!   sequential scan
//! - **Buffer management**: the `BufferManager` interface every page access
//!   goes through, plus a FIFO reference `BufferPool`
//! - **Catalog**: table id to heap file, schema and name resolution

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Buffer management interface and reference pool
pub mod buffer;

/// Table catalog
pub mod catalog;

/// Heap files and scans
pub mod file;

/// Page layout and disk format
pub mod page;

pub use buffer::{BufferManager, BufferPool, BufferPoolStats, PageRef};
pub use catalog::{Catalog, MemoryCatalog};
pub use file::{HeapFile, HeapFileIterator};
pub use page::HeapPage;

//! Heap file storage.
//!
//! Each table is backed by one file of fixed-size pages:
//!
//! ```text
//! offset 0          page_size        2 * page_size
//! ┌─────────────────┬────────────────┬────────────────┬─────
//! │     page 0      │     page 1     │     page 2     │ ...
//! └─────────────────┴────────────────┴────────────────┴─────
//! ```
//!
//! Reads and writes go straight to the file; callers reach pages through a
//! [`BufferManager`](crate::buffer::BufferManager), which decides what stays
//! resident.

mod heap_file;

pub use heap_file::{HeapFile, HeapFileIterator};

//! Page layout and disk format for MinnowDB.
//!
//! Every table is a heap file of fixed-size pages. A page is a bitmap of
//! occupied slots followed by fixed-width tuple slots:
//!
//! ```text
//! +------------------+
//! | Occupancy bitmap |  one bit per slot
//! +------------------+
//! |   Tuple slots    |  num_slots * tuple_size bytes
//! +------------------+
//! |   Zero padding   |
//! +------------------+
//! ```

mod heap_page;

pub use heap_page::{header_size, slots_per_page, HeapPage};

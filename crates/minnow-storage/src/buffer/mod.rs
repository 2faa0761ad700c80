//! Buffer management for MinnowDB.
//!
//! Storage code never keeps pages of its own; every page access goes
//! through a [`BufferManager`]. The manager owns page residency and dirty
//! tracking, and is where a lock manager would hook in. Callers must not
//! assume a returned [`PageRef`] stays cached beyond their own call.
//!
//! [`BufferPool`] is a small reference implementation: a bounded page table
//! with FIFO eviction and no locking policy.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 BufferPool                   │
//! │  ┌────────────────────────────────────────┐  │
//! │  │ Page table                             │  │
//! │  │ HashMap<HeapPageId, PageRef>           │  │
//! │  └────────────────────────────────────────┘  │
//! │                     │                        │
//! │                     ▼                        │
//! │  ┌────────────────────────────────────────┐  │
//! │  │ FIFO replacer (admission order)        │  │
//! │  └────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────┘
//!                      │ miss / dirty victim
//!                      ▼
//!          Catalog ──▶ HeapFile (read_page / write_page)
//! ```

mod eviction;
mod pool;

use std::sync::Arc;

use minnow_common::error::DbResult;
use minnow_common::types::{HeapPageId, Permissions, RecordId, TableId, TransactionId, Tuple};
use parking_lot::RwLock;

use crate::page::HeapPage;

pub use eviction::FifoReplacer;
pub use pool::BufferPool;

/// Shared handle to a resident page.
pub type PageRef = Arc<RwLock<HeapPage>>;

/// Page residency and mutation entry points used by storage and operators.
pub trait BufferManager: Send + Sync {
    /// Returns the page, reading it from disk if needed. May block.
    fn get_page(
        &self,
        tid: TransactionId,
        page_id: HeapPageId,
        perm: Permissions,
    ) -> DbResult<PageRef>;

    /// Inserts `tuple` into table `table_id` on behalf of `tid`.
    fn insert_tuple(&self, tid: TransactionId, table_id: TableId, tuple: Tuple)
        -> DbResult<RecordId>;

    /// Deletes the stored tuple named by `tuple`'s record id.
    fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> DbResult<()>;
}

/// Statistics for buffer pool monitoring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferPoolStats {
    /// Total number of page fetches.
    pub fetches: u64,
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses (required disk read).
    pub misses: u64,
    /// Number of pages evicted.
    pub evictions: u64,
    /// Number of dirty pages written back.
    pub flushes: u64,
    /// Pages currently resident.
    pub resident_pages: usize,
    /// Resident pages with unflushed changes.
    pub dirty_pages: usize,
}

impl BufferPoolStats {
    /// Returns the cache hit ratio (0.0 to 1.0).
    pub fn hit_ratio(&self) -> f64 {
        if self.fetches == 0 {
            0.0
        } else {
            self.hits as f64 / self.fetches as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_hit_ratio() {
        let mut stats = BufferPoolStats::default();
        assert_eq!(stats.hit_ratio(), 0.0);

        stats.fetches = 10;
        stats.hits = 4;
        assert!((stats.hit_ratio() - 0.4).abs() < f64::EPSILON);
    }
}

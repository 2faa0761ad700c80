//! Reference buffer pool implementation.
//!
//! The pool caches up to `num_pages` heap pages and evicts in FIFO order,
//! writing dirty victims back first. It applies no locking policy: the
//! requested [`Permissions`] only show up in traces.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use minnow_common::config::BufferPoolConfig;
use minnow_common::error::{DbError, DbResult};
use minnow_common::types::{HeapPageId, Permissions, RecordId, TableId, TransactionId, Tuple};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use super::eviction::FifoReplacer;
use super::{BufferManager, BufferPoolStats, PageRef};
use crate::catalog::Catalog;

#[derive(Debug, Default)]
struct PageTable {
    pages: HashMap<HeapPageId, PageRef>,
    replacer: FifoReplacer,
}

/// Bounded page cache in front of the catalog's heap files.
#[derive(Debug)]
pub struct BufferPool {
    /// Configuration.
    config: BufferPoolConfig,
    /// Resolves page ids to heap files.
    catalog: Arc<dyn Catalog>,
    /// Resident pages and their admission order.
    table: Mutex<PageTable>,
    /// Fetch counter for statistics.
    fetch_count: AtomicU64,
    /// Hit counter for statistics.
    hit_count: AtomicU64,
    /// Miss counter for statistics.
    miss_count: AtomicU64,
    /// Eviction counter for statistics.
    eviction_count: AtomicU64,
    /// Flush counter for statistics.
    flush_count: AtomicU64,
}

impl BufferPool {
    /// Creates a buffer pool over the tables in `catalog`.
    pub fn new(config: BufferPoolConfig, catalog: Arc<dyn Catalog>) -> DbResult<Self> {
        config.validate()?;
        Ok(Self {
            table: Mutex::new(PageTable {
                pages: HashMap::with_capacity(config.num_pages),
                replacer: FifoReplacer::new(),
            }),
            config,
            catalog,
            fetch_count: AtomicU64::new(0),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            eviction_count: AtomicU64::new(0),
            flush_count: AtomicU64::new(0),
        })
    }

    /// Returns the maximum number of resident pages.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.config.num_pages
    }

    /// Returns the catalog this pool reads through.
    #[must_use]
    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Returns true if a page is resident.
    #[must_use]
    pub fn contains(&self, page_id: HeapPageId) -> bool {
        self.table.lock().pages.contains_key(&page_id)
    }

    /// Writes a resident page back if it is dirty.
    pub fn flush_page(&self, page_id: HeapPageId) -> DbResult<()> {
        let page = self.table.lock().pages.get(&page_id).cloned();
        if let Some(page) = page {
            self.write_back(&page)?;
        }
        Ok(())
    }

    /// Writes every dirty resident page back. Returns how many were written.
    pub fn flush_all(&self) -> DbResult<usize> {
        let pages: Vec<PageRef> = self.table.lock().pages.values().cloned().collect();
        let mut flushed = 0;
        for page in &pages {
            if self.write_back(page)? {
                flushed += 1;
            }
        }
        Ok(flushed)
    }

    /// Drops a page from the pool without writing it.
    pub fn discard_page(&self, page_id: HeapPageId) {
        let mut table = self.table.lock();
        if table.pages.remove(&page_id).is_some() {
            table.replacer.remove(page_id);
            trace!(page = %page_id, "discarded page");
        }
    }

    /// Returns statistics about the buffer pool.
    pub fn stats(&self) -> BufferPoolStats {
        let (resident, dirty) = {
            let table = self.table.lock();
            let dirty = table.pages.values().filter(|p| p.read().is_dirty()).count();
            (table.pages.len(), dirty)
        };

        BufferPoolStats {
            fetches: self.fetch_count.load(Ordering::Relaxed),
            hits: self.hit_count.load(Ordering::Relaxed),
            misses: self.miss_count.load(Ordering::Relaxed),
            evictions: self.eviction_count.load(Ordering::Relaxed),
            flushes: self.flush_count.load(Ordering::Relaxed),
            resident_pages: resident,
            dirty_pages: dirty,
        }
    }

    // -------------------------------------------------------------------------
    // Private helpers
    // -------------------------------------------------------------------------

    /// Evicts the oldest page. Returns false if nothing could be evicted.
    fn evict_one(&self, table: &mut PageTable) -> DbResult<bool> {
        let Some(victim) = table.replacer.pop_victim() else {
            return Ok(false);
        };
        let Some(page) = table.pages.get(&victim).cloned() else {
            return Ok(true);
        };

        if let Err(err) = self.write_back(&page) {
            table.replacer.record_admission(victim);
            return Err(err);
        }
        table.pages.remove(&victim);
        self.eviction_count.fetch_add(1, Ordering::Relaxed);
        debug!(page = %victim, "evicted page");
        Ok(true)
    }

    /// Writes `page` to its heap file if dirty. Returns true if written.
    fn write_back(&self, page: &PageRef) -> DbResult<bool> {
        let mut page = page.write();
        if !page.is_dirty() {
            return Ok(false);
        }
        let page_id = page.page_id();
        let file = self.catalog.file(page_id.table_id())?;
        // A page past the end was released by a shrink; writing it would
        // re-extend the file.
        if page_id.page_number() < file.num_pages() {
            file.write_page(&page)?;
            self.flush_count.fetch_add(1, Ordering::Relaxed);
            debug!(page = %page_id, "flushed page");
        }
        page.mark_dirty(None);
        Ok(true)
    }
}

impl BufferManager for BufferPool {
    fn get_page(
        &self,
        tid: TransactionId,
        page_id: HeapPageId,
        perm: Permissions,
    ) -> DbResult<PageRef> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);

        let cached = self.table.lock().pages.get(&page_id).cloned();
        if let Some(page) = cached {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            trace!(page = %page_id, %tid, %perm, "buffer hit");
            return Ok(page);
        }

        self.miss_count.fetch_add(1, Ordering::Relaxed);
        trace!(page = %page_id, %tid, %perm, "buffer miss");
        let loaded = self.catalog.file(page_id.table_id())?.read_page(page_id)?;

        let mut table = self.table.lock();
        if let Some(page) = table.pages.get(&page_id) {
            return Ok(page.clone());
        }
        while table.pages.len() >= self.config.num_pages && self.evict_one(&mut table)? {}

        let page = Arc::new(RwLock::new(loaded));
        table.pages.insert(page_id, page.clone());
        table.replacer.record_admission(page_id);
        Ok(page)
    }

    fn insert_tuple(
        &self,
        tid: TransactionId,
        table_id: TableId,
        tuple: Tuple,
    ) -> DbResult<RecordId> {
        let file = self.catalog.file(table_id)?;
        let (record_id, dirtied) = file.insert_tuple(tid, tuple, self)?;
        for page in dirtied {
            page.write().mark_dirty(Some(tid));
        }
        Ok(record_id)
    }

    fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> DbResult<()> {
        let record_id = tuple.record_id().ok_or(DbError::MissingRecordId)?;
        let file = self.catalog.file(record_id.page_id().table_id())?;
        for page in file.delete_tuple(tid, tuple, self)? {
            let page_id = page.read().page_id();
            if page_id.page_number() >= file.num_pages() {
                self.discard_page(page_id);
            } else {
                page.write().mark_dirty(Some(tid));
            }
        }
        Ok(())
    }
}

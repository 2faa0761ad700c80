//! Heap files: one table's pages laid end to end in a single file.

use std::collections::hash_map::DefaultHasher;
use std::fs::{File, OpenOptions};
use std::hash::{Hash, Hasher};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use minnow_common::error::{DbError, DbResult};
use minnow_common::iterator::{Cursor, TupleSource};
use minnow_common::types::{
    HeapPageId, Permissions, RecordId, Schema, TableId, TransactionId, Tuple,
};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::buffer::{BufferManager, PageRef};
use crate::page::{slots_per_page, HeapPage};

/// A table stored as a sequence of heap pages.
///
/// Page `n` lives at byte offset `n * page_size`. The page count only grows,
/// except that emptying the trailing page removes it from the file.
#[derive(Debug)]
pub struct HeapFile {
    id: TableId,
    path: PathBuf,
    file: Mutex<File>,
    schema: Arc<Schema>,
    page_size: usize,
    num_pages: AtomicU64,
}

impl HeapFile {
    /// Opens the heap file at `path`, creating it if missing.
    pub fn open(path: impl AsRef<Path>, schema: Arc<Schema>, page_size: usize) -> DbResult<Self> {
        if slots_per_page(page_size, schema.size()) == 0 {
            return Err(DbError::configuration(format!(
                "page size {page_size} cannot hold a tuple of {} bytes",
                schema.size()
            )));
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;
        let path = path.as_ref().canonicalize()?;
        let len = file.metadata()?.len();

        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        let id = TableId::new(hasher.finish());

        let num_pages = len / page_size as u64;
        debug!(table = %id, path = %path.display(), num_pages, "opened heap file");

        Ok(Self {
            id,
            path,
            file: Mutex::new(file),
            schema,
            page_size,
            num_pages: AtomicU64::new(num_pages),
        })
    }

    /// Returns the table identifier, derived from the canonical path.
    #[inline]
    #[must_use]
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Returns the canonical file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the schema of stored tuples.
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the page size in bytes.
    #[inline]
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns the current number of pages.
    #[inline]
    #[must_use]
    pub fn num_pages(&self) -> u64 {
        self.num_pages.load(Ordering::Acquire)
    }

    /// Reads a page directly from disk.
    pub fn read_page(&self, page_id: HeapPageId) -> DbResult<HeapPage> {
        self.check_table(page_id)?;
        let num_pages = self.num_pages();
        if page_id.page_number() >= num_pages {
            return Err(DbError::PageOutOfRange { page_id, num_pages });
        }

        let mut data = vec![0u8; self.page_size];
        {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(self.offset(page_id)))?;
            file.read_exact(&mut data)?;
        }
        trace!(page = %page_id, "read page");
        HeapPage::from_bytes(page_id, self.schema.clone(), &data)
    }

    /// Writes a page to disk. Writing page `num_pages` appends it.
    pub fn write_page(&self, page: &HeapPage) -> DbResult<()> {
        let page_id = page.page_id();
        self.check_table(page_id)?;
        let num_pages = self.num_pages();
        if page_id.page_number() > num_pages {
            return Err(DbError::PageOutOfRange { page_id, num_pages });
        }

        let data = page.to_bytes();
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(self.offset(page_id)))?;
        file.write_all(&data)?;
        if page_id.page_number() == num_pages {
            self.num_pages.store(num_pages + 1, Ordering::Release);
        }
        trace!(page = %page_id, "wrote page");
        Ok(())
    }

    /// Inserts `tuple`, returning its record id and the pages it dirtied.
    ///
    /// The trailing page is tried first; when it is full a fresh page is
    /// appended.
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        tuple: Tuple,
        buffer: &dyn BufferManager,
    ) -> DbResult<(RecordId, Vec<PageRef>)> {
        if !tuple.schema().same_types(&self.schema) {
            return Err(DbError::schema_mismatch(&self.schema, tuple.schema()));
        }

        let num_pages = self.num_pages();
        if num_pages > 0 {
            let last = HeapPageId::new(self.id, num_pages - 1);
            let page_ref = buffer.get_page(tid, last, Permissions::ReadWrite)?;
            let mut page = page_ref.write();
            if page.num_empty_slots() > 0 {
                let record_id = page.insert_tuple(tuple)?;
                self.write_page(&page)?;
                drop(page);
                return Ok((record_id, vec![page_ref]));
            }
        }

        let page_id = HeapPageId::new(self.id, num_pages);
        self.write_page(&HeapPage::empty(page_id, self.schema.clone(), self.page_size)?)?;
        debug!(page = %page_id, "appended heap page");

        let page_ref = buffer.get_page(tid, page_id, Permissions::ReadWrite)?;
        let record_id = {
            let mut page = page_ref.write();
            let record_id = page.insert_tuple(tuple)?;
            self.write_page(&page)?;
            record_id
        };
        Ok((record_id, vec![page_ref]))
    }

    /// Deletes `tuple` from the page its record id names.
    ///
    /// If that page becomes empty and is the trailing page, the file shrinks
    /// by one page. Interior pages are never compacted.
    pub fn delete_tuple(
        &self,
        tid: TransactionId,
        tuple: &Tuple,
        buffer: &dyn BufferManager,
    ) -> DbResult<Vec<PageRef>> {
        let record_id = tuple.record_id().ok_or(DbError::MissingRecordId)?;
        let page_id = record_id.page_id();
        if page_id.table_id() != self.id {
            return Err(DbError::RecordNotOnPage {
                page_id,
                slot: record_id.slot(),
            });
        }

        let page_ref = buffer.get_page(tid, page_id, Permissions::ReadWrite)?;
        let emptied = {
            let mut page = page_ref.write();
            page.delete_tuple(tuple)?;
            self.write_page(&page)?;
            page.is_empty()
        };

        if emptied && page_id.page_number() + 1 == self.num_pages() {
            self.truncate_to(page_id.page_number())?;
            debug!(page = %page_id, "released trailing heap page");
        }
        Ok(vec![page_ref])
    }

    /// Returns a scan over every stored tuple.
    #[must_use]
    pub fn iterator(
        self: &Arc<Self>,
        tid: TransactionId,
        buffer: Arc<dyn BufferManager>,
    ) -> HeapFileIterator {
        HeapFileIterator::new(self.clone(), tid, buffer)
    }

    fn truncate_to(&self, num_pages: u64) -> DbResult<()> {
        let file = self.file.lock();
        file.set_len(num_pages * self.page_size as u64)?;
        self.num_pages.store(num_pages, Ordering::Release);
        Ok(())
    }

    fn check_table(&self, page_id: HeapPageId) -> DbResult<()> {
        if page_id.table_id() != self.id {
            return Err(DbError::TableNotFound {
                table_id: page_id.table_id(),
            });
        }
        Ok(())
    }

    #[inline]
    fn offset(&self, page_id: HeapPageId) -> u64 {
        page_id.page_number() * self.page_size as u64
    }
}

/// Sequential scan over a heap file.
///
/// Pages are fetched through the buffer manager one at a time, and only the
/// current page's tuples are held. The page count is fixed when the scan is
/// opened or rewound, so pages appended mid-scan are not visited; a trailing
/// page released mid-scan is skipped.
pub struct HeapFileIterator {
    file: Arc<HeapFile>,
    tid: TransactionId,
    buffer: Arc<dyn BufferManager>,
    next_page: u64,
    end_page: u64,
    current: std::vec::IntoIter<Tuple>,
    cursor: Cursor,
}

impl HeapFileIterator {
    fn new(file: Arc<HeapFile>, tid: TransactionId, buffer: Arc<dyn BufferManager>) -> Self {
        Self {
            file,
            tid,
            buffer,
            next_page: 0,
            end_page: 0,
            current: Vec::new().into_iter(),
            cursor: Cursor::new(),
        }
    }

    /// Returns the file being scanned.
    #[must_use]
    pub fn file(&self) -> &Arc<HeapFile> {
        &self.file
    }
}

impl std::fmt::Debug for HeapFileIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapFileIterator")
            .field("table", &self.file.id())
            .field("tid", &self.tid)
            .field("next_page", &self.next_page)
            .field("end_page", &self.end_page)
            .finish_non_exhaustive()
    }
}

impl TupleSource for HeapFileIterator {
    fn source_schema(&self) -> &Arc<Schema> {
        self.file.schema()
    }

    fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    fn open_source(&mut self) -> DbResult<()> {
        self.rewind_source()
    }

    fn fetch_next(&mut self) -> DbResult<Option<Tuple>> {
        loop {
            if let Some(tuple) = self.current.next() {
                return Ok(Some(tuple));
            }
            if self.next_page >= self.end_page.min(self.file.num_pages()) {
                return Ok(None);
            }
            let page_id = HeapPageId::new(self.file.id(), self.next_page);
            let page_ref = self.buffer.get_page(self.tid, page_id, Permissions::ReadOnly)?;
            let tuples: Vec<Tuple> = page_ref.read().tuples().cloned().collect();
            self.current = tuples.into_iter();
            self.next_page += 1;
        }
    }

    fn rewind_source(&mut self) -> DbResult<()> {
        self.next_page = 0;
        self.end_page = self.file.num_pages();
        self.current = Vec::new().into_iter();
        Ok(())
    }

    fn close_source(&mut self) {
        self.current = Vec::new().into_iter();
    }
}

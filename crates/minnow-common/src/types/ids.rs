//! Core identifier types for MinnowDB.
//!
//! These types provide type-safe wrappers around numeric identifiers,
//! preventing accidental misuse of different ID types.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Table identifier - uniquely identifies a table's heap file.
///
/// # Example
///
/// ```rust
/// use minnow_common::types::TableId;
///
/// let table = TableId::new(42);
/// assert_eq!(table.as_u64(), 42);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct TableId(u64);

impl TableId {
    /// Creates a new `TableId` from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableId({})", self.0)
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TableId {
    #[inline]
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

/// Heap page identifier: a table plus a page number within its file.
///
/// The page lives at byte offset `page_number * page_size` in the table's
/// heap file.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HeapPageId {
    table_id: TableId,
    page_number: u64,
}

impl HeapPageId {
    /// Creates a new page identifier.
    #[inline]
    #[must_use]
    pub const fn new(table_id: TableId, page_number: u64) -> Self {
        Self {
            table_id,
            page_number,
        }
    }

    /// Returns the owning table.
    #[inline]
    #[must_use]
    pub const fn table_id(self) -> TableId {
        self.table_id
    }

    /// Returns the page number within the table's file.
    #[inline]
    #[must_use]
    pub const fn page_number(self) -> u64 {
        self.page_number
    }

    /// Returns the identifier of the following page in the same file.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self::new(self.table_id, self.page_number + 1)
    }
}

impl fmt::Debug for HeapPageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HeapPageId({}:{})", self.table_id.0, self.page_number)
    }
}

impl fmt::Display for HeapPageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table_id.0, self.page_number)
    }
}

/// Record locator: the page and slot holding a stored tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId {
    page_id: HeapPageId,
    slot: usize,
}

impl RecordId {
    /// Creates a new record locator.
    #[inline]
    #[must_use]
    pub const fn new(page_id: HeapPageId, slot: usize) -> Self {
        Self { page_id, slot }
    }

    /// Returns the page holding the record.
    #[inline]
    #[must_use]
    pub const fn page_id(self) -> HeapPageId {
        self.page_id
    }

    /// Returns the slot index within the page.
    #[inline]
    #[must_use]
    pub const fn slot(self) -> usize {
        self.slot
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.page_id, self.slot)
    }
}

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Transaction identifier.
///
/// The core only threads transaction ids through to the buffer manager; it
/// never interprets them.
///
/// # Example
///
/// ```rust
/// use minnow_common::types::TransactionId;
///
/// let a = TransactionId::next();
/// let b = TransactionId::next();
/// assert!(b > a);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Creates a `TransactionId` from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates a fresh, process-wide unique transaction id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", self.0)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// Access mode requested when fetching a page from the buffer manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permissions {
    /// Shared access for reading.
    ReadOnly,
    /// Exclusive access for modification.
    ReadWrite,
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => f.write_str("READ_ONLY"),
            Self::ReadWrite => f.write_str("READ_WRITE"),
        }
    }
}

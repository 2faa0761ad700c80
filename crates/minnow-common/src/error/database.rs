//! Database error types.
//!
//! Every failure in the core falls into one of four kinds. None of them is
//! retried inside this layer: errors propagate to the outermost caller, which
//! is expected to abort the owning transaction.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::iterator::IterState;
use crate::types::{HeapPageId, TableId, Type};

/// Error kinds for categorizing errors.
///
/// These kinds are stable and can be used for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid field index, schema or cardinality mismatch, delete of an
    /// already-free slot, and other violations of the storage invariants.
    Structural,
    /// An iterator method invoked outside its valid state.
    State,
    /// Page read or write failure.
    Io,
    /// Invalid configuration, rejected eagerly at construction.
    Configuration,
}

impl ErrorKind {
    /// Returns the kind name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Structural => "Structural",
            Self::State => "State",
            Self::Io => "I/O",
            Self::Configuration => "Configuration",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The main error type for MinnowDB.
///
/// # Example
///
/// ```rust
/// use minnow_common::error::{DbError, DbResult, ErrorKind};
///
/// fn field_at(index: usize, len: usize) -> DbResult<()> {
///     Err(DbError::InvalidFieldIndex { index, len })
/// }
///
/// let err = field_at(3, 2).unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::Structural);
/// ```
#[derive(Debug, Error)]
pub enum DbError {
    // ==========================================================================
    // Structural Errors
    // ==========================================================================
    /// A field index outside the schema.
    #[error("field index {index} out of range for {len} fields")]
    InvalidFieldIndex {
        /// The requested index.
        index: usize,
        /// Number of fields available.
        len: usize,
    },

    /// No field carries the requested name.
    #[error("no field named '{name}'")]
    UnknownField {
        /// The requested name.
        name: String,
    },

    /// Tuple shape does not match the promised schema.
    #[error("schema mismatch: expected {expected}, got {actual}")]
    SchemaMismatch {
        /// Expected shape.
        expected: String,
        /// Actual shape.
        actual: String,
    },

    /// A value of the wrong type for its slot.
    #[error("type mismatch at field {index}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Field index.
        index: usize,
        /// Expected type.
        expected: Type,
        /// Actual type.
        actual: Type,
    },

    /// A schema needs at least one field.
    #[error("schema must contain at least one field")]
    EmptySchema,

    /// The tuple carries no record locator.
    #[error("tuple has no record id")]
    MissingRecordId,

    /// The record locator names another page or table.
    #[error("record {slot} does not belong to page {page_id}")]
    RecordNotOnPage {
        /// The page that was asked to delete the record.
        page_id: HeapPageId,
        /// Slot index of the record.
        slot: usize,
    },

    /// Delete of a slot that holds no tuple.
    #[error("slot {slot} on page {page_id} is not occupied")]
    SlotNotOccupied {
        /// Page identifier.
        page_id: HeapPageId,
        /// Slot index.
        slot: usize,
    },

    /// No free slot left on the page.
    #[error("page {page_id} has no empty slots")]
    PageFull {
        /// Page identifier.
        page_id: HeapPageId,
    },

    /// Page number beyond the end of the heap file.
    #[error("page {page_id} is out of range ({num_pages} pages in file)")]
    PageOutOfRange {
        /// Page identifier.
        page_id: HeapPageId,
        /// Current page count.
        num_pages: u64,
    },

    /// Page bytes that cannot be decoded.
    #[error("page {page_id} is corrupted: {reason}")]
    PageCorrupted {
        /// Page identifier.
        page_id: HeapPageId,
        /// What failed to decode.
        reason: String,
    },

    /// Table identifier unknown to the catalog.
    #[error("table {table_id} not found")]
    TableNotFound {
        /// The missing table.
        table_id: TableId,
    },

    /// Table name unknown to the catalog.
    #[error("table '{name}' not found")]
    TableNameNotFound {
        /// The missing table name.
        name: String,
    },

    /// Affected-row count of an insert or delete that does not fit the
    /// integer count column.
    #[error("{operation} affected {count} rows, more than the count column holds")]
    RowCountOverflow {
        /// `"insert"` or `"delete"`.
        operation: &'static str,
        /// Rows applied.
        count: usize,
    },

    /// Aggregate result that does not fit the output column.
    #[error("aggregate value {value} overflows the integer column")]
    AggregateOverflow {
        /// The accumulated value.
        value: i64,
    },

    // ==========================================================================
    // State Errors
    // ==========================================================================
    /// Iterator method called in the wrong state.
    #[error("cannot call {operation} on an iterator that is {state}")]
    InvalidState {
        /// The offending method.
        operation: &'static str,
        /// State the iterator was in.
        state: IterState,
    },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// I/O error from the underlying system.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// A row failed while an insert or delete operator was draining its child.
    #[error("{operation} failed after {completed} rows: {source}")]
    MutationFailed {
        /// `"insert"` or `"delete"`.
        operation: &'static str,
        /// Rows applied before the failure.
        completed: usize,
        /// The row-level failure.
        source: Box<DbError>,
    },

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    Configuration {
        /// Error message.
        message: String,
    },
}

impl DbError {
    /// Returns the kind of this error.
    ///
    /// A [`DbError::MutationFailed`] has the kind of the row failure it wraps.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidState { .. } => ErrorKind::State,
            Self::MutationFailed { source, .. } => source.kind(),
            Self::Io { .. } => ErrorKind::Io,
            Self::Configuration { .. } => ErrorKind::Configuration,
            _ => ErrorKind::Structural,
        }
    }

    /// Returns true if this error is retryable. The core never retries.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        false
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a schema mismatch error from two displayable shapes.
    #[must_use]
    pub fn schema_mismatch(expected: impl fmt::Display, actual: impl fmt::Display) -> Self {
        Self::SchemaMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Creates a page corruption error.
    #[must_use]
    pub fn corrupted(page_id: HeapPageId, reason: impl Into<String>) -> Self {
        Self::PageCorrupted {
            page_id,
            reason: reason.into(),
        }
    }

    /// Creates a state error.
    #[must_use]
    pub const fn invalid_state(operation: &'static str, state: IterState) -> Self {
        Self::InvalidState { operation, state }
    }
}

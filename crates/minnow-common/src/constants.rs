//! System-wide constants for MinnowDB.
//!
//! These values define the on-disk format and the defaults used when no
//! explicit configuration is supplied.

// =============================================================================
// Page Constants
// =============================================================================

/// Default page size in bytes (4 KB).
///
/// Pages are stored at byte offset `page_number * page_size` in a table's
/// heap file, so this value is part of the on-disk format.
pub const DEFAULT_PAGE_SIZE: usize = 4 * 1024;

/// Smallest page size accepted by configuration validation.
pub const MIN_PAGE_SIZE: usize = 64;

/// Number of bits in a byte, used by the occupancy bitmap arithmetic.
pub const BITS_PER_BYTE: usize = 8;

// =============================================================================
// Field Constants
// =============================================================================

/// Serialized width of an integer field in bytes.
pub const INT_FIELD_WIDTH: usize = 4;

/// Maximum number of bytes stored for a text field.
///
/// Longer strings are truncated; shorter ones are zero-padded.
pub const STRING_LEN: usize = 128;

/// Serialized width of a text field: a 4-byte length prefix plus the
/// fixed-size character buffer.
pub const TEXT_FIELD_WIDTH: usize = 4 + STRING_LEN;

// =============================================================================
// Buffer Pool Constants
// =============================================================================

/// Default number of pages held by the buffer pool.
pub const DEFAULT_BUFFER_POOL_PAGES: usize = 50;

// =============================================================================
// Statistics Constants
// =============================================================================

/// Default cost charged for reading one page during a sequential scan.
pub const DEFAULT_IO_COST_PER_PAGE: f64 = 1000.0;

/// Default number of histogram buckets per column.
pub const DEFAULT_HISTOGRAM_BUCKETS: usize = 100;

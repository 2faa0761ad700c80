//! Error handling for MinnowDB.
//!
//! This module provides a unified error type and result alias used
//! across all MinnowDB components.

mod database;

pub use database::{DbError, ErrorKind};

/// Result type alias for MinnowDB operations.
pub type DbResult<T> = std::result::Result<T, DbError>;

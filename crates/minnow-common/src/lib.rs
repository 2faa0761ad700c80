//! # minnow-common
//!
//! Common types, errors, and utilities for MinnowDB.
//!
//! This crate provides the foundational types shared by the storage engine
//! and the executor:
//!
//! - **Types**: identifiers (`TableId`, `HeapPageId`, `RecordId`, `TransactionId`),
//!   field values, schemas and tuples
//! - **Errors**: the `DbError` taxonomy and the `DbResult` alias
//! - **Config**: storage, buffer pool and statistics configuration
//! - **Iterator**: the pull contract every operator and storage scan implements
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use minnow_common::types::{Field, Schema, Tuple, Type};
//! use minnow_common::DbResult;
//!
//! fn example() -> DbResult<()> {
//!     let schema = Arc::new(Schema::new(
//!         vec![Type::Int, Type::Text],
//!         vec![Some("id".into()), Some("name".into())],
//!     )?);
//!     let tuple = Tuple::new(schema, vec![Field::Int(1), Field::text("minnow")])?;
//!     assert_eq!(tuple.field(0)?, &Field::Int(1));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod error;
pub mod iterator;
pub mod types;

// Re-export commonly used items at the crate root
pub use constants::*;
pub use error::{DbError, DbResult, ErrorKind};
pub use iterator::{Cursor, IterState, OpIterator, TupleIterator, TupleSource};
pub use types::{
    CompareOp, Field, HeapPageId, Permissions, RecordId, Schema, TableId, TransactionId, Tuple,
    Type,
};

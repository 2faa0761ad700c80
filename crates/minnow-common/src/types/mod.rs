//! Type definitions for MinnowDB.
//!
//! Identifiers, field values, schemas and tuples shared by storage and
//! execution.

mod field;
mod ids;
mod schema;
mod tuple;

pub use field::{CompareOp, Field, Type};
pub use ids::{HeapPageId, Permissions, RecordId, TableId, TransactionId};
pub use schema::{Schema, SchemaField};
pub use tuple::Tuple;

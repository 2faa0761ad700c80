//! Schema-conformant rows.

use std::fmt;
use std::sync::Arc;

use crate::error::{DbError, DbResult};
use crate::types::{Field, RecordId, Schema};

/// An ordered row of field values matching a schema.
///
/// The record id is only present once the tuple has been written to a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    schema: Arc<Schema>,
    fields: Vec<Field>,
    record_id: Option<RecordId>,
}

impl Tuple {
    /// Creates a tuple, checking field count and per-field types.
    pub fn new(schema: Arc<Schema>, fields: Vec<Field>) -> DbResult<Self> {
        if fields.len() != schema.num_fields() {
            return Err(DbError::schema_mismatch(
                format!("{} fields ({})", schema.num_fields(), schema),
                format!("{} fields", fields.len()),
            ));
        }
        for (index, (field, expected)) in fields.iter().zip(schema.types()).enumerate() {
            if field.field_type() != expected {
                return Err(DbError::TypeMismatch {
                    index,
                    expected,
                    actual: field.field_type(),
                });
            }
        }
        Ok(Self {
            schema,
            fields,
            record_id: None,
        })
    }

    /// Returns the tuple's schema.
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns all field values.
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Consumes the tuple, returning its values.
    #[must_use]
    pub fn into_fields(self) -> Vec<Field> {
        self.fields
    }

    /// Returns field `index`.
    pub fn field(&self, index: usize) -> DbResult<&Field> {
        self.fields.get(index).ok_or(DbError::InvalidFieldIndex {
            index,
            len: self.fields.len(),
        })
    }

    /// Replaces field `index`; the new value must have the slot's type.
    pub fn set_field(&mut self, index: usize, value: Field) -> DbResult<()> {
        let expected = self.schema.field_type(index)?;
        if value.field_type() != expected {
            return Err(DbError::TypeMismatch {
                index,
                expected,
                actual: value.field_type(),
            });
        }
        self.fields[index] = value;
        Ok(())
    }

    /// Returns where this tuple is stored, if it has been persisted.
    #[inline]
    #[must_use]
    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    /// Sets or clears the storage location.
    #[inline]
    pub fn set_record_id(&mut self, record_id: Option<RecordId>) {
        self.record_id = record_id;
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str("\t")?;
            }
            write!(f, "{field}")?;
        }
        Ok(())
    }
}

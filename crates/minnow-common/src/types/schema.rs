//! Tuple schemas.
//!
//! A [`Schema`] is an ordered, non-empty list of typed and optionally named
//! fields. Its byte size is fixed once constructed, which is what lets heap
//! pages use fixed-width slots.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DbError, DbResult};
use crate::types::Type;

/// One slot of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaField {
    /// Value type.
    pub field_type: Type,
    /// Optional field name.
    pub name: Option<String>,
}

impl SchemaField {
    /// Creates a named field.
    pub fn named(field_type: Type, name: impl Into<String>) -> Self {
        Self {
            field_type,
            name: Some(name.into()),
        }
    }

    /// Creates an anonymous field.
    pub const fn anonymous(field_type: Type) -> Self {
        Self {
            field_type,
            name: None,
        }
    }
}

impl fmt::Display for SchemaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}({})", name, self.field_type),
            None => write!(f, "{}", self.field_type),
        }
    }
}

/// Ordered description of a tuple's shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<SchemaField>,
}

impl Schema {
    /// Creates a schema from parallel lists of types and names.
    pub fn new(types: Vec<Type>, names: Vec<Option<String>>) -> DbResult<Self> {
        if types.len() != names.len() {
            return Err(DbError::schema_mismatch(
                format!("{} names", types.len()),
                format!("{} names", names.len()),
            ));
        }
        let fields = types
            .into_iter()
            .zip(names)
            .map(|(field_type, name)| SchemaField { field_type, name })
            .collect();
        Self::from_fields(fields)
    }

    /// Creates a schema of anonymous fields.
    pub fn from_types(types: Vec<Type>) -> DbResult<Self> {
        Self::from_fields(types.into_iter().map(SchemaField::anonymous).collect())
    }

    /// Creates a schema from prepared fields.
    pub fn from_fields(fields: Vec<SchemaField>) -> DbResult<Self> {
        if fields.is_empty() {
            return Err(DbError::EmptySchema);
        }
        Ok(Self { fields })
    }

    /// Concatenates two schemas, `a`'s fields first.
    #[must_use]
    pub fn merge(a: &Schema, b: &Schema) -> Schema {
        let mut fields = Vec::with_capacity(a.num_fields() + b.num_fields());
        fields.extend_from_slice(&a.fields);
        fields.extend_from_slice(&b.fields);
        Schema { fields }
    }

    /// Returns the number of fields.
    #[inline]
    #[must_use]
    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Returns the fields in order.
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Returns the types in order.
    pub fn types(&self) -> impl Iterator<Item = Type> + '_ {
        self.fields.iter().map(|f| f.field_type)
    }

    /// Returns the type of field `index`.
    pub fn field_type(&self, index: usize) -> DbResult<Type> {
        self.get(index).map(|f| f.field_type)
    }

    /// Returns the name of field `index`, `None` for anonymous fields.
    pub fn field_name(&self, index: usize) -> DbResult<Option<&str>> {
        self.get(index).map(|f| f.name.as_deref())
    }

    /// Finds the first field called `name`.
    pub fn index_of(&self, name: &str) -> DbResult<usize> {
        self.fields
            .iter()
            .position(|f| f.name.as_deref() == Some(name))
            .ok_or_else(|| DbError::UnknownField {
                name: name.to_owned(),
            })
    }

    /// Returns the serialized size of one tuple in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.types().map(Type::width).sum()
    }

    /// Returns true if both schemas have the same field types in the same
    /// order. Names are ignored.
    #[must_use]
    pub fn same_types(&self, other: &Schema) -> bool {
        self.num_fields() == other.num_fields() && self.types().eq(other.types())
    }

    /// Returns a copy whose names are qualified as `alias.name`.
    #[must_use]
    pub fn with_prefix(&self, alias: &str) -> Schema {
        let fields = self
            .fields
            .iter()
            .map(|f| SchemaField {
                field_type: f.field_type,
                name: f.name.as_ref().map(|name| format!("{alias}.{name}")),
            })
            .collect();
        Schema { fields }
    }

    fn get(&self, index: usize) -> DbResult<&SchemaField> {
        self.fields.get(index).ok_or(DbError::InvalidFieldIndex {
            index,
            len: self.fields.len(),
        })
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field}")?;
        }
        Ok(())
    }
}

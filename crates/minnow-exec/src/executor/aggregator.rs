//! Grouped aggregation.
//!
//! An [`Aggregator`] consumes tuples one at a time and keeps one running
//! state per distinct group key:
//!
//! ```text
//!   tuple ──▶ key = tuple[group_field] ──▶ index: HashMap<key, slot>
//!                                                 │
//!                                                 ▼
//!                         groups: Vec<GroupState> (first-discovery order)
//!                         { key, value: i64, count: i64 }
//! ```
//!
//! AVG keeps the running sum and divides only when results are produced.
//! Results come out in the order groups were first seen. Without grouping
//! there is one implicit group whose key is dropped from the output.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use minnow_common::error::{DbError, DbResult};
use minnow_common::iterator::{Cursor, TupleSource};
use minnow_common::types::{Field, Schema, Tuple, Type};

/// Aggregate function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    /// Number of values.
    Count,
    /// Sum of values.
    Sum,
    /// Integer average, truncated.
    Avg,
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
        };
        f.write_str(name)
    }
}

/// Streaming accumulator over one column, optionally grouped by another.
pub trait Aggregator: fmt::Debug + Send {
    /// Folds one tuple into its group.
    fn merge_tuple_into_group(&mut self, tuple: &Tuple) -> DbResult<()>;

    /// Materializes the current results.
    ///
    /// Grouped results are `(group, value)` tuples, ungrouped results a
    /// single `(value)` tuple, or nothing if no tuple was merged.
    fn iterator(&self) -> DbResult<AggregateResults>;
}

/// Group key; `None` is the implicit group used without grouping.
type GroupKey = Option<Field>;

#[derive(Debug)]
struct GroupState {
    key: GroupKey,
    value: i64,
    count: i64,
}

/// Group table shared by both aggregator kinds.
#[derive(Debug)]
struct Groups {
    group_by: Option<(usize, Type)>,
    op: AggregateOp,
    index: HashMap<GroupKey, usize>,
    groups: Vec<GroupState>,
    schema: Arc<Schema>,
}

impl Groups {
    fn new(group_by: Option<(usize, Type)>, op: AggregateOp) -> DbResult<Self> {
        let types = match group_by {
            Some((_, ty)) => vec![ty, Type::Int],
            None => vec![Type::Int],
        };
        Ok(Self {
            group_by,
            op,
            index: HashMap::new(),
            groups: Vec::new(),
            schema: Arc::new(Schema::from_types(types)?),
        })
    }

    fn key_of(&self, tuple: &Tuple) -> DbResult<GroupKey> {
        let Some((index, expected)) = self.group_by else {
            return Ok(None);
        };
        let key = tuple.field(index)?;
        if key.field_type() != expected {
            return Err(DbError::TypeMismatch {
                index,
                expected,
                actual: key.field_type(),
            });
        }
        Ok(Some(key.clone()))
    }

    fn merge(&mut self, key: GroupKey, value: i64) {
        if let Some(&slot) = self.index.get(&key) {
            let state = &mut self.groups[slot];
            state.count += 1;
            match self.op {
                AggregateOp::Count => state.value += 1,
                AggregateOp::Sum | AggregateOp::Avg => state.value += value,
                AggregateOp::Min => state.value = state.value.min(value),
                AggregateOp::Max => state.value = state.value.max(value),
            }
            return;
        }

        let seed = match self.op {
            AggregateOp::Count => 1,
            _ => value,
        };
        self.index.insert(key.clone(), self.groups.len());
        self.groups.push(GroupState {
            key,
            value: seed,
            count: 1,
        });
    }

    fn results(&self) -> DbResult<AggregateResults> {
        let rows = self
            .groups
            .iter()
            .map(|state| {
                let value = match self.op {
                    AggregateOp::Avg => state.value / state.count,
                    _ => state.value,
                };
                let value = i32::try_from(value)
                    .map_err(|_| DbError::AggregateOverflow { value })?;
                let mut fields = Vec::with_capacity(2);
                fields.extend(state.key.clone());
                fields.push(Field::Int(value));
                Tuple::new(self.schema.clone(), fields)
            })
            .collect::<DbResult<Vec<_>>>()?;
        Ok(AggregateResults::new(self.schema.clone(), rows.into()))
    }
}

/// Aggregator over an integer column. Supports every [`AggregateOp`].
#[derive(Debug)]
pub struct IntegerAggregator {
    agg_field: usize,
    groups: Groups,
}

impl IntegerAggregator {
    /// Creates an aggregator of `op` over `agg_field`, grouped by the
    /// `(index, type)` field if given.
    pub fn new(
        group_by: Option<(usize, Type)>,
        agg_field: usize,
        op: AggregateOp,
    ) -> DbResult<Self> {
        Ok(Self {
            agg_field,
            groups: Groups::new(group_by, op)?,
        })
    }
}

impl Aggregator for IntegerAggregator {
    fn merge_tuple_into_group(&mut self, tuple: &Tuple) -> DbResult<()> {
        let field = tuple.field(self.agg_field)?;
        let value = field.as_int().ok_or(DbError::TypeMismatch {
            index: self.agg_field,
            expected: Type::Int,
            actual: field.field_type(),
        })?;
        let key = self.groups.key_of(tuple)?;
        self.groups.merge(key, i64::from(value));
        Ok(())
    }

    fn iterator(&self) -> DbResult<AggregateResults> {
        self.groups.results()
    }
}

/// Aggregator over a text column. Only COUNT is meaningful.
#[derive(Debug)]
pub struct StringAggregator {
    agg_field: usize,
    groups: Groups,
}

impl StringAggregator {
    /// Creates a COUNT aggregator over `agg_field`.
    ///
    /// Any other operator is rejected before a tuple is seen.
    pub fn new(
        group_by: Option<(usize, Type)>,
        agg_field: usize,
        op: AggregateOp,
    ) -> DbResult<Self> {
        if op != AggregateOp::Count {
            return Err(DbError::configuration(format!(
                "{op} is not supported over text; only count is"
            )));
        }
        Ok(Self {
            agg_field,
            groups: Groups::new(group_by, op)?,
        })
    }
}

impl Aggregator for StringAggregator {
    fn merge_tuple_into_group(&mut self, tuple: &Tuple) -> DbResult<()> {
        let field = tuple.field(self.agg_field)?;
        if field.field_type() != Type::Text {
            return Err(DbError::TypeMismatch {
                index: self.agg_field,
                expected: Type::Text,
                actual: field.field_type(),
            });
        }
        let key = self.groups.key_of(tuple)?;
        self.groups.merge(key, 0);
        Ok(())
    }

    fn iterator(&self) -> DbResult<AggregateResults> {
        self.groups.results()
    }
}

/// Read cursor over materialized aggregate results.
#[derive(Debug)]
pub struct AggregateResults {
    schema: Arc<Schema>,
    rows: Arc<[Tuple]>,
    position: usize,
    cursor: Cursor,
}

impl AggregateResults {
    fn new(schema: Arc<Schema>, rows: Arc<[Tuple]>) -> Self {
        Self {
            schema,
            rows,
            position: 0,
            cursor: Cursor::new(),
        }
    }

    /// Returns the number of result tuples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no results.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl TupleSource for AggregateResults {
    fn source_schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    fn open_source(&mut self) -> DbResult<()> {
        self.position = 0;
        Ok(())
    }

    fn fetch_next(&mut self) -> DbResult<Option<Tuple>> {
        let row = self.rows.get(self.position).cloned();
        if row.is_some() {
            self.position += 1;
        }
        Ok(row)
    }

    fn rewind_source(&mut self) -> DbResult<()> {
        self.position = 0;
        Ok(())
    }
}

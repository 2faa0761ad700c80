//! Aggregation operator.

use std::sync::Arc;

use minnow_common::error::DbResult;
use minnow_common::iterator::{Cursor, OpIterator, TupleSource};
use minnow_common::types::{Schema, SchemaField, Tuple, Type};
use tracing::debug;

use super::aggregator::{AggregateOp, AggregateResults, Aggregator, IntegerAggregator, StringAggregator};

fn merge_all(child: &mut dyn OpIterator, aggregator: &mut dyn Aggregator) -> DbResult<usize> {
    let mut merged = 0;
    while let Some(tuple) = child.next()? {
        aggregator.merge_tuple_into_group(&tuple)?;
        merged += 1;
    }
    Ok(merged)
}

/// Computes one aggregate over the child, optionally grouped by a field.
///
/// The child is drained when the operator is built; `open` and `rewind`
/// only move over the materialized results. Output columns are
/// `(group, op(field))` when grouped and `(op(field))` otherwise.
pub struct Aggregate {
    agg_field: usize,
    group_field: Option<usize>,
    op: AggregateOp,
    agg_field_name: String,
    group_field_name: Option<String>,
    schema: Arc<Schema>,
    results: AggregateResults,
    cursor: Cursor,
}

impl Aggregate {
    /// Aggregates `child[agg_field]` with `op`, grouped by `group_field`.
    ///
    /// The child must be unopened. Integer columns accept every operator;
    /// text columns only accept COUNT.
    pub fn new(
        mut child: Box<dyn OpIterator>,
        agg_field: usize,
        group_field: Option<usize>,
        op: AggregateOp,
    ) -> DbResult<Self> {
        let child_schema = child.schema().clone();
        let agg_type = child_schema.field_type(agg_field)?;
        let group_by = match group_field {
            Some(index) => Some((index, child_schema.field_type(index)?)),
            None => None,
        };

        let mut aggregator: Box<dyn Aggregator> = match agg_type {
            Type::Int => Box::new(IntegerAggregator::new(group_by, agg_field, op)?),
            Type::Text => Box::new(StringAggregator::new(group_by, agg_field, op)?),
        };

        child.open()?;
        let merged = merge_all(child.as_mut(), aggregator.as_mut());
        child.close();
        let merged = merged?;

        let agg_field_name = match child_schema.field_name(agg_field)? {
            Some(name) => format!("{op}({name})"),
            None => format!("{op}({agg_field})"),
        };
        let group_field_name = match group_by {
            Some((index, _)) => Some(
                child_schema
                    .field_name(index)?
                    .unwrap_or("group")
                    .to_string(),
            ),
            None => None,
        };

        let mut fields = Vec::with_capacity(2);
        if let (Some((_, ty)), Some(name)) = (group_by, &group_field_name) {
            fields.push(SchemaField::named(ty, name.clone()));
        }
        fields.push(SchemaField::named(Type::Int, agg_field_name.clone()));
        let schema = Arc::new(Schema::from_fields(fields)?);

        let results = aggregator.iterator()?;
        debug!(
            %op,
            input = merged,
            groups = results.len(),
            "aggregate materialized"
        );

        Ok(Self {
            agg_field,
            group_field,
            op,
            agg_field_name,
            group_field_name,
            schema,
            results,
            cursor: Cursor::new(),
        })
    }

    /// Returns the grouping field index, if grouped.
    #[must_use]
    pub fn group_field(&self) -> Option<usize> {
        self.group_field
    }

    /// Returns the output name of the grouping column, if grouped.
    #[must_use]
    pub fn group_field_name(&self) -> Option<&str> {
        self.group_field_name.as_deref()
    }

    /// Returns the aggregated field index.
    #[must_use]
    pub fn aggregate_field(&self) -> usize {
        self.agg_field
    }

    /// Returns the output name of the aggregate column.
    #[must_use]
    pub fn aggregate_field_name(&self) -> &str {
        &self.agg_field_name
    }

    /// Returns the aggregate function.
    #[must_use]
    pub fn aggregate_op(&self) -> AggregateOp {
        self.op
    }
}

impl TupleSource for Aggregate {
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
        self.results.open()
    }

    fn fetch_next(&mut self) -> DbResult<Option<Tuple>> {
        self.results
            .next()?
            .map(|row| Tuple::new(self.schema.clone(), row.into_fields()))
            .transpose()
    }

    fn rewind_source(&mut self) -> DbResult<()> {
        self.results.rewind()
    }

    fn close_source(&mut self) {
        self.results.close();
    }
}

//! Insert and delete operators.
//!
//! Both drain their child on the first `next` call, route every tuple
//! through the buffer manager, and produce a single `(count)` tuple. They
//! are single-shot: neither a second `next` nor a `rewind` re-applies the
//! mutation. A failing row aborts the operator with
//! [`DbError::MutationFailed`]; rows already applied are not rolled back.

use std::sync::Arc;

use minnow_common::error::{DbError, DbResult};
use minnow_common::iterator::{Cursor, OpIterator, TupleSource};
use minnow_common::types::{Field, Schema, SchemaField, TableId, TransactionId, Tuple, Type};
use tracing::debug;

use super::ExecContext;

fn count_schema() -> DbResult<Arc<Schema>> {
    Ok(Arc::new(Schema::from_fields(vec![SchemaField::named(
        Type::Int,
        "count",
    )])?))
}

/// Pulls every tuple from `child` and hands it to `apply`.
fn apply_all(
    operation: &'static str,
    child: &mut dyn OpIterator,
    schema: &Arc<Schema>,
    mut apply: impl FnMut(Tuple) -> DbResult<()>,
) -> DbResult<Tuple> {
    let failed = |completed: usize, source: DbError| DbError::MutationFailed {
        operation,
        completed,
        source: Box::new(source),
    };

    let mut completed = 0usize;
    while let Some(tuple) = child.next().map_err(|e| failed(completed, e))? {
        apply(tuple).map_err(|e| failed(completed, e))?;
        completed += 1;
    }

    let count = i32::try_from(completed).map_err(|_| DbError::RowCountOverflow {
        operation,
        count: completed,
    })?;
    debug!(operation, rows = completed, "mutation applied");
    Tuple::new(schema.clone(), vec![Field::Int(count)])
}

/// Inserts the child's tuples into a table.
pub struct Insert {
    ctx: ExecContext,
    tid: TransactionId,
    child: Box<dyn OpIterator>,
    table_id: TableId,
    schema: Arc<Schema>,
    done: bool,
    cursor: Cursor,
}

impl Insert {
    /// Creates an insert of `child`'s tuples into `table_id`.
    ///
    /// The child schema must have the table's field types.
    pub fn new(
        ctx: ExecContext,
        tid: TransactionId,
        child: Box<dyn OpIterator>,
        table_id: TableId,
    ) -> DbResult<Self> {
        let table_schema = ctx.catalog().schema(table_id)?;
        if !child.schema().same_types(&table_schema) {
            return Err(DbError::schema_mismatch(&table_schema, child.schema()));
        }
        Ok(Self {
            ctx,
            tid,
            child,
            table_id,
            schema: count_schema()?,
            done: false,
            cursor: Cursor::new(),
        })
    }

    /// Returns the target table.
    #[must_use]
    pub fn table_id(&self) -> TableId {
        self.table_id
    }
}

impl TupleSource for Insert {
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
        self.child.open()
    }

    fn fetch_next(&mut self) -> DbResult<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;
        let buffer = self.ctx.buffer_pool();
        let (tid, table_id) = (self.tid, self.table_id);
        apply_all("insert", self.child.as_mut(), &self.schema, |tuple| {
            buffer.insert_tuple(tid, table_id, tuple).map(|_| ())
        })
        .map(Some)
    }

    fn rewind_source(&mut self) -> DbResult<()> {
        self.child.rewind()
    }

    fn close_source(&mut self) {
        self.child.close();
    }
}

/// Deletes the child's tuples from the tables their record ids name.
pub struct Delete {
    ctx: ExecContext,
    tid: TransactionId,
    child: Box<dyn OpIterator>,
    schema: Arc<Schema>,
    done: bool,
    cursor: Cursor,
}

impl Delete {
    /// Creates a delete of every tuple `child` produces.
    pub fn new(ctx: ExecContext, tid: TransactionId, child: Box<dyn OpIterator>) -> DbResult<Self> {
        Ok(Self {
            ctx,
            tid,
            child,
            schema: count_schema()?,
            done: false,
            cursor: Cursor::new(),
        })
    }
}

impl TupleSource for Delete {
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
        self.child.open()
    }

    fn fetch_next(&mut self) -> DbResult<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;
        let buffer = self.ctx.buffer_pool();
        let tid = self.tid;
        apply_all("delete", self.child.as_mut(), &self.schema, |tuple| {
            buffer.delete_tuple(tid, &tuple)
        })
        .map(Some)
    }

    fn rewind_source(&mut self) -> DbResult<()> {
        self.child.rewind()
    }

    fn close_source(&mut self) {
        self.child.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{Filter, Predicate, SeqScan};
    use crate::testing::{drain, int_pairs, ints, Db};
    use minnow_common::error::ErrorKind;
    use minnow_common::types::CompareOp;

    fn scan(db: &Db, id: TableId) -> Box<dyn OpIterator> {
        Box::new(SeqScan::with_table_name(db.ctx.clone(), TransactionId::next(), id).unwrap())
    }

    #[test]
    fn test_insert_reports_count_once() {
        let db = Db::new();
        let id = db.table("t", &[]);
        let child = Box::new(int_pairs(&[(1, 2), (3, 4), (5, 6)]));
        let mut insert = Insert::new(db.ctx.clone(), TransactionId::next(), child, id).unwrap();

        insert.open().unwrap();
        assert_eq!(ints(&drain(&mut insert)), vec![vec![3]]);
        assert!(insert.next().unwrap().is_none());
        insert.rewind().unwrap();
        assert!(insert.next().unwrap().is_none());
        insert.close();

        let mut all = scan(&db, id);
        all.open().unwrap();
        assert_eq!(ints(&drain(all.as_mut())), vec![vec![1, 2], vec![3, 4], vec![5, 6]]);
    }

    #[test]
    fn test_insert_table_into_itself_terminates() {
        let db = Db::new();
        // exactly one full page, so every insert appends past the scanned range
        let rows: Vec<(i32, i32)> = (0..15).map(|i| (i, -i)).collect();
        let id = db.table("t", &rows);
        assert_eq!(db.ctx.catalog().file(id).unwrap().num_pages(), 1);

        let mut insert =
            Insert::new(db.ctx.clone(), TransactionId::next(), scan(&db, id), id).unwrap();
        insert.open().unwrap();
        assert_eq!(ints(&drain(&mut insert)), vec![vec![15]]);
        insert.close();

        let mut all = scan(&db, id);
        all.open().unwrap();
        assert_eq!(drain(all.as_mut()).len(), 30);
    }

    #[test]
    fn test_insert_rejects_schema_mismatch() {
        let db = Db::new();
        let id = db.table("t", &[]);
        let schema = Arc::new(Schema::from_types(vec![Type::Int]).unwrap());
        let child = minnow_common::TupleIterator::new(schema, vec![]).unwrap();
        let err = Insert::new(db.ctx.clone(), TransactionId::next(), Box::new(child), id)
            .err()
            .unwrap();
        assert!(matches!(err, DbError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_delete_matching_rows() {
        let db = Db::new();
        let id = db.table("t", &[(1, 0), (2, 0), (3, 0), (4, 0)]);
        let predicate = Predicate::new(0, CompareOp::GreaterThan, Field::Int(2));
        let child = Box::new(Filter::new(predicate, scan(&db, id)).unwrap());
        let mut delete = Delete::new(db.ctx.clone(), TransactionId::next(), child).unwrap();

        delete.open().unwrap();
        let first = delete.next().unwrap().unwrap();
        assert_eq!(first.field(0).unwrap(), &Field::Int(2));
        assert_eq!(first.schema().field_name(0).unwrap(), Some("count"));
        assert!(delete.next().unwrap().is_none());
        delete.close();

        let mut rest = scan(&db, id);
        rest.open().unwrap();
        assert_eq!(ints(&drain(rest.as_mut())), vec![vec![1, 0], vec![2, 0]]);
    }

    #[test]
    fn test_delete_failure_is_wrapped() {
        let db = Db::new();
        db.table("t", &[]);
        // tuples that were never stored carry no record id
        let mut delete = Delete::new(
            db.ctx.clone(),
            TransactionId::next(),
            Box::new(int_pairs(&[(1, 1)])),
        )
        .unwrap();
        delete.open().unwrap();
        let err = delete.next().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert!(matches!(
            err,
            DbError::MutationFailed {
                operation: "delete",
                completed: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_deleting_a_freed_slot_is_structural() {
        let db = Db::new();
        let id = db.table("t", &[(1, 1), (2, 2)]);
        let mut first = scan(&db, id);
        first.open().unwrap();
        let stored = first.next().unwrap().unwrap();
        first.close();

        let schema = stored.schema().clone();
        let twice =
            minnow_common::TupleIterator::new(schema, vec![stored.clone(), stored]).unwrap();
        let mut delete =
            Delete::new(db.ctx.clone(), TransactionId::next(), Box::new(twice)).unwrap();
        delete.open().unwrap();
        let err = delete.next().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
        match err {
            DbError::MutationFailed {
                operation,
                completed,
                source,
            } => {
                assert_eq!((operation, completed), ("delete", 1));
                assert!(matches!(*source, DbError::SlotNotOccupied { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

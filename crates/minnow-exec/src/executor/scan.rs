//! Sequential scan operator.

use std::sync::Arc;

use minnow_common::error::DbResult;
use minnow_common::iterator::{Cursor, OpIterator, TupleSource};
use minnow_common::types::{Schema, TableId, TransactionId, Tuple};
use minnow_storage::HeapFileIterator;

use super::ExecContext;

/// Scans every tuple of a table in page and slot order.
///
/// The output schema is the table schema with field names qualified as
/// `alias.field`, so that columns of joined tables stay distinguishable.
pub struct SeqScan {
    table_id: TableId,
    table_name: String,
    alias: String,
    schema: Arc<Schema>,
    inner: HeapFileIterator,
    cursor: Cursor,
}

impl SeqScan {
    /// Creates a scan of `table_id` whose fields are prefixed with `alias`.
    pub fn new(
        ctx: ExecContext,
        tid: TransactionId,
        table_id: TableId,
        alias: impl Into<String>,
    ) -> DbResult<Self> {
        let alias = alias.into();
        let catalog = ctx.catalog();
        let file = catalog.file(table_id)?;
        let table_name = catalog.table_name(table_id)?;
        let schema = Arc::new(file.schema().with_prefix(&alias));
        Ok(Self {
            table_id,
            table_name,
            alias,
            schema,
            inner: file.iterator(tid, ctx.buffer_pool().clone()),
            cursor: Cursor::new(),
        })
    }

    /// Creates a scan that uses the catalog name as alias.
    pub fn with_table_name(ctx: ExecContext, tid: TransactionId, table_id: TableId) -> DbResult<Self> {
        let name = ctx.catalog().table_name(table_id)?;
        Self::new(ctx, tid, table_id, name)
    }

    /// Returns the scanned table.
    #[must_use]
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Returns the catalog name of the scanned table.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Returns the alias used to qualify field names.
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }
}

impl TupleSource for SeqScan {
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
        self.inner.open()
    }

    fn fetch_next(&mut self) -> DbResult<Option<Tuple>> {
        let Some(stored) = self.inner.next()? else {
            return Ok(None);
        };
        let record_id = stored.record_id();
        let mut tuple = Tuple::new(self.schema.clone(), stored.into_fields())?;
        tuple.set_record_id(record_id);
        Ok(Some(tuple))
    }

    fn rewind_source(&mut self) -> DbResult<()> {
        self.inner.rewind()
    }

    fn close_source(&mut self) {
        self.inner.close();
    }
}

//! Fixtures shared by the integration tests.

use std::path::Path;
use std::sync::Arc;

use minnow_common::config::DbConfig;
use minnow_common::error::DbResult;
use minnow_common::iterator::{OpIterator, TupleIterator};
use minnow_common::types::{Field, Schema, TableId, TransactionId, Tuple, Type};
use minnow_exec::ExecContext;
use minnow_storage::{BufferManager, BufferPool, Catalog, HeapFile, MemoryCatalog};
use tempfile::TempDir;

/// A catalog, buffer pool and execution context over a temporary directory.
pub struct TestDb {
    /// Holds the heap files; removed on drop.
    pub dir: TempDir,
    /// Configuration the pool and tables were built with.
    pub config: DbConfig,
    /// Table registry.
    pub catalog: Arc<MemoryCatalog>,
    /// Page cache shared by all tables.
    pub pool: Arc<BufferPool>,
    /// Context handed to operators.
    pub ctx: ExecContext,
}

impl TestDb {
    /// Creates an empty database with [`DbConfig::for_testing`].
    pub fn new() -> DbResult<Self> {
        Self::with_config(DbConfig::for_testing())
    }

    /// Creates an empty database with the given configuration.
    pub fn with_config(config: DbConfig) -> DbResult<Self> {
        config.validate()?;
        let dir = tempfile::tempdir()?;
        let catalog = Arc::new(MemoryCatalog::new());
        let pool = Arc::new(BufferPool::new(config.buffer_pool.clone(), catalog.clone())?);
        let ctx = ExecContext::from_pool(pool.clone());
        Ok(Self {
            dir,
            config,
            catalog,
            pool,
            ctx,
        })
    }

    /// Returns the directory holding the heap files.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Creates an empty table named `name` with the given schema.
    pub fn create_table(&self, name: &str, schema: Schema) -> DbResult<TableId> {
        let path = self.dir.path().join(format!("{name}.dat"));
        let file = HeapFile::open(path, Arc::new(schema), self.config.storage.page_size)?;
        Ok(self.catalog.add_table(Arc::new(file), name))
    }

    /// Inserts `rows` through the buffer pool under a fresh transaction.
    pub fn load(&self, table_id: TableId, rows: Vec<Vec<Field>>) -> DbResult<()> {
        let schema = self.catalog.schema(table_id)?;
        let tid = TransactionId::next();
        for row in rows {
            let tuple = Tuple::new(schema.clone(), row)?;
            self.pool.insert_tuple(tid, table_id, tuple)?;
        }
        Ok(())
    }
}

/// Schema of `n` int columns named `c0..cn`.
pub fn int_schema(n: usize) -> DbResult<Schema> {
    let names = (0..n).map(|i| Some(format!("c{i}"))).collect();
    Schema::new(vec![Type::Int; n], names)
}

/// Rows of int fields.
pub fn int_rows(rows: &[&[i32]]) -> Vec<Vec<Field>> {
    rows.iter()
        .map(|row| row.iter().map(|&v| Field::Int(v)).collect())
        .collect()
}

/// In-memory child operator over anonymous int columns.
pub fn int_source(width: usize, rows: &[&[i32]]) -> DbResult<TupleIterator> {
    let schema = Arc::new(Schema::from_types(vec![Type::Int; width])?);
    let tuples = int_rows(rows)
        .into_iter()
        .map(|fields| Tuple::new(schema.clone(), fields))
        .collect::<DbResult<Vec<_>>>()?;
    TupleIterator::new(schema, tuples)
}

/// Pulls every remaining tuple out of an open operator.
pub fn collect(op: &mut dyn OpIterator) -> DbResult<Vec<Tuple>> {
    let mut out = Vec::new();
    while let Some(tuple) = op.next()? {
        out.push(tuple);
    }
    Ok(out)
}

/// Projects tuples of int fields to plain vectors.
pub fn as_ints(tuples: &[Tuple]) -> Vec<Vec<i32>> {
    tuples
        .iter()
        .map(|t| t.fields().iter().filter_map(Field::as_int).collect())
        .collect()
}

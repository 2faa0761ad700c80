//! Fixtures shared by unit tests in this crate.

use std::sync::Arc;

use minnow_common::config::BufferPoolConfig;
use minnow_common::iterator::{OpIterator, TupleIterator};
use minnow_common::types::{Field, Schema, TableId, TransactionId, Tuple, Type};
use minnow_storage::{BufferManager, BufferPool, HeapFile, MemoryCatalog};
use tempfile::TempDir;

use crate::executor::ExecContext;

pub const PAGE_SIZE: usize = 128;

pub struct Db {
    pub dir: TempDir,
    pub catalog: Arc<MemoryCatalog>,
    pub pool: Arc<BufferPool>,
    pub ctx: ExecContext,
}

impl Db {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(MemoryCatalog::new());
        let pool = Arc::new(
            BufferPool::new(BufferPoolConfig { num_pages: 8 }, catalog.clone()).unwrap(),
        );
        let ctx = ExecContext::from_pool(pool.clone());
        Self {
            dir,
            catalog,
            pool,
            ctx,
        }
    }

    /// Creates a table of two named int columns and loads `rows` into it.
    pub fn table(&self, name: &str, rows: &[(i32, i32)]) -> TableId {
        let schema = Arc::new(
            Schema::new(
                vec![Type::Int, Type::Int],
                vec![Some("a".into()), Some("b".into())],
            )
            .unwrap(),
        );
        let file = Arc::new(
            HeapFile::open(self.dir.path().join(format!("{name}.dat")), schema.clone(), PAGE_SIZE)
                .unwrap(),
        );
        let id = self.catalog.add_table(file, name);
        let tid = TransactionId::next();
        for &(a, b) in rows {
            let tuple = Tuple::new(schema.clone(), vec![Field::Int(a), Field::Int(b)]).unwrap();
            self.pool.insert_tuple(tid, id, tuple).unwrap();
        }
        id
    }
}

pub fn int_pairs(rows: &[(i32, i32)]) -> TupleIterator {
    let schema = Arc::new(Schema::from_types(vec![Type::Int, Type::Int]).unwrap());
    let tuples = rows
        .iter()
        .map(|&(a, b)| Tuple::new(schema.clone(), vec![Field::Int(a), Field::Int(b)]).unwrap())
        .collect();
    TupleIterator::new(schema, tuples).unwrap()
}

pub fn drain(op: &mut dyn OpIterator) -> Vec<Tuple> {
    let mut out = Vec::new();
    while let Some(tuple) = op.next().unwrap() {
        out.push(tuple);
    }
    out
}

pub fn ints(tuples: &[Tuple]) -> Vec<Vec<i32>> {
    tuples
        .iter()
        .map(|t| t.fields().iter().map(|f| f.as_int().unwrap()).collect())
        .collect()
}

//! Table catalog.
//!
//! The catalog maps table identifiers to heap files, schemas and display
//! names. [`MemoryCatalog`] keeps everything in memory and is rebuilt by
//! the embedding application on startup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use minnow_common::error::{DbError, DbResult};
use minnow_common::types::{Schema, TableId};
use parking_lot::RwLock;
use tracing::debug;

use crate::file::HeapFile;

/// Resolves tables to their storage.
pub trait Catalog: fmt::Debug + Send + Sync {
    /// Returns the heap file backing `table_id`.
    fn file(&self, table_id: TableId) -> DbResult<Arc<HeapFile>>;

    /// Returns the schema of `table_id`.
    fn schema(&self, table_id: TableId) -> DbResult<Arc<Schema>> {
        Ok(self.file(table_id)?.schema().clone())
    }

    /// Returns the display name of `table_id`.
    fn table_name(&self, table_id: TableId) -> DbResult<String>;

    /// Looks a table up by name.
    fn table_id(&self, name: &str) -> DbResult<TableId>;

    /// Returns every registered table, in ascending id order.
    fn table_ids(&self) -> Vec<TableId>;
}

#[derive(Debug)]
struct CatalogEntry {
    file: Arc<HeapFile>,
    name: String,
}

/// In-memory catalog.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    tables: RwLock<HashMap<TableId, CatalogEntry>>,
    names: RwLock<HashMap<String, TableId>>,
}

impl MemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `file` under `name`.
    ///
    /// A table already registered under the same name or the same file is
    /// replaced.
    pub fn add_table(&self, file: Arc<HeapFile>, name: impl Into<String>) -> TableId {
        let name = name.into();
        let id = file.id();
        let mut tables = self.tables.write();
        let mut names = self.names.write();

        if let Some(old_id) = names.remove(&name) {
            tables.remove(&old_id);
        }
        if let Some(old) = tables.remove(&id) {
            names.remove(&old.name);
        }

        debug!(table = %id, name = %name, schema = %file.schema(), "registered table");
        names.insert(name.clone(), id);
        tables.insert(id, CatalogEntry { file, name });
        id
    }

    /// Returns the number of registered tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    /// Returns true if no table is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }
}

impl Catalog for MemoryCatalog {
    fn file(&self, table_id: TableId) -> DbResult<Arc<HeapFile>> {
        self.tables
            .read()
            .get(&table_id)
            .map(|entry| entry.file.clone())
            .ok_or(DbError::TableNotFound { table_id })
    }

    fn table_name(&self, table_id: TableId) -> DbResult<String> {
        self.tables
            .read()
            .get(&table_id)
            .map(|entry| entry.name.clone())
            .ok_or(DbError::TableNotFound { table_id })
    }

    fn table_id(&self, name: &str) -> DbResult<TableId> {
        self.names
            .read()
            .get(name)
            .copied()
            .ok_or_else(|| DbError::TableNameNotFound {
                name: name.to_owned(),
            })
    }

    fn table_ids(&self) -> Vec<TableId> {
        let mut ids: Vec<TableId> = self.tables.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minnow_common::types::Type;

    fn open(dir: &tempfile::TempDir, file: &str) -> Arc<HeapFile> {
        let schema = Arc::new(Schema::from_types(vec![Type::Int]).unwrap());
        Arc::new(HeapFile::open(dir.path().join(file), schema, 256).unwrap())
    }

    #[test]
    fn test_lookup_by_id_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = MemoryCatalog::new();
        let id = catalog.add_table(open(&dir, "a.dat"), "a");

        assert_eq!(catalog.table_id("a").unwrap(), id);
        assert_eq!(catalog.table_name(id).unwrap(), "a");
        assert_eq!(catalog.schema(id).unwrap().num_fields(), 1);
        assert_eq!(catalog.table_ids(), vec![id]);
    }

    #[test]
    fn test_missing_tables() {
        let catalog = MemoryCatalog::new();
        assert!(matches!(
            catalog.file(TableId::new(3)),
            Err(DbError::TableNotFound { .. })
        ));
        assert!(matches!(
            catalog.table_id("nope"),
            Err(DbError::TableNameNotFound { .. })
        ));
    }

    #[test]
    fn test_readding_name_replaces_table() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = MemoryCatalog::new();
        let first = catalog.add_table(open(&dir, "a.dat"), "t");
        let second = catalog.add_table(open(&dir, "b.dat"), "t");

        assert_ne!(first, second);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.table_id("t").unwrap(), second);
        assert!(catalog.file(first).is_err());
    }

    #[test]
    fn test_renaming_file() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = MemoryCatalog::new();
        let file = open(&dir, "a.dat");
        let id = catalog.add_table(file.clone(), "old");
        catalog.add_table(file, "new");

        assert_eq!(catalog.table_name(id).unwrap(), "new");
        assert!(catalog.table_id("old").is_err());
    }
}

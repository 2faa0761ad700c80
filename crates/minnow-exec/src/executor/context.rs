//! Execution context.
//!
//! Operators that touch storage receive an [`ExecContext`] holding the two
//! external collaborators of the executor: the catalog and the buffer
//! manager.

use std::fmt;
use std::sync::Arc;

use minnow_storage::{BufferManager, BufferPool, Catalog};

/// Shared handles to the catalog and buffer manager. Cheap to clone.
#[derive(Clone)]
pub struct ExecContext {
    catalog: Arc<dyn Catalog>,
    buffer_pool: Arc<dyn BufferManager>,
}

impl ExecContext {
    /// Creates a context from explicit collaborators.
    pub fn new(catalog: Arc<dyn Catalog>, buffer_pool: Arc<dyn BufferManager>) -> Self {
        Self {
            catalog,
            buffer_pool,
        }
    }

    /// Creates a context over the reference buffer pool and its catalog.
    pub fn from_pool(pool: Arc<BufferPool>) -> Self {
        Self::new(pool.catalog().clone(), pool)
    }

    /// Returns the catalog.
    #[inline]
    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Returns the buffer manager.
    #[inline]
    pub fn buffer_pool(&self) -> &Arc<dyn BufferManager> {
        &self.buffer_pool
    }
}

impl fmt::Debug for ExecContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecContext")
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

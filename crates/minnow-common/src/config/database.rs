//! Database configuration structures.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BUFFER_POOL_PAGES, DEFAULT_HISTOGRAM_BUCKETS, DEFAULT_IO_COST_PER_PAGE,
    DEFAULT_PAGE_SIZE, MIN_PAGE_SIZE,
};
use crate::error::{DbError, DbResult};

/// Top-level configuration.
///
/// # Example
///
/// ```rust
/// use minnow_common::config::DbConfig;
///
/// let config = DbConfig::default().with_page_size(1024);
/// assert_eq!(config.storage.page_size, 1024);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Heap file configuration.
    pub storage: StorageConfig,

    /// Buffer pool configuration.
    pub buffer_pool: BufferPoolConfig,

    /// Histogram and cost-model configuration.
    pub statistics: StatisticsConfig,
}

impl DbConfig {
    /// Creates a small configuration for tests: 512-byte pages and a
    /// buffer pool of 16 pages, so multi-page behavior shows up quickly.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            storage: StorageConfig { page_size: 512 },
            buffer_pool: BufferPoolConfig { num_pages: 16 },
            statistics: StatisticsConfig {
                histogram_buckets: 10,
                ..Default::default()
            },
        }
    }

    /// Sets the page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.storage.page_size = page_size;
        self
    }

    /// Sets the buffer pool capacity in pages.
    #[must_use]
    pub fn with_buffer_pool_pages(mut self, num_pages: usize) -> Self {
        self.buffer_pool.num_pages = num_pages;
        self
    }

    /// Sets the number of histogram buckets per column.
    #[must_use]
    pub fn with_histogram_buckets(mut self, buckets: usize) -> Self {
        self.statistics.histogram_buckets = buckets;
        self
    }

    /// Sets the cost charged per page read.
    #[must_use]
    pub fn with_io_cost_per_page(mut self, cost: f64) -> Self {
        self.statistics.io_cost_per_page = cost;
        self
    }

    /// Validates every section.
    pub fn validate(&self) -> DbResult<()> {
        self.storage.validate()?;
        self.buffer_pool.validate()?;
        self.statistics.validate()
    }
}

/// Heap file configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Size of each page in bytes.
    /// Default: 4096
    pub page_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl StorageConfig {
    /// Validates the page size.
    pub fn validate(&self) -> DbResult<()> {
        if self.page_size < MIN_PAGE_SIZE {
            return Err(DbError::configuration(format!(
                "page_size must be at least {MIN_PAGE_SIZE} bytes, got {}",
                self.page_size
            )));
        }
        Ok(())
    }
}

/// Reference buffer pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferPoolConfig {
    /// Maximum number of resident pages.
    /// Default: 50
    pub num_pages: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            num_pages: DEFAULT_BUFFER_POOL_PAGES,
        }
    }
}

impl BufferPoolConfig {
    /// Validates the capacity.
    pub fn validate(&self) -> DbResult<()> {
        if self.num_pages == 0 {
            return Err(DbError::configuration("buffer_pool.num_pages must be positive"));
        }
        Ok(())
    }
}

/// Table statistics configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Cost of reading one page in a sequential scan.
    /// Default: 1000.0
    pub io_cost_per_page: f64,

    /// Buckets per column histogram.
    /// Default: 100
    pub histogram_buckets: usize,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            io_cost_per_page: DEFAULT_IO_COST_PER_PAGE,
            histogram_buckets: DEFAULT_HISTOGRAM_BUCKETS,
        }
    }
}

impl StatisticsConfig {
    /// Validates bucket count and I/O cost.
    pub fn validate(&self) -> DbResult<()> {
        if self.histogram_buckets == 0 {
            return Err(DbError::configuration(
                "statistics.histogram_buckets must be positive",
            ));
        }
        if !self.io_cost_per_page.is_finite() || self.io_cost_per_page < 0.0 {
            return Err(DbError::configuration(format!(
                "statistics.io_cost_per_page must be a non-negative number, got {}",
                self.io_cost_per_page
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults() {
        let config = DbConfig::default();
        assert_eq!(config.storage.page_size, 4096);
        assert_eq!(config.buffer_pool.num_pages, 50);
        assert_eq!(config.statistics.io_cost_per_page, 1000.0);
        assert_eq!(config.statistics.histogram_buckets, 100);
        assert!(config.validate().is_ok());
        assert!(DbConfig::for_testing().validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let err = DbConfig::default().with_page_size(8).validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        assert!(DbConfig::default().with_buffer_pool_pages(0).validate().is_err());
        assert!(DbConfig::default().with_histogram_buckets(0).validate().is_err());
        assert!(DbConfig::default().with_io_cost_per_page(-1.0).validate().is_err());
    }

    #[test]
    fn test_partial_json() {
        let config: DbConfig =
            serde_json::from_str(r#"{"storage":{"page_size":1024}}"#).unwrap();
        assert_eq!(config.storage.page_size, 1024);
        assert_eq!(config.buffer_pool, BufferPoolConfig::default());
    }
}

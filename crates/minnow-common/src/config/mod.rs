//! Configuration for MinnowDB.
//!
//! This module provides configuration structures for the storage engine,
//! the reference buffer pool and the statistics estimator.

mod database;

pub use database::{BufferPoolConfig, DbConfig, StatisticsConfig, StorageConfig};

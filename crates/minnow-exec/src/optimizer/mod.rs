//! Cost-estimation inputs for a query optimizer.
//!
//! [`TableStats`] holds one histogram per column plus the numbers needed
//! to price a sequential scan. [`StatsRegistry`] caches them by table
//! name until they are explicitly recomputed.

mod histogram;
mod stats;

pub use histogram::{IntHistogram, StringHistogram};
pub use stats::{ColumnHistogram, StatsRegistry, TableStats};

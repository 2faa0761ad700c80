//! # minnow-exec
//!
//! Query operators and table statistics for MinnowDB.
//!
//! This crate implements:
//! - Sequential scan, selection, insert, delete and grouped aggregation
//!   over the Volcano iterator protocol
//! - Join predicates for an external join operator
//! - Equal-width histograms and per-table statistics for cost estimation

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Query operators
pub mod executor;

/// Histograms and table statistics
pub mod optimizer;

#[cfg(test)]
mod testing;

pub use executor::{
    Aggregate, AggregateOp, Aggregator, Delete, ExecContext, Filter, Insert, IntegerAggregator,
    JoinPredicate, Predicate, SeqScan, StringAggregator,
};
pub use optimizer::{IntHistogram, StatsRegistry, StringHistogram, TableStats};

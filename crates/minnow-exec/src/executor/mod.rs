//! Query operators.
//!
//! Every operator implements [`OpIterator`](minnow_common::OpIterator) and
//! pulls tuples one at a time from its children:
//!
//! ```text
//!              Aggregate
//!                  │
//!               Filter ── Predicate
//!                  │
//!              SeqScan ── HeapFile via BufferManager
//! ```
//!
//! Operators are built unopened, opened by the caller, and closed when
//! the caller is done. [`Insert`] and [`Delete`] route their writes
//! through the buffer manager held in the [`ExecContext`].

mod aggregate;
mod aggregator;
mod context;
mod filter;
mod join;
mod mutation;
mod scan;

pub use aggregate::Aggregate;
pub use aggregator::{AggregateOp, AggregateResults, Aggregator, IntegerAggregator, StringAggregator};
pub use context::ExecContext;
pub use filter::{Filter, Predicate};
pub use join::JoinPredicate;
pub use mutation::{Delete, Insert};
pub use scan::SeqScan;

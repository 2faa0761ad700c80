//! Per-table statistics and the registry that caches them.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use minnow_common::config::StatisticsConfig;
use minnow_common::error::{DbError, DbResult};
use minnow_common::iterator::OpIterator;
use minnow_common::types::{CompareOp, Field, TableId, TransactionId, Type};
use parking_lot::RwLock;
use tracing::{debug, info};

use super::histogram::{IntHistogram, StringHistogram};
use crate::executor::{ExecContext, SeqScan};

/// Histogram of one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnHistogram {
    /// Integer column.
    Int(IntHistogram),
    /// Text column.
    Text(StringHistogram),
}

impl ColumnHistogram {
    fn column_type(&self) -> Type {
        match self {
            Self::Int(_) => Type::Int,
            Self::Text(_) => Type::Text,
        }
    }

    fn add(&mut self, field: &Field) {
        match (self, field) {
            (Self::Int(h), Field::Int(v)) => h.add_value(*v),
            (Self::Text(h), Field::Text(s)) => h.add_value(s),
            _ => {}
        }
    }

    fn avg_selectivity(&self) -> f64 {
        match self {
            Self::Int(h) => h.avg_selectivity(),
            Self::Text(h) => h.avg_selectivity(),
        }
    }
}

/// Tuple count, histograms, and cost inputs of one table.
#[derive(Debug, Clone)]
pub struct TableStats {
    table_id: TableId,
    io_cost_per_page: f64,
    page_size: usize,
    row_size: usize,
    tuple_count: usize,
    histograms: Vec<ColumnHistogram>,
}

impl TableStats {
    /// Scans `table_id` twice: once for the tuple count and integer
    /// column bounds, once more to fill one histogram per column.
    pub fn compute(
        ctx: &ExecContext,
        table_id: TableId,
        io_cost_per_page: f64,
        buckets: usize,
    ) -> DbResult<Self> {
        let file = ctx.catalog().file(table_id)?;
        let schema = file.schema().clone();
        let mut scan = SeqScan::with_table_name(ctx.clone(), TransactionId::next(), table_id)?;
        scan.open()?;

        let mut tuple_count = 0usize;
        let mut bounds: Vec<Option<(i32, i32)>> = vec![None; schema.num_fields()];
        while let Some(tuple) = scan.next()? {
            tuple_count += 1;
            for (bound, field) in bounds.iter_mut().zip(tuple.fields()) {
                if let Field::Int(v) = *field {
                    *bound = Some(match *bound {
                        Some((lo, hi)) => (lo.min(v), hi.max(v)),
                        None => (v, v),
                    });
                }
            }
        }

        let mut histograms = schema
            .types()
            .zip(&bounds)
            .map(|(ty, bound)| {
                Ok(match ty {
                    Type::Int => {
                        let (lo, hi) = bound.unwrap_or((0, 0));
                        ColumnHistogram::Int(IntHistogram::new(buckets, lo, hi)?)
                    }
                    Type::Text => ColumnHistogram::Text(StringHistogram::new(buckets)?),
                })
            })
            .collect::<DbResult<Vec<_>>>()?;

        scan.rewind()?;
        while let Some(tuple) = scan.next()? {
            for (histogram, field) in histograms.iter_mut().zip(tuple.fields()) {
                histogram.add(field);
            }
        }
        scan.close();

        info!(
            table = scan.table_name(),
            tuples = tuple_count,
            columns = histograms.len(),
            "table statistics computed"
        );

        Ok(Self {
            table_id,
            io_cost_per_page,
            page_size: file.page_size(),
            row_size: schema.size(),
            tuple_count,
            histograms,
        })
    }

    /// Returns the table these statistics describe.
    #[must_use]
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Cost of a full sequential scan: I/O cost per page times the number
    /// of pages the tuples occupy.
    #[must_use]
    pub fn estimate_scan_cost(&self) -> f64 {
        let bytes = (self.tuple_count * self.row_size) as f64;
        let pages = (bytes / self.page_size as f64).ceil();
        self.io_cost_per_page * pages
    }

    /// Number of tuples expected after applying a predicate of the given
    /// selectivity.
    #[must_use]
    pub fn estimate_table_cardinality(&self, selectivity: f64) -> usize {
        (self.tuple_count as f64 * selectivity).round() as usize
    }

    /// Estimated selectivity of `column[field] op constant`.
    pub fn estimate_selectivity(&self, field: usize, op: CompareOp, constant: &Field) -> DbResult<f64> {
        let histogram = self.histogram(field)?;
        match (histogram, constant) {
            (ColumnHistogram::Int(h), Field::Int(v)) => Ok(h.estimate_selectivity(op, *v)),
            (ColumnHistogram::Text(h), Field::Text(s)) => Ok(h.estimate_selectivity(op, s)),
            _ => Err(DbError::TypeMismatch {
                index: field,
                expected: histogram.column_type(),
                actual: constant.field_type(),
            }),
        }
    }

    /// Expected selectivity of `column[field] op x` for an unknown `x`
    /// drawn from the column itself.
    pub fn avg_selectivity(&self, field: usize, op: CompareOp) -> DbResult<f64> {
        let eq = self.histogram(field)?.avg_selectivity();
        Ok(match op {
            CompareOp::Equals => eq,
            CompareOp::NotEquals => 1.0 - eq,
            CompareOp::LessThan | CompareOp::GreaterThan => (1.0 - eq) / 2.0,
            CompareOp::LessThanOrEq | CompareOp::GreaterThanOrEq => (1.0 + eq) / 2.0,
        })
    }

    /// Returns the number of tuples seen by the last computation.
    #[must_use]
    pub fn total_tuples(&self) -> usize {
        self.tuple_count
    }

    /// Returns the histogram of one column.
    pub fn histogram(&self, field: usize) -> DbResult<&ColumnHistogram> {
        self.histograms.get(field).ok_or(DbError::InvalidFieldIndex {
            index: field,
            len: self.histograms.len(),
        })
    }
}

/// Statistics cache keyed by table name.
///
/// Entries change only through explicit calls; mutating a table does not
/// refresh its statistics.
#[derive(Debug, Default)]
pub struct StatsRegistry {
    tables: RwLock<HashMap<String, Arc<TableStats>>>,
}

impl StatsRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide registry.
    pub fn global() -> &'static StatsRegistry {
        static GLOBAL: OnceLock<StatsRegistry> = OnceLock::new();
        GLOBAL.get_or_init(StatsRegistry::new)
    }

    /// Returns the statistics of `table`, if present.
    pub fn get(&self, table: &str) -> Option<Arc<TableStats>> {
        self.tables.read().get(table).cloned()
    }

    /// Stores statistics for `table`, returning what was there before.
    pub fn set(&self, table: impl Into<String>, stats: TableStats) -> Option<Arc<TableStats>> {
        self.tables.write().insert(table.into(), Arc::new(stats))
    }

    /// Removes the statistics of `table`.
    pub fn remove(&self, table: &str) -> Option<Arc<TableStats>> {
        self.tables.write().remove(table)
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.tables.write().clear();
    }

    /// Replaces the whole map.
    pub fn replace_all(&self, tables: HashMap<String, TableStats>) {
        let tables = tables
            .into_iter()
            .map(|(name, stats)| (name, Arc::new(stats)))
            .collect();
        *self.tables.write() = tables;
    }

    /// Returns a copy of the current map.
    pub fn snapshot(&self) -> HashMap<String, Arc<TableStats>> {
        self.tables.read().clone()
    }

    /// Returns the number of tables with statistics.
    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    /// Returns true if no statistics are stored.
    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }

    /// Computes statistics for every catalog table and stores them.
    ///
    /// Returns the number of tables processed. The first failing table
    /// aborts the run; tables computed before it keep their new entries.
    pub fn compute_all(&self, ctx: &ExecContext, config: &StatisticsConfig) -> DbResult<usize> {
        config.validate()?;
        let catalog = ctx.catalog();
        let mut computed = 0;
        for table_id in catalog.table_ids() {
            let name = catalog.table_name(table_id)?;
            let stats = TableStats::compute(
                ctx,
                table_id,
                config.io_cost_per_page,
                config.histogram_buckets,
            )?;
            debug!(table = %name, tuples = stats.total_tuples(), "statistics stored");
            self.set(name, stats);
            computed += 1;
        }
        info!(tables = computed, "statistics refreshed");
        Ok(computed)
    }
}

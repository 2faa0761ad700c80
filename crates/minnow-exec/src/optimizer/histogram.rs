//! Fixed-width histograms for selectivity estimation.
//!
//! An [`IntHistogram`] splits `[min, max]` into `B` equal-width buckets of
//! real-valued width `(max - min + 1) / B` and counts observations per
//! bucket. Space is `O(B)` no matter how many values are added. Values
//! are assumed uniformly spread inside a bucket.
//!
//! Queries outside the domain never fail; they are clamped to the obvious
//! answer (nothing is below `min`, everything is below something past
//! `max`).

use std::fmt;

use minnow_common::error::{DbError, DbResult};
use minnow_common::types::CompareOp;

/// Equal-width histogram over an integer column.
#[derive(Debug, Clone, PartialEq)]
pub struct IntHistogram {
    buckets: Vec<u64>,
    min: i32,
    max: i32,
    width: f64,
    total: u64,
}

impl IntHistogram {
    /// Creates an empty histogram of `buckets` buckets over `[min, max]`.
    pub fn new(buckets: usize, min: i32, max: i32) -> DbResult<Self> {
        if buckets == 0 {
            return Err(DbError::configuration("histogram needs at least one bucket"));
        }
        if min > max {
            return Err(DbError::configuration(format!(
                "histogram domain [{min}, {max}] is empty"
            )));
        }
        let span = i64::from(max) - i64::from(min) + 1;
        Ok(Self {
            buckets: vec![0; buckets],
            min,
            max,
            width: span as f64 / buckets as f64,
            total: 0,
        })
    }

    /// Returns the number of buckets.
    #[must_use]
    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the lower domain bound.
    #[must_use]
    pub fn min(&self) -> i32 {
        self.min
    }

    /// Returns the upper domain bound.
    #[must_use]
    pub fn max(&self) -> i32 {
        self.max
    }

    /// Returns the number of values added.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Returns the per-bucket counts.
    #[must_use]
    pub fn bucket_counts(&self) -> &[u64] {
        &self.buckets
    }

    /// Bucket of an in-domain value.
    fn bucket_of(&self, v: i32) -> usize {
        let offset = (i64::from(v) - i64::from(self.min)) as f64;
        let index = (offset / self.width).floor() as usize;
        index.min(self.buckets.len() - 1)
    }

    /// Records one value. Values outside `[min, max]` are ignored.
    pub fn add_value(&mut self, v: i32) {
        if v < self.min || v > self.max {
            return;
        }
        let index = self.bucket_of(v);
        self.buckets[index] += 1;
        self.total += 1;
    }

    /// Estimates the fraction of added values `x` with `x op v`.
    #[must_use]
    pub fn estimate_selectivity(&self, op: CompareOp, v: i32) -> f64 {
        if self.total == 0 {
            return match op {
                CompareOp::NotEquals => 1.0,
                _ => 0.0,
            };
        }

        if v < self.min || v > self.max {
            let below = v < self.min;
            return match op {
                CompareOp::Equals => 0.0,
                CompareOp::NotEquals => 1.0,
                CompareOp::LessThan | CompareOp::LessThanOrEq => {
                    if below {
                        0.0
                    } else {
                        1.0
                    }
                }
                CompareOp::GreaterThan | CompareOp::GreaterThanOrEq => {
                    if below {
                        1.0
                    } else {
                        0.0
                    }
                }
            };
        }

        let index = self.bucket_of(v);
        let total = self.total as f64;
        let below = self.buckets[..index].iter().sum::<u64>() as f64 / total;
        let eq = self.buckets[index] as f64 / total;
        match op {
            CompareOp::Equals => eq,
            CompareOp::NotEquals => 1.0 - eq,
            CompareOp::LessThan => below,
            CompareOp::LessThanOrEq => below + eq,
            CompareOp::GreaterThan => 1.0 - (below + eq),
            CompareOp::GreaterThanOrEq => 1.0 - below,
        }
    }

    /// Expected selectivity of an equality predicate against a value drawn
    /// from the same distribution, `Σ (countᵢ / total)²`.
    #[must_use]
    pub fn avg_selectivity(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let total = self.total as f64;
        self.buckets
            .iter()
            .map(|&c| {
                let p = c as f64 / total;
                p * p
            })
            .sum()
    }
}

impl fmt::Display for IntHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IntHistogram[{}..={}, width {:.2}, total {}]:",
            self.min, self.max, self.width, self.total
        )?;
        for (i, count) in self.buckets.iter().enumerate() {
            let lo = f64::from(self.min) + i as f64 * self.width;
            write!(f, " [{lo:.1}: {count}]")?;
        }
        Ok(())
    }
}

/// Histogram over a text column.
///
/// Strings are mapped to integers from their first four bytes, so only the
/// prefix order is preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct StringHistogram {
    inner: IntHistogram,
}

impl StringHistogram {
    /// Creates an empty histogram of `buckets` buckets.
    pub fn new(buckets: usize) -> DbResult<Self> {
        Ok(Self {
            inner: IntHistogram::new(buckets, Self::min_code(), Self::max_code())?,
        })
    }

    fn min_code() -> i32 {
        encode("")
    }

    fn max_code() -> i32 {
        encode("zzzz")
    }

    fn code(s: &str) -> i32 {
        encode(s).clamp(Self::min_code(), Self::max_code())
    }

    /// Records one value.
    pub fn add_value(&mut self, s: &str) {
        self.inner.add_value(Self::code(s));
    }

    /// Estimates the fraction of added values `x` with `x op s`.
    #[must_use]
    pub fn estimate_selectivity(&self, op: CompareOp, s: &str) -> f64 {
        self.inner.estimate_selectivity(op, Self::code(s))
    }

    /// Expected equality selectivity.
    #[must_use]
    pub fn avg_selectivity(&self) -> f64 {
        self.inner.avg_selectivity()
    }

    /// Returns the number of values added.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.inner.total()
    }
}

impl fmt::Display for StringHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StringHistogram({})", self.inner)
    }
}

/// Big-endian base-256 code of the first four bytes, zero padded, halved
/// so every byte value keeps its order in the non-negative `i32` range.
fn encode(s: &str) -> i32 {
    let mut code = [0u8; 4];
    for (slot, byte) in code.iter_mut().zip(s.bytes()) {
        *slot = byte;
    }
    (u32::from_be_bytes(code) >> 1) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn test_single_value_bucket() {
        let mut h = IntHistogram::new(10, 1, 100).unwrap();
        for _ in 0..5 {
            h.add_value(50);
        }
        assert!(close(h.estimate_selectivity(CompareOp::Equals, 50), 1.0));
        assert!(close(h.estimate_selectivity(CompareOp::NotEquals, 50), 0.0));
        assert!(close(h.estimate_selectivity(CompareOp::GreaterThan, 1000), 0.0));
        assert!(close(h.estimate_selectivity(CompareOp::LessThan, -5), 0.0));
    }

    #[test]
    fn test_out_of_range_clamping() {
        let mut h = IntHistogram::new(10, 1, 100).unwrap();
        for v in 1..=100 {
            h.add_value(v);
        }
        let cases = [
            (CompareOp::Equals, -5, 0.0),
            (CompareOp::Equals, 500, 0.0),
            (CompareOp::NotEquals, 500, 1.0),
            (CompareOp::LessThan, 500, 1.0),
            (CompareOp::LessThanOrEq, -5, 0.0),
            (CompareOp::GreaterThan, -5, 1.0),
            (CompareOp::GreaterThanOrEq, 500, 0.0),
        ];
        for (op, v, expected) in cases {
            assert!(close(h.estimate_selectivity(op, v), expected), "{op} {v}");
        }
    }

    #[test]
    fn test_uniform_estimates() {
        let mut h = IntHistogram::new(10, 1, 100).unwrap();
        for v in 1..=100 {
            h.add_value(v);
        }
        // 55 falls in the sixth bucket, [51, 60]
        assert!(close(h.estimate_selectivity(CompareOp::Equals, 55), 0.1));
        assert!(close(h.estimate_selectivity(CompareOp::LessThan, 55), 0.5));
        assert!(close(h.estimate_selectivity(CompareOp::LessThanOrEq, 55), 0.6));
        assert!(close(h.estimate_selectivity(CompareOp::GreaterThan, 55), 0.4));
        assert!(close(h.estimate_selectivity(CompareOp::GreaterThanOrEq, 55), 0.5));
        assert!(close(h.avg_selectivity(), 0.1));
    }

    #[test]
    fn test_lt_and_ge_are_complements() {
        let mut h = IntHistogram::new(7, -20, 33).unwrap();
        for v in [-20, -3, 0, 0, 4, 17, 17, 17, 29, 33] {
            h.add_value(v);
        }
        for v in -25..40 {
            let lt = h.estimate_selectivity(CompareOp::LessThan, v);
            let ge = h.estimate_selectivity(CompareOp::GreaterThanOrEq, v);
            assert!(close(lt + ge, 1.0), "{v}");
            let eq = h.estimate_selectivity(CompareOp::Equals, v);
            let ne = h.estimate_selectivity(CompareOp::NotEquals, v);
            assert!(close(eq + ne, 1.0), "{v}");
        }
    }

    #[test]
    fn test_counts_sum_to_total() {
        let mut h = IntHistogram::new(3, 0, 9).unwrap();
        for v in [-1, 0, 3, 9, 10, 5] {
            h.add_value(v);
        }
        assert_eq!(h.total(), 4);
        assert_eq!(h.bucket_counts().iter().sum::<u64>(), 4);
    }

    #[test]
    fn test_more_buckets_than_values() {
        let mut h = IntHistogram::new(10, 1, 3).unwrap();
        for v in 1..=3 {
            h.add_value(v);
        }
        assert_eq!(h.bucket_counts().iter().filter(|&&c| c > 0).count(), 3);
        assert!(close(h.estimate_selectivity(CompareOp::Equals, 3), 1.0 / 3.0));
    }

    #[test]
    fn test_empty_histogram() {
        let h = IntHistogram::new(4, 0, 10).unwrap();
        assert!(close(h.estimate_selectivity(CompareOp::Equals, 3), 0.0));
        assert!(close(h.estimate_selectivity(CompareOp::NotEquals, 3), 1.0));
        assert!(close(h.avg_selectivity(), 0.0));
    }

    #[test]
    fn test_invalid_construction() {
        assert!(IntHistogram::new(0, 0, 10).is_err());
        assert!(IntHistogram::new(4, 10, 0).is_err());
        assert!(IntHistogram::new(4, i32::MIN, i32::MAX).is_ok());
    }

    #[test]
    fn test_string_histogram_ordering() {
        let mut h = StringHistogram::new(100).unwrap();
        for s in ["apple", "banana", "cherry", "melon", "zebra"] {
            h.add_value(s);
        }
        assert_eq!(h.total(), 5);
        let below_m = h.estimate_selectivity(CompareOp::LessThan, "m");
        let below_d = h.estimate_selectivity(CompareOp::LessThan, "d");
        assert!(below_d <= below_m);
        assert!(close(below_m, 0.6));
        assert!(close(h.estimate_selectivity(CompareOp::GreaterThan, "zzzzz"), 0.0));
    }

    #[test]
    fn test_encode_prefix() {
        assert_eq!(encode(""), 0);
        assert_eq!(encode("a"), 0x3080_0000);
        assert_eq!(encode("abcdef"), encode("abcd"));
        assert!(encode("ab") < encode("b"));
        assert!(encode("zzzz") < encode("\u{e9}t\u{e9}"));
        assert!(encode("\u{ff}") > 0);
    }

    #[test]
    fn test_non_ascii_sorts_after_ascii() {
        let mut h = StringHistogram::new(100).unwrap();
        h.add_value("apple");
        h.add_value("\u{e9}t\u{e9}");
        assert!(close(h.estimate_selectivity(CompareOp::LessThan, "a"), 0.0));
        assert!(close(h.estimate_selectivity(CompareOp::LessThan, "b"), 0.5));
        assert!(close(h.estimate_selectivity(CompareOp::LessThan, "zz"), 0.5));
    }

    #[test]
    fn test_display() {
        let h = IntHistogram::new(2, 0, 3).unwrap();
        assert!(h.to_string().starts_with("IntHistogram[0..=3"));
    }
}

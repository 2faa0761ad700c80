//! Join predicate evaluation.
//!
//! The join operator itself lives outside this crate; it calls
//! [`JoinPredicate::filter`] for every candidate pair.

use std::fmt;

use minnow_common::error::DbResult;
use minnow_common::types::{CompareOp, Tuple};

/// Compares a field of a left tuple with a field of a right tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinPredicate {
    left_field: usize,
    op: CompareOp,
    right_field: usize,
}

impl JoinPredicate {
    /// Creates `left[left_field] op right[right_field]`.
    pub fn new(left_field: usize, op: CompareOp, right_field: usize) -> Self {
        Self {
            left_field,
            op,
            right_field,
        }
    }

    /// Returns the left field index.
    #[must_use]
    pub fn left_field(&self) -> usize {
        self.left_field
    }

    /// Returns the comparison operator.
    #[must_use]
    pub fn op(&self) -> CompareOp {
        self.op
    }

    /// Returns the right field index.
    #[must_use]
    pub fn right_field(&self) -> usize {
        self.right_field
    }

    /// Evaluates the predicate for one pair of tuples.
    pub fn filter(&self, left: &Tuple, right: &Tuple) -> DbResult<bool> {
        let l = left.field(self.left_field)?;
        let r = right.field(self.right_field)?;
        Ok(l.compare(self.op, r))
    }
}

impl fmt::Display for JoinPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "left.${} {} right.${}", self.left_field, self.op, self.right_field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minnow_common::error::DbError;
    use minnow_common::types::{Field, Schema, Type};
    use std::sync::Arc;

    fn tuple(values: &[i32]) -> Tuple {
        let schema = Arc::new(Schema::from_types(vec![Type::Int; values.len()]).unwrap());
        Tuple::new(schema, values.iter().map(|&v| Field::Int(v)).collect()).unwrap()
    }

    #[test]
    fn test_equality_join() {
        let p = JoinPredicate::new(1, CompareOp::Equals, 0);
        assert!(p.filter(&tuple(&[9, 4]), &tuple(&[4, 0, 0])).unwrap());
        assert!(!p.filter(&tuple(&[9, 4]), &tuple(&[5, 0, 0])).unwrap());
    }

    #[test]
    fn test_range_joins() {
        let l = tuple(&[3]);
        let r = tuple(&[7]);
        assert!(JoinPredicate::new(0, CompareOp::LessThan, 0).filter(&l, &r).unwrap());
        assert!(JoinPredicate::new(0, CompareOp::LessThanOrEq, 0).filter(&l, &l).unwrap());
        assert!(!JoinPredicate::new(0, CompareOp::GreaterThan, 0).filter(&l, &r).unwrap());
        assert!(JoinPredicate::new(0, CompareOp::GreaterThanOrEq, 0).filter(&r, &l).unwrap());
    }

    #[test]
    fn test_bad_index() {
        let p = JoinPredicate::new(0, CompareOp::Equals, 3);
        let err = p.filter(&tuple(&[1]), &tuple(&[1])).unwrap_err();
        assert!(matches!(err, DbError::InvalidFieldIndex { index: 3, .. }));
    }

    #[test]
    fn test_display() {
        let p = JoinPredicate::new(0, CompareOp::GreaterThan, 2);
        assert_eq!(p.to_string(), "left.$0 > right.$2");
    }
}

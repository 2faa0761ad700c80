//! Selection.

use std::fmt;
use std::sync::Arc;

use minnow_common::error::{DbError, DbResult};
use minnow_common::iterator::{Cursor, OpIterator, TupleSource};
use minnow_common::types::{CompareOp, Field, Schema, Tuple};

/// Compares one field of a tuple against a constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    field: usize,
    op: CompareOp,
    operand: Field,
}

impl Predicate {
    /// Creates the predicate `tuple[field] op operand`.
    pub fn new(field: usize, op: CompareOp, operand: Field) -> Self {
        Self { field, op, operand }
    }

    /// Returns the index of the compared field.
    #[must_use]
    pub fn field(&self) -> usize {
        self.field
    }

    /// Returns the comparison operator.
    #[must_use]
    pub fn op(&self) -> CompareOp {
        self.op
    }

    /// Returns the constant operand.
    #[must_use]
    pub fn operand(&self) -> &Field {
        &self.operand
    }

    /// Evaluates the predicate against `tuple`.
    pub fn filter(&self, tuple: &Tuple) -> DbResult<bool> {
        Ok(tuple.field(self.field)?.compare(self.op, &self.operand))
    }

    fn validate(&self, schema: &Schema) -> DbResult<()> {
        let expected = schema.field_type(self.field)?;
        if expected != self.operand.field_type() {
            return Err(DbError::TypeMismatch {
                index: self.field,
                expected,
                actual: self.operand.field_type(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${} {} {}", self.field, self.op, self.operand)
    }
}

/// Passes through the child tuples that satisfy a predicate.
///
/// Order and schema are the child's; nothing is buffered.
pub struct Filter {
    predicate: Predicate,
    child: Box<dyn OpIterator>,
    cursor: Cursor,
}

impl Filter {
    /// Creates a filter over an unopened `child`.
    ///
    /// Fails if the predicate's field is out of range or its operand has a
    /// different type than that field.
    pub fn new(predicate: Predicate, child: Box<dyn OpIterator>) -> DbResult<Self> {
        predicate.validate(child.schema())?;
        Ok(Self {
            predicate,
            child,
            cursor: Cursor::new(),
        })
    }

    /// Returns the predicate.
    #[must_use]
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }
}

impl TupleSource for Filter {
    fn source_schema(&self) -> &Arc<Schema> {
        self.child.schema()
    }

    fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    fn open_source(&mut self) -> DbResult<()> {
        self.child.open()
    }

    fn fetch_next(&mut self) -> DbResult<Option<Tuple>> {
        while let Some(tuple) = self.child.next()? {
            if self.predicate.filter(&tuple)? {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }

    fn rewind_source(&mut self) -> DbResult<()> {
        self.child.rewind()
    }

    fn close_source(&mut self) {
        self.child.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{drain, int_pairs, ints};

    fn filter(op: CompareOp, v: i32) -> Filter {
        let child = int_pairs(&[(5, 0), (1, 1), (3, 2), (5, 3), (2, 4)]);
        Filter::new(Predicate::new(0, op, Field::Int(v)), Box::new(child)).unwrap()
    }

    #[test]
    fn test_preserves_child_order() {
        let mut f = filter(CompareOp::GreaterThanOrEq, 3);
        f.open().unwrap();
        assert_eq!(ints(&drain(&mut f)), vec![vec![5, 0], vec![3, 2], vec![5, 3]]);
    }

    #[test]
    fn test_each_operator() {
        // first column is 5, 1, 3, 5, 2
        let cases = [
            (CompareOp::Equals, 2),
            (CompareOp::NotEquals, 3),
            (CompareOp::LessThan, 3),
            (CompareOp::LessThanOrEq, 5),
            (CompareOp::GreaterThan, 0),
            (CompareOp::GreaterThanOrEq, 2),
        ];
        for (op, expected) in cases {
            let mut f = filter(op, 5);
            f.open().unwrap();
            assert_eq!(drain(&mut f).len(), expected, "{op}");
        }
    }

    #[test]
    fn test_rewind_replays_same_tuples() {
        let mut f = filter(CompareOp::Equals, 5);
        f.open().unwrap();
        let first = drain(&mut f);
        f.rewind().unwrap();
        assert_eq!(drain(&mut f), first);
    }

    #[test]
    fn test_schema_is_child_schema() {
        let f = filter(CompareOp::Equals, 1);
        assert_eq!(f.schema().num_fields(), 2);
    }

    #[test]
    fn test_constructor_validation() {
        let err = Filter::new(
            Predicate::new(2, CompareOp::Equals, Field::Int(1)),
            Box::new(int_pairs(&[])),
        )
        .err()
        .unwrap();
        assert!(matches!(err, DbError::InvalidFieldIndex { .. }));

        let err = Filter::new(
            Predicate::new(0, CompareOp::Equals, Field::text("1")),
            Box::new(int_pairs(&[])),
        )
        .err()
        .unwrap();
        assert!(matches!(err, DbError::TypeMismatch { .. }));
    }

    #[test]
    fn test_display() {
        let p = Predicate::new(1, CompareOp::LessThanOrEq, Field::Int(7));
        assert_eq!(p.to_string(), "$1 <= 7");
    }
}

//! Typed field values.
//!
//! A [`Field`] is an immutable scalar conforming to exactly one schema slot's
//! [`Type`]. Both types serialize to a fixed width so that tuples of a given
//! schema always occupy the same number of bytes on a page.
//!
//! # Encoding
//!
//! ```text
//! Int:  [i32 big-endian]                          4 bytes
//! Text: [len: u32 big-endian][STRING_LEN bytes]   132 bytes, zero padded
//! ```

use std::cmp::Ordering;
use std::fmt;

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::constants::{INT_FIELD_WIDTH, STRING_LEN, TEXT_FIELD_WIDTH};
use crate::error::{DbError, DbResult};
use crate::types::HeapPageId;

/// Field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// 32-bit signed integer.
    Int,
    /// Fixed-length text.
    Text,
}

impl Type {
    /// Returns the serialized width of a value of this type in bytes.
    #[inline]
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Type::Int => INT_FIELD_WIDTH,
            Type::Text => TEXT_FIELD_WIDTH,
        }
    }

    /// Reads one value of this type from `buf`.
    ///
    /// `page_id` is only used to attribute decode failures.
    pub fn parse(self, buf: &mut impl Buf, page_id: HeapPageId) -> DbResult<Field> {
        if buf.remaining() < self.width() {
            return Err(DbError::corrupted(
                page_id,
                format!("need {} bytes for {}, have {}", self.width(), self, buf.remaining()),
            ));
        }
        match self {
            Type::Int => Ok(Field::Int(buf.get_i32())),
            Type::Text => {
                let len = buf.get_u32() as usize;
                if len > STRING_LEN {
                    return Err(DbError::corrupted(
                        page_id,
                        format!("text length {len} exceeds {STRING_LEN}"),
                    ));
                }
                let mut raw = [0u8; STRING_LEN];
                buf.copy_to_slice(&mut raw);
                let text = std::str::from_utf8(&raw[..len])
                    .map_err(|e| DbError::corrupted(page_id, format!("invalid utf-8 text: {e}")))?;
                Ok(Field::Text(text.to_owned()))
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("INT"),
            Type::Text => f.write_str("TEXT"),
        }
    }
}

/// Comparison operator used by predicates and selectivity estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    /// `=`
    Equals,
    /// `<>`
    NotEquals,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEq,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEq,
}

impl CompareOp {
    /// All operators, in declaration order.
    pub const ALL: [CompareOp; 6] = [
        CompareOp::Equals,
        CompareOp::NotEquals,
        CompareOp::LessThan,
        CompareOp::LessThanOrEq,
        CompareOp::GreaterThan,
        CompareOp::GreaterThanOrEq,
    ];

    /// Returns true if `ordering` (left compared to right) satisfies this operator.
    #[inline]
    #[must_use]
    pub const fn matches(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Equals => matches!(ordering, Ordering::Equal),
            CompareOp::NotEquals => !matches!(ordering, Ordering::Equal),
            CompareOp::LessThan => matches!(ordering, Ordering::Less),
            CompareOp::LessThanOrEq => !matches!(ordering, Ordering::Greater),
            CompareOp::GreaterThan => matches!(ordering, Ordering::Greater),
            CompareOp::GreaterThanOrEq => !matches!(ordering, Ordering::Less),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOp::Equals => "=",
            CompareOp::NotEquals => "<>",
            CompareOp::LessThan => "<",
            CompareOp::LessThanOrEq => "<=",
            CompareOp::GreaterThan => ">",
            CompareOp::GreaterThanOrEq => ">=",
        };
        f.write_str(symbol)
    }
}

/// A typed, immutable field value.
///
/// `Field` implements `Eq` and `Hash`, so it doubles as the canonical key
/// for grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    /// Integer value.
    Int(i32),
    /// Text value, at most `STRING_LEN` bytes.
    Text(String),
}

impl Field {
    /// Creates a text value, truncating it to `STRING_LEN` bytes on a
    /// character boundary.
    pub fn text(value: impl Into<String>) -> Self {
        let mut value = value.into();
        if value.len() > STRING_LEN {
            let mut cut = STRING_LEN;
            while !value.is_char_boundary(cut) {
                cut -= 1;
            }
            value.truncate(cut);
        }
        Field::Text(value)
    }

    /// Returns the type of this value.
    #[inline]
    #[must_use]
    pub const fn field_type(&self) -> Type {
        match self {
            Field::Int(_) => Type::Int,
            Field::Text(_) => Type::Text,
        }
    }

    /// Returns the integer payload, if this is an integer.
    #[inline]
    #[must_use]
    pub const fn as_int(&self) -> Option<i32> {
        match self {
            Field::Int(v) => Some(*v),
            Field::Text(_) => None,
        }
    }

    /// Returns the text payload, if this is text.
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Field::Text(s) => Some(s),
            Field::Int(_) => None,
        }
    }

    /// Evaluates `self op other`.
    ///
    /// Values of different types never satisfy any operator.
    #[must_use]
    pub fn compare(&self, op: CompareOp, other: &Field) -> bool {
        self.partial_cmp(other).is_some_and(|ord| op.matches(ord))
    }

    /// Writes the fixed-width encoding of this value.
    pub fn serialize(&self, buf: &mut impl BufMut) {
        match self {
            Field::Int(v) => buf.put_i32(*v),
            Field::Text(s) => {
                let bytes = s.as_bytes();
                let len = bytes.len().min(STRING_LEN);
                buf.put_u32(len as u32);
                buf.put_slice(&bytes[..len]);
                buf.put_bytes(0, STRING_LEN - len);
            }
        }
    }
}

impl PartialOrd for Field {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Field::Int(a), Field::Int(b)) => Some(a.cmp(b)),
            (Field::Text(a), Field::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{v}"),
            Field::Text(s) => f.write_str(s),
        }
    }
}

impl From<i32> for Field {
    fn from(v: i32) -> Self {
        Field::Int(v)
    }
}

impl From<&str> for Field {
    fn from(v: &str) -> Self {
        Field::text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TableId;
    use bytes::BytesMut;

    fn pid() -> HeapPageId {
        HeapPageId::new(TableId::new(1), 0)
    }

    #[test]
    fn test_widths() {
        assert_eq!(Type::Int.width(), 4);
        assert_eq!(Type::Text.width(), 132);
    }

    #[test]
    fn test_compare_ints() {
        let a = Field::Int(3);
        let b = Field::Int(5);
        assert!(a.compare(CompareOp::LessThan, &b));
        assert!(a.compare(CompareOp::LessThanOrEq, &b));
        assert!(a.compare(CompareOp::NotEquals, &b));
        assert!(!a.compare(CompareOp::Equals, &b));
        assert!(!a.compare(CompareOp::GreaterThan, &b));
        assert!(a.compare(CompareOp::GreaterThanOrEq, &a));
    }

    #[test]
    fn test_compare_text() {
        let a = Field::text("apple");
        let b = Field::text("banana");
        assert!(a.compare(CompareOp::LessThan, &b));
        assert!(b.compare(CompareOp::GreaterThan, &a));
    }

    #[test]
    fn test_compare_mixed_types_is_false() {
        let a = Field::Int(1);
        let b = Field::text("1");
        for op in CompareOp::ALL {
            assert!(!a.compare(op, &b), "{op} should not hold across types");
        }
    }

    #[test]
    fn test_int_encoding_is_big_endian() {
        let mut buf = BytesMut::new();
        Field::Int(0x0102_0304).serialize(&mut buf);
        assert_eq!(&buf[..], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_text_encoding_is_padded() {
        let mut buf = BytesMut::new();
        Field::text("hi").serialize(&mut buf);
        assert_eq!(buf.len(), Type::Text.width());
        assert_eq!(&buf[..6], &[0, 0, 0, 2, b'h', b'i']);
        assert!(buf[6..].iter().all(|&b| b == 0));

        let mut bytes = buf.freeze();
        assert_eq!(Type::Text.parse(&mut bytes, pid()).unwrap(), Field::text("hi"));
    }

    #[test]
    fn test_text_truncates_on_char_boundary() {
        let long = "é".repeat(STRING_LEN);
        let field = Field::text(long);
        let text = field.as_text().unwrap();
        assert!(text.len() <= STRING_LEN);
        assert_eq!(text.len() % 2, 0);
    }

    #[test]
    fn test_parse_short_buffer_is_corruption() {
        let mut bytes: &[u8] = &[0, 1];
        let err = Type::Int.parse(&mut bytes, pid()).unwrap_err();
        assert!(matches!(err, DbError::PageCorrupted { .. }));
    }

    #[test]
    fn test_op_display() {
        assert_eq!(CompareOp::NotEquals.to_string(), "<>");
        assert_eq!(CompareOp::GreaterThanOrEq.to_string(), ">=");
    }
}

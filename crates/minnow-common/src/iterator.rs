//! The pull-based iterator protocol.
//!
//! Every storage scan and relational operator produces tuples through
//! [`OpIterator`]:
//!
//! ```text
//!            open            close
//! Unopened ───────▶ Open ───────────▶ Closed
//!                   │  ▲                 │
//!    has_next/next/ │  │ rewind          │ open
//!                   ▼  │                 │
//!                   Open ◀───────────────┘
//! ```
//!
//! Concrete producers implement the smaller [`TupleSource`] capability and
//! receive the full protocol through a blanket implementation. The blanket
//! implementation owns the state checks, the single lookahead tuple behind
//! `has_next`, and verification that every produced tuple matches the
//! promised schema.

use std::fmt;
use std::sync::Arc;

use crate::error::{DbError, DbResult};
use crate::types::{Schema, Tuple};

/// Lifecycle state of an iterator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IterState {
    /// Constructed but not yet opened.
    #[default]
    Unopened,
    /// Producing tuples.
    Open,
    /// Closed; may be opened again.
    Closed,
}

impl fmt::Display for IterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unopened => f.write_str("unopened"),
            Self::Open => f.write_str("open"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

/// Protocol bookkeeping embedded in every [`TupleSource`].
#[derive(Debug, Default)]
pub struct Cursor {
    state: IterState,
    lookahead: Option<Tuple>,
}

impl Cursor {
    /// Creates a cursor in the `Unopened` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> IterState {
        self.state
    }

    fn ensure_open(&self, operation: &'static str) -> DbResult<()> {
        if self.state == IterState::Open {
            Ok(())
        } else {
            Err(DbError::invalid_state(operation, self.state))
        }
    }
}

/// The operator contract.
///
/// Object safe; operator trees are built from `Box<dyn OpIterator>`.
pub trait OpIterator: Send {
    /// Returns the schema every produced tuple conforms to.
    fn schema(&self) -> &Arc<Schema>;

    /// Returns the lifecycle state.
    fn state(&self) -> IterState;

    /// Prepares the iterator. Fails if it is already open.
    fn open(&mut self) -> DbResult<()>;

    /// Returns true if another tuple is available, without consuming it.
    fn has_next(&mut self) -> DbResult<bool>;

    /// Returns the next tuple, or `None` at the end of the sequence.
    fn next(&mut self) -> DbResult<Option<Tuple>>;

    /// Restarts the sequence from the beginning.
    fn rewind(&mut self) -> DbResult<()>;

    /// Releases resources. Outside the `Open` state this does nothing.
    fn close(&mut self);
}

/// Capability implemented by concrete tuple producers.
///
/// Implementors only deal with producing tuples; [`OpIterator`] is derived
/// from this trait and enforces the lifecycle.
pub trait TupleSource: Send {
    /// Schema of the produced tuples.
    fn source_schema(&self) -> &Arc<Schema>;

    /// Shared access to the embedded cursor.
    fn cursor(&self) -> &Cursor;

    /// Exclusive access to the embedded cursor.
    fn cursor_mut(&mut self) -> &mut Cursor;

    /// Acquires resources (opens children, positions at the start).
    fn open_source(&mut self) -> DbResult<()>;

    /// Produces the next tuple, or `None` when exhausted.
    fn fetch_next(&mut self) -> DbResult<Option<Tuple>>;

    /// Repositions at the first tuple.
    fn rewind_source(&mut self) -> DbResult<()>;

    /// Releases resources acquired by `open_source`.
    fn close_source(&mut self) {}
}

fn fetch_checked<T: TupleSource>(source: &mut T) -> DbResult<Option<Tuple>> {
    let tuple = source.fetch_next()?;
    if let Some(tuple) = &tuple {
        let promised = source.source_schema();
        if !tuple.schema().same_types(promised) {
            return Err(DbError::schema_mismatch(promised, tuple.schema()));
        }
    }
    Ok(tuple)
}

impl<T: TupleSource> OpIterator for T {
    fn schema(&self) -> &Arc<Schema> {
        self.source_schema()
    }

    fn state(&self) -> IterState {
        self.cursor().state
    }

    fn open(&mut self) -> DbResult<()> {
        let state = self.cursor().state;
        if state == IterState::Open {
            return Err(DbError::invalid_state("open", state));
        }
        self.open_source()?;
        let cursor = self.cursor_mut();
        cursor.state = IterState::Open;
        cursor.lookahead = None;
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        self.cursor().ensure_open("has_next")?;
        if self.cursor().lookahead.is_none() {
            let tuple = fetch_checked(self)?;
            self.cursor_mut().lookahead = tuple;
        }
        Ok(self.cursor().lookahead.is_some())
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        self.cursor().ensure_open("next")?;
        match self.cursor_mut().lookahead.take() {
            Some(tuple) => Ok(Some(tuple)),
            None => fetch_checked(self),
        }
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.cursor().ensure_open("rewind")?;
        self.cursor_mut().lookahead = None;
        self.rewind_source()
    }

    fn close(&mut self) {
        if self.cursor().state != IterState::Open {
            return;
        }
        self.close_source();
        let cursor = self.cursor_mut();
        cursor.state = IterState::Closed;
        cursor.lookahead = None;
    }
}

/// An iterator over an in-memory list of tuples.
#[derive(Debug)]
pub struct TupleIterator {
    schema: Arc<Schema>,
    tuples: Vec<Tuple>,
    position: usize,
    cursor: Cursor,
}

impl TupleIterator {
    /// Creates an iterator over `tuples`, each of which must match `schema`.
    pub fn new(schema: Arc<Schema>, tuples: Vec<Tuple>) -> DbResult<Self> {
        if let Some(bad) = tuples.iter().find(|t| !t.schema().same_types(&schema)) {
            return Err(DbError::schema_mismatch(&schema, bad.schema()));
        }
        Ok(Self {
            schema,
            tuples,
            position: 0,
            cursor: Cursor::new(),
        })
    }

    /// Returns the number of tuples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    /// Returns true if there are no tuples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }
}

impl TupleSource for TupleIterator {
    fn source_schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    fn open_source(&mut self) -> DbResult<()> {
        self.position = 0;
        Ok(())
    }

    fn fetch_next(&mut self) -> DbResult<Option<Tuple>> {
        let tuple = self.tuples.get(self.position).cloned();
        if tuple.is_some() {
            self.position += 1;
        }
        Ok(tuple)
    }

    fn rewind_source(&mut self) -> DbResult<()> {
        self.position = 0;
        Ok(())
    }
}

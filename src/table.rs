//! In-memory table storage.
//!
//! A [`Table`] owns its rows in a `Vec` kept ordered by the row type's
//! index comparison. Insertion binary-searches to the upper bound of the
//! equal range, so rows with equal keys (and every row of an index-less
//! table, where all rows compare equal) stay in arrival order. This gives
//! the two container policies of a schema declaration, ordered multiset
//! and insertion-ordered sequence, one mechanism.

use core::cmp::Ordering;
use core::slice;

use crate::row::Record;

/// Row container for one declared table.
///
/// Queries borrow the table for their whole lifetime; the borrow checker
/// enforces that a table outlives every query constructed over it.
#[derive(Clone, Debug, Default)]
pub struct Table<R> {
    rows: Vec<R>,
}

impl<R: Record> Table<R> {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
        }
    }

    /// Inserts one row at the upper bound of its index-equal range.
    pub fn insert(&mut self, row: R) {
        let at = self
            .rows
            .partition_point(|stored| stored.cmp_index(&row) != Ordering::Greater);
        self.rows.insert(at, row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stored rows in index order.
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn iter(&self) -> slice::Iter<'_, R> {
        self.rows.iter()
    }
}

impl<R: Record> Extend<R> for Table<R> {
    fn extend<I: IntoIterator<Item = R>>(&mut self, iter: I) {
        for row in iter {
            self.insert(row);
        }
    }
}

impl<R: Record> FromIterator<R> for Table<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        let mut table = Table::new();
        table.extend(iter);
        table
    }
}

impl<'a, R: Record> IntoIterator for &'a Table<R> {
    type Item = &'a R;
    type IntoIter = slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

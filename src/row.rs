//! Row model traits implemented by macro-generated row structs.
//!
//! A row is an ordinary struct with one public field per column, in column
//! declaration order. The traits here carry the metadata the execution
//! kernel needs: the sort-key comparison used by [`Table`](crate::Table),
//! the row-merge rule used by the join operators, and the join-key
//! projection used by the natural join.

use core::cmp::Ordering;
use core::hash::Hash;

/// A table row: a named, typed record stored in a [`Table`](crate::Table).
///
/// Implemented by the `database!` macro for every declared table. The
/// associated constants describe the declared schema; `cmp_index` compares
/// two rows by the table's index columns in declaration order and returns
/// `Ordering::Equal` for index-less tables, which makes insertion keep
/// arrival order.
pub trait Record: Clone {
    /// Table name as it appears in `FROM` clauses.
    const TABLE: &'static str;

    /// Column names in declaration order.
    const COLUMNS: &'static [&'static str];

    /// Lexicographic comparison over the index columns.
    fn cmp_index(&self, other: &Self) -> Ordering;
}

/// Row concatenation for joins.
///
/// The output carries every column of `self` followed by every column of
/// `Rhs`, except that when the first column of `Rhs` has the same name as
/// the first column of `self` that one duplicate is dropped and the merged
/// row keeps the left-hand value. Deeper name collisions are rejected when
/// the query is compiled, so they cannot reach this trait.
pub trait Merge<Rhs> {
    type Output;

    fn merge(&self, other: &Rhs) -> Self::Output;
}

/// Projection of the join key (the leading column) out of a row.
///
/// Implemented for row types that appear as natural-join operands. Both
/// sides of a natural join must agree on the key's name and type; the
/// query compiler enforces the name, this trait's `Key` equality enforces
/// the type.
pub trait JoinKey {
    type Key: Eq + Hash + Clone;

    fn key(&self) -> &Self::Key;
}

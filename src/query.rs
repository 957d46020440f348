//! Query façade over a compiled operator tree.

use crate::ra::Operator;

/// An iterable query instance.
///
/// Wraps the root of the operator tree built by a generated query
/// constructor. Owns no row storage; the leaves borrow the tables the
/// constructor was given, so the query cannot outlive them. Iterating
/// pulls rows from the root; once exhausted, [`reset`](Query::reset)
/// rewinds the whole tree for another pass (join caches are kept).
pub struct Query<Op> {
    root: Op,
}

impl<Op: Operator> Query<Op> {
    pub fn new(root: Op) -> Self {
        Self { root }
    }

    /// Rewinds every operator to the start of its input.
    pub fn reset(&mut self) {
        self.root.reset();
    }
}

impl<Op: Operator> Iterator for Query<Op> {
    type Item = Op::Row;

    fn next(&mut self) -> Option<Op::Row> {
        self.root.next()
    }
}

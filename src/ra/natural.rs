//! Hash-based natural join.

use hashbrown::HashMap;

use super::Operator;
use crate::row::{JoinKey, Merge};

/// Equi-join on the shared leading column of both inputs.
///
/// Construction drains the right input into a multimap from join key to
/// right rows, then rewinds the right input. Iteration is left-major: all
/// matches for the current left row are emitted, in bucket order, before
/// the next left row is pulled. The cache is built once and survives
/// `reset()`, so re-iterating a query does not re-read the right side.
pub struct Natural<L, R>
where
    L: Operator,
    R: Operator,
    L::Row: JoinKey + Merge<R::Row>,
    R::Row: JoinKey<Key = <L::Row as JoinKey>::Key>,
{
    left: L,
    right: R,
    cache: HashMap<<L::Row as JoinKey>::Key, Vec<R::Row>>,
    current: Option<L::Row>,
    bucket_pos: usize,
}

impl<L, R> Natural<L, R>
where
    L: Operator,
    R: Operator,
    L::Row: JoinKey + Merge<R::Row>,
    R::Row: JoinKey<Key = <L::Row as JoinKey>::Key>,
{
    pub fn new(left: L, mut right: R) -> Self {
        let mut cache: HashMap<<L::Row as JoinKey>::Key, Vec<R::Row>> = HashMap::new();
        while let Some(row) = right.next() {
            cache.entry(row.key().clone()).or_default().push(row);
        }
        right.reset();
        tracing::trace!(keys = cache.len(), "natural join cache built");

        Self {
            left,
            right,
            cache,
            current: None,
            bucket_pos: 0,
        }
    }
}

impl<L, R> Operator for Natural<L, R>
where
    L: Operator,
    R: Operator,
    L::Row: JoinKey + Merge<R::Row>,
    R::Row: JoinKey<Key = <L::Row as JoinKey>::Key>,
{
    type Row = <L::Row as Merge<R::Row>>::Output;

    fn next(&mut self) -> Option<Self::Row> {
        loop {
            if let Some(left) = &self.current {
                if let Some(bucket) = self.cache.get(left.key()) {
                    if let Some(right) = bucket.get(self.bucket_pos) {
                        self.bucket_pos += 1;
                        return Some(left.merge(right));
                    }
                }
            }
            // Current left row has no further matches; advance the left.
            self.current = Some(self.left.next()?);
            self.bucket_pos = 0;
        }
    }

    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.current = None;
        self.bucket_pos = 0;
    }
}

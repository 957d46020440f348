//! Cartesian-product operator.

use super::Operator;
use crate::row::Merge;

/// Left-major nested loop: for each left row, a full sweep of the right
/// input, rewinding the right side between left rows.
pub struct Cross<L, R>
where
    L: Operator,
    R: Operator,
    L::Row: Merge<R::Row>,
{
    left: L,
    right: R,
    current: Option<L::Row>,
}

impl<L, R> Cross<L, R>
where
    L: Operator,
    R: Operator,
    L::Row: Merge<R::Row>,
{
    pub fn new(left: L, right: R) -> Self {
        Self {
            left,
            right,
            current: None,
        }
    }
}

impl<L, R> Operator for Cross<L, R>
where
    L: Operator,
    R: Operator,
    L::Row: Merge<R::Row>,
{
    type Row = <L::Row as Merge<R::Row>>::Output;

    fn next(&mut self) -> Option<Self::Row> {
        loop {
            let left = match &self.current {
                Some(left) => left,
                None => self.current.insert(self.left.next()?),
            };
            match self.right.next() {
                Some(right) => return Some(left.merge(&right)),
                None => {
                    // Right side exhausted for this left row.
                    self.current = None;
                    self.right.reset();
                }
            }
        }
    }

    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{books, credits, Credit};
    use super::super::Relation;
    use super::*;
    use crate::table::Table;

    #[test]
    fn cardinality_is_product_of_inputs() {
        let left = books();
        let right = credits();
        let mut op = Cross::new(Relation::new(&left), Relation::new(&right));

        let mut count = 0;
        while op.next().is_some() {
            count += 1;
        }
        assert_eq!(count, left.len() * right.len());
    }

    #[test]
    fn iterates_left_major() {
        let left = books();
        let right = credits();
        let mut op = Cross::new(Relation::new(&left), Relation::new(&right));

        let mut pairs = Vec::new();
        while let Some(row) = op.next() {
            pairs.push((row.title, row.name));
        }

        // First left row paired with every right row before the second
        // left row appears.
        assert_eq!(pairs[0].0, "dune");
        assert_eq!(pairs[1].0, "dune");
        assert_eq!(pairs[2].0, "dune");
        assert_eq!(pairs[3].0, "lotr");
        assert_eq!(
            pairs.iter().map(|(_, n)| n.as_str()).take(3).collect::<Vec<_>>(),
            vec!["herbert", "tolkien", "anderson"]
        );
    }

    #[test]
    fn empty_right_input_yields_nothing() {
        let left = books();
        let right: Table<Credit> = Table::new();
        let mut op = Cross::new(Relation::new(&left), Relation::new(&right));
        assert!(op.next().is_none());
    }

    #[test]
    fn reset_replays_the_product() {
        let left = books();
        let right = credits();
        let mut op = Cross::new(Relation::new(&left), Relation::new(&right));

        let mut first = Vec::new();
        while let Some(row) = op.next() {
            first.push((row.title, row.name));
        }
        op.reset();
        let mut second = Vec::new();
        while let Some(row) = op.next() {
            second.push((row.title, row.name));
        }
        assert_eq!(first, second);
    }
}

//! Filter operator.

use super::Operator;
use crate::expr::Expr;

/// Emits only the input rows for which the predicate holds.
pub struct Selection<I, P> {
    input: I,
    predicate: P,
}

impl<I, P> Selection<I, P>
where
    I: Operator,
    P: Expr<I::Row, Output = bool>,
{
    pub fn new(input: I, predicate: P) -> Self {
        Self { input, predicate }
    }
}

impl<I, P> Operator for Selection<I, P>
where
    I: Operator,
    P: Expr<I::Row, Output = bool>,
{
    type Row = I::Row;

    fn next(&mut self) -> Option<I::Row> {
        loop {
            let row = self.input.next()?;
            if self.predicate.eval(&row) {
                return Some(row);
            }
        }
    }

    fn reset(&mut self) {
        self.input.reset();
    }
}

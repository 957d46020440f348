//! Column-subset operator.

use super::Operator;

/// Maps each input row to the output row declared by the SELECT list.
///
/// The mapping function is generated per query and moves the selected
/// columns, by name, into the output struct in SELECT-list order.
pub struct Projection<I, F> {
    input: I,
    project: F,
}

impl<I, F> Projection<I, F> {
    pub fn new(input: I, project: F) -> Self {
        Self { input, project }
    }
}

impl<I, F, Out> Operator for Projection<I, F>
where
    I: Operator,
    F: Fn(I::Row) -> Out,
{
    type Row = Out;

    fn next(&mut self) -> Option<Out> {
        self.input.next().map(&self.project)
    }

    fn reset(&mut self) {
        self.input.reset();
    }
}

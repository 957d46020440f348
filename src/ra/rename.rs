//! Column-rename operator.
//!
//! Structurally a projection, but the generated mapping copies
//! positionally into an output row whose field names may differ. A query
//! with `AS` aliases compiles to a `Rename` wrapping a [`Projection`]
//! whose output still carries the source names, so WHERE resolution below
//! the projection sees the original column names.
//!
//! [`Projection`]: super::Projection

use super::Operator;

pub struct Rename<I, F> {
    input: I,
    rename: F,
}

impl<I, F> Rename<I, F> {
    pub fn new(input: I, rename: F) -> Self {
        Self { input, rename }
    }
}

impl<I, F, Out> Operator for Rename<I, F>
where
    I: Operator,
    F: Fn(I::Row) -> Out,
{
    type Row = Out;

    fn next(&mut self) -> Option<Out> {
        self.input.next().map(&self.rename)
    }

    fn reset(&mut self) {
        self.input.reset();
    }
}

//! Compiles expected values into comparison logic.
//!
//! `emit` walks one `ExpectedValue` and drives an `AssertionTarget`. The
//! walk is the same for every backend; targets decide whether a check is
//! rendered as source text (`CEmitter`) or evaluated on a live value
//! (`Evaluator`).

mod c_emit;
mod evaluate;

pub use c_emit::{c_int_literal, CEmitter};
pub use evaluate::{Evaluator, Mismatch};

use crate::{
    fixture::{ContainerKind, ExpectedValue},
    runtime::ValueTag,
};

pub trait AssertionTarget {
    type Handle;
    type Error;

    /// Type-tag and payload check for a scalar expectation.
    fn scalar(&mut self, value: &Self::Handle, expected: &ExpectedValue)
        -> Result<(), Self::Error>;

    /// The value must be a container of `kind`.
    fn container(&mut self, value: &Self::Handle, kind: ContainerKind) -> Result<(), Self::Error>;

    fn element(
        &mut self,
        value: &Self::Handle,
        kind: ContainerKind,
        index: usize,
    ) -> Result<Self::Handle, Self::Error>;

    /// No element may exist at index `len`.
    fn end(&mut self, value: &Self::Handle, kind: ContainerKind, len: usize)
        -> Result<(), Self::Error>;

    /// Called once the element returned by `element` has been checked.
    fn release(&mut self, _element: Self::Handle) {}
}

pub fn emit<T: AssertionTarget>(
    target: &mut T,
    value: &T::Handle,
    expected: &ExpectedValue,
) -> Result<(), T::Error> {
    let Some((kind, items)) = expected.container() else {
        return target.scalar(value, expected);
    };
    target.container(value, kind)?;
    for (index, item) in items.iter().enumerate() {
        let element = target.element(value, kind, index)?;
        let checked = emit(target, &element, item);
        target.release(element);
        checked?;
    }
    target.end(value, kind, items.len())
}

pub fn expected_tag(expected: &ExpectedValue) -> ValueTag {
    match expected {
        ExpectedValue::Int(_) => ValueTag::Int,
        ExpectedValue::Float(_) => ValueTag::Float,
        ExpectedValue::Bool(_) => ValueTag::Bool,
        ExpectedValue::Nil => ValueTag::Nil,
        ExpectedValue::Str(_) => ValueTag::Str,
        ExpectedValue::Array(_) | ExpectedValue::Tuple(_) => ValueTag::Struct,
    }
}

#[cfg(test)]
mod tests;

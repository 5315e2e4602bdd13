use crate::fixture::ContainerKind;
use std::fmt;

/// Runtime type tag reported by a value under test.
///
/// Arrays and tuples are both `Struct`; `ValueHandle::container_kind`
/// tells them apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueTag {
    Int,
    Float,
    Bool,
    Nil,
    Str,
    Struct,
    Other,
}

impl fmt::Display for ValueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueTag::Int => "int",
            ValueTag::Float => "float",
            ValueTag::Bool => "bool",
            ValueTag::Nil => "nil",
            ValueTag::Str => "str",
            ValueTag::Struct => "struct",
            ValueTag::Other => "other",
        };
        f.write_str(name)
    }
}

/// Capability surface the assertion evaluator needs from a runtime value.
///
/// Handles are cheap to produce; `element` returns a fresh handle for the
/// item at `index`, or `None` once `index` is past the end.
pub trait ValueHandle: Sized {
    fn tag(&self) -> ValueTag;
    fn as_int(&self) -> Option<i64>;
    fn as_float(&self) -> Option<f64>;
    fn as_bool(&self) -> Option<bool>;
    fn as_str(&self) -> Option<&[u8]>;
    fn container_kind(&self) -> Option<ContainerKind>;
    fn element(&self, index: usize) -> Option<Self>;
}

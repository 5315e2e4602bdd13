use super::handle::{ValueHandle, ValueTag};
use crate::fixture::ContainerKind;
use std::rc::Rc;

/// Owned runtime value for interpreters hosted in Rust.
#[derive(Clone, Debug)]
pub enum Value {
    Unit,
    Int(i64),
    Float(f64),
    Bool(bool),
    String(Rc<[u8]>),
    Array(Rc<[Value]>),
    Tuple(Rc<[Value]>),
    /// Any runtime object the oracle has no expectation syntax for.
    Opaque(&'static str),
}

impl Value {
    pub fn string(text: impl AsRef<[u8]>) -> Self {
        Value::String(Rc::from(text.as_ref()))
    }

    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(items.into_iter().collect())
    }

    pub fn tuple(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Tuple(items.into_iter().collect())
    }
}

impl ValueHandle for Value {
    fn tag(&self) -> ValueTag {
        match self {
            Value::Unit => ValueTag::Nil,
            Value::Int(_) => ValueTag::Int,
            Value::Float(_) => ValueTag::Float,
            Value::Bool(_) => ValueTag::Bool,
            Value::String(_) => ValueTag::Str,
            Value::Array(_) | Value::Tuple(_) => ValueTag::Struct,
            Value::Opaque(_) => ValueTag::Other,
        }
    }

    fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&[u8]> {
        match self {
            Value::String(bytes) => Some(&bytes[..]),
            _ => None,
        }
    }

    fn container_kind(&self) -> Option<ContainerKind> {
        match self {
            Value::Array(_) => Some(ContainerKind::Array),
            Value::Tuple(_) => Some(ContainerKind::Tuple),
            _ => None,
        }
    }

    fn element(&self, index: usize) -> Option<Self> {
        match self {
            Value::Array(items) | Value::Tuple(items) => items.get(index).cloned(),
            _ => None,
        }
    }
}

use super::{emit, expected_tag, AssertionTarget};
use crate::{
    fixture::{ContainerKind, ExpectedValue},
    runtime::{ValueHandle, ValueTag},
};
use std::{fmt::Write, marker::PhantomData};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mismatch {
    /// Element path inside the top-level value, e.g. `[2]`; empty at the top.
    pub path: String,
    pub expected: String,
    pub found: String,
}

/// Checks expectations directly against a live `ValueHandle`.
pub struct Evaluator<V> {
    path: Vec<usize>,
    _value: PhantomData<fn(&V)>,
}

impl<V: ValueHandle> Default for Evaluator<V> {
    fn default() -> Self {
        Self {
            path: Vec::new(),
            _value: PhantomData,
        }
    }
}

impl<V: ValueHandle> Evaluator<V> {
    pub fn check(value: &V, expected: &ExpectedValue) -> Result<(), Mismatch> {
        emit(&mut Self::default(), value, expected)
    }

    fn mismatch(&self, expected: impl Into<String>, found: impl Into<String>) -> Mismatch {
        let mut path = String::new();
        for index in &self.path {
            let _ = write!(path, "[{index}]");
        }
        Mismatch {
            path,
            expected: expected.into(),
            found: found.into(),
        }
    }
}

fn floats_match(expected: f64, found: f64) -> bool {
    if expected.is_nan() {
        found.is_nan()
    } else {
        expected == found
    }
}

fn describe<V: ValueHandle>(value: &V) -> String {
    match value.tag() {
        ValueTag::Int => value
            .as_int()
            .map(|v| format!("int {v}"))
            .unwrap_or_else(|| "int".into()),
        ValueTag::Float => value
            .as_float()
            .map(|v| format!("float {v:?}"))
            .unwrap_or_else(|| "float".into()),
        ValueTag::Bool => value
            .as_bool()
            .map(|v| format!("bool {v}"))
            .unwrap_or_else(|| "bool".into()),
        ValueTag::Str => value
            .as_str()
            .map(|v| format!("str {:?}", String::from_utf8_lossy(v)))
            .unwrap_or_else(|| "str".into()),
        ValueTag::Struct => match value.container_kind() {
            Some(kind) => kind.name().to_string(),
            None => "struct".into(),
        },
        tag => tag.to_string(),
    }
}

impl<V: ValueHandle> AssertionTarget for Evaluator<V> {
    type Handle = V;
    type Error = Mismatch;

    fn scalar(&mut self, value: &V, expected: &ExpectedValue) -> Result<(), Mismatch> {
        let matched = value.tag() == expected_tag(expected)
            && match expected {
                ExpectedValue::Int(want) => value.as_int() == Some(*want),
                ExpectedValue::Float(want) => value
                    .as_float()
                    .is_some_and(|found| floats_match(*want, found)),
                ExpectedValue::Bool(want) => value.as_bool() == Some(*want),
                ExpectedValue::Nil => true,
                ExpectedValue::Str(want) => value.as_str() == Some(want.as_slice()),
                ExpectedValue::Array(_) | ExpectedValue::Tuple(_) => false,
            };
        if matched {
            Ok(())
        } else {
            Err(self.mismatch(expected.to_string(), describe(value)))
        }
    }

    fn container(&mut self, value: &V, kind: ContainerKind) -> Result<(), Mismatch> {
        if value.tag() == ValueTag::Struct && value.container_kind() == Some(kind) {
            Ok(())
        } else {
            Err(self.mismatch(kind.name(), describe(value)))
        }
    }

    fn element(&mut self, value: &V, kind: ContainerKind, index: usize) -> Result<V, Mismatch> {
        let Some(element) = value.element(index) else {
            return Err(self.mismatch(
                format!("{} element at index {index}", kind.name()),
                format!("{} of length {index}", kind.name()),
            ));
        };
        self.path.push(index);
        Ok(element)
    }

    fn end(&mut self, value: &V, kind: ContainerKind, len: usize) -> Result<(), Mismatch> {
        if value.element(len).is_none() {
            Ok(())
        } else {
            Err(self.mismatch(
                format!("{} of length {len}", kind.name()),
                format!("{} with more than {len} element(s)", kind.name()),
            ))
        }
    }

    fn release(&mut self, _element: V) {
        self.path.pop();
    }
}

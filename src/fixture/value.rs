use std::fmt;

/// One value a fixture program is expected to emit.
#[derive(Clone, Debug, PartialEq)]
pub enum ExpectedValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Nil,
    Str(Vec<u8>),
    /// Elements are always scalars; the transcript parser rejects nesting.
    Array(Vec<ExpectedValue>),
    Tuple(Vec<ExpectedValue>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerKind {
    Array,
    Tuple,
}

impl ContainerKind {
    pub fn name(self) -> &'static str {
        match self {
            ContainerKind::Array => "array",
            ContainerKind::Tuple => "tuple",
        }
    }
}

impl ExpectedValue {
    pub fn tag_name(&self) -> &'static str {
        match self {
            ExpectedValue::Int(_) => "int",
            ExpectedValue::Float(_) => "float",
            ExpectedValue::Bool(_) => "bool",
            ExpectedValue::Nil => "nil",
            ExpectedValue::Str(_) => "str",
            ExpectedValue::Array(_) => "array",
            ExpectedValue::Tuple(_) => "tuple",
        }
    }

    pub fn container(&self) -> Option<(ContainerKind, &[ExpectedValue])> {
        match self {
            ExpectedValue::Array(items) => Some((ContainerKind::Array, items)),
            ExpectedValue::Tuple(items) => Some((ContainerKind::Tuple, items)),
            _ => None,
        }
    }
}

impl fmt::Display for ExpectedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedValue::Int(v) => write!(f, "int {v}"),
            ExpectedValue::Float(v) => write!(f, "float {v:?}"),
            ExpectedValue::Bool(v) => write!(f, "bool {v}"),
            ExpectedValue::Nil => write!(f, "nil"),
            ExpectedValue::Str(bytes) => write!(f, "str {:?}", String::from_utf8_lossy(bytes)),
            ExpectedValue::Array(items) | ExpectedValue::Tuple(items) => {
                write!(f, "{}(", self.tag_name())?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

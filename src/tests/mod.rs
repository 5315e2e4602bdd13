
use crate::fixture::{parse_transcript, ExpectedValue, Fixture};
use crate::runtime::Value;
use std::path::{Path, PathBuf};

/// In-memory fixture; `name` doubles as the transcript path.
pub(crate) fn fixture(name: &str, transcript: &str, program: &str) -> Fixture {
    let path = PathBuf::from(name);
    Fixture {
        name: name.to_string(),
        program_path: path.with_extension("au"),
        expected: parse_transcript(Path::new(name), transcript).expect("test transcript parses"),
        transcript: path,
        program: program.as_bytes().to_vec(),
        stdin: None,
    }
}

/// The runtime value a program would emit for `expected`.
pub(crate) fn value_of(expected: &ExpectedValue) -> Value {
    match expected {
        ExpectedValue::Int(v) => Value::Int(*v),
        ExpectedValue::Float(v) => Value::Float(*v),
        ExpectedValue::Bool(v) => Value::Bool(*v),
        ExpectedValue::Nil => Value::Unit,
        ExpectedValue::Str(bytes) => Value::string(bytes),
        ExpectedValue::Array(items) => Value::array(items.iter().map(value_of)),
        ExpectedValue::Tuple(items) => Value::tuple(items.iter().map(value_of)),
    }
}

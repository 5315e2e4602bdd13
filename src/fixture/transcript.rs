//! Grammar for the expected-value transcript (`.out`) format.
//!
//! Each non-empty line is classified by its tag prefix and the payload is
//! then parsed by a small recursive-descent parser built from `nom` leaves:
//!
//! ```text
//! line      := int | float | bool | nil | str | array | tuple
//! int       := "int;" integer
//! float     := "float;" float-literal
//! bool      := "bool;" ("true" | "false")
//! nil       := "nil;"
//! str       := "str;" c-string (ws* c-string)*
//! array     := "array;" elements?
//! tuple     := "tuple;" elements?
//! elements  := element (";" element)*
//! element   := scalar-tag "," scalar-payload
//! ```

use super::{literal::c_string, value::ContainerKind, ExpectedValue};
use crate::error::FixtureFormatError;
use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case},
    character::complete::{digit1, one_of},
    combinator::{map, map_res, opt, recognize, value},
    number::complete::double,
    sequence::pair,
    IResult,
};
use std::path::Path;

const KNOWN_TAGS: &str = "int, float, bool, nil, str, array, tuple";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScalarTag {
    Int,
    Float,
    Bool,
    Nil,
    Str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LineKind {
    Scalar(ScalarTag),
    Composite(ContainerKind),
}

impl LineKind {
    fn classify(word: &str) -> Option<Self> {
        Some(match word {
            "int" => LineKind::Scalar(ScalarTag::Int),
            "float" => LineKind::Scalar(ScalarTag::Float),
            "bool" => LineKind::Scalar(ScalarTag::Bool),
            "nil" => LineKind::Scalar(ScalarTag::Nil),
            "str" => LineKind::Scalar(ScalarTag::Str),
            "array" => LineKind::Composite(ContainerKind::Array),
            "tuple" => LineKind::Composite(ContainerKind::Tuple),
            _ => return None,
        })
    }
}

impl ScalarTag {
    fn describe(self) -> (&'static str, &'static str) {
        match self {
            ScalarTag::Int => (
                "malformed int literal",
                "int payloads are signed 64-bit decimal integers",
            ),
            ScalarTag::Float => (
                "malformed float literal",
                "float payloads use decimal or exponent notation, or a signed `inf`, `infinity` or `nan`",
            ),
            ScalarTag::Bool => ("malformed bool literal", "bool payloads are `true` or `false`"),
            ScalarTag::Nil => ("malformed nil entry", "nil entries carry no payload"),
            ScalarTag::Str => (
                "malformed string literal",
                "str payloads are double-quoted C string literals, e.g. \"a\\n\"",
            ),
        }
    }
}

#[derive(Debug)]
struct LineError {
    offset: usize,
    len: usize,
    message: String,
    help: Option<String>,
}

impl LineError {
    fn new(offset: usize, len: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            len,
            message: message.into(),
            help: None,
        }
    }

    fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    fn shifted(mut self, by: usize) -> Self {
        self.offset += by;
        self
    }
}

/// Transcripts are text; an invalid byte is reported at its line like any
/// other authoring defect.
pub fn decode_transcript<'a>(path: &Path, bytes: &'a [u8]) -> Result<&'a str, FixtureFormatError> {
    std::str::from_utf8(bytes).map_err(|error| {
        let at = error.valid_up_to();
        let line = bytes[..at].iter().filter(|&&b| b == b'\n').count() + 1;
        // The lossy text carries one U+FFFD where the invalid sequence starts.
        let shown = String::from_utf8_lossy(bytes);
        FixtureFormatError::new(
            path,
            &shown,
            line,
            (at, char::REPLACEMENT_CHARACTER.len_utf8()),
            "transcript is not valid UTF-8",
        )
        .with_help("write non-ASCII string bytes as escapes such as \\xff or \\377")
    })
}

/// Parses a whole transcript. The first malformed line aborts parsing.
pub fn parse_transcript(path: &Path, text: &str) -> Result<Vec<ExpectedValue>, FixtureFormatError> {
    let mut values = Vec::new();
    let mut line_start = 0usize;
    for (idx, raw) in text.split('\n').enumerate() {
        let start = line_start;
        line_start += raw.len() + 1;
        let line = raw.trim_end();
        let body = line.trim_start();
        if body.is_empty() {
            continue;
        }
        let indent = line.len() - body.len();
        match parse_line(body) {
            Ok(parsed) => values.push(parsed),
            Err(err) => {
                let span = (start + indent + err.offset, err.len);
                let mut diagnostic =
                    FixtureFormatError::new(path, text, idx + 1, span, err.message);
                if let Some(help) = err.help {
                    diagnostic = diagnostic.with_help(help);
                }
                return Err(diagnostic);
            }
        }
    }
    Ok(values)
}

fn parse_line(line: &str) -> Result<ExpectedValue, LineError> {
    let Some((head, payload)) = line.split_once(';') else {
        return Err(LineError::new(0, line.len(), "missing `;` after the value tag")
            .with_help(format!("lines look like `<tag>;<payload>` with tag one of {KNOWN_TAGS}")));
    };
    let payload_offset = head.len() + 1;
    let kind = LineKind::classify(head).ok_or_else(|| {
        LineError::new(0, head.len(), format!("unknown value tag `{head}`"))
            .with_help(format!("expected one of {KNOWN_TAGS}"))
    })?;
    match kind {
        LineKind::Scalar(scalar) => {
            let (rest, parsed) = scalar_payload(scalar, payload)?;
            if !rest.is_empty() {
                let at = payload.len() - rest.len();
                return Err(LineError::new(at, rest.len(), "unexpected trailing input")
                    .shifted(payload_offset));
            }
            Ok(parsed)
        }
        LineKind::Composite(container) => {
            composite(container, payload).map_err(|err| err.shifted(payload_offset))
        }
    }
}

fn composite(kind: ContainerKind, payload: &str) -> Result<ExpectedValue, LineError> {
    let mut items = Vec::new();
    if !payload.is_empty() {
        let mut rest = payload;
        loop {
            let at = payload.len() - rest.len();
            let (next, item) = element(rest).map_err(|err| err.shifted(at))?;
            items.push(item);
            if next.is_empty() {
                break;
            }
            let Some(after) = next.strip_prefix(';') else {
                let at = payload.len() - next.len();
                return Err(LineError::new(at, next.len(), "expected `;` between elements"));
            };
            rest = after;
        }
    }
    Ok(match kind {
        ContainerKind::Array => ExpectedValue::Array(items),
        ContainerKind::Tuple => ExpectedValue::Tuple(items),
    })
}

fn element(segment: &str) -> Result<(&str, ExpectedValue), LineError> {
    let tag_len = segment
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .unwrap_or(segment.len());
    let head = &segment[..tag_len];
    let Some(payload) = segment[tag_len..].strip_prefix(',') else {
        let len = segment.find(';').unwrap_or(segment.len());
        return Err(LineError::new(0, len, "malformed composite element")
            .with_help("composite elements are written `<type>,<value>`"));
    };
    let scalar = match LineKind::classify(head) {
        Some(LineKind::Scalar(scalar)) => scalar,
        Some(LineKind::Composite(kind)) => {
            return Err(LineError::new(
                0,
                tag_len,
                format!("`{}` cannot appear inside a composite", kind.name()),
            )
            .with_help("composite elements must be scalar"));
        }
        None => {
            return Err(
                LineError::new(0, tag_len, format!("unknown element tag `{head}`"))
                    .with_help("element tags are int, float, bool, nil or str"),
            );
        }
    };
    scalar_payload(scalar, payload).map_err(|err| err.shifted(tag_len + 1))
}

fn scalar_payload(scalar: ScalarTag, input: &str) -> Result<(&str, ExpectedValue), LineError> {
    let parsed = match scalar {
        ScalarTag::Int => int_literal(input),
        ScalarTag::Float => map(float_literal, ExpectedValue::Float)(input),
        ScalarTag::Bool => map(
            alt((value(true, tag("true")), value(false, tag("false")))),
            ExpectedValue::Bool,
        )(input),
        ScalarTag::Nil => Ok((input, ExpectedValue::Nil)),
        ScalarTag::Str => map(c_string, ExpectedValue::Str)(input),
    };
    parsed.map_err(|err| {
        let at = match &err {
            nom::Err::Error(inner) | nom::Err::Failure(inner) => input.len() - inner.input.len(),
            nom::Err::Incomplete(_) => 0,
        };
        let (message, help) = scalar.describe();
        let len = input[at..].find(';').unwrap_or(input.len() - at);
        LineError::new(at, len, message).with_help(help)
    })
}

fn int_literal(input: &str) -> IResult<&str, ExpectedValue> {
    map_res(recognize(pair(opt(one_of("+-")), digit1)), |digits: &str| {
        digits.parse::<i64>().map(ExpectedValue::Int)
    })(input)
}

fn float_literal(input: &str) -> IResult<&str, f64> {
    alt((special_float, double))(input)
}

/// `inf`, `infinity` and `nan` in any case, optionally signed. The longer
/// spelling is tried first so `infinity` is not cut short at `inf`.
fn special_float(input: &str) -> IResult<&str, f64> {
    map(
        pair(
            opt(one_of("+-")),
            alt((
                value(f64::INFINITY, tag_no_case("infinity")),
                value(f64::INFINITY, tag_no_case("inf")),
                value(f64::NAN, tag_no_case("nan")),
            )),
        ),
        |(sign, magnitude)| if sign == Some('-') { -magnitude } else { magnitude },
    )(input)
}

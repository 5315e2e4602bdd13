use super::AssertionTarget;
use crate::fixture::{literal::to_c_literal, ContainerKind, ExpectedValue};
use std::convert::Infallible;

/// Renders checks as C statements against the runtime's value API.
///
/// Every check goes through `ORACLE_CHECK`, which the suite prelude defines
/// to report and `abort()` on failure.
pub struct CEmitter {
    out: String,
    indent: usize,
    next_temp: usize,
}

impl CEmitter {
    pub fn new(indent: usize) -> Self {
        Self {
            out: String::new(),
            indent,
            next_temp: 0,
        }
    }

    /// Renders the full check of `value_expr` against `expected`.
    pub fn render(value_expr: &str, expected: &ExpectedValue, indent: usize) -> String {
        let mut emitter = Self::new(indent);
        match super::emit(&mut emitter, &value_expr.to_string(), expected) {
            Ok(()) => emitter.out,
            Err(never) => match never {},
        }
    }

    fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn check(&mut self, condition: impl AsRef<str>) {
        self.line(format!("ORACLE_CHECK({});", condition.as_ref()));
    }

    fn temp(&mut self, prefix: &str) -> String {
        let name = format!("_{prefix}{}", self.next_temp);
        self.next_temp += 1;
        name
    }
}

fn type_constant(expected: &ExpectedValue) -> &'static str {
    match expected {
        ExpectedValue::Int(_) => "AU_VALUE_INT",
        ExpectedValue::Float(_) => "AU_VALUE_DOUBLE",
        ExpectedValue::Bool(_) => "AU_VALUE_BOOL",
        ExpectedValue::Nil => "AU_VALUE_NONE",
        ExpectedValue::Str(_) => "AU_VALUE_STR",
        ExpectedValue::Array(_) | ExpectedValue::Tuple(_) => "AU_VALUE_STRUCT",
    }
}

fn object_names(kind: ContainerKind) -> (&'static str, &'static str) {
    match kind {
        ContainerKind::Array => ("au_obj_array", "au_obj_array_vdata"),
        ContainerKind::Tuple => ("au_obj_tuple", "au_obj_tuple_vdata"),
    }
}

/// `i64::MIN` has no literal form in C, so it is spelled as an expression.
pub fn c_int_literal(value: i64) -> String {
    if value == i64::MIN {
        "(-INT64_C(9223372036854775807) - 1)".into()
    } else {
        format!("INT64_C({value})")
    }
}

fn c_float_literal(value: f64) -> String {
    if value.is_infinite() {
        if value > 0.0 {
            "INFINITY".into()
        } else {
            "-INFINITY".into()
        }
    } else {
        // Debug formatting is the shortest round-trip representation and is
        // always a valid C double literal for finite values.
        format!("{value:?}")
    }
}

impl AssertionTarget for CEmitter {
    type Handle = String;
    type Error = Infallible;

    fn scalar(&mut self, value: &String, expected: &ExpectedValue) -> Result<(), Infallible> {
        self.check(format!(
            "au_value_get_type({value}) == {}",
            type_constant(expected)
        ));
        match expected {
            ExpectedValue::Int(want) => {
                self.check(format!(
                    "(int64_t)au_value_get_int({value}) == {}",
                    c_int_literal(*want)
                ));
            }
            ExpectedValue::Float(want) if want.is_nan() => {
                self.check(format!("isnan(au_value_get_double({value}))"));
            }
            ExpectedValue::Float(want) => {
                self.check(format!(
                    "au_value_get_double({value}) == {}",
                    c_float_literal(*want)
                ));
            }
            ExpectedValue::Bool(want) => {
                self.check(format!(
                    "au_value_get_bool({value}) == {}",
                    if *want { 1 } else { 0 }
                ));
            }
            ExpectedValue::Str(want) => {
                let bytes = self.temp("s");
                let len = want.len();
                self.line("{");
                self.indent += 1;
                self.line(format!(
                    "static const char {bytes}[] = {};",
                    to_c_literal(want)
                ));
                self.check(format!(
                    "au_value_get_string({value})->len == {len} && \
                     memcmp(au_value_get_string({value})->data, {bytes}, {len}) == 0"
                ));
                self.indent -= 1;
                self.line("}");
            }
            ExpectedValue::Nil | ExpectedValue::Array(_) | ExpectedValue::Tuple(_) => {}
        }
        Ok(())
    }

    fn container(&mut self, value: &String, kind: ContainerKind) -> Result<(), Infallible> {
        let (_, vdata) = object_names(kind);
        self.check(format!(
            "au_value_get_type({value}) == AU_VALUE_STRUCT && \
             au_value_get_struct({value})->vdata == &{vdata}"
        ));
        Ok(())
    }

    fn element(
        &mut self,
        value: &String,
        kind: ContainerKind,
        index: usize,
    ) -> Result<String, Infallible> {
        let (object, _) = object_names(kind);
        let name = self.temp("v");
        self.line(format!("au_value_t {name};"));
        self.check(format!(
            "{object}_get((struct {object} *)au_value_get_struct({value}), \
             au_value_int({index}), &{name})"
        ));
        Ok(name)
    }

    fn end(&mut self, value: &String, kind: ContainerKind, len: usize) -> Result<(), Infallible> {
        let (object, _) = object_names(kind);
        let extra = self.temp("extra");
        self.line("{");
        self.indent += 1;
        self.line(format!("au_value_t {extra};"));
        self.check(format!(
            "!{object}_get((struct {object} *)au_value_get_struct({value}), \
             au_value_int({len}), &{extra})"
        ));
        self.indent -= 1;
        self.line("}");
        Ok(())
    }

    fn release(&mut self, element: String) {
        self.line(format!("au_value_deref({element});"));
    }
}

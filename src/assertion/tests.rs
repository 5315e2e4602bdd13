use super::*;
use crate::{fixture::parse_transcript, runtime::Value};

fn ints(values: &[i64]) -> Value {
    Value::array(values.iter().copied().map(Value::Int))
}

fn expected_ints(values: &[i64]) -> ExpectedValue {
    ExpectedValue::Array(values.iter().copied().map(ExpectedValue::Int).collect())
}

#[test]
fn array_matches_only_the_exact_sequence() {
    let expected = expected_ints(&[1, 2, 3]);
    assert_eq!(Evaluator::check(&ints(&[1, 2, 3]), &expected), Ok(()));

    let swapped = Evaluator::check(&ints(&[1, 3, 2]), &expected).expect_err("order matters");
    assert_eq!(swapped.path, "[1]");
    assert_eq!(swapped.expected, "int 2");
    assert_eq!(swapped.found, "int 3");

    let short = Evaluator::check(&ints(&[1, 2]), &expected).expect_err("too short");
    assert_eq!(short.path, "");
    assert_eq!(short.expected, "array element at index 2");

    let long = Evaluator::check(&ints(&[1, 2, 3, 4]), &expected).expect_err("too long");
    assert_eq!(long.expected, "array of length 3");
}

#[test]
fn container_kind_is_checked_before_elements() {
    let expected = ExpectedValue::Tuple(vec![ExpectedValue::Int(1)]);
    let err = Evaluator::check(&ints(&[1]), &expected).expect_err("array is not a tuple");
    assert_eq!(err.expected, "tuple");
    assert_eq!(err.found, "array");

    let err = Evaluator::check(&Value::Int(1), &expected).expect_err("scalar is not a tuple");
    assert_eq!(err.found, "int 1");
}

#[test]
fn tuple_elements_are_checked_by_position() {
    let expected = ExpectedValue::Tuple(vec![
        ExpectedValue::Str(b"a".to_vec()),
        ExpectedValue::Bool(true),
    ]);
    let good = Value::tuple([Value::string("a"), Value::Bool(true)]);
    assert_eq!(Evaluator::check(&good, &expected), Ok(()));

    let wrong_str = Value::tuple([Value::string("b"), Value::Bool(true)]);
    let err = Evaluator::check(&wrong_str, &expected).expect_err("payload differs");
    assert_eq!(err.path, "[0]");

    let wrong_bool = Value::tuple([Value::string("a"), Value::Bool(false)]);
    let err = Evaluator::check(&wrong_bool, &expected).expect_err("payload differs");
    assert_eq!(err.path, "[1]");
    assert_eq!(err.found, "bool false");

    let wrong_type = Value::tuple([Value::string("a"), Value::Int(1)]);
    let err = Evaluator::check(&wrong_type, &expected).expect_err("type differs");
    assert_eq!(err.path, "[1]");
    assert_eq!(err.expected, "bool true");
}

#[test]
fn floats_compare_exactly() {
    let expected = ExpectedValue::Float(0.3);
    assert!(Evaluator::check(&Value::Float(0.1 + 0.2), &expected).is_err());
    assert_eq!(Evaluator::check(&Value::Float(0.3), &expected), Ok(()));
    assert!(Evaluator::check(&Value::Int(0), &ExpectedValue::Float(0.0)).is_err());
}

#[test]
fn nan_expectation_accepts_any_nan() {
    let expected = ExpectedValue::Float(f64::NAN);
    assert_eq!(Evaluator::check(&Value::Float(-f64::NAN), &expected), Ok(()));
    assert!(Evaluator::check(&Value::Float(1.0), &expected).is_err());
    assert!(Evaluator::check(&Value::Float(f64::NAN), &ExpectedValue::Float(1.0)).is_err());
}

#[test]
fn scalar_tags_must_agree() {
    assert_eq!(Evaluator::check(&Value::Unit, &ExpectedValue::Nil), Ok(()));
    assert!(Evaluator::check(&Value::Int(1), &ExpectedValue::Float(1.0)).is_err());
    let err = Evaluator::check(&Value::Opaque("function"), &ExpectedValue::Nil)
        .expect_err("opaque is not nil");
    assert_eq!(err.found, "other");
    assert!(Evaluator::check(&Value::string([0xffu8, 0]), &ExpectedValue::Str(vec![0xff, 0])).is_ok());
}

/// Records the order in which `emit` drives a target.
#[derive(Default)]
struct Trace {
    events: Vec<String>,
    fail_at: Option<usize>,
}

impl AssertionTarget for Trace {
    type Handle = usize;
    type Error = usize;

    fn scalar(&mut self, value: &usize, _expected: &ExpectedValue) -> Result<(), usize> {
        self.events.push(format!("scalar {value}"));
        match self.fail_at {
            Some(at) if at == *value => Err(at),
            _ => Ok(()),
        }
    }

    fn container(&mut self, _value: &usize, kind: ContainerKind) -> Result<(), usize> {
        self.events.push(format!("container {}", kind.name()));
        Ok(())
    }

    fn element(&mut self, _value: &usize, _kind: ContainerKind, index: usize) -> Result<usize, usize> {
        self.events.push(format!("element {index}"));
        Ok(index)
    }

    fn end(&mut self, _value: &usize, _kind: ContainerKind, len: usize) -> Result<(), usize> {
        self.events.push(format!("end {len}"));
        Ok(())
    }

    fn release(&mut self, element: usize) {
        self.events.push(format!("release {element}"));
    }
}

#[test]
fn emit_releases_elements_even_when_a_check_fails() {
    let expected = expected_ints(&[1, 2]);
    let mut trace = Trace {
        fail_at: Some(1),
        ..Trace::default()
    };
    assert_eq!(emit(&mut trace, &0, &expected), Err(1));
    assert_eq!(
        trace.events,
        vec![
            "container array",
            "element 0",
            "scalar 0",
            "release 0",
            "element 1",
            "scalar 1",
            "release 1",
        ]
    );
}

#[test]
fn c_emitter_renders_scalar_checks() {
    assert_eq!(
        CEmitter::render("v", &ExpectedValue::Int(5), 1),
        "    ORACLE_CHECK(au_value_get_type(v) == AU_VALUE_INT);\n    \
         ORACLE_CHECK((int64_t)au_value_get_int(v) == INT64_C(5));\n"
    );
    let nan = CEmitter::render("v", &ExpectedValue::Float(f64::NAN), 0);
    assert!(nan.contains("ORACLE_CHECK(isnan(au_value_get_double(v)));"));
    let float = CEmitter::render("v", &ExpectedValue::Float(1.5), 0);
    assert!(float.contains("au_value_get_double(v) == 1.5"));
    let nil = CEmitter::render("v", &ExpectedValue::Nil, 0);
    assert_eq!(nil, "ORACLE_CHECK(au_value_get_type(v) == AU_VALUE_NONE);\n");
}

#[test]
fn c_emitter_spells_infinities_with_the_math_macro() {
    let transcript = parse_transcript(
        std::path::Path::new("inf.out"),
        "float;inf\nfloat;-inf\nfloat;infinity\ntuple;float,-inf;float,inf\n",
    )
    .expect("transcript parses");
    assert_eq!(
        CEmitter::render("v", &transcript[0], 0),
        "ORACLE_CHECK(au_value_get_type(v) == AU_VALUE_DOUBLE);\n\
         ORACLE_CHECK(au_value_get_double(v) == INFINITY);\n"
    );
    assert!(CEmitter::render("v", &transcript[1], 0).contains("au_value_get_double(v) == -INFINITY"));
    assert_eq!(
        CEmitter::render("v", &transcript[2], 0),
        CEmitter::render("v", &transcript[0], 0)
    );
    let tuple = CEmitter::render("v", &transcript[3], 0);
    assert!(tuple.contains("au_value_get_double(_v0) == -INFINITY"));
    assert!(tuple.contains("au_value_get_double(_v1) == INFINITY"));
}

#[test]
fn c_emitter_embeds_strings_as_literals() {
    let rendered = CEmitter::render("v", &ExpectedValue::Str(b"a\"b".to_vec()), 0);
    assert!(rendered.contains(r#"static const char _s0[] = "a\"b";"#));
    assert!(rendered.contains("au_value_get_string(v)->len == 3"));
    assert!(rendered.contains("memcmp(au_value_get_string(v)->data, _s0, 3) == 0"));
}

#[test]
fn c_emitter_walks_composites_with_exact_arity() {
    let expected = ExpectedValue::Tuple(vec![ExpectedValue::Bool(true), ExpectedValue::Nil]);
    let rendered = CEmitter::render("value", &expected, 0);
    assert!(rendered.contains("au_value_get_struct(value)->vdata == &au_obj_tuple_vdata"));
    assert!(rendered.contains(
        "au_obj_tuple_get((struct au_obj_tuple *)au_value_get_struct(value), au_value_int(0), &_v0)"
    ));
    assert!(rendered.contains("ORACLE_CHECK(au_value_get_bool(_v0) == 1);"));
    assert!(rendered.contains("au_value_deref(_v0);"));
    assert!(rendered.contains("au_value_int(1), &_v1)"));
    assert!(rendered.contains(
        "ORACLE_CHECK(!au_obj_tuple_get((struct au_obj_tuple *)au_value_get_struct(value), au_value_int(2), &_extra2));"
    ));
    let checks = rendered.matches("ORACLE_CHECK(").count();
    // container, 2x (get + type) + bool payload, no extra element
    assert_eq!(checks, 7);
}

#[test]
fn int_min_has_an_expression_literal() {
    assert_eq!(c_int_literal(i64::MIN), "(-INT64_C(9223372036854775807) - 1)");
    assert_eq!(c_int_literal(-3), "INT64_C(-3)");
}

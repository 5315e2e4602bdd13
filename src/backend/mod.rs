//! C rendering shared by the interpreted and compiled suites.
//!
//! Both suites embed the same per-fixture sink: a cursor `test_<i>_idx`
//! and a hook `test_<i>_check` that checks the value at the cursor and
//! advances it. Only the code around the sink differs.

pub mod compiled;
pub mod interpreted;

use crate::{
    assertion::CEmitter,
    fixture::{literal::to_c_literal, Fixture},
};
use std::fmt::Write;

/// Runtime headers needed by code that links against the full runtime.
pub(crate) const RUNTIME_INCLUDES: &[&str] = &[
    "core/bc.h",
    "core/parser/parser.h",
    "core/program.h",
    "core/rt/exception.h",
    "core/rt/au_array.h",
    "core/rt/au_tuple.h",
    "core/rt/malloc.h",
    "core/vm/vm.h",
];

const SYSTEM_INCLUDES: &[&str] = &[
    "math.h", "stddef.h", "stdint.h", "stdio.h", "stdlib.h", "string.h",
];

pub(crate) fn write_includes(out: &mut String, local: &[&str]) {
    for header in SYSTEM_INCLUDES {
        let _ = writeln!(out, "#include <{header}>");
    }
    if !local.is_empty() {
        out.push('\n');
    }
    for header in local {
        let _ = writeln!(out, "#include \"{header}\"");
    }
    out.push('\n');
}

/// Failure reporting used by every generated check.
///
/// `ORACLE_CHECK` is not `assert`: it stays active under `NDEBUG`.
pub(crate) fn write_check_support(out: &mut String) {
    out.push_str(
        r#"static const char *oracle_fixture = "";
static int oracle_index = -1;

static void oracle_fail(const char *what) {
    if (oracle_index < 0)
        fprintf(stderr, "%s: %s\n", oracle_fixture, what);
    else
        fprintf(stderr, "%s: value #%d: %s\n", oracle_fixture, oracle_index, what);
    fflush(stderr);
    abort();
}

#define ORACLE_CHECK(cond)                                                     \
    do {                                                                       \
        if (!(cond))                                                           \
            oracle_fail("check failed: " #cond);                               \
    } while (0)

"#,
    );
}

pub(crate) fn sink_name(index: usize) -> String {
    format!("test_{index}_check")
}

/// Renders the cursor and sink for fixture `index`.
///
/// A value arriving after the transcript is exhausted fails before any
/// comparison runs.
pub(crate) fn write_sink(out: &mut String, index: usize, fixture: &Fixture) {
    let cursor = format!("test_{index}_idx");
    let count = fixture.expected.len();
    let _ = writeln!(out, "static int {cursor} = 0;");
    let _ = writeln!(out, "static void {}(au_value_t value) {{", sink_name(index));
    let _ = writeln!(out, "    oracle_fixture = {};", c_str(&fixture.name));
    let _ = writeln!(out, "    oracle_index = {cursor};");
    let _ = writeln!(out, "    if ({cursor} >= {count})");
    let _ = writeln!(
        out,
        "        oracle_fail(\"value emitted past the end of the transcript ({count} expected)\");"
    );
    let _ = writeln!(out, "    switch ({cursor}) {{");
    for (position, expected) in fixture.expected.iter().enumerate() {
        let _ = writeln!(out, "    case {position}: {{");
        out.push_str(&CEmitter::render("value", expected, 2));
        out.push_str("        break;\n");
        out.push_str("    }\n");
    }
    out.push_str("    }\n");
    let _ = writeln!(out, "    {cursor}++;");
    out.push_str("}\n\n");
}

/// Progress line printed before a fixture runs.
pub(crate) fn write_progress(out: &mut String, indent: &str, position: usize, total: usize, fixture: &str) {
    let line = format!("[{}/{total}] {fixture}", position + 1);
    let _ = writeln!(out, "{indent}puts({});", c_str(&line));
    let _ = writeln!(out, "{indent}fflush(stdout);");
}

pub(crate) fn c_str(text: &str) -> String {
    to_c_literal(text.as_bytes())
}

/// Brace initializer for a byte array; C has no empty initializer list
/// before C23, so empty input renders as `{0}`.
pub(crate) fn byte_array(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "{0}".into();
    }
    let mut out = String::from("{");
    for (idx, byte) in bytes.iter().enumerate() {
        if idx > 0 {
            out.push(',');
            if idx % 24 == 0 {
                out.push_str("\n        ");
            }
        }
        let _ = write!(out, "{byte}");
    }
    out.push('}');
    out
}

//! Interpreted backend: every fixture runs in one process, one after the
//! other, with a fresh execution context each.

use super::{
    byte_array, c_str, sink_name, write_check_support, write_includes, write_progress, write_sink,
    RUNTIME_INCLUDES,
};
use crate::{
    assertion::Evaluator,
    error::{OracleError, OracleResult},
    fixture::Fixture,
    runtime::ValueHandle,
};
use std::{fmt, fmt::Write as _, io, ops::ControlFlow};
use tracing::{debug, warn};

/// Renders `tests.c`: all sinks, one runner per fixture and a `main` that
/// runs them in order.
pub fn generate_suite(fixtures: &[Fixture]) -> String {
    let mut out = String::from("/* Generated by fixture-oracle. Do not edit. */\n\n");
    write_includes(&mut out, RUNTIME_INCLUDES);
    write_check_support(&mut out);
    for (index, fixture) in fixtures.iter().enumerate() {
        write_sink(&mut out, index, fixture);
    }
    for (index, fixture) in fixtures.iter().enumerate() {
        write_runner(&mut out, index, fixture);
    }
    out.push_str("int main(void) {\n");
    for (index, fixture) in fixtures.iter().enumerate() {
        write_progress(&mut out, "    ", index, fixtures.len(), &fixture.name);
        let _ = writeln!(out, "    test_{index}();");
    }
    out.push_str("    return 0;\n}\n");
    out
}

fn write_runner(out: &mut String, index: usize, fixture: &Fixture) {
    let len = fixture.program.len();
    let _ = writeln!(out, "static void test_{index}(void) {{");
    let _ = writeln!(
        out,
        "    static const unsigned char source[] = {};",
        byte_array(&fixture.program)
    );
    out.push_str("    struct au_program program;\n");
    out.push_str("    struct au_vm_thread_local tl;\n");
    let _ = writeln!(out, "    oracle_fixture = {};", c_str(&fixture.name));
    out.push_str("    oracle_index = -1;\n");
    let _ = writeln!(
        out,
        "    ORACLE_CHECK(au_parse((const char *)source, {len}, &program).type == AU_PARSER_RES_OK);"
    );
    out.push_str("    au_malloc_init();\n");
    out.push_str("    au_vm_thread_local_init(&tl, &program.data);\n");
    out.push_str("    au_vm_thread_local_set(&tl);\n");
    let _ = writeln!(out, "    tl.print_fn = {};", sink_name(index));
    out.push_str(
        "    au_vm_thread_local_install_stdlib(&tl);
    au_malloc_set_collect(1);
    au_vm_exec_unverified_main(&tl, &program);
#ifdef AU_FEAT_DELAYED_RC
    au_vm_thread_local_del_const_cache(&tl);
    au_obj_malloc_collect();
#endif
    au_malloc_set_collect(0);
    au_program_del(&program);
    au_vm_thread_local_del(&tl);
    au_vm_thread_local_set(0);
}

",
    );
}

/// An interpreter hosted in Rust.
///
/// `execute` calls `hook` once per emitted value, in emission order, and
/// should stop early when the hook breaks.
pub trait Interpreter {
    type Value: ValueHandle;
    type Program;
    type Error: fmt::Display;

    fn parse(&mut self, source: &[u8]) -> Result<Self::Program, Self::Error>;

    fn execute(
        &mut self,
        program: &Self::Program,
        stdin: Option<&[u8]>,
        hook: &mut dyn FnMut(Self::Value) -> ControlFlow<()>,
    ) -> Result<(), Self::Error>;
}

/// In-process sink for one fixture: a cursor over its expected values.
#[derive(Debug)]
pub struct AssertionUnit<'a> {
    fixture: &'a Fixture,
    cursor: usize,
}

impl<'a> AssertionUnit<'a> {
    pub fn new(fixture: &'a Fixture) -> Self {
        Self { fixture, cursor: 0 }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Checks one emitted value against the expectation at the cursor.
    pub fn accept<V: ValueHandle>(&mut self, value: &V) -> OracleResult<()> {
        let index = self.cursor;
        let Some(expected) = self.fixture.expected.get(index) else {
            return Err(OracleError::OverProduction {
                fixture: self.fixture.name.clone(),
                index,
                expected: self.fixture.expected.len(),
            });
        };
        Evaluator::check(value, expected).map_err(|mismatch| OracleError::ValueMismatch {
            fixture: self.fixture.name.clone(),
            index,
            path: mismatch.path,
            expected: mismatch.expected,
            found: mismatch.found,
        })?;
        self.cursor += 1;
        Ok(())
    }

    /// Ends the run. Values left unconsumed are logged, not failed.
    pub fn finish(self) -> usize {
        let expected = self.fixture.expected.len();
        if self.cursor < expected {
            warn!(
                fixture = %self.fixture.name,
                emitted = self.cursor,
                expected,
                "program emitted fewer values than its transcript lists"
            );
        }
        self.cursor
    }
}

/// Parses and executes one fixture on `interpreter`, checking every value.
pub fn run_fixture<I: Interpreter>(interpreter: &mut I, fixture: &Fixture) -> OracleResult<()> {
    let runtime_error = |error: I::Error| OracleError::Runtime {
        fixture: fixture.name.clone(),
        message: error.to_string(),
    };
    let program = interpreter.parse(&fixture.program).map_err(runtime_error)?;
    let mut unit = AssertionUnit::new(fixture);
    let mut failure = None;
    let executed = interpreter.execute(&program, fixture.stdin.as_deref(), &mut |value| {
        if failure.is_some() {
            return ControlFlow::Break(());
        }
        match unit.accept(&value) {
            Ok(()) => ControlFlow::Continue(()),
            Err(error) => {
                failure = Some(error);
                ControlFlow::Break(())
            }
        }
    });
    if let Some(error) = failure {
        return Err(error);
    }
    executed.map_err(runtime_error)?;
    let consumed = unit.finish();
    debug!(fixture = %fixture.name, consumed, "fixture passed");
    Ok(())
}

/// Runs every fixture in order on a fresh interpreter from `make`,
/// printing `[i/N] name` before each one. Stops at the first failure.
pub fn run_sequential<I, F, W>(fixtures: &[Fixture], mut make: F, progress: &mut W) -> OracleResult<usize>
where
    I: Interpreter,
    F: FnMut() -> I,
    W: io::Write,
{
    let total = fixtures.len();
    for (index, fixture) in fixtures.iter().enumerate() {
        writeln!(progress, "[{}/{total}] {}", index + 1, fixture.name)
            .and_then(|()| progress.flush())
            .map_err(|error| OracleError::io("<progress>", error))?;
        let mut interpreter = make();
        run_fixture(&mut interpreter, fixture)?;
    }
    Ok(total)
}

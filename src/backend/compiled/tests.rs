use super::*;
use crate::{
    config::{FeatureFlags, FixtureSettings, OracleConfig, ToolchainSettings},
    error::{OracleError, OracleResult},
    fixture::Fixture,
    tests::fixture,
};
use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
};
use tempfile::tempdir;

struct FixedTranslator(&'static str);

impl Translator for FixedTranslator {
    fn translate(&self, _fixture: &Fixture) -> OracleResult<Vec<u8>> {
        Ok(self.0.as_bytes().to_vec())
    }
}

/// Records every call and the scratch paths it saw.
#[derive(Default)]
struct FakeToolchain {
    compile_status: Option<i32>,
    run_status: Option<i32>,
    spawn_fails: bool,
    seen: RefCell<Vec<PathBuf>>,
    calls: RefCell<Vec<&'static str>>,
    stdin: RefCell<Option<Vec<u8>>>,
}

impl FakeToolchain {
    fn passing() -> Self {
        Self {
            compile_status: Some(0),
            run_status: Some(0),
            ..Self::default()
        }
    }
}

impl Toolchain for FakeToolchain {
    fn compile(&self, output: &Path, inputs: &[&Path]) -> OracleResult<RunOutcome> {
        self.calls.borrow_mut().push("compile");
        for path in std::iter::once(output).chain(inputs.iter().copied()) {
            assert!(path.exists(), "{} should exist while compiling", path.display());
            self.seen.borrow_mut().push(path.to_path_buf());
        }
        let companion = fs::read_to_string(inputs[1]).expect("companion readable");
        assert!(companion.contains("void __au_value_print(au_value_t value)"));
        Ok(RunOutcome {
            exit_code: self.compile_status,
            stdout: Vec::new(),
            stderr: b"cc output".to_vec(),
        })
    }

    fn spawn(&self, executable: &Path, stdin: Option<&[u8]>) -> OracleResult<RunOutcome> {
        self.calls.borrow_mut().push("spawn");
        *self.stdin.borrow_mut() = stdin.map(<[u8]>::to_vec);
        if self.spawn_fails {
            return Err(OracleError::io(
                executable,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "not executable"),
            ));
        }
        Ok(RunOutcome {
            exit_code: self.run_status,
            stdout: Vec::new(),
            stderr: Vec::new(),
        })
    }
}

fn assert_scratch_released(toolchain: &FakeToolchain) {
    let seen = toolchain.seen.borrow();
    assert_eq!(seen.len(), 3);
    for path in seen.iter() {
        assert!(!path.exists(), "{} was not cleaned up", path.display());
    }
}

#[test]
fn passing_run_cleans_up() {
    let fx = fixture("tests/features/ok.out", "int;1\n", "print 1;");
    let toolchain = FakeToolchain::passing();
    let outcome = run_fixture(0, &fx, &FixedTranslator("int main(void){return 0;}"), &toolchain)
        .expect("fixture passes");
    assert!(outcome.passed());
    assert_eq!(*toolchain.calls.borrow(), vec!["compile", "spawn"]);
    assert_scratch_released(&toolchain);
}

#[test]
fn compile_failure_skips_execution_and_cleans_up() {
    let fx = fixture("tests/features/cc.out", "int;1\n", "print 1;");
    let toolchain = FakeToolchain {
        compile_status: Some(1),
        ..FakeToolchain::default()
    };
    let err = run_fixture(0, &fx, &FixedTranslator(""), &toolchain).expect_err("compile fails");
    match err {
        OracleError::Toolchain { stage, outcome, .. } => {
            assert_eq!(stage, Stage::Compile);
            assert_eq!(outcome.stderr, b"cc output");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(*toolchain.calls.borrow(), vec!["compile"]);
    assert_scratch_released(&toolchain);
}

#[test]
fn failing_binary_is_an_execute_failure() {
    let fx = fixture("tests/features/abort.out", "int;1\n", "print 2;");
    let toolchain = FakeToolchain {
        compile_status: Some(0),
        run_status: None,
        ..FakeToolchain::default()
    };
    let err = run_fixture(0, &fx, &FixedTranslator(""), &toolchain).expect_err("binary aborts");
    assert!(matches!(
        err,
        OracleError::Toolchain {
            stage: Stage::Execute,
            ..
        }
    ));
    assert!(err.to_string().contains("terminated by a signal"));
    assert_scratch_released(&toolchain);
}

#[test]
fn spawn_errors_still_clean_up() {
    let fx = fixture("tests/features/spawn.out", "int;1\n", "print 1;");
    let toolchain = FakeToolchain {
        compile_status: Some(0),
        spawn_fails: true,
        ..FakeToolchain::default()
    };
    let err = run_fixture(0, &fx, &FixedTranslator(""), &toolchain).expect_err("spawn fails");
    assert!(matches!(err, OracleError::Io { .. }));
    assert_scratch_released(&toolchain);
}

#[test]
fn stdin_fixture_is_forwarded() {
    let mut fx = fixture("tests/features/input.out", "str;\"abc\"\n", "print input();");
    fx.stdin = Some(b"abc\n".to_vec());
    let toolchain = FakeToolchain::passing();
    run_fixture(0, &fx, &FixedTranslator(""), &toolchain).expect("fixture passes");
    assert_eq!(toolchain.stdin.borrow().as_deref(), Some(&b"abc\n"[..]));
}

#[test]
fn count_selector_never_touches_fixtures() {
    let transcripts = vec![PathBuf::from("/nowhere/a.out"), PathBuf::from("/nowhere/b.out")];
    let toolchain = FakeToolchain::passing();
    let result = dispatch(
        -1,
        &transcripts,
        &FixtureSettings::default(),
        &FixedTranslator(""),
        &toolchain,
    )
    .expect("count");
    assert_eq!(result, Dispatch::Count(2));
    assert!(toolchain.calls.borrow().is_empty());
}

#[test]
fn selectors_outside_the_suite_are_rejected() {
    assert_eq!(Selector::resolve(-1, 0).expect("count"), Selector::Count);
    assert_eq!(Selector::resolve(2, 3).expect("last"), Selector::Fixture(2));
    for raw in [-2, 3, i64::MAX] {
        let err = Selector::resolve(raw, 3).expect_err("out of range");
        assert!(matches!(
            err,
            OracleError::SelectorOutOfRange { selector, count: 3 } if selector == raw
        ));
    }
}

#[test]
fn selector_runs_exactly_one_fixture() {
    let dir = tempdir().expect("tempdir");
    for name in ["a", "b"] {
        fs::write(dir.path().join(format!("{name}.out")), "int;1\n").expect("write transcript");
        fs::write(dir.path().join(format!("{name}.au")), "print 1;").expect("write program");
    }
    let settings = FixtureSettings {
        root: dir.path().to_path_buf(),
        ..FixtureSettings::default()
    };
    let transcripts = crate::fixture::discover(&settings).expect("discover");
    let toolchain = FakeToolchain::passing();
    let result = dispatch(1, &transcripts, &settings, &FixedTranslator(""), &toolchain)
        .expect("selector runs");
    match result {
        Dispatch::Ran { fixture, outcome } => {
            assert!(fixture.ends_with("b.out"));
            assert!(outcome.passed());
        }
        other => panic!("unexpected dispatch {other:?}"),
    }
    assert_eq!(*toolchain.calls.borrow(), vec!["compile", "spawn"]);
}

#[test]
fn translator_argv_substitutes_the_program() {
    let program = Path::new("tests/features/a.au");
    let templated = CommandTranslator::new(vec!["tr".into(), "--in={program}".into(), "-c".into()]);
    assert_eq!(
        templated.command_line(program),
        vec!["tr", "--in=tests/features/a.au", "-c"]
    );
    let appended = CommandTranslator::from_settings(&ToolchainSettings::default());
    assert_eq!(
        appended.command_line(program),
        vec!["aument", "build", "--emit-c", "tests/features/a.au"]
    );
}

#[test]
fn empty_translator_is_a_config_error() {
    let fx = fixture("a.out", "", "");
    let err = CommandTranslator::new(Vec::new())
        .translate(&fx)
        .expect_err("no command");
    assert!(matches!(err, OracleError::Config { .. }));
}

#[test]
fn cc_command_links_inputs_with_the_archive() {
    let settings = ToolchainSettings {
        cc: "clang".into(),
        runtime_archive: PathBuf::from("build/libau_runtime.a"),
        include_dirs: vec![PathBuf::from("src")],
        ..ToolchainSettings::default()
    };
    let features = FeatureFlags {
        coverage: true,
        math_lib: true,
        ..FeatureFlags::default()
    };
    let toolchain = CcToolchain::new(&settings, &features);
    let command = toolchain.compile_command(Path::new("out"), &[Path::new("gen.c"), Path::new("sink.c")]);
    assert_eq!(command.get_program(), "clang");
    let args: Vec<String> = command
        .get_args()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        args,
        vec![
            "-Isrc",
            "-fprofile-arcs",
            "-ftest-coverage",
            "-o",
            "out",
            "gen.c",
            "sink.c",
            "build/libau_runtime.a",
            "-lm",
        ]
    );
}

#[test]
fn companion_flavors_differ_only_in_headers() {
    let fx = fixture("tests/features/c.out", "bool;true\n", "");
    let spliced = companion_unit(3, &fx, Flavor::Spliced);
    let standalone = companion_unit(3, &fx, Flavor::Standalone);
    assert!(!spliced.contains("#include \"core/rt/value.h\""));
    assert!(standalone.contains("#include \"core/rt/value.h\""));
    for unit in [&spliced, &standalone] {
        assert!(unit.contains("static void test_3_check(au_value_t value)"));
        assert!(unit.contains("void __au_value_print(au_value_t value) {\n    test_3_check(value);\n}"));
    }
}

#[test]
fn compiled_suite_exposes_the_selector_protocol() {
    let fixtures = vec![
        fixture("tests/features/a.out", "int;1\n", "print 1;"),
        fixture("tests/features/b.out", "nil;\n", "print nil;"),
    ];
    let mut config = OracleConfig::default();
    config.toolchain.runtime_archive = PathBuf::from("/opt/au/libau_runtime.a");
    config.features.libdl = true;
    let suite = generate_suite(&fixtures, &config);

    assert!(suite.contains("#ifndef AU_FEAT_LIBDL\n#define AU_FEAT_LIBDL\n#endif"));
    assert!(suite.contains("extern char *TEST_RT_CODE;"));
    assert!(suite.contains("cc._stdlib_cache = au_data_strdup(\"/opt/au/libau_runtime.a\");"));
    assert_eq!(suite.matches("\ncleanup:\n").count(), 1);

    let spliced = companion_unit(1, &fixtures[1], Flavor::Spliced);
    assert!(suite.contains(&format!("TEST_RT_CODE_LEN = {};", spliced.len())));
    assert!(suite.contains("return run_compiled(\"tests/features/b.out\", (const char *)source, 10);"));

    let main = &suite[suite.find("int main(int argc, char **argv)").expect("main")..];
    let count = main.find("printf(\"%d\", 2);").expect("count branch");
    let range = main.find("sel < 0 || sel >= 2").expect("range check");
    let setup = main.find("setup();").expect("setup");
    assert!(count < range && range < setup);
    assert!(main.contains("return 2;"));
    assert!(main.contains("case 1:\n        puts(\"[2/2] tests/features/b.out\");"));
    assert!(main.contains("status = test_1();"));
}

#[test]
fn outcome_status_descriptions() {
    let signalled = RunOutcome {
        exit_code: None,
        stdout: Vec::new(),
        stderr: Vec::new(),
    };
    assert!(!signalled.passed());
    assert_eq!(signalled.describe_status(), "terminated by a signal");
    let failed = RunOutcome {
        exit_code: Some(3),
        ..signalled
    };
    assert_eq!(failed.describe_status(), "exit status 3");
    assert_eq!(Stage::Translate.to_string(), "translate");
}

#[test]
fn outcome_keeps_child_streams_apart() {
    let outcome = RunOutcome {
        exit_code: Some(1),
        stdout: b"[1/1] tests/features/a.out\n".to_vec(),
        stderr: b"value #0: check failed\n".to_vec(),
    };
    let (mut out, mut err) = (Vec::new(), Vec::new());
    outcome.forward(&mut out, &mut err).expect("forward");
    assert_eq!(out, b"[1/1] tests/features/a.out\n");
    assert_eq!(err, b"value #0: check failed\n");
}

#[cfg(unix)]
#[test]
fn process_output_is_not_merged() {
    use std::os::unix::process::ExitStatusExt;
    let outcome = RunOutcome::from_output(std::process::Output {
        status: std::process::ExitStatus::from_raw(0),
        stdout: b"out".to_vec(),
        stderr: b"err".to_vec(),
    });
    assert!(outcome.passed());
    assert_eq!(outcome.stdout, b"out");
    assert_eq!(outcome.stderr, b"err");
}

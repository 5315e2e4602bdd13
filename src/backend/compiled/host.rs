//! Host-side rendition of the compiled runner for translators that ship
//! as a command rather than a C entry point.

use super::{
    codegen::{companion_unit, Flavor},
    flags::ToolchainFlags,
};
use crate::{
    config::{FeatureFlags, FixtureSettings, ToolchainSettings, CONFIG_FILE},
    error::{OracleError, OracleResult},
    fixture::Fixture,
};
use std::{
    env, fmt,
    io::{self, Write},
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
    thread,
};
use tempfile::{Builder, TempPath};
use tracing::{debug, info};

const PROGRAM_PLACEHOLDER: &str = "{program}";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Translate,
    Compile,
    Execute,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Translate => "translate",
            Stage::Compile => "compile",
            Stage::Execute => "execute",
        };
        f.write_str(name)
    }
}

/// Result of one child process. `exit_code` is `None` when the process was
/// killed by a signal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl RunOutcome {
    pub fn passed(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn describe_status(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by a signal".into(),
        }
    }

    /// Replays the child's streams onto ours, each on its own side.
    pub fn forward(&self, stdout: &mut impl Write, stderr: &mut impl Write) -> io::Result<()> {
        stdout.write_all(&self.stdout)?;
        stdout.flush()?;
        stderr.write_all(&self.stderr)?;
        stderr.flush()
    }

    pub(crate) fn from_output(output: Output) -> Self {
        Self {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

pub trait Translator {
    /// Produces the native source for `fixture`'s program.
    fn translate(&self, fixture: &Fixture) -> OracleResult<Vec<u8>>;
}

/// Runs an argv template; the translated source is read from stdout.
#[derive(Clone, Debug)]
pub struct CommandTranslator {
    argv: Vec<String>,
}

impl CommandTranslator {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    pub fn from_settings(settings: &ToolchainSettings) -> Self {
        Self::new(settings.translator.clone())
    }

    /// Substitutes `{program}`, appending the path when no argument names it.
    pub fn command_line(&self, program: &Path) -> Vec<String> {
        let program = program.display().to_string();
        let mut args: Vec<String> = self
            .argv
            .iter()
            .map(|arg| arg.replace(PROGRAM_PLACEHOLDER, &program))
            .collect();
        if !self.argv.iter().any(|arg| arg.contains(PROGRAM_PLACEHOLDER)) {
            args.push(program);
        }
        args
    }
}

impl Translator for CommandTranslator {
    fn translate(&self, fixture: &Fixture) -> OracleResult<Vec<u8>> {
        let args = self.command_line(&fixture.program_path);
        let Some((program, rest)) = args.split_first() else {
            return Err(OracleError::Config {
                path: PathBuf::from(CONFIG_FILE),
                message: "toolchain.translator must name a command".into(),
            });
        };
        debug!(fixture = %fixture.name, command = ?args, "translating");
        let output = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .output()
            .map_err(|error| OracleError::io(program, error))?;
        if !output.status.success() {
            return Err(OracleError::Toolchain {
                fixture: fixture.name.clone(),
                stage: Stage::Translate,
                outcome: RunOutcome::from_output(output),
            });
        }
        Ok(output.stdout)
    }
}

pub trait Toolchain {
    /// Links `inputs` with the runtime into `output`.
    fn compile(&self, output: &Path, inputs: &[&Path]) -> OracleResult<RunOutcome>;

    /// Runs `executable` with no arguments.
    fn spawn(&self, executable: &Path, stdin: Option<&[u8]>) -> OracleResult<RunOutcome>;
}

/// A C compiler driven through `std::process::Command`.
#[derive(Clone, Debug)]
pub struct CcToolchain {
    cc: String,
    runtime_archive: PathBuf,
    flags: ToolchainFlags,
}

impl CcToolchain {
    pub fn new(settings: &ToolchainSettings, features: &FeatureFlags) -> Self {
        Self {
            cc: settings.cc.clone(),
            runtime_archive: settings.runtime_archive.clone(),
            flags: ToolchainFlags::for_toolchain(settings, features),
        }
    }

    pub fn compile_command(&self, output: &Path, inputs: &[&Path]) -> Command {
        let mut command = Command::new(&self.cc);
        command.args(&self.flags.cflags).arg("-o").arg(output);
        command.args(inputs);
        command.arg(&self.runtime_archive).args(&self.flags.ldflags);
        command
    }
}

impl Toolchain for CcToolchain {
    fn compile(&self, output: &Path, inputs: &[&Path]) -> OracleResult<RunOutcome> {
        let result = self
            .compile_command(output, inputs)
            .stdin(Stdio::null())
            .output()
            .map_err(|error| OracleError::io(&self.cc, error))?;
        Ok(RunOutcome::from_output(result))
    }

    fn spawn(&self, executable: &Path, stdin: Option<&[u8]>) -> OracleResult<RunOutcome> {
        let mut child = Command::new(executable)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| OracleError::io(executable, error))?;
        let feeder = match (child.stdin.take(), stdin) {
            (Some(mut pipe), Some(bytes)) => {
                let bytes = bytes.to_vec();
                // A child that exits without reading leaves a broken pipe.
                Some(thread::spawn(move || {
                    let _ = pipe.write_all(&bytes);
                }))
            }
            _ => None,
        };
        let output = child
            .wait_with_output()
            .map_err(|error| OracleError::io(executable, error))?;
        if let Some(feeder) = feeder {
            let _ = feeder.join();
        }
        Ok(RunOutcome::from_output(output))
    }
}

/// Temporary files for one compiled run, deleted when dropped.
#[derive(Debug)]
pub struct Scratch {
    source: TempPath,
    companion: TempPath,
    executable: TempPath,
}

impl Scratch {
    pub fn acquire(generated: &[u8], companion: &[u8]) -> OracleResult<Self> {
        Ok(Self {
            source: temp_file(".c", generated)?,
            companion: temp_file(".c", companion)?,
            executable: temp_file(env::consts::EXE_SUFFIX, &[])?,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn companion(&self) -> &Path {
        &self.companion
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

fn temp_file(suffix: &str, contents: &[u8]) -> OracleResult<TempPath> {
    let mut file = Builder::new()
        .prefix("fixture-oracle-")
        .suffix(suffix)
        .tempfile()
        .map_err(|error| OracleError::io(env::temp_dir(), error))?;
    file.write_all(contents)
        .and_then(|()| file.flush())
        .map_err(|error| OracleError::io(file.path(), error))?;
    Ok(file.into_temp_path())
}

/// Translates, compiles and runs fixture `index`. Scratch files are gone
/// when this returns, whatever the result.
pub fn run_fixture<T, C>(
    index: usize,
    fixture: &Fixture,
    translator: &T,
    toolchain: &C,
) -> OracleResult<RunOutcome>
where
    T: Translator + ?Sized,
    C: Toolchain + ?Sized,
{
    let generated = translator.translate(fixture)?;
    let companion = companion_unit(index, fixture, Flavor::Standalone);
    let scratch = Scratch::acquire(&generated, companion.as_bytes())?;
    debug!(
        fixture = %fixture.name,
        source = %scratch.source().display(),
        executable = %scratch.executable().display(),
        "compiling"
    );
    let compiled = toolchain.compile(scratch.executable(), &[scratch.source(), scratch.companion()])?;
    if !compiled.passed() {
        return Err(OracleError::Toolchain {
            fixture: fixture.name.clone(),
            stage: Stage::Compile,
            outcome: compiled,
        });
    }
    let outcome = toolchain.spawn(scratch.executable(), fixture.stdin.as_deref())?;
    if !outcome.passed() {
        return Err(OracleError::Toolchain {
            fixture: fixture.name.clone(),
            stage: Stage::Execute,
            outcome,
        });
    }
    info!(fixture = %fixture.name, "compiled fixture passed");
    Ok(outcome)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selector {
    Count,
    Fixture(usize),
}

impl Selector {
    pub fn resolve(raw: i64, count: usize) -> OracleResult<Self> {
        if raw == -1 {
            return Ok(Selector::Count);
        }
        match usize::try_from(raw) {
            Ok(index) if index < count => Ok(Selector::Fixture(index)),
            _ => Err(OracleError::SelectorOutOfRange {
                selector: raw,
                count,
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatch {
    Count(usize),
    Ran { fixture: String, outcome: RunOutcome },
}

/// One selector invocation. `-1` only counts: nothing is parsed, built or
/// run.
pub fn dispatch<T, C>(
    raw: i64,
    transcripts: &[PathBuf],
    settings: &FixtureSettings,
    translator: &T,
    toolchain: &C,
) -> OracleResult<Dispatch>
where
    T: Translator + ?Sized,
    C: Toolchain + ?Sized,
{
    match Selector::resolve(raw, transcripts.len())? {
        Selector::Count => Ok(Dispatch::Count(transcripts.len())),
        Selector::Fixture(index) => {
            let fixture = Fixture::load(&transcripts[index], settings)?;
            let outcome = run_fixture(index, &fixture, translator, toolchain)?;
            Ok(Dispatch::Ran {
                fixture: fixture.name,
                outcome,
            })
        }
    }
}

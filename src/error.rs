use crate::backend::compiled::host::{RunOutcome, Stage};
use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

pub type OracleResult<T> = Result<T, OracleError>;

#[derive(Debug, Error, Diagnostic)]
pub enum OracleError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Format(#[from] FixtureFormatError),
    #[error("fixture `{}` has no program source at `{}`", .transcript.display(), .expected.display())]
    #[diagnostic(
        code(oracle::fixture::missing_sibling),
        help("every transcript needs a program with the same stem next to it")
    )]
    MissingSibling {
        transcript: PathBuf,
        expected: PathBuf,
    },
    #[error("failed to access {}: {error}", .path.display())]
    #[diagnostic(code(oracle::io))]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
    #[error("invalid configuration in {}: {message}", .path.display())]
    #[diagnostic(code(oracle::config))]
    Config { path: PathBuf, message: String },
    #[error("{fixture}: value #{index} was emitted but the transcript holds only {expected} value(s)")]
    #[diagnostic(code(oracle::over_production))]
    OverProduction {
        fixture: String,
        index: usize,
        expected: usize,
    },
    #[error("{fixture}: value #{index}{path}: expected {expected}, found {found}")]
    #[diagnostic(code(oracle::value_mismatch))]
    ValueMismatch {
        fixture: String,
        index: usize,
        path: String,
        expected: String,
        found: String,
    },
    #[error("{fixture}: interpreter failed: {message}")]
    #[diagnostic(code(oracle::runtime))]
    Runtime { fixture: String, message: String },
    #[error("{fixture}: {stage} failed ({})", .outcome.describe_status())]
    #[diagnostic(code(oracle::toolchain))]
    Toolchain {
        fixture: String,
        stage: Stage,
        outcome: RunOutcome,
    },
    #[error("selector {selector} is outside -1..{count}")]
    #[diagnostic(code(oracle::selector))]
    SelectorOutOfRange { selector: i64, count: usize },
}

impl OracleError {
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            error,
        }
    }
}

/// Authoring defect in a transcript, pointing at the offending bytes.
#[derive(Debug, Error, Diagnostic)]
#[error("{}:{line}: {message}", .path.display())]
#[diagnostic(code(oracle::fixture::format))]
pub struct FixtureFormatError {
    pub path: PathBuf,
    pub line: usize,
    pub message: String,
    #[source_code]
    src: NamedSource<String>,
    #[label("{label}")]
    span: SourceSpan,
    label: String,
    #[help]
    help: Option<String>,
}

impl FixtureFormatError {
    pub fn new(
        path: impl Into<PathBuf>,
        source: &str,
        line: usize,
        span: (usize, usize),
        message: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let message = message.into();
        Self {
            src: NamedSource::new(path.display().to_string(), source.to_string()),
            span: span.into(),
            label: message.clone(),
            path,
            line,
            message,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn span(&self) -> SourceSpan {
        self.span
    }
}

pub mod literal;
pub mod transcript;
pub mod value;

pub use transcript::{decode_transcript, parse_transcript};
pub use value::{ContainerKind, ExpectedValue};

use crate::{
    config::FixtureSettings,
    error::{OracleError, OracleResult},
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

/// A program paired with the values it must emit, in order.
#[derive(Clone, Debug, PartialEq)]
pub struct Fixture {
    /// Display name used in progress lines and diagnostics.
    pub name: String,
    pub transcript: PathBuf,
    pub program_path: PathBuf,
    pub program: Vec<u8>,
    pub expected: Vec<ExpectedValue>,
    pub stdin: Option<Vec<u8>>,
}

impl Fixture {
    pub fn load(transcript: &Path, settings: &FixtureSettings) -> OracleResult<Self> {
        let program_path = transcript.with_extension(&settings.source_extension);
        if !program_path.is_file() {
            return Err(OracleError::MissingSibling {
                transcript: transcript.to_path_buf(),
                expected: program_path,
            });
        }
        let bytes = fs::read(transcript).map_err(|error| OracleError::io(transcript, error))?;
        let text = decode_transcript(transcript, &bytes)?;
        let expected = parse_transcript(transcript, text)?;
        let program =
            fs::read(&program_path).map_err(|error| OracleError::io(&program_path, error))?;
        let input_path = transcript.with_extension(&settings.input_extension);
        let stdin = if input_path.is_file() {
            Some(fs::read(&input_path).map_err(|error| OracleError::io(&input_path, error))?)
        } else {
            None
        };
        debug!(
            fixture = %transcript.display(),
            values = expected.len(),
            stdin = stdin.is_some(),
            "parsed fixture"
        );
        Ok(Self {
            name: display_name(transcript),
            transcript: transcript.to_path_buf(),
            program_path,
            program,
            expected,
            stdin,
        })
    }
}

/// Enumerates `<root>/*.<transcript extension>` in lexicographic order.
pub fn discover(settings: &FixtureSettings) -> OracleResult<Vec<PathBuf>> {
    let root = &settings.root;
    let entries = fs::read_dir(root).map_err(|error| OracleError::io(root, error))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|error| OracleError::io(root, error))?;
        let path = entry.path();
        let matches = path
            .extension()
            .map(|ext| ext == settings.transcript_extension.as_str())
            .unwrap_or(false);
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Forward-slash path so generated sources read the same on every host.
pub fn display_name(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

use crate::{
    backend::{compiled, interpreted},
    config::{FixtureSettings, OracleConfig, OutputSettings},
    error::{OracleError, OracleResult},
    fixture::{self, Fixture},
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

/// Both suite sources, rendered in memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedSuites {
    pub interpreted: String,
    pub compiled: String,
    pub fixture_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrittenSuites {
    pub interpreted: PathBuf,
    pub compiled: PathBuf,
}

/// Discovers and parses every fixture. The first malformed fixture stops
/// the whole load.
pub fn load_fixtures(settings: &FixtureSettings) -> OracleResult<Vec<Fixture>> {
    let transcripts = fixture::discover(settings)?;
    info!(
        root = %settings.root.display(),
        count = transcripts.len(),
        "discovered fixtures"
    );
    transcripts
        .iter()
        .map(|transcript| Fixture::load(transcript, settings))
        .collect()
}

/// Parses every fixture and returns all failures instead of the first.
pub fn check_fixtures(settings: &FixtureSettings) -> OracleResult<(usize, Vec<OracleError>)> {
    let transcripts = fixture::discover(settings)?;
    let failures: Vec<OracleError> = transcripts
        .iter()
        .filter_map(|transcript| Fixture::load(transcript, settings).err())
        .collect();
    Ok((transcripts.len(), failures))
}

pub fn generate(fixtures: &[Fixture], config: &OracleConfig) -> GeneratedSuites {
    let suites = GeneratedSuites {
        interpreted: interpreted::generate_suite(fixtures),
        compiled: compiled::generate_suite(fixtures, config),
        fixture_count: fixtures.len(),
    };
    info!(
        fixtures = suites.fixture_count,
        interpreted_bytes = suites.interpreted.len(),
        compiled_bytes = suites.compiled.len(),
        "generated suites"
    );
    suites
}

pub fn write_suites(suites: &GeneratedSuites, output: &OutputSettings) -> OracleResult<WrittenSuites> {
    fs::create_dir_all(&output.dir).map_err(|error| OracleError::io(&output.dir, error))?;
    let written = WrittenSuites {
        interpreted: output.interpreted_path(),
        compiled: output.compiled_path(),
    };
    write_file(&written.interpreted, &suites.interpreted)?;
    write_file(&written.compiled, &suites.compiled)?;
    Ok(written)
}

fn write_file(path: &Path, contents: &str) -> OracleResult<()> {
    fs::write(path, contents).map_err(|error| OracleError::io(path, error))?;
    info!(path = %path.display(), "wrote suite");
    Ok(())
}

/// Loads, generates and writes in one step.
pub fn run(config: &OracleConfig) -> OracleResult<WrittenSuites> {
    let fixtures = load_fixtures(&config.fixtures)?;
    let suites = generate(&fixtures, config);
    write_suites(&suites, &config.output)
}

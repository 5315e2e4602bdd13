use crate::error::{OracleError, OracleResult};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub const CONFIG_FILE: &str = "oracle.toml";

/// Settings for fixture generation and the host-side compiled runner.
///
/// Values are layered: built-in defaults, then `oracle.toml`, then
/// `FIXTURE_ORACLE_*` environment variables.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OracleConfig {
    pub fixtures: FixtureSettings,
    pub output: OutputSettings,
    pub toolchain: ToolchainSettings,
    pub features: FeatureFlags,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixtureSettings {
    pub root: PathBuf,
    pub transcript_extension: String,
    pub source_extension: String,
    pub input_extension: String,
}

impl Default for FixtureSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("tests/features"),
            transcript_extension: "out".into(),
            source_extension: "au".into(),
            input_extension: "in".into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
    pub dir: PathBuf,
    pub interpreted: String,
    pub compiled: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("build"),
            interpreted: "tests.c".into(),
            compiled: "tests_comp.c".into(),
        }
    }
}

impl OutputSettings {
    pub fn interpreted_path(&self) -> PathBuf {
        self.dir.join(&self.interpreted)
    }

    pub fn compiled_path(&self) -> PathBuf {
        self.dir.join(&self.compiled)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainSettings {
    pub cc: String,
    pub runtime_archive: PathBuf,
    pub include_dirs: Vec<PathBuf>,
    pub cflags: Vec<String>,
    pub ldflags: Vec<String>,
    /// Translator argv; `{program}` is replaced with the fixture source path
    /// and is appended when absent.
    pub translator: Vec<String>,
}

impl Default for ToolchainSettings {
    fn default() -> Self {
        Self {
            cc: "cc".into(),
            runtime_archive: PathBuf::from("build/libau_runtime.a"),
            include_dirs: vec![PathBuf::from("src")],
            cflags: Vec::new(),
            ldflags: Vec::new(),
            translator: vec!["aument".into(), "build".into(), "--emit-c".into()],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeatureFlags {
    pub sanitizer: Option<String>,
    pub coverage: bool,
    pub libdl: bool,
    pub math_lib: bool,
}

impl OracleConfig {
    /// Loads `path` when it exists and applies environment overrides.
    pub fn load(path: Option<&Path>) -> OracleResult<Self> {
        let explicit = path.is_some();
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        let mut config = if path.exists() {
            let text = fs::read_to_string(&path).map_err(|error| OracleError::io(&path, error))?;
            Self::from_toml(&path, &text)?
        } else if explicit {
            return Err(OracleError::Config {
                path,
                message: "file does not exist".into(),
            });
        } else {
            Self::default()
        };
        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(path: &Path, text: &str) -> OracleResult<Self> {
        toml::from_str(text).map_err(|error| OracleError::Config {
            path: path.to_path_buf(),
            message: error.to_string(),
        })
    }

    /// `lookup` abstracts the process environment so tests stay hermetic.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(root) = var("FIXTURE_ORACLE_ROOT") {
            self.fixtures.root = PathBuf::from(root);
        }
        if let Some(cc) = var("FIXTURE_ORACLE_CC") {
            self.toolchain.cc = cc;
        }
        if let Some(archive) = var("FIXTURE_ORACLE_RUNTIME_ARCHIVE") {
            self.toolchain.runtime_archive = PathBuf::from(archive);
        }
        if let Some(sanitizer) = var("FIXTURE_ORACLE_SANITIZER") {
            self.features.sanitizer = Some(sanitizer);
        }
        if let Some(flag) = var("FIXTURE_ORACLE_COVERAGE") {
            self.features.coverage = is_truthy(&flag);
        }
        if let Some(flag) = var("FIXTURE_ORACLE_LIBDL") {
            self.features.libdl = is_truthy(&flag);
        }
        if let Some(flag) = var("FIXTURE_ORACLE_MATH_LIB") {
            self.features.math_lib = is_truthy(&flag);
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

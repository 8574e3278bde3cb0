//! Configuration file handling for vtask

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default location of the test binary, relative to the project root
pub const DEFAULT_ARTIFACT: &str = "./target/debug/vtas";

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),
    #[error("Unable to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unknown working directory: {0}")]
    UnknownWorkingDirectory(String),
    #[error("Unable to parse YAML config file {path}: {source}")]
    Yaml {
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("Unable to parse JSON config file {path}: {source}")]
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },
    #[error("Invalid config: {0}")]
    Validation(String),
}

/// On-disk configuration. Every field is optional; see [`Settings`] for the defaults.
#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub artifact: Option<PathBuf>,
    pub build: Option<Vec<String>>,
}

/// List of supported configuration file names
const FILENAMES: [&str; 3] = [".vtask.json", ".vtask.yaml", ".vtask.yml"];

impl Config {
    /// Loads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read, or
    /// `ConfigError::Yaml`/`ConfigError::Json` if parsing fails.
    pub fn from_file(file: &Path) -> Result<Config, ConfigError> {
        let contents = std::fs::read_to_string(file).map_err(|source| ConfigError::Read {
            path: file.to_path_buf(),
            source,
        })?;
        let config: Config = if file.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&contents).map_err(|e| ConfigError::Json {
                source: e,
                path: file.to_path_buf(),
            })?
        } else if contents.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Yaml {
                source: e,
                path: file.to_path_buf(),
            })?
        };
        Ok(config)
    }

    /// Searches for a configuration file in `start` and its parents.
    ///
    /// Returns `None` when no directory on the way up contains one.
    #[must_use]
    pub fn find_config(start: &Path) -> Option<PathBuf> {
        let mut path = start.to_path_buf();
        debug!("Searching for config file in {}", start.display());
        loop {
            for file in &FILENAMES {
                let config_path = path.join(file);
                if config_path.is_file() {
                    info!("Found config file: {}", config_path.display());
                    return Some(config_path);
                }
            }
            if !path.pop() {
                return None;
            }
        }
    }
}

/// Resolved, immutable settings for a single vtask invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Project root; build and test processes run here.
    pub root: PathBuf,
    /// Absolute (or root-relative joined) path of the test binary.
    pub artifact: PathBuf,
    /// Build toolchain invocation, program first.
    pub build: Vec<String>,
}

impl Settings {
    /// Settings used when no config file is present.
    #[must_use]
    pub fn with_defaults(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            artifact: root.join(DEFAULT_ARTIFACT),
            build: default_build(),
        }
    }

    /// Apply a parsed config on top of the defaults, resolving paths against `root`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the build command or artifact path is empty.
    pub fn resolve(config: Config, root: &Path) -> Result<Self, ConfigError> {
        let build = config.build.unwrap_or_else(default_build);
        if build.first().is_none_or(|program| program.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "`build` must name a program to run".to_string(),
            ));
        }

        let artifact = config
            .artifact
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT));
        if artifact.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "`artifact` must not be empty".to_string(),
            ));
        }

        Ok(Self {
            root: root.to_path_buf(),
            artifact: root.join(artifact),
            build,
        })
    }

    /// Name used in progress output, taken from the artifact's file name.
    #[must_use]
    pub fn artifact_name(&self) -> String {
        self.artifact
            .file_stem()
            .map_or_else(|| "project".to_string(), |s| s.to_string_lossy().into_owned())
    }
}

fn default_build() -> Vec<String> {
    vec!["cargo".to_string(), "build".to_string()]
}

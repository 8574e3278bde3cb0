//! Core implementation of the vtask developer task runner
//!
//! vtask maps a command name given on the command line to an action and runs it. The `test`
//! command makes sure the project's test binary has been built (running the build toolchain only
//! when the binary is missing) and then runs `<binary> test`, reporting that process's exit
//! status as its own.

use std::path::{Path, PathBuf};

use log::debug;

use crate::bootstrap::BootstrapRunner;
use crate::config_file::{Config, ConfigError, Settings};
use crate::registry::{CommandRegistry, RegistryError};

pub mod bootstrap;
pub mod config_file;
pub mod dispatch;
pub mod logger;
pub mod messages;
pub mod process;
pub mod registry;

/// Load settings from a config file (or auto-detect one from `cwd` upwards).
///
/// Without an explicit file and with no config file found, the defaults apply with `cwd` as the
/// project root. Returns the settings and the config file they came from, if any.
///
/// # Errors
///
/// Returns `ConfigError` if an explicit config file does not exist, or a config file cannot be
/// read, parsed or validated.
pub fn load_settings(
    config_file: Option<&str>,
    cwd: &Path,
) -> Result<(Settings, Option<PathBuf>), ConfigError> {
    let config_path = match config_file {
        Some(file) => {
            let config_path = cwd.join(file);
            if !config_path.is_file() {
                return Err(ConfigError::ConfigNotFound(config_path));
            }
            Some(config_path)
        }
        None => Config::find_config(cwd),
    };

    let Some(config_path) = config_path else {
        debug!("No config file found, using defaults (root: {})", cwd.display());
        return Ok((Settings::with_defaults(cwd), None));
    };

    let root = config_path
        .parent()
        .ok_or_else(|| ConfigError::ConfigNotFound(config_path.clone()))?
        .to_path_buf();
    debug!(
        "Loading config file: {} (root: {})",
        config_path.display(),
        root.display()
    );
    let parsed = Config::from_file(&config_path)?;
    let settings = Settings::resolve(parsed, &root)?;
    Ok((settings, Some(config_path)))
}

/// Where an action gets its settings from.
#[derive(Debug, Clone)]
pub enum SettingsSource {
    Fixed(Settings),
    /// Read on use: `config_file` if given, else discovery from `cwd` (the process's current
    /// directory when `None`).
    Discover {
        config_file: Option<String>,
        cwd: Option<PathBuf>,
    },
}

impl SettingsSource {
    /// Produce the settings, reading the config file if needed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownWorkingDirectory` if the current directory cannot be
    /// determined, or any error from [`load_settings`].
    pub fn load(&self) -> Result<Settings, ConfigError> {
        match self {
            SettingsSource::Fixed(settings) => Ok(settings.clone()),
            SettingsSource::Discover { config_file, cwd } => {
                let cwd = match cwd {
                    Some(cwd) => cwd.clone(),
                    None => std::env::current_dir()
                        .map_err(|e| ConfigError::UnknownWorkingDirectory(e.to_string()))?,
                };
                let (settings, _) = load_settings(config_file.as_deref(), &cwd)?;
                Ok(settings)
            }
        }
    }
}

impl From<Settings> for SettingsSource {
    fn from(settings: Settings) -> Self {
        SettingsSource::Fixed(settings)
    }
}

/// The command table shipped with vtask.
///
/// Building it does no I/O; settings are loaded by an action when it runs.
///
/// # Errors
///
/// Returns `RegistryError` if two built-in commands share a name.
pub fn default_registry(settings: SettingsSource) -> Result<CommandRegistry, RegistryError> {
    CommandRegistry::builder()
        .register("test", BootstrapRunner::new(settings))
        .build()
}

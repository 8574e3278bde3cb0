//! Command table mapping command names to actions
//!
//! The table is assembled once through [`RegistryBuilder`] and is read-only afterwards.

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::config_file::ConfigError;
use crate::process::RunStatus;

/// Errors raised by an action while it runs.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no build command configured to produce missing {}", artifact.display())]
    NoBuildCommand { artifact: PathBuf },
    #[error("build `{command}` failed with {status}")]
    BuildFailed { command: String, status: RunStatus },
    #[error("unable to start {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while assembling the command table.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("command registered twice: {0}")]
    DuplicateCommand(String),
}

/// A zero-argument operation bound to a command name.
pub trait Action {
    /// One-line description shown next to the command name.
    fn about(&self) -> &str;

    /// Run the action to completion, reporting the status of the process it delegated to.
    ///
    /// # Errors
    ///
    /// Returns `ActionError` if the action could not reach the point of producing a status.
    fn run(&self) -> Result<RunStatus, ActionError>;
}

/// Immutable mapping of command names to actions.
pub struct CommandRegistry {
    commands: BTreeMap<String, Box<dyn Action>>,
}

impl CommandRegistry {
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up the action bound to `name`.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&dyn Action> {
        self.commands.get(name).map(AsRef::as_ref)
    }

    /// Registered command names with their descriptions, sorted by name.
    pub fn commands(&self) -> impl Iterator<Item = (&str, &str)> {
        self.commands
            .iter()
            .map(|(name, action)| (name.as_str(), action.about()))
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Collects registrations; duplicates are reported by [`RegistryBuilder::build`].
#[derive(Default)]
pub struct RegistryBuilder {
    commands: BTreeMap<String, Box<dyn Action>>,
    duplicates: Vec<String>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn register(mut self, name: impl Into<String>, action: impl Action + 'static) -> Self {
        let name = name.into();
        if self.commands.contains_key(&name) {
            self.duplicates.push(name);
        } else {
            self.commands.insert(name, Box::new(action));
        }
        self
    }

    /// Freeze the table.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateCommand` for the first name registered more than once.
    pub fn build(self) -> Result<CommandRegistry, RegistryError> {
        if let Some(name) = self.duplicates.into_iter().next() {
            return Err(RegistryError::DuplicateCommand(name));
        }
        Ok(CommandRegistry {
            commands: self.commands,
        })
    }
}

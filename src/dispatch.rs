//! Resolve the command token and run the bound action.

use log::debug;
use thiserror::Error;

use crate::process::RunStatus;
use crate::registry::{ActionError, CommandRegistry};

/// Exit code used for usage errors (missing or unknown command).
pub const USAGE_EXIT_CODE: u8 = 2;

/// Reasons a dispatch did not produce a status from the bound action.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("command required")]
    MissingCommand,
    #[error("unknown command: {name}")]
    UnknownCommand { name: String, available: Vec<String> },
    #[error(transparent)]
    Action(#[from] ActionError),
}

impl DispatchError {
    /// Exit code the tool reports for this failure.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            DispatchError::MissingCommand | DispatchError::UnknownCommand { .. } => USAGE_EXIT_CODE,
            DispatchError::Action(ActionError::BuildFailed { status, .. }) => {
                match status.exit_code() {
                    0 => 1,
                    code => code,
                }
            }
            DispatchError::Action(
                ActionError::Spawn { .. }
                | ActionError::Config(_)
                | ActionError::NoBuildCommand { .. },
            ) => 1,
        }
    }
}

/// Resolve `command` in `registry` and run its action.
///
/// Nothing is checked or spawned unless the command resolves.
///
/// # Errors
///
/// Returns `DispatchError::MissingCommand` when `command` is `None`,
/// `DispatchError::UnknownCommand` when it is not registered, or
/// `DispatchError::Action` when the action itself fails.
pub fn dispatch(
    registry: &CommandRegistry,
    command: Option<&str>,
) -> Result<RunStatus, DispatchError> {
    let Some(name) = command else {
        return Err(DispatchError::MissingCommand);
    };
    let Some(action) = registry.resolve(name) else {
        return Err(DispatchError::UnknownCommand {
            name: name.to_string(),
            available: registry.names(),
        });
    };
    debug!("Dispatching command `{name}`");
    Ok(action.run()?)
}

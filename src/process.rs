//! Blocking child-process invocation.
//!
//! Every external program vtask starts goes through a [`Launcher`], so the bootstrap logic can be
//! exercised without spawning anything.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command as ProcessCommand, ExitStatus};

use log::debug;

/// How a child process finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The process exited on its own with this code.
    Exited(i32),
    /// The process was terminated by this signal (Unix only).
    Signaled(i32),
}

impl RunStatus {
    #[must_use]
    pub fn success(self) -> bool {
        self == RunStatus::Exited(0)
    }

    /// Exit code vtask itself should report for this status.
    ///
    /// Exit codes pass through unchanged (truncated to the low byte, as the OS would), signals map
    /// to the shell convention `128 + signal`.
    #[must_use]
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn exit_code(self) -> u8 {
        match self {
            RunStatus::Exited(code) => (code & 0xff) as u8,
            RunStatus::Signaled(signal) => u8::try_from(128 + signal).unwrap_or(u8::MAX),
        }
    }
}

impl From<ExitStatus> for RunStatus {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return RunStatus::Exited(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return RunStatus::Signaled(signal);
            }
        }
        RunStatus::Exited(1)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Exited(code) => write!(f, "exit code {code}"),
            RunStatus::Signaled(signal) => write!(f, "signal {signal}"),
        }
    }
}

/// A single program invocation: program, arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, cwd: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
        }
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs an [`Invocation`] to completion.
pub trait Launcher {
    /// Start the process and block until it exits.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the process could not be started.
    fn run(&self, invocation: &Invocation) -> std::io::Result<RunStatus>;
}

/// Launcher backed by `std::process`, inheriting stdin, stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn run(&self, invocation: &Invocation) -> std::io::Result<RunStatus> {
        debug!("Spawning `{invocation}` in {}", invocation.cwd.display());
        let status = ProcessCommand::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .status()?;
        Ok(status.into())
    }
}

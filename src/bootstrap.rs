//! The `test` action: make sure the test binary exists, then run its test suite.

use std::io::{IsTerminal, Write};
use std::path::Path;

use log::{debug, info, warn};

use crate::SettingsSource;
use crate::config_file::Settings;
use crate::messages;
use crate::process::{Invocation, Launcher, RunStatus, SystemLauncher};
use crate::registry::{Action, ActionError};

/// Argument passed to the test binary.
pub const TEST_SUBCOMMAND: &str = "test";

/// Builds the artifact when it is missing and runs `<artifact> test`.
///
/// Settings are loaded when the action runs, so resolving the command touches nothing on disk.
#[derive(Debug, Clone)]
pub struct BootstrapRunner<L = SystemLauncher> {
    settings: SettingsSource,
    launcher: L,
}

impl BootstrapRunner<SystemLauncher> {
    #[must_use]
    pub fn new(settings: impl Into<SettingsSource>) -> Self {
        Self::with_launcher(settings, SystemLauncher)
    }
}

impl<L: Launcher> BootstrapRunner<L> {
    pub fn with_launcher(settings: impl Into<SettingsSource>, launcher: L) -> Self {
        Self {
            settings: settings.into(),
            launcher,
        }
    }

    fn build(&self, settings: &Settings) -> Result<(), ActionError> {
        let Some((program, args)) = settings.build.split_first() else {
            return Err(ActionError::NoBuildCommand {
                artifact: settings.artifact.clone(),
            });
        };
        let invocation = Invocation::new(program, &settings.root).args(args.iter().cloned());
        info!("Building test binary with `{invocation}`");

        let status = launch(&self.launcher, &invocation)?;
        if !status.success() {
            return Err(ActionError::BuildFailed {
                command: invocation.to_string(),
                status,
            });
        }
        if !is_artifact(&settings.artifact) {
            warn!(
                "Build finished but {} is still missing",
                settings.artifact.display()
            );
        }
        Ok(())
    }

    fn run_tests(&self, settings: &Settings) -> Result<RunStatus, ActionError> {
        let color = messages::use_color(std::io::stdout().is_terminal());
        let progress = messages::format_progress_message(&settings.artifact_name(), color);
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = stdout
            .write_all(progress.as_bytes())
            .and_then(|()| stdout.flush())
        {
            debug!("Unable to write progress message: {e}");
        }
        drop(stdout);

        let invocation =
            Invocation::new(&settings.artifact, &settings.root).args([TEST_SUBCOMMAND]);
        let status = launch(&self.launcher, &invocation)?;
        info!("`{invocation}` finished with {status}");
        Ok(status)
    }
}

fn launch(launcher: &impl Launcher, invocation: &Invocation) -> Result<RunStatus, ActionError> {
    launcher
        .run(invocation)
        .map_err(|source| ActionError::Spawn {
            program: invocation.program.clone(),
            source,
        })
}

impl<L: Launcher> Action for BootstrapRunner<L> {
    fn about(&self) -> &str {
        "Build the test binary if needed, then run its tests"
    }

    fn run(&self) -> Result<RunStatus, ActionError> {
        let settings = self.settings.load()?;
        let present = is_artifact(&settings.artifact);
        debug!(
            "Artifact {} {}",
            settings.artifact.display(),
            if present { "found" } else { "missing" }
        );
        if !present {
            self.build(&settings)?;
        }
        self.run_tests(&settings)
    }
}

/// Whether `path` names an existing regular file.
#[must_use]
pub fn is_artifact(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::process::fake::RecordingLauncher;

    fn settings(root: &Path) -> Settings {
        Settings {
            root: root.to_path_buf(),
            artifact: root.join("target/debug/vtas"),
            build: vec!["cargo".to_string(), "build".to_string()],
        }
    }

    fn place_artifact(settings: &Settings) {
        std::fs::create_dir_all(settings.artifact.parent().unwrap()).unwrap();
        std::fs::write(&settings.artifact, b"").unwrap();
    }

    #[test]
    fn test_present_artifact_skips_build() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        place_artifact(&settings);
        let launcher = RecordingLauncher::default();
        let runner = BootstrapRunner::with_launcher(settings.clone(), launcher.clone());

        assert_eq!(runner.run().unwrap(), RunStatus::Exited(0));

        let calls = launcher.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, settings.artifact);
        assert_eq!(calls[0].args, vec!["test"]);
        assert_eq!(calls[0].cwd, dir.path());
    }

    #[test]
    fn test_missing_artifact_builds_first() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let launcher = RecordingLauncher::default();
        let runner = BootstrapRunner::with_launcher(settings.clone(), launcher.clone());

        assert_eq!(runner.run().unwrap(), RunStatus::Exited(0));

        let calls = launcher.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].program, Path::new("cargo"));
        assert_eq!(calls[0].args, vec!["build"]);
        assert_eq!(calls[1].program, settings.artifact);
        assert_eq!(calls[1].args, vec!["test"]);
    }

    #[test]
    fn test_build_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = RecordingLauncher::default();
        launcher.reply(Ok(RunStatus::Exited(101)));
        let runner = BootstrapRunner::with_launcher(settings(dir.path()), launcher.clone());

        match runner.run() {
            Err(ActionError::BuildFailed { command, status }) => {
                assert_eq!(command, "cargo build");
                assert_eq!(status, RunStatus::Exited(101));
            }
            other => panic!("Expected BuildFailed, got: {other:?}"),
        }
        assert_eq!(launcher.calls().len(), 1);
    }

    #[test]
    fn test_build_spawn_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = RecordingLauncher::default();
        launcher.reply(Err(io::Error::from(io::ErrorKind::NotFound)));
        let runner = BootstrapRunner::with_launcher(settings(dir.path()), launcher.clone());

        match runner.run() {
            Err(ActionError::Spawn { program, source }) => {
                assert_eq!(program, Path::new("cargo"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("Expected Spawn, got: {other:?}"),
        }
        assert_eq!(launcher.calls().len(), 1);
    }

    #[test]
    fn test_failing_tests_status_forwarded() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        place_artifact(&settings);
        let launcher = RecordingLauncher::default();
        launcher.reply(Ok(RunStatus::Exited(3)));
        let runner = BootstrapRunner::with_launcher(settings, launcher.clone());

        assert_eq!(runner.run().unwrap(), RunStatus::Exited(3));
        assert_eq!(launcher.calls().len(), 1);
    }

    #[test]
    fn test_repeated_runs_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        place_artifact(&settings);
        let launcher = RecordingLauncher::default();
        launcher
            .reply(Ok(RunStatus::Exited(1)))
            .reply(Ok(RunStatus::Exited(0)));
        let runner = BootstrapRunner::with_launcher(settings.clone(), launcher.clone());

        assert_eq!(runner.run().unwrap(), RunStatus::Exited(1));
        assert_eq!(runner.run().unwrap(), RunStatus::Exited(0));

        let calls = launcher.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.program == settings.artifact));
    }

    #[test]
    fn test_directory_at_artifact_path_is_not_present() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        std::fs::create_dir_all(&settings.artifact).unwrap();
        assert!(!is_artifact(&settings.artifact));

        let launcher = RecordingLauncher::default();
        let runner = BootstrapRunner::with_launcher(settings, launcher.clone());
        runner.run().unwrap();
        assert_eq!(launcher.calls().len(), 2);
    }

    #[test]
    fn test_empty_build_command_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path());
        settings.build.clear();
        let launcher = RecordingLauncher::default();
        let runner = BootstrapRunner::with_launcher(settings.clone(), launcher.clone());

        match runner.run() {
            Err(ActionError::NoBuildCommand { artifact }) => {
                assert_eq!(artifact, settings.artifact);
            }
            other => panic!("Expected NoBuildCommand, got: {other:?}"),
        }
        assert!(launcher.calls().is_empty());
    }

    #[test]
    fn test_config_loaded_on_run() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".vtask.yaml"), "build: []\n").unwrap();
        let launcher = RecordingLauncher::default();
        let runner = BootstrapRunner::with_launcher(
            SettingsSource::Discover {
                config_file: None,
                cwd: Some(dir.path().to_path_buf()),
            },
            launcher.clone(),
        );

        assert!(matches!(runner.run(), Err(ActionError::Config(_))));
        assert!(launcher.calls().is_empty());
    }
}

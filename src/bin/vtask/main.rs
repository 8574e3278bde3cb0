use std::io::{IsTerminal, Write};
use std::process::ExitCode;

use clap::Parser;
use log::debug;

use vtask::dispatch::{DispatchError, dispatch};
use vtask::registry::CommandRegistry;
use vtask::{SettingsSource, default_registry, messages};

#[derive(Parser, Debug)]
#[command(
    name = "vtask",
    version,
    about = "Developer task runner: builds the test binary when needed and runs its tests"
)]
struct Cli {
    /// Path to config file (auto-detected if not specified)
    #[arg(short, long)]
    config: Option<String>,

    /// Log file path (log records are written here in addition to stderr)
    #[arg(long)]
    log_file: Option<String>,

    /// Command to run
    command: Option<String>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let registry = default_registry(SettingsSource::Discover {
        config_file: cli.config.clone(),
        cwd: None,
    })?;

    // Nothing is created on disk unless the command resolves.
    let resolved = cli
        .command
        .as_deref()
        .is_some_and(|name| registry.resolve(name).is_some());
    let log_file = match &cli.log_file {
        Some(path) if resolved => Some(std::fs::File::create(path)?),
        _ => None,
    };
    vtask::logger::init(log_file)?;

    Ok(report(&registry, dispatch(&registry, cli.command.as_deref())))
}

/// Print the outcome of a dispatch and turn it into the process exit code.
fn report(
    registry: &CommandRegistry,
    outcome: Result<vtask::process::RunStatus, DispatchError>,
) -> ExitCode {
    let color = messages::use_color(std::io::stderr().is_terminal());
    let commands: Vec<(&str, &str)> = registry.commands().collect();

    let text = match &outcome {
        Ok(status) if status.success() => messages::format_success_message(color),
        Ok(status) => messages::format_failure_message(&format!("Tests failed ({status})"), color),
        Err(DispatchError::MissingCommand) => messages::format_missing_command(&commands),
        Err(DispatchError::UnknownCommand { name, .. }) => {
            messages::format_unknown_command(name, &commands)
        }
        Err(err @ DispatchError::Action(_)) => {
            debug!("Action failed: {err:?}");
            messages::format_failure_message(&capitalize(&err.to_string()), color)
        }
    };
    let _ = std::io::stderr().lock().write_all(text.as_bytes());

    match outcome {
        Ok(status) => ExitCode::from(status.exit_code()),
        Err(err) => ExitCode::from(err.exit_code()),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

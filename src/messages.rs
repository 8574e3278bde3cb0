use anstyle::{AnsiColor, Reset, RgbColor, Style};

/// Raw RGB tuple of the accent colour
pub const ACCENT_RGB: (u8, u8, u8) = (207, 106, 76);

const PRIMARY_COLOR: Style = Style::new().fg_color(Some(anstyle::Color::Rgb(RgbColor(
    ACCENT_RGB.0,
    ACCENT_RGB.1,
    ACCENT_RGB.2,
))));
const SUCCESS_COLOR: Style = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Green)));
const ERROR_COLOR: Style = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Red)));

/// Colour is used only on terminals, and never when `NO_COLOR` is set.
#[must_use]
pub fn use_color(is_terminal: bool) -> bool {
    is_terminal && std::env::var_os("NO_COLOR").is_none()
}

fn paint(style: Style, text: &str, color: bool) -> String {
    if color {
        format!("{style}{text}{Reset}")
    } else {
        text.to_string()
    }
}

fn render_arrow(color: bool) -> String {
    paint(PRIMARY_COLOR, "❱", color)
}

#[must_use]
pub fn format_progress_message(name: &str, color: bool) -> String {
    format!("{} Running {name} tests...\n", render_arrow(color))
}

#[must_use]
pub fn format_success_message(color: bool) -> String {
    format!(
        "{} Tests passed {}\n",
        render_arrow(color),
        paint(SUCCESS_COLOR, "✓", color)
    )
}

#[must_use]
pub fn format_failure_message(reason: &str, color: bool) -> String {
    format!(
        "{} {reason} {}\n",
        render_arrow(color),
        paint(ERROR_COLOR, "✘", color)
    )
}

/// Diagnostic for an invocation without a command.
#[must_use]
pub fn format_missing_command(commands: &[(&str, &str)]) -> String {
    format!("Command required\n{}", format_command_list(commands))
}

/// Diagnostic for a command name that is not registered.
#[must_use]
pub fn format_unknown_command(name: &str, commands: &[(&str, &str)]) -> String {
    format!("Unknown command: {name}\n{}", format_command_list(commands))
}

fn format_command_list(commands: &[(&str, &str)]) -> String {
    let width = commands.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let mut out = String::from("Available commands:\n");
    for (name, about) in commands {
        out.push_str(&format!("  {name:<width$}  {about}\n"));
    }
    out
}

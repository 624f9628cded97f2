//! Output formatting utilities

use console::{style, Style};
use gantry_core::model::{Status, TaskStatus};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("{} {}", style("!").yellow().bold(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", style("→").blue(), message);
}

/// Create a styled header
pub fn header(text: &str) -> String {
    style(text).bold().to_string()
}

/// Create a styled key-value line
pub fn key_value(key: &str, value: &str) -> String {
    format!("  {}: {}", style(key).dim(), value)
}

/// Style for record ids
pub fn id_style() -> Style {
    Style::new().cyan()
}

/// Style for paths
pub fn path_style() -> Style {
    Style::new().cyan()
}

/// Style for variant names
pub fn variant_style() -> Style {
    Style::new().yellow().bold()
}

/// Colored version or build status
pub fn status(status: Status) -> String {
    let s = match status {
        Status::Success => Style::new().green(),
        Status::Failed | Status::Aborted => Style::new().red(),
        Status::Started => Style::new().blue(),
        Status::Created => Style::new().dim(),
    };
    s.apply_to(status.as_str()).to_string()
}

/// Colored task status
pub fn task_status(status: TaskStatus) -> String {
    let s = match status {
        TaskStatus::Success => Style::new().green(),
        TaskStatus::Failed => Style::new().red(),
        TaskStatus::Started | TaskStatus::Dispatched => Style::new().blue(),
        TaskStatus::Undispatched => Style::new().dim(),
    };
    s.apply_to(status.as_str()).to_string()
}

/// Activation marker
pub fn activated(active: bool) -> String {
    if active {
        style("active").green().to_string()
    } else {
        style("inactive").dim().to_string()
    }
}

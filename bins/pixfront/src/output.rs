//! Terminal output helpers

use owo_colors::OwoColorize;

/// Colored status lines for the one-shot commands.
pub struct Status;

impl Status {
    /// `✓ message` on stdout
    pub fn success(message: &str) {
        println!("{} {message}", "✓".green().bold());
    }

    /// `✗ message` on stderr
    pub fn error(message: &str) {
        eprintln!("{} {message}", "✗".red().bold());
    }

    /// Bold heading for a report block
    pub fn header(title: &str) {
        println!("{}", title.bold().underline());
    }

    /// Indented, aligned `label: value` line under a header
    pub fn field(label: &str, value: &str) {
        let label = format!("{label}:");
        println!("  {} {value}", format!("{label:<11}").dimmed());
    }
}

/// Human readable byte count, binary units.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = *next;
    }
    format!("{value:.2} {unit}")
}

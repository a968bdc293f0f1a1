//! Output formatter for human-readable and JSON output
//!
//! Ensures consistent output formatting across all commands.

use console::{Color, style};
use serde::Serialize;

use super::OutputConfig;

/// Formatter for CLI output
///
/// When JSON mode is enabled, each command prints exactly one JSON document
/// and human status lines are suppressed.
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    /// Create a new formatter with the given configuration
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Check if JSON output mode is enabled
    pub fn is_json(&self) -> bool {
        self.config.json
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.config.quiet
    }

    /// Check if colors are enabled
    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    /// Print a human status line, such as `Creating object "k" in bucket "b".`
    pub fn status(&self, message: &str) {
        if self.shows_human_output() {
            println!("{message}");
        }
    }

    /// Print `✓ message` once a command has finished
    pub fn success(&self, message: &str) {
        if self.shows_human_output() {
            println!("{}", self.marked("✓", Color::Green, message));
        }
    }

    /// Print an error to stderr
    ///
    /// Errors are always printed, even in quiet mode. In JSON mode the
    /// error is a `{"error": ...}` document.
    pub fn error(&self, message: &str) {
        if self.config.json {
            let error = serde_json::json!({ "error": message });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&error).unwrap_or_else(|_| message.to_string())
            );
        } else {
            eprintln!("{}", self.marked("✗", Color::Red, message));
        }
    }

    /// Print a warning to stderr
    pub fn warning(&self, message: &str) {
        if self.shows_human_output() {
            eprintln!("{}", self.marked("⚠", Color::Yellow, message));
        }
    }

    fn shows_human_output(&self) -> bool {
        !self.config.quiet && !self.config.json
    }

    fn marked(&self, marker: &str, color: Color, message: &str) -> String {
        if self.colors_enabled() {
            format!("{} {message}", style(marker).fg(color))
        } else {
            format!("{marker} {message}")
        }
    }

    /// Output JSON directly
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }

    /// Print a line of text (respects quiet mode)
    pub fn println(&self, message: &str) {
        if self.config.quiet {
            return;
        }
        println!("{message}");
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}

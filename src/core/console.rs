//! Four-severity console output used at each major step.
//!
//! Calls are fire-and-forget. Diagnostic detail goes through `tracing`
//! instead; this channel is the user-facing progress log.

use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "[INFO]",
            Severity::Success => "[SUCCESS]",
            Severity::Warning => "[WARNING]",
            Severity::Error => "[ERROR]",
        }
    }
}

pub trait Reporter: Send + Sync {
    fn emit(&self, severity: Severity, msg: &str);

    fn info(&self, msg: &str) {
        self.emit(Severity::Info, msg);
    }

    fn success(&self, msg: &str) {
        self.emit(Severity::Success, msg);
    }

    fn warning(&self, msg: &str) {
        self.emit(Severity::Warning, msg);
    }

    fn error(&self, msg: &str) {
        self.emit(Severity::Error, msg);
    }
}

/// Colored `[LEVEL] message` lines on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn emit(&self, severity: Severity, msg: &str) {
        use colored::Colorize;

        let label = match severity {
            Severity::Info => severity.label().bright_blue(),
            Severity::Success => severity.label().bright_green(),
            Severity::Warning => severity.label().bright_yellow(),
            Severity::Error => severity.label().bright_red().bold(),
        };
        println!("{} {}", label, msg);
    }
}

/// Discards everything. Used for JSON output.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuietReporter;

impl Reporter for QuietReporter {
    fn emit(&self, _severity: Severity, _msg: &str) {}
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    lines: Mutex<Vec<(Severity, String)>>,
}

impl MemoryReporter {
    pub fn lines(&self) -> Vec<(Severity, String)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.lines().iter().filter(|(s, _)| *s == severity).count()
    }
}

impl Reporter for MemoryReporter {
    fn emit(&self, severity: Severity, msg: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((severity, msg.to_string()));
        }
    }
}

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// `first8...last8` for identifiers longer than 16 characters.
pub fn shorten_id(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() <= 16 {
        return id.to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 8..].iter().collect();
    format!("{}...{}", head, tail)
}

//! Terminal output helpers for `status` and `doctor`.

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Outcome of one diagnostic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl CheckStatus {
    fn marker(self, color: bool) -> String {
        let (plain, ansi, symbol) = match self {
            CheckStatus::Pass => ("OK", GREEN, "✓"),
            CheckStatus::Warn => ("WARN", YELLOW, "⚠"),
            CheckStatus::Fail => ("FAIL", RED, "✗"),
        };
        if color {
            format!("{ansi}{BOLD}{symbol}{RESET}")
        } else {
            format!("{plain}:")
        }
    }
}

/// One line of checklist output: marker, label, detail.
pub fn format_check(status: CheckStatus, label: &str, detail: &str, color: bool) -> String {
    if detail.is_empty() {
        format!("  {} {label}", status.marker(color))
    } else {
        format!("  {} {label}: {detail}", status.marker(color))
    }
}

pub fn print_check(status: CheckStatus, label: &str, detail: &str) {
    println!("{}", format_check(status, label, detail, supports_color()));
}

/// Print a formatted ERROR note.
pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}✗{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

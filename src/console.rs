//! Status output for the CLI.
//!
//! Everything here writes to stderr so chapter text on stdout can be piped
//! or redirected untouched. ANSI colors are used only when stderr is a
//! terminal and `NO_COLOR` is unset.

use std::io::{self, IsTerminal, Write};

/// SGR attributes used by the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Bold,
    Dim,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Gray,
}

impl Style {
    const fn sgr(self) -> u8 {
        match self {
            Style::Bold => 1,
            Style::Dim => 2,
            Style::Red => 31,
            Style::Green => 32,
            Style::Yellow => 33,
            Style::Blue => 34,
            Style::Magenta => 35,
            Style::Cyan => 36,
            Style::Gray => 90,
        }
    }
}

/// Kind of a status line, which picks its tag and color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Info,
    Ok,
    Warn,
    Error,
    Step,
    Progress,
}

impl Status {
    fn tag(self) -> (&'static str, Style) {
        match self {
            Status::Info => ("INFO", Style::Blue),
            Status::Ok => ("OK", Style::Green),
            Status::Warn => ("WARN", Style::Yellow),
            Status::Error => ("ERROR", Style::Red),
            Status::Step => ("STEP", Style::Cyan),
            Status::Progress => ("..", Style::Cyan),
        }
    }
}

/// Writes tagged status lines to stderr.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    colors: bool,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    /// Detects color support from `NO_COLOR` and whether stderr is a TTY.
    pub fn new() -> Self {
        Self::with_colors(std::env::var_os("NO_COLOR").is_none() && io::stderr().is_terminal())
    }

    pub fn with_colors(colors: bool) -> Self {
        Self { colors }
    }

    /// Wraps `text` in the given SGR attributes, or returns it unchanged
    /// when colors are off.
    pub fn style(&self, text: &str, styles: &[Style]) -> String {
        if !self.colors || styles.is_empty() {
            return text.to_string();
        }

        let params = styles
            .iter()
            .map(|s| s.sgr().to_string())
            .collect::<Vec<_>>()
            .join(";");
        format!("\x1b[{}m{}\x1b[0m", params, text)
    }

    /// Formats one status line such as `[OK] Found 120 chapters`.
    pub fn status_line(&self, status: Status, message: &str) -> String {
        let (tag, color) = status.tag();
        format!("[{}] {}", self.style(tag, &[color, Style::Bold]), message)
    }

    fn emit(&self, status: Status, message: &str) {
        eprintln!("{}", self.status_line(status, message));
    }

    pub fn info(&self, message: &str) {
        self.emit(Status::Info, message);
    }

    pub fn success(&self, message: &str) {
        self.emit(Status::Ok, message);
    }

    pub fn warning(&self, message: &str) {
        self.emit(Status::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.emit(Status::Error, message);
    }

    pub fn step(&self, message: &str) {
        self.emit(Status::Step, message);
    }

    /// Blank line followed by a bold heading.
    pub fn section(&self, title: &str) {
        eprintln!();
        eprintln!("{}", self.style(title, &[Style::Magenta, Style::Bold]));
    }

    pub fn muted(&self, text: &str) -> String {
        self.style(text, &[Style::Gray, Style::Dim])
    }

    /// Erases the in-place progress line. No-op without a terminal, where
    /// progress lines are never overwritten.
    pub fn clear_line(&self) {
        if self.colors {
            eprint!("\r\x1b[2K");
            let _ = io::stderr().flush();
        }
    }

    /// Rewrites the current line with a progress message.
    pub fn progress_update(&self, message: &str) {
        self.clear_line();
        let line = self.status_line(Status::Progress, message);
        if self.colors {
            eprint!("{}", line);
        } else {
            eprintln!("{}", line);
        }
        let _ = io::stderr().flush();
    }

    pub fn count(&self, n: usize) -> String {
        self.style(&n.to_string(), &[Style::Green, Style::Bold])
    }

    /// Formats a chapter position like `[12/340]`.
    pub fn chapter_progress(&self, current: usize, total: usize) -> String {
        self.style(
            &format!("[{}/{}]", current, total),
            &[Style::Cyan, Style::Bold],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_output_has_no_escapes() {
        let console = Console::with_colors(false);
        assert_eq!(console.style("hello", &[Style::Red, Style::Bold]), "hello");
        assert_eq!(
            console.status_line(Status::Warn, "retrying"),
            "[WARN] retrying"
        );
        assert_eq!(console.chapter_progress(3, 120), "[3/120]");
    }

    #[test]
    fn test_styles_are_joined() {
        let console = Console::with_colors(true);
        assert_eq!(
            console.style("hi", &[Style::Bold, Style::Red]),
            "\x1b[1;31mhi\x1b[0m"
        );
        assert_eq!(console.style("hi", &[]), "hi");
    }

    #[test]
    fn test_status_tags() {
        let console = Console::with_colors(false);
        for (status, expected) in [
            (Status::Info, "[INFO] x"),
            (Status::Ok, "[OK] x"),
            (Status::Error, "[ERROR] x"),
            (Status::Step, "[STEP] x"),
            (Status::Progress, "[..] x"),
        ] {
            assert_eq!(console.status_line(status, "x"), expected);
        }
    }

    #[test]
    fn test_colored_status_line() {
        let console = Console::with_colors(true);
        assert_eq!(
            console.status_line(Status::Ok, "done"),
            "[\x1b[32;1mOK\x1b[0m] done"
        );
    }
}

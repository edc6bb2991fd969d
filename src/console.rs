//! User-facing terminal output with ANSI color support.
//!
//! Colors are used only when stdout is a terminal and `NO_COLOR` is unset.
//! Per-chapter progress goes through `tracing`; this covers the steps and the
//! final summary printed by the binary.

use crate::batch::BatchReport;
use crate::extractor::ChapterLink;
use std::io::{self, IsTerminal};

/// ANSI style codes for terminal formatting.
#[derive(Debug, Clone, Copy)]
pub enum Style {
    Bold,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Gray,
}

impl Style {
    fn code(self) -> &'static str {
        match self {
            Style::Bold => "1",
            Style::Red => "31",
            Style::Green => "32",
            Style::Yellow => "33",
            Style::Blue => "34",
            Style::Magenta => "35",
            Style::Cyan => "36",
            Style::Gray => "90",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Console output handler with color support detection.
#[derive(Debug)]
pub struct Console {
    colors_enabled: bool,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    pub fn new() -> Self {
        let colors_enabled = std::env::var("NO_COLOR").is_err() && io::stdout().is_terminal();

        Self { colors_enabled }
    }

    /// Creates a Console with colors explicitly enabled or disabled.
    pub fn with_colors(enabled: bool) -> Self {
        Self {
            colors_enabled: enabled,
        }
    }

    /// Applies ANSI styles to text if colors are enabled.
    pub fn style(&self, text: &str, styles: &[Style]) -> String {
        if !self.colors_enabled || styles.is_empty() {
            return text.to_string();
        }

        let codes: Vec<&str> = styles.iter().map(|s| s.code()).collect();
        format!("\x1b[{}m{}{}", codes.join(";"), text, RESET)
    }

    fn label(&self, label: &str, color: Style) -> String {
        format!("[{}]", self.style(label, &[color, Style::Bold]))
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", self.label("INFO", Style::Blue), message);
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", self.label("OK", Style::Green), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", self.label("WARN", Style::Yellow), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", self.label("ERROR", Style::Red), message);
    }

    pub fn step(&self, message: &str) {
        println!("{} {}", self.label("STEP", Style::Cyan), message);
    }

    /// Prints a section header in magenta bold.
    pub fn section(&self, message: &str) {
        println!();
        println!("{}", self.style(message, &[Style::Magenta, Style::Bold]));
    }

    /// Formats one numbered listing entry, e.g. ` 12. Title  (/read/12.html)`.
    pub fn chapter_line(&self, number: usize, width: usize, link: &ChapterLink) -> String {
        format!(
            "{:>width$}. {}  {}",
            number,
            link.title,
            self.style(&format!("({})", link.href), &[Style::Gray]),
            width = width
        )
    }

    /// Prints the numbered chapter list.
    pub fn chapter_list(&self, links: &[ChapterLink]) {
        let width = links.len().to_string().len();
        for (i, link) in links.iter().enumerate() {
            println!("{}", self.chapter_line(i + 1, width, link));
        }
    }

    /// Formats the one-line batch summary.
    pub fn summary(&self, report: &BatchReport) -> String {
        let mut parts = vec![self.style(
            &format!("{} downloaded", report.succeeded),
            &[Style::Green, Style::Bold],
        )];
        if !report.failed.is_empty() {
            parts.push(self.style(
                &format!("{} failed", report.failed.len()),
                &[Style::Red, Style::Bold],
            ));
        }
        if report.cancelled > 0 {
            parts.push(self.style(
                &format!("{} cancelled", report.cancelled),
                &[Style::Yellow, Style::Bold],
            ));
        }
        format!("{} of {} chapters", parts.join(", "), report.dispatched)
    }

    /// Prints the batch summary and the titles of failed chapters.
    pub fn report(&self, report: &BatchReport) {
        if report.is_success() {
            self.success(&self.summary(report));
        } else {
            self.warning(&self.summary(report));
            for title in &report.failed {
                self.error(&format!("failed: {}", title));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_disabled() {
        let console = Console::with_colors(false);
        assert_eq!(console.style("hello", &[Style::Red]), "hello");
    }

    #[test]
    fn test_style_enabled() {
        let console = Console::with_colors(true);
        let styled = console.style("hello", &[Style::Bold, Style::Red]);
        assert!(styled.contains("\x1b[1;31m"));
        assert!(styled.ends_with(RESET));
    }

    #[test]
    fn test_chapter_line() {
        let console = Console::with_colors(false);
        let link = ChapterLink {
            title: "Chapter 3".to_string(),
            href: "/read/3.html".to_string(),
        };
        assert_eq!(
            console.chapter_line(3, 2, &link),
            " 3. Chapter 3  (/read/3.html)"
        );
    }

    #[test]
    fn test_summary() {
        let console = Console::with_colors(false);
        let report = BatchReport {
            dispatched: 5,
            succeeded: 3,
            failed: vec!["Two".to_string()],
            cancelled: 1,
            ..BatchReport::default()
        };
        assert_eq!(
            console.summary(&report),
            "3 downloaded, 1 failed, 1 cancelled of 5 chapters"
        );

        let clean = BatchReport {
            dispatched: 2,
            succeeded: 2,
            ..BatchReport::default()
        };
        assert_eq!(console.summary(&clean), "2 downloaded of 2 chapters");
    }
}

//! Colored terminal output for build summaries.

use std::fmt::Display;
use std::time::Duration;

use console::{Style, Term};
use ssg_build::BuildReport;

/// Terminal output formatter writing to stderr.
pub(crate) struct Output {
    term: Term,
    green: Style,
    yellow: Style,
    red: Style,
    cyan_bold: Style,
    dim: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            cyan_bold: Style::new().cyan().bold(),
            dim: Style::new().dim(),
        }
    }

    fn line(&self, style: &Style, msg: impl Display) {
        let _ = self.term.write_line(&style.apply_to(msg).to_string());
    }

    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    pub(crate) fn success(&self, msg: &str) {
        self.line(&self.green, msg);
    }

    pub(crate) fn warning(&self, msg: &str) {
        self.line(&self.yellow, msg);
    }

    pub(crate) fn error(&self, msg: &str) {
        self.line(&self.red, msg);
    }

    /// Print the counters of a finished build.
    pub(crate) fn summary(&self, report: &BuildReport) {
        self.line(&self.cyan_bold, "Build summary");
        self.line(&self.dim, "-".repeat(32));
        self.stat("Discovered", report.total_files);
        self.stat("Rebuilt", report.built_files);
        self.stat("Up to date", report.skipped_files);
        self.stat("Copied", report.copied_files);
        self.stat("Failed", report.failed_files);
        self.stat("Purged", report.purged_entries);
        self.stat("Elapsed", format_elapsed(report.elapsed));

        if report.failed_files > 0 {
            self.warning(&format!("{} page(s) failed and will be retried", report.failed_files));
        }
    }

    fn stat(&self, label: &str, value: impl Display) {
        let _ = self.term.write_line(&format!("  {label:<12}{value:>10}"));
    }
}

/// Render a duration as milliseconds below ten seconds, seconds above.
fn format_elapsed(elapsed: Duration) -> String {
    if elapsed < Duration::from_secs(10) {
        format!("{}ms", elapsed.as_millis())
    } else {
        format!("{:.1}s", elapsed.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(42)), "42ms");
        assert_eq!(format_elapsed(Duration::from_millis(12_340)), "12.3s");
    }
}

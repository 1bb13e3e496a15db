//! C7: console progress reporting.
//!
//! One line per project, plus a summary tally. Diagnostics themselves
//! are never colorized — only the pass/fail markers are, so piping
//! output to a file or another tool still gets a plain diagnostic line.

use colored::Colorize;

/// Running tally of a validate run.
#[derive(Debug, Default)]
pub struct Report {
    pub passed: u32,
    pub failed: u32,
}

impl Report {
    pub fn new() -> Self {
        Report::default()
    }

    pub fn pass(&mut self, label: &str) {
        self.passed += 1;
        println!("{} {label}", "●".green());
    }

    pub fn fail(&mut self, label: &str, diagnostic: &str) {
        self.failed += 1;
        println!("{} {label}", "●".red());
        println!("  {diagnostic}");
    }

    pub fn summary(&self) -> String {
        format!(
            "{} passed, {} failed",
            self.passed.to_string().green(),
            self.failed.to_string().red()
        )
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

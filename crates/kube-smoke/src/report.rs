//! Verdicts and the result book that records them.

use std::fmt;

use colored::Colorize;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Outcome reported for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass(String),
    Fail(String),
    Skip(String),
}

impl Verdict {
    /// Send this verdict to a reporter under `target`.
    pub fn report(self, target: &str, reporter: &mut dyn Reporter) {
        match self {
            Self::Pass(message) => reporter.pass(target, message),
            Self::Fail(message) => reporter.fail(target, message),
            Self::Skip(message) => reporter.skip(target, message),
        }
    }
}

/// Sink for target verdicts, keyed by target name.
pub trait Reporter {
    fn pass(&mut self, target: &str, message: String);
    fn fail(&mut self, target: &str, message: String);
    fn skip(&mut self, target: &str, message: String);
}

/// The result of a smoke check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Fail,
    Skip,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
            Self::Skip => write!(f, "SKIP"),
        }
    }
}

/// A single recorded check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub details: String,
}

/// Ordered record of every verdict reported during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResults {
    pub timestamp: String,
    pub checks: Vec<CheckResult>,
}

impl Default for TestResults {
    fn default() -> Self {
        Self::new()
    }
}

impl TestResults {
    #[must_use]
    pub fn new() -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            checks: Vec::new(),
        }
    }

    fn record(&mut self, name: &str, status: CheckStatus, details: String) {
        self.checks.push(CheckResult {
            name: name.to_string(),
            status,
            details,
        });
    }

    #[must_use]
    pub fn total_checks(&self) -> usize {
        self.checks.len()
    }

    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.count(CheckStatus::Pass)
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(CheckStatus::Fail)
    }

    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(CheckStatus::Skip)
    }

    fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    /// Skips do not count against the run.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }

    /// Render the results as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Print one line per check followed by the totals.
    pub fn print_summary(&self) {
        println!();
        println!("{}", "═".repeat(70).bright_black());
        println!("{}", "SMOKE TEST RESULTS".cyan().bold());
        println!("{}", "═".repeat(70).bright_black());

        for check in &self.checks {
            let status = match check.status {
                CheckStatus::Pass => "✓ PASS".green().bold(),
                CheckStatus::Fail => "✗ FAIL".red().bold(),
                CheckStatus::Skip => "⏭ SKIP".yellow().bold(),
            };
            println!("  {status} {} {}", check.name.bold(), check.details.bright_black());
        }

        println!("{}", "═".repeat(70).bright_black());
        println!(
            "  {} passed, {} failed, {} skipped ({} total)",
            self.passed_count().to_string().green(),
            self.failed_count().to_string().red(),
            self.skipped_count().to_string().yellow(),
            self.total_checks()
        );
        println!();
    }
}

impl Reporter for TestResults {
    fn pass(&mut self, target: &str, message: String) {
        info!(target_name = %target, "{message}");
        self.record(target, CheckStatus::Pass, message);
    }

    fn fail(&mut self, target: &str, message: String) {
        warn!(target_name = %target, "FAIL: {message}");
        self.record(target, CheckStatus::Fail, message);
    }

    fn skip(&mut self, target: &str, message: String) {
        info!(target_name = %target, "SKIP: {message}");
        self.record(target, CheckStatus::Skip, message);
    }
}

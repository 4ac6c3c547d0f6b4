//! Result types produced by a harness run and their plain-text rendering.
//!
//! A [`CheckResult`] is created exactly once per probe and never mutated afterwards; the
//! [`RunReport`] collects them in declaration order and derives the binary [`Overall`] verdict
//! used by automation.

use serde::Serialize;
use serde_json::Value;
use std::fmt::{self, Write as _};

/// Outcome attached to a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    /// The capability behaved as expected.
    Pass,
    /// The check completed but surfaced something worth a look.
    Warn,
    /// The capability is broken or unreachable.
    Fail,
    /// The check did not run because its precondition was unmet.
    Skip,
}

impl CheckStatus {
    /// Upper-case label used in reports.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Warn => "WARN",
            Self::Fail => "FAIL",
            Self::Skip => "SKIP",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Immutable record of one probe execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    name: String,
    status: CheckStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<Value>,
}

impl CheckResult {
    /// Build a result with the given status and message.
    pub fn new(name: impl Into<String>, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.into(),
            detail: None,
        }
    }

    /// Shorthand for a [`CheckStatus::Warn`] result.
    pub fn warn(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Warn, message)
    }

    /// Shorthand for a [`CheckStatus::Fail`] result.
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Fail, message)
    }

    /// Shorthand for a [`CheckStatus::Skip`] result.
    pub fn skip(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Skip, message)
    }

    /// Attach a structured payload. Consumes the result so it cannot change once handed out.
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Probe name that produced this result.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Outcome of the check.
    pub fn status(&self) -> CheckStatus {
        self.status
    }

    /// Human-readable explanation.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Optional structured payload for diagnostics.
    pub fn detail(&self) -> Option<&Value> {
        self.detail.as_ref()
    }
}

/// Binary verdict of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Overall {
    /// No check failed.
    Pass,
    /// At least one check failed.
    Fail,
}

impl Overall {
    /// Process exit code for this verdict.
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Pass => 0,
            Self::Fail => 1,
        }
    }
}

/// Aggregated outcome of one harness execution.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    results: Vec<CheckResult>,
    overall: Overall,
    started_at: String,
    elapsed_ms: u64,
}

impl RunReport {
    /// Build a report, deriving the overall verdict from the results.
    pub fn new(results: Vec<CheckResult>, started_at: String, elapsed_ms: u64) -> Self {
        let overall = overall_of(&results);
        Self {
            results,
            overall,
            started_at,
            elapsed_ms,
        }
    }

    /// Results in probe declaration order.
    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    /// Overall verdict: FAIL iff any result failed.
    pub fn overall(&self) -> Overall {
        self.overall
    }

    /// Wall-clock duration of the run.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// `(name, status)` pairs, handy for comparing runs.
    pub fn outcomes(&self) -> Vec<(&str, CheckStatus)> {
        self.results
            .iter()
            .map(|result| (result.name(), result.status()))
            .collect()
    }

    /// Number of results carrying the given status.
    pub fn count(&self, status: CheckStatus) -> usize {
        self.results
            .iter()
            .filter(|result| result.status() == status)
            .count()
    }
}

fn overall_of(results: &[CheckResult]) -> Overall {
    if results
        .iter()
        .any(|result| result.status() == CheckStatus::Fail)
    {
        Overall::Fail
    } else {
        Overall::Pass
    }
}

/// Render a report as plain text, one line per check followed by a summary line.
pub fn render_text(report: &RunReport) -> String {
    let mut out = String::new();
    for result in report.results() {
        let _ = writeln!(
            out,
            "[{}] {:<24} {}",
            result.status(),
            result.name(),
            result.message()
        );
    }
    let _ = writeln!(
        out,
        "\n{} passed, {} warned, {} failed, {} skipped in {}ms: {}",
        report.count(CheckStatus::Pass),
        report.count(CheckStatus::Warn),
        report.count(CheckStatus::Fail),
        report.count(CheckStatus::Skip),
        report.elapsed_ms(),
        match report.overall() {
            Overall::Pass => "PASS",
            Overall::Fail => "FAIL",
        }
    );
    out
}

/// Render a report as pretty JSON, falling back to compact output on error.
pub fn render_json(report: &RunReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|error| {
        tracing::warn!(%error, "Failed to serialize report prettily");
        serde_json::to_string(report).unwrap_or_else(|_| "{}".into())
    })
}

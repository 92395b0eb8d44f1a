//! Check results: findings, per-check reports and submission summaries.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Severity of a single finding. Ordered so that `Critical` is the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warn,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warn => write!(f, "WARN"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// The individual checks a submission goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Name,
    Iso,
    Boundary,
    Projection,
    Meta,
    License,
}

impl CheckKind {
    /// Checks in the order `all_checks` runs them
    pub fn all() -> &'static [CheckKind] {
        &[
            CheckKind::Name,
            CheckKind::Iso,
            CheckKind::Boundary,
            CheckKind::Projection,
            CheckKind::Meta,
            CheckKind::License,
        ]
    }
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckKind::Name => write!(f, "name"),
            CheckKind::Iso => write!(f, "iso"),
            CheckKind::Boundary => write!(f, "boundary"),
            CheckKind::Projection => write!(f, "projection"),
            CheckKind::Meta => write!(f, "meta"),
            CheckKind::License => write!(f, "license"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.severity, self.message)
    }
}

/// Findings produced by one check against one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub kind: CheckKind,
    pub source: PathBuf,
    pub findings: Vec<Finding>,
}

impl CheckReport {
    pub fn new(kind: CheckKind, source: impl AsRef<Path>) -> Self {
        Self {
            kind,
            source: source.as_ref().to_path_buf(),
            findings: Vec::new(),
        }
    }

    /// Record a finding and emit it as a tracing event of matching level.
    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Info => info!(check = %self.kind, "{}", message),
            Severity::Warn => warn!(check = %self.kind, "{}", message),
            Severity::Critical => error!(check = %self.kind, "{}", message),
        }
        self.findings.push(Finding { severity, message });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Severity::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Severity::Warn, message);
    }

    pub fn critical(&mut self, message: impl Into<String>) {
        self.push(Severity::Critical, message);
    }

    /// True when no finding is critical
    pub fn passed(&self) -> bool {
        self.worst() != Some(Severity::Critical)
    }

    /// Highest severity among the findings
    pub fn worst(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    pub fn has_message(&self, needle: &str) -> bool {
        self.findings.iter().any(|f| f.message.contains(needle))
    }
}

/// All reports for one submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub path: PathBuf,
    pub reports: Vec<CheckReport>,
}

impl SubmissionReport {
    pub fn passed(&self) -> bool {
        self.reports.iter().all(CheckReport::passed)
    }

    pub fn report(&self, kind: CheckKind) -> Option<&CheckReport> {
        self.reports.iter().find(|r| r.kind == kind)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.reports.iter().map(|r| r.count(severity)).sum()
    }
}

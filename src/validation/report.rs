//! Validation findings and the aggregated report.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a single finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// Which check group produced a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Video file existence, format, and size
    Video,
    /// Interaction artifact structure and malformed-record ratio
    Structure,
    /// Event counts and interaction density
    Content,
    /// Mutual timing consistency of video and interaction log
    Synchronization,
    /// Quality of the generated command text
    Output,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Video => "video",
            Category::Structure => "structure",
            Category::Content => "content",
            Category::Synchronization => "synchronization",
            Category::Output => "output",
        }
    }
}

/// One reported issue with a severity and optional remediation advice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFinding {
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    pub suggestion: Option<String>,
}

impl ValidationFinding {
    pub fn info(category: Category, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            category,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn warning(category: Category, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            category,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn error(category: Category, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            category,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Ordered aggregation of findings for one validation run.
///
/// Produced fresh per run, never mutated afterwards. `is_valid` is the sole
/// gate the orchestrator consults before spending the external call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    findings: Vec<ValidationFinding>,
}

impl ValidationReport {
    pub fn new(findings: Vec<ValidationFinding>) -> Self {
        Self { findings }
    }

    /// True iff no finding has error severity
    pub fn is_valid(&self) -> bool {
        self.error_count() == 0
    }

    pub fn findings(&self) -> &[ValidationFinding] {
        &self.findings
    }

    pub fn error_count(&self) -> usize {
        self.by_severity(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.by_severity(Severity::Warning)
    }

    fn by_severity(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    /// Findings in a given category
    pub fn in_category(&self, category: Category) -> Vec<&ValidationFinding> {
        self.findings
            .iter()
            .filter(|f| f.category == category)
            .collect()
    }

    pub fn extend(&mut self, findings: Vec<ValidationFinding>) {
        self.findings.extend(findings);
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for finding in &self.findings {
            writeln!(
                f,
                "[{:>7}] {}: {}",
                finding.severity.as_str(),
                finding.category.as_str(),
                finding.message
            )?;
            if let Some(suggestion) = &finding.suggestion {
                writeln!(f, "          hint: {}", suggestion)?;
            }
        }
        write!(
            f,
            "{} error(s), {} warning(s)",
            self.error_count(),
            self.warning_count()
        )
    }
}

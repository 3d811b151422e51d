//! Shared data models for rule documents, violations, and reports.

pub mod check;
pub mod rules;

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
/// Whether a violation blocks a pass verdict.
pub enum Severity {
    #[serde(rename = "MUST", alias = "must")]
    Must,
    #[serde(rename = "SHOULD", alias = "should")]
    Should,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Must => "MUST",
            Severity::Should => "SHOULD",
        }
    }

    pub fn blocks_pass(self) -> bool {
        matches!(self, Severity::Must)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Rule category. Declaration order is the grouping order of human reports.
pub enum Category {
    Structure,
    Style,
    Testing,
    Workflow,
    Deployment,
    /// Reserved for violations raised when a rule itself fails.
    Internal,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Structure,
        Category::Style,
        Category::Testing,
        Category::Workflow,
        Category::Deployment,
        Category::Internal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Structure => "structure",
            Category::Style => "style",
            Category::Testing => "testing",
            Category::Workflow => "workflow",
            Category::Deployment => "deployment",
            Category::Internal => "internal",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A single failed constraint, optionally scoped to a file.
pub struct Violation {
    pub rule: String,
    pub category: Category,
    pub severity: Severity,
    pub path: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Violation counts by severity.
pub struct Summary {
    pub must: usize,
    pub should: usize,
    pub total: usize,
    pub files: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Result of evaluating a rule set against a snapshot.
pub struct ComplianceReport {
    pub pass: bool,
    pub summary: Summary,
    pub violations: Vec<Violation>,
    pub warnings: Vec<String>,
}

impl ComplianceReport {
    /// Build a report, deriving `pass` and the summary from `violations`.
    pub fn new(violations: Vec<Violation>, warnings: Vec<String>, files: usize) -> Self {
        let must = violations
            .iter()
            .filter(|v| v.severity.blocks_pass())
            .count();
        let summary = Summary {
            must,
            should: violations.len() - must,
            total: violations.len(),
            files,
        };
        ComplianceReport {
            pass: must == 0,
            summary,
            violations,
            warnings,
        }
    }
}

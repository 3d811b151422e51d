//! conform core library.
//!
//! This crate exposes programmatic APIs for checking a project tree against
//! a declarative rule set: load rules, scan the tree into an immutable
//! snapshot, evaluate, and render a report.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `ruleset`: Rule document loading, validation, and built-in defaults.
//! - `scanner`: Directory traversal producing a `ProjectSnapshot`.
//! - `snapshot`: The immutable snapshot and its query helpers.
//! - `checks`: Implementation of rule predicates.
//! - `engine`: Fail-soft evaluation of a rule set against a snapshot.
//! - `models`: Data models for rule documents, violations, and reports.
//! - `output`: Structured/human report rendering.
//! - `app`: The end-to-end check pipeline.
//! - `error`: Error types.
//! - `utils`: Supporting helpers.
pub mod app;
pub mod checks;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod output;
pub mod ruleset;
pub mod scanner;
pub mod snapshot;
pub mod utils;

pub use engine::evaluate;
pub use error::{Error, EvalError, Result};
pub use models::{Category, ComplianceReport, Severity, Violation};
pub use output::render;
pub use ruleset::{Rule, RuleSet, RuleSource};
pub use scanner::ProjectScanner;
pub use snapshot::ProjectSnapshot;

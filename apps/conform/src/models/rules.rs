//! Rule document schema: an ordered list of `[[rules]]` entries.

use super::check::Check;
use super::{Category, Severity};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
/// Top-level rule document.
pub struct RuleDoc {
    #[serde(default)]
    pub rules: Vec<RuleDef>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
/// A rule entry as written in the document, before validation.
pub struct RuleDef {
    pub id: String,
    pub category: Category,
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
    /// Replaces the generated violation message when set.
    #[serde(default)]
    pub message: Option<String>,
    /// The rule only applies when this relative path exists.
    #[serde(default)]
    pub when_exists: Option<String>,
    pub check: Check,
}

//! Predicate shapes a rule can declare.
//!
//! Each rule carries exactly one check, selected by the `kind` field:
//! - `path_exists`: a file or directory must exist.
//! - `forbidden_path`: nothing may match the given globs.
//! - `require_match`: at least `min` files must match a glob.
//! - `required_content`: a file must contain every listed substring.
//! - `forbidden_content`: matched files must not contain a regex.
//! - `max_line_length`: matched files must keep lines within `max` chars.
//! - `numeric_threshold`: a number captured from a file must lie within bounds.
//!
//! Globs are matched against `/`-separated paths relative to the project root.

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
/// Entry type expected by `path_exists`.
pub enum EntryKind {
    Dir,
    File,
    #[default]
    Any,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
/// Checks supported by the engine.
pub enum Check {
    PathExists {
        path: String,
        #[serde(default, rename = "type")]
        entry: EntryKind,
    },
    ForbiddenPath {
        patterns: Vec<String>,
    },
    RequireMatch {
        pattern: String,
        #[serde(default = "default_min_matches")]
        min: usize,
    },
    RequiredContent {
        path: String,
        contains: Vec<String>,
    },
    ForbiddenContent {
        patterns: Vec<String>,
        regex: String,
    },
    MaxLineLength {
        patterns: Vec<String>,
        max: usize,
    },
    NumericThreshold {
        path: String,
        /// Must contain a capture group; the first group is parsed as a number.
        regex: String,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
}

fn default_min_matches() -> usize {
    1
}

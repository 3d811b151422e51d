//! Rule set loading and validation.
//!
//! A rule document (TOML, YAML, or JSON) is parsed into `RuleDef`s and then
//! compiled: globs and regexes are built once, ids are checked for
//! uniqueness, and parameters are validated. Any problem is a fatal
//! `Error::Config` raised before scanning starts.

use crate::error::{Error, Result};
use crate::models::check::{Check, EntryKind};
use crate::models::rules::{RuleDoc, RuleDef};
use crate::models::{Category, Severity};
use glob::Pattern;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

const DEFAULT_RULES: &str = include_str!("../rules/default.toml");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    Toml,
    Yaml,
    Json,
}

impl DocFormat {
    /// Format by file extension; unknown extensions are read as TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => DocFormat::Yaml,
            Some("json") => DocFormat::Json,
            _ => DocFormat::Toml,
        }
    }
}

/// Raw rule document plus where it came from.
pub struct RuleSource {
    pub origin: String,
    pub format: DocFormat,
    pub text: String,
}

impl RuleSource {
    pub fn new(origin: impl Into<String>, format: DocFormat, text: impl Into<String>) -> Self {
        RuleSource {
            origin: origin.into(),
            format,
            text: text.into(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let origin = path.to_string_lossy().to_string();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::config(origin.clone(), format!("cannot read rule set: {}", e)))?;
        Ok(RuleSource::new(origin, DocFormat::from_path(path), text))
    }
}

/// Compiled form of a `Check`.
#[derive(Debug, Clone)]
pub enum Predicate {
    PathExists {
        path: String,
        entry: EntryKind,
    },
    ForbiddenPath {
        patterns: Vec<Pattern>,
    },
    RequireMatch {
        pattern: Pattern,
        min: usize,
    },
    RequiredContent {
        path: String,
        contains: Vec<String>,
    },
    ForbiddenContent {
        patterns: Vec<Pattern>,
        regex: Regex,
    },
    MaxLineLength {
        patterns: Vec<Pattern>,
        max: usize,
    },
    NumericThreshold {
        path: String,
        regex: Regex,
        min: Option<f64>,
        max: Option<f64>,
    },
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub category: Category,
    pub severity: Severity,
    pub description: String,
    pub message: Option<String>,
    pub when_exists: Option<String>,
    pub predicate: Predicate,
}

#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn load(source: &RuleSource) -> Result<Self> {
        let origin = source.origin.as_str();
        let doc: RuleDoc = match source.format {
            DocFormat::Toml => toml::from_str(&source.text)
                .map_err(|e| Error::config(origin, e.to_string()))?,
            DocFormat::Yaml => serde_yaml::from_str(&source.text)
                .map_err(|e| Error::config(origin, e.to_string()))?,
            DocFormat::Json => serde_json::from_str(&source.text)
                .map_err(|e| Error::config(origin, e.to_string()))?,
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut rules = Vec::with_capacity(doc.rules.len());
        for def in doc.rules {
            if def.id.trim().is_empty() {
                return Err(Error::config(origin, "rule id must not be empty"));
            }
            if !seen.insert(def.id.clone()) {
                return Err(Error::config(
                    origin,
                    format!("duplicate rule id '{}'", def.id),
                ));
            }
            rules.push(compile(def).map_err(|msg| Error::config(origin, msg))?);
        }
        debug!(origin, rules = rules.len(), "rule set loaded");
        Ok(RuleSet { rules })
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        RuleSet::load(&RuleSource::from_path(path)?)
    }

    /// Built-in rules mirroring the agent development conventions.
    pub fn defaults() -> Result<Self> {
        RuleSet::load(&RuleSource::new("<builtin>", DocFormat::Toml, DEFAULT_RULES))
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Drop rules by id, keeping the order of the rest.
    pub fn without(mut self, ids: &[String]) -> Self {
        self.rules.retain(|r| !ids.contains(&r.id));
        self
    }
}

fn compile(def: RuleDef) -> std::result::Result<Rule, String> {
    let id = def.id;
    if def.category == Category::Internal {
        return Err(format!(
            "rule '{}': category 'internal' is reserved for rule failures",
            id
        ));
    }
    let predicate = match def.check {
        Check::PathExists { path, entry } => Predicate::PathExists {
            path: non_empty(&id, "path", path)?,
            entry,
        },
        Check::ForbiddenPath { patterns } => Predicate::ForbiddenPath {
            patterns: globs(&id, &patterns)?,
        },
        Check::RequireMatch { pattern, min } => {
            if min == 0 {
                return Err(format!("rule '{}': min must be at least 1", id));
            }
            Predicate::RequireMatch {
                pattern: glob_one(&id, &pattern)?,
                min,
            }
        }
        Check::RequiredContent { path, contains } => {
            if contains.is_empty() {
                return Err(format!("rule '{}': contains must not be empty", id));
            }
            Predicate::RequiredContent {
                path: non_empty(&id, "path", path)?,
                contains,
            }
        }
        Check::ForbiddenContent { patterns, regex } => Predicate::ForbiddenContent {
            patterns: globs(&id, &patterns)?,
            regex: build_regex(&id, &regex)?,
        },
        Check::MaxLineLength { patterns, max } => {
            if max == 0 {
                return Err(format!("rule '{}': max must be at least 1", id));
            }
            Predicate::MaxLineLength {
                patterns: globs(&id, &patterns)?,
                max,
            }
        }
        Check::NumericThreshold {
            path,
            regex,
            min,
            max,
        } => {
            let re = build_regex(&id, &regex)?;
            if re.captures_len() < 2 {
                return Err(format!(
                    "rule '{}': regex needs a capture group for the value",
                    id
                ));
            }
            if min.into_iter().chain(max).any(|b| !b.is_finite()) {
                return Err(format!("rule '{}': bounds must be finite numbers", id));
            }
            match (min, max) {
                (None, None) => {
                    return Err(format!("rule '{}': set min and/or max", id));
                }
                (Some(lo), Some(hi)) if lo > hi => {
                    return Err(format!("rule '{}': min {} exceeds max {}", id, lo, hi));
                }
                _ => {}
            }
            Predicate::NumericThreshold {
                path: non_empty(&id, "path", path)?,
                regex: re,
                min,
                max,
            }
        }
    };
    Ok(Rule {
        id,
        category: def.category,
        severity: def.severity,
        description: def.description,
        message: def.message,
        when_exists: def.when_exists,
        predicate,
    })
}

fn non_empty(id: &str, field: &str, value: String) -> std::result::Result<String, String> {
    if value.trim().is_empty() {
        Err(format!("rule '{}': {} must not be empty", id, field))
    } else {
        Ok(value)
    }
}

fn glob_one(id: &str, pattern: &str) -> std::result::Result<Pattern, String> {
    Pattern::new(pattern).map_err(|e| format!("rule '{}': bad glob '{}': {}", id, pattern, e))
}

fn globs(id: &str, patterns: &[String]) -> std::result::Result<Vec<Pattern>, String> {
    if patterns.is_empty() {
        return Err(format!("rule '{}': patterns must not be empty", id));
    }
    patterns.iter().map(|p| glob_one(id, p)).collect()
}

fn build_regex(id: &str, source: &str) -> std::result::Result<Regex, String> {
    Regex::new(source).map_err(|e| format!("rule '{}': bad regex: {}", id, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toml_src(text: &str) -> RuleSource {
        RuleSource::new("test.toml", DocFormat::Toml, text)
    }

    #[test]
    fn test_defaults_load_in_declaration_order() {
        let rs = RuleSet::defaults().unwrap();
        let ids: Vec<&str> = rs.rules().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.first(), Some(&"structure.agents-dir"));
        assert!(ids.contains(&"structure.tests-dir"));
        assert!(ids.contains(&"testing.coverage-threshold"));
    }

    #[test]
    fn test_duplicate_id_is_config_error() {
        let src = toml_src(
            r#"
[[rules]]
id = "a"
category = "structure"
severity = "MUST"
check = { kind = "path_exists", path = "tests", type = "dir" }

[[rules]]
id = "a"
category = "style"
severity = "SHOULD"
check = { kind = "path_exists", path = "src" }
"#,
        );
        let err = RuleSet::load(&src).unwrap_err();
        match err {
            Error::Config { message, .. } => assert!(message.contains("duplicate rule id 'a'")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_definitions_rejected() {
        let cases = [
            // unknown kind
            r#"[[rules]]
id = "x"
category = "style"
severity = "MUST"
check = { kind = "telepathy" }"#,
            // unknown severity
            r#"[[rules]]
id = "x"
category = "style"
severity = "MAYBE"
check = { kind = "path_exists", path = "a" }"#,
            // reserved category
            r#"[[rules]]
id = "x"
category = "internal"
severity = "MUST"
check = { kind = "path_exists", path = "a" }"#,
            // threshold without capture group
            r#"[[rules]]
id = "x"
category = "testing"
severity = "MUST"
check = { kind = "numeric_threshold", path = "pyproject.toml", regex = "fail_under", min = 80 }"#,
            // bad glob
            r#"[[rules]]
id = "x"
category = "style"
severity = "SHOULD"
check = { kind = "max_line_length", patterns = ["[*.py"], max = 100 }"#,
            // inverted bounds
            r#"[[rules]]
id = "x"
category = "testing"
severity = "MUST"
check = { kind = "numeric_threshold", path = "a", regex = "(\\d+)", min = 90, max = 10 }"#,
            "not = [valid toml",
        ];
        for c in cases {
            let err = RuleSet::load(&toml_src(c)).unwrap_err();
            assert!(matches!(err, Error::Config { .. }), "accepted: {c}");
        }
    }

    #[test]
    fn test_non_finite_threshold_bounds_rejected() {
        for bound in ["min = nan", "max = inf", "min = -inf"] {
            let src = toml_src(&format!(
                r#"[[rules]]
id = "cov"
category = "testing"
severity = "MUST"
check = {{ kind = "numeric_threshold", path = "pyproject.toml", regex = "(\\d+)", {} }}"#,
                bound
            ));
            let err = RuleSet::load(&src).unwrap_err();
            match err {
                Error::Config { message, .. } => assert!(message.contains("finite"), "{message}"),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_yaml_and_json_documents() {
        let yaml = r#"
rules:
  - id: tests
    category: structure
    severity: must
    check:
      kind: path_exists
      path: tests
      type: dir
"#;
        let rs = RuleSet::load(&RuleSource::new("r.yaml", DocFormat::Yaml, yaml)).unwrap();
        assert_eq!(rs.rules()[0].severity, Severity::Must);

        let json = r#"{"rules":[{"id":"cov","category":"testing","severity":"SHOULD",
            "check":{"kind":"numeric_threshold","path":"pyproject.toml","regex":"fail_under\\s*=\\s*(\\d+)","min":80}}]}"#;
        let rs = RuleSet::load(&RuleSource::new("r.json", DocFormat::Json, json)).unwrap();
        assert!(matches!(
            rs.rules()[0].predicate,
            Predicate::NumericThreshold { min: Some(m), .. } if m == 80.0
        ));
    }

    #[test]
    fn test_without_keeps_order() {
        let rs = RuleSet::defaults()
            .unwrap()
            .without(&["structure.agents-dir".to_string()]);
        assert!(rs.rules().iter().all(|r| r.id != "structure.agents-dir"));
        assert_eq!(rs.rules()[0].id, "structure.tools-dir");
    }

    #[test]
    fn test_missing_rule_file_is_config_error() {
        let err = RuleSet::load_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocFormat::from_path(Path::new("r.yml")), DocFormat::Yaml);
        assert_eq!(DocFormat::from_path(Path::new("r.json")), DocFormat::Json);
        assert_eq!(DocFormat::from_path(Path::new("rules")), DocFormat::Toml);
    }
}

//! Implementation of rule predicates.
//!
//! Each predicate reads the snapshot and returns the findings it produced,
//! at most one per (rule, file). A predicate that cannot finish (for
//! example, a content rule pointed at a binary file) returns an
//! `EvalError`; the engine turns that into an `internal` violation.

use crate::error::EvalError;
use crate::models::check::EntryKind;
use crate::ruleset::Predicate;
use crate::snapshot::ProjectSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A failed constraint before rule metadata is attached.
pub struct Finding {
    pub path: Option<String>,
    pub message: String,
}

impl Finding {
    fn at(path: &str, message: String) -> Self {
        Finding {
            path: Some(path.to_string()),
            message,
        }
    }
}

/// Evaluate a compiled predicate against `snap`.
pub fn run_check(pred: &Predicate, snap: &ProjectSnapshot) -> Result<Vec<Finding>, EvalError> {
    match pred {
        Predicate::PathExists { path, entry } => Ok(path_exists(snap, path, *entry)),
        Predicate::ForbiddenPath { patterns } => {
            let mut hits: Vec<Finding> = snap
                .matching_dirs(patterns)
                .map(|d| Finding::at(d, format!("Forbidden directory present: {}", d)))
                .chain(
                    snap.matching_files(patterns)
                        .map(|f| Finding::at(f, format!("Forbidden file present: {}", f))),
                )
                .collect();
            hits.sort_by(|a, b| a.path.cmp(&b.path));
            Ok(hits)
        }
        Predicate::RequireMatch { pattern, min } => {
            let found = snap
                .matching_files(std::slice::from_ref(pattern))
                .count();
            if found >= *min {
                Ok(Vec::new())
            } else {
                Ok(vec![Finding {
                    path: None,
                    message: format!(
                        "Expected at least {} file(s) matching '{}', found {}",
                        min,
                        pattern.as_str(),
                        found
                    ),
                }])
            }
        }
        Predicate::RequiredContent { path, contains } => {
            if !snap.is_file(path) {
                return Ok(vec![Finding::at(
                    path,
                    format!("Required file is missing: {}", path),
                )]);
            }
            let text = snap.text(path)?;
            let missing: Vec<&str> = contains
                .iter()
                .map(String::as_str)
                .filter(|needle| !text.contains(needle))
                .collect();
            if missing.is_empty() {
                Ok(Vec::new())
            } else {
                Ok(vec![Finding::at(
                    path,
                    format!("Missing required content: {}", missing.join(", ")),
                )])
            }
        }
        Predicate::ForbiddenContent { patterns, regex } => {
            let mut out = Vec::new();
            for file in snap.matching_files(patterns) {
                let text = snap.text(file)?;
                let mut lines = text
                    .lines()
                    .enumerate()
                    .filter(|(_, l)| regex.is_match(l));
                if let Some((first, _)) = lines.next() {
                    let count = 1 + lines.count();
                    out.push(Finding::at(
                        file,
                        format!(
                            "Forbidden pattern /{}/ found on {} line(s), first at line {}",
                            regex.as_str(),
                            count,
                            first + 1
                        ),
                    ));
                } else if regex.is_match(text) {
                    // Multi-line pattern: report without a line number.
                    out.push(Finding::at(
                        file,
                        format!("Forbidden pattern /{}/ found", regex.as_str()),
                    ));
                }
            }
            Ok(out)
        }
        Predicate::MaxLineLength { patterns, max } => {
            let mut out = Vec::new();
            for file in snap.matching_files(patterns) {
                let text = snap.text(file)?;
                let mut long = text
                    .lines()
                    .enumerate()
                    .map(|(i, l)| (i, l.chars().count()))
                    .filter(|(_, n)| n > max);
                if let Some((first, width)) = long.next() {
                    let count = 1 + long.count();
                    out.push(Finding::at(
                        file,
                        format!(
                            "{} line(s) exceed {} characters, first at line {} ({} chars)",
                            count,
                            max,
                            first + 1,
                            width
                        ),
                    ));
                }
            }
            Ok(out)
        }
        Predicate::NumericThreshold {
            path,
            regex,
            min,
            max,
        } => {
            if !snap.is_file(path) {
                return Ok(vec![Finding::at(
                    path,
                    format!("Required file is missing: {}", path),
                )]);
            }
            let text = snap.text(path)?;
            let raw = match regex.captures(text).and_then(|c| c.get(1)) {
                Some(m) => m.as_str(),
                None => {
                    return Ok(vec![Finding::at(
                        path,
                        format!("No value matching /{}/ declared", regex.as_str()),
                    )]);
                }
            };
            let bad_number = || EvalError::BadNumber {
                path: path.clone(),
                value: raw.to_string(),
            };
            let value: f64 = raw.trim().parse().map_err(|_| bad_number())?;
            // NaN compares false against every bound.
            if !value.is_finite() {
                return Err(bad_number());
            }
            let mut out = Vec::new();
            if let Some(lo) = min {
                if value < *lo {
                    out.push(Finding::at(
                        path,
                        format!("Value {} is below the required minimum {}", value, lo),
                    ));
                }
            }
            if let Some(hi) = max {
                if value > *hi {
                    out.push(Finding::at(
                        path,
                        format!("Value {} is above the allowed maximum {}", value, hi),
                    ));
                }
            }
            Ok(out)
        }
    }
}

fn path_exists(snap: &ProjectSnapshot, path: &str, entry: EntryKind) -> Vec<Finding> {
    let ok = match entry {
        EntryKind::Dir => snap.is_dir(path),
        EntryKind::File => snap.is_file(path),
        EntryKind::Any => snap.exists(path),
    };
    if ok {
        return Vec::new();
    }
    let message = match entry {
        EntryKind::Dir if snap.is_file(path) => format!("Expected a directory, found a file: {}", path),
        EntryKind::File if snap.is_dir(path) => format!("Expected a file, found a directory: {}", path),
        EntryKind::Dir => format!("Required directory is missing: {}", path),
        EntryKind::File => format!("Required file is missing: {}", path),
        EntryKind::Any => format!("Required path is missing: {}", path),
    };
    vec![Finding::at(path, message)]
}

//! Compliance engine: applies every rule of a rule set to a snapshot.
//!
//! Rules run in parallel over the shared read-only snapshot; results are
//! put back in declaration order before the report is built, so output does
//! not depend on scheduling. A rule that errors or panics yields a single
//! `internal` violation and never prevents other rules from running.

use crate::checks::run_check;
use crate::error::EvalError;
use crate::models::{Category, ComplianceReport, Violation};
use crate::ruleset::{Rule, RuleSet};
use crate::snapshot::ProjectSnapshot;
use rayon::prelude::*;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

thread_local! {
    static IN_GUARD: Cell<bool> = const { Cell::new(false) };
}

/// Route panics raised inside a rule predicate to the debug log.
///
/// Panics anywhere else still reach the previously installed hook.
pub fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if IN_GUARD.with(Cell::get) {
            debug!(panic = %info, "predicate panicked");
        } else {
            previous(info);
        }
    }));
}

/// Evaluate `rules` against `snap`.
pub fn evaluate(rules: &RuleSet, snap: &ProjectSnapshot) -> ComplianceReport {
    let mut per_rule: Vec<(usize, Vec<Violation>)> = rules
        .rules()
        .par_iter()
        .enumerate()
        .map(|(idx, rule)| (idx, evaluate_rule(rule, snap)))
        .collect();
    per_rule.sort_by_key(|(idx, _)| *idx);

    let violations: Vec<Violation> = per_rule.into_iter().flat_map(|(_, v)| v).collect();
    ComplianceReport::new(
        violations,
        snap.warnings().to_vec(),
        snap.files().len(),
    )
}

fn evaluate_rule(rule: &Rule, snap: &ProjectSnapshot) -> Vec<Violation> {
    if let Some(gate) = rule.when_exists.as_deref() {
        if !snap.exists(gate) {
            debug!(rule = %rule.id, gate, "rule not applicable");
            return Vec::new();
        }
    }

    let outcome = guarded(|| run_check(&rule.predicate, snap));

    match outcome {
        Ok(findings) => {
            debug!(rule = %rule.id, violations = findings.len(), "rule evaluated");
            findings
                .into_iter()
                .map(|f| Violation {
                    rule: rule.id.clone(),
                    category: rule.category,
                    severity: rule.severity,
                    path: f.path,
                    message: rule.message.clone().unwrap_or(f.message),
                })
                .collect()
        }
        Err(err) => {
            warn!(rule = %rule.id, error = %err, "rule failed");
            let path = match &err {
                EvalError::NotText(p) | EvalError::NotCached(p) => Some(p.clone()),
                EvalError::BadNumber { path, .. } => Some(path.clone()),
                EvalError::Panicked(_) => None,
            };
            vec![Violation {
                rule: rule.id.clone(),
                category: Category::Internal,
                severity: rule.severity,
                path,
                message: format!("Rule could not be evaluated: {}", err),
            }]
        }
    }
}

/// Run `f`, turning a panic into `EvalError::Panicked`.
fn guarded<T>(f: impl FnOnce() -> Result<T, EvalError>) -> Result<T, EvalError> {
    IN_GUARD.with(|g| g.set(true));
    let out = panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(EvalError::Panicked(panic_message(payload.as_ref()))));
    IN_GUARD.with(|g| g.set(false));
    out
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

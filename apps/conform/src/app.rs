//! The check pipeline: Load rule set → Scan → Evaluate → Render.
//!
//! Each run is independent; nothing is persisted between invocations.

use crate::cli::Cli;
use crate::config::{self, Effective};
use crate::engine;
use crate::error::{Error, Result};
use crate::output;
use crate::ruleset::RuleSet;
use crate::scanner::ProjectScanner;
use std::fmt::Write as _;
use std::io;
use std::path::PathBuf;
use tracing::info;

/// Rendered text plus the verdict that drives the exit code.
#[derive(Debug)]
pub struct Outcome {
    pub text: String,
    pub pass: bool,
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        if self.pass {
            0
        } else {
            1
        }
    }
}

/// Load the effective rule set: explicit file or built-in, minus disabled ids.
pub fn load_rules(eff: &Effective) -> Result<RuleSet> {
    let rules = match eff.ruleset.as_deref() {
        Some(path) => RuleSet::load_file(path)?,
        None => RuleSet::defaults()?,
    };
    Ok(rules.without(&eff.disabled))
}

pub fn run(cli: &Cli, color: bool) -> Result<Outcome> {
    let eff = config::resolve_effective(
        &cli.project_root,
        cli.config.as_deref(),
        cli.ruleset.as_deref(),
        cli.format.as_deref(),
    )?;
    let rules = load_rules(&eff)?;

    if cli.list_rules {
        return Ok(Outcome {
            text: list_rules(&rules),
            pass: true,
        });
    }

    let scanner = ProjectScanner::new(&eff.ignore, eff.max_text_bytes)?;
    let snapshot = scanner.scan(&eff.project_root)?;
    let report = engine::evaluate(&rules, &snapshot);
    info!(
        rules = rules.rules().len(),
        violations = report.summary.total,
        pass = report.pass,
        "evaluation finished"
    );
    let text = output::render_with(&report, &eff.format, color)?;
    Ok(Outcome {
        text,
        pass: report.pass,
    })
}

/// Write the rendered report and flush; a closed or full stdout is an `Io` error.
pub fn emit<W: io::Write>(out: &mut W, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())
        .and_then(|_| out.flush())
        .map_err(|source| Error::Io {
            path: PathBuf::from("<stdout>"),
            source,
        })
}

fn list_rules(rules: &RuleSet) -> String {
    let mut out = String::new();
    for r in rules.rules() {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}",
            r.id, r.category, r.severity, r.description
        );
    }
    out
}

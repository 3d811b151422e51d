//! Report rendering.
//!
//! Supports `structured` (pretty JSON, alias `json`) and `human` outputs.
//! Both forms carry the same violations; only presentation differs.
//! Rendering is pure: callers decide where the text goes.

use crate::error::{Error, Result};
use crate::models::{Category, ComplianceReport, Severity, Violation};
use owo_colors::OwoColorize;
use std::fmt::Write as _;
use std::io::IsTerminal;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Structured,
    Human,
}

impl FromStr for ReportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "structured" | "json" => Ok(ReportFormat::Structured),
            "human" => Ok(ReportFormat::Human),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Colors apply when stdout is a terminal and `NO_COLOR` is unset.
/// Structured output ignores the flag.
pub fn use_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}

/// Render `report` without colors.
pub fn render(report: &ComplianceReport, format: &str) -> Result<String> {
    render_with(report, format, false)
}

pub fn render_with(report: &ComplianceReport, format: &str, color: bool) -> Result<String> {
    match format.parse::<ReportFormat>()? {
        ReportFormat::Structured => compose_structured(report),
        ReportFormat::Human => Ok(compose_human(report, color)),
    }
}

/// Pretty JSON form of the report.
pub fn compose_structured(report: &ComplianceReport) -> Result<String> {
    let mut out = serde_json::to_string_pretty(report)?;
    out.push('\n');
    Ok(out)
}

/// Grouped text form: by category, then MUST before SHOULD.
pub fn compose_human(report: &ComplianceReport, color: bool) -> String {
    let mut out = String::new();
    for cat in Category::ALL {
        let group: Vec<&Violation> = [Severity::Must, Severity::Should]
            .into_iter()
            .flat_map(|sev| {
                report
                    .violations
                    .iter()
                    .filter(move |v| v.category == cat && v.severity == sev)
            })
            .collect();
        if group.is_empty() {
            continue;
        }
        let header = format!("[{}]", cat);
        if color {
            let _ = writeln!(out, "{}", header.bold());
        } else {
            let _ = writeln!(out, "{}", header);
        }
        for v in group {
            let _ = writeln!(out, "  {}", violation_line(v, color));
        }
    }

    if !report.warnings.is_empty() {
        let _ = writeln!(out, "[warnings]");
        for w in &report.warnings {
            let icon = if color {
                "◆".blue().to_string()
            } else {
                "◆".to_string()
            };
            let _ = writeln!(out, "  {} {}", icon, w);
        }
    }

    let summary = format!(
        "— Summary — must={} should={} total={} files={}",
        report.summary.must, report.summary.should, report.summary.total, report.summary.files
    );
    let verdict = if report.pass { "PASS" } else { "FAIL" };
    if color {
        let _ = writeln!(out, "{}", summary.bold());
        if report.pass {
            let _ = writeln!(out, "{}", verdict.green().bold());
        } else {
            let _ = writeln!(out, "{}", verdict.red().bold());
        }
    } else {
        let _ = writeln!(out, "{}", summary);
        let _ = writeln!(out, "{}", verdict);
    }
    out
}

fn violation_line(v: &Violation, color: bool) -> String {
    let (icon, sev) = match v.severity {
        Severity::Must => ("✖", "⟦MUST⟧"),
        Severity::Should => ("▲", "⟦SHOULD⟧"),
    };
    let (icon, sev) = if color {
        match v.severity {
            Severity::Must => (icon.red().to_string(), sev.red().bold().to_string()),
            Severity::Should => (icon.yellow().to_string(), sev.yellow().bold().to_string()),
        }
    } else {
        (icon.to_string(), sev.to_string())
    };
    let location = match v.path.as_deref() {
        Some(p) if color => format!("{} ", p.bold()),
        Some(p) => format!("{} ", p),
        None => String::new(),
    };
    format!("{} {} {}❲{}❳ — {}", icon, sev, location, v.rule, v.message)
}

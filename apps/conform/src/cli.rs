//! CLI argument parsing via `clap`.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "conform",
    version,
    about = "Check a project tree against agent development rules",
    long_about = "conform — validate a project layout against a declarative rule set.\n\nConfiguration precedence: CLI > conform.toml > defaults.",
    after_help = "Examples:\n  conform .\n  conform my-agent --ruleset rules/strict.toml\n  conform my-agent --format structured > report.json\n\nExit codes: 0 pass, 1 MUST violations, 2 config error, 3 project root not found, 4 unsupported format.",
    arg_required_else_help = true
)]
/// Top-level CLI options.
pub struct Cli {
    #[arg(help = "Project root to check")]
    pub project_root: PathBuf,
    #[arg(long, help = "Rule set file (toml|yaml|json); default: built-in rules")]
    pub ruleset: Option<PathBuf>,
    #[arg(long, help = "Output format: structured|human (default: human)")]
    pub format: Option<String>,
    #[arg(long, help = "Config file (default: <project-root>/conform.toml)")]
    pub config: Option<PathBuf>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Print the effective rules and exit")]
    pub list_rules: bool,
    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase log verbosity (-v info, -vv debug)")]
    pub verbose: u8,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Emit JSON-formatted log lines on stderr")]
    pub log_json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_invocation() {
        let cli = Cli::try_parse_from([
            "conform",
            "proj",
            "--ruleset",
            "r.toml",
            "--format",
            "structured",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.project_root, PathBuf::from("proj"));
        assert_eq!(cli.ruleset, Some(PathBuf::from("r.toml")));
        assert_eq!(cli.format.as_deref(), Some("structured"));
        assert_eq!(cli.verbose, 2);
        assert!(!cli.list_rules);
    }

    #[test]
    fn test_format_is_free_text_for_render_time_validation() {
        let cli = Cli::try_parse_from(["conform", ".", "--format", "xml"]).unwrap();
        assert_eq!(cli.format.as_deref(), Some("xml"));
    }
}

//! Configuration discovery and effective settings resolution.
//!
//! conform reads `conform.toml|yaml|yml` from the project root (or the file
//! given with `--config`) and merges it with CLI flags to produce an
//! `Effective` config.
//! Defaults:
//! - `ruleset`: built-in rules
//! - `format`: `human`
//! - `scan.ignore`: none beyond the built-in ignored directories
//! - `scan.max_text_bytes`: 1 MiB
//! - `rules.disable`: none
//!
//! Overrides precedence: CLI > config file > defaults. A `ruleset` given in
//! the config file is resolved relative to the project root; one given on
//! the command line is used as-is.

use crate::error::{Error, Result};
use crate::scanner::DEFAULT_MAX_TEXT_BYTES;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE_NAMES: [&str; 3] = ["conform.toml", "conform.yaml", "conform.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
/// Root configuration loaded from `conform.toml|yaml`.
pub struct ConformConfig {
    pub ruleset: Option<String>,
    pub format: Option<String>,
    #[serde(default)]
    pub scan: Option<ScanCfg>,
    #[serde(default)]
    pub rules: Option<RulesCfg>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
/// Scanner section under `[scan]`.
pub struct ScanCfg {
    /// Extra globs, relative to the project root, excluded from the scan.
    #[serde(default)]
    pub ignore: Vec<String>,
    pub max_text_bytes: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
/// Rule selection section under `[rules]`.
pub struct RulesCfg {
    #[serde(default)]
    pub disable: Vec<String>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by the run after applying precedence.
pub struct Effective {
    pub project_root: PathBuf,
    pub config_path: Option<PathBuf>,
    /// `None` selects the built-in rule set.
    pub ruleset: Option<PathBuf>,
    pub format: String,
    pub ignore: Vec<String>,
    pub max_text_bytes: u64,
    pub disabled: Vec<String>,
}

/// Parse a config file, choosing the format by extension.
pub fn load_config_file(path: &Path) -> Result<ConformConfig> {
    let s = fs::read_to_string(path).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let origin = path.to_string_lossy().to_string();
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&s).map_err(|e| Error::config(origin, e.to_string()))
        }
        _ => toml::from_str(&s).map_err(|e| Error::config(origin, e.to_string())),
    }
}

/// Load `ConformConfig` from the first config file present in `root`.
pub fn load_config(root: &Path) -> Result<Option<(PathBuf, ConformConfig)>> {
    for name in CONFIG_FILE_NAMES {
        let p = root.join(name);
        if p.is_file() {
            let cfg = load_config_file(&p)?;
            return Ok(Some((p, cfg)));
        }
    }
    Ok(None)
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    project_root: &Path,
    cli_config: Option<&Path>,
    cli_ruleset: Option<&Path>,
    cli_format: Option<&str>,
) -> Result<Effective> {
    let found = match cli_config {
        Some(p) => Some((p.to_path_buf(), load_config_file(p)?)),
        None => load_config(project_root)?,
    };
    let (config_path, cfg) = match found {
        Some((p, c)) => {
            debug!(config = %p.display(), "loaded config");
            (Some(p), c)
        }
        None => (None, ConformConfig::default()),
    };

    let ruleset = cli_ruleset
        .map(Path::to_path_buf)
        .or_else(|| cfg.ruleset.as_ref().map(|r| project_root.join(r)));

    let format = cli_format
        .map(|s| s.to_string())
        .or(cfg.format)
        .unwrap_or_else(|| "human".to_string());

    let scan = cfg.scan.unwrap_or_default();
    let disabled = cfg.rules.map(|r| r.disable).unwrap_or_default();

    Ok(Effective {
        project_root: project_root.to_path_buf(),
        config_path,
        ruleset,
        format,
        ignore: scan.ignore,
        max_text_bytes: scan.max_text_bytes.unwrap_or(DEFAULT_MAX_TEXT_BYTES),
        disabled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_config() {
        let dir = tempdir().unwrap();
        let eff = resolve_effective(dir.path(), None, None, None).unwrap();
        assert!(eff.config_path.is_none());
        assert!(eff.ruleset.is_none());
        assert_eq!(eff.format, "human");
        assert_eq!(eff.max_text_bytes, DEFAULT_MAX_TEXT_BYTES);
        assert!(eff.disabled.is_empty());
    }

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("conform.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
ruleset = "rules/agent.toml"
format = "structured"
[scan]
ignore = ["data/**"]
max_text_bytes = 2048
[rules]
disable = ["style.line-length"]
    "#
        )
        .unwrap();

        let eff = resolve_effective(root, None, None, None).unwrap();
        assert_eq!(eff.ruleset, Some(root.join("rules/agent.toml")));
        assert_eq!(eff.format, "structured");
        assert_eq!(eff.ignore, ["data/**"]);
        assert_eq!(eff.max_text_bytes, 2048);
        assert_eq!(eff.disabled, ["style.line-length"]);
    }

    #[test]
    fn test_load_yaml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("conform.yaml"),
            "format: human\nrules:\n  disable: [testing.test-files]\n",
        )
        .unwrap();
        let eff = resolve_effective(root, None, None, None).unwrap();
        assert_eq!(eff.format, "human");
        assert_eq!(eff.disabled, ["testing.test-files"]);
        assert_eq!(eff.config_path, Some(root.join("conform.yaml")));
    }

    #[test]
    fn test_cli_takes_precedence() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("conform.toml"),
            "ruleset = \"a.toml\"\nformat = \"structured\"\n",
        )
        .unwrap();
        let eff = resolve_effective(
            root,
            None,
            Some(Path::new("/elsewhere/b.toml")),
            Some("human"),
        )
        .unwrap();
        assert_eq!(eff.ruleset, Some(PathBuf::from("/elsewhere/b.toml")));
        assert_eq!(eff.format, "human");
    }

    #[test]
    fn test_explicit_config_path() {
        let dir = tempdir().unwrap();
        let cfg = dir.path().join("ci.toml");
        fs::write(&cfg, "format = \"json\"\n").unwrap();
        let eff = resolve_effective(&dir.path().join("proj"), Some(&cfg), None, None).unwrap();
        assert_eq!(eff.format, "json");
    }

    #[test]
    fn test_malformed_config_is_config_error() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("conform.toml"), "unknown_key = 1\n").unwrap();
        let err = resolve_effective(root, None, None, None).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}

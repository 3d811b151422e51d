//! Error types shared by the loader, scanner, and reporter.
//!
//! `Error` covers the fatal paths that abort a run; `EvalError` is the
//! failure a single rule predicate may report, which the engine folds into
//! an `internal` violation instead of propagating.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed rule set or config file.
    #[error("invalid configuration in {origin}: {message}")]
    Config { origin: String, message: String },

    #[error("project root not found: {} ({reason})", .path.display())]
    NotFound { path: PathBuf, reason: String },

    #[error("unsupported format '{0}' (expected structured|human)")]
    UnsupportedFormat(String),

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn config(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// Process exit code for a fatal error. `1` is reserved for a failing report.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config { .. } | Error::Io { .. } | Error::Serialize(_) => 2,
            Error::NotFound { .. } => 3,
            Error::UnsupportedFormat(_) => 4,
        }
    }
}

/// Failure raised while evaluating one rule against a snapshot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("cannot decode '{0}' as text")]
    NotText(String),
    #[error("content of '{0}' was not cached (file too large or unreadable)")]
    NotCached(String),
    #[error("value '{value}' in '{path}' is not a finite number")]
    BadNumber { path: String, value: String },
    #[error("rule predicate panicked: {0}")]
    Panicked(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_from_fail() {
        let errs = [
            Error::config("rules.toml", "duplicate rule id"),
            Error::NotFound {
                path: PathBuf::from("nope"),
                reason: "does not exist".into(),
            },
            Error::UnsupportedFormat("xml".into()),
        ];
        for e in &errs {
            assert_ne!(e.exit_code(), 0);
            assert_ne!(e.exit_code(), 1);
        }
        assert_eq!(errs[2].to_string(), "unsupported format 'xml' (expected structured|human)");
    }

    #[test]
    fn test_serialize_error_exits_two() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::from(json_err);
        assert!(matches!(err, Error::Serialize(_)));
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().starts_with("failed to serialize report: "));
    }
}

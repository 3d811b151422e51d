//! Project tree traversal producing a `ProjectSnapshot`.
//!
//! Conventional tool directories (VCS metadata, virtual environments,
//! caches) are pruned before descent. Unreadable entries are recorded as
//! snapshot warnings and skipped; only a missing root is fatal.

use crate::error::{Error, Result};
use crate::snapshot::{classify, matches_any, FileContent, ProjectSnapshot, SnapshotBuilder};
use glob::Pattern;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Directory names never descended into.
pub const DEFAULT_IGNORED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    ".venv",
    "venv",
    "env",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".ruff_cache",
    ".tox",
    ".nox",
    ".ipynb_checkpoints",
    "node_modules",
    ".cache",
];

pub const DEFAULT_MAX_TEXT_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ProjectScanner {
    ignore: Vec<Pattern>,
    max_text_bytes: u64,
}

impl Default for ProjectScanner {
    fn default() -> Self {
        ProjectScanner {
            ignore: Vec::new(),
            max_text_bytes: DEFAULT_MAX_TEXT_BYTES,
        }
    }
}

impl ProjectScanner {
    /// Scanner with extra ignore globs on top of the defaults.
    pub fn new(extra_ignore: &[String], max_text_bytes: u64) -> Result<Self> {
        let ignore = extra_ignore
            .iter()
            .map(|p| {
                Pattern::new(p)
                    .map_err(|e| Error::config("[scan].ignore", format!("bad glob '{}': {}", p, e)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ProjectScanner {
            ignore,
            max_text_bytes,
        })
    }

    pub fn scan(&self, root: &Path) -> Result<ProjectSnapshot> {
        let meta = fs::metadata(root).map_err(|e| Error::NotFound {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !meta.is_dir() {
            return Err(Error::NotFound {
                path: root.to_path_buf(),
                reason: "not a directory".into(),
            });
        }

        let mut builder = ProjectSnapshot::builder(root);
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_ignored(root, e));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    let at = e
                        .path()
                        .map(|p| rel_path(root, p))
                        .unwrap_or_else(|| ".".to_string());
                    let msg = match e.io_error() {
                        Some(io) => io_warning(&at, io),
                        None => format!("unreadable entry {}: {}", at, e),
                    };
                    record_warning(&mut builder, &at, msg);
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }
            let rel = rel_path(root, entry.path());
            let ft = entry.file_type();
            if ft.is_dir() {
                builder.add_dir(&rel);
            } else if ft.is_file() {
                self.record_file(&mut builder, &rel, entry.path());
            } else if ft.is_symlink() {
                // Links are resolved once and never descended into.
                match fs::metadata(entry.path()) {
                    Ok(m) if m.is_dir() => {
                        builder.add_dir(&rel);
                        record_warning(&mut builder, &rel, format!("symlink not followed: {}", rel));
                    }
                    Ok(_) => self.record_file(&mut builder, &rel, entry.path()),
                    Err(_) => {
                        record_warning(&mut builder, &rel, format!("dangling symlink: {}", rel));
                    }
                }
            }
        }

        let snap = builder.build();
        debug!(
            root = %root.display(),
            files = snap.files().len(),
            warnings = snap.warnings().len(),
            "scan complete"
        );
        Ok(snap)
    }

    /// Record a file, reading its content when it fits under the text limit.
    fn record_file(&self, builder: &mut SnapshotBuilder, rel: &str, path: &Path) {
        let size = match fs::metadata(path) {
            Ok(m) => m.len(),
            Err(e) => {
                record_warning(builder, rel, io_warning(rel, &e));
                builder.add_file(rel, 0, FileContent::Skipped);
                return;
            }
        };
        let content = if size > self.max_text_bytes {
            debug!(path = %rel, size, "skipping content of large file");
            FileContent::Skipped
        } else {
            match fs::read(path) {
                Ok(bytes) => classify(bytes),
                Err(e) => {
                    record_warning(builder, rel, io_warning(rel, &e));
                    FileContent::Skipped
                }
            }
        };
        builder.add_file(rel, size, content);
    }

    fn is_ignored(&self, root: &Path, entry: &DirEntry) -> bool {
        if entry.file_type().is_dir() || entry.path_is_symlink() {
            let name = entry.file_name().to_string_lossy();
            if DEFAULT_IGNORED_DIRS.contains(&name.as_ref()) {
                return true;
            }
        }
        !self.ignore.is_empty() && matches_any(&self.ignore, &rel_path(root, entry.path()))
    }
}

/// Warning text for an I/O failure at `rel`.
fn io_warning(rel: &str, err: &std::io::Error) -> String {
    if err.kind() == std::io::ErrorKind::PermissionDenied {
        format!("permission denied: {}", rel)
    } else {
        format!("unreadable entry {}: {}", rel, err)
    }
}

fn record_warning(builder: &mut SnapshotBuilder, rel: &str, msg: String) {
    warn!(path = %rel, "{}", msg);
    builder.add_warning(msg);
}

/// Root-relative, `/`-separated form of `path`; the root itself is `.`.
fn rel_path(root: &Path, path: &Path) -> String {
    let rel = pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf());
    let joined = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

//! Immutable, point-in-time view of a project tree.
//!
//! Paths are stored relative to the root, `/`-separated, in sorted order so
//! every consumer iterates files deterministically. Text content is cached
//! for files that decode as UTF-8 without NUL bytes and fit under the
//! scanner's size limit.

use crate::error::EvalError;
use glob::{MatchOptions, Pattern};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

const MATCH_OPTS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    Binary,
    /// Not read: over the size limit or unreadable.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub size: u64,
    pub line_count: Option<usize>,
    pub extension: Option<String>,
}

#[derive(Debug, Clone)]
struct FileEntry {
    meta: FileMeta,
    content: FileContent,
}

#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    root: PathBuf,
    files: Vec<String>,
    dirs: BTreeSet<String>,
    entries: BTreeMap<String, FileEntry>,
    warnings: Vec<String>,
}

impl ProjectSnapshot {
    pub fn builder(root: impl Into<PathBuf>) -> SnapshotBuilder {
        SnapshotBuilder {
            root: root.into(),
            dirs: BTreeSet::new(),
            entries: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative file paths in sorted order.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn dirs(&self) -> impl Iterator<Item = &str> {
        self.dirs.iter().map(String::as_str)
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn is_file(&self, path: &str) -> bool {
        self.entries.contains_key(normalize(path))
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.dirs.contains(normalize(path))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    pub fn meta(&self, path: &str) -> Option<&FileMeta> {
        self.entries.get(normalize(path)).map(|e| &e.meta)
    }

    /// Cached text of a file known to the snapshot.
    ///
    /// Fails with `NotText` for binary files and `NotCached` when the file
    /// was skipped or is absent.
    pub fn text(&self, path: &str) -> Result<&str, EvalError> {
        match self.entries.get(normalize(path)).map(|e| &e.content) {
            Some(FileContent::Text(s)) => Ok(s.as_str()),
            Some(FileContent::Binary) => Err(EvalError::NotText(path.to_string())),
            Some(FileContent::Skipped) | None => Err(EvalError::NotCached(path.to_string())),
        }
    }

    /// Files matching any of `patterns`, in snapshot order.
    pub fn matching_files<'a>(
        &'a self,
        patterns: &'a [Pattern],
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.files
            .iter()
            .map(String::as_str)
            .filter(move |p| matches_any(patterns, p))
    }

    /// Directories matching any of `patterns`, in sorted order.
    pub fn matching_dirs<'a>(&'a self, patterns: &'a [Pattern]) -> impl Iterator<Item = &'a str> + 'a {
        self.dirs
            .iter()
            .map(String::as_str)
            .filter(move |p| matches_any(patterns, p))
    }
}

pub(crate) fn matches_any(patterns: &[Pattern], path: &str) -> bool {
    patterns.iter().any(|p| p.matches_with(path, MATCH_OPTS))
}

fn normalize(path: &str) -> &str {
    path.trim_start_matches("./").trim_end_matches('/')
}

/// Classify raw bytes as cached text or binary.
pub fn classify(bytes: Vec<u8>) -> FileContent {
    if bytes.contains(&0) {
        return FileContent::Binary;
    }
    match String::from_utf8(bytes) {
        Ok(s) => FileContent::Text(s),
        Err(_) => FileContent::Binary,
    }
}

/// Incremental constructor used by the scanner and by tests.
pub struct SnapshotBuilder {
    root: PathBuf,
    dirs: BTreeSet<String>,
    entries: BTreeMap<String, FileEntry>,
    warnings: Vec<String>,
}

impl SnapshotBuilder {
    pub fn dir(mut self, path: &str) -> Self {
        self.add_dir(path);
        self
    }

    pub fn text_file(mut self, path: &str, text: &str) -> Self {
        self.add_file(path, text.len() as u64, FileContent::Text(text.to_string()));
        self
    }

    pub fn binary_file(mut self, path: &str, bytes: &[u8]) -> Self {
        self.add_file(path, bytes.len() as u64, FileContent::Binary);
        self
    }

    pub fn warning(mut self, message: impl Into<String>) -> Self {
        self.add_warning(message);
        self
    }

    pub fn add_dir(&mut self, path: &str) {
        let path = normalize(path);
        if path.is_empty() {
            return;
        }
        let mut acc = String::new();
        for part in path.split('/') {
            if !acc.is_empty() {
                acc.push('/');
            }
            acc.push_str(part);
            self.dirs.insert(acc.clone());
        }
    }

    pub fn add_file(&mut self, path: &str, size: u64, content: FileContent) {
        let path = normalize(path).to_string();
        if let Some((parent, _)) = path.rsplit_once('/') {
            self.add_dir(parent);
        }
        let line_count = match &content {
            FileContent::Text(s) => Some(s.lines().count()),
            _ => None,
        };
        let extension = Path::new(&path)
            .extension()
            .map(|e| e.to_string_lossy().to_string());
        self.entries.insert(
            path,
            FileEntry {
                meta: FileMeta {
                    size,
                    line_count,
                    extension,
                },
                content,
            },
        );
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn build(self) -> ProjectSnapshot {
        let files = self.entries.keys().cloned().collect();
        ProjectSnapshot {
            root: self.root,
            files,
            dirs: self.dirs,
            entries: self.entries,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_registers_parent_dirs_and_sorts_files() {
        let snap = ProjectSnapshot::builder("/p")
            .text_file("tests/test_b.py", "b\n")
            .text_file("src/agents/agent.py", "a\nb\n")
            .build();
        assert_eq!(snap.files(), ["src/agents/agent.py", "tests/test_b.py"]);
        assert!(snap.is_dir("src"));
        assert!(snap.is_dir("src/agents/"));
        assert!(!snap.is_dir("src/tools"));
        let meta = snap.meta("src/agents/agent.py").unwrap();
        assert_eq!(meta.line_count, Some(2));
        assert_eq!(meta.extension.as_deref(), Some("py"));
    }

    #[test]
    fn test_text_access_distinguishes_binary() {
        let snap = ProjectSnapshot::builder("/p")
            .binary_file("logo.png", &[0x89, 0x50, 0x00])
            .text_file("README.md", "# hi")
            .build();
        assert_eq!(snap.text("README.md"), Ok("# hi"));
        assert_eq!(snap.text("logo.png"), Err(EvalError::NotText("logo.png".into())));
        assert!(matches!(snap.text("missing"), Err(EvalError::NotCached(_))));
    }

    #[test]
    fn test_classify_rejects_nul_and_invalid_utf8() {
        assert_eq!(classify(b"ok".to_vec()), FileContent::Text("ok".into()));
        assert_eq!(classify(vec![b'a', 0, b'b']), FileContent::Binary);
        assert_eq!(classify(vec![0xff, 0xfe]), FileContent::Binary);
    }

    #[test]
    fn test_glob_matching_respects_separators() {
        let snap = ProjectSnapshot::builder("/p")
            .text_file("main.py", "")
            .text_file("src/agents/agent.py", "")
            .text_file("notes.md", "")
            .build();
        let deep = [Pattern::new("**/*.py").unwrap()];
        let shallow = [Pattern::new("*.py").unwrap()];
        assert_eq!(snap.matching_files(&deep).count(), 2);
        assert_eq!(snap.matching_files(&shallow).collect::<Vec<_>>(), ["main.py"]);
    }
}

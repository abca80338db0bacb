//! core::scan
//!
//! Reference discovery across a file tree.
//!
//! Walks a directory, reads files with selected extensions, and yields every
//! textual reference candidate with its file and line provenance. Each
//! candidate is independently re-validated through [`Reference::parse`], so
//! callers see both well-formed references and grammar rejections.
//!
//! Hidden entries and dependency directories (`node_modules`, `target`,
//! `vendor`, `__pycache__`, `.git`) are skipped. Unreadable files are skipped
//! with a debug note, never an error.

use crate::core::reference::{GrammarError, Reference, SecurityPolicy, REFERENCE_PATTERN};
use ignore::WalkBuilder;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directories never descended into.
const SKIPPED_DIRS: [&str; 5] = ["node_modules", "target", "vendor", "__pycache__", ".git"];

/// File extensions scanned by default.
pub const DEFAULT_EXTENSIONS: [&str; 4] = ["md", "yml", "yaml", "json"];

/// Options controlling a reference scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Extensions (without the dot) of files to scan.
    pub extensions: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// One textual reference candidate found in a file.
#[derive(Debug, Clone)]
pub struct ReferenceMatch {
    /// The matched text, verbatim.
    pub raw: String,
    /// The file containing the match.
    pub file: PathBuf,
    /// 1-based line number of the match.
    pub line: u64,
    /// The candidate re-validated through the grammar.
    pub reference: Result<Reference, GrammarError>,
}

/// Scan `root` for references.
///
/// Returns a lazy iterator; files are read one at a time as the iterator
/// advances. The iterator is finite and a fresh call restarts the scan.
///
/// # Example
///
/// ```no_run
/// use refhub::core::reference::SecurityPolicy;
/// use refhub::core::scan::{scan_references, ScanOptions};
/// use std::path::Path;
///
/// let policy = SecurityPolicy::default();
/// for m in scan_references(Path::new("."), &ScanOptions::default(), &policy) {
///     println!("{}:{} {}", m.file.display(), m.line, m.raw);
/// }
/// ```
pub fn scan_references(
    root: &Path,
    options: &ScanOptions,
    policy: &SecurityPolicy,
) -> ReferenceScan {
    let walker = WalkBuilder::new(root)
        .filter_entry(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| !SKIPPED_DIRS.contains(&name))
                .unwrap_or(true)
        })
        .build();

    ReferenceScan {
        walker,
        pending: VecDeque::new(),
        extensions: options.extensions.clone(),
        policy: policy.clone(),
    }
}

/// Lazy iterator over [`ReferenceMatch`]es; see [`scan_references`].
pub struct ReferenceScan {
    walker: ignore::Walk,
    pending: VecDeque<ReferenceMatch>,
    extensions: Vec<String>,
    policy: SecurityPolicy,
}

impl ReferenceScan {
    fn wants(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|want| want == e))
            .unwrap_or(false)
    }

    fn scan_file(&mut self, path: &Path) {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                debug!(path = %path.display(), %err, "skipping unreadable file");
                return;
            }
        };

        for (idx, line) in content.lines().enumerate() {
            for m in REFERENCE_PATTERN.find_iter(line) {
                self.pending.push_back(ReferenceMatch {
                    raw: m.as_str().to_string(),
                    file: path.to_path_buf(),
                    line: idx as u64 + 1,
                    reference: Reference::parse(m.as_str(), &self.policy),
                });
            }
        }
    }
}

impl Iterator for ReferenceScan {
    type Item = ReferenceMatch;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(m) = self.pending.pop_front() {
                return Some(m);
            }

            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(%err, "skipping unreadable directory entry");
                    continue;
                }
            };

            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if is_file && self.wants(entry.path()) {
                let path = entry.path().to_path_buf();
                self.scan_file(&path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn scan_all(root: &Path) -> Vec<ReferenceMatch> {
        scan_references(root, &ScanOptions::default(), &SecurityPolicy::default()).collect()
    }

    #[test]
    fn finds_references_with_provenance() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "docs/guide.md",
            "intro\nsee @github:assetutilities/src/workflow.md here\n",
        );

        let found = scan_all(dir.path());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].raw, "@github:assetutilities/src/workflow.md");
        assert_eq!(found[0].line, 2);
        assert!(found[0].file.ends_with("docs/guide.md"));
        assert!(found[0].reference.is_ok());
    }

    #[test]
    fn multiple_matches_on_one_line() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "a.md",
            "@github:assetutilities/a.md and @github:shared-templates/b.md\n",
        );

        let found = scan_all(dir.path());
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].line, found[1].line);
    }

    #[test]
    fn rejected_candidates_are_reported_not_dropped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.md", "bad: @github:unlisted-repo/file.md\n");

        let found = scan_all(dir.path());
        assert_eq!(found.len(), 1);
        assert!(found[0].reference.is_err());
    }

    #[test]
    fn only_selected_extensions_are_scanned() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.md", "@github:assetutilities/a.md\n");
        write(dir.path(), "b.rs", "@github:assetutilities/b.md\n");
        write(dir.path(), "noext", "@github:assetutilities/c.md\n");

        let found = scan_all(dir.path());
        assert_eq!(found.len(), 1);
        assert!(found[0].file.ends_with("a.md"));
    }

    #[test]
    fn custom_extensions() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", "@github:assetutilities/a.md\n");

        let options = ScanOptions {
            extensions: vec!["txt".to_string()],
        };
        let found: Vec<_> =
            scan_references(dir.path(), &options, &SecurityPolicy::default()).collect();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn hidden_and_dependency_directories_are_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".hidden/a.md", "@github:assetutilities/a.md\n");
        write(
            dir.path(),
            "node_modules/pkg/b.md",
            "@github:assetutilities/b.md\n",
        );
        write(dir.path(), "target/c.md", "@github:assetutilities/c.md\n");
        write(dir.path(), "docs/real.md", "@github:assetutilities/d.md\n");

        let found = scan_all(dir.path());
        assert_eq!(found.len(), 1);
        assert!(found[0].file.ends_with("docs/real.md"));
    }

    #[test]
    fn scan_is_restartable() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.md", "@github:assetutilities/a.md\n");

        assert_eq!(scan_all(dir.path()).len(), 1);
        assert_eq!(scan_all(dir.path()).len(), 1);
    }

    #[test]
    fn empty_tree_yields_nothing() {
        let dir = TempDir::new().unwrap();
        assert!(scan_all(dir.path()).is_empty());
    }
}

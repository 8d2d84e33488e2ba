use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

use crate::treesitter::detect_language;

/// Name of the per-repository ignore file, same syntax as `.gitignore`.
pub const IGNORE_FILE: &str = ".rippleignore";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Repo-relative path with forward slashes.
    pub rel_path: String,
    pub path: PathBuf,
    pub language: String,
}

pub struct FileWalker {
    root: PathBuf,
    excludes: GlobSet,
}

impl FileWalker {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            excludes: GlobSet::empty(),
        }
    }

    /// Additionally skip files matching any of these globs.
    pub fn with_ignore_patterns(mut self, patterns: &[String]) -> Self {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => tracing::warn!(pattern = %pattern, error = %e, "ignoring invalid ignore pattern"),
            }
        }
        self.excludes = builder.build().unwrap_or_else(|_| GlobSet::empty());
        self
    }

    /// Source files under the root, sorted by relative path.
    pub fn walk(&self) -> Vec<WalkEntry> {
        let mut entries = Vec::new();

        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .require_git(false)
            .add_custom_ignore_filename(IGNORE_FILE)
            .build();

        for result in walker {
            let entry = match result {
                Ok(e) => e,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.into_path();
            let Some(lang) = detect_language(&path) else {
                continue;
            };
            let Some(rel_path) = relative_path(&self.root, &path) else {
                continue;
            };
            if self.excludes.is_match(&rel_path) {
                continue;
            }
            entries.push(WalkEntry {
                rel_path,
                path,
                language: lang.to_string(),
            });
        }

        entries.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        entries
    }
}

/// Repo-relative path with forward slashes.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

/// Normalize a user-supplied path to the repo-relative form used as node identity.
pub fn normalize_rel_path(path: &str) -> String {
    let path = path.trim().replace('\\', "/");
    let mut path = path.as_str();
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path.trim_start_matches('/').to_string()
}

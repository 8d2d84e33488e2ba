//! Where a candidate's changed files come from when the agent does not say.

use std::path::{Path, PathBuf};

use ripple_core::vcs::{self, VcsError};

pub trait DiffProvider {
    fn changed_files(&self) -> Result<Vec<String>, VcsError>;
}

/// Working-tree changes relative to a base revision, untracked files included.
pub struct GitDiffProvider {
    root: PathBuf,
    base: String,
}

impl GitDiffProvider {
    pub fn new(root: &Path, base: impl Into<String>) -> Self {
        Self {
            root: root.to_path_buf(),
            base: base.into(),
        }
    }
}

impl DiffProvider for GitDiffProvider {
    fn changed_files(&self) -> Result<Vec<String>, VcsError> {
        vcs::changed_files(&self.root, &self.base)
    }
}

/// A fixed list, for callers that already know the diff.
pub struct StaticDiff(pub Vec<String>);

impl DiffProvider for StaticDiff {
    fn changed_files(&self) -> Result<Vec<String>, VcsError> {
        Ok(self.0.clone())
    }
}

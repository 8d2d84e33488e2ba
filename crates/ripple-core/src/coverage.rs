//! Per-test line coverage supplied by an external provider.
//!
//! Shape: `{test_id: {file_path: {line: hit_count}}}`. Line keys are JSON
//! object keys, so they arrive as strings and are parsed here.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoverageData {
    pub tests: BTreeMap<String, BTreeMap<String, BTreeMap<String, u64>>>,
}

#[derive(Debug, thiserror::Error)]
pub enum CoverageError {
    #[error("failed to read coverage file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed coverage data: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl CoverageData {
    pub fn load(path: &Path) -> Result<Self, CoverageError> {
        let content = std::fs::read_to_string(path).map_err(|source| CoverageError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CoverageError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Executed lines per file for a test id.
    ///
    /// Parametrized entries (`test_x[1]`, `test_x[2]`) are folded into the
    /// bare id so a single Test node sees the union of every case.
    pub fn executed_lines(&self, test_id: &str) -> BTreeMap<String, BTreeSet<u32>> {
        let mut merged: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();
        for (id, files) in &self.tests {
            if strip_parametrize(id) != test_id {
                continue;
            }
            for (file, lines) in files {
                let executed = lines
                    .iter()
                    .filter(|(_, hits)| **hits > 0)
                    .filter_map(|(line, _)| line.trim().parse::<u32>().ok());
                merged
                    .entry(normalize_path(file))
                    .or_default()
                    .extend(executed);
            }
        }
        merged.retain(|_, lines| !lines.is_empty());
        merged
    }
}

fn strip_parametrize(id: &str) -> &str {
    match id.find('[') {
        Some(idx) if id.ends_with(']') => &id[..idx],
        _ => id,
    }
}

fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.strip_prefix("./").unwrap_or(&path).to_string()
}

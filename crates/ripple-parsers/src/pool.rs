//! Parallel parse phase.
//!
//! Every file is read, hashed and parsed independently on a rayon pool.
//! Files whose hash matches a previously indexed version are reported as
//! unchanged without being parsed.

use std::collections::HashMap;
use std::path::Path;

use rayon::prelude::*;

use ripple_core::cancel::{CancellationToken, Cancelled};
use ripple_core::hash::content_hash;

use crate::resolver::{LanguageResolver, ParseFailure, ParsedFile};

/// Result of the parse phase for one file.
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    Parsed(ParsedFile),
    /// Hash matches the previously indexed content.
    Unchanged {
        file_path: String,
        content_hash: String,
    },
    Failed {
        failure: ParseFailure,
        content_hash: Option<String>,
    },
}

impl ParseOutcome {
    pub fn file_path(&self) -> &str {
        match self {
            ParseOutcome::Parsed(p) => &p.file_path,
            ParseOutcome::Unchanged { file_path, .. } => file_path,
            ParseOutcome::Failed { failure, .. } => failure.file_path(),
        }
    }

    pub fn content_hash(&self) -> Option<&str> {
        match self {
            ParseOutcome::Parsed(p) => Some(&p.content_hash),
            ParseOutcome::Unchanged { content_hash, .. } => Some(content_hash),
            ParseOutcome::Failed { content_hash, .. } => content_hash.as_deref(),
        }
    }
}

/// Parse `files` (repo-relative) under `root` with `workers` threads.
///
/// `known_hashes` maps a path to the content hash it was last indexed with.
/// Cancellation is observed before each file; a cancelled run returns
/// `Err(Cancelled)` and no partial results.
pub fn parse_files(
    resolver: &dyn LanguageResolver,
    root: &Path,
    files: &[String],
    known_hashes: &HashMap<String, String>,
    workers: usize,
    cancel: &CancellationToken,
) -> Result<Vec<ParseOutcome>, Cancelled> {
    if files.is_empty() {
        return Ok(vec![]);
    }

    let job = |rel_path: &String| -> Option<ParseOutcome> {
        if cancel.is_cancelled() {
            return None;
        }
        Some(parse_one(resolver, root, rel_path, known_hashes))
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build();

    let results: Vec<Option<ParseOutcome>> = match pool {
        Ok(pool) => pool.install(|| files.par_iter().map(job).collect()),
        Err(e) => {
            tracing::warn!(error = %e, "parse pool unavailable, parsing sequentially");
            files.iter().map(job).collect()
        }
    };

    cancel.check()?;
    results.into_iter().map(|r| r.ok_or(Cancelled)).collect()
}

fn parse_one(
    resolver: &dyn LanguageResolver,
    root: &Path,
    rel_path: &str,
    known_hashes: &HashMap<String, String>,
) -> ParseOutcome {
    let bytes = match std::fs::read(root.join(rel_path)) {
        Ok(b) => b,
        Err(e) => {
            return ParseOutcome::Failed {
                failure: ParseFailure::Io {
                    file_path: rel_path.to_string(),
                    message: e.to_string(),
                },
                content_hash: None,
            }
        }
    };
    let hash = content_hash(&bytes);
    if known_hashes.get(rel_path) == Some(&hash) {
        return ParseOutcome::Unchanged {
            file_path: rel_path.to_string(),
            content_hash: hash,
        };
    }
    match resolver.parse_file(rel_path, &bytes) {
        Ok(parsed) => {
            tracing::debug!(
                file = rel_path,
                definitions = parsed.definitions.len(),
                references = parsed.references.len(),
                "parsed"
            );
            ParseOutcome::Parsed(parsed)
        }
        Err(failure) => {
            tracing::warn!(error = %failure, "parse failed, file will be partially indexed");
            ParseOutcome::Failed {
                failure,
                content_hash: Some(hash),
            }
        }
    }
}

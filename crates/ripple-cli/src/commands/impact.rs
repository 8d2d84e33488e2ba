use std::path::PathBuf;

use ripple_core::cancel::CancellationToken;
use ripple_fix::diff::{DiffProvider, GitDiffProvider};
use ripple_impact::engine::{ImpactEngine, ImpactRequest};
use ripple_output::OutputFormatter;

use super::build::with_newline;

pub struct ImpactArgs {
    pub repo: PathBuf,
    pub files: Vec<String>,
    pub since: Option<String>,
    pub commit: Option<String>,
    pub threshold: Option<f64>,
    pub max_results: Option<usize>,
}

/// Run `ripple impact`: rank the tests impacted by the given files, or by
/// the working-tree diff against `--since` (default `HEAD`).
pub fn run(formatter: &dyn OutputFormatter, args: ImpactArgs) -> i32 {
    let files = match changed_files(&args.repo, args.files, args.since.as_deref()) {
        Ok(files) => files,
        Err(code) => return code,
    };
    if files.is_empty() {
        eprintln!("ripple impact: no changed files");
        return 0;
    }

    let request = ImpactRequest {
        repo_path: args.repo,
        commit_id: args.commit,
        changed_files: files,
        threshold: args.threshold,
        max_results: args.max_results,
    };
    match ImpactEngine::default().get_impacted_tests(&request, &CancellationToken::new()) {
        Ok(tests) => {
            print!("{}", with_newline(formatter.format_impact(&tests)));
            0
        }
        Err(e) => {
            eprintln!("ripple impact: {e}");
            2
        }
    }
}

/// Explicit files win; otherwise ask git.
pub(crate) fn changed_files(
    repo: &std::path::Path,
    files: Vec<String>,
    since: Option<&str>,
) -> Result<Vec<String>, i32> {
    if !files.is_empty() {
        return Ok(files);
    }
    GitDiffProvider::new(repo, since.unwrap_or("HEAD"))
        .changed_files()
        .map_err(|e| {
            eprintln!("ripple impact: cannot determine changed files: {e}");
            2
        })
}

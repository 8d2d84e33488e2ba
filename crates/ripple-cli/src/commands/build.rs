use std::path::PathBuf;

use ripple_core::cancel::CancellationToken;
use ripple_impact::engine::{BuildRequest, ImpactEngine};
use ripple_output::OutputFormatter;

/// Run `ripple build`: build or load the snapshot and print its report.
pub fn run(
    formatter: &dyn OutputFormatter,
    repo: PathBuf,
    commit: Option<String>,
    force: bool,
    coverage: Option<PathBuf>,
) -> i32 {
    let request = BuildRequest {
        repo_path: repo,
        commit_id: commit,
        force_rebuild: force,
        coverage_file: coverage,
    };
    match ImpactEngine::default().build_graph(&request, &CancellationToken::new()) {
        Ok(report) => {
            print!("{}", with_newline(formatter.format_build(&report)));
            0
        }
        Err(e) => {
            eprintln!("ripple build: {e}");
            2
        }
    }
}

pub(crate) fn with_newline(mut out: String) -> String {
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

use std::path::Path;

use ripple_core::cancel::CancellationToken;
use ripple_fix::runner::run_impacted_tests;
use ripple_impact::engine::{ImpactEngine, ImpactRequest};
use ripple_output::OutputFormatter;

use super::build::with_newline;

/// Run `ripple run`: execute the given test ids, or the tests impacted by
/// `--changed` files. Exit 1 when any test failed or errored.
pub fn run(
    formatter: &dyn OutputFormatter,
    repo: &Path,
    test_ids: Vec<String>,
    changed: Vec<String>,
    timeout: Option<u64>,
) -> i32 {
    let test_ids = if changed.is_empty() {
        test_ids
    } else {
        let request = ImpactRequest {
            repo_path: repo.to_path_buf(),
            changed_files: changed,
            ..ImpactRequest::default()
        };
        match ImpactEngine::default().get_impacted_tests(&request, &CancellationToken::new()) {
            Ok(tests) => tests.into_iter().map(|t| t.test_id).collect(),
            Err(e) => {
                eprintln!("ripple run: {e}");
                return 2;
            }
        }
    };
    if test_ids.is_empty() {
        eprintln!("ripple run: no tests to run");
        return 0;
    }

    match run_impacted_tests(repo, &test_ids, timeout) {
        Ok(outcome) => {
            print!("{}", with_newline(formatter.format_run(&outcome)));
            if outcome.all_passed() {
                0
            } else {
                1
            }
        }
        Err(e) => {
            eprintln!("ripple run: {e}");
            2
        }
    }
}

use std::fmt::Write;

use crate::OutputFormatter;
use ripple_fix::orchestrator::{FixOutcome, FixReport};
use ripple_fix::runner::{TestFailure, TestRunOutcome};
use ripple_impact::types::{BuildReport, ImpactedTest};

pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_build(&self, report: &BuildReport) -> String {
        let mut out = format!(
            "{} @ {} (generation {}){}\n  {} nodes, {} edges, {} tests\n  {} files parsed, {} reused in {}ms\n",
            report.repo_id,
            report.commit_id,
            report.generation,
            if report.cache_hit { " [cached]" } else { "" },
            report.nodes_created,
            report.edges_created,
            report.tests,
            report.files_parsed,
            report.files_reused,
            report.build_time_ms,
        );
        if report.unresolved_references > 0 {
            let _ = writeln!(
                out,
                "  {} unresolved reference(s)",
                report.unresolved_references
            );
        }
        if !report.partial_files.is_empty() {
            let _ = writeln!(out, "\nPartial files ({}):", report.partial_files.len());
            for failure in &report.partial_files {
                let _ = writeln!(out, "  {failure}");
            }
        }
        out
    }

    fn format_impact(&self, tests: &[ImpactedTest]) -> String {
        if tests.is_empty() {
            return "No impacted tests.\n".to_string();
        }
        let width = tests.iter().map(|t| t.test_id.len()).max().unwrap_or(0);
        let mut out = String::new();
        for t in tests {
            let _ = write!(
                out,
                "{:.2}  {:<width$}  {}",
                t.score,
                t.test_id,
                t.strategy,
                width = width
            );
            if t.hops > 0 {
                let _ = write!(out, " +{} hop(s)", t.hops);
            }
            out.push('\n');
        }
        let _ = writeln!(out, "\n{} impacted test(s)", tests.len());
        out
    }

    fn format_run(&self, outcome: &TestRunOutcome) -> String {
        let mut out = String::new();
        for failure in &outcome.failed {
            out.push_str(&format_failure("FAILED", failure));
        }
        for failure in &outcome.errored {
            out.push_str(&format_failure("ERROR", failure));
        }
        let _ = writeln!(
            out,
            "{} passed, {} failed, {} errored",
            outcome.passed.len(),
            outcome.failed.len(),
            outcome.errored.len()
        );
        out
    }

    fn format_fix(&self, report: &FixReport) -> String {
        let mut out = String::new();
        for it in &report.iterations {
            let _ = write!(
                out,
                "#{} {} file(s) changed, {} impacted",
                it.number,
                it.changed_files.len(),
                it.impacted.len()
            );
            match (&it.run, &it.error) {
                (_, Some(error)) => {
                    let _ = write!(out, ", {error}");
                }
                (Some(run), None) => {
                    let _ = write!(
                        out,
                        ", {} passed / {} failed / {} errored",
                        run.passed.len(),
                        run.failed.len(),
                        run.errored.len()
                    );
                }
                (None, None) if it.vacuous => out.push_str(", nothing to run"),
                (None, None) => {}
            }
            out.push('\n');
        }
        let label = match report.outcome {
            FixOutcome::AllPassed => "all impacted tests passed",
            FixOutcome::Unresolved => "unresolved",
            FixOutcome::Inconclusive => "inconclusive",
        };
        let _ = write!(out, "\nOutcome: {label}");
        if let Some(reason) = &report.reason {
            let _ = write!(out, " ({reason})");
        }
        out.push('\n');
        out
    }
}

fn format_failure(status: &str, failure: &TestFailure) -> String {
    let mut out = format!("{status} {}\n", failure.id);
    if !failure.message.is_empty() {
        let _ = writeln!(out, "  = {}", failure.message);
    }
    out
}

//! Output formatters for ripple command results.
//!
//! Two modes:
//! - **JSON** (`--json`): machine-readable structured output
//! - **Human** (default): compact terminal output

pub mod human;
pub mod json;

use ripple_fix::orchestrator::FixReport;
use ripple_fix::runner::TestRunOutcome;
use ripple_impact::types::{BuildReport, ImpactedTest};

pub trait OutputFormatter {
    fn format_build(&self, report: &BuildReport) -> String;
    fn format_impact(&self, tests: &[ImpactedTest]) -> String;
    fn format_run(&self, outcome: &TestRunOutcome) -> String;
    fn format_fix(&self, report: &FixReport) -> String;
}

/// Pick a formatter for the global `--json` flag.
pub fn formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(json::JsonFormatter)
    } else {
        Box::new(human::HumanFormatter)
    }
}

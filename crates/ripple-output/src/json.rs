use crate::OutputFormatter;
use ripple_fix::orchestrator::FixReport;
use ripple_fix::runner::TestRunOutcome;
use ripple_impact::types::{BuildReport, ImpactedTest};

pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_build(&self, report: &BuildReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_default()
    }
    fn format_impact(&self, tests: &[ImpactedTest]) -> String {
        serde_json::to_string_pretty(tests).unwrap_or_default()
    }
    fn format_run(&self, outcome: &TestRunOutcome) -> String {
        serde_json::to_string_pretty(outcome).unwrap_or_default()
    }
    fn format_fix(&self, report: &FixReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_default()
    }
}

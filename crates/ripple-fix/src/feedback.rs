//! Failure detail and prompts handed to the fix agent.

use std::fmt::Write;

use crate::runner::{TestFailure, TestRunOutcome};

/// Per-test failure detail: id, assertion message and the last
/// `traceback_lines` lines of the traceback.
pub fn format_feedback(outcome: &TestRunOutcome, traceback_lines: usize) -> String {
    let problems: Vec<&TestFailure> = outcome.problems().collect();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} of {} impacted tests did not pass.",
        problems.len(),
        problems.len() + outcome.passed.len()
    );

    for (failure, status) in outcome
        .failed
        .iter()
        .map(|f| (f, "FAILED"))
        .chain(outcome.errored.iter().map(|f| (f, "ERROR")))
    {
        let _ = writeln!(out, "\n{status} {}", failure.id);
        if !failure.message.is_empty() {
            let _ = writeln!(out, "  message: {}", failure.message);
        }
        let lines: Vec<&str> = failure.traceback.lines().collect();
        if lines.is_empty() || traceback_lines == 0 {
            continue;
        }
        let start = lines.len().saturating_sub(traceback_lines);
        out.push_str("  traceback:\n");
        if start > 0 {
            let _ = writeln!(out, "    ... {start} earlier lines omitted");
        }
        for line in &lines[start..] {
            let _ = writeln!(out, "    {line}");
        }
    }
    out
}

/// Prompt for one candidate request.
pub fn build_prompt(task: &str, feedback: Option<&str>, iteration: u32, max_iterations: u32) -> String {
    let mut prompt = format!("Attempt {iteration} of {max_iterations}.\n\n{}\n", task.trim_end());
    if let Some(feedback) = feedback {
        prompt.push_str("\nThe previous candidate was checked against its impacted tests:\n\n");
        prompt.push_str(feedback);
    }
    prompt
}

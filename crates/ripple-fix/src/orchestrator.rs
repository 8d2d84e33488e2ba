//! Iterative fix loop.
//!
//! An explicit synchronous state machine: each pass asks the agent for a
//! candidate, queries the impact of its changed files, runs exactly those
//! tests and either stops or feeds the failures back. The iteration cap is
//! counted in `RunningTests` entries.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use ripple_core::cancel::CancellationToken;
use ripple_core::config::FixConfig;
use ripple_impact::engine::{ImpactEngine, ImpactRequest};
use ripple_impact::types::{EngineError, ImpactedTest};

use crate::agent::FixAgent;
use crate::diff::DiffProvider;
use crate::feedback::{build_prompt, format_feedback};
use crate::runner::{RunnerError, TestRunOutcome, TestRunner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixState {
    AwaitingCandidate,
    ImpactQuery,
    RunningTests,
    Failed,
    Feedback,
    AllPassed,
    Unresolved,
    Inconclusive,
}

impl FixState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            FixState::AllPassed | FixState::Unresolved | FixState::Inconclusive
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixOutcome {
    AllPassed,
    Unresolved,
    Inconclusive,
}

/// What happened in one pass of the loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Iteration {
    pub number: u32,
    pub changed_files: Vec<String>,
    pub impacted: Vec<ImpactedTest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<TestRunOutcome>,
    pub runner_attempts: u32,
    /// Passed only because no test was impacted.
    #[serde(default)]
    pub vacuous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixReport {
    pub outcome: FixOutcome,
    pub iterations: Vec<Iteration>,
    /// Every state entered, starting with `AwaitingCandidate`.
    pub transitions: Vec<FixState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FixReport {
    pub fn test_runs(&self) -> usize {
        self.transitions
            .iter()
            .filter(|s| **s == FixState::RunningTests)
            .count()
    }
}

/// Impact of a candidate's changed files.
pub trait ImpactProvider {
    fn impacted_tests(
        &self,
        iteration: u32,
        changed_files: &[String],
    ) -> Result<Vec<ImpactedTest>, EngineError>;
}

/// Queries an [`ImpactEngine`]. Each candidate is labelled as its own
/// commit so the engine rebuilds incrementally from the previous one.
pub struct EngineImpact<'a> {
    engine: &'a ImpactEngine,
    repo_path: PathBuf,
    base_commit: String,
    threshold: Option<f64>,
    max_results: Option<usize>,
    cancel: CancellationToken,
}

impl<'a> EngineImpact<'a> {
    pub fn new(engine: &'a ImpactEngine, repo_path: &Path, base_commit: impl Into<String>) -> Self {
        Self {
            engine,
            repo_path: repo_path.to_path_buf(),
            base_commit: base_commit.into(),
            threshold: None,
            max_results: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_limits(mut self, threshold: Option<f64>, max_results: Option<usize>) -> Self {
        self.threshold = threshold;
        self.max_results = max_results;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl ImpactProvider for EngineImpact<'_> {
    fn impacted_tests(
        &self,
        iteration: u32,
        changed_files: &[String],
    ) -> Result<Vec<ImpactedTest>, EngineError> {
        let request = ImpactRequest {
            repo_path: self.repo_path.clone(),
            commit_id: Some(format!("{}+candidate{iteration}", self.base_commit)),
            changed_files: changed_files.to_vec(),
            threshold: self.threshold,
            max_results: self.max_results,
        };
        self.engine.get_worktree_impacted_tests(&request, &self.cancel)
    }
}

pub struct Orchestrator<'a> {
    agent: &'a mut dyn FixAgent,
    impact: &'a dyn ImpactProvider,
    runner: &'a dyn TestRunner,
    diff: Option<&'a dyn DiffProvider>,
    repo_path: PathBuf,
    config: FixConfig,
    timeout: Duration,
}

/// Mutable state of one loop run.
struct Run {
    state: FixState,
    transitions: Vec<FixState>,
    iterations: Vec<Iteration>,
    feedback: Option<String>,
    reason: Option<String>,
}

impl Run {
    fn enter(&mut self, state: FixState) {
        tracing::debug!(?state, "fix loop transition");
        self.state = state;
        self.transitions.push(state);
    }

    fn current(&mut self) -> Option<&mut Iteration> {
        self.iterations.last_mut()
    }

    fn give_up(&mut self, reason: String) {
        tracing::warn!(%reason, "fix loop inconclusive");
        if let Some(iteration) = self.current() {
            iteration.error = Some(reason.clone());
        }
        self.reason = Some(reason);
        self.enter(FixState::Inconclusive);
    }
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        agent: &'a mut dyn FixAgent,
        impact: &'a dyn ImpactProvider,
        runner: &'a dyn TestRunner,
        repo_path: &Path,
        config: FixConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            agent,
            impact,
            runner,
            diff: None,
            repo_path: repo_path.to_path_buf(),
            config,
            timeout,
        }
    }

    pub fn with_diff(mut self, diff: &'a dyn DiffProvider) -> Self {
        self.diff = Some(diff);
        self
    }

    fn max_iterations(&self) -> u32 {
        self.config.max_iterations.max(1)
    }

    /// Drive the loop to a terminal state.
    pub fn run(&mut self, task: &str) -> FixReport {
        let _span = tracing::info_span!("fix_loop", max_iterations = self.max_iterations()).entered();
        let mut run = Run {
            state: FixState::AwaitingCandidate,
            transitions: vec![FixState::AwaitingCandidate],
            iterations: Vec::new(),
            feedback: None,
            reason: None,
        };

        while !run.state.is_terminal() {
            match run.state {
                FixState::AwaitingCandidate => self.await_candidate(&mut run, task),
                FixState::ImpactQuery => self.query_impact(&mut run),
                FixState::RunningTests => self.run_tests(&mut run),
                FixState::Failed => {
                    if run.iterations.len() as u32 >= self.max_iterations() {
                        run.reason = Some(format!(
                            "tests still failing after {} iterations",
                            run.iterations.len()
                        ));
                        run.enter(FixState::Unresolved);
                    } else {
                        run.enter(FixState::Feedback);
                    }
                }
                FixState::Feedback => {
                    let lines = self.config.traceback_lines;
                    run.feedback = run
                        .iterations
                        .last()
                        .and_then(|it| it.run.as_ref())
                        .map(|outcome| format_feedback(outcome, lines));
                    run.enter(FixState::AwaitingCandidate);
                }
                FixState::AllPassed | FixState::Unresolved | FixState::Inconclusive => break,
            }
        }

        let outcome = match run.state {
            FixState::AllPassed => FixOutcome::AllPassed,
            FixState::Unresolved => FixOutcome::Unresolved,
            _ => FixOutcome::Inconclusive,
        };
        tracing::info!(?outcome, iterations = run.iterations.len(), "fix loop finished");
        FixReport {
            outcome,
            iterations: run.iterations,
            transitions: run.transitions,
            reason: run.reason,
        }
    }

    fn await_candidate(&mut self, run: &mut Run, task: &str) {
        let number = run.iterations.len() as u32 + 1;
        run.iterations.push(Iteration {
            number,
            ..Iteration::default()
        });
        let prompt = build_prompt(task, run.feedback.as_deref(), number, self.max_iterations());

        let candidate = match self.agent.propose(&prompt) {
            Ok(candidate) => candidate,
            Err(e) => return run.give_up(format!("agent failed: {e}")),
        };
        let changed_files = if candidate.changed_files.is_empty() {
            match self.diff.map(|d| d.changed_files()) {
                Some(Ok(files)) => files,
                Some(Err(e)) => return run.give_up(format!("diff failed: {e}")),
                None => Vec::new(),
            }
        } else {
            candidate.changed_files
        };
        if changed_files.is_empty() {
            return run.give_up("candidate changed no files".to_string());
        }
        tracing::info!(iteration = number, files = changed_files.len(), "candidate received");
        if let Some(iteration) = run.current() {
            iteration.changed_files = changed_files;
        }
        run.enter(FixState::ImpactQuery);
    }

    fn query_impact(&mut self, run: &mut Run) {
        let Some(iteration) = run.current() else {
            return run.give_up("no candidate to query".to_string());
        };
        let number = iteration.number;
        match self.impact.impacted_tests(number, &iteration.changed_files) {
            Ok(impacted) if impacted.is_empty() => {
                tracing::warn!(iteration = number, "no impacted tests; nothing to run");
                iteration.vacuous = true;
                run.enter(FixState::AllPassed);
            }
            Ok(impacted) => {
                iteration.impacted = impacted;
                run.enter(FixState::RunningTests);
            }
            Err(e) => run.give_up(format!("impact query failed: {e}")),
        }
    }

    fn run_tests(&mut self, run: &mut Run) {
        let Some(iteration) = run.current() else {
            return run.give_up("no candidate to run".to_string());
        };
        let ids: Vec<String> = iteration.impacted.iter().map(|t| t.test_id.clone()).collect();
        let attempts = self.config.runner_retries + 1;

        let mut last_error: Option<RunnerError> = None;
        for attempt in 1..=attempts {
            iteration.runner_attempts = attempt;
            match self.runner.run(&self.repo_path, &ids, self.timeout) {
                Ok(outcome) => {
                    let passed = outcome.all_passed();
                    iteration.run = Some(outcome);
                    run.enter(if passed {
                        FixState::AllPassed
                    } else {
                        FixState::Failed
                    });
                    return;
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "test runner failed");
                    last_error = Some(e);
                }
            }
        }
        let reason = match last_error {
            Some(e) => format!("test runner failed {attempts} times: {e}"),
            None => "test runner never ran".to_string(),
        };
        run.give_up(reason);
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use ripple_core::vcs;
use ripple_fix::agent::CommandAgent;
use ripple_fix::diff::GitDiffProvider;
use ripple_fix::orchestrator::{EngineImpact, FixOutcome, Orchestrator};
use ripple_fix::runner::SubprocessRunner;
use ripple_impact::engine::{ImpactEngine, Repo};
use ripple_output::OutputFormatter;

use super::build::with_newline;

pub struct FixArgs {
    pub repo: PathBuf,
    pub task: Option<String>,
    pub task_file: Option<PathBuf>,
    pub agent: Vec<String>,
    pub base: Option<String>,
    pub max_iterations: Option<u32>,
    pub threshold: Option<f64>,
}

/// Run `ripple fix`: loop agent candidates through impact selection and the
/// test runner. Exit 0 when the impacted tests pass, 1 otherwise.
pub fn run(formatter: &dyn OutputFormatter, args: FixArgs) -> i32 {
    let repo = match Repo::open(&args.repo) {
        Ok(repo) => repo,
        Err(e) => {
            eprintln!("ripple fix: {e}");
            return 2;
        }
    };
    let task = match (&args.task, &args.task_file) {
        (Some(task), _) => task.clone(),
        (None, Some(path)) => match fs::read_to_string(path) {
            Ok(task) => task,
            Err(e) => {
                eprintln!("ripple fix: cannot read {}: {e}", path.display());
                return 2;
            }
        },
        (None, None) => {
            eprintln!("ripple fix: --task or --task-file is required");
            return 2;
        }
    };

    let command = if args.agent.is_empty() {
        repo.config.fix.agent_command.clone()
    } else {
        args.agent.clone()
    };
    let mut agent = match CommandAgent::new(command, &repo.root) {
        Ok(agent) => agent,
        Err(e) => {
            eprintln!("ripple fix: {e} (pass `-- <agent command>` or set fix.agent_command)");
            return 2;
        }
    };

    let mut fix_config = repo.config.fix.clone();
    if let Some(max) = args.max_iterations {
        fix_config.max_iterations = max;
    }
    let base = args.base.as_deref().unwrap_or("HEAD");
    let base_commit = vcs::resolve_commit(&repo.root, args.base.as_deref());

    let engine = ImpactEngine::new(repo.config.cache.memory_capacity);
    let impact = EngineImpact::new(&engine, &repo.root, base_commit).with_limits(args.threshold, None);
    let runner = SubprocessRunner::from_config(&repo.config.runner);
    let diff = GitDiffProvider::new(&repo.root, base);
    let timeout = Duration::from_secs(repo.config.runner.timeout_secs);

    let report = Orchestrator::new(&mut agent, &impact, &runner, &repo.root, fix_config, timeout)
        .with_diff(&diff)
        .run(&task);

    print!("{}", with_newline(formatter.format_fix(&report)));
    match report.outcome {
        FixOutcome::AllPassed => 0,
        FixOutcome::Unresolved | FixOutcome::Inconclusive => 1,
    }
}

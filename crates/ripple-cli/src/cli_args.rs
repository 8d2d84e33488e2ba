use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ripple", version, about = "Select and run the tests a change can break")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as structured JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log progress to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Repository root
    #[arg(long, short = 'C', global = true, env = "RIPPLE_REPO", default_value = ".")]
    pub repo: PathBuf,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Create .ripple/ with a default config
    Init,

    /// Build (or load) the code/test graph
    Build {
        /// Commit label (default: git HEAD, or "worktree")
        #[arg(long)]
        commit: Option<String>,
        /// Ignore cached snapshots
        #[arg(long)]
        force: bool,
        /// Coverage JSON mapping test ids to executed lines
        #[arg(long)]
        coverage: Option<PathBuf>,
    },

    /// Rank the tests impacted by changed files
    Impact {
        /// Changed files (empty = working-tree diff)
        files: Vec<String>,
        /// Base revision for the working-tree diff
        #[arg(long)]
        since: Option<String>,
        #[arg(long)]
        commit: Option<String>,
        /// Minimum score in [0, 1]
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long)]
        max_results: Option<usize>,
    },

    /// Run tests by id, or the tests impacted by changed files
    Run {
        /// Pytest node ids
        test_ids: Vec<String>,
        /// Select tests by impact of these files instead
        #[arg(long, num_args = 1.., conflicts_with = "test_ids")]
        changed: Vec<String>,
        /// Runner timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Drive an external agent until the impacted tests pass
    Fix {
        /// Task description given to the agent
        #[arg(long, required_unless_present = "task_file")]
        task: Option<String>,
        /// Read the task description from a file
        #[arg(long, conflicts_with = "task")]
        task_file: Option<PathBuf>,
        /// Agent command and its arguments, after `--` (overrides fix.agent_command)
        #[arg(last = true, value_name = "AGENT")]
        agent: Vec<String>,
        /// Base revision candidates are diffed against
        #[arg(long)]
        base: Option<String>,
        #[arg(long)]
        max_iterations: Option<u32>,
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// HTTP API on localhost
    Serve {
        #[arg(long, default_value = "4815")]
        port: u16,
    },

    /// Generate shell completions
    Completion {
        /// bash, zsh, fish, elvish or powershell
        shell: String,
    },
}

#[cfg(test)]
#[path = "cli_args_tests.rs"]
mod tests;

//! ripple CLI: regression-impact test selection for Python repositories.
//!
//! Exit codes: 0 success, 1 tests failed or the fix loop did not converge,
//! 2 usage or infrastructure error. See `ripple --help` for usage.

use clap::Parser;

mod cli_args;
mod commands;
mod logging;

use cli_args::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_json);

    let formatter = ripple_output::formatter(cli.json);
    let repo = cli.repo;

    let exit_code = match cli.command {
        Commands::Init => commands::init::run(&repo, cli.verbose),
        Commands::Build {
            commit,
            force,
            coverage,
        } => commands::build::run(&*formatter, repo, commit, force, coverage),
        Commands::Impact {
            files,
            since,
            commit,
            threshold,
            max_results,
        } => commands::impact::run(
            &*formatter,
            commands::impact::ImpactArgs {
                repo,
                files,
                since,
                commit,
                threshold,
                max_results,
            },
        ),
        Commands::Run {
            test_ids,
            changed,
            timeout,
        } => commands::run::run(&*formatter, &repo, test_ids, changed, timeout),
        Commands::Fix {
            task,
            task_file,
            agent,
            base,
            max_iterations,
            threshold,
        } => commands::fix::run(
            &*formatter,
            commands::fix::FixArgs {
                repo,
                task,
                task_file,
                agent,
                base,
                max_iterations,
                threshold,
            },
        ),
        Commands::Serve { port } => commands::serve::run(&repo, port),
        Commands::Completion { shell } => commands::completion::run(&shell),
    };

    std::process::exit(exit_code);
}

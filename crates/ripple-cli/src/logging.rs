use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive, e.g. `ripple_impact=debug`.
pub const LOG_ENV: &str = "RIPPLE_LOG";

/// Install the global subscriber. Logs go to stderr so stdout stays clean
/// for command output; `RIPPLE_LOG` overrides the level picked by `verbose`.
pub fn init(verbose: bool, json: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .compact(),
            )
            .try_init()
    };
    if let Err(e) = result {
        eprintln!("ripple: logging unavailable: {e}");
    }
}

use std::path::Path;

use ripple_core::config::RippleConfig;
use ripple_server::RippleServer;

/// Run `ripple serve`: HTTP API on 127.0.0.1 until interrupted.
pub fn run(repo: &Path, port: u16) -> i32 {
    let config = RippleConfig::for_repo(repo);
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("ripple serve: failed to start runtime: {e}");
            return 2;
        }
    };
    let server = RippleServer::new(config.cache.memory_capacity);
    eprintln!("ripple serve: listening on http://127.0.0.1:{port}");
    match runtime.block_on(server.serve(port)) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("ripple serve: {e}");
            2
        }
    }
}

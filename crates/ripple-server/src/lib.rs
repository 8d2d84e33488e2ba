pub mod http;

use std::sync::Arc;

use ripple_impact::engine::ImpactEngine;

use crate::http::SharedEngine;

/// Shared server state: one engine, and with it one snapshot cache,
/// behind every request.
pub struct RippleServer {
    pub engine: SharedEngine,
}

impl RippleServer {
    pub fn new(memory_capacity: usize) -> Self {
        Self {
            engine: Arc::new(ImpactEngine::new(memory_capacity)),
        }
    }

    pub async fn serve(&self, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        http::serve(Arc::clone(&self.engine), port).await
    }
}

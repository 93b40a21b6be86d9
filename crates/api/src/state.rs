use std::sync::Arc;

use mvforge_pipeline::Pipeline;

use crate::config::ServerConfig;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub pipeline: Arc<Pipeline>,
}

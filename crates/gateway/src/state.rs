use std::sync::Arc;

use sm_domain::config::Config;

use crate::runtime::CompletionOrchestrator;

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub orchestrator: CompletionOrchestrator,
}

pub mod completions;
pub mod cors;
pub mod error;
pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the API router. Layers (CORS, concurrency limit) are added by the
/// caller.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/v1/providers", get(health::list_providers))
        .route("/v1/agents/:agent_id/completions", post(completions::complete))
        .route(
            "/v1/agents/:agent_id/completions/stream",
            post(completions::complete_stream),
        )
}

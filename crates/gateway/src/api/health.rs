use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let orchestrator = &state.orchestrator;
    Json(serde_json::json!({
        "status": "healthy",
        "memory_available": orchestrator.memory_available(),
        "default_provider": orchestrator.resolver().default_provider(),
    }))
}

pub async fn list_providers(State(state): State<AppState>) -> impl IntoResponse {
    let providers = state.orchestrator.providers().list_providers();
    Json(serde_json::json!({
        "providers": providers,
        "count": providers.len(),
        "default": state.orchestrator.resolver().default_provider(),
    }))
}

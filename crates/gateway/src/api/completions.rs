//! Completion endpoints.
//!
//! - `POST /v1/agents/:agent_id/completions`        — buffered JSON result
//! - `POST /v1/agents/:agent_id/completions/stream` — SSE `chunk` / `done` / `error`

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Json, Response};
use futures_util::stream::Stream;
use futures_util::StreamExt;
use serde::Deserialize;

use sm_domain::chat::{AgentConfig, ChatMessage};
use sm_domain::memory::{MemoryScope, MemorySize};
use sm_domain::stream::{BoxStream, StreamChunk};

use super::error::{error_body, ApiError};
use crate::runtime::CompletionRequest;
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request shape
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct CompletionBody {
    pub messages: Vec<ChatMessage>,
    pub agent: AgentConfig,
    /// Without a chat id memory is neither read nor written.
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub capsule_id: Option<String>,
    /// Falls back to `memory.default_size`.
    #[serde(default)]
    pub memory_size: Option<MemorySize>,
}

impl CompletionBody {
    fn into_request(self, agent_id: String, default_size: MemorySize) -> CompletionRequest {
        let scope = MemoryScope {
            agent_id: agent_id.clone(),
            chat_id: self.chat_id,
            capsule_id: self.capsule_id,
        };
        CompletionRequest {
            agent_id,
            messages: self.messages,
            agent: self.agent,
            scope,
            memory_size: self.memory_size.unwrap_or(default_size),
        }
    }
}

fn invalid_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message, "kind": "invalid_request" })),
    )
        .into_response()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/agents/:agent_id/completions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn complete(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Json(body): Json<CompletionBody>,
) -> Response {
    if body.messages.is_empty() {
        return invalid_request("messages must not be empty");
    }
    let req = body.into_request(agent_id, state.config.memory.default_size);

    match state.orchestrator.complete(req).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/agents/:agent_id/completions/stream (SSE)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn complete_stream(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Json(body): Json<CompletionBody>,
) -> Response {
    if body.messages.is_empty() {
        return invalid_request("messages must not be empty");
    }
    let req = body.into_request(agent_id, state.config.memory.default_size);

    let stream = match state.orchestrator.open_stream(req) {
        Ok(s) => make_sse_stream(s.chunks, s.model).boxed(),
        Err(e) => {
            let event = error_event(&e);
            futures_util::stream::once(async move { Ok::<_, Infallible>(event) }).boxed()
        }
    };

    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// Dropping the returned stream (client disconnect) drops the completion
/// stream with it, so nothing is persisted for an abandoned request.
fn make_sse_stream(
    mut chunks: BoxStream<'static, sm_domain::error::Result<StreamChunk>>,
    model: String,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        while let Some(item) = chunks.next().await {
            match item {
                Ok(chunk) => {
                    let data = serde_json::to_string(&chunk).unwrap_or_default();
                    yield Ok(Event::default().event("chunk").data(data));
                }
                Err(e) => {
                    yield Ok(error_event(&e));
                    return;
                }
            }
        }
        let done = serde_json::json!({ "model": model });
        yield Ok(Event::default().event("done").data(done.to_string()));
    }
}

fn error_event(err: &sm_domain::error::Error) -> Event {
    Event::default()
        .event("error")
        .data(error_body(err).to_string())
}

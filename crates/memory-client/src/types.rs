//! Data Transfer Objects for the mem0-compatible REST API.

use serde::{Deserialize, Serialize};
use sm_domain::chat::ChatMessage;
use sm_domain::memory::MemorySnippet;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Search
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// POST /v1/memories/search/ — request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Scope namespace; keeps capsules of one chat apart.
    pub user_id: String,
    pub agent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub limit: u32,
}

/// POST /v1/memories/search/ — response body.
///
/// Older servers answer with a bare array, newer ones wrap it.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SearchResponse {
    Wrapped { results: Vec<MemoryItemDto> },
    List(Vec<MemoryItemDto>),
}

impl SearchResponse {
    pub fn into_items(self) -> Vec<MemoryItemDto> {
        match self {
            SearchResponse::Wrapped { results } => results,
            SearchResponse::List(items) => items,
        }
    }
}

/// One stored memory as returned by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryItemDto {
    #[serde(default)]
    pub id: Option<String>,
    pub memory: String,
    #[serde(default)]
    pub score: Option<f64>,
}

impl From<MemoryItemDto> for MemorySnippet {
    fn from(dto: MemoryItemDto) -> Self {
        MemorySnippet {
            content: dto.memory,
            relevance: dto.score,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Add
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// POST /v1/memories/ — request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMemoryRequest {
    pub messages: Vec<ChatMessage>,
    pub user_id: String,
    pub agent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub metadata: AddMemoryMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddMemoryMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capsule_id: Option<String>,
}

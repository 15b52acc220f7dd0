//! Anthropic-native adapter.
//!
//! Implements streaming on the Anthropic Messages API, where system messages
//! go in a separate top-level `system` field.

use crate::sse::{sse_response_stream, SseFrame};
use crate::traits::{ChatRequest, LlmProvider};
use crate::util::{default_credential, from_reqwest, pick_key, send_streaming};
use serde_json::Value;
use sm_domain::chat::Role;
use sm_domain::config::ProviderConfig;
use sm_domain::error::{Error, Result};
use sm_domain::provider::ProviderId;
use sm_domain::stream::{BoxStream, StreamChunk};
use std::time::Duration;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Constants
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// An LLM provider adapter for the Anthropic Messages API.
pub struct AnthropicProvider {
    base_url: String,
    default_model: String,
    default_key: Option<String>,
    headers: Vec<(String, String)>,
    timeout: Duration,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn from_config(cfg: &ProviderConfig, timeout: Duration) -> Result<Self> {
        let id = ProviderId::Anthropic;
        let default_key = default_credential(cfg);

        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| from_reqwest(id, e))?;

        Ok(Self {
            base_url: cfg.base_url().trim_end_matches('/').to_string(),
            default_model: cfg.default_model().to_string(),
            default_key,
            headers: cfg
                .headers
                .iter()
                .map(|(n, v)| (n.clone(), v.clone()))
                .collect(),
            timeout,
            client,
        })
    }

    fn build_messages_body(&self, req: &ChatRequest) -> Value {
        // Separate out system messages.
        let mut system_parts: Vec<&str> = Vec::new();
        let mut api_messages: Vec<Value> = Vec::new();

        for msg in &req.messages {
            match msg.role {
                Role::System => system_parts.push(&msg.content),
                Role::User | Role::Assistant => api_messages.push(serde_json::json!({
                    "role": msg.role.as_str(),
                    "content": msg.content,
                })),
            }
        }

        let mut body = serde_json::json!({
            "model": self.resolve_model(req),
            "messages": api_messages,
            "max_tokens": MAX_TOKENS,
            "stream": true,
        });
        if !system_parts.is_empty() {
            body["system"] = Value::String(system_parts.join("\n\n"));
        }
        body
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SSE event parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Parse one `data:` payload of a Messages API stream.
///
/// Only `text_delta` content produces fragments; `message_start`,
/// `content_block_start`, `ping` and friends are skipped.
pub(crate) fn parse_anthropic_sse(data: &str) -> Result<SseFrame> {
    let provider = ProviderId::Anthropic;
    let v: Value = serde_json::from_str(data).map_err(|e| Error::MalformedStream {
        provider: provider.to_string(),
        message: e.to_string(),
    })?;

    match v.get("type").and_then(|t| t.as_str()).unwrap_or("") {
        "content_block_delta" => {
            let delta = v.get("delta").unwrap_or(&Value::Null);
            if delta.get("type").and_then(|t| t.as_str()) != Some("text_delta") {
                return Ok(SseFrame::Skip);
            }
            match delta.get("text").and_then(|t| t.as_str()) {
                Some(text) if !text.is_empty() => Ok(SseFrame::Text(text.to_string())),
                _ => Ok(SseFrame::Skip),
            }
        }
        "message_stop" => Ok(SseFrame::Done),
        "error" => {
            let err = v.get("error").unwrap_or(&Value::Null);
            let status = match err.get("type").and_then(|t| t.as_str()) {
                Some("overloaded_error") => 529,
                Some("rate_limit_error") => 429,
                _ => 502,
            };
            let body = err
                .get("message")
                .and_then(|m| m.as_str())
                .map(String::from)
                .unwrap_or_else(|| err.to_string());
            Err(Error::ProviderHttp {
                provider: provider.to_string(),
                status,
                body,
            })
        }
        _ => Ok(SseFrame::Skip),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    async fn chat_stream(
        &self,
        req: ChatRequest,
    ) -> Result<BoxStream<'static, Result<StreamChunk>>> {
        let id = ProviderId::Anthropic;
        let key = pick_key(id, req.request_key(), self.default_key.as_deref())?;
        let url = format!("{}/messages", self.base_url);
        let body = self.build_messages_body(&req);

        tracing::debug!(provider = %id, url = %url, "anthropic stream request");

        let mut builder = self
            .client
            .post(&url)
            .header("x-api-key", key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let resp = send_streaming(id, builder, self.timeout).await?;
        Ok(sse_response_stream(resp, id, self.timeout, parse_anthropic_sse))
    }

    fn resolve_model(&self, req: &ChatRequest) -> String {
        req.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(self.default_model.as_str())
            .to_string()
    }

    fn provider_id(&self) -> ProviderId {
        ProviderId::Anthropic
    }
}

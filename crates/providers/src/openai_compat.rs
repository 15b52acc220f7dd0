//! OpenAI-compatible adapter.
//!
//! Serves OpenRouter, OpenAI and Mistral, which all follow the OpenAI chat
//! completions streaming contract.

use crate::sse::{sse_response_stream, SseFrame};
use crate::traits::{ChatRequest, LlmProvider};
use crate::util::{default_credential, from_reqwest, pick_key, send_streaming};
use serde_json::Value;
use sm_domain::chat::ChatMessage;
use sm_domain::config::ProviderConfig;
use sm_domain::error::{Error, Result};
use sm_domain::provider::ProviderId;
use sm_domain::stream::{BoxStream, StreamChunk};
use std::time::Duration;

const OPENROUTER_REFERER: &str = "https://solmind.ai";
const OPENROUTER_TITLE: &str = "SolMind";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct OpenAiCompatProvider {
    id: ProviderId,
    base_url: String,
    default_model: String,
    default_key: Option<String>,
    headers: Vec<(String, String)>,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a provider from its config entry.
    pub fn from_config(cfg: &ProviderConfig, timeout: Duration) -> Result<Self> {
        let default_key = default_credential(cfg);

        let mut headers: Vec<(String, String)> = Vec::new();
        if cfg.id == ProviderId::OpenRouter {
            headers.push(("HTTP-Referer".into(), OPENROUTER_REFERER.into()));
            headers.push(("X-Title".into(), OPENROUTER_TITLE.into()));
        }
        for (name, value) in &cfg.headers {
            headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| from_reqwest(cfg.id, e))?;

        Ok(Self {
            id: cfg.id,
            base_url: cfg.base_url().trim_end_matches('/').to_string(),
            default_model: cfg.default_model().to_string(),
            default_key,
            headers,
            timeout,
            client,
        })
    }

    // ── Internal: build the JSON body ─────────────────────────────

    fn build_chat_body(&self, req: &ChatRequest) -> Value {
        let messages: Vec<Value> = req.messages.iter().map(msg_to_openai).collect();
        serde_json::json!({
            "model": self.resolve_model(req),
            "messages": messages,
            "stream": true,
        })
    }
}

fn msg_to_openai(msg: &ChatMessage) -> Value {
    serde_json::json!({
        "role": msg.role.as_str(),
        "content": msg.content,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SSE payload parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Parse one `data:` payload of an OpenAI-style stream.
pub(crate) fn parse_sse_data(provider: ProviderId, data: &str) -> Result<SseFrame> {
    if data == "[DONE]" {
        return Ok(SseFrame::Done);
    }

    let v: Value = serde_json::from_str(data).map_err(|e| Error::MalformedStream {
        provider: provider.to_string(),
        message: e.to_string(),
    })?;

    // OpenRouter reports mid-stream failures in-band after a 200.
    if let Some(err) = v.get("error") {
        let status = err
            .get("code")
            .and_then(|c| c.as_u64())
            .filter(|c| (400..600).contains(c))
            .map(|c| c as u16)
            .unwrap_or(502);
        let body = err
            .get("message")
            .and_then(|m| m.as_str())
            .map(String::from)
            .unwrap_or_else(|| err.to_string());
        return Err(Error::ProviderHttp {
            provider: provider.to_string(),
            status,
            body,
        });
    }

    match v
        .pointer("/choices/0/delta/content")
        .and_then(|c| c.as_str())
    {
        Some(text) if !text.is_empty() => Ok(SseFrame::Text(text.to_string())),
        _ => Ok(SseFrame::Skip),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl LlmProvider for OpenAiCompatProvider {
    async fn chat_stream(
        &self,
        req: ChatRequest,
    ) -> Result<BoxStream<'static, Result<StreamChunk>>> {
        let key = pick_key(self.id, req.request_key(), self.default_key.as_deref())?;
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_chat_body(&req);

        tracing::debug!(provider = %self.id, url = %url, "openai_compat stream request");

        let mut builder = self
            .client
            .post(&url)
            .bearer_auth(key)
            .header("Content-Type", "application/json")
            .json(&body);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let resp = send_streaming(self.id, builder, self.timeout).await?;
        let provider = self.id;
        Ok(sse_response_stream(resp, provider, self.timeout, move |data| {
            parse_sse_data(provider, data)
        }))
    }

    fn resolve_model(&self, req: &ChatRequest) -> String {
        req.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(self.default_model.as_str())
            .to_string()
    }

    fn provider_id(&self) -> ProviderId {
        self.id
    }
}

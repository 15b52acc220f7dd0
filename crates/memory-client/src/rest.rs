//! REST implementation of [`MemoryStore`].
//!
//! `RestMemoryClient` wraps a `reqwest::Client` and talks to a
//! mem0-compatible memory server, with automatic retry + exponential
//! back-off on transient (5xx / transport) failures.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use sm_domain::chat::ChatMessage;
use sm_domain::config::MemoryConfig;
use sm_domain::error::{Error, Result};
use sm_domain::memory::{MemoryScope, MemorySize, MemorySnippet};
use sm_domain::trace::TraceEvent;
use uuid::Uuid;

use crate::provider::MemoryStore;
use crate::types::{AddMemoryMetadata, AddMemoryRequest, SearchRequest, SearchResponse};

const SEARCH_PATH: &str = "/v1/memories/search/";
const ADD_PATH: &str = "/v1/memories/";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A REST client for a mem0-compatible memory server.
///
/// Created once and reused for the lifetime of the process.
/// The underlying `reqwest::Client` maintains a connection pool.
#[derive(Debug, Clone)]
pub struct RestMemoryClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    max_retries: u32,
}

impl RestMemoryClient {
    pub fn new(cfg: &MemoryConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            api_key: cfg.api_key.clone().filter(|k| !k.is_empty()),
            max_retries: cfg.max_retries,
        })
    }

    // ── request helpers ──────────────────────────────────────────────

    fn decorate(&self, rb: RequestBuilder) -> RequestBuilder {
        let rb = rb
            .header("X-Client-Type", "solmind")
            .header("X-Trace-Id", Uuid::new_v4().to_string());
        match self.api_key {
            Some(ref key) => rb.header("Authorization", format!("Token {key}")),
            None => rb,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ── retry engine ─────────────────────────────────────────────────

    /// Execute a request with retry + exponential back-off on transient errors.
    ///
    /// * Retries on 5xx status codes and on transport errors.
    /// * Does **not** retry on 4xx (client errors are permanent).
    /// * Emits a `TraceEvent::MemoryCall` after every attempt.
    ///
    /// `to_error` picks the error variant for the operation.
    async fn execute_with_retry(
        &self,
        endpoint: &str,
        to_error: fn(String) -> Error,
        build_request: impl Fn() -> RequestBuilder,
    ) -> Result<Response> {
        let mut last_err: Option<Error> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = Duration::from_millis(100 * 2u64.pow(attempt - 1));
                tokio::time::sleep(backoff).await;
            }

            let start = Instant::now();
            let result = self.decorate(build_request()).send().await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(resp) => {
                    let status = resp.status();
                    TraceEvent::MemoryCall {
                        endpoint: endpoint.to_owned(),
                        status: status.as_u16(),
                        duration_ms,
                    }
                    .emit();

                    if status.is_server_error() {
                        // 5xx — transient, retry
                        let body = resp.text().await.unwrap_or_default();
                        last_err = Some(to_error(format!("{endpoint} returned {status}: {body}")));
                        continue;
                    }
                    if status.is_client_error() {
                        // 4xx — permanent, do NOT retry
                        let body = resp.text().await.unwrap_or_default();
                        return Err(to_error(format!("{endpoint} returned {status}: {body}")));
                    }
                    return Ok(resp);
                }
                Err(e) => {
                    TraceEvent::MemoryCall {
                        endpoint: endpoint.to_owned(),
                        status: 0,
                        duration_ms,
                    }
                    .emit();
                    last_err = Some(to_error(format!("{endpoint}: {e}")));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| to_error(format!("{endpoint}: all retries exhausted"))))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
impl MemoryStore for RestMemoryClient {
    fn is_available(&self) -> bool {
        !self.base_url.is_empty()
    }

    async fn retrieve(
        &self,
        scope: &MemoryScope,
        query: &str,
        size: MemorySize,
    ) -> Result<Vec<MemorySnippet>> {
        let namespace = scope
            .namespace()
            .ok_or_else(|| Error::MemoryRetrieve("scope has no chat id".into()))?;
        let req = SearchRequest {
            query: query.to_owned(),
            user_id: namespace,
            agent_id: scope.agent_id.clone(),
            run_id: scope.chat_id().map(str::to_owned),
            limit: size.snippet_limit(),
        };

        let url = self.url(SEARCH_PATH);
        let resp = self
            .execute_with_retry("POST /v1/memories/search/", Error::MemoryRetrieve, || {
                self.http.post(&url).json(&req)
            })
            .await?;

        let body = resp
            .text()
            .await
            .map_err(|e| Error::MemoryRetrieve(e.to_string()))?;
        let parsed: SearchResponse = serde_json::from_str(&body).map_err(|e| {
            Error::MemoryRetrieve(format!("failed to parse search response: {e}: {body}"))
        })?;

        Ok(parsed
            .into_items()
            .into_iter()
            .take(size.snippet_limit() as usize)
            .map(MemorySnippet::from)
            .collect())
    }

    async fn store(&self, scope: &MemoryScope, exchange: &[ChatMessage]) -> Result<()> {
        let namespace = scope
            .namespace()
            .ok_or_else(|| Error::MemoryStore("scope has no chat id".into()))?;
        let req = AddMemoryRequest {
            messages: exchange.to_vec(),
            user_id: namespace,
            agent_id: scope.agent_id.clone(),
            run_id: scope.chat_id().map(str::to_owned),
            metadata: AddMemoryMetadata {
                capsule_id: scope.capsule_id().map(str::to_owned),
            },
        };

        let url = self.url(ADD_PATH);
        self.execute_with_retry("POST /v1/memories/", Error::MemoryStore, || {
            self.http.post(&url).json(&req)
        })
        .await?;
        Ok(())
    }
}

//! Test doubles shared by the gateway integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream;
use parking_lot::Mutex;

use sm_domain::chat::{AgentConfig, ChatMessage};
use sm_domain::config::PromptConfig;
use sm_domain::error::{Error, Result};
use sm_domain::memory::{MemoryScope, MemorySize, MemorySnippet};
use sm_domain::provider::ProviderId;
use sm_domain::stream::{BoxStream, StreamChunk};
use sm_gateway::runtime::{CompletionOrchestrator, CompletionRequest};
use sm_memory::MemoryStore;
use sm_providers::{ChatRequest, LlmProvider, ProviderRegistry, ProviderResolver};

// ── Scripted provider ───────────────────────────────────────────────────

#[derive(Clone)]
pub enum Script {
    /// Stream these fragments, then end.
    Chunks(Vec<&'static str>),
    /// Fail before the first fragment with an upstream HTTP status.
    Http(u16),
    /// Fail before the first fragment: no credential.
    NoCredential,
    /// Stream these fragments, then fail with a malformed payload.
    BreakAfter(Vec<&'static str>),
}

pub struct ScriptedProvider {
    id: ProviderId,
    script: Script,
    pub calls: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new(id: ProviderId, script: Script) -> Arc<Self> {
        Arc::new(Self {
            id,
            script,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn last_call(&self) -> ChatRequest {
        self.calls.lock().last().cloned().expect("provider was not called")
    }
}

fn chunks(parts: &[&'static str]) -> Vec<Result<StreamChunk>> {
    parts.iter().map(|p| Ok(StreamChunk::new(*p))).collect()
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn chat_stream(
        &self,
        req: ChatRequest,
    ) -> Result<BoxStream<'static, Result<StreamChunk>>> {
        self.calls.lock().push(req);
        let provider = self.id.to_string();
        match &self.script {
            Script::Chunks(parts) => Ok(Box::pin(stream::iter(chunks(parts)))),
            Script::Http(status) => Err(Error::ProviderHttp {
                provider,
                status: *status,
                body: "upstream said no".into(),
            }),
            Script::NoCredential => Err(Error::CredentialMissing { provider }),
            Script::BreakAfter(parts) => {
                let mut items = chunks(parts);
                items.push(Err(Error::MalformedStream {
                    provider,
                    message: "expected value at line 1".into(),
                }));
                Ok(Box::pin(stream::iter(items)))
            }
        }
    }

    fn resolve_model(&self, req: &ChatRequest) -> String {
        req.model.clone().unwrap_or_else(|| "scripted-default".into())
    }

    fn provider_id(&self) -> ProviderId {
        self.id
    }
}

// ── Recording memory store ──────────────────────────────────────────────

pub struct RecordingStore {
    pub available: bool,
    pub fail_retrieve: bool,
    pub fail_store: bool,
    pub snippets: Vec<MemorySnippet>,
    pub retrieves: Mutex<Vec<(MemoryScope, String, MemorySize)>>,
    /// Every write attempt, including rejected ones.
    pub stores: Mutex<Vec<(MemoryScope, Vec<ChatMessage>)>>,
}

impl RecordingStore {
    fn base(snippets: &[&str]) -> Self {
        Self {
            available: true,
            fail_retrieve: false,
            fail_store: false,
            snippets: snippets.iter().map(|s| MemorySnippet::new(*s)).collect(),
            retrieves: Mutex::new(Vec::new()),
            stores: Mutex::new(Vec::new()),
        }
    }

    pub fn with_snippets(snippets: &[&str]) -> Arc<Self> {
        Arc::new(Self::base(snippets))
    }

    pub fn empty() -> Arc<Self> {
        Self::with_snippets(&[])
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail_retrieve: true,
            ..Self::base(&[])
        })
    }

    /// Retrieval works; every write is recorded and then rejected.
    pub fn failing_writes() -> Arc<Self> {
        Arc::new(Self {
            fail_store: true,
            ..Self::base(&[])
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            available: false,
            ..Self::base(&[])
        })
    }
}

#[async_trait]
impl MemoryStore for RecordingStore {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn retrieve(
        &self,
        scope: &MemoryScope,
        query: &str,
        size: MemorySize,
    ) -> Result<Vec<MemorySnippet>> {
        self.retrieves
            .lock()
            .push((scope.clone(), query.to_owned(), size));
        if self.fail_retrieve {
            return Err(Error::MemoryRetrieve("memory server down".into()));
        }
        Ok(self.snippets.clone())
    }

    async fn store(&self, scope: &MemoryScope, exchange: &[ChatMessage]) -> Result<()> {
        self.stores.lock().push((scope.clone(), exchange.to_vec()));
        if self.fail_store {
            return Err(Error::MemoryStore("memory server down".into()));
        }
        Ok(())
    }
}

// ── Builders ────────────────────────────────────────────────────────────

/// Orchestrator with OpenRouter as the only (and default) provider.
pub fn orchestrator(
    provider: Arc<ScriptedProvider>,
    store: Arc<RecordingStore>,
) -> CompletionOrchestrator {
    let resolver = ProviderResolver::new([ProviderId::OpenRouter], ProviderId::OpenRouter);
    let registry = ProviderRegistry::default().with_provider(provider);
    CompletionOrchestrator::new(resolver, registry, store, PromptConfig::default(), 16)
}

pub fn request(chat_id: Option<&str>, messages: Vec<ChatMessage>) -> CompletionRequest {
    let mut scope = MemoryScope::new("agent-7");
    scope.chat_id = chat_id.map(String::from);
    CompletionRequest {
        agent_id: "agent-7".into(),
        messages,
        agent: AgentConfig::new("openrouter"),
        scope,
        memory_size: MemorySize::Medium,
    }
}

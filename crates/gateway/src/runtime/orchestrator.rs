use std::sync::Arc;
use std::time::Instant;

use futures_util::StreamExt;
use tracing::Instrument;

use sm_domain::chat::{latest_user_message, AgentConfig, ChatMessage, CompletionResult};
use sm_domain::config::PromptConfig;
use sm_domain::error::{Error, Result};
use sm_domain::memory::{MemoryScope, MemorySize};
use sm_domain::provider::ProviderId;
use sm_domain::stream::{BoxStream, StreamChunk};
use sm_domain::trace::TraceEvent;
use sm_memory::{MemoryContextBuilder, MemoryStore};
use sm_providers::{ChatRequest, LlmProvider, ProviderRegistry, ProviderResolver};

use super::persist::{PersistJob, PersistQueue};
use super::prompt::augment_messages;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / handle types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Everything one completion needs.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub agent_id: String,
    pub messages: Vec<ChatMessage>,
    pub agent: AgentConfig,
    pub scope: MemoryScope,
    pub memory_size: MemorySize,
}

/// A resolved, not yet started completion stream.
pub struct CompletionStream {
    pub provider: ProviderId,
    pub model: String,
    pub chunks: BoxStream<'static, Result<StreamChunk>>,
}

struct Target {
    provider: Arc<dyn LlmProvider>,
    model: String,
    chat: ChatRequest,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Orchestrator
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Ties provider resolution, memory context, the provider stream and
/// persistence together. Cheap to clone.
#[derive(Clone)]
pub struct CompletionOrchestrator {
    resolver: Arc<ProviderResolver>,
    providers: Arc<ProviderRegistry>,
    store: Arc<dyn MemoryStore>,
    context: MemoryContextBuilder,
    persist: Arc<PersistQueue>,
    prompt: Arc<PromptConfig>,
}

impl CompletionOrchestrator {
    /// Must be called inside a tokio runtime: spawns the persistence worker.
    pub fn new(
        resolver: ProviderResolver,
        providers: ProviderRegistry,
        store: Arc<dyn MemoryStore>,
        prompt: PromptConfig,
        persist_capacity: usize,
    ) -> Self {
        let persist = Arc::new(PersistQueue::spawn(store.clone(), persist_capacity));
        Self {
            resolver: Arc::new(resolver),
            providers: Arc::new(providers),
            context: MemoryContextBuilder::new(store.clone()),
            store,
            persist,
            prompt: Arc::new(prompt),
        }
    }

    pub fn resolver(&self) -> &ProviderResolver {
        &self.resolver
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn memory_available(&self) -> bool {
        self.store.is_available()
    }

    /// Close the persistence queue and wait for queued exchanges.
    pub async fn shutdown(&self) {
        self.persist.shutdown().await;
    }

    // ── entry points ─────────────────────────────────────────────────

    /// Resolve the provider and model without doing any I/O. The returned
    /// stream starts work when first polled.
    pub fn open_stream(&self, req: CompletionRequest) -> Result<CompletionStream> {
        let target = self.target(&req)?;
        let provider = target.provider.provider_id();
        let model = target.model.clone();
        Ok(CompletionStream {
            provider,
            model,
            chunks: self.run(target, req, true),
        })
    }

    /// Lazy stream of fragments. Resolution failures arrive as the only item.
    pub fn complete_stream(&self, req: CompletionRequest) -> BoxStream<'static, Result<StreamChunk>> {
        match self.open_stream(req) {
            Ok(s) => s.chunks,
            Err(e) => Box::pin(futures_util::stream::once(async move { Err(e) })),
        }
    }

    /// Buffered completion: drains the stream and concatenates fragments.
    pub async fn complete(&self, req: CompletionRequest) -> Result<CompletionResult> {
        let target = self.target(&req)?;
        let model = target.model.clone();
        let mut chunks = self.run(target, req, false);

        let mut content = String::new();
        while let Some(chunk) = chunks.next().await {
            content.push_str(&chunk?.text);
        }

        Ok(CompletionResult {
            content,
            model,
            usage: None,
            metadata: None,
        })
    }

    // ── internals ────────────────────────────────────────────────────

    fn target(&self, req: &CompletionRequest) -> Result<Target> {
        let resolution = self.resolver.resolve(&req.agent_id, &req.agent);
        let provider = self.providers.require(resolution.provider)?;
        let chat = ChatRequest {
            messages: Vec::new(),
            model: req
                .agent
                .model
                .clone()
                .filter(|m| !m.trim().is_empty()),
            api_key: req.agent.api_key.clone(),
        };
        let model = provider.resolve_model(&chat);
        Ok(Target {
            provider,
            model,
            chat,
        })
    }

    fn run(
        &self,
        target: Target,
        req: CompletionRequest,
        streaming: bool,
    ) -> BoxStream<'static, Result<StreamChunk>> {
        let this = self.clone();
        let Target {
            provider,
            model,
            mut chat,
        } = target;
        let provider_id = provider.provider_id();

        Box::pin(async_stream::stream! {
            let span = tracing::info_span!(
                "completion",
                agent_id = %req.agent_id,
                scope = %req.scope,
                provider = %provider_id,
                model = %model,
                streaming,
            );
            let started = Instant::now();

            // ── 1. memory context + augmentation ─────────────────────
            let query = latest_user_message(&req.messages);
            let context = this
                .context
                .build(&req.scope, query, req.memory_size)
                .instrument(span.clone())
                .await;
            chat.messages = augment_messages(&req.messages, &this.prompt, &context);

            // ── 2. drive the provider stream ─────────────────────────
            let mut full = String::new();
            let mut chunks = 0usize;
            let mut failure: Option<Error> = None;

            match provider.chat_stream(chat).instrument(span.clone()).await {
                Ok(mut upstream) => {
                    while let Some(item) = upstream.next().await {
                        match item {
                            Ok(chunk) => {
                                full.push_str(&chunk.text);
                                chunks += 1;
                                yield Ok(chunk);
                            }
                            Err(e) => {
                                failure = Some(e);
                                break;
                            }
                        }
                    }
                }
                Err(e) => failure = Some(e),
            }

            // ── 3. report + persist ──────────────────────────────────
            span.in_scope(|| {
                TraceEvent::LlmRequest {
                    provider: provider_id.to_string(),
                    model: model.clone(),
                    streaming,
                    duration_ms: started.elapsed().as_millis() as u64,
                    chunks,
                    content_chars: full.chars().count(),
                    completed: failure.is_none(),
                }
                .emit();
                if let Some(ref e) = failure {
                    tracing::warn!(error = %e, kind = e.kind(), chunks, "completion failed");
                }
            });

            match failure {
                Some(e) => {
                    yield Err(e);
                }
                None if this.context.can_retrieve(&req.scope) => {
                    let mut exchange = req.messages;
                    exchange.push(ChatMessage::assistant(full));
                    span.in_scope(|| {
                        this.persist.enqueue(PersistJob {
                            scope: req.scope,
                            exchange,
                        })
                    });
                }
                None => {}
            }
        })
    }
}

use sm_domain::chat::ChatMessage;
use sm_domain::error::Result;
use sm_domain::provider::ProviderId;
use sm_domain::stream::{BoxStream, StreamChunk};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A provider-agnostic chat completion request.
#[derive(Clone, Default)]
pub struct ChatRequest {
    /// The conversation messages to send, in order.
    pub messages: Vec<ChatMessage>,
    /// Model identifier override. When `None`, the provider uses its default.
    pub model: Option<String>,
    /// Per-request credential. When `None`, the provider's configured key is used.
    pub api_key: Option<String>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            api_key: None,
        }
    }

    /// The request key, ignoring blank values.
    pub(crate) fn request_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

impl std::fmt::Debug for ChatRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatRequest")
            .field("messages", &self.messages.len())
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core provider trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Trait that every LLM adapter must implement.
///
/// Implementations translate a [`ChatRequest`] into one provider's wire
/// protocol and turn its streamed response into text fragments.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a streaming chat request.
    ///
    /// Returns once response headers arrive. A non-success status, a missing
    /// credential or a header timeout are reported here, before any fragment.
    /// Failures while reading the body arrive as the stream's last item.
    async fn chat_stream(
        &self,
        req: ChatRequest,
    ) -> Result<BoxStream<'static, Result<StreamChunk>>>;

    /// The model the request will run on.
    fn resolve_model(&self, req: &ChatRequest) -> String;

    fn provider_id(&self) -> ProviderId;
}

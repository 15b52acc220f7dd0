//! The `MemoryStore` trait defines the interface for all long-term memory
//! backends (REST, in-process, disabled, test doubles).

use async_trait::async_trait;
use sm_domain::chat::ChatMessage;
use sm_domain::error::Result;
use sm_domain::memory::{MemoryScope, MemorySize, MemorySnippet};

/// Abstraction over a long-term conversational memory service.
///
/// Callers check [`is_available`](Self::is_available) and
/// [`MemoryScope::is_usable`] before calling `retrieve` or `store`.
/// Implementations return `sm_domain::error::Result`; the completion path
/// only ever logs their failures.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Whether the backend is configured and may be called.
    fn is_available(&self) -> bool;

    /// Fetch snippets relevant to `query`, most relevant first.
    ///
    /// `size` bounds how many snippets are requested; stores may return
    /// fewer.
    async fn retrieve(
        &self,
        scope: &MemoryScope,
        query: &str,
        size: MemorySize,
    ) -> Result<Vec<MemorySnippet>>;

    /// Persist one completed exchange (the conversation plus the final
    /// assistant message) under `scope`.
    async fn store(&self, scope: &MemoryScope, exchange: &[ChatMessage]) -> Result<()>;
}

use async_trait::async_trait;
use sm_domain::chat::ChatMessage;
use sm_domain::error::{Error, Result};
use sm_domain::memory::{MemoryScope, MemorySize, MemorySnippet};

use crate::provider::MemoryStore;

/// Store used when memory is turned off. Reports itself unavailable so
/// callers never reach `retrieve` or `store`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledMemoryStore;

#[async_trait]
impl MemoryStore for DisabledMemoryStore {
    fn is_available(&self) -> bool {
        false
    }

    async fn retrieve(
        &self,
        _scope: &MemoryScope,
        _query: &str,
        _size: MemorySize,
    ) -> Result<Vec<MemorySnippet>> {
        Err(Error::MemoryUnavailable)
    }

    async fn store(&self, _scope: &MemoryScope, _exchange: &[ChatMessage]) -> Result<()> {
        Err(Error::MemoryUnavailable)
    }
}

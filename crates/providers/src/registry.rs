//! Provider registry.
//!
//! Constructs and holds one adapter per enabled provider. At startup the
//! registry reads the [`LlmConfig`], resolves default credentials, and
//! instantiates the matching adapter for each entry of the provider table.

use crate::anthropic::AnthropicProvider;
use crate::openai_compat::OpenAiCompatProvider;
use crate::traits::LlmProvider;
use sm_domain::config::LlmConfig;
use sm_domain::error::{Error, Result};
use sm_domain::provider::ProviderId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ProviderRegistry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderId, Arc<dyn LlmProvider>>,
}

impl ProviderRegistry {
    /// Build the registry from the application's [`LlmConfig`].
    ///
    /// Providers that fail to initialize are logged and skipped rather than
    /// aborting the entire startup; requests routed to them fail with a
    /// config error.
    pub fn from_config(config: &LlmConfig) -> Self {
        let timeout = Duration::from_millis(config.default_timeout_ms);
        let mut registry = Self::default();

        for pc in &config.providers {
            let result: Result<Arc<dyn LlmProvider>> = match pc.id {
                ProviderId::OpenRouter | ProviderId::OpenAi | ProviderId::Mistral => {
                    OpenAiCompatProvider::from_config(pc, timeout)
                        .map(|p| Arc::new(p) as Arc<dyn LlmProvider>)
                }
                ProviderId::Anthropic => AnthropicProvider::from_config(pc, timeout)
                    .map(|p| Arc::new(p) as Arc<dyn LlmProvider>),
            };

            match result {
                Ok(provider) => {
                    tracing::info!(
                        provider_id = %pc.id,
                        base_url = %pc.base_url(),
                        "registered LLM provider"
                    );
                    registry.insert(provider);
                }
                Err(e) => {
                    tracing::warn!(
                        provider_id = %pc.id,
                        error = %e,
                        "failed to initialize LLM provider, skipping"
                    );
                }
            }
        }

        registry
    }

    /// Register (or replace) a provider under its own id.
    pub fn insert(&mut self, provider: Arc<dyn LlmProvider>) {
        self.providers.insert(provider.provider_id(), provider);
    }

    pub fn with_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.insert(provider);
        self
    }

    pub fn get(&self, id: ProviderId) -> Option<Arc<dyn LlmProvider>> {
        self.providers.get(&id).cloned()
    }

    /// Like [`get`](Self::get), but a missing provider is an error.
    pub fn require(&self, id: ProviderId) -> Result<Arc<dyn LlmProvider>> {
        self.get(id)
            .ok_or_else(|| Error::Config(format!("provider '{id}' is not registered")))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Registered provider ids, in matching order.
    pub fn list_providers(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|id| self.providers.contains_key(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sm_domain::config::ProviderConfig;

    #[test]
    fn builds_one_adapter_per_entry() {
        let mut config = LlmConfig::default();
        let mut anthropic = ProviderConfig::new(ProviderId::Anthropic);
        anthropic.auth.key = Some("sk-ant".into());
        config.providers.push(anthropic);

        let registry = ProviderRegistry::from_config(&config);
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.list_providers(),
            vec![ProviderId::OpenRouter, ProviderId::Anthropic]
        );
        assert_eq!(
            registry.get(ProviderId::Anthropic).unwrap().provider_id(),
            ProviderId::Anthropic
        );
    }

    #[test]
    fn require_unregistered_is_config_error() {
        let registry = ProviderRegistry::default();
        let err = registry.require(ProviderId::Mistral).err().unwrap();
        assert_eq!(err.kind(), "config");
    }
}

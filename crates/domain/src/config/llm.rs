use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::provider::ProviderId;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM provider table
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider used when an agent's platform matches no enabled provider.
    #[serde(default = "d_default_provider")]
    pub default_provider: ProviderId,
    /// Bound on the wait for response headers and for each body chunk.
    #[serde(default = "d_60000")]
    pub default_timeout_ms: u64,
    /// Enabled providers. A provider missing from this table is never
    /// selected by platform matching.
    #[serde(default = "d_providers")]
    pub providers: Vec<ProviderConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_provider: d_default_provider(),
            default_timeout_ms: d_60000(),
            providers: d_providers(),
        }
    }
}

impl LlmConfig {
    pub fn provider(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.id == id)
    }

    pub fn is_enabled(&self, id: ProviderId) -> bool {
        self.provider(id).is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: ProviderId,
    /// Overrides the provider's built-in API base.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Model used when the agent config names none.
    #[serde(default)]
    pub default_model: Option<String>,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Extra headers sent with every request to this provider.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl ProviderConfig {
    pub fn new(id: ProviderId) -> Self {
        Self {
            id,
            base_url: None,
            default_model: None,
            auth: AuthConfig::default(),
            headers: HashMap::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.id.default_base_url())
    }

    pub fn default_model(&self) -> &str {
        self.default_model
            .as_deref()
            .unwrap_or_else(|| self.id.default_model())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Env var containing the key. Defaults to the provider's well-known
    /// variable (e.g. `OPENROUTER_API_KEY`).
    #[serde(default)]
    pub env: Option<String>,
    /// Direct key (for config-only setups; prefer env or keychain).
    #[serde(default)]
    pub key: Option<String>,
    /// Keychain service name (e.g., "solmind").
    #[serde(default)]
    pub service: Option<String>,
    /// Keychain account name (e.g., "openrouter-api-key").
    #[serde(default)]
    pub account: Option<String>,
}

// ── serde default helpers ───────────────────────────────────────────

fn d_default_provider() -> ProviderId {
    ProviderId::OpenRouter
}
fn d_60000() -> u64 {
    60_000
}
fn d_providers() -> Vec<ProviderConfig> {
    vec![ProviderConfig::new(ProviderId::OpenRouter)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_enables_only_openrouter() {
        let cfg = LlmConfig::default();
        assert!(cfg.is_enabled(ProviderId::OpenRouter));
        assert!(!cfg.is_enabled(ProviderId::OpenAi));
        assert!(!cfg.is_enabled(ProviderId::Anthropic));
        assert!(!cfg.is_enabled(ProviderId::Mistral));
        assert_eq!(cfg.default_timeout_ms, 60_000);
    }

    #[test]
    fn provider_falls_back_to_builtin_urls_and_models() {
        let p = ProviderConfig::new(ProviderId::Anthropic);
        assert_eq!(p.base_url(), "https://api.anthropic.com/v1");
        assert_eq!(p.default_model(), "claude-3-5-sonnet-20241022");
    }

    #[test]
    fn provider_table_parses_from_toml() {
        let toml_str = r#"
            default_provider = "openai"

            [[providers]]
            id = "openai"
            default_model = "gpt-4o"

            [[providers]]
            id = "mistral"
            base_url = "http://localhost:9000/v1"
            auth = { env = "MY_MISTRAL_KEY" }
        "#;
        let cfg: LlmConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.default_provider, ProviderId::OpenAi);
        assert_eq!(cfg.providers.len(), 2);
        assert!(!cfg.is_enabled(ProviderId::OpenRouter));

        let mistral = cfg.provider(ProviderId::Mistral).unwrap();
        assert_eq!(mistral.base_url(), "http://localhost:9000/v1");
        assert_eq!(mistral.auth.env.as_deref(), Some("MY_MISTRAL_KEY"));
        assert_eq!(
            cfg.provider(ProviderId::OpenAi).unwrap().default_model(),
            "gpt-4o"
        );
    }
}

//! Provider resolution: agent configuration → provider id.

use sm_domain::chat::AgentConfig;
use sm_domain::config::LlmConfig;
use sm_domain::provider::ProviderId;
use sm_domain::trace::TraceEvent;

/// Outcome of [`ProviderResolver::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub provider: ProviderId,
    /// `false` when the default provider was used as a fallback.
    pub matched: bool,
}

/// Maps an agent to the provider that serves it.
///
/// Only enabled providers can be matched; everything else lands on the
/// default. Resolution is total and never fails.
#[derive(Debug, Clone)]
pub struct ProviderResolver {
    enabled: Vec<ProviderId>,
    default: ProviderId,
}

impl ProviderResolver {
    pub fn new(enabled: impl IntoIterator<Item = ProviderId>, default: ProviderId) -> Self {
        Self {
            enabled: enabled.into_iter().collect(),
            default,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(config.providers.iter().map(|p| p.id), config.default_provider)
    }

    pub fn default_provider(&self) -> ProviderId {
        self.default
    }

    pub fn is_enabled(&self, id: ProviderId) -> bool {
        self.enabled.contains(&id)
    }

    /// Pick the provider for an agent.
    ///
    /// Candidates are tried in [`ProviderId::ALL`] order; a candidate matches
    /// when the platform contains its token (case-insensitive) or the agent
    /// id is one of its aliases. The first enabled match wins.
    pub fn resolve(&self, agent_id: &str, agent: &AgentConfig) -> Resolution {
        let platform = agent.platform.to_ascii_lowercase();
        let matched = ProviderId::ALL.into_iter().find(|&id| {
            self.is_enabled(id)
                && (platform.contains(id.as_str()) || agent_alias(agent_id) == Some(id))
        });

        let resolution = match matched {
            Some(provider) => Resolution {
                provider,
                matched: true,
            },
            None => Resolution {
                provider: self.default,
                matched: false,
            },
        };

        TraceEvent::ProviderResolved {
            agent_id: agent_id.to_string(),
            platform: agent.platform.clone(),
            provider: resolution.provider.to_string(),
            matched: resolution.matched,
        }
        .emit();

        resolution
    }
}

fn agent_alias(agent_id: &str) -> Option<ProviderId> {
    match agent_id {
        "gpt" => Some(ProviderId::OpenAi),
        "claude" => Some(ProviderId::Anthropic),
        "mistral" => Some(ProviderId::Mistral),
        _ => None,
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of upstream model providers.
///
/// `ALL` is also the order in which platform strings are matched, so a
/// platform such as `"openrouter-openai"` resolves to OpenRouter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenRouter,
    OpenAi,
    Anthropic,
    Mistral,
}

impl ProviderId {
    pub const ALL: [ProviderId; 4] = [
        ProviderId::OpenRouter,
        ProviderId::OpenAi,
        ProviderId::Anthropic,
        ProviderId::Mistral,
    ];

    /// Lowercase token used in config, logs and platform matching.
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::OpenRouter => "openrouter",
            ProviderId::OpenAi => "openai",
            ProviderId::Anthropic => "anthropic",
            ProviderId::Mistral => "mistral",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderId::OpenRouter => "https://openrouter.ai/api/v1",
            ProviderId::OpenAi => "https://api.openai.com/v1",
            ProviderId::Anthropic => "https://api.anthropic.com/v1",
            ProviderId::Mistral => "https://api.mistral.ai/v1",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderId::OpenRouter => "openai/gpt-4-turbo",
            ProviderId::OpenAi => "gpt-4-turbo-preview",
            ProviderId::Anthropic => "claude-3-5-sonnet-20241022",
            ProviderId::Mistral => "mistral-large-latest",
        }
    }

    /// Environment variable consulted when no credential is configured.
    pub fn default_api_key_env(self) -> &'static str {
        match self {
            ProviderId::OpenRouter => "OPENROUTER_API_KEY",
            ProviderId::OpenAi => "OPENAI_API_KEY",
            ProviderId::Anthropic => "ANTHROPIC_API_KEY",
            ProviderId::Mistral => "MISTRAL_API_KEY",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        ProviderId::ALL
            .into_iter()
            .find(|p| p.as_str() == needle)
            .ok_or_else(|| crate::Error::Config(format!("unknown provider id '{s}'")))
    }
}

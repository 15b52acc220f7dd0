mod llm;
mod memory;
mod observability;
mod prompt;
mod server;

pub use llm::*;
pub use memory::*;
pub use observability::*;
pub use prompt::*;
pub use server::*;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl ConfigError {
    fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError::error(
                "server.port",
                "port must be greater than 0",
            ));
        }
        if self.server.host.is_empty() {
            errors.push(ConfigError::error("server.host", "host must not be empty"));
        }
        if self.server.max_concurrent_requests == 0 {
            errors.push(ConfigError::error(
                "server.max_concurrent_requests",
                "must be greater than 0",
            ));
        }
        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(ConfigError::warning(
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins (not recommended for production)",
            ));
        }

        // ── llm ──
        if self.llm.providers.is_empty() {
            errors.push(ConfigError::error(
                "llm.providers",
                "at least one provider must be enabled",
            ));
        } else if !self.llm.is_enabled(self.llm.default_provider) {
            errors.push(ConfigError::error(
                "llm.default_provider",
                format!(
                    "default provider '{}' is not in llm.providers",
                    self.llm.default_provider
                ),
            ));
        }
        if self.llm.default_timeout_ms == 0 {
            errors.push(ConfigError::error(
                "llm.default_timeout_ms",
                "timeout must be greater than 0",
            ));
        }
        let mut seen = HashSet::new();
        for (i, provider) in self.llm.providers.iter().enumerate() {
            if !seen.insert(provider.id) {
                errors.push(ConfigError::error(
                    format!("llm.providers[{i}].id"),
                    format!("provider '{}' listed more than once", provider.id),
                ));
            }
            if provider.base_url.as_deref().is_some_and(str::is_empty) {
                errors.push(ConfigError::error(
                    format!("llm.providers[{i}].base_url"),
                    "provider base_url must not be empty",
                ));
            }
            if provider.auth.key.is_some() {
                errors.push(ConfigError::warning(
                    format!("llm.providers[{i}].auth.key"),
                    "plaintext API key in config; prefer env or keychain",
                ));
            }
        }

        // ── memory ──
        if self.memory.transport == MemoryTransport::Rest && self.memory.base_url.is_empty() {
            errors.push(ConfigError::error(
                "memory.base_url",
                "base_url must not be empty for the rest transport",
            ));
        }
        if self.memory.persist_queue_capacity == 0 {
            errors.push(ConfigError::error(
                "memory.persist_queue_capacity",
                "capacity must be greater than 0",
            ));
        }

        if !(0.0..=1.0).contains(&self.observability.sample_rate) {
            errors.push(ConfigError::error(
                "observability.sample_rate",
                "sample_rate must be between 0.0 and 1.0",
            ));
        }

        errors
    }
}

/// Shared error type used across all SolMind crates.
///
/// Provider failures (`CredentialMissing`, `ProviderHttp`, `ProviderTimeout`,
/// `MalformedStream`) are fatal for the request that raised them. Memory
/// failures (`MemoryUnavailable`, `MemoryRetrieve`, `MemoryStore`) are only
/// ever logged by the completion path; they never reach the caller.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("no API key available for provider {provider}")]
    CredentialMissing { provider: String },

    #[error("provider {provider} returned HTTP {status}: {body}")]
    ProviderHttp {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("provider {provider} timed out: {message}")]
    ProviderTimeout { provider: String, message: String },

    #[error("provider {provider} sent a malformed stream payload: {message}")]
    MalformedStream { provider: String, message: String },

    #[error("memory store unavailable")]
    MemoryUnavailable,

    #[error("memory retrieve failed: {0}")]
    MemoryRetrieve(String),

    #[error("memory store failed: {0}")]
    MemoryStore(String),

    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Stable machine-readable tag, used in API error bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Http(_) => "http",
            Error::CredentialMissing { .. } => "credential_missing",
            Error::ProviderHttp { .. } => "provider_http",
            Error::ProviderTimeout { .. } => "provider_timeout",
            Error::MalformedStream { .. } => "malformed_stream",
            Error::MemoryUnavailable => "memory_unavailable",
            Error::MemoryRetrieve(_) => "memory_retrieve_failed",
            Error::MemoryStore(_) => "memory_store_failed",
            Error::Config(_) => "config",
            Error::Auth(_) => "auth",
            Error::Other(_) => "other",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_http_display_includes_status_and_body() {
        let err = Error::ProviderHttp {
            provider: "openrouter".into(),
            status: 401,
            body: "invalid key".into(),
        };
        assert_eq!(
            err.to_string(),
            "provider openrouter returned HTTP 401: invalid key"
        );
        assert_eq!(err.kind(), "provider_http");
    }

    #[test]
    fn json_errors_convert_with_question_mark() {
        fn parse() -> Result<serde_json::Value> {
            Ok(serde_json::from_str("{not json")?)
        }
        let err = parse().unwrap_err();
        assert_eq!(err.kind(), "json");
    }
}

//! Shared utility functions for provider adapters.

use sm_domain::config::{AuthConfig, ProviderConfig};
use sm_domain::error::{Error, Result};
use sm_domain::provider::ProviderId;
use std::time::Duration;

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::ProviderTimeout`]; everything else maps
/// to [`Error::Http`].
pub(crate) fn from_reqwest(provider: ProviderId, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::ProviderTimeout {
            provider: provider.to_string(),
            message: e.to_string(),
        }
    } else {
        Error::Http(e.to_string())
    }
}

/// Send a streaming request and wait for its response headers.
///
/// The wait is bounded by `timeout`. A non-success status is turned into
/// [`Error::ProviderHttp`] carrying the upstream body.
pub(crate) async fn send_streaming(
    provider: ProviderId,
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<reqwest::Response> {
    let resp = match tokio::time::timeout(timeout, request.send()).await {
        Ok(result) => result.map_err(|e| from_reqwest(provider, e))?,
        Err(_) => {
            return Err(Error::ProviderTimeout {
                provider: provider.to_string(),
                message: format!("no response headers within {} ms", timeout.as_millis()),
            })
        }
    };

    let status = resp.status();
    if !status.is_success() {
        let body = match tokio::time::timeout(timeout, resp.text()).await {
            Ok(Ok(text)) => text,
            _ => String::new(),
        };
        tracing::warn!(
            provider = %provider,
            status = status.as_u16(),
            "provider rejected request"
        );
        return Err(Error::ProviderHttp {
            provider: provider.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    Ok(resp)
}

/// The provider's process-level credential, if one resolves.
///
/// A missing credential is not an error at startup: requests may still
/// carry their own key, and the ones that don't fail with
/// `CredentialMissing`.
pub(crate) fn default_credential(cfg: &ProviderConfig) -> Option<String> {
    match resolve_api_key(&cfg.auth, cfg.id.default_api_key_env()) {
        Ok(key) => Some(key),
        Err(e) => {
            tracing::info!(
                provider = %cfg.id,
                reason = %e,
                "no default credential; requests must supply an api_key"
            );
            None
        }
    }
}

/// Pick the credential for one request: request key, then the provider's
/// default key.
pub(crate) fn pick_key<'a>(
    provider: ProviderId,
    request_key: Option<&'a str>,
    default_key: Option<&'a str>,
) -> Result<&'a str> {
    request_key
        .or(default_key)
        .ok_or_else(|| Error::CredentialMissing {
            provider: provider.to_string(),
        })
}

/// Resolve the API key from an [`AuthConfig`].
///
/// Precedence:
/// 1. `key` field (plaintext — warn)
/// 2. `service` + `account` → OS keychain via `keyring`
/// 3. `env` field, or the provider's well-known variable
/// 4. Fallback for keychain mode: env var `{SERVICE}_{ACCOUNT}` uppercased
/// 5. Error
pub fn resolve_api_key(auth: &AuthConfig, default_env: &str) -> Result<String> {
    // 1. Plaintext key (warn the user)
    if let Some(ref key) = auth.key {
        tracing::warn!(
            "API key loaded from plaintext config field 'key'; \
             prefer 'env' or keychain instead"
        );
        return Ok(key.clone());
    }

    // 2. OS keychain via service + account
    if let (Some(service), Some(account)) = (&auth.service, &auth.account) {
        match resolve_from_keychain(service, account) {
            Ok(secret) => return Ok(secret),
            Err(e) => {
                tracing::debug!(
                    service = %service,
                    account = %account,
                    error = %e,
                    "keychain lookup failed, falling through to env"
                );
            }
        }
    }

    // 3. Env var
    let env_var = auth.env.as_deref().unwrap_or(default_env);
    if let Some(val) = read_env(env_var) {
        return Ok(val);
    }

    // 4. Headless fallback: {SERVICE}_{ACCOUNT} uppercased
    if let (Some(service), Some(account)) = (&auth.service, &auth.account) {
        let fallback_var = keychain_fallback_env_name(service, account);
        if let Some(val) = read_env(&fallback_var) {
            tracing::info!(
                env_var = %fallback_var,
                "API key resolved from keychain headless fallback env var"
            );
            return Ok(val);
        }
    }

    Err(Error::Auth(format!(
        "no API key configured: environment variable '{env_var}' is not set \
         and no 'key' or keychain 'service'+'account' resolved"
    )))
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Try to read a secret from the OS keychain.
///
/// Returns an error on headless systems where no keychain daemon is available.
pub fn resolve_from_keychain(service: &str, account: &str) -> Result<String> {
    let entry = keyring::Entry::new(service, account)
        .map_err(|e| Error::Auth(format!("keyring entry creation failed: {e}")))?;
    entry
        .get_password()
        .map_err(|e| Error::Auth(format!("keyring get_password failed: {e}")))
}

/// Build the headless fallback env var name for a keychain service/account.
///
/// Example: `("solmind", "openrouter-api-key")` → `"SOLMIND_OPENROUTER_API_KEY"`.
pub fn keychain_fallback_env_name(service: &str, account: &str) -> String {
    format!(
        "{}_{}",
        service.to_uppercase().replace('-', "_"),
        account.to_uppercase().replace('-', "_"),
    )
}

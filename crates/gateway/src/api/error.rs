use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Value};

use sm_domain::error::Error;

/// Wraps a domain error for use as a handler return type.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

/// HTTP status a completion error maps to.
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::CredentialMissing { .. } => StatusCode::BAD_REQUEST,
        Error::ProviderHttp { .. } | Error::MalformedStream { .. } => StatusCode::BAD_GATEWAY,
        Error::ProviderTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON body describing an error: `{error, kind}` plus the upstream
/// `status` for provider HTTP failures.
pub fn error_body(err: &Error) -> Value {
    let mut body = json!({
        "error": err.to_string(),
        "kind": err.kind(),
    });
    if let Error::ProviderHttp { status, .. } = err {
        body["status"] = json!(status);
    }
    body
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::warn!(error = %self.0, kind = self.0.kind(), "request failed");
        }
        (status, Json(error_body(&self.0))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_provider_errors() {
        let missing = Error::CredentialMissing {
            provider: "openai".into(),
        };
        let http = Error::ProviderHttp {
            provider: "openai".into(),
            status: 401,
            body: "nope".into(),
        };
        let timeout = Error::ProviderTimeout {
            provider: "openai".into(),
            message: "slow".into(),
        };
        let malformed = Error::MalformedStream {
            provider: "openai".into(),
            message: "bad json".into(),
        };

        assert_eq!(status_for(&missing), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&http), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(&timeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status_for(&malformed), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&Error::Other("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let body = error_body(&http);
        assert_eq!(body["kind"], "provider_http");
        assert_eq!(body["status"], 401);
        assert!(error_body(&missing).get("status").is_none());
    }
}

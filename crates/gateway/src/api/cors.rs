//! CORS policy for the HTTP API.
//!
//! Each `server.cors.allowed_origins` entry is an exact origin
//! (`https://app.example.com`), a port wildcard (`http://localhost:*`) or
//! `*`, which admits every origin.

use std::sync::Arc;

use axum::http::{header, Method};
use sm_domain::config::CorsConfig;
use tower_http::cors::{self, AllowOrigin, CorsLayer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPolicy {
    Any,
    Listed {
        exact: Vec<String>,
        /// `scheme://host:` prefixes that accept any numeric port.
        port_wildcards: Vec<String>,
    },
}

impl OriginPolicy {
    pub fn from_config(cors: &CorsConfig) -> Self {
        let mut exact = Vec::new();
        let mut port_wildcards = Vec::new();

        for origin in cors.allowed_origins.iter().map(|o| o.trim()) {
            match origin {
                "*" => return Self::Any,
                "" => {}
                o => match o.strip_suffix(":*") {
                    Some(host) => port_wildcards.push(format!("{host}:")),
                    None => exact.push(o.trim_end_matches('/').to_owned()),
                },
            }
        }

        Self::Listed {
            exact,
            port_wildcards,
        }
    }

    /// Whether a request `Origin` header value is admitted.
    pub fn allows(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Listed {
                exact,
                port_wildcards,
            } => {
                exact.iter().any(|e| e == origin)
                    || port_wildcards
                        .iter()
                        .any(|prefix| origin.strip_prefix(prefix.as_str()).is_some_and(is_port))
            }
        }
    }

    pub fn into_layer(self) -> CorsLayer {
        let layer = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

        match self {
            Self::Any => {
                tracing::warn!("CORS allows every origin");
                layer.allow_origin(cors::Any)
            }
            listed => {
                let policy = Arc::new(listed);
                layer.allow_origin(AllowOrigin::predicate(move |origin, _| {
                    origin.to_str().is_ok_and(|o| policy.allows(o))
                }))
            }
        }
    }
}

fn is_port(s: &str) -> bool {
    (1..=5).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

/// CORS layer for the configured origins.
pub fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    OriginPolicy::from_config(cors).into_layer()
}

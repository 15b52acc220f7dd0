//! `sm-memory`: long-term conversational memory for SolMind.
//!
//! Provides the [`MemoryStore`] trait, three implementations and the
//! [`MemoryContextBuilder`] that renders retrieved snippets into the
//! system prompt.
//!
//! # Transport selection
//!
//! Use [`create_store`] to build the right implementation based on the
//! `memory.transport` config field:
//!
//! | Transport  | Implementation        | Best for                          |
//! |------------|-----------------------|-----------------------------------|
//! | `rest`     | `RestMemoryClient`    | Shared mem0-compatible server     |
//! | `local`    | `LocalMemoryStore`    | Single node, development (default)|
//! | `disabled` | `DisabledMemoryStore` | Stateless deployments             |

pub mod context;
pub mod disabled;
pub mod local;
pub mod provider;
pub mod rest;
pub mod types;

// ── Re-exports for ergonomic imports ─────────────────────────────────

pub use context::MemoryContextBuilder;
pub use disabled::DisabledMemoryStore;
pub use local::LocalMemoryStore;
pub use provider::MemoryStore;
pub use rest::RestMemoryClient;

use std::sync::Arc;

use sm_domain::config::{MemoryConfig, MemoryTransport};
use sm_domain::error::Result;

/// Create the [`MemoryStore`] selected by `cfg.transport`.
pub fn create_store(cfg: &MemoryConfig) -> Result<Arc<dyn MemoryStore>> {
    match cfg.transport {
        MemoryTransport::Rest => {
            let client = RestMemoryClient::new(cfg)?;
            tracing::info!(base_url = %cfg.base_url, "using REST memory store");
            Ok(Arc::new(client))
        }
        MemoryTransport::Local => {
            tracing::info!("using in-process memory store");
            Ok(Arc::new(LocalMemoryStore::new()))
        }
        MemoryTransport::Disabled => {
            tracing::info!("memory disabled");
            Ok(Arc::new(DisabledMemoryStore))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_store_follows_transport() {
        let mut cfg = MemoryConfig::default();
        assert!(create_store(&cfg).unwrap().is_available());

        cfg.transport = MemoryTransport::Disabled;
        assert!(!create_store(&cfg).unwrap().is_available());

        cfg.transport = MemoryTransport::Rest;
        assert!(create_store(&cfg).unwrap().is_available());

        cfg.base_url = String::new();
        assert!(!create_store(&cfg).unwrap().is_available());
    }
}

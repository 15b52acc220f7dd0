//! AppState construction shared by `serve` and `complete`.

use std::sync::Arc;

use anyhow::Context;

use sm_domain::config::{Config, ConfigSeverity};
use sm_memory::create_store;
use sm_providers::{ProviderRegistry, ProviderResolver};

use crate::runtime::CompletionOrchestrator;
use crate::state::AppState;

/// Validate config, initialize every subsystem and return a fully-wired
/// [`AppState`]. Spawns the persistence worker, so it must run inside a
/// tokio runtime.
pub async fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("config validation failed with {errors} error(s)");
    }

    // ── Memory store ─────────────────────────────────────────────────
    let store = create_store(&config.memory).context("creating memory store")?;
    tracing::info!(
        transport = ?config.memory.transport,
        available = store.is_available(),
        "memory store ready"
    );

    // ── LLM providers ────────────────────────────────────────────────
    let providers = ProviderRegistry::from_config(&config.llm);
    if providers.is_empty() {
        tracing::warn!("no LLM providers initialized, every completion will fail");
    } else {
        tracing::info!(providers = providers.len(), "LLM provider registry ready");
    }
    let resolver = ProviderResolver::from_config(&config.llm);
    tracing::info!(default = %resolver.default_provider(), "provider resolver ready");

    // ── Orchestrator ─────────────────────────────────────────────────
    let orchestrator = CompletionOrchestrator::new(
        resolver,
        providers,
        store,
        config.prompt.clone(),
        config.memory.persist_queue_capacity,
    );
    tracing::info!(
        queue_capacity = config.memory.persist_queue_capacity,
        "completion orchestrator ready"
    );

    Ok(AppState {
        config,
        orchestrator,
    })
}

//! Completion orchestrator behaviour against scripted providers and a
//! recording memory store.

mod common;

use std::sync::Arc;

use futures_util::StreamExt;

use common::{orchestrator, request, RecordingStore, Script, ScriptedProvider};
use sm_domain::chat::{ChatMessage, Role};
use sm_domain::config::PromptConfig;
use sm_domain::memory::MemorySize;
use sm_domain::provider::ProviderId;
use sm_gateway::runtime::CompletionOrchestrator;
use sm_providers::{ProviderRegistry, ProviderResolver};

fn hello() -> Vec<ChatMessage> {
    vec![ChatMessage::user("What's my favourite language?")]
}

async fn collect(orch: &CompletionOrchestrator, chat: Option<&str>) -> (Vec<String>, Vec<String>) {
    let mut texts = Vec::new();
    let mut errors = Vec::new();
    let mut stream = orch.complete_stream(request(chat, hello()));
    while let Some(item) = stream.next().await {
        match item {
            Ok(chunk) => texts.push(chunk.text),
            Err(e) => errors.push(e.kind().to_string()),
        }
    }
    (texts, errors)
}

// ── Equivalence of the two entry points ─────────────────────────────────

#[tokio::test]
async fn stream_concatenation_equals_buffered_content() {
    let script = Script::Chunks(vec!["Hel", "lo, ", "world"]);
    let orch = orchestrator(
        ScriptedProvider::new(ProviderId::OpenRouter, script),
        RecordingStore::empty(),
    );

    let (texts, errors) = collect(&orch, None).await;
    let result = orch.complete(request(None, hello())).await.unwrap();

    assert!(errors.is_empty());
    assert_eq!(texts.concat(), result.content);
    assert_eq!(result.content, "Hello, world");
    assert_eq!(result.model, "scripted-default");
    assert!(result.usage.is_none());
    assert!(result.metadata.is_none());
}

#[tokio::test]
async fn agent_model_override_reaches_provider_and_result() {
    let provider = ScriptedProvider::new(ProviderId::OpenRouter, Script::Chunks(vec!["ok"]));
    let orch = orchestrator(provider.clone(), RecordingStore::empty());

    let mut req = request(None, hello());
    req.agent.model = Some("anthropic/claude-3.5-sonnet".into());
    req.agent.api_key = Some("sk-per-agent".into());
    let result = orch.complete(req).await.unwrap();

    assert_eq!(result.model, "anthropic/claude-3.5-sonnet");
    let call = provider.last_call();
    assert_eq!(call.model.as_deref(), Some("anthropic/claude-3.5-sonnet"));
    assert_eq!(call.api_key.as_deref(), Some("sk-per-agent"));
}

// ── Memory reads ────────────────────────────────────────────────────────

#[tokio::test]
async fn memory_context_is_injected_into_system_message() {
    let provider = ScriptedProvider::new(ProviderId::OpenRouter, Script::Chunks(vec!["Rust"]));
    let store = RecordingStore::with_snippets(&["likes rust", "uses neovim"]);
    let orch = orchestrator(provider.clone(), store.clone());

    let input = hello();
    let mut req = request(Some("chat-1"), input.clone());
    req.scope.capsule_id = Some("cap-a".into());
    req.memory_size = MemorySize::Large;
    orch.complete(req.clone()).await.unwrap();

    let retrieves = store.retrieves.lock().clone();
    assert_eq!(retrieves.len(), 1);
    assert_eq!(retrieves[0].0, req.scope);
    assert_eq!(retrieves[0].1, "What's my favourite language?");
    assert_eq!(retrieves[0].2, MemorySize::Large);

    let sent = provider.last_call().messages;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].role, Role::System);
    assert!(sent[0]
        .content
        .ends_with("Relevant context from previous conversations:\n- likes rust\n- uses neovim"));
    assert_eq!(sent[1], input[0]);
}

#[tokio::test]
async fn query_is_latest_user_message() {
    let provider = ScriptedProvider::new(ProviderId::OpenRouter, Script::Chunks(vec!["x"]));
    let store = RecordingStore::empty();
    let orch = orchestrator(provider, store.clone());

    let messages = vec![
        ChatMessage::system("You are terse."),
        ChatMessage::user("first question"),
        ChatMessage::assistant("first answer"),
        ChatMessage::user("second question"),
    ];
    orch.complete(request(Some("c"), messages)).await.unwrap();

    assert_eq!(store.retrieves.lock()[0].1, "second question");
}

#[tokio::test]
async fn no_chat_id_means_no_memory_calls() {
    let store = RecordingStore::with_snippets(&["never shown"]);
    let provider = ScriptedProvider::new(ProviderId::OpenRouter, Script::Chunks(vec!["hi"]));
    let orch = orchestrator(provider.clone(), store.clone());

    orch.complete(request(None, hello())).await.unwrap();
    let _ = collect(&orch, Some("   ")).await;
    orch.shutdown().await;

    assert!(store.retrieves.lock().is_empty());
    assert!(store.stores.lock().is_empty());
    assert!(!provider.last_call().messages[0]
        .content
        .contains("Relevant context"));
}

#[tokio::test]
async fn retrieval_failure_still_completes_without_context() {
    let provider = ScriptedProvider::new(ProviderId::OpenRouter, Script::Chunks(vec!["fine"]));
    let store = RecordingStore::failing();
    let orch = orchestrator(provider.clone(), store.clone());

    let result = orch.complete(request(Some("c"), hello())).await.unwrap();

    assert_eq!(result.content, "fine");
    assert_eq!(store.retrieves.lock().len(), 1);
    let system = &provider.last_call().messages[0];
    assert_eq!(system.role, Role::System);
    assert!(!system.content.contains("Relevant context"));
}

#[tokio::test]
async fn unavailable_store_is_never_called() {
    let store = RecordingStore::unavailable();
    let orch = orchestrator(
        ScriptedProvider::new(ProviderId::OpenRouter, Script::Chunks(vec!["a"])),
        store.clone(),
    );

    orch.complete(request(Some("c"), hello())).await.unwrap();
    orch.shutdown().await;

    assert!(store.retrieves.lock().is_empty());
    assert!(store.stores.lock().is_empty());
}

// ── Memory writes ───────────────────────────────────────────────────────

#[tokio::test]
async fn completed_exchange_is_stored_once() {
    let store = RecordingStore::empty();
    let orch = orchestrator(
        ScriptedProvider::new(ProviderId::OpenRouter, Script::Chunks(vec!["Ru", "st"])),
        store.clone(),
    );

    let input = hello();
    let (texts, _) = collect(&orch, Some("chat-1")).await;
    orch.shutdown().await;

    assert_eq!(texts.concat(), "Rust");
    let stores = store.stores.lock();
    assert_eq!(stores.len(), 1);
    let (scope, exchange) = &stores[0];
    assert_eq!(scope.chat_id(), Some("chat-1"));
    let mut expected = input;
    expected.push(ChatMessage::assistant("Rust"));
    // The stored exchange is the caller's messages, not the augmented list.
    assert_eq!(exchange, &expected);
}

#[tokio::test]
async fn buffered_completion_is_stored() {
    let store = RecordingStore::empty();
    let orch = orchestrator(
        ScriptedProvider::new(ProviderId::OpenRouter, Script::Chunks(vec!["ok"])),
        store.clone(),
    );

    orch.complete(request(Some("c"), hello())).await.unwrap();
    orch.shutdown().await;

    assert_eq!(store.stores.lock().len(), 1);
}

#[tokio::test]
async fn store_failure_does_not_fail_the_completion() {
    let store = RecordingStore::failing_writes();
    let orch = orchestrator(
        ScriptedProvider::new(ProviderId::OpenRouter, Script::Chunks(vec!["Ru", "st"])),
        store.clone(),
    );

    let (texts, errors) = collect(&orch, Some("chat-1")).await;
    let result = orch.complete(request(Some("chat-1"), hello())).await.unwrap();
    orch.shutdown().await;

    assert!(errors.is_empty(), "stream ended with {errors:?}");
    assert_eq!(texts.concat(), "Rust");
    assert_eq!(result.content, "Rust");
    // Both completions reached the store; the worker survived the first rejection.
    assert_eq!(store.stores.lock().len(), 2);
}

#[tokio::test]
async fn dropped_stream_never_persists() {
    let store = RecordingStore::empty();
    let orch = orchestrator(
        ScriptedProvider::new(ProviderId::OpenRouter, Script::Chunks(vec!["one", "two", "three"])),
        store.clone(),
    );

    let mut stream = orch.complete_stream(request(Some("c"), hello()));
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.text, "one");
    drop(stream);
    orch.shutdown().await;

    assert!(store.stores.lock().is_empty());
}

#[tokio::test]
async fn unpolled_stream_does_no_work() {
    let provider = ScriptedProvider::new(ProviderId::OpenRouter, Script::Chunks(vec!["x"]));
    let store = RecordingStore::empty();
    let orch = orchestrator(provider.clone(), store.clone());

    let stream = orch.complete_stream(request(Some("c"), hello()));
    drop(stream);
    orch.shutdown().await;

    assert!(provider.calls.lock().is_empty());
    assert!(store.retrieves.lock().is_empty());
    assert!(store.stores.lock().is_empty());
}

// ── Failures ────────────────────────────────────────────────────────────

#[tokio::test]
async fn upstream_401_returns_error_and_no_content() {
    let store = RecordingStore::empty();
    let orch = orchestrator(
        ScriptedProvider::new(ProviderId::OpenRouter, Script::Http(401)),
        store.clone(),
    );

    let err = orch.complete(request(Some("c"), hello())).await.unwrap_err();
    match err {
        sm_domain::error::Error::ProviderHttp { status, .. } => assert_eq!(status, 401),
        other => panic!("expected ProviderHttp, got {other:?}"),
    }

    let (texts, errors) = collect(&orch, Some("c")).await;
    orch.shutdown().await;

    assert!(texts.is_empty());
    assert_eq!(errors, vec!["provider_http"]);
    assert!(store.stores.lock().is_empty());
}

#[tokio::test]
async fn missing_credential_fails_before_first_chunk() {
    let orch = orchestrator(
        ScriptedProvider::new(ProviderId::OpenRouter, Script::NoCredential),
        RecordingStore::empty(),
    );

    let (texts, errors) = collect(&orch, None).await;
    assert!(texts.is_empty());
    assert_eq!(errors, vec!["credential_missing"]);
}

#[tokio::test]
async fn mid_stream_failure_keeps_delivered_chunks_and_skips_persistence() {
    let store = RecordingStore::empty();
    let orch = orchestrator(
        ScriptedProvider::new(ProviderId::OpenRouter, Script::BreakAfter(vec!["A", "B"])),
        store.clone(),
    );

    let (texts, errors) = collect(&orch, Some("c")).await;
    let buffered = orch.complete(request(Some("c"), hello())).await;
    orch.shutdown().await;

    assert_eq!(texts, vec!["A", "B"]);
    assert_eq!(errors, vec!["malformed_stream"]);
    assert!(buffered.is_err());
    assert!(store.stores.lock().is_empty());
}

// ── Provider resolution ─────────────────────────────────────────────────

#[tokio::test]
async fn unknown_platform_uses_default_provider() {
    let provider = ScriptedProvider::new(ProviderId::OpenRouter, Script::Chunks(vec!["d"]));
    let orch = orchestrator(provider.clone(), RecordingStore::empty());

    let mut req = request(None, hello());
    req.agent.platform = "unknown-xyz".into();
    let result = orch.complete(req).await.unwrap();

    assert_eq!(result.content, "d");
    assert_eq!(provider.calls.lock().len(), 1);
}

#[tokio::test]
async fn platform_selects_matching_provider() {
    let openrouter = ScriptedProvider::new(ProviderId::OpenRouter, Script::Chunks(vec!["or"]));
    let anthropic = ScriptedProvider::new(ProviderId::Anthropic, Script::Chunks(vec!["an"]));
    let resolver = ProviderResolver::new(
        [ProviderId::OpenRouter, ProviderId::Anthropic],
        ProviderId::OpenRouter,
    );
    let registry = ProviderRegistry::default()
        .with_provider(openrouter.clone())
        .with_provider(anthropic.clone());
    let orch = CompletionOrchestrator::new(
        resolver,
        registry,
        RecordingStore::empty(),
        PromptConfig::default(),
        4,
    );

    let mut req = request(None, hello());
    req.agent.platform = "Anthropic".into();
    assert_eq!(orch.complete(req).await.unwrap().content, "an");

    let mut req = request(None, hello());
    req.agent.platform = "openrouter".into();
    assert_eq!(orch.complete(req).await.unwrap().content, "or");

    let handle = orch
        .open_stream({
            let mut r = request(None, hello());
            r.agent.platform = "anthropic".into();
            r
        })
        .unwrap();
    assert_eq!(handle.provider, ProviderId::Anthropic);
    assert_eq!(openrouter.calls.lock().len(), 1);
    assert_eq!(anthropic.calls.lock().len(), 1);
}

#[tokio::test]
async fn resolved_provider_missing_from_registry_is_an_error() {
    let resolver = ProviderResolver::new([ProviderId::Mistral], ProviderId::Mistral);
    let orch = CompletionOrchestrator::new(
        resolver,
        ProviderRegistry::default(),
        Arc::new(sm_memory::DisabledMemoryStore),
        PromptConfig::default(),
        4,
    );

    let err = orch.complete(request(None, hello())).await.unwrap_err();
    assert_eq!(err.kind(), "config");

    let mut stream = orch.complete_stream(request(None, hello()));
    assert!(stream.next().await.unwrap().is_err());
    assert!(stream.next().await.is_none());
}

//! `solmind complete` — one-shot completion from the command line.

use std::io::Write;
use std::sync::Arc;

use futures_util::StreamExt;

use sm_domain::chat::{AgentConfig, ChatMessage};
use sm_domain::config::Config;
use sm_domain::memory::MemoryScope;

use super::CompleteArgs;
use crate::bootstrap::build_app_state;
use crate::runtime::CompletionRequest;

pub fn build_request(args: &CompleteArgs, config: &Config) -> CompletionRequest {
    let scope = MemoryScope {
        agent_id: args.agent.clone(),
        chat_id: args.chat.clone(),
        capsule_id: args.capsule.clone(),
    };
    CompletionRequest {
        agent_id: args.agent.clone(),
        messages: vec![ChatMessage::user(args.message.clone())],
        agent: AgentConfig {
            platform: args.platform.clone(),
            model: args.model.clone(),
            api_key: None,
        },
        scope,
        memory_size: args.memory_size.unwrap_or(config.memory.default_size),
    }
}

/// Run one completion. Text mode streams fragments to stdout as they
/// arrive; `--json` prints the buffered result.
pub async fn run(config: Arc<Config>, args: CompleteArgs) -> anyhow::Result<()> {
    let state = build_app_state(config.clone()).await?;
    let req = build_request(&args, &config);

    let outcome = if args.json {
        match state.orchestrator.complete(req).await {
            Ok(result) => {
                println!("{}", serde_json::to_string_pretty(&result)?);
                Ok(())
            }
            Err(e) => Err(e),
        }
    } else {
        let mut chunks = state.orchestrator.complete_stream(req);
        let mut stdout = std::io::stdout();
        let mut failure = None;
        while let Some(item) = chunks.next().await {
            match item {
                Ok(chunk) => {
                    stdout.write_all(chunk.text.as_bytes())?;
                    stdout.flush()?;
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        drop(chunks);
        println!();
        failure.map_or(Ok(()), Err)
    };

    // Let queued memory writes finish before the process exits.
    state.orchestrator.shutdown().await;

    outcome.map_err(|e| anyhow::anyhow!("{} ({})", e, e.kind()))
}

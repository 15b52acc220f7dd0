use serde::Serialize;

/// Structured trace events emitted across all SolMind crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    ProviderResolved {
        agent_id: String,
        platform: String,
        provider: String,
        matched: bool,
    },
    MemoryContextBuilt {
        scope: String,
        snippets: usize,
        /// Rendered context length in characters.
        context_chars: usize,
        truncated: bool,
        degraded: bool,
    },
    MemoryCall {
        endpoint: String,
        status: u16,
        duration_ms: u64,
    },
    MemoryPersisted {
        scope: String,
        messages: usize,
        ok: bool,
        duration_ms: u64,
    },
    LlmRequest {
        provider: String,
        model: String,
        streaming: bool,
        duration_ms: u64,
        chunks: usize,
        /// Assistant reply length in characters.
        content_chars: usize,
        completed: bool,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "sm_event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_event_tag() {
        let ev = TraceEvent::MemoryPersisted {
            scope: "agent-1:chat-1".into(),
            messages: 2,
            ok: true,
            duration_ms: 12,
        };
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["event"], "MemoryPersisted");
        assert_eq!(v["scope"], "agent-1:chat-1");
        assert_eq!(v["messages"], 2);
        assert_eq!(v["ok"], true);
    }
}

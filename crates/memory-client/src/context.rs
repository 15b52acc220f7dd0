//! `MemoryContextBuilder`: turns the snippets a [`MemoryStore`] returns for
//! the latest user message into a bounded bullet list suitable for the
//! system prompt.
//!
//! Gracefully degrades: an unusable scope, an unavailable store, an empty
//! query or a failed retrieval all produce an empty string.

use std::collections::HashSet;
use std::sync::Arc;

use sm_domain::memory::{MemoryScope, MemorySize};
use sm_domain::trace::TraceEvent;
use tracing::warn;

use crate::provider::MemoryStore;

pub const TRUNCATION_MARKER: &str = "\n[TRUNCATED]";

#[derive(Clone)]
pub struct MemoryContextBuilder {
    store: Arc<dyn MemoryStore>,
}

impl MemoryContextBuilder {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }

    /// Whether `build` can produce anything for this scope.
    pub fn can_retrieve(&self, scope: &MemoryScope) -> bool {
        scope.is_usable() && self.store.is_available()
    }

    /// Fetch and render memory context. Never fails.
    pub async fn build(&self, scope: &MemoryScope, query: Option<&str>, size: MemorySize) -> String {
        if !self.can_retrieve(scope) {
            return String::new();
        }
        let query = match query.map(str::trim) {
            Some(q) if !q.is_empty() => q,
            _ => return String::new(),
        };

        let (snippets, degraded) = match self.store.retrieve(scope, query, size).await {
            Ok(snippets) => (snippets, false),
            Err(e) => {
                warn!(scope = %scope, error = %e, kind = e.kind(), "memory retrieval failed");
                (Vec::new(), true)
            }
        };

        let mut seen = HashSet::new();
        let lines: Vec<String> = snippets
            .iter()
            .map(|s| s.content.trim())
            .filter(|c| !c.is_empty())
            .filter(|c| seen.insert(*c))
            .map(|c| format!("- {c}"))
            .collect();
        let count = lines.len();

        let (text, truncated) = truncate(lines.join("\n"), size.context_budget_chars());

        TraceEvent::MemoryContextBuilt {
            scope: scope.to_string(),
            snippets: count,
            context_chars: text.chars().count(),
            truncated,
            degraded,
        }
        .emit();

        text
    }
}

/// Keep at most `max_chars` characters of `text`, appending the truncation
/// marker when anything was dropped.
fn truncate(mut text: String, max_chars: usize) -> (String, bool) {
    let Some((end, _)) = text.char_indices().nth(max_chars) else {
        return (text, false);
    };
    text.truncate(end);
    text.push_str(TRUNCATION_MARKER);
    (text, true)
}

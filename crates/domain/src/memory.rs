use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scope
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Key for memory retrieval and storage.
///
/// With a `capsule_id` the memory of a chat is partitioned per capsule, so
/// two capsules never see each other's memory for the same chat. Without
/// one the scope is chat-global.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryScope {
    pub agent_id: String,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub capsule_id: Option<String>,
}

impl MemoryScope {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            chat_id: None,
            capsule_id: None,
        }
    }

    pub fn with_chat(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }

    pub fn with_capsule(mut self, capsule_id: impl Into<String>) -> Self {
        self.capsule_id = Some(capsule_id.into());
        self
    }

    /// The chat id, if present and non-blank.
    pub fn chat_id(&self) -> Option<&str> {
        self.chat_id
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// The capsule id, if present and non-blank.
    pub fn capsule_id(&self) -> Option<&str> {
        self.capsule_id
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Memory is only read or written for scopes that name a chat.
    pub fn is_usable(&self) -> bool {
        self.chat_id().is_some()
    }

    /// Stable partition key: `agent/chat` or `agent/chat/capsule`.
    ///
    /// Each segment is escaped so that ids containing `/` or `%` cannot
    /// produce another scope's key. `None` when the scope is not usable.
    pub fn namespace(&self) -> Option<String> {
        let chat = self.chat_id()?;
        let mut ns = escape_segment(&self.agent_id);
        ns.push('/');
        ns.push_str(&escape_segment(chat));
        if let Some(capsule) = self.capsule_id() {
            ns.push('/');
            ns.push_str(&escape_segment(capsule));
        }
        Some(ns)
    }
}

fn escape_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            c => out.push(c),
        }
    }
    out
}

impl fmt::Display for MemoryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.namespace() {
            Some(ns) => f.write_str(&ns),
            None => write!(f, "{}/-", self.agent_id),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Snippets
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A ranked fragment of prior conversational memory.
///
/// Stores return snippets most relevant first; the count is not fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySnippet {
    pub content: String,
    #[serde(default)]
    pub relevance: Option<f64>,
}

impl MemorySnippet {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            relevance: None,
        }
    }

    pub fn with_relevance(mut self, relevance: f64) -> Self {
        self.relevance = Some(relevance);
        self
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Size hint
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// How much prior memory a chat wants injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemorySize {
    #[serde(alias = "Small", alias = "SMALL")]
    Small,
    #[default]
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "Large", alias = "LARGE")]
    Large,
}

impl MemorySize {
    /// Maximum number of snippets requested from the store.
    pub fn snippet_limit(self) -> u32 {
        match self {
            MemorySize::Small => 3,
            MemorySize::Medium => 5,
            MemorySize::Large => 10,
        }
    }

    /// Upper bound on the rendered context block, in characters.
    pub fn context_budget_chars(self) -> usize {
        match self {
            MemorySize::Small => 800,
            MemorySize::Medium => 1_600,
            MemorySize::Large => 3_200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_without_chat_is_not_usable() {
        let scope = MemoryScope::new("agent-1");
        assert!(!scope.is_usable());
        assert!(scope.namespace().is_none());

        let blank = MemoryScope::new("agent-1").with_chat("   ");
        assert!(!blank.is_usable());
    }

    #[test]
    fn capsule_partitions_namespace() {
        let global = MemoryScope::new("a").with_chat("c");
        let capsule_x = MemoryScope::new("a").with_chat("c").with_capsule("x");
        let capsule_y = MemoryScope::new("a").with_chat("c").with_capsule("y");

        assert_eq!(global.namespace().as_deref(), Some("a/c"));
        assert_eq!(capsule_x.namespace().as_deref(), Some("a/c/x"));
        assert_ne!(capsule_x.namespace(), capsule_y.namespace());
        assert_ne!(capsule_x.namespace(), global.namespace());
    }

    #[test]
    fn slashes_in_ids_cannot_collide() {
        let a = MemoryScope::new("agent").with_chat("c").with_capsule("x/y");
        let b = MemoryScope::new("agent").with_chat("c/x").with_capsule("y");
        let c = MemoryScope::new("agent").with_chat("c").with_capsule("x");
        let d = MemoryScope::new("agent").with_chat("c/x");

        assert_ne!(a.namespace(), b.namespace());
        assert_ne!(c.namespace(), d.namespace());
        assert_eq!(a.namespace().as_deref(), Some("agent/c/x%2Fy"));
        assert_eq!(d.namespace().as_deref(), Some("agent/c%2Fx"));
    }

    #[test]
    fn escaped_ids_stay_distinct_from_literal_escapes() {
        let slash = MemoryScope::new("a").with_chat("c/x");
        let literal = MemoryScope::new("a").with_chat("c%2Fx");
        assert_ne!(slash.namespace(), literal.namespace());
        assert_eq!(literal.namespace().as_deref(), Some("a/c%252Fx"));
    }

    #[test]
    fn blank_capsule_is_chat_global() {
        let scope = MemoryScope::new("a").with_chat("c").with_capsule("");
        assert_eq!(scope.namespace().as_deref(), Some("a/c"));
    }

    #[test]
    fn memory_size_accepts_original_spelling() {
        let size: MemorySize = serde_json::from_str("\"Large\"").unwrap();
        assert_eq!(size, MemorySize::Large);
        let size: MemorySize = serde_json::from_str("\"small\"").unwrap();
        assert_eq!(size, MemorySize::Small);
        assert_eq!(MemorySize::default(), MemorySize::Medium);
    }

    #[test]
    fn larger_sizes_fetch_more() {
        assert!(MemorySize::Small.snippet_limit() < MemorySize::Medium.snippet_limit());
        assert!(MemorySize::Medium.snippet_limit() < MemorySize::Large.snippet_limit());
        assert!(
            MemorySize::Medium.context_budget_chars() < MemorySize::Large.context_budget_chars()
        );
    }
}

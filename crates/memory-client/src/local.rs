//! In-process [`MemoryStore`].
//!
//! Keeps exchanges in a map keyed by scope namespace. Useful for single-node
//! deployments and development; contents are lost on restart. Both the
//! entries per scope and the number of scopes are bounded; when a new scope
//! would exceed the limit, the least recently written one is dropped.

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sm_domain::chat::{ChatMessage, Role};
use sm_domain::error::{Error, Result};
use sm_domain::memory::{MemoryScope, MemorySize, MemorySnippet};

use crate::provider::MemoryStore;

/// Exchanges kept per scope before the oldest are evicted.
pub const MAX_ENTRIES_PER_SCOPE: usize = 200;

/// Scopes kept before the least recently written one is evicted.
pub const DEFAULT_MAX_SCOPES: usize = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    content: String,
    terms: HashSet<String>,
    stored_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct ScopeEntries {
    entries: VecDeque<Entry>,
    last_write: u64,
}

#[derive(Debug, Default)]
struct Scopes {
    by_namespace: HashMap<String, ScopeEntries>,
    // Monotonic write counter; orders scopes for eviction.
    clock: u64,
}

#[derive(Debug)]
pub struct LocalMemoryStore {
    scopes: RwLock<Scopes>,
    max_scopes: usize,
}

impl Default for LocalMemoryStore {
    fn default() -> Self {
        Self::with_max_scopes(DEFAULT_MAX_SCOPES)
    }
}

impl LocalMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_scopes(max_scopes: usize) -> Self {
        Self {
            scopes: RwLock::new(Scopes::default()),
            max_scopes: max_scopes.max(1),
        }
    }

    /// Number of entries held for a scope.
    pub fn len(&self, scope: &MemoryScope) -> usize {
        scope
            .namespace()
            .and_then(|ns| {
                self.scopes
                    .read()
                    .by_namespace
                    .get(&ns)
                    .map(|s| s.entries.len())
            })
            .unwrap_or(0)
    }

    /// Number of scopes currently held.
    pub fn scope_count(&self) -> usize {
        self.scopes.read().by_namespace.len()
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 2)
        .map(str::to_lowercase)
        .collect()
}

/// Collapse one exchange into a single memory line: the last user turn and
/// the assistant reply.
fn summarize(exchange: &[ChatMessage]) -> Option<String> {
    let last = |role: Role| {
        exchange
            .iter()
            .rev()
            .find(|m| m.role == role)
            .map(|m| m.content.trim())
            .filter(|c| !c.is_empty())
    };
    match (last(Role::User), last(Role::Assistant)) {
        (Some(u), Some(a)) => Some(format!("User: {u} | Assistant: {a}")),
        (Some(u), None) => Some(format!("User: {u}")),
        (None, Some(a)) => Some(format!("Assistant: {a}")),
        (None, None) => None,
    }
}

#[async_trait]
impl MemoryStore for LocalMemoryStore {
    fn is_available(&self) -> bool {
        true
    }

    async fn retrieve(
        &self,
        scope: &MemoryScope,
        query: &str,
        size: MemorySize,
    ) -> Result<Vec<MemorySnippet>> {
        let namespace = scope
            .namespace()
            .ok_or_else(|| Error::MemoryRetrieve("scope has no chat id".into()))?;
        let query_terms = terms(query);

        let scopes = self.scopes.read();
        let Some(held) = scopes.by_namespace.get(&namespace) else {
            return Ok(Vec::new());
        };

        let mut ranked: Vec<(usize, &Entry)> = held
            .entries
            .iter()
            .map(|e| (e.terms.intersection(&query_terms).count(), e))
            .filter(|(overlap, _)| *overlap > 0)
            .collect();
        // Most overlap first, then newest.
        ranked.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.stored_at.cmp(&a.1.stored_at)));

        let denom = query_terms.len().max(1) as f64;
        Ok(ranked
            .into_iter()
            .take(size.snippet_limit() as usize)
            .map(|(overlap, e)| {
                MemorySnippet::new(e.content.clone()).with_relevance(overlap as f64 / denom)
            })
            .collect())
    }

    async fn store(&self, scope: &MemoryScope, exchange: &[ChatMessage]) -> Result<()> {
        let namespace = scope
            .namespace()
            .ok_or_else(|| Error::MemoryStore("scope has no chat id".into()))?;
        let Some(content) = summarize(exchange) else {
            return Ok(());
        };

        let entry = Entry {
            terms: terms(&content),
            content,
            stored_at: Utc::now(),
        };

        let mut scopes = self.scopes.write();
        if !scopes.by_namespace.contains_key(&namespace)
            && scopes.by_namespace.len() >= self.max_scopes
        {
            let oldest = scopes
                .by_namespace
                .iter()
                .min_by_key(|(_, s)| s.last_write)
                .map(|(ns, _)| ns.clone());
            if let Some(oldest) = oldest {
                tracing::debug!(namespace = %oldest, "evicting least recently written memory scope");
                scopes.by_namespace.remove(&oldest);
            }
        }

        scopes.clock += 1;
        let now = scopes.clock;
        let held = scopes.by_namespace.entry(namespace).or_default();
        held.last_write = now;
        held.entries.push_back(entry);
        while held.entries.len() > MAX_ENTRIES_PER_SCOPE {
            held.entries.pop_front();
        }
        Ok(())
    }
}

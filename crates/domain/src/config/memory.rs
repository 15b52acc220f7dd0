use serde::{Deserialize, Serialize};

use crate::memory::MemorySize;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Memory store connection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "d_transport")]
    pub transport: MemoryTransport,
    #[serde(default = "d_memory_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "d_8000")]
    pub timeout_ms: u64,
    #[serde(default = "d_2")]
    pub max_retries: u32,
    /// Size hint used when a request does not carry one.
    #[serde(default)]
    pub default_size: MemorySize,
    #[serde(default = "d_256")]
    pub persist_queue_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryTransport {
    /// mem0-compatible HTTP service.
    Rest,
    /// In-process store; contents are lost on restart.
    Local,
    Disabled,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            transport: d_transport(),
            base_url: d_memory_url(),
            api_key: None,
            timeout_ms: 8000,
            max_retries: 2,
            default_size: MemorySize::default(),
            persist_queue_capacity: 256,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_transport() -> MemoryTransport {
    MemoryTransport::Local
}
fn d_memory_url() -> String {
    "http://localhost:8888".into()
}
fn d_8000() -> u64 {
    8000
}
fn d_2() -> u32 {
    2
}
fn d_256() -> usize {
    256
}

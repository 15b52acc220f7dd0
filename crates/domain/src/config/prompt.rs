use serde::{Deserialize, Serialize};

/// Text the orchestrator adds to every conversation's system message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Used as the system message when the caller supplied none.
    #[serde(default = "d_preamble")]
    pub persona_preamble: String,
    #[serde(default = "d_length_guidance")]
    pub length_guidance: String,
    /// Line placed above the recalled memory block.
    #[serde(default = "d_context_heading")]
    pub context_heading: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            persona_preamble: d_preamble(),
            length_guidance: d_length_guidance(),
            context_heading: d_context_heading(),
        }
    }
}

fn d_preamble() -> String {
    "You are a helpful assistant.".into()
}
fn d_length_guidance() -> String {
    "Keep your responses concise: no more than about 100 words unless the user explicitly asks for more detail.".into()
}
fn d_context_heading() -> String {
    "Relevant context from previous conversations:".into()
}

//! System-message augmentation.

use sm_domain::chat::{ChatMessage, Role};
use sm_domain::config::PromptConfig;

/// Build the message list sent to the provider.
///
/// The caller's list is never modified. Without a system message one is
/// prepended (persona preamble, length guidance, memory block); otherwise the
/// guidance and memory block are appended to the first system message.
pub fn augment_messages(
    messages: &[ChatMessage],
    prompt: &PromptConfig,
    memory_context: &str,
) -> Vec<ChatMessage> {
    let mut out = messages.to_vec();

    match out.iter_mut().find(|m| m.role == Role::System) {
        Some(system) => {
            let mut parts = vec![system.content.as_str()];
            let block = context_block(prompt, memory_context);
            push_nonempty(&mut parts, &prompt.length_guidance);
            push_nonempty(&mut parts, &block);
            system.content = parts.join("\n\n");
        }
        None => {
            let block = context_block(prompt, memory_context);
            let mut parts = Vec::new();
            push_nonempty(&mut parts, &prompt.persona_preamble);
            push_nonempty(&mut parts, &prompt.length_guidance);
            push_nonempty(&mut parts, &block);
            out.insert(0, ChatMessage::system(parts.join("\n\n")));
        }
    }

    out
}

fn context_block(prompt: &PromptConfig, memory_context: &str) -> String {
    if memory_context.trim().is_empty() {
        return String::new();
    }
    format!("{}\n{}", prompt.context_heading, memory_context)
}

fn push_nonempty<'a>(parts: &mut Vec<&'a str>, s: &'a str) {
    if !s.trim().is_empty() {
        parts.push(s);
    }
}

//! Completion runtime: prompt augmentation, the orchestrator that drives a
//! provider stream, and the background queue that persists finished
//! exchanges to memory.

pub mod orchestrator;
pub mod persist;
pub mod prompt;

pub use orchestrator::{CompletionOrchestrator, CompletionRequest, CompletionStream};
pub use persist::{PersistJob, PersistQueue};
pub use prompt::augment_messages;

pub mod anthropic;
pub mod openai_compat;
pub mod registry;
pub mod resolver;
pub mod traits;
pub(crate) mod sse;
pub mod util;

// Re-exports for convenience.
pub use registry::ProviderRegistry;
pub use resolver::{ProviderResolver, Resolution};
pub use sm_domain::provider::ProviderId;
pub use traits::{ChatRequest, LlmProvider};

//! Chat completion provider layer for Adopilot.
//!
//! # Architecture
//!
//! - [`traits::LlmProvider`]: the completion interface the agent consumes
//! - [`http_provider::HttpProvider`]: Azure OpenAI / OpenAI-compatible HTTP client
//! - [`error::ProviderError`]: every way a completion can fail

pub mod error;
pub mod http_provider;
pub mod traits;

// Re-export main types for convenience
pub use error::ProviderError;
pub use http_provider::HttpProvider;
pub use traits::{LlmProvider, LlmRequestConfig};

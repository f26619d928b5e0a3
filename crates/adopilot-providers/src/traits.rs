//! LLM Provider trait: the completion interface.
//!
//! The agent only ever talks to a `dyn LlmProvider`; `HttpProvider` in
//! `http_provider.rs` covers Azure OpenAI and OpenAI-compatible APIs, and
//! tests substitute scripted providers.

use async_trait::async_trait;
use adopilot_core::config::LlmConfig;
use adopilot_core::types::{LlmResponse, Message, ToolDefinition};

use crate::error::ProviderError;

/// Sampling options passed to each LLM call.
///
/// Unset fields are omitted from the request so the deployment's own
/// defaults apply.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LlmRequestConfig {
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: Option<f64>,
}

impl From<&LlmConfig> for LlmRequestConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// Trait that all LLM providers must implement.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request.
    ///
    /// # Arguments
    /// * `messages`: Conversation so far, in OpenAI format.
    /// * `tools`   : Function declarations the model may call (may be empty).
    /// * `config`  : Temperature, max_tokens.
    ///
    /// # Returns
    /// The first choice's content and/or tool calls, or the reason the
    /// call failed.
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        config: &LlmRequestConfig,
    ) -> Result<LlmResponse, ProviderError>;

    /// Model or deployment this provider sends requests to.
    fn model(&self) -> &str;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}

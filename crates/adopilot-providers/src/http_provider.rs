//! HTTP chat-completions provider for Azure OpenAI and OpenAI-compatible APIs.
//!
//! Both flavors share the request and response bodies; they differ only in
//! URL layout and the authentication header.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};

use adopilot_core::config::{ApiFlavor, LlmConfig};
use adopilot_core::types::{ChatCompletionRequest, ChatCompletionResponse, LlmResponse, Message, ToolDefinition};

use crate::error::ProviderError;
use crate::traits::{LlmProvider, LlmRequestConfig};

// ─────────────────────────────────────────────
// HttpProvider
// ─────────────────────────────────────────────

/// An LLM provider that posts to a `/chat/completions` endpoint via `reqwest`.
pub struct HttpProvider {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// URL layout and auth scheme.
    flavor: ApiFlavor,
    /// Resource endpoint or API base URL, without trailing slash.
    endpoint: String,
    /// API key (`api-key` header on Azure, bearer token otherwise).
    api_key: String,
    /// Azure `api-version` query parameter.
    api_version: String,
    /// Deployment name (Azure) or model identifier.
    model: String,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("flavor", &self.flavor)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

impl HttpProvider {
    /// Create a provider from the `llm` config section.
    pub fn new(config: &LlmConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(HttpProvider {
            client,
            flavor: config.flavor,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_version: config.api_version.clone(),
            model: config.model.clone(),
        })
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        match self.flavor {
            ApiFlavor::Azure => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                self.endpoint, self.model, self.api_version
            ),
            ApiFlavor::OpenAi => format!("{}/chat/completions", self.endpoint),
        }
    }

    fn build_request(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        config: &LlmRequestConfig,
    ) -> ChatCompletionRequest {
        let tools = if tools.is_empty() {
            None
        } else {
            Some(tools.to_vec())
        };
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            tool_choice: tools.as_ref().map(|_| "auto".to_string()),
            tools,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl LlmProvider for HttpProvider {
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        config: &LlmRequestConfig,
    ) -> Result<LlmResponse, ProviderError> {
        debug!(
            provider = self.display_name(),
            model = %self.model,
            messages = messages.len(),
            tools = tools.len(),
            "Calling LLM"
        );

        let request_body = self.build_request(messages, tools, config);
        let request = self.client.post(self.completions_url()).json(&request_body);
        let request = match self.flavor {
            ApiFlavor::Azure => request.header("api-key", &self.api_key),
            ApiFlavor::OpenAi => request.bearer_auth(&self.api_key),
        };

        let response = request.send().await.map_err(|e| {
            error!(provider = self.display_name(), error = %e, "HTTP request failed");
            ProviderError::Http(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(
                provider = self.display_name(),
                status = %status,
                body = %body,
                "API error"
            );
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            error!(provider = self.display_name(), error = %e, "Failed to parse LLM response");
            ProviderError::Parse(e.to_string())
        })?;

        let llm_resp = parsed.into_first_choice().ok_or(ProviderError::NoChoices)?;
        debug!(
            provider = self.display_name(),
            has_content = llm_resp.content.is_some(),
            tool_calls = llm_resp.tool_calls.len(),
            finish_reason = llm_resp.finish_reason.as_deref().unwrap_or("?"),
            total_tokens = llm_resp.usage.as_ref().map_or(0, |u| u.total_tokens),
            "LLM response received"
        );
        Ok(llm_resp)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn display_name(&self) -> &str {
        match self.flavor {
            ApiFlavor::Azure => "Azure OpenAI",
            ApiFlavor::OpenAi => "OpenAI",
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

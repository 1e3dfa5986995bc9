//! OpenAI provider implementation using async-openai crate.
//!
//! Sends each prompt as a single user message and returns the text of the
//! first choice. No response-format mode is requested; the orchestrator
//! validates replies itself.

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    CreateChatCompletionResponse,
};
use async_openai::Client;
use async_trait::async_trait;
use conform_core::error::ConformError;
use conform_core::provider::Provider;
use conform_core::types::*;
use std::sync::Arc;

/// OpenAI provider using async-openai
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    info: Arc<ProviderInfo>,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("info", &self.info)
            .finish()
    }
}

impl OpenAiProvider {
    /// Create a new OpenAI provider with default configuration
    pub fn new(api_key: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);

        Self {
            client: Client::with_config(config),
            info: Arc::new(ProviderInfo {
                id: "openai".to_string(),
                name: "OpenAI".to_string(),
            }),
        }
    }

    /// Create a builder for more configuration options
    pub fn builder() -> OpenAiBuilder {
        OpenAiBuilder::default()
    }

    /// Build CreateChatCompletionRequest from our CompletionRequest
    fn build_request(
        &self,
        req: &CompletionRequest,
    ) -> Result<CreateChatCompletionRequest, ConformError> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(req.prompt.clone())
            .build()
            .map_err(|e| ConformError::provider(format!("Failed to build user message: {}", e)))?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&req.model)
            .messages(vec![ChatCompletionRequestMessage::User(message)]);

        if let Some(max_tokens) = req.max_tokens {
            builder.max_tokens(max_tokens);
        }
        if let Some(temperature) = req.temperature {
            builder.temperature(temperature);
        }

        builder
            .build()
            .map_err(|e| ConformError::provider(format!("Failed to build request: {}", e)))
    }

    /// Convert OpenAI response to our CompletionResponse
    fn convert_response(
        response: CreateChatCompletionResponse,
    ) -> Result<CompletionResponse, ConformError> {
        let text = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ConformError::provider("No choices in response"))?
            .message
            .content
            .unwrap_or_default();

        let usage = response.usage.map_or(Usage::default(), |u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(CompletionResponse {
            text,
            model: response.model,
            usage,
        })
    }
}

/// Map async-openai errors onto the transport taxonomy so the retry layer
/// can tell transient failures from permanent ones.
fn convert_error(err: OpenAIError) -> ConformError {
    let mapped = match err {
        OpenAIError::Reqwest(e) if e.is_timeout() => ConformError::timeout(e.to_string()),
        OpenAIError::Reqwest(e) => ConformError::network(e.to_string()),
        OpenAIError::ApiError(api) => match api.r#type.as_deref() {
            Some("insufficient_quota") | Some("rate_limit_exceeded") | Some("requests") => {
                ConformError::rate_limit(api.message)
            }
            Some("invalid_api_key") | Some("authentication_error") => {
                ConformError::authentication(api.message)
            }
            _ => ConformError::provider(format!("OpenAI API error: {}", api.message)),
        },
        other => ConformError::provider(format!("OpenAI API error: {}", other)),
    };

    tracing::debug!(
        retryable = mapped.is_retryable(),
        error = %mapped,
        "openai request failed"
    );
    mapped
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn info(&self) -> Arc<ProviderInfo> {
        self.info.clone()
    }

    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, ConformError> {
        let openai_req = self.build_request(&req)?;

        let response = self
            .client
            .chat()
            .create(openai_req)
            .await
            .map_err(convert_error)?;

        Self::convert_response(response)
    }
}

/// Builder for OpenAI provider with custom configuration
#[derive(Default)]
pub struct OpenAiBuilder {
    api_key: Option<String>,
    api_base: Option<String>,
    org_id: Option<String>,
}

impl OpenAiBuilder {
    /// Start from `OPENAI_API_KEY` and, if set, `OPENAI_API_BASE`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api_key: lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()),
            api_base: lookup("OPENAI_API_BASE"),
            org_id: None,
        }
    }

    /// Set API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set API base URL (for OpenAI-compatible APIs)
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Set organization ID
    pub fn organization(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    /// Build the provider
    pub fn build(self) -> Result<OpenAiProvider, ConformError> {
        self.build_with_id("openai", "OpenAI")
    }

    /// Build a provider with a custom provider ID and name
    ///
    /// Useful for OpenAI-compatible APIs that share the protocol but not the
    /// endpoint.
    pub fn build_with_id(
        self,
        provider_id: impl Into<String>,
        provider_name: impl Into<String>,
    ) -> Result<OpenAiProvider, ConformError> {
        let api_key = self
            .api_key
            .ok_or_else(|| ConformError::configuration("OPENAI_API_KEY is required"))?;

        let mut config = OpenAIConfig::new().with_api_key(api_key);

        if let Some(api_base) = self.api_base {
            config = config.with_api_base(api_base);
        }

        if let Some(org_id) = self.org_id {
            config = config.with_org_id(org_id);
        }

        Ok(OpenAiProvider {
            client: Client::with_config(config),
            info: Arc::new(ProviderInfo {
                id: provider_id.into(),
                name: provider_name.into(),
            }),
        })
    }
}

//! `OpenAI` provider implementation using the `async-openai` crate.
//!
//! Supports any `OpenAI`-compatible API (`OpenAI`, Azure, local proxies)
//! via the base URL override in [`AgentConfig`]. The rendered prompt is sent
//! as a single user message.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest, Stop,
};
use async_trait::async_trait;
use tracing::debug;

use crate::agent::config::AgentConfig;
use crate::agent::message::CompletionRequest;
use crate::agent::provider::LlmProvider;
use crate::error::AgentError;

/// The chat completions API accepts at most this many stop sequences.
const MAX_STOP_SEQUENCES: usize = 4;

/// `OpenAI`-compatible LLM provider.
///
/// Wraps the `async-openai` client for chat completions. Compatible
/// with any API that follows the `OpenAI` chat completion format.
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
}

impl OpenAiProvider {
    /// Creates a new provider from agent configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if the config has no API key.
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        let mut openai_config = OpenAIConfig::new().with_api_key(config.require_api_key()?);

        if let Some(ref base_url) = config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        Ok(Self {
            client: Client::with_config(openai_config),
        })
    }

    /// Builds an `OpenAI` chat completion request from our generic request.
    fn build_request(request: &CompletionRequest) -> CreateChatCompletionRequest {
        let message = ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(request.prompt.clone()),
            name: None,
        });

        let stop = if request.stop.is_empty() {
            None
        } else {
            Some(Stop::StringArray(
                request
                    .stop
                    .iter()
                    .take(MAX_STOP_SEQUENCES)
                    .cloned()
                    .collect(),
            ))
        };

        CreateChatCompletionRequest {
            model: request.model.clone(),
            messages: vec![message],
            temperature: request.temperature,
            max_completion_tokens: request.max_tokens,
            stop,
            ..Default::default()
        }
    }
}

/// Cuts `text` at the first stop sequence. Compatible servers do not all
/// honour `stop`.
fn truncate_at_stop(mut text: String, stop: &[String]) -> String {
    let cut = stop
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| text.find(s.as_str()))
        .min();
    if let Some(cut) = cut {
        text.truncate(cut);
    }
    text
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("client", &"<async-openai::Client>")
            .finish()
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, AgentError> {
        let openai_request = Self::build_request(request);

        let response = self
            .client
            .chat()
            .create(openai_request)
            .await
            .map_err(|e| AgentError::ApiRequest {
                message: e.to_string(),
                status: None,
            })?;

        if let Some(usage) = response.usage.as_ref() {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion usage"
            );
        }

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(truncate_at_stop(content, &request.stop))
    }
}

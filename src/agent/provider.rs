//! Pluggable LLM provider trait.
//!
//! Implementations translate a provider-agnostic [`CompletionRequest`] into
//! vendor SDK calls. The reasoning loop only ever sees this trait, so tests
//! drive it with scripted providers.

use async_trait::async_trait;

use super::message::CompletionRequest;
use crate::error::AgentError;

/// Trait for LLM provider backends.
///
/// Implementations handle the transport layer (HTTP, SDK calls, retries)
/// for a specific provider while presenting a uniform interface to the loop.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., `"openai"`).
    fn name(&self) -> &'static str;

    /// Completes the prompt and returns the generated text.
    ///
    /// Generation must stop at any of `request.stop`; the stop sequence is
    /// not included in the returned text.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] on API failures or timeouts.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AgentError>;
}

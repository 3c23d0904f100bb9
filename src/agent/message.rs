//! Provider-agnostic completion request.
//!
//! The reasoning loop renders its whole state into a single prompt string
//! and asks the model to continue it, so a request is one prompt plus the
//! sampling knobs and stop sequences.

use serde::{Deserialize, Serialize};

/// Stop sequence that ends a model turn before it invents an observation.
pub const OBSERVATION_STOP: &str = "\nObservation:";

/// A text completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier (e.g., "gpt-4o-mini").
    pub model: String,
    /// Full rendered prompt.
    pub prompt: String,
    /// Sequences at which generation stops. The sequence itself is not
    /// part of the returned text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
    /// Sampling temperature (0.0-2.0).
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Creates a request with no stop sequences and provider-default sampling.
    #[must_use]
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stop: Vec::new(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Adds a stop sequence.
    #[must_use]
    pub fn with_stop(mut self, stop: impl Into<String>) -> Self {
        self.stop.push(stop.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the generation limit.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AgentError;

/// Default model identifier.
const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default sampling temperature.
const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Default completion max tokens.
const DEFAULT_MAX_TOKENS: u32 = 1000;
/// Default reasoning iterations before giving up.
pub const DEFAULT_MAX_ITERATIONS: usize = 3;
/// Default whole-run timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 120;
/// Default number of documents returned by the retrieval tool.
const DEFAULT_SEARCH_TOP_K: usize = 3;

/// Configuration for the agent runtime.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the provider. Only providers that talk to a remote API
    /// require it.
    pub api_key: Option<String>,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens per completion.
    pub max_tokens: u32,
    /// Reasoning iterations per run. Each iteration makes at most one tool
    /// call.
    pub max_iterations: usize,
    /// Upper bound on one whole run, enforced by the caller.
    pub timeout: Duration,
    /// Directory containing prompt template files.
    ///
    /// When set, prompts are loaded from markdown files in this directory,
    /// falling back to compiled-in defaults for any missing files.
    pub prompt_dir: Option<PathBuf>,
    /// Conversation turns kept in memory. `None` keeps everything.
    pub memory_window: Option<usize>,
    /// Documents returned per retrieval tool call.
    pub search_top_k: usize,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] if a value is out of range.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }

    /// Returns the API key or [`AgentError::ApiKeyMissing`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no key was configured.
    pub fn require_api_key(&self) -> Result<&str, AgentError> {
        self.api_key.as_deref().ok_or(AgentError::ApiKeyMissing)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            api_key: None,
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            prompt_dir: None,
            memory_window: None,
            search_top_k: DEFAULT_SEARCH_TOP_K,
        }
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    max_iterations: Option<usize>,
    timeout: Option<Duration>,
    prompt_dir: Option<PathBuf>,
    memory_window: Option<usize>,
    search_top_k: Option<usize>,
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = std::env::var("RAGLOOP_PROVIDER").ok();
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("OPENAI_API_KEY")
                .or_else(|_| std::env::var("RAGLOOP_API_KEY"))
                .ok();
        }
        if self.base_url.is_none() {
            self.base_url = std::env::var("OPENAI_BASE_URL")
                .or_else(|_| std::env::var("RAGLOOP_BASE_URL"))
                .ok();
        }
        if self.model.is_none() {
            self.model = std::env::var("RAGLOOP_MODEL").ok();
        }
        if self.max_iterations.is_none() {
            self.max_iterations = env_parse("RAGLOOP_MAX_ITERATIONS");
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = std::env::var("RAGLOOP_PROMPT_DIR").ok().map(PathBuf::from);
        }
        if self.memory_window.is_none() {
            self.memory_window = env_parse("RAGLOOP_MEMORY_WINDOW");
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the completion max tokens.
    #[must_use]
    pub const fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    /// Sets the reasoning iteration budget.
    #[must_use]
    pub const fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = Some(n);
        self
    }

    /// Sets the whole-run timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Keeps only the last `turns` conversation turns in memory.
    #[must_use]
    pub const fn memory_window(mut self, turns: usize) -> Self {
        self.memory_window = Some(turns);
        self
    }

    /// Sets how many documents the retrieval tool returns.
    #[must_use]
    pub const fn search_top_k(mut self, n: usize) -> Self {
        self.search_top_k = Some(n);
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] if `max_iterations`,
    /// `search_top_k` or `memory_window` is zero, or the temperature is
    /// outside `0.0..=2.0`.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let defaults = AgentConfig::default();

        let max_iterations = self.max_iterations.unwrap_or(defaults.max_iterations);
        if max_iterations == 0 {
            return Err(AgentError::InvalidConfig {
                message: "max_iterations must be at least 1".to_string(),
            });
        }
        let search_top_k = self.search_top_k.unwrap_or(defaults.search_top_k);
        if search_top_k == 0 {
            return Err(AgentError::InvalidConfig {
                message: "search_top_k must be at least 1".to_string(),
            });
        }
        if self.memory_window == Some(0) {
            return Err(AgentError::InvalidConfig {
                message: "memory_window must be at least 1 turn".to_string(),
            });
        }
        let temperature = self.temperature.unwrap_or(defaults.temperature);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(AgentError::InvalidConfig {
                message: format!("temperature {temperature} is outside 0.0..=2.0"),
            });
        }

        Ok(AgentConfig {
            provider: self.provider.unwrap_or(defaults.provider),
            api_key: self.api_key,
            base_url: self.base_url,
            model: self.model.unwrap_or(defaults.model),
            temperature,
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            max_iterations,
            timeout: self.timeout.unwrap_or(defaults.timeout),
            prompt_dir: self.prompt_dir,
            memory_window: self.memory_window,
            search_top_k,
        })
    }
}

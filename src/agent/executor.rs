//! Bounded ReAct reasoning loop.
//!
//! # State machine
//!
//! ```text
//! THINKING ──final answer──▶ DONE
//!    │  ▲
//!  action │
//!    ▼  │
//! ACTING ──▶ OBSERVING
//!
//! max_iterations without DONE ──▶ FAILED (fallback answer)
//! ```
//!
//! Each iteration makes one model call (two if the first output does not
//! parse) and at most one tool call. Memory is written once per run, after
//! DONE or FAILED. Provider errors abort the run and leave memory untouched.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::config::{AgentConfig, DEFAULT_MAX_ITERATIONS};
use super::memory::ChatSession;
use super::message::{CompletionRequest, OBSERVATION_STOP};
use super::parser::{ParsedStep, parse_step};
use super::prompt::PromptSet;
use super::provider::LlmProvider;
use super::step::{AgentRun, FALLBACK_ANSWER, LoopState, ReasoningStep, RunOutcome};
use super::tool::{ToolCall, ToolRegistry};
use crate::error::AgentError;

/// What a thinking phase produced.
enum Thought {
    Parsed(ParsedStep),
    Unparseable { output: String, error: String },
}

/// Drives a model through thought/action/observation cycles.
///
/// The executor is immutable and `Send + Sync`; share one across sessions
/// and pass each conversation's [`ChatSession`] to [`run`](Self::run).
#[derive(Clone)]
pub struct AgentExecutor {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    prompts: PromptSet,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    max_iterations: usize,
}

impl std::fmt::Debug for AgentExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentExecutor")
            .field("provider", &self.provider.name())
            .field("tools", &self.tools.names())
            .field("model", &self.model)
            .field("max_iterations", &self.max_iterations)
            .finish_non_exhaustive()
    }
}

impl AgentExecutor {
    /// Creates an executor with default prompts and a budget of
    /// three iterations.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>) -> Self {
        let defaults = AgentConfig::default();
        Self {
            provider,
            tools,
            prompts: PromptSet::defaults(),
            model: defaults.model,
            temperature: Some(defaults.temperature),
            max_tokens: Some(defaults.max_tokens),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Creates an executor using model settings, iteration budget and
    /// prompt directory from `config`.
    #[must_use]
    pub fn from_config(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: &AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            prompts: PromptSet::load(config.prompt_dir.as_deref()),
            model: config.model.clone(),
            temperature: Some(config.temperature),
            max_tokens: Some(config.max_tokens),
            max_iterations: config.max_iterations.max(1),
        }
    }

    /// Sets the iteration budget. Zero is treated as one.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Replaces the prompt templates.
    #[must_use]
    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    /// Sets the model identifier sent with each request.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// The iteration budget.
    #[must_use]
    pub const fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// The tools available to the model.
    #[must_use]
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Answers `input` in the context of `session`.
    ///
    /// Returns the final answer with [`RunOutcome::Done`], or
    /// [`FALLBACK_ANSWER`] with [`RunOutcome::Failed`] once the iteration
    /// budget is spent. Either way the turn is recorded in the session's
    /// memory.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] if the provider fails. Memory is not updated.
    pub async fn run(&self, session: &mut ChatSession, input: &str) -> Result<AgentRun, AgentError> {
        let history = session.memory.transcript();
        let mut steps: Vec<ReasoningStep> = Vec::new();

        for iteration in 1..=self.max_iterations {
            self.transition(LoopState::Thinking, iteration);
            let prompt = self.prompts.render(&self.tools, &history, input, &steps);

            match self.think(&prompt).await? {
                Thought::Parsed(ParsedStep::Final { thought, answer }) => {
                    self.transition(LoopState::Done, iteration);
                    session.memory.record_turn(input, answer.as_str());
                    info!(
                        session = %session.id,
                        iterations = iteration,
                        steps = steps.len(),
                        "agent answered"
                    );
                    debug!(thought = %thought, "final thought");
                    return Ok(AgentRun {
                        answer,
                        steps,
                        outcome: RunOutcome::Done,
                        iterations: iteration,
                    });
                }
                Thought::Parsed(ParsedStep::Action {
                    thought,
                    tool,
                    input: action_input,
                }) => {
                    self.transition(LoopState::Acting, iteration);
                    let call = ToolCall {
                        name: tool,
                        input: action_input,
                    };
                    let result = self.tools.dispatch(&call).await;

                    self.transition(LoopState::Observing, iteration);
                    debug!(
                        tool = %call.name,
                        is_error = result.is_error,
                        observation_len = result.content.len(),
                        "observation"
                    );
                    steps.push(ReasoningStep {
                        thought,
                        action: Some(call.name),
                        action_input: Some(call.input),
                        observation: Some(result.content),
                    });
                }
                Thought::Unparseable { output, error } => {
                    warn!(iteration, error = %error, "model output unparseable after retry");
                    steps.push(ReasoningStep {
                        thought: output.trim().to_string(),
                        action: None,
                        action_input: None,
                        observation: Some(format!("Invalid Format: {error}")),
                    });
                }
            }
        }

        self.transition(LoopState::Failed, self.max_iterations);
        session.memory.record_turn(input, FALLBACK_ANSWER);
        info!(
            session = %session.id,
            iterations = self.max_iterations,
            steps = steps.len(),
            "agent stopped without a final answer"
        );

        Ok(AgentRun {
            answer: FALLBACK_ANSWER.to_string(),
            steps,
            outcome: RunOutcome::Failed,
            iterations: self.max_iterations,
        })
    }

    /// [`run`](Self::run) bounded by a wall-clock limit.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Timeout`] if the limit elapses first; memory is
    /// then left untouched. Otherwise as [`run`](Self::run).
    pub async fn run_with_timeout(
        &self,
        session: &mut ChatSession,
        input: &str,
        limit: Duration,
    ) -> Result<AgentRun, AgentError> {
        tokio::time::timeout(limit, self.run(session, input))
            .await
            .map_err(|_| AgentError::Timeout {
                seconds: limit.as_secs(),
            })?
    }

    /// One thinking phase: a model call plus at most one corrective retry.
    async fn think(&self, prompt: &str) -> Result<Thought, AgentError> {
        let output = self.complete(prompt).await?;
        let error = match parse_step(&output) {
            Ok(step) => return Ok(Thought::Parsed(step)),
            Err(e) => parse_message(e),
        };
        warn!(error = %error, "retrying unparseable model output");

        let retry_prompt = self
            .prompts
            .render_retry(prompt, &output, &error, &self.tools);
        let retried = self.complete(&retry_prompt).await?;
        Ok(match parse_step(&retried) {
            Ok(step) => Thought::Parsed(step),
            Err(e) => Thought::Unparseable {
                output: retried,
                error: parse_message(e),
            },
        })
    }

    async fn complete(&self, prompt: &str) -> Result<String, AgentError> {
        let request = CompletionRequest::new(self.model.as_str(), prompt)
            .with_stop(OBSERVATION_STOP)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);
        self.provider.complete(&request).await
    }

    fn transition(&self, state: LoopState, iteration: usize) {
        debug!(
            state = state.as_str(),
            iteration,
            max_iterations = self.max_iterations,
            "loop transition"
        );
    }
}

fn parse_message(error: AgentError) -> String {
    match error {
        AgentError::Parse { message } => message,
        other => other.to_string(),
    }
}

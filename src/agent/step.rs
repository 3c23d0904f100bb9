//! Reasoning steps and run outcomes.

use serde::{Deserialize, Serialize};

/// Answer returned when the loop runs out of iterations.
pub const FALLBACK_ANSWER: &str = "Agent stopped due to iteration limit or time limit.";

/// States of the reasoning loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopState {
    /// Asking the model for the next step.
    Thinking,
    /// Running the tool the model chose.
    Acting,
    /// Recording the tool's observation.
    Observing,
    /// The model gave a final answer.
    Done,
    /// The iteration budget ran out.
    Failed,
}

impl LoopState {
    /// Lowercase state name, as used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Thinking => "thinking",
            Self::Acting => "acting",
            Self::Observing => "observing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One thought/action/observation cycle.
///
/// `action` is `None` for a turn whose output could not be parsed; its
/// observation then carries the parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningStep {
    /// The model's reasoning.
    pub thought: String,
    /// Tool name the model chose.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Input passed to the tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_input: Option<String>,
    /// What the tool (or the parser) reported back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
}

impl ReasoningStep {
    /// Returns `true` if this step invoked (or tried to invoke) a tool.
    #[must_use]
    pub const fn is_action(&self) -> bool {
        self.action.is_some()
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    /// The model produced a final answer.
    Done,
    /// The iteration budget was exhausted; the answer is the fallback.
    Failed,
}

/// Result of one [`AgentExecutor::run`](super::AgentExecutor::run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRun {
    /// Final answer, or the fallback answer on [`RunOutcome::Failed`].
    pub answer: String,
    /// Steps taken before the answer.
    pub steps: Vec<ReasoningStep>,
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Iterations used.
    pub iterations: usize,
}

impl AgentRun {
    /// Number of tool invocations the model requested.
    #[must_use]
    pub fn tool_calls(&self) -> usize {
        self.steps.iter().filter(|s| s.is_action()).count()
    }

    /// Returns `true` if the model produced a final answer.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.outcome == RunOutcome::Done
    }
}

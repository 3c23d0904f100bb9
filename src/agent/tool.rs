//! Named tools the reasoning loop can invoke.
//!
//! A tool takes one string input and returns one string observation. The
//! registry is built once, handed to the executor behind an `Arc`, and never
//! mutated afterwards.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AgentError;

/// Upper bound on a single tool input.
const MAX_TOOL_INPUT_LEN: usize = 100_000;

/// Async tool implementation.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Runs the tool on `input`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when the tool fails. The loop turns the error
    /// into an observation rather than aborting.
    async fn invoke(&self, input: &str) -> Result<String, AgentError>;
}

/// Adapter for synchronous closures.
struct FnHandler<F> {
    name: String,
    f: F,
}

#[async_trait]
impl<F, E> ToolHandler for FnHandler<F>
where
    F: Fn(&str) -> Result<String, E> + Send + Sync,
    E: fmt::Display,
{
    async fn invoke(&self, input: &str) -> Result<String, AgentError> {
        (self.f)(input).map_err(|e| AgentError::ToolInvocation {
            name: self.name.clone(),
            message: e.to_string(),
        })
    }
}

/// A named capability with a description the model can read.
#[derive(Clone)]
pub struct Tool {
    name: String,
    description: String,
    handler: Arc<dyn ToolHandler>,
}

impl Tool {
    /// Creates a tool backed by an async handler.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            handler,
        }
    }

    /// Creates a tool from a synchronous closure.
    ///
    /// ```rust
    /// use ragloop::agent::Tool;
    ///
    /// let echo = Tool::from_fn("echo", "Repeats the input.", |input: &str| {
    ///     Ok::<_, std::convert::Infallible>(input.to_string())
    /// });
    /// assert_eq!(echo.name(), "echo");
    /// ```
    #[must_use]
    pub fn from_fn<F, E>(name: impl Into<String>, description: impl Into<String>, f: F) -> Self
    where
        F: Fn(&str) -> Result<String, E> + Send + Sync + 'static,
        E: fmt::Display + 'static,
    {
        let name = name.into();
        let handler = FnHandler {
            name: name.clone(),
            f,
        };
        Self {
            name,
            description: description.into(),
            handler: Arc::new(handler),
        }
    }

    /// Tool name as the model must write it after `Action:`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description shown in the prompt.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Runs the handler.
    ///
    /// # Errors
    ///
    /// Returns the handler's error.
    pub async fn invoke(&self, input: &str) -> Result<String, AgentError> {
        self.handler.invoke(input).await
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// A tool call chosen by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to invoke.
    pub name: String,
    /// Raw input string.
    pub input: String,
}

/// The observation produced by dispatching a [`ToolCall`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Observation text fed back to the model.
    pub content: String,
    /// Whether this result represents an error.
    pub is_error: bool,
}

impl ToolResult {
    fn ok(content: String) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    fn error(content: String) -> Self {
        Self {
            content,
            is_error: true,
        }
    }
}

/// Ordered set of uniquely named tools.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tool.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::DuplicateTool`] if the name is taken.
    pub fn register(&mut self, tool: Tool) -> Result<(), AgentError> {
        if self.get(tool.name()).is_some() {
            return Err(AgentError::DuplicateTool {
                name: tool.name,
            });
        }
        self.tools.push(tool);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::DuplicateTool`] if the name is taken.
    pub fn with_tool(mut self, tool: Tool) -> Result<Self, AgentError> {
        self.register(tool)?;
        Ok(self)
    }

    /// Looks up a tool by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Tool names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(Tool::name).collect()
    }

    /// One `name: description` line per tool, for the prompt.
    #[must_use]
    pub fn describe(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("{}: {}", t.name, t.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Runs a tool call and turns every outcome into an observation.
    ///
    /// Never fails: unknown tools, oversized inputs and handler errors all
    /// come back as error observations the model can react to.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.get(&call.name) else {
            warn!(tool = %call.name, "model chose an unknown tool");
            return ToolResult::error(format!(
                "{} is not a valid tool, try one of [{}].",
                call.name,
                self.names().join(", ")
            ));
        };

        if call.input.len() > MAX_TOOL_INPUT_LEN {
            return ToolResult::error(format!(
                "Error: input too large ({} bytes, max {MAX_TOOL_INPUT_LEN})",
                call.input.len()
            ));
        }

        debug!(tool = %call.name, input_len = call.input.len(), "invoking tool");
        match tool.invoke(&call.input).await {
            Ok(content) => ToolResult::ok(content),
            Err(e) => {
                warn!(tool = %call.name, error = %e, "tool failed");
                ToolResult::error(format!("Error: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ToolRegistry {
        ToolRegistry::new()
            .with_tool(Tool::from_fn("upper", "Uppercases text.", |s: &str| {
                Ok::<_, String>(s.to_uppercase())
            }))
            .and_then(|r| {
                r.with_tool(Tool::from_fn("fail", "Always fails.", |_: &str| {
                    Err::<String, _>("boom")
                }))
            })
            .unwrap_or_else(|e| panic!("registry failed: {e}"))
    }

    #[test]
    fn test_register_rejects_duplicate() {
        let mut registry = registry();
        let result = registry.register(Tool::from_fn("upper", "again", |s: &str| {
            Ok::<_, String>(s.to_string())
        }));
        assert!(matches!(
            result,
            Err(AgentError::DuplicateTool { ref name }) if name == "upper"
        ));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_names_and_describe() {
        let registry = registry();
        assert_eq!(registry.names(), vec!["upper", "fail"]);
        assert_eq!(
            registry.describe(),
            "upper: Uppercases text.\nfail: Always fails."
        );
    }

    #[tokio::test]
    async fn test_dispatch_known_tool() {
        let result = registry()
            .dispatch(&ToolCall {
                name: "upper".to_string(),
                input: "abc".to_string(),
            })
            .await;
        assert_eq!(result.content, "ABC");
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let result = registry()
            .dispatch(&ToolCall {
                name: "nope".to_string(),
                input: String::new(),
            })
            .await;
        assert!(result.is_error);
        assert_eq!(
            result.content,
            "nope is not a valid tool, try one of [upper, fail]."
        );
    }

    #[tokio::test]
    async fn test_dispatch_handler_error_becomes_observation() {
        let result = registry()
            .dispatch(&ToolCall {
                name: "fail".to_string(),
                input: "x".to_string(),
            })
            .await;
        assert!(result.is_error);
        assert_eq!(result.content, "Error: tool 'fail' failed: boom");
    }

    #[tokio::test]
    async fn test_dispatch_rejects_oversized_input() {
        let result = registry()
            .dispatch(&ToolCall {
                name: "upper".to_string(),
                input: "a".repeat(MAX_TOOL_INPUT_LEN + 1),
            })
            .await;
        assert!(result.is_error);
        assert!(result.content.contains("too large"));
    }
}

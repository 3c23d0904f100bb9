//! Prompt templates for the reasoning loop.
//!
//! The ReAct template is rendered with five placeholders: `{tools}`,
//! `{tool_names}`, `{chat_history}`, `{input}` and `{agent_scratchpad}`.
//! The correction template, used when a model turn cannot be parsed, takes
//! `{error}` and `{tool_names}`. Unknown placeholders are left as written.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use super::step::ReasoningStep;
use super::tool::ToolRegistry;

/// Default ReAct prompt.
pub const REACT_PROMPT: &str = r"You are a helpful assistant that answers questions about a collection of stored documents. You have access to tools to help answer questions.

Give crisp, clear and exact answers (1-2 sentences maximum). You can understand semantic meaning and draw conclusions from context.

TOOLS:
{tools}

TOOL NAMES: {tool_names}

Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question (keep it crisp and short, 1-2 sentences max)

Begin!

Chat History:
{chat_history}

Question: {input}
Thought: {agent_scratchpad}";

/// Default correction sent after an unparseable turn.
pub const CORRECTION_PROMPT: &str = "Invalid Format: {error}. Reply with a 'Thought:' line followed by either 'Action:' (one of [{tool_names}]) and 'Action Input:' lines, or a single 'Final Answer:' line.";

/// Default prompt directory under the user's home.
const DEFAULT_PROMPT_DIR: &str = ".config/ragloop/prompts";

/// Filename for the ReAct prompt template.
const REACT_FILENAME: &str = "react.md";
/// Filename for the correction prompt template.
const CORRECTION_FILENAME: &str = "correction.md";

/// Replaces `{name}` placeholders in one pass, so substituted values are
/// never re-expanded.
fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (close, *value))
        });
        if let Some((close, value)) = value {
            out.push_str(value);
            rest = &after[close + 1..];
        } else {
            out.push('{');
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

/// Renders previous steps as the continuation of the `Thought:` line.
#[must_use]
pub fn render_scratchpad(steps: &[ReasoningStep]) -> String {
    let mut pad = String::new();
    for step in steps {
        pad.push_str(step.thought.trim());
        if let Some(action) = &step.action {
            let _ = write!(pad, "\nAction: {action}");
            let _ = write!(
                pad,
                "\nAction Input: {}",
                step.action_input.as_deref().unwrap_or_default()
            );
        }
        if let Some(observation) = &step.observation {
            let _ = write!(pad, "\nObservation: {observation}");
        }
        pad.push_str("\nThought: ");
    }
    pad
}

/// The templates used by one executor.
///
/// Loaded from external template files when available, falling back to
/// compiled-in defaults. Use [`PromptSet::load`] to resolve the prompt
/// directory from CLI flags, environment variables, or the default path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// ReAct prompt template.
    pub react: String,
    /// Correction template appended after an unparseable turn.
    pub correction: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::defaults()
    }
}

impl PromptSet {
    /// Loads prompts from the given directory, falling back to compiled-in defaults.
    ///
    /// Resolution order for `prompt_dir`:
    /// 1. Explicit `prompt_dir` argument
    /// 2. `RAGLOOP_PROMPT_DIR` environment variable
    /// 3. `~/.config/ragloop/prompts/`
    ///
    /// Each file is loaded independently; a missing file uses its default.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir
            .map(PathBuf::from)
            .or_else(|| std::env::var("RAGLOOP_PROMPT_DIR").ok().map(PathBuf::from))
            .or_else(Self::default_dir);

        let load_file = |filename: &str, default: &str| -> String {
            resolved_dir
                .as_ref()
                .map(|dir| dir.join(filename))
                .and_then(|path| std::fs::read_to_string(&path).ok())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            react: load_file(REACT_FILENAME, REACT_PROMPT),
            correction: load_file(CORRECTION_FILENAME, CORRECTION_PROMPT),
        }
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            react: REACT_PROMPT.to_string(),
            correction: CORRECTION_PROMPT.to_string(),
        }
    }

    /// Writes the compiled-in default prompts to the given directory.
    ///
    /// Creates the directory if it does not exist. Existing files are
    /// **not** overwritten.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let templates = [
            (REACT_FILENAME, REACT_PROMPT),
            (CORRECTION_FILENAME, CORRECTION_PROMPT),
        ];

        let mut written = Vec::new();
        for (filename, content) in &templates {
            let path = dir.join(filename);
            if !path.exists() {
                std::fs::write(&path, content)?;
                written.push(path);
            }
        }

        Ok(written)
    }

    /// Returns the default prompt directory under the user's home.
    ///
    /// Returns `None` if the home directory cannot be determined.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }

    /// Renders the full prompt for the next model turn.
    #[must_use]
    pub fn render(
        &self,
        tools: &ToolRegistry,
        chat_history: &str,
        input: &str,
        steps: &[ReasoningStep],
    ) -> String {
        let tool_names = tools.names().join(", ");
        let descriptions = tools.describe();
        let scratchpad = render_scratchpad(steps);
        fill_template(
            &self.react,
            &[
                ("tools", descriptions.as_str()),
                ("tool_names", tool_names.as_str()),
                ("chat_history", chat_history),
                ("input", input),
                ("agent_scratchpad", scratchpad.as_str()),
            ],
        )
    }

    /// Renders the retry prompt: the failed turn, then the correction as an
    /// observation, then a fresh `Thought:`.
    #[must_use]
    pub fn render_retry(
        &self,
        prompt: &str,
        failed_output: &str,
        error: &str,
        tools: &ToolRegistry,
    ) -> String {
        let tool_names = tools.names().join(", ");
        let correction = fill_template(
            &self.correction,
            &[("error", error), ("tool_names", tool_names.as_str())],
        );
        format!(
            "{prompt}{}\nObservation: {correction}\nThought: ",
            failed_output.trim()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tool::Tool;

    fn tools() -> ToolRegistry {
        ToolRegistry::new()
            .with_tool(Tool::from_fn("search_database", "Searches documents.", |s: &str| {
                Ok::<_, String>(s.to_string())
            }))
            .unwrap_or_else(|e| panic!("registry failed: {e}"))
    }

    #[test]
    fn test_fill_template_single_pass() {
        let out = fill_template("Q: {input} {unknown} {", &[("input", "{input}")]);
        assert_eq!(out, "Q: {input} {unknown} {");
    }

    #[test]
    fn test_render_includes_all_parts() {
        let prompt = PromptSet::defaults().render(
            &tools(),
            "Human: hi\nAI: hello",
            "What changed?",
            &[],
        );
        assert!(prompt.contains("search_database: Searches documents."));
        assert!(prompt.contains("one of [search_database]"));
        assert!(prompt.contains("Human: hi\nAI: hello"));
        assert!(prompt.ends_with("Question: What changed?\nThought: "));
    }

    #[test]
    fn test_render_scratchpad() {
        let steps = vec![ReasoningStep {
            thought: "I should search".to_string(),
            action: Some("search_database".to_string()),
            action_input: Some("pricing".to_string()),
            observation: Some("Document 1: ...".to_string()),
        }];
        assert_eq!(
            render_scratchpad(&steps),
            "I should search\nAction: search_database\nAction Input: pricing\nObservation: Document 1: ...\nThought: "
        );
    }

    #[test]
    fn test_render_retry_appends_correction() {
        let prompts = PromptSet::defaults();
        let retry = prompts.render_retry("PROMPT ", "gibberish\n", "Missing 'Action:'", &tools());
        assert!(retry.starts_with("PROMPT gibberish\nObservation: Invalid Format: Missing 'Action:'."));
        assert!(retry.contains("[search_database]"));
        assert!(retry.ends_with("\nThought: "));
    }

    #[test]
    fn test_load_falls_back_per_file() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
        std::fs::write(dir.path().join(REACT_FILENAME), "custom {input}")
            .unwrap_or_else(|e| panic!("write failed: {e}"));
        let prompts = PromptSet::load(Some(dir.path()));
        assert_eq!(prompts.react, "custom {input}");
        assert_eq!(prompts.correction, CORRECTION_PROMPT);
    }

    #[test]
    fn test_write_defaults_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
        let first = PromptSet::write_defaults(dir.path()).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(first.len(), 2);
        let second = PromptSet::write_defaults(dir.path()).unwrap_or_else(|e| panic!("{e}"));
        assert!(second.is_empty());
    }
}

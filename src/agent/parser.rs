//! Step grammar for model output.
//!
//! Each model turn is expected to contain either
//!
//! ```text
//! Thought: <reasoning>
//! Action: <tool name>
//! Action Input: <input>
//! ```
//!
//! or
//!
//! ```text
//! Thought: I now know the final answer
//! Final Answer: <answer>
//! ```
//!
//! Prefixes match case-insensitively at the start of a line, tolerate
//! markdown bold (`**Action:**`) and `Action_Input` / `Action-Input`.
//! Text before the first prefix is the thought, since prompts end with
//! `Thought:` and the model continues from there. Anything from an
//! `Observation:` line on is ignored.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::AgentError;

#[allow(clippy::expect_used)]
static STEP_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*\**[ \t]*(thought|action[ \t_-]*input|action|final[ \t_-]*answer|observation)[ \t]*\**[ \t]*:[ \t]*\**",
    )
    .expect("step prefix pattern is valid")
});

/// A successfully parsed model turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedStep {
    /// The model wants to call a tool.
    Action {
        /// Reasoning preceding the call.
        thought: String,
        /// Tool name.
        tool: String,
        /// Tool input.
        input: String,
    },
    /// The model committed to an answer.
    Final {
        /// Reasoning preceding the answer.
        thought: String,
        /// Answer text.
        answer: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prefix {
    Thought,
    Action,
    ActionInput,
    FinalAnswer,
    Observation,
}

impl Prefix {
    fn from_label(label: &str) -> Self {
        let normalized: String = label
            .chars()
            .filter(char::is_ascii_alphabetic)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "thought" => Self::Thought,
            "actioninput" => Self::ActionInput,
            "action" => Self::Action,
            "finalanswer" => Self::FinalAnswer,
            _ => Self::Observation,
        }
    }
}

#[derive(Debug, Default)]
struct Sections<'t> {
    preamble: &'t str,
    thought: Option<&'t str>,
    action: Option<&'t str>,
    action_input: Option<&'t str>,
    final_answer: Option<&'t str>,
}

fn sections(text: &str) -> Sections<'_> {
    let markers: Vec<(Prefix, usize, usize)> = STEP_PREFIX
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let label = caps.get(1)?;
            Some((Prefix::from_label(label.as_str()), whole.start(), whole.end()))
        })
        .collect();

    let mut out = Sections {
        preamble: markers.first().map_or(text, |&(_, start, _)| &text[..start]).trim(),
        ..Sections::default()
    };

    for (i, &(prefix, _, value_start)) in markers.iter().enumerate() {
        if prefix == Prefix::Observation {
            break;
        }
        let value_end = markers.get(i + 1).map_or(text.len(), |&(_, start, _)| start);
        let value = text[value_start..value_end].trim();
        let slot = match prefix {
            Prefix::Thought => &mut out.thought,
            Prefix::Action => &mut out.action,
            Prefix::ActionInput => &mut out.action_input,
            Prefix::FinalAnswer => &mut out.final_answer,
            Prefix::Observation => continue,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    out
}

fn parse_error(message: &str) -> AgentError {
    AgentError::Parse {
        message: message.to_string(),
    }
}

fn clean_tool_name(raw: &str) -> String {
    raw.lines()
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches(|c| matches!(c, '`' | '"' | '\'' | '*' | '[' | ']'))
        .trim()
        .to_string()
}

fn clean_input(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}

/// Parses one model turn.
///
/// # Errors
///
/// Returns [`AgentError::Parse`] when the output has both an action and a
/// final answer, an action without input, or neither.
pub fn parse_step(text: &str) -> Result<ParsedStep, AgentError> {
    let sections = sections(text);
    let thought = sections.thought.unwrap_or(sections.preamble).to_string();

    match (sections.action, sections.final_answer) {
        (Some(_), Some(_)) => Err(parse_error(
            "output contains both a final answer and a parse-able action",
        )),
        (None, Some(answer)) => {
            if answer.is_empty() {
                return Err(parse_error("Missing text after 'Final Answer:'"));
            }
            Ok(ParsedStep::Final {
                thought,
                answer: answer.to_string(),
            })
        }
        (Some(action), None) => {
            let tool = clean_tool_name(action);
            if tool.is_empty() {
                return Err(parse_error("Missing tool name after 'Action:'"));
            }
            let input = sections
                .action_input
                .ok_or_else(|| parse_error("Missing 'Action Input:' after 'Action:'"))?;
            Ok(ParsedStep::Action {
                thought,
                tool,
                input: clean_input(input),
            })
        }
        (None, None) => Err(parse_error("Missing 'Action:' after 'Thought:'")),
    }
}

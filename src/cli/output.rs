//! Output formatting for CLI commands.

use std::fmt::Write;

use serde::Serialize;

use crate::agent::{AgentRun, RunOutcome};
use crate::chunking::{ChunkStats, Segment};

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON document.
    Json,
    /// One JSON object per line.
    Ndjson,
}

impl OutputFormat {
    /// Parses a format name. Unknown names fall back to text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "ndjson" | "jsonl" => Self::Ndjson,
            _ => Self::Text,
        }
    }

    /// Serializes `value` for this format. Pretty for JSON, compact
    /// otherwise.
    #[must_use]
    pub fn to_json<T: Serialize + ?Sized>(self, value: &T) -> String {
        let rendered = match self {
            Self::Json => serde_json::to_string_pretty(value),
            Self::Text | Self::Ndjson => serde_json::to_string(value),
        };
        rendered.unwrap_or_else(|e| format!("{{\"error\":\"serialization failed: {e}\"}}"))
    }
}

/// Formats segments.
#[must_use]
pub fn format_segments(segments: &[Segment], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            for segment in segments {
                let _ = writeln!(
                    out,
                    "--- segment {}/{} [{}..{}] ({} chars) ---",
                    segment.index + 1,
                    segment.total,
                    segment.start,
                    segment.end,
                    segment.size
                );
                out.push_str(&segment.text);
                if !segment.text.ends_with('\n') {
                    out.push('\n');
                }
            }
            out
        }
        OutputFormat::Json => format.to_json(segments),
        OutputFormat::Ndjson => {
            let mut out = String::new();
            for segment in segments {
                out.push_str(&format.to_json(segment));
                out.push('\n');
            }
            out
        }
    }
}

/// Formats chunk statistics.
#[must_use]
pub fn format_stats(stats: &ChunkStats, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!(
            "Chunks: {}\nTotal characters: {}\nAverage size: {}\nMin size: {}\nMax size: {}\n",
            stats.total_chunks,
            stats.total_characters,
            stats.avg_chunk_size,
            stats.min_chunk_size,
            stats.max_chunk_size
        ),
        OutputFormat::Json | OutputFormat::Ndjson => {
            let mut out = format.to_json(stats);
            out.push('\n');
            out
        }
    }
}

/// Formats an agent run. In text mode `verbose` adds the reasoning steps.
#[must_use]
pub fn format_run(run: &AgentRun, format: OutputFormat, verbose: bool) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            if verbose {
                for (i, step) in run.steps.iter().enumerate() {
                    let _ = writeln!(out, "[step {}] Thought: {}", i + 1, step.thought);
                    if let Some(action) = &step.action {
                        let _ = writeln!(
                            out,
                            "[step {}] Action: {action}({})",
                            i + 1,
                            step.action_input.as_deref().unwrap_or_default()
                        );
                    }
                    if let Some(observation) = &step.observation {
                        let _ = writeln!(out, "[step {}] Observation: {observation}", i + 1);
                    }
                }
                if !run.steps.is_empty() {
                    out.push('\n');
                }
            }
            out.push_str(&run.answer);
            out.push('\n');
            if verbose || run.outcome == RunOutcome::Failed {
                let _ = writeln!(
                    out,
                    "\n---\nOutcome: {} | Iterations: {} | Tool calls: {}",
                    match run.outcome {
                        RunOutcome::Done => "done",
                        RunOutcome::Failed => "failed",
                    },
                    run.iterations,
                    run.tool_calls()
                );
            }
            out
        }
        OutputFormat::Json | OutputFormat::Ndjson => {
            let mut out = format.to_json(run);
            out.push('\n');
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ReasoningStep;
    use crate::chunking::{Metadata, to_segments};

    #[test]
    fn test_parse() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("NDJSON"), OutputFormat::Ndjson);
        assert_eq!(OutputFormat::parse("whatever"), OutputFormat::Text);
    }

    #[test]
    fn test_format_segments_ndjson_one_per_line() {
        let segments = to_segments("aaaa bbbb cccc", 5, 0, Metadata::new())
            .unwrap_or_else(|e| panic!("segment failed: {e}"));
        let out = format_segments(&segments, OutputFormat::Ndjson);
        assert_eq!(out.lines().count(), segments.len());
        for line in out.lines() {
            let value: serde_json::Value =
                serde_json::from_str(line).unwrap_or_else(|e| panic!("bad json: {e}"));
            assert!(value.get("index").is_some());
        }
    }

    #[test]
    fn test_format_segments_text_header() {
        let segments = to_segments("hello", 10, 0, Metadata::new())
            .unwrap_or_else(|e| panic!("segment failed: {e}"));
        let out = format_segments(&segments, OutputFormat::Text);
        assert_eq!(out, "--- segment 1/1 [0..5] (5 chars) ---\nhello\n");
    }

    #[test]
    fn test_format_run_text() {
        let run = AgentRun {
            answer: "It is 42.".to_string(),
            steps: vec![ReasoningStep {
                thought: "look it up".to_string(),
                action: Some("search_database".to_string()),
                action_input: Some("answer".to_string()),
                observation: Some("Document 1: 42".to_string()),
            }],
            outcome: RunOutcome::Done,
            iterations: 2,
        };
        assert_eq!(format_run(&run, OutputFormat::Text, false), "It is 42.\n");
        let verbose = format_run(&run, OutputFormat::Text, true);
        assert!(verbose.contains("[step 1] Action: search_database(answer)"));
        assert!(verbose.contains("Tool calls: 1"));
    }
}

//! Document retrieval exposed as a tool.
//!
//! [`retrieval_tool`] wraps any [`Retriever`] into the `search_database`
//! tool. Results are rendered as numbered `Document n:` blocks; long texts
//! are truncated so one observation cannot flood the prompt.

use std::fmt::Write;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::tool::{Tool, ToolHandler};
use crate::chunking::Metadata;
use crate::error::AgentError;

/// Name of the retrieval tool.
pub const SEARCH_TOOL_NAME: &str = "search_database";

/// Description shown to the model.
pub const SEARCH_TOOL_DESCRIPTION: &str = "Search the database for relevant documents and past conversations. Use this when the user asks about specific information from uploaded documents.";

/// Characters of document text kept per result.
pub const MAX_DOCUMENT_CHARS: usize = 2000;

/// Observation returned when the search finds nothing.
pub const NO_RESULTS: &str = "No relevant documents found in the database.";

/// Metadata key holding a structured analysis of the document.
///
/// The value is an object (or a JSON string encoding one) with an optional
/// `summary` (`{overview, sentiment}` or plain text) and optional lists
/// `requirements`, `key_points`, `action_items` and `recommendations`.
pub const ANALYSIS_KEY: &str = "analysis";

/// Analysis lists rendered per document: key, label, items kept.
const ANALYSIS_LISTS: [(&str, &str, usize); 4] = [
    ("requirements", "Requirements", 3),
    ("key_points", "Key Points", 5),
    ("action_items", "Action Items", 3),
    ("recommendations", "Recommendations", 2),
];

/// A document returned by a [`Retriever`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// Stable identifier.
    pub id: String,
    /// Document text.
    pub text: String,
    /// Relevance score; higher is better.
    pub score: f64,
    /// Provenance carried from ingestion.
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

/// Similarity search over stored documents.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Returns up to `top_k` documents relevant to `query`, best first.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] if the backing store fails.
    async fn search(&self, query: &str, top_k: usize)
    -> Result<Vec<RetrievedDocument>, AgentError>;
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Formats search results as the tool observation.
#[must_use]
pub fn format_documents(documents: &[RetrievedDocument]) -> String {
    if documents.is_empty() {
        return NO_RESULTS.to_string();
    }

    let mut out = String::new();
    for (i, doc) in documents.iter().enumerate() {
        let _ = writeln!(out, "Document {}:", i + 1);
        let _ = writeln!(out, "Content: {}", truncate_chars(&doc.text, MAX_DOCUMENT_CHARS));
        if let Some(analysis) = doc.metadata.get(ANALYSIS_KEY) {
            write_analysis(&mut out, analysis);
        }
        for (key, value) in doc.metadata.iter().filter(|(k, _)| *k != ANALYSIS_KEY) {
            match value {
                Value::String(s) => {
                    let _ = writeln!(out, "{key}: {s}");
                }
                other => {
                    let _ = writeln!(out, "{key}: {other}");
                }
            }
        }
        out.push('\n');
    }
    out.truncate(out.trim_end().len());
    out
}

/// Renders an analysis entry as labelled lines. Malformed entries are skipped.
fn write_analysis(out: &mut String, analysis: &Value) {
    let decoded: Value;
    let analysis = match analysis {
        Value::String(encoded) => {
            decoded = serde_json::from_str(encoded).unwrap_or(Value::Null);
            &decoded
        }
        other => other,
    };
    let Some(fields) = analysis.as_object() else {
        return;
    };

    match fields.get("summary") {
        Some(Value::Object(summary)) => {
            let overview = summary
                .get("overview")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let _ = writeln!(out, "Summary: {overview}");
            if let Some(sentiment) = summary
                .get("sentiment")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
            {
                let _ = writeln!(out, "Sentiment: {sentiment}");
            }
        }
        Some(Value::String(overview)) => {
            let _ = writeln!(out, "Summary: {overview}");
        }
        _ => {}
    }

    for (key, label, keep) in ANALYSIS_LISTS {
        if let Some(Value::Array(items)) = fields.get(key) {
            let kept = Value::Array(items.iter().take(keep).cloned().collect());
            let _ = writeln!(out, "{label}: {kept}");
        }
    }
}

struct RetrievalHandler {
    retriever: Arc<dyn Retriever>,
    top_k: usize,
}

#[async_trait]
impl ToolHandler for RetrievalHandler {
    async fn invoke(&self, input: &str) -> Result<String, AgentError> {
        let query = input.trim();
        let documents = self
            .retriever
            .search(query, self.top_k)
            .await
            .map_err(|e| AgentError::ToolInvocation {
                name: SEARCH_TOOL_NAME.to_string(),
                message: e.to_string(),
            })?;
        debug!(query, results = documents.len(), "retrieval finished");
        Ok(format_documents(&documents))
    }
}

/// Builds the `search_database` tool over `retriever`.
#[must_use]
pub fn retrieval_tool(retriever: Arc<dyn Retriever>, top_k: usize) -> Tool {
    Tool::new(
        SEARCH_TOOL_NAME,
        SEARCH_TOOL_DESCRIPTION,
        Arc::new(RetrievalHandler {
            retriever,
            top_k: top_k.max(1),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRetriever(Vec<RetrievedDocument>);

    #[async_trait]
    impl Retriever for FixedRetriever {
        async fn search(
            &self,
            _query: &str,
            top_k: usize,
        ) -> Result<Vec<RetrievedDocument>, AgentError> {
            Ok(self.0.iter().take(top_k).cloned().collect())
        }
    }

    struct BrokenRetriever;

    #[async_trait]
    impl Retriever for BrokenRetriever {
        async fn search(
            &self,
            _query: &str,
            _top_k: usize,
        ) -> Result<Vec<RetrievedDocument>, AgentError> {
            Err(AgentError::ApiRequest {
                message: "index offline".to_string(),
                status: Some(503),
            })
        }
    }

    fn doc(id: &str, text: &str) -> RetrievedDocument {
        RetrievedDocument {
            id: id.to_string(),
            text: text.to_string(),
            score: 1.0,
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format_documents(&[]), NO_RESULTS);
    }

    #[test]
    fn test_format_numbers_and_metadata() {
        let mut first = doc("a#0", "Pricing starts at $10.");
        first
            .metadata
            .insert("source".to_string(), serde_json::json!("call.txt"));
        let out = format_documents(&[first, doc("b#0", "Second.")]);
        assert_eq!(
            out,
            "Document 1:\nContent: Pricing starts at $10.\nsource: call.txt\n\nDocument 2:\nContent: Second."
        );
    }

    #[test]
    fn test_format_renders_analysis_with_caps() {
        let mut first = doc("call#0", "We need SSO.");
        first.metadata.insert(
            ANALYSIS_KEY.to_string(),
            serde_json::json!({
                "summary": {"overview": "Renewal call", "sentiment": "positive"},
                "requirements": ["sso", "audit", "sla", "dpa"],
                "key_points": ["a", "b", "c", "d", "e", "f"],
                "action_items": ["send quote"],
                "recommendations": ["upsell", "pilot", "discount"]
            }),
        );
        first
            .metadata
            .insert("source".to_string(), serde_json::json!("call.txt"));

        let out = format_documents(&[first]);
        assert_eq!(
            out,
            "Document 1:\n\
             Content: We need SSO.\n\
             Summary: Renewal call\n\
             Sentiment: positive\n\
             Requirements: [\"sso\",\"audit\",\"sla\"]\n\
             Key Points: [\"a\",\"b\",\"c\",\"d\",\"e\"]\n\
             Action Items: [\"send quote\"]\n\
             Recommendations: [\"upsell\",\"pilot\"]\n\
             source: call.txt"
        );
    }

    #[test]
    fn test_format_decodes_string_analysis() {
        let mut first = doc("call#0", "Hi.");
        first.metadata.insert(
            ANALYSIS_KEY.to_string(),
            serde_json::json!(r#"{"summary": {"overview": "Short call", "sentiment": ""}}"#),
        );
        let out = format_documents(&[first]);
        assert!(out.ends_with("Summary: Short call"));
        assert!(!out.contains("Sentiment:"));
    }

    #[test]
    fn test_format_skips_malformed_analysis() {
        let mut first = doc("call#0", "Hi.");
        first
            .metadata
            .insert(ANALYSIS_KEY.to_string(), serde_json::json!("not json"));
        assert_eq!(format_documents(&[first]), "Document 1:\nContent: Hi.");
    }

    #[test]
    fn test_format_truncates_long_text() {
        let long = "x".repeat(MAX_DOCUMENT_CHARS + 50);
        let out = format_documents(&[doc("a", &long)]);
        let expected = format!("Content: {}...", "x".repeat(MAX_DOCUMENT_CHARS));
        assert!(out.contains(&expected));
    }

    #[tokio::test]
    async fn test_tool_respects_top_k() {
        let retriever = Arc::new(FixedRetriever(vec![
            doc("1", "one"),
            doc("2", "two"),
            doc("3", "three"),
        ]));
        let tool = retrieval_tool(retriever, 2);
        assert_eq!(tool.name(), SEARCH_TOOL_NAME);
        let out = tool
            .invoke("numbers")
            .await
            .unwrap_or_else(|e| panic!("invoke failed: {e}"));
        assert!(out.contains("Document 2:"));
        assert!(!out.contains("Document 3:"));
    }

    #[tokio::test]
    async fn test_tool_wraps_retriever_error() {
        let tool = retrieval_tool(Arc::new(BrokenRetriever), 3);
        let result = tool.invoke("anything").await;
        assert!(matches!(
            result,
            Err(AgentError::ToolInvocation { ref name, ref message })
                if name == SEARCH_TOOL_NAME && message.contains("index offline")
        ));
    }
}

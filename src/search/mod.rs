//! In-memory keyword retrieval over segments.
//!
//! Documents are segmented with the recursive strategy and each segment is
//! indexed by its set of lowercased Unicode words. A query scores a segment
//! by the fraction of distinct query words the segment contains. Ties keep
//! ingestion order.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use unicode_segmentation::UnicodeSegmentation;

use crate::agent::{RetrievedDocument, Retriever};
use crate::chunking::{self, ChunkOptions, ChunkStrategy, Metadata};
use crate::error::{AgentError, ChunkingError};

fn terms(text: &str) -> HashSet<String> {
    text.unicode_words()
        .filter(|w| w.chars().count() > 1)
        .map(str::to_lowercase)
        .collect()
}

#[derive(Debug, Clone)]
struct IndexedSegment {
    id: String,
    text: String,
    terms: HashSet<String>,
    metadata: Arc<Metadata>,
}

impl IndexedSegment {
    fn to_document(&self, score: f64) -> RetrievedDocument {
        RetrievedDocument {
            id: self.id.clone(),
            text: self.text.clone(),
            score,
            metadata: (*self.metadata).clone(),
        }
    }
}

/// Term-overlap index. Not persistent.
#[derive(Debug, Clone)]
pub struct KeywordIndex {
    options: ChunkOptions,
    segments: Vec<IndexedSegment>,
}

impl Default for KeywordIndex {
    fn default() -> Self {
        Self::new(ChunkOptions::default())
    }
}

impl KeywordIndex {
    /// Creates an empty index that segments documents with `options`.
    #[must_use]
    pub const fn new(options: ChunkOptions) -> Self {
        Self {
            options,
            segments: Vec::new(),
        }
    }

    /// Segments and indexes one document. Each segment gets the id
    /// `"{source}#{index}"` and the metadata `source` plus `options.metadata`.
    ///
    /// Returns the number of segments added.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkingError`] if the index's chunk options are invalid.
    pub fn add_document(&mut self, source: &str, text: &str) -> Result<usize, ChunkingError> {
        self.add_document_with_metadata(source, text, Metadata::new())
    }

    /// Like [`add_document`](Self::add_document), with extra metadata for
    /// this document only. An [`ANALYSIS_KEY`](crate::agent::ANALYSIS_KEY)
    /// entry is rendered by the retrieval tool.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkingError`] if the index's chunk options are invalid.
    pub fn add_document_with_metadata(
        &mut self,
        source: &str,
        text: &str,
        extra: Metadata,
    ) -> Result<usize, ChunkingError> {
        let mut metadata = self.options.metadata.clone();
        metadata.extend(extra);
        metadata.insert("source".to_string(), serde_json::json!(source));
        let options = self.options.clone().with_metadata(metadata);

        let segments = chunking::chunk(text, ChunkStrategy::Recursive, &options)?;
        let added = segments.len();
        self.segments
            .extend(segments.into_iter().map(|segment| IndexedSegment {
                id: format!("{source}#{}", segment.index),
                terms: terms(&segment.text),
                text: segment.text,
                metadata: segment.metadata,
            }));

        info!(source, segments = added, "indexed document");
        Ok(added)
    }

    /// The segment stored under `id`, if any.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<RetrievedDocument> {
        self.segments
            .iter()
            .find(|segment| segment.id == id)
            .map(|segment| segment.to_document(1.0))
    }

    /// Number of indexed segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Best `top_k` segments for `query`. Segments sharing no word with the
    /// query are never returned.
    #[must_use]
    pub fn search_terms(&self, query: &str, top_k: usize) -> Vec<RetrievedDocument> {
        let query_terms = terms(query);
        if query_terms.is_empty() || top_k == 0 {
            return Vec::new();
        }

        #[allow(clippy::cast_precision_loss)]
        let query_len = query_terms.len() as f64;

        let mut scored: Vec<(f64, &IndexedSegment)> = self
            .segments
            .iter()
            .filter_map(|segment| {
                let hits = query_terms.intersection(&segment.terms).count();
                #[allow(clippy::cast_precision_loss)]
                let score = hits as f64 / query_len;
                (hits > 0).then_some((score, segment))
            })
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(top_k);

        debug!(query, candidates = self.segments.len(), hits = scored.len(), "keyword search");

        scored
            .into_iter()
            .map(|(score, segment)| segment.to_document(score))
            .collect()
    }
}

#[async_trait]
impl Retriever for KeywordIndex {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedDocument>, AgentError> {
        Ok(self.search_terms(query, top_k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{ANALYSIS_KEY, format_documents};

    fn index() -> KeywordIndex {
        let mut index = KeywordIndex::new(ChunkOptions::default().with_size(60, 0));
        index
            .add_document(
                "pricing.txt",
                "The enterprise plan costs forty dollars per seat.\n\nDiscounts apply to annual contracts.",
            )
            .unwrap_or_else(|e| panic!("add failed: {e}"));
        index
            .add_document("support.txt", "Support is available around the clock by email.")
            .unwrap_or_else(|e| panic!("add failed: {e}"));
        index
    }

    #[test]
    fn test_add_document_counts_segments() {
        let index = index();
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_search_ranks_by_overlap() {
        let results = index().search_terms("annual contracts discounts", 2);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "pricing.txt#1");
        assert!((results[0].score - 1.0).abs() < f64::EPSILON);
        assert_eq!(
            results[0].metadata.get("source"),
            Some(&serde_json::json!("pricing.txt"))
        );
    }

    #[test]
    fn test_search_no_match() {
        assert!(index().search_terms("kubernetes", 3).is_empty());
        assert!(index().search_terms("", 3).is_empty());
    }

    #[test]
    fn test_search_case_insensitive() {
        let results = index().search_terms("SUPPORT EMAIL", 3);
        assert_eq!(results[0].id, "support.txt#0");
    }

    #[test]
    fn test_get_by_id() {
        let index = index();
        let doc = index
            .get("pricing.txt#1")
            .unwrap_or_else(|| panic!("segment missing"));
        assert!(doc.text.starts_with("Discounts"));
        assert!(index.get("pricing.txt#9").is_none());
        assert!(index.get("unknown").is_none());
    }

    #[test]
    fn test_document_metadata_reaches_observation() {
        let mut index = KeywordIndex::default();
        let mut extra = Metadata::new();
        extra.insert(
            ANALYSIS_KEY.to_string(),
            serde_json::json!({"summary": {"overview": "Renewal call", "sentiment": "neutral"}}),
        );
        extra.insert("source".to_string(), serde_json::json!("ignored"));
        index
            .add_document_with_metadata("call.txt", "Renewal is due in March.", extra)
            .unwrap_or_else(|e| panic!("add failed: {e}"));
        index
            .add_document("plain.txt", "Renewal terms are standard.")
            .unwrap_or_else(|e| panic!("add failed: {e}"));

        let results = index.search_terms("renewal", 2);
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].metadata.get("source"),
            Some(&serde_json::json!("call.txt"))
        );
        assert!(results[1].metadata.get(ANALYSIS_KEY).is_none());

        let observation = format_documents(&results);
        assert!(observation.contains("Summary: Renewal call\nSentiment: neutral"));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let mut index = KeywordIndex::new(ChunkOptions::default().with_size(10, 10));
        assert!(index.add_document("a", "text").is_err());
    }

    #[tokio::test]
    async fn test_retriever_impl() {
        let results = index()
            .search("enterprise seat", 1)
            .await
            .unwrap_or_else(|e| panic!("search failed: {e}"));
        assert_eq!(results[0].id, "pricing.txt#0");
    }
}

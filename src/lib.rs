//! # ragloop
//!
//! Retrieval-augmented question answering over local documents.
//!
//! Two pieces work together:
//!
//! - [`chunking`] turns long documents into bounded, overlapping,
//!   order-preserving [`Segment`]s (recursive, character and token
//!   strategies).
//! - [`agent`] runs a bounded ReAct loop: a model alternates between
//!   thinking, calling tools (usually `search_database` over the segments)
//!   and observing results until it gives a final answer or runs out of
//!   iterations.
//!
//! ## Example
//!
//! ```rust
//! use ragloop::chunking::{Metadata, to_segments};
//!
//! let text = "First paragraph.\n\nSecond paragraph, a little longer.";
//! let segments = to_segments(text, 24, 4, Metadata::new())?;
//! assert!(segments.iter().all(|s| s.size <= 24));
//! assert_eq!(segments.last().map(|s| s.index + 1), Some(segments.len()));
//! # Ok::<(), ragloop::ChunkingError>(())
//! ```

pub mod agent;
pub mod chunking;
pub mod cli;
pub mod error;
pub mod search;

pub use agent::{
    AgentConfig, AgentExecutor, AgentRun, ChatSession, ConversationMemory, LlmProvider,
    RunOutcome, Tool, ToolRegistry,
};
pub use chunking::{ChunkOptions, ChunkStats, ChunkStrategy, Chunker, Segment, chunk};
pub use error::{AgentError, ChunkingError, CommandError, Error, Result};
pub use search::KeywordIndex;

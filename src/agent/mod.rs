//! Retrieval-augmented question answering with a bounded ReAct loop.
//!
//! # Architecture
//!
//! ```text
//! question + ChatSession
//!   └── AgentExecutor::run
//!       ├── PromptSet::render (tools, memory transcript, scratchpad)
//!       ├── LlmProvider::complete (stop at "\nObservation:")
//!       ├── parse_step → Action | Final Answer
//!       ├── ToolRegistry::dispatch → observation
//!       └── ConversationMemory::record_turn (once, at the end)
//! ```
//!
//! The `search_database` tool built by [`retrieval_tool`] is the usual
//! entry point to stored documents; any [`Retriever`] can back it.

pub mod client;
pub mod config;
pub mod executor;
pub mod memory;
pub mod message;
pub mod parser;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod retrieval;
pub mod step;
pub mod tool;

// Re-export key types
pub use client::create_provider;
pub use config::{AgentConfig, AgentConfigBuilder};
pub use executor::AgentExecutor;
pub use memory::{ChatSession, ConversationMemory, MemoryEntry, Role};
pub use message::{CompletionRequest, OBSERVATION_STOP};
pub use parser::{ParsedStep, parse_step};
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use retrieval::{
    ANALYSIS_KEY, RetrievedDocument, Retriever, SEARCH_TOOL_NAME, format_documents, retrieval_tool,
};
pub use step::{AgentRun, FALLBACK_ANSWER, LoopState, ReasoningStep, RunOutcome};
pub use tool::{Tool, ToolCall, ToolHandler, ToolRegistry, ToolResult};

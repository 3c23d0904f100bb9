//! Conversation memory and per-conversation sessions.
//!
//! Memory is an append-only log of user and assistant turns, rendered into
//! the prompt as `Human:` / `AI:` lines. A [`ChatSession`] owns one memory
//! and is passed to every run of the same conversation.

use serde::{Deserialize, Serialize};

/// Who produced a memory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking questions.
    User,
    /// The agent.
    Assistant,
}

impl Role {
    /// Transcript label for this role.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "Human",
            Self::Assistant => "AI",
        }
    }
}

/// One message in the conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Message author.
    pub role: Role,
    /// Message text.
    pub content: String,
}

/// Chronological conversation log with an optional retention window.
///
/// With a window of `n` turns, at most `2 * n` entries are kept and the
/// oldest are dropped first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMemory {
    entries: Vec<MemoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_turns: Option<usize>,
}

impl ConversationMemory {
    /// Creates an unbounded memory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a memory that keeps the last `max_turns` turns. Zero is
    /// treated as one.
    #[must_use]
    pub fn with_window(max_turns: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_turns: Some(max_turns.max(1)),
        }
    }

    /// Appends one entry.
    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.entries.push(MemoryEntry {
            role,
            content: content.into(),
        });
        self.enforce_window();
    }

    /// Appends a user message followed by the assistant reply.
    pub fn record_turn(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.append(Role::User, user);
        self.append(Role::Assistant, assistant);
    }

    /// Entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    /// Renders the log as `Human: ...` / `AI: ...` lines.
    #[must_use]
    pub fn transcript(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}: {}", e.role.label(), e.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Forgets everything. The window setting is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured retention window in turns.
    #[must_use]
    pub const fn max_turns(&self) -> Option<usize> {
        self.max_turns
    }

    fn enforce_window(&mut self) {
        let Some(max_turns) = self.max_turns else {
            return;
        };
        let limit = max_turns.max(1).saturating_mul(2);
        if self.entries.len() > limit {
            let excess = self.entries.len() - limit;
            self.entries.drain(..excess);
        }
    }
}

/// State of one conversation: an identifier and its memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Caller-chosen conversation identifier.
    pub id: String,
    /// Conversation history.
    pub memory: ConversationMemory,
}

impl ChatSession {
    /// Creates a session with unbounded memory.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            memory: ConversationMemory::new(),
        }
    }

    /// Creates a session with the given memory.
    #[must_use]
    pub fn with_memory(id: impl Into<String>, memory: ConversationMemory) -> Self {
        Self {
            id: id.into(),
            memory,
        }
    }
}

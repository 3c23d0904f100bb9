//! Error types for ragloop.
//!
//! Errors are split by layer: segmentation configuration, the agent
//! runtime, and CLI command handling. [`Error`] unifies them for callers
//! that do not care which layer failed.

use thiserror::Error;

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Segmentation parameters were rejected.
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    /// Agent runtime failure.
    #[error("agent error: {0}")]
    Agent(#[from] AgentError),

    /// CLI command failure.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid segmentation configuration.
///
/// Raised at call time, before any text is processed. Parameters are never
/// silently corrected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkingError {
    /// Maximum segment size must be positive.
    #[error("invalid chunk size: {size} (must be > 0)")]
    InvalidChunkSize {
        /// The rejected size.
        size: usize,
    },

    /// Overlap must be strictly smaller than the maximum segment size.
    #[error("overlap {overlap} must be smaller than chunk size {size}")]
    OverlapTooLarge {
        /// The maximum segment size.
        size: usize,
        /// The rejected overlap.
        overlap: usize,
    },
}

/// Errors raised by the agent runtime.
#[derive(Error, Debug)]
pub enum AgentError {
    /// No API key was configured for the provider.
    #[error("API key missing: set OPENAI_API_KEY or RAGLOOP_API_KEY")]
    ApiKeyMissing,

    /// The configured provider name has no implementation.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// Provider name from configuration.
        name: String,
    },

    /// The provider request failed.
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Error detail from the provider.
        message: String,
        /// HTTP status, when known.
        status: Option<u16>,
    },

    /// The run did not finish within the configured time.
    #[error("agent run timed out after {seconds}s")]
    Timeout {
        /// Elapsed limit in seconds.
        seconds: u64,
    },

    /// Model output did not match the step grammar.
    #[error("could not parse model output: {message}")]
    Parse {
        /// What was wrong with the output.
        message: String,
    },

    /// A tool handler failed.
    #[error("tool '{name}' failed: {message}")]
    ToolInvocation {
        /// Tool name.
        name: String,
        /// Failure detail.
        message: String,
    },

    /// A tool with the same name is already registered.
    #[error("tool '{name}' is already registered")]
    DuplicateTool {
        /// Conflicting name.
        name: String,
    },

    /// A configuration value was out of range.
    #[error("invalid agent configuration: {message}")]
    InvalidConfig {
        /// What was wrong.
        message: String,
    },
}

/// Errors raised while executing CLI commands.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Reading an input file failed.
    #[error("failed to read {path}: {message}")]
    Read {
        /// Path that could not be read.
        path: String,
        /// Underlying error.
        message: String,
    },

    /// An argument value was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Output serialization failed.
    #[error("output error: {0}")]
    Output(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunking_error_display() {
        let err = ChunkingError::OverlapTooLarge {
            size: 10,
            overlap: 10,
        };
        assert_eq!(err.to_string(), "overlap 10 must be smaller than chunk size 10");
    }

    #[test]
    fn test_error_from_chunking() {
        let err: Error = ChunkingError::InvalidChunkSize { size: 0 }.into();
        assert!(matches!(err, Error::Chunking(_)));
        assert!(err.to_string().contains("must be > 0"));
    }

    #[test]
    fn test_error_from_agent() {
        let err: Error = AgentError::UnsupportedProvider {
            name: "acme".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "agent error: unsupported provider: acme");
    }

    #[test]
    fn test_tool_invocation_display() {
        let err = AgentError::ToolInvocation {
            name: "search_database".to_string(),
            message: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "tool 'search_database' failed: connection refused"
        );
    }
}

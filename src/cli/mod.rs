//! CLI layer for ragloop.
//!
//! Provides the command-line interface using clap, with commands for
//! segmenting documents and asking questions over them.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{AgentArgs, Cli, Commands};

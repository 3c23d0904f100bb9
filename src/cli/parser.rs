//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::chunking::ChunkStrategy;

/// ragloop: retrieval-augmented question answering over local documents.
///
/// Splits documents into overlapping segments and answers questions with a
/// bounded reasoning loop that can search those segments.
#[derive(Parser, Debug)]
#[command(name = "ragloop")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (debug logging, reasoning steps).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json, ndjson).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split a document into overlapping segments.
    #[command(after_help = r#"Examples:
  ragloop chunk notes.md                          # Recursive, 2000/200 chars
  ragloop chunk notes.md --size 500 --overlap 50  # Smaller segments
  ragloop chunk log.txt --strategy character      # Split on newlines only
  ragloop chunk doc.txt --strategy token          # 1500/150 estimated tokens
  cat doc.txt | ragloop chunk - --stats           # Statistics from stdin
  ragloop --format ndjson chunk doc.txt | jq .size
"#)]
    Chunk {
        /// Input file, or `-` for stdin.
        input: PathBuf,

        /// Splitting strategy.
        #[arg(short, long, value_enum, default_value_t = ChunkStrategy::Recursive)]
        strategy: ChunkStrategy,

        /// Maximum segment size (characters, or tokens for `token`).
        #[arg(long)]
        size: Option<usize>,

        /// Overlap between adjacent segments.
        #[arg(long)]
        overlap: Option<usize>,

        /// Separator for the `character` strategy (escapes like `\n` are
        /// interpreted). Repeatable for `recursive`, coarsest first.
        #[arg(long)]
        separator: Vec<String>,

        /// Print size statistics instead of segments.
        #[arg(long)]
        stats: bool,
    },

    /// Answer one question over a corpus of documents.
    #[command(after_help = r#"Examples:
  ragloop ask "What does the enterprise plan cost?" --corpus calls/*.txt
  ragloop ask "Summarize the renewal terms" --corpus contract.md -v
"#)]
    Ask {
        /// The question.
        question: String,

        /// Agent options.
        #[command(flatten)]
        agent: AgentArgs,
    },

    /// Interactive conversation over a corpus of documents.
    ///
    /// Reads one question per line. `/clear` forgets the conversation,
    /// `/history` prints it, `/quit` exits.
    Chat {
        /// Agent options.
        #[command(flatten)]
        agent: AgentArgs,
    },

    /// Write the default prompt templates for customization.
    Prompts {
        /// Target directory (defaults to `~/.config/ragloop/prompts`).
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

/// Options shared by `ask` and `chat`.
#[derive(Args, Debug, Clone, Default)]
pub struct AgentArgs {
    /// Documents to index (plain text).
    #[arg(short, long, num_args = 1..)]
    pub corpus: Vec<PathBuf>,

    /// Model identifier.
    #[arg(short, long, env = "RAGLOOP_MODEL")]
    pub model: Option<String>,

    /// Reasoning iterations before giving up.
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Documents returned per search.
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Segment size used when indexing the corpus.
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Segment overlap used when indexing the corpus.
    #[arg(long)]
    pub chunk_overlap: Option<usize>,

    /// Directory containing prompt template files.
    #[arg(long, env = "RAGLOOP_PROMPT_DIR")]
    pub prompt_dir: Option<PathBuf>,

    /// Whole-run timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,
}

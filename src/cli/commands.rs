//! CLI command implementations.
//!
//! Contains the business logic for each CLI command. Commands return their
//! output as a string; only the interactive `chat` loop writes as it goes.

use std::io::{self, BufRead, Read, Write as IoWrite};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;
use tracing::{debug, info};

use crate::agent::{
    ANALYSIS_KEY, AgentConfig, AgentExecutor, ChatSession, ConversationMemory, LlmProvider,
    PromptSet, ToolRegistry, create_provider, retrieval_tool,
};
use crate::chunking::{self, ChunkOptions, ChunkStats, ChunkStrategy, Metadata};
use crate::cli::output::{OutputFormat, format_run, format_segments, format_stats};
use crate::cli::parser::{AgentArgs, Cli, Commands};
use crate::error::{CommandError, Result};
use crate::search::KeywordIndex;

/// Suffix of the optional analysis file read alongside each corpus file.
const ANALYSIS_SUFFIX: &str = ".analysis.json";

/// Executes the CLI command.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Chunk {
            input,
            strategy,
            size,
            overlap,
            separator,
            stats,
        } => {
            let text = read_input(input)?;
            let options = chunk_options(*strategy, *size, *overlap, separator);
            cmd_chunk(&text, *strategy, &options, *stats, format)
        }
        Commands::Ask { question, agent } => cmd_ask(question, agent, format, cli.verbose),
        Commands::Chat { agent } => cmd_chat(agent, format, cli.verbose),
        Commands::Prompts { write } => cmd_prompts(write.as_deref(), format),
    }
}

/// Reads a file, or stdin for `-`.
fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| CommandError::Read {
                path: "<stdin>".to_string(),
                message: e.to_string(),
            })?;
        return Ok(text);
    }

    std::fs::read_to_string(path).map_err(|e| {
        CommandError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Interprets `\n`, `\t` and `\\` in separators typed on the command line.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn chunk_options(
    strategy: ChunkStrategy,
    size: Option<usize>,
    overlap: Option<usize>,
    separators: &[String],
) -> ChunkOptions {
    let mut options = ChunkOptions::for_strategy(strategy);
    if let Some(size) = size {
        options.max_size = size;
    }
    if let Some(overlap) = overlap {
        options.overlap = overlap;
    }
    let separators: Vec<String> = separators.iter().map(|s| unescape(s)).collect();
    match (strategy, separators.first()) {
        (ChunkStrategy::Character, Some(first)) => options.with_separator(first.clone()),
        (ChunkStrategy::Recursive, Some(_)) => options.with_separators(&separators),
        _ => options,
    }
}

fn cmd_chunk(
    text: &str,
    strategy: ChunkStrategy,
    options: &ChunkOptions,
    stats: bool,
    format: OutputFormat,
) -> Result<String> {
    let segments = chunking::chunk(text, strategy, options)?;

    if stats {
        Ok(format_stats(&ChunkStats::from_segments(&segments), format))
    } else {
        Ok(format_segments(&segments, format))
    }
}

/// Resolves agent configuration: CLI flags, then environment, then defaults.
fn agent_config(args: &AgentArgs) -> Result<AgentConfig> {
    let mut builder = AgentConfig::builder();
    if let Some(model) = &args.model {
        builder = builder.model(model);
    }
    if let Some(n) = args.max_iterations {
        builder = builder.max_iterations(n);
    }
    if let Some(k) = args.top_k {
        builder = builder.search_top_k(k);
    }
    if let Some(dir) = &args.prompt_dir {
        builder = builder.prompt_dir(dir);
    }
    if let Some(secs) = args.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.from_env().build()?)
}

/// Indexes every corpus file.
fn build_index(args: &AgentArgs) -> Result<KeywordIndex> {
    let mut options = ChunkOptions::default();
    if let Some(size) = args.chunk_size {
        options.max_size = size;
    }
    if let Some(overlap) = args.chunk_overlap {
        options.overlap = overlap;
    }

    let mut index = KeywordIndex::new(options);
    for path in &args.corpus {
        let text = read_input(path)?;
        let metadata = read_analysis(path)?;
        index.add_document_with_metadata(&path.display().to_string(), &text, metadata)?;
    }
    debug!(files = args.corpus.len(), segments = index.len(), "corpus indexed");
    Ok(index)
}

/// Loads `<file>.analysis.json` next to a corpus file, if present.
fn read_analysis(path: &Path) -> Result<Metadata> {
    let mut metadata = Metadata::new();
    if path.as_os_str() == "-" {
        return Ok(metadata);
    }

    let mut sidecar = path.as_os_str().to_owned();
    sidecar.push(ANALYSIS_SUFFIX);
    let sidecar = PathBuf::from(sidecar);
    if !sidecar.is_file() {
        return Ok(metadata);
    }

    let raw = read_input(&sidecar)?;
    let analysis: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
        CommandError::InvalidArgument(format!("{}: {e}", sidecar.display()))
    })?;
    debug!(path = %sidecar.display(), "loaded document analysis");
    metadata.insert(ANALYSIS_KEY.to_string(), analysis);
    Ok(metadata)
}

/// Wires the provider, the retrieval tool and the prompts together.
fn build_executor(
    provider: Arc<dyn LlmProvider>,
    index: KeywordIndex,
    config: &AgentConfig,
) -> Result<AgentExecutor> {
    let mut tools = ToolRegistry::new();
    tools.register(retrieval_tool(Arc::new(index), config.search_top_k))?;
    Ok(AgentExecutor::from_config(provider, Arc::new(tools), config))
}

fn new_session(config: &AgentConfig) -> ChatSession {
    let memory = config
        .memory_window
        .map_or_else(ConversationMemory::new, ConversationMemory::with_window);
    ChatSession::with_memory("cli", memory)
}

fn cmd_ask(question: &str, args: &AgentArgs, format: OutputFormat, verbose: bool) -> Result<String> {
    let config = agent_config(args)?;
    let provider: Arc<dyn LlmProvider> = Arc::from(create_provider(&config)?);
    let index = build_index(args)?;
    ask_with_provider(provider, index, &config, question, format, verbose)
}

fn ask_with_provider(
    provider: Arc<dyn LlmProvider>,
    index: KeywordIndex,
    config: &AgentConfig,
    question: &str,
    format: OutputFormat,
    verbose: bool,
) -> Result<String> {
    let executor = build_executor(provider, index, config)?;
    let mut session = new_session(config);

    let rt = Runtime::new()?;
    let run = rt.block_on(executor.run_with_timeout(&mut session, question, config.timeout))?;
    Ok(format_run(&run, format, verbose))
}

fn cmd_chat(args: &AgentArgs, format: OutputFormat, verbose: bool) -> Result<String> {
    let config = agent_config(args)?;
    let provider: Arc<dyn LlmProvider> = Arc::from(create_provider(&config)?);
    let index = build_index(args)?;
    let executor = build_executor(provider, index, &config)?;
    let mut session = new_session(&config);
    let rt = Runtime::new()?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let turns = chat_loop(
        &rt,
        &executor,
        &mut session,
        config.timeout,
        &mut stdin.lock(),
        &mut stdout.lock(),
        format,
        verbose,
    )?;
    info!(turns, "chat ended");
    Ok(String::new())
}

/// Runs the REPL until `/quit` or end of input. Returns the number of
/// questions answered.
#[allow(clippy::too_many_arguments)]
fn chat_loop<R: BufRead, W: IoWrite>(
    rt: &Runtime,
    executor: &AgentExecutor,
    session: &mut ChatSession,
    timeout: Duration,
    input: &mut R,
    output: &mut W,
    format: OutputFormat,
    verbose: bool,
) -> Result<usize> {
    let interactive = format == OutputFormat::Text;
    let mut turns = 0;
    let mut line = String::new();

    loop {
        if interactive {
            write!(output, "> ").map_err(output_error)?;
            output.flush().map_err(output_error)?;
        }
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let question = line.trim();
        match question {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                session.memory.clear();
                if interactive {
                    writeln!(output, "Conversation cleared.").map_err(output_error)?;
                }
                continue;
            }
            "/history" => {
                let rendered = if interactive {
                    format!("{}\n", session.memory.transcript())
                } else {
                    format!("{}\n", format.to_json(session.memory.entries()))
                };
                output
                    .write_all(rendered.as_bytes())
                    .map_err(output_error)?;
                continue;
            }
            _ => {}
        }

        match rt.block_on(executor.run_with_timeout(session, question, timeout)) {
            Ok(run) => {
                turns += 1;
                output
                    .write_all(format_run(&run, format, verbose).as_bytes())
                    .map_err(output_error)?;
            }
            Err(e) => {
                writeln!(output, "Error: {e}").map_err(output_error)?;
            }
        }
    }

    Ok(turns)
}

fn output_error(e: io::Error) -> CommandError {
    CommandError::Output(e.to_string())
}

fn cmd_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(PathBuf::from)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::InvalidArgument(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir)?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                return Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    target_dir.display()
                ));
            }
            let mut output = format!(
                "Wrote {} prompt template(s) to: {}\n",
                written.len(),
                target_dir.display()
            );
            for path in &written {
                output.push_str("  ");
                output.push_str(
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("unknown"),
                );
                output.push('\n');
            }
            Ok(output)
        }
        OutputFormat::Json | OutputFormat::Ndjson => {
            let json = serde_json::json!({
                "directory": target_dir.to_string_lossy(),
                "written": written.iter().map(|p| p.to_string_lossy().into_owned()).collect::<Vec<_>>(),
                "count": written.len()
            });
            Ok(format!("{}\n", format.to_json(&json)))
        }
    }
}

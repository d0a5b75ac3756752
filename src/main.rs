use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docqa::arxiv::DEFAULT_MAX_RESULTS;
use docqa::config::{self, Provider};
use docqa::tui::{self, Services};
use docqa::{
    AnswerService, ConversationState, DocumentExtractor, FileExtractor, PaperRecord, PaperSearch,
};
use tracing_subscriber::EnvFilter;

/// docqa - ask questions about a document, or search arXiv for papers
#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Conversational document QA and arXiv paper search")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat and paper-search interface
    Chat(ChatCommand),
    /// Ask a single question about a document and print the answer
    Ask(AskCommand),
    /// Search arXiv and print the matching papers
    Search(SearchCommand),
}

#[derive(Parser)]
struct ChatCommand {
    /// Document to load on startup (.txt, .md or .pdf)
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,
}

#[derive(Parser)]
struct AskCommand {
    /// Document to answer from (.txt, .md or .pdf)
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// The question to ask
    #[arg(value_name = "QUESTION")]
    question: String,
}

#[derive(Parser)]
struct SearchCommand {
    /// Keywords to search for
    #[arg(value_name = "QUERY")]
    query: String,

    /// Maximum number of papers to return
    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_RESULTS)]
    max_results: usize,
}

fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(matches!(cli.command, Commands::Chat(_)));

    let result = match &cli.command {
        Commands::Chat(cmd) => handle_chat(cmd),
        Commands::Ask(cmd) => handle_ask(cmd),
        Commands::Search(cmd) => handle_search(cmd),
    };

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Installs the tracing subscriber.
///
/// `RUST_LOG` always wins. Without it the CLI logs warnings to stderr and the
/// TUI logs nothing, since stderr output would corrupt the screen.
fn init_logging(interactive: bool) {
    let default = if interactive { "off" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are bad input: empty questions, unreadable documents or
/// invalid configuration. Backend and terminal failures are internal.
fn is_user_error(error: &anyhow::Error) -> bool {
    let error_msg = format!("{error:#}");
    error_msg.contains("cannot be empty")
        || error_msg.contains("Error processing document")
        || error_msg.contains("Failed to configure")
        || error_msg.contains("Unknown DOCQA_PROVIDER")
}

fn answer_service() -> Result<AnswerService> {
    let provider = Provider::from_env()?;
    let backend = config::llm_backend(provider)?;
    Ok(AnswerService::new(backend))
}

fn handle_chat(cmd: &ChatCommand) -> Result<()> {
    let services = Services {
        answers: answer_service()?,
        papers: Box::new(config::paper_search()?),
        extractor: Box::new(FileExtractor::new()),
    };

    tui::run(services, cmd.path.as_deref())
}

fn handle_ask(cmd: &AskCommand) -> Result<()> {
    if cmd.question.trim().is_empty() {
        anyhow::bail!("Question cannot be empty");
    }

    let answers = answer_service()?;
    let answer = execute_ask(&cmd.path, &cmd.question, &FileExtractor::new(), &answers)?;
    println!("{answer}");
    Ok(())
}

/// Loads `path` into a fresh conversation and asks `question` once.
///
/// Returns the assistant's reply. A backend failure is part of the reply, as
/// it would be in the interactive view.
fn execute_ask(
    path: &Path,
    question: &str,
    extractor: &dyn DocumentExtractor,
    answers: &AnswerService,
) -> Result<String> {
    let mut conversation = ConversationState::new();

    let warning = conversation
        .load_from(extractor, path)
        .context("Error processing document")?;
    if let Some(warning) = warning {
        eprintln!("Warning: {warning}");
    }

    let reply = conversation
        .ask(answers, question)
        .context("Failed to record answer")?;
    Ok(reply.text().to_string())
}

fn handle_search(cmd: &SearchCommand) -> Result<()> {
    if cmd.query.trim().is_empty() {
        anyhow::bail!("Search query cannot be empty");
    }

    let client = config::paper_search()?;
    let output = execute_search(&client, &cmd.query, cmd.max_results)?;
    println!("{output}");
    Ok(())
}

fn execute_search(papers: &dyn PaperSearch, query: &str, max_results: usize) -> Result<String> {
    let records = papers
        .search(query, max_results)
        .context("Failed to search arXiv")?;
    Ok(format_records(&records))
}

/// Formats search results for the terminal, one block per paper.
fn format_records(records: &[PaperRecord]) -> String {
    if records.is_empty() {
        return "No papers found for this query.".to_string();
    }

    records
        .iter()
        .map(PaperRecord::to_string)
        .collect::<Vec<_>>()
        .join("\n\n")
}

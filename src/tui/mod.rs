//! Terminal User Interface module for docqa.
//!
//! Provides a two-view TUI (document chat and paper search) using ratatui for
//! rendering and crossterm for terminal management. The conversation itself
//! lives in [`ConversationState`](crate::ConversationState); this module only
//! collects input, runs backend calls and renders the result.

use std::io;
use std::panic;
use std::path::Path;

use anyhow::{Context, Result};
use crossterm::{
    event::{self as crossterm_event, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::warn;

use crate::answerer::{AnswerService, outcome_text};
use crate::arxiv::{DEFAULT_MAX_RESULTS, PaperSearch};
use crate::document::DocumentExtractor;

mod app;
pub mod event;
mod ui;

pub use app::{Action, App, Notice, SearchOutcome, View};

/// Backends the TUI calls on behalf of the user.
pub struct Services {
    pub answers: AnswerService,
    pub papers: Box<dyn PaperSearch>,
    pub extractor: Box<dyn DocumentExtractor>,
}

/// Initializes the terminal for TUI rendering.
///
/// Enables raw mode and enters the alternate screen.
fn init_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
///
/// This should always be called before exiting the TUI, even in error cases,
/// to prevent terminal corruption.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

/// Minimal terminal restoration for the panic hook. Errors are ignored.
fn restore_terminal_panic() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Installs a panic hook that restores the terminal before the original hook runs.
fn init_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal_panic();
        original_hook(panic_info);
    }));
}

/// Runs the main event loop for the TUI.
///
/// Terminal state is always restored, even on error.
pub fn run_event_loop(app: &mut App, services: &Services) -> Result<()> {
    let mut terminal = init_terminal()?;

    let result = run_event_loop_internal(app, services, &mut terminal);

    if let Err(e) = restore_terminal(&mut terminal) {
        eprintln!("Error restoring terminal: {e}");
    }

    result
}

fn run_event_loop_internal(
    app: &mut App,
    services: &Services,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;

        if crossterm_event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = crossterm_event::read()?
            && key.kind == KeyEventKind::Press
        {
            let action = event::handle_key_event(app, key);
            if action == Action::Quit {
                break;
            }

            // Draw once more so the pending state is visible while the
            // backend call blocks.
            if action != Action::None {
                terminal.draw(|frame| ui::draw(frame, app))?;
            }
            perform_action(app, services, action);
        }
    }

    Ok(())
}

/// Performs the blocking work requested by a key press.
///
/// Every failure is reported through the app state; nothing here aborts the UI.
pub fn perform_action(app: &mut App, services: &Services, action: Action) {
    match action {
        Action::None | Action::Quit => {}
        Action::Answer => answer_pending_question(app, &services.answers),
        Action::LoadDocument(path) => load_document(app, services.extractor.as_ref(), &path),
        Action::Search(query) => search_papers(app, services.papers.as_ref(), &query),
    }
}

/// Fetches the answer to the pending question and records it.
///
/// Backend failures are recorded as the assistant's answer.
fn answer_pending_question(app: &mut App, answers: &AnswerService) {
    let conversation = app.conversation();
    let Some(question) = conversation.pending_question() else {
        return;
    };
    let document_text = conversation.document().map(|d| d.text()).unwrap_or("");

    let outcome = answers.ask(document_text, question);
    let text = outcome_text(&outcome);

    if let Err(e) = app.conversation_mut().complete_answer(text) {
        warn!(error = %e, "answer arrived with no pending question");
    }
    if outcome.is_err() {
        app.set_status(Notice::Error(
            "The LLM backend call failed; you can ask again".to_string(),
        ));
    }
}

fn load_document(app: &mut App, extractor: &dyn DocumentExtractor, path: &Path) {
    match app.conversation_mut().load_from(extractor, path) {
        Ok(Some(warning)) => app.set_status(Notice::Warning(warning.to_string())),
        Ok(None) => app.set_status(Notice::Info(format!("Loaded {}", path.display()))),
        Err(e) => app.set_status(Notice::Error(format!("Error processing document: {e}"))),
    }
}

fn search_papers(app: &mut App, papers: &dyn PaperSearch, query: &str) {
    match papers.search(query, DEFAULT_MAX_RESULTS) {
        Ok(records) => {
            app.set_search_outcome(SearchOutcome::Results(records));
            app.set_status(Notice::Info(format!("Searched arXiv for \"{query}\"")));
        }
        Err(e) => {
            warn!(error = %e, "paper search failed");
            app.set_search_outcome(SearchOutcome::Failed(e.to_string()));
        }
    }
}

/// Entry point for the TUI application.
///
/// Optionally preloads `document` before starting the event loop.
///
/// # Errors
///
/// Returns an error if terminal initialization or the event loop fails.
pub fn run(services: Services, document: Option<&Path>) -> Result<()> {
    init_panic_hook();

    let mut app = App::new();
    if let Some(path) = document {
        load_document(&mut app, services.extractor.as_ref(), path);
    }

    run_event_loop(&mut app, &services).context("TUI event loop failed")?;

    Ok(())
}

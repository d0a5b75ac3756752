use std::path::PathBuf;

use crate::arxiv::PaperRecord;
use crate::conversation::{ConversationError, ConversationState, Phase};

/// Application state for the TUI.
///
/// Holds the conversation, both input buffers, the last paper search results
/// and a one-line status notice.
#[derive(Debug, Clone)]
pub struct App {
    /// The document conversation
    conversation: ConversationState,
    /// Currently shown view
    view: View,
    /// Question input buffer
    chat_input: String,
    /// Paper search input buffer
    search_input: String,
    /// Outcome of the last paper search
    search: SearchOutcome,
    /// Selected paper in the results list
    selected_paper: Option<usize>,
    /// Lines scrolled up from the bottom of the history
    history_scroll: u16,
    /// Largest useful scroll offset, known once the history has been drawn
    history_overflow: u16,
    /// Last notice shown in the status bar
    status: Option<Notice>,
}

/// Top-level views, mirroring the two sections of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Document upload and question answering
    Chat,
    /// Keyword search over arXiv
    Papers,
}

/// Result of the most recent paper search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// No search has been run yet
    NotSearched,
    /// The backend returned these records (possibly none)
    Results(Vec<PaperRecord>),
    /// The search failed
    Failed(String),
}

/// A status-bar message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Warning(String),
    Error(String),
}

/// Work the event loop must perform after a key press.
///
/// Key handling never blocks; anything that calls a backend or touches the
/// filesystem is returned as an action instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing to do
    None,
    /// Exit the application
    Quit,
    /// A question was recorded; fetch its answer
    Answer,
    /// Extract and load the document at this path
    LoadDocument(PathBuf),
    /// Run a paper search for this query
    Search(String),
}

impl App {
    /// Creates a new App with an empty conversation on the chat view.
    ///
    /// # Examples
    ///
    /// ```
    /// use docqa::tui::{App, View};
    ///
    /// let app = App::new();
    /// assert_eq!(app.view(), View::Chat);
    /// assert!(!app.conversation().has_document());
    /// ```
    pub fn new() -> Self {
        Self {
            conversation: ConversationState::new(),
            view: View::Chat,
            chat_input: String::new(),
            search_input: String::new(),
            search: SearchOutcome::NotSearched,
            selected_paper: None,
            history_scroll: 0,
            history_overflow: u16::MAX,
            status: None,
        }
    }

    /// Returns the conversation state for rendering.
    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    /// Returns the conversation state for the event loop to drive.
    pub fn conversation_mut(&mut self) -> &mut ConversationState {
        &mut self.conversation
    }

    /// Returns the current view.
    pub fn view(&self) -> View {
        self.view
    }

    /// Switches to `view`.
    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    /// Toggles between the chat and paper views.
    pub fn toggle_view(&mut self) {
        self.view = match self.view {
            View::Chat => View::Papers,
            View::Papers => View::Chat,
        };
    }

    /// Returns the question input buffer.
    pub fn chat_input(&self) -> &str {
        &self.chat_input
    }

    /// Returns the paper search input buffer.
    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    /// Returns the last paper search outcome.
    pub fn search_outcome(&self) -> &SearchOutcome {
        &self.search
    }

    /// Returns the selected paper index.
    pub fn selected_paper(&self) -> Option<usize> {
        self.selected_paper
    }

    /// Returns the history scroll offset, counted up from the latest message.
    pub fn history_scroll(&self) -> u16 {
        self.history_scroll
    }

    /// Returns the status notice, if any.
    pub fn status(&self) -> Option<&Notice> {
        self.status.as_ref()
    }

    /// Replaces the status notice.
    pub fn set_status(&mut self, notice: Notice) {
        self.status = Some(notice);
    }

    /// Returns true if typing into the question box is currently allowed.
    ///
    /// Input is locked while an answer is pending.
    pub fn chat_input_enabled(&self) -> bool {
        self.conversation.phase() != Phase::Awaiting
    }

    /// Appends a character to the input of the active view.
    pub fn push_char(&mut self, c: char) {
        match self.view {
            View::Chat if self.chat_input_enabled() => self.chat_input.push(c),
            View::Chat => {}
            View::Papers => self.search_input.push(c),
        }
    }

    /// Removes the last character from the input of the active view.
    pub fn pop_char(&mut self) {
        match self.view {
            View::Chat if self.chat_input_enabled() => {
                self.chat_input.pop();
            }
            View::Chat => {}
            View::Papers => {
                self.search_input.pop();
            }
        }
    }

    /// Handles Enter on the chat view.
    ///
    /// `/open <path>` requests a document load, `/reset` clears the
    /// conversation, anything else is submitted as a question. A rejected
    /// question keeps its text in the input box so it can be resent.
    pub fn submit_chat_input(&mut self) -> Action {
        let input = self.chat_input.trim().to_string();
        if input.is_empty() {
            return Action::None;
        }

        if let Some(path) = input.strip_prefix("/open ") {
            let path = path.trim();
            if path.is_empty() {
                self.set_status(Notice::Warning("Usage: /open <path>".to_string()));
                return Action::None;
            }
            self.chat_input.clear();
            return Action::LoadDocument(PathBuf::from(path));
        }

        if input == "/reset" {
            self.chat_input.clear();
            self.conversation.reset();
            self.history_scroll = 0;
            self.set_status(Notice::Info("Conversation reset".to_string()));
            return Action::None;
        }

        match self.conversation.submit_question(input) {
            Ok(_) => {
                self.chat_input.clear();
                self.history_scroll = 0;
                self.status = None;
                Action::Answer
            }
            Err(e) => {
                self.set_status(not_ready_notice(e));
                Action::None
            }
        }
    }

    /// Handles Enter on the papers view.
    pub fn submit_search_input(&mut self) -> Action {
        let query = self.search_input.trim();
        if query.is_empty() {
            self.set_status(Notice::Warning(
                "Enter keywords to search for papers".to_string(),
            ));
            return Action::None;
        }
        Action::Search(query.to_string())
    }

    /// Stores the outcome of a paper search and resets the selection.
    pub fn set_search_outcome(&mut self, outcome: SearchOutcome) {
        self.selected_paper = match &outcome {
            SearchOutcome::Results(records) if !records.is_empty() => Some(0),
            _ => None,
        };
        self.search = outcome;
    }

    /// Moves the paper selection down, wrapping to the top.
    pub fn select_next_paper(&mut self) {
        let count = self.paper_count();
        if count == 0 {
            self.selected_paper = None;
            return;
        }
        self.selected_paper = Some(match self.selected_paper {
            None => 0,
            Some(i) if i + 1 >= count => 0,
            Some(i) => i + 1,
        });
    }

    /// Moves the paper selection up, wrapping to the bottom.
    pub fn select_previous_paper(&mut self) {
        let count = self.paper_count();
        if count == 0 {
            self.selected_paper = None;
            return;
        }
        self.selected_paper = Some(match self.selected_paper {
            None | Some(0) => count - 1,
            Some(i) => i - 1,
        });
    }

    fn paper_count(&self) -> usize {
        match &self.search {
            SearchOutcome::Results(records) => records.len(),
            _ => 0,
        }
    }

    /// Scrolls the history towards older messages, stopping at the oldest line.
    pub fn scroll_history_up(&mut self, amount: u16) {
        self.history_scroll = self
            .history_scroll
            .saturating_add(amount)
            .min(self.history_overflow);
    }

    /// Records how many history lines do not fit on screen and clamps the
    /// scroll offset to it.
    pub fn set_history_overflow(&mut self, overflow: u16) {
        self.history_overflow = overflow;
        self.history_scroll = self.history_scroll.min(overflow);
    }

    /// Scrolls the history towards the latest message.
    pub fn scroll_history_down(&mut self, amount: u16) {
        self.history_scroll = self.history_scroll.saturating_sub(amount);
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

fn not_ready_notice(error: ConversationError) -> Notice {
    match error {
        ConversationError::NoDocument => Notice::Warning(
            "Please upload a document to begin: /open <path>".to_string(),
        ),
        other => Notice::Warning(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;

    fn record(title: &str) -> PaperRecord {
        PaperRecord {
            title: title.to_string(),
            summary: "summary".to_string(),
            link: reqwest::Url::parse("http://arxiv.org/abs/1").unwrap(),
        }
    }

    fn app_with_document() -> App {
        let mut app = App::new();
        app.conversation_mut()
            .load_document(Document::new("doc.txt", "content"));
        app
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.push_char(c);
        }
    }

    #[test]
    fn app_initializes_with_default_state() {
        let app = App::new();
        assert_eq!(app.view(), View::Chat);
        assert_eq!(app.chat_input(), "");
        assert_eq!(app.search_input(), "");
        assert_eq!(app.search_outcome(), &SearchOutcome::NotSearched);
        assert!(app.status().is_none());
    }

    #[test]
    fn typing_goes_to_the_active_view() {
        let mut app = App::new();
        type_text(&mut app, "hi");
        app.toggle_view();
        type_text(&mut app, "qc");
        app.pop_char();

        assert_eq!(app.chat_input(), "hi");
        assert_eq!(app.search_input(), "q");
    }

    #[test]
    fn submitting_question_without_document_keeps_input() {
        let mut app = App::new();
        type_text(&mut app, "What is this?");

        assert_eq!(app.submit_chat_input(), Action::None);
        assert_eq!(app.chat_input(), "What is this?");
        assert!(matches!(app.status(), Some(Notice::Warning(_))));
        assert!(app.conversation().history().is_empty());
    }

    #[test]
    fn submitting_question_records_it_and_requests_answer() {
        let mut app = app_with_document();
        type_text(&mut app, "  What is this?  ");

        assert_eq!(app.submit_chat_input(), Action::Answer);
        assert_eq!(app.chat_input(), "");
        assert_eq!(app.conversation().pending_question(), Some("What is this?"));
    }

    #[test]
    fn input_is_locked_while_answer_pending() {
        let mut app = app_with_document();
        type_text(&mut app, "first");
        app.submit_chat_input();

        assert!(!app.chat_input_enabled());
        type_text(&mut app, "second");
        assert_eq!(app.chat_input(), "");
        assert_eq!(app.submit_chat_input(), Action::None);
        assert_eq!(app.conversation().history().len(), 1);
    }

    #[test]
    fn blank_input_does_nothing() {
        let mut app = app_with_document();
        type_text(&mut app, "   ");
        assert_eq!(app.submit_chat_input(), Action::None);
        assert!(app.conversation().history().is_empty());
    }

    #[test]
    fn open_command_requests_document_load() {
        let mut app = App::new();
        type_text(&mut app, "/open  papers/report.pdf ");

        assert_eq!(
            app.submit_chat_input(),
            Action::LoadDocument(PathBuf::from("papers/report.pdf"))
        );
        assert_eq!(app.chat_input(), "");
    }

    #[test]
    fn reset_command_clears_conversation() {
        let mut app = app_with_document();
        type_text(&mut app, "/reset");

        assert_eq!(app.submit_chat_input(), Action::None);
        assert!(!app.conversation().has_document());
        assert_eq!(app.status(), Some(&Notice::Info("Conversation reset".to_string())));
    }

    #[test]
    fn blank_search_is_rejected() {
        let mut app = App::new();
        app.set_view(View::Papers);
        type_text(&mut app, "  ");

        assert_eq!(app.submit_search_input(), Action::None);
        assert!(matches!(app.status(), Some(Notice::Warning(_))));
    }

    #[test]
    fn search_input_is_trimmed() {
        let mut app = App::new();
        app.set_view(View::Papers);
        type_text(&mut app, " quantum computing ");

        assert_eq!(
            app.submit_search_input(),
            Action::Search("quantum computing".to_string())
        );
    }

    #[test]
    fn paper_selection_wraps() {
        let mut app = App::new();
        app.set_search_outcome(SearchOutcome::Results(vec![record("a"), record("b")]));
        assert_eq!(app.selected_paper(), Some(0));

        app.select_next_paper();
        assert_eq!(app.selected_paper(), Some(1));
        app.select_next_paper();
        assert_eq!(app.selected_paper(), Some(0));
        app.select_previous_paper();
        assert_eq!(app.selected_paper(), Some(1));
    }

    #[test]
    fn paper_selection_with_no_results() {
        let mut app = App::new();
        app.set_search_outcome(SearchOutcome::Results(Vec::new()));
        assert_eq!(app.selected_paper(), None);
        app.select_next_paper();
        assert_eq!(app.selected_paper(), None);

        app.set_search_outcome(SearchOutcome::Failed("boom".to_string()));
        app.select_previous_paper();
        assert_eq!(app.selected_paper(), None);
    }

    #[test]
    fn history_scroll_saturates_at_latest() {
        let mut app = App::new();
        app.scroll_history_down(3);
        assert_eq!(app.history_scroll(), 0);
        app.scroll_history_up(5);
        app.scroll_history_down(2);
        assert_eq!(app.history_scroll(), 3);
    }

    #[test]
    fn history_scroll_stops_at_oldest_line() {
        let mut app = App::new();
        app.scroll_history_up(50);
        app.set_history_overflow(4);
        assert_eq!(app.history_scroll(), 4);

        app.scroll_history_up(10);
        assert_eq!(app.history_scroll(), 4);
        app.scroll_history_down(1);
        assert_eq!(app.history_scroll(), 3);
    }
}

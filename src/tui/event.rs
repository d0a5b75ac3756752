//! Keyboard event handling for the TUI.
//!
//! Maps crossterm keyboard events to application state changes. Anything that
//! needs a backend is returned as an [`Action`] for the event loop to run.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{Action, App, View};

/// Handles a keyboard event and updates the app state accordingly.
///
/// # Event Handling
///
/// - `Esc` / `Ctrl+C`: quit
/// - `Tab`, `F1`, `F2`: switch between the chat and paper views
/// - Chat view: type a question, `Enter` to send, `PageUp`/`PageDown` to scroll
/// - Papers view: type keywords, `Enter` to search, `Up`/`Down` to select
///
/// # Examples
///
/// ```
/// use docqa::tui::{Action, App, event::handle_key_event};
/// use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
///
/// let mut app = App::new();
/// let key = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
/// assert_eq!(handle_key_event(&mut app, key), Action::Quit);
/// ```
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Action {
    if key.code == KeyCode::Esc
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
    {
        return Action::Quit;
    }

    match key.code {
        KeyCode::Tab | KeyCode::BackTab => {
            app.toggle_view();
            return Action::None;
        }
        KeyCode::F(1) => {
            app.set_view(View::Chat);
            return Action::None;
        }
        KeyCode::F(2) => {
            app.set_view(View::Papers);
            return Action::None;
        }
        _ => {}
    }

    match app.view() {
        View::Chat => handle_chat(app, key),
        View::Papers => handle_papers(app, key),
    }
}

fn handle_chat(app: &mut App, key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Enter => return app.submit_chat_input(),
        KeyCode::Char(c) if is_plain(key.modifiers) => app.push_char(c),
        KeyCode::Backspace => app.pop_char(),
        KeyCode::PageUp => app.scroll_history_up(5),
        KeyCode::PageDown => app.scroll_history_down(5),
        KeyCode::Up => app.scroll_history_up(1),
        KeyCode::Down => app.scroll_history_down(1),
        _ => {}
    }
    Action::None
}

fn handle_papers(app: &mut App, key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Enter => return app.submit_search_input(),
        KeyCode::Char(c) if is_plain(key.modifiers) => app.push_char(c),
        KeyCode::Backspace => app.pop_char(),
        KeyCode::Down => app.select_next_paper(),
        KeyCode::Up => app.select_previous_paper(),
        _ => {}
    }
    Action::None
}

fn is_plain(modifiers: KeyModifiers) -> bool {
    modifiers.is_empty() || modifiers == KeyModifiers::SHIFT
}

//! UI rendering functions for the TUI.
//!
//! Draws a tab bar, the active view (document chat or paper search) and a
//! status line using ratatui widgets.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};
use time::macros::format_description;

use super::app::{App, Notice, SearchOutcome, View};
use crate::conversation::{Phase, Role};

/// Lines of document text shown in the preview panel.
const PREVIEW_LINES: usize = 4;

/// Main rendering function for the TUI.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs
            Constraint::Min(0),    // Active view
            Constraint::Length(1), // Status line
        ])
        .split(frame.area());

    render_tabs(frame, app, chunks[0]);
    match app.view() {
        View::Chat => render_chat(frame, app, chunks[1]),
        View::Papers => render_papers(frame, app, chunks[1]),
    }
    render_status_line(frame, app, chunks[2]);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let selected = match app.view() {
        View::Chat => 0,
        View::Papers => 1,
    };

    let tabs = Tabs::new(vec!["F1 Document Q&A", "F2 Paper Search"])
        .block(Block::default().borders(Borders::ALL).title("docqa"))
        .select(selected)
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}

/// Renders the document preview, conversation history and question input.
fn render_chat(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(PREVIEW_LINES as u16 + 2),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    render_document_preview(frame, app, chunks[0]);
    render_history(frame, app, chunks[1]);
    render_chat_input(frame, app, chunks[2]);
}

fn render_document_preview(frame: &mut Frame, app: &App, area: Rect) {
    let conversation = app.conversation();

    let (title, content) = match conversation.document() {
        Some(doc) if doc.is_empty() => (
            format!("Document: {}", doc.id()),
            Text::styled(
                "(no extractable text)",
                Style::default().fg(Color::Yellow),
            ),
        ),
        Some(doc) => {
            let lines: Vec<Line> = doc
                .text()
                .lines()
                .filter(|l| !l.trim().is_empty())
                .take(PREVIEW_LINES)
                .map(Line::from)
                .collect();
            (
                format!("Document: {} ({} chars)", doc.id(), doc.text().len()),
                Text::from(lines),
            )
        }
        None => (
            "Document".to_string(),
            Text::styled(
                "Please upload a document to begin: /open <path>",
                Style::default().fg(Color::DarkGray),
            ),
        ),
    };

    let paragraph = Paragraph::new(content)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(Color::Gray));

    frame.render_widget(paragraph, area);
}

fn render_history(frame: &mut Frame, app: &mut App, area: Rect) {
    let conversation = app.conversation();
    let time_format = format_description!("[hour]:[minute]");
    let mut text = Text::default();

    for message in conversation.history() {
        let time = message
            .created_at()
            .format(time_format)
            .unwrap_or_else(|_| "--:--".to_string());

        let (label, color) = match message.role() {
            Role::User => ("You", Color::Cyan),
            Role::Assistant => ("Assistant", Color::Green),
        };
        text.lines.push(Line::from(vec![
            Span::styled(
                label,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" {time}"),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ),
        ]));

        match message.role() {
            Role::User => text.lines.push(Line::from(message.text())),
            Role::Assistant => text
                .lines
                .extend(tui_markdown::from_str(message.text()).lines),
        }
        text.lines.push(Line::from(""));
    }

    if conversation.phase() == Phase::Awaiting {
        text.lines.push(Line::from(Span::styled(
            "Generating answer...",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    // Keep the latest message in view unless the user has scrolled up.
    let visible = area.height.saturating_sub(2) as usize;
    let overflow = text.lines.len().saturating_sub(visible);
    let top = overflow.saturating_sub(app.history_scroll() as usize);
    let top = u16::try_from(top).unwrap_or(u16::MAX);

    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Conversation"))
        .wrap(Wrap { trim: false })
        .scroll((top, 0));

    frame.render_widget(paragraph, area);
    app.set_history_overflow(u16::try_from(overflow).unwrap_or(u16::MAX));
}

fn render_chat_input(frame: &mut Frame, app: &App, area: Rect) {
    let phase = app.conversation().phase();
    let (title, border_style) = match phase {
        Phase::Empty => ("Open a document: /open <path>", Style::default()),
        Phase::Ready => (
            "Ask a question about the document",
            Style::default().fg(Color::Cyan),
        ),
        Phase::Awaiting => ("Waiting for answer", Style::default().fg(Color::DarkGray)),
    };

    let mut content = app.chat_input().to_string();
    if app.chat_input_enabled() {
        content.push('█');
    }

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border_style),
    );

    frame.render_widget(paragraph, area);
}

/// Renders the search input and result list.
fn render_papers(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let mut content = app.search_input().to_string();
    content.push('█');
    let input = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Enter keywords for arXiv paper search")
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(input, chunks[0]);

    let block = Block::default().borders(Borders::ALL).title("Papers");

    match app.search_outcome() {
        SearchOutcome::NotSearched => {
            let hint = Paragraph::new("Press Enter to search")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(hint, chunks[1]);
        }
        SearchOutcome::Failed(message) => {
            let error = Paragraph::new(format!("Search failed: {message}"))
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: false })
                .block(block);
            frame.render_widget(error, chunks[1]);
        }
        SearchOutcome::Results(records) if records.is_empty() => {
            let empty = Paragraph::new("No papers found for this query.").block(block);
            frame.render_widget(empty, chunks[1]);
        }
        SearchOutcome::Results(records) => {
            let width = chunks[1].width.saturating_sub(4) as usize;
            let items: Vec<ListItem> = records
                .iter()
                .map(|paper| {
                    ListItem::new(vec![
                        Line::from(Span::styled(
                            paper.title.clone(),
                            Style::default().add_modifier(Modifier::BOLD),
                        )),
                        Line::from(truncate(&paper.summary, width.saturating_mul(2))),
                        Line::from(Span::styled(
                            paper.link.to_string(),
                            Style::default()
                                .fg(Color::Blue)
                                .add_modifier(Modifier::UNDERLINED),
                        )),
                        Line::from(""),
                    ])
                })
                .collect();

            let list = List::new(items)
                .block(block)
                .highlight_style(Style::default().bg(Color::DarkGray));

            let mut state = ListState::default();
            state.select(app.selected_paper());
            frame.render_stateful_widget(list, chunks[1], &mut state);
        }
    }
}

fn render_status_line(frame: &mut Frame, app: &App, area: Rect) {
    let line = match app.status() {
        Some(Notice::Info(msg)) => Line::from(Span::raw(msg.as_str())),
        Some(Notice::Warning(msg)) => Line::from(Span::styled(
            msg.as_str(),
            Style::default().fg(Color::Yellow),
        )),
        Some(Notice::Error(msg)) => {
            Line::from(Span::styled(msg.as_str(), Style::default().fg(Color::Red)))
        }
        None => shortcut_line(app),
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn shortcut_line(app: &App) -> Line<'static> {
    let key_style = Style::default().fg(Color::Cyan);
    let sep_style = Style::default().fg(Color::DarkGray);

    let mut spans = vec![
        Span::styled("Esc", key_style),
        Span::raw(": quit"),
        Span::styled(" | ", sep_style),
        Span::styled("Tab", key_style),
        Span::raw(": switch view"),
        Span::styled(" | ", sep_style),
        Span::styled("Enter", key_style),
    ];

    match app.view() {
        View::Chat => {
            spans.push(Span::raw(": send"));
            spans.push(Span::styled(" | ", sep_style));
            spans.push(Span::styled("PgUp/PgDn", key_style));
            spans.push(Span::raw(": scroll"));
            spans.push(Span::styled(" | ", sep_style));
            spans.push(Span::styled("/open /reset", key_style));
        }
        View::Papers => {
            spans.push(Span::raw(": search"));
            spans.push(Span::styled(" | ", sep_style));
            spans.push(Span::styled("Up/Down", key_style));
            spans.push(Span::raw(": select"));
        }
    }

    Line::from(spans)
}

/// Truncates `text` to at most `max` characters, appending an ellipsis.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;
    use crate::arxiv::PaperRecord;
    use ratatui::{Terminal, backend::TestBackend};

    fn render(app: &mut App) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();

        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééééééé", 6), "ééé...");
    }

    #[test]
    fn empty_state_prompts_for_upload() {
        let screen = render(&mut App::new());
        assert!(screen.contains("Please upload a document to begin"));
    }

    #[test]
    fn history_and_pending_indicator_are_rendered() {
        let mut app = App::new();
        let conversation = app.conversation_mut();
        conversation.load_document(Document::new("france.txt", "Paris is the capital."));
        conversation.submit_question("Capital?").unwrap();
        conversation.complete_answer("Paris.").unwrap();
        conversation.submit_question("Population?").unwrap();

        let screen = render(&mut app);
        assert!(screen.contains("Document: france.txt"));
        assert!(screen.contains("Capital?"));
        assert!(screen.contains("Paris."));
        assert!(screen.contains("Generating answer..."));
    }

    #[test]
    fn paper_results_are_rendered() {
        let mut app = App::new();
        app.set_view(View::Papers);
        app.set_search_outcome(SearchOutcome::Results(vec![PaperRecord {
            title: "Attention Is All You Need".to_string(),
            summary: "Transformers.".to_string(),
            link: reqwest::Url::parse("http://arxiv.org/abs/1706.03762v7").unwrap(),
        }]));

        let screen = render(&mut app);
        assert!(screen.contains("Attention Is All You Need"));
        assert!(screen.contains("http://arxiv.org/abs/1706.03762v7"));
    }

    #[test]
    fn zero_results_message_is_rendered() {
        let mut app = App::new();
        app.set_view(View::Papers);
        app.set_search_outcome(SearchOutcome::Results(Vec::new()));

        assert!(render(&mut app).contains("No papers found for this query."));
    }

    #[test]
    fn scrolling_is_clamped_to_history_length() {
        let mut app = App::new();
        let conversation = app.conversation_mut();
        conversation.load_document(Document::new("doc.txt", "text"));
        for i in 0..10 {
            conversation.submit_question(format!("Question {i}")).unwrap();
            conversation.complete_answer(format!("Answer {i}")).unwrap();
        }

        app.scroll_history_up(1000);
        render(&mut app);
        let clamped = app.history_scroll();
        assert!(clamped < 1000);

        app.scroll_history_down(clamped);
        assert_eq!(app.history_scroll(), 0);
        assert!(render(&mut app).contains("Answer 9"));
    }
}

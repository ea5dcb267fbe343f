//! Terminal UI components
//!
//! Built with ratatui. Keyboard-first navigation throughout.

pub mod offers;
pub mod search;
pub mod theme;

pub use theme::Theme;

use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};

use crate::app::{App, InputMode, View};

/// Render the whole screen: form, main panel, status bar, error popup
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    frame.render_widget(Clear, area);
    frame.render_widget(
        Block::default().style(Style::default().bg(Theme::BACKGROUND)),
        area,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(search::FORM_HEIGHT),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    match &app.view {
        View::Search => search::render(frame, chunks[0], chunks[1], app),
        View::Offers(view) => {
            search::render_form(frame, chunks[0], app);
            offers::render(frame, chunks[1], view);
        }
    }
    render_status_bar(frame, chunks[2], app);

    if let Some(ref error) = app.error {
        render_error_popup(frame, area, error);
    }
}

/// Key hints for the current view and mode
pub fn key_hints(app: &App) -> Vec<(&'static str, &'static str)> {
    if app.input_mode == InputMode::Editing {
        return vec![("↵", "search"), ("Tab", "next field"), ("Esc", "results")];
    }
    match app.view {
        View::Search => vec![
            ("/", "search"),
            ("↑↓", "move"),
            ("↵", "offers"),
            ("q", "quit"),
        ],
        View::Offers(_) => vec![
            ("↑↓←→", "move"),
            ("↵", "open"),
            ("s", "sort"),
            ("Esc", "back"),
            ("q", "quit"),
        ],
    }
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = Vec::new();
    for (key, desc) in key_hints(app) {
        spans.push(Span::styled(format!(" {} ", key), Theme::keybind()));
        spans.push(Span::styled(format!("{} ", desc), Theme::dimmed()));
    }

    let right = match &app.view {
        View::Offers(view) if !view.loading.is_loading() => offers::selection_hint(view),
        _ if app.is_busy() => "⟳ loading".to_string(),
        _ => String::new(),
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(right.chars().count() as u16 + 1),
        ])
        .split(area);

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Theme::status_bar()),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(right)
            .style(Theme::status_bar().fg(Theme::SUCCESS))
            .alignment(Alignment::Right),
        chunks[1],
    );
}

fn render_error_popup(frame: &mut Frame, area: Rect, message: &str) {
    let width = (area.width * 3 / 5).max(30).min(area.width);
    let height = 5.min(area.height);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    frame.render_widget(Clear, popup);
    let text = Paragraph::new(message.to_string())
        .style(Theme::error())
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Theme::error())
                .title(Span::styled(" ERROR ", Theme::error())),
        );
    frame.render_widget(text, popup);
}

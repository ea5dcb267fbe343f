//! Search view
//!
//! The three-field search form and the candidate list.

use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph},
};

use crate::app::{App, Field, InputMode, SearchState, TextField};
use crate::catalog;
use crate::models::TitleRecord;
use crate::ui::Theme;

/// Height of the search form, borders included
pub const FORM_HEIGHT: u16 = 3;

/// Render the form in `form_area` and the results in `results_area`
pub fn render(frame: &mut Frame, form_area: Rect, results_area: Rect, app: &App) {
    render_form(frame, form_area, app);
    render_results(frame, results_area, &app.search);
}

pub fn render_form(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(20),
            Constraint::Length(12),
            Constraint::Length(13),
        ])
        .split(area);

    let form = &app.search.form;
    let editing = app.input_mode == InputMode::Editing;
    for (field, label, chunk) in [
        (Field::Title, " TITLE ", chunks[0]),
        (Field::Country, " COUNTRY ", chunks[1]),
        (Field::Language, " LANG ", chunks[2]),
    ] {
        let focused = editing && form.focus == field;
        let input = Paragraph::new(field_text(form.field(field), focused))
            .style(Theme::input())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(if focused {
                        Theme::border_focused()
                    } else {
                        Theme::border()
                    })
                    .title(Span::styled(label, Theme::title())),
            );
        frame.render_widget(input, chunk);
    }
}

/// Field contents with a bar at the cursor when focused
pub fn field_text(field: &TextField, focused: bool) -> String {
    if focused {
        let (before, after) = field.split();
        format!("{}│{}", before, after)
    } else {
        field.value.clone()
    }
}

fn render_results(frame: &mut Frame, area: Rect, search: &SearchState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border())
        .title(Span::styled(
            format!(" RESULTS ({}) ", search.results.len()),
            Theme::title(),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if search.loading.is_loading() {
        let msg = search.loading.message().unwrap_or("Searching...");
        let loading = Paragraph::new(format!("⟳ {}", msg))
            .style(Theme::loading())
            .alignment(Alignment::Center);
        frame.render_widget(loading, inner);
        return;
    }

    if search.results.is_empty() {
        let hint = if search.loading.is_error() {
            "Search failed"
        } else {
            "Type a title and press Enter"
        };
        let empty = Paragraph::new(hint)
            .style(Theme::dimmed())
            .alignment(Alignment::Center);
        frame.render_widget(empty, inner);
        return;
    }

    // Two lines per result
    let visible = (inner.height / 2).max(1) as usize;
    let mut list = search.list.clone();
    list.scroll_into_view(visible);

    let items: Vec<ListItem> = search
        .results
        .iter()
        .enumerate()
        .skip(list.offset)
        .take(visible)
        .map(|(i, record)| result_item(record, i == list.selected, inner.width))
        .collect();
    frame.render_widget(List::new(items), inner);
}

fn result_item(record: &TitleRecord, selected: bool, width: u16) -> ListItem<'static> {
    let year = record
        .release_year
        .map(|y| format!(" ({})", y))
        .unwrap_or_default();
    let runtime = record
        .format_runtime()
        .map(|r| format!("  {}", r))
        .unwrap_or_default();
    let genres = record
        .genre_codes
        .iter()
        .map(|code| catalog::genre_name(code))
        .collect::<Vec<_>>()
        .join(", ");

    let title_style = if selected {
        Theme::list_item_selected()
    } else {
        Theme::text()
    };
    let marker = if selected { "▶ " } else { "  " };
    let headline = Line::from(vec![
        Span::styled(format!("{}{}", marker, record.title), title_style),
        Span::styled(year, Theme::year()),
        Span::styled(runtime, Theme::dimmed()),
        Span::styled(format!("  {}", genres), Theme::genre()),
    ]);

    let max = (width as usize).saturating_sub(4);
    let description: String = record.short_description.chars().take(max).collect();
    let detail = Line::from(Span::styled(format!("  {}", description), Theme::dimmed()));

    ListItem::new(vec![headline, detail])
}

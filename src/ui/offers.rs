//! Offers view
//!
//! Region × service grid for the selected title. Rows are regions ordered by
//! country name, or by the offers in one service column after `s`. Columns
//! are services in display order. The cell under the cursor opens in the
//! browser on Enter when it holds an offer.

use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table},
};

use crate::app::{OfferSort, OfferView};
use crate::catalog;
use crate::models::{offer_label, OfferEntry};
use crate::ui::Theme;

const REGION_WIDTH: u16 = 22;
const SERVICE_WIDTH: u16 = 13;

pub fn render(frame: &mut Frame, area: Rect, view: &OfferView) {
    let year = view
        .title
        .release_year
        .map(|y| format!(" ({})", y))
        .unwrap_or_default();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border_focused())
        .title(Span::styled(
            format!(" {}{} ", view.title.title, year),
            Theme::title(),
        ))
        .title_bottom(Span::styled(
            format!(" {} regions ", view.regions.len()),
            Theme::dimmed(),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if view.loading.is_loading() {
        let msg = view.loading.message().unwrap_or("Fetching offers...");
        let loading = Paragraph::new(format!("⟳ {}", msg))
            .style(Theme::loading())
            .alignment(Alignment::Center);
        frame.render_widget(loading, inner);
        return;
    }

    if view.regions.is_empty() {
        let msg = if view.loading.is_error() {
            "Could not load offers"
        } else {
            "No streaming offers in any region"
        };
        let empty = Paragraph::new(msg)
            .style(Theme::dimmed())
            .alignment(Alignment::Center);
        frame.render_widget(empty, inner);
        return;
    }

    let header = Row::new(
        std::iter::once(Cell::from(header_label("Region", view.sort == OfferSort::Country)))
            .chain(view.services.iter().enumerate().map(|(col, s)| {
                Cell::from(header_label(s, view.sort == OfferSort::Service(col)))
            }))
            .collect::<Vec<_>>(),
    )
    .style(Theme::accent());

    // Header takes one line
    let visible = inner.height.saturating_sub(1).max(1) as usize;
    let mut rows_state = view.rows.clone();
    rows_state.scroll_into_view(visible);

    let rows: Vec<Row> = view
        .regions
        .iter()
        .enumerate()
        .skip(rows_state.offset)
        .take(visible)
        .map(|(row, region)| {
            let selected_row = row == view.rows.selected;
            let name = catalog::country_name(region).unwrap_or(region.as_str());
            let region_style = if selected_row {
                Theme::title()
            } else {
                Theme::text()
            };
            let region_cell = Cell::from(format!("{} ({})", name, region)).style(region_style);
            let cells = std::iter::once(region_cell)
                .chain(view.services.iter().enumerate().map(|(col, service)| {
                    let entry = view.table.entry(region, service);
                    let style = if selected_row && col == view.column {
                        Theme::offer_cursor()
                    } else {
                        cell_style(entry)
                    };
                    Cell::from(offer_label(entry).to_string()).style(style)
                }));
            Row::new(cells.collect::<Vec<_>>())
        })
        .collect();

    let widths = std::iter::once(Constraint::Length(REGION_WIDTH))
        .chain(view.services.iter().map(|_| Constraint::Length(SERVICE_WIDTH)));
    let table = Table::new(rows, widths).header(header).column_spacing(1);
    frame.render_widget(table, inner);
}

/// Column heading, marked when the grid is sorted by it
pub fn header_label(name: &str, sorted: bool) -> String {
    if sorted {
        format!("▾ {}", name)
    } else {
        name.to_string()
    }
}

/// Style for a grid cell by availability
pub fn cell_style(entry: Option<&OfferEntry>) -> Style {
    match entry {
        None => Theme::offer_none(),
        Some(OfferEntry { price: Some(_), .. }) => Theme::offer_priced(),
        Some(_) => Theme::offer_included(),
    }
}

/// Status line text for the selected cell
pub fn selection_hint(view: &OfferView) -> String {
    match (view.selected_service(), view.selected_entry()) {
        (Some(service), Some(OfferEntry { url: Some(_), .. })) => {
            format!("{}: press Enter to open", service)
        }
        (Some(service), Some(_)) => format!("{}: no link", service),
        (Some(service), None) => format!("{}: not available here", service),
        (None, _) => String::new(),
    }
}

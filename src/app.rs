//! App state and core application logic
//!
//! Manages the view state machine and turns key presses into [`Action`]s
//! that the event loop carries out (spawn a lookup, open a URL, quit).
//!
//! Lookups are asynchronous. Each issued request gets a [`RequestId`]; a
//! completion is applied only if it carries the latest id issued for its
//! kind, so a slow earlier response can never overwrite a newer one.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::catalog::ServiceTable;
use crate::models::{NormalizedOfferTable, OfferEntry, TitleRecord};

// =============================================================================
// Input Mode
// =============================================================================

/// Current input mode for keyboard handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Normal navigation mode
    #[default]
    Normal,
    /// Text input mode (search form focused)
    Editing,
}

// =============================================================================
// Loading State
// =============================================================================

/// Loading state for async operations
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadingState {
    #[default]
    Idle,
    /// Loading with optional message
    Loading(Option<String>),
    Error(String),
}

impl LoadingState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LoadingState::Error(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            LoadingState::Loading(Some(msg)) => Some(msg),
            LoadingState::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

// =============================================================================
// Selection State
// =============================================================================

/// Selection state for list views
#[derive(Debug, Clone, Default)]
pub struct ListState {
    /// Currently selected index
    pub selected: usize,
    /// Scroll offset for viewport
    pub offset: usize,
    /// Total number of items
    pub len: usize,
}

impl ListState {
    pub fn new(len: usize) -> Self {
        Self {
            selected: 0,
            offset: 0,
            len,
        }
    }

    pub fn up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            if self.selected < self.offset {
                self.offset = self.selected;
            }
        }
    }

    pub fn down(&mut self) {
        if self.len > 0 && self.selected < self.len - 1 {
            self.selected += 1;
        }
    }

    pub fn page_up(&mut self, page_size: usize) {
        self.selected = self.selected.saturating_sub(page_size);
        if self.selected < self.offset {
            self.offset = self.selected;
        }
    }

    pub fn page_down(&mut self, page_size: usize) {
        if self.len > 0 {
            self.selected = (self.selected + page_size).min(self.len - 1);
        }
    }

    pub fn first(&mut self) {
        self.selected = 0;
        self.offset = 0;
    }

    pub fn last(&mut self) {
        if self.len > 0 {
            self.selected = self.len - 1;
        }
    }

    /// Update offset to keep selected item visible
    pub fn scroll_into_view(&mut self, visible_height: usize) {
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if visible_height > 0 && self.selected >= self.offset + visible_height {
            self.offset = self.selected - visible_height + 1;
        }
    }

    /// Update length and clamp the selection
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if len == 0 {
            self.selected = 0;
            self.offset = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}

// =============================================================================
// Search Form
// =============================================================================

/// Single-line text input; the cursor counts characters, not bytes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextField {
    pub value: String,
    pub cursor: usize,
}

impl TextField {
    pub fn with_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.chars().count(),
        }
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    pub fn insert(&mut self, c: char) {
        let idx = self.byte_index(self.cursor);
        self.value.insert(idx, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let idx = self.byte_index(self.cursor);
            self.value.remove(idx);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let idx = self.byte_index(self.cursor);
            self.value.remove(idx);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Text before and after the cursor
    pub fn split(&self) -> (&str, &str) {
        self.value.split_at(self.byte_index(self.cursor))
    }
}

/// Focusable search form fields, in Tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Title,
    Country,
    Language,
}

impl Field {
    pub fn next(self) -> Self {
        match self {
            Field::Title => Field::Country,
            Field::Country => Field::Language,
            Field::Language => Field::Title,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Field::Title => Field::Language,
            Field::Country => Field::Title,
            Field::Language => Field::Country,
        }
    }
}

/// The three search inputs: title, country, language
#[derive(Debug, Clone, PartialEq)]
pub struct SearchForm {
    pub title: TextField,
    pub country: TextField,
    pub language: TextField,
    pub focus: Field,
}

impl SearchForm {
    pub fn new(country: &str, language: &str) -> Self {
        Self {
            title: TextField::default(),
            country: TextField::with_value(country),
            language: TextField::with_value(language),
            focus: Field::Title,
        }
    }

    pub fn field(&self, field: Field) -> &TextField {
        match field {
            Field::Title => &self.title,
            Field::Country => &self.country,
            Field::Language => &self.language,
        }
    }

    pub fn focused_mut(&mut self) -> &mut TextField {
        match self.focus {
            Field::Title => &mut self.title,
            Field::Country => &mut self.country,
            Field::Language => &mut self.language,
        }
    }
}

impl Default for SearchForm {
    fn default() -> Self {
        Self::new("US", "en")
    }
}

/// Search view state
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub form: SearchForm,
    pub results: Vec<TitleRecord>,
    pub list: ListState,
    pub loading: LoadingState,
}

impl SearchState {
    pub fn selected_result(&self) -> Option<&TitleRecord> {
        self.results.get(self.list.selected)
    }
}

// =============================================================================
// Offers View
// =============================================================================

/// Row order of the offer grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OfferSort {
    /// Alphabetical by country display name
    #[default]
    Country,
    /// By the cell in this service column: included, then priced from
    /// cheapest, then unavailable
    Service(usize),
}

/// Region × service grid for one selected title
#[derive(Debug, Clone)]
pub struct OfferView {
    pub title: TitleRecord,
    pub table: NormalizedOfferTable,
    /// Row order: region codes in `sort` order
    pub regions: Vec<String>,
    pub sort: OfferSort,
    /// Column order: service display names
    pub services: Vec<String>,
    pub rows: ListState,
    pub column: usize,
    pub loading: LoadingState,
}

impl OfferView {
    /// Empty grid waiting for the table to arrive
    pub fn loading(title: TitleRecord, services: &ServiceTable) -> Self {
        Self {
            title,
            table: NormalizedOfferTable::new(),
            regions: Vec::new(),
            sort: OfferSort::Country,
            services: services.display_names().map(str::to_string).collect(),
            rows: ListState::new(0),
            column: 0,
            loading: LoadingState::Loading(Some("Fetching offers in every region...".into())),
        }
    }

    /// Replace the table wholesale
    pub fn set_table(&mut self, table: NormalizedOfferTable) {
        self.table = table;
        self.regions = self.sorted_regions();
        self.rows = ListState::new(self.regions.len());
        self.column = 0;
        self.loading = LoadingState::Idle;
    }

    /// Region codes in the current sort order
    fn sorted_regions(&self) -> Vec<String> {
        let mut regions: Vec<String> = self
            .table
            .regions_by_name()
            .into_iter()
            .map(str::to_string)
            .collect();

        if let OfferSort::Service(col) = self.sort {
            let Some(service) = self.services.get(col) else {
                return regions;
            };
            // Stable sort keeps country-name order within equal cells
            regions.sort_by(|a, b| {
                let a = cell_rank(self.table.entry(a, service));
                let b = cell_rank(self.table.entry(b, service));
                a.0.cmp(&b.0).then(a.1.total_cmp(&b.1))
            });
        }
        regions
    }

    /// Sort by the cursor column, or back to country order when already
    /// sorted by it. The selected region stays selected.
    pub fn toggle_sort(&mut self) {
        self.sort = match self.sort {
            OfferSort::Service(col) if col == self.column => OfferSort::Country,
            _ => OfferSort::Service(self.column),
        };

        let selected = self.selected_region().map(str::to_string);
        self.regions = self.sorted_regions();
        self.rows.first();
        if let Some(index) = selected.and_then(|r| self.regions.iter().position(|x| *x == r)) {
            self.rows.selected = index;
        }
    }

    pub fn selected_region(&self) -> Option<&str> {
        self.regions.get(self.rows.selected).map(String::as_str)
    }

    pub fn selected_service(&self) -> Option<&str> {
        self.services.get(self.column).map(String::as_str)
    }

    /// Entry under the cursor, `None` for an empty cell
    pub fn selected_entry(&self) -> Option<&OfferEntry> {
        let region = self.selected_region()?;
        let service = self.selected_service()?;
        self.table.entry(region, service)
    }

    pub fn left(&mut self) {
        self.column = self.column.saturating_sub(1);
    }

    pub fn right(&mut self) {
        if self.column + 1 < self.services.len() {
            self.column += 1;
        }
    }
}

/// Sort key for a grid cell: included before priced before unavailable,
/// priced cells by amount
fn cell_rank(entry: Option<&OfferEntry>) -> (u8, f64) {
    match entry {
        Some(entry) if entry.price.is_none() => (0, 0.0),
        Some(entry) => (1, entry.price_amount().unwrap_or(f64::MAX)),
        None => (2, 0.0),
    }
}

// =============================================================================
// Views, Requests, Actions
// =============================================================================

/// What the main panel shows
#[derive(Debug, Clone)]
pub enum View {
    Search,
    Offers(OfferView),
}

/// Monotonic tag for issued lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

/// Side effect requested by a key press
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    Search {
        id: RequestId,
        query: String,
        country: String,
        language: String,
    },
    LoadOffers {
        id: RequestId,
        title_id: String,
    },
    OpenUrl(String),
    Quit,
}

// =============================================================================
// Main Application State
// =============================================================================

/// Main application state
#[derive(Debug)]
pub struct App {
    pub view: View,
    pub running: bool,
    pub input_mode: InputMode,
    /// Global error message, cleared on the next key press
    pub error: Option<String>,
    pub search: SearchState,
    pub services: ServiceTable,

    next_request: u64,
    latest_search: Option<RequestId>,
    latest_offers: Option<RequestId>,
}

impl Default for App {
    fn default() -> Self {
        Self::new("US", "en")
    }
}

impl App {
    /// Create an app with the search form prefilled
    pub fn new(country: &str, language: &str) -> Self {
        Self {
            view: View::Search,
            running: true,
            input_mode: InputMode::Editing,
            error: None,
            search: SearchState {
                form: SearchForm::new(country, language),
                ..SearchState::default()
            },
            services: ServiceTable::default(),
            next_request: 0,
            latest_search: None,
            latest_offers: None,
        }
    }

    fn issue(&mut self) -> RequestId {
        self.next_request += 1;
        RequestId(self.next_request)
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.error = Some(msg.into());
    }

    /// Go back one level: leave editing, then leave the offers view
    pub fn back(&mut self) -> bool {
        if self.input_mode == InputMode::Editing {
            self.input_mode = InputMode::Normal;
            return true;
        }
        if let View::Offers(_) = self.view {
            self.view = View::Search;
            // A late table for the view just left must not reopen it
            self.latest_offers = None;
            return true;
        }
        false
    }

    // -------------------------------------------------------------------------
    // Requests
    // -------------------------------------------------------------------------

    /// Issue a search for the current form contents
    pub fn begin_search(&mut self) -> Action {
        let id = self.issue();
        self.latest_search = Some(id);
        self.view = View::Search;
        self.latest_offers = None;
        self.search.loading = LoadingState::Loading(Some("Searching...".into()));

        let form = &self.search.form;
        Action::Search {
            id,
            query: form.title.value.clone(),
            country: form.country.value.clone(),
            language: form.language.value.clone(),
        }
    }

    /// Apply a search result; returns false when it was stale and dropped
    pub fn complete_search(
        &mut self,
        id: RequestId,
        result: Result<Vec<TitleRecord>, String>,
    ) -> bool {
        if self.latest_search != Some(id) {
            tracing::debug!(?id, "discarding stale search result");
            return false;
        }
        self.latest_search = None;

        match result {
            Ok(results) => {
                self.search.list = ListState::new(results.len());
                self.search.results = results;
                self.search.loading = LoadingState::Idle;
            }
            Err(msg) => {
                self.search.loading = LoadingState::Error(msg.clone());
                self.set_error(msg);
            }
        }
        true
    }

    /// Open the offers view for the selected search result
    pub fn begin_offers(&mut self) -> Action {
        let Some(title) = self.search.selected_result().cloned() else {
            return Action::None;
        };
        let id = self.issue();
        self.latest_offers = Some(id);
        let title_id = title.id.clone();
        self.view = View::Offers(OfferView::loading(title, &self.services));
        Action::LoadOffers { id, title_id }
    }

    /// Apply an offers result; returns false when it was stale and dropped
    pub fn complete_offers(
        &mut self,
        id: RequestId,
        result: Result<NormalizedOfferTable, String>,
    ) -> bool {
        if self.latest_offers != Some(id) {
            tracing::debug!(?id, "discarding stale offers result");
            return false;
        }
        self.latest_offers = None;

        let View::Offers(view) = &mut self.view else {
            return false;
        };
        match result {
            Ok(table) => view.set_table(table),
            Err(msg) => {
                view.loading = LoadingState::Error(msg.clone());
                self.error = Some(msg);
            }
        }
        true
    }

    pub fn is_busy(&self) -> bool {
        self.latest_search.is_some() || self.latest_offers.is_some()
    }

    // -------------------------------------------------------------------------
    // Keyboard Event Handling
    // -------------------------------------------------------------------------

    /// Handle a key press and return the side effect it asks for
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        self.error = None;

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return Action::Quit;
        }

        if self.input_mode == InputMode::Editing {
            self.handle_editing_key(key)
        } else {
            self.handle_normal_key(key)
        }
    }

    fn handle_editing_key(&mut self, key: KeyEvent) -> Action {
        let form = &mut self.search.form;
        match key.code {
            KeyCode::Esc => self.input_mode = InputMode::Normal,
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                return self.begin_search();
            }
            KeyCode::Tab => form.focus = form.focus.next(),
            KeyCode::BackTab => form.focus = form.focus.prev(),
            KeyCode::Char(c) => form.focused_mut().insert(c),
            KeyCode::Backspace => form.focused_mut().backspace(),
            KeyCode::Delete => form.focused_mut().delete(),
            KeyCode::Left => form.focused_mut().left(),
            KeyCode::Right => form.focused_mut().right(),
            KeyCode::Home => form.focused_mut().home(),
            KeyCode::End => form.focused_mut().end(),
            _ => {}
        }
        Action::None
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') => {
                self.quit();
                return Action::Quit;
            }
            KeyCode::Char('/') => {
                self.view = View::Search;
                self.latest_offers = None;
                self.input_mode = InputMode::Editing;
                self.search.form.focus = Field::Title;
                return Action::None;
            }
            KeyCode::Esc => {
                self.back();
                return Action::None;
            }
            _ => {}
        }

        match self.view {
            View::Search => self.handle_search_key(key),
            View::Offers(_) => self.handle_offers_key(key),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Action {
        let list = &mut self.search.list;
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => list.up(),
            KeyCode::Down | KeyCode::Char('j') => list.down(),
            KeyCode::PageUp => list.page_up(10),
            KeyCode::PageDown => list.page_down(10),
            KeyCode::Home | KeyCode::Char('g') => list.first(),
            KeyCode::End | KeyCode::Char('G') => list.last(),
            KeyCode::Enter => return self.begin_offers(),
            _ => {}
        }
        Action::None
    }

    fn handle_offers_key(&mut self, key: KeyEvent) -> Action {
        let View::Offers(view) = &mut self.view else {
            return Action::None;
        };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => view.rows.up(),
            KeyCode::Down | KeyCode::Char('j') => view.rows.down(),
            KeyCode::Left | KeyCode::Char('h') => view.left(),
            KeyCode::Right | KeyCode::Char('l') => view.right(),
            KeyCode::PageUp => view.rows.page_up(10),
            KeyCode::PageDown => view.rows.page_down(10),
            KeyCode::Home | KeyCode::Char('g') => view.rows.first(),
            KeyCode::End | KeyCode::Char('G') => view.rows.last(),
            KeyCode::Char('s') => view.toggle_sort(),
            KeyCode::Backspace => {
                self.back();
            }
            KeyCode::Enter | KeyCode::Char('o') => {
                // Empty cells and entries without a url open nothing
                if let Some(url) = view.selected_entry().and_then(|e| e.url.clone()) {
                    return Action::OpenUrl(url);
                }
            }
            _ => {}
        }
        Action::None
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ObjectType, RegionOffers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn record(id: &str) -> TitleRecord {
        TitleRecord {
            id: id.into(),
            object_type: ObjectType::Movie,
            title: format!("Title {}", id),
            url: None,
            poster_url: None,
            short_description: String::new(),
            release_date: String::new(),
            release_year: None,
            runtime_minutes: None,
            genre_codes: vec![],
            imdb_id: None,
            tmdb_id: None,
            scoring: None,
        }
    }

    #[test]
    fn test_list_state_navigation() {
        let mut list = ListState::new(3);
        list.up();
        assert_eq!(list.selected, 0);
        list.down();
        list.down();
        list.down();
        assert_eq!(list.selected, 2);
        list.page_up(10);
        assert_eq!(list.selected, 0);
        list.page_down(10);
        assert_eq!(list.selected, 2);
        list.set_len(1);
        assert_eq!(list.selected, 0);
    }

    #[test]
    fn test_list_state_scroll_into_view() {
        let mut list = ListState::new(20);
        list.selected = 12;
        list.scroll_into_view(5);
        assert_eq!(list.offset, 8);
        list.selected = 3;
        list.scroll_into_view(5);
        assert_eq!(list.offset, 3);
    }

    #[test]
    fn test_text_field_unicode_cursor() {
        let mut field = TextField::with_value("Amélie");
        assert_eq!(field.cursor, 6);
        field.backspace();
        field.left();
        field.insert('é');
        assert_eq!(field.value, "Améléi");
        assert_eq!(field.split(), ("Amélé", "i"));
        field.home();
        field.delete();
        assert_eq!(field.value, "méléi");
    }

    #[test]
    fn test_form_defaults_and_tab_cycle() {
        let mut app = App::default();
        assert_eq!(app.search.form.country.value, "US");
        assert_eq!(app.search.form.language.value, "en");
        assert_eq!(app.input_mode, InputMode::Editing);

        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.search.form.focus, Field::Country);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.search.form.focus, Field::Language);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.search.form.focus, Field::Title);
        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.search.form.focus, Field::Language);
    }

    #[test]
    fn test_enter_issues_search_with_form_values() {
        let mut app = App::new("fr", "fr");
        for c in "amelie".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(
            action,
            Action::Search {
                id: RequestId(1),
                query: "amelie".into(),
                country: "fr".into(),
                language: "fr".into(),
            }
        );
        assert!(app.search.loading.is_loading());
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_stale_search_is_discarded() {
        let mut app = App::default();
        let Action::Search { id: first, .. } = app.begin_search() else {
            panic!("expected search");
        };
        let Action::Search { id: second, .. } = app.begin_search() else {
            panic!("expected search");
        };
        assert!(second > first);

        assert!(app.complete_search(second, Ok(vec![record("tm2")])));
        assert!(!app.complete_search(first, Ok(vec![record("tm1")])));
        assert_eq!(app.search.results[0].id, "tm2");
        assert!(!app.is_busy());
    }

    #[test]
    fn test_enter_on_result_loads_offers() {
        let mut app = App::default();
        app.input_mode = InputMode::Normal;
        let Action::Search { id, .. } = app.begin_search() else {
            panic!("expected search");
        };
        app.complete_search(id, Ok(vec![record("tm1"), record("tm2")]));

        app.handle_key(key(KeyCode::Down));
        let action = app.handle_key(key(KeyCode::Enter));
        let Action::LoadOffers { id, title_id } = action else {
            panic!("expected offers request");
        };
        assert_eq!(title_id, "tm2");
        let View::Offers(view) = &app.view else {
            panic!("expected offers view");
        };
        assert!(view.loading.is_loading());
        assert_eq!(view.services.len(), 8);

        let mut us = RegionOffers::new();
        us.insert("Netflix".into(), Some(OfferEntry::new("https://n", None)));
        us.insert("Apple TV".into(), None);
        let mut table = NormalizedOfferTable::new();
        table.insert("US", us);
        assert!(app.complete_offers(id, Ok(table)));

        let View::Offers(view) = &mut app.view else {
            panic!("expected offers view");
        };
        assert_eq!(view.regions, vec!["US"]);
        view.column = 1; // Netflix
        assert_eq!(app.handle_key(key(KeyCode::Enter)), Action::OpenUrl("https://n".into()));

        // Apple TV has no offer
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.handle_key(key(KeyCode::Enter)), Action::None);
    }

    #[test]
    fn test_sort_by_service_column() {
        let mut table = NormalizedOfferTable::new();
        for (region, apple) in [
            ("US", Some(OfferEntry::new("u", Some("$3.99")))),
            ("FR", Some(OfferEntry::new("f", Some("2,99 €")))),
            ("DE", None),
            ("GB", Some(OfferEntry::new("g", None))),
            ("JP", Some(OfferEntry::new("j", Some("¥500")))),
        ] {
            let mut offers = RegionOffers::new();
            offers.insert("Netflix".into(), Some(OfferEntry::new("n", None)));
            offers.insert("Apple TV".into(), apple);
            table.insert(region, offers);
        }

        let mut view = OfferView::loading(record("tm1"), &ServiceTable::default());
        view.set_table(table);
        assert_eq!(view.sort, OfferSort::Country);
        assert_eq!(view.regions, vec!["FR", "DE", "JP", "GB", "US"]);

        // Apple TV column, cursor on US
        view.column = 2;
        view.rows.last();
        view.toggle_sort();
        assert_eq!(view.sort, OfferSort::Service(2));
        assert_eq!(view.regions, vec!["GB", "FR", "US", "JP", "DE"]);
        assert_eq!(view.selected_region(), Some("US"));

        // Same column again restores country order
        view.toggle_sort();
        assert_eq!(view.sort, OfferSort::Country);
        assert_eq!(view.regions, vec!["FR", "DE", "JP", "GB", "US"]);
        assert_eq!(view.selected_region(), Some("US"));
    }

    #[test]
    fn test_s_key_sorts_offer_grid() {
        let mut app = App::default();
        app.input_mode = InputMode::Normal;
        app.search.results = vec![record("tm1")];
        app.search.list.set_len(1);
        let Action::LoadOffers { id, .. } = app.begin_offers() else {
            panic!("expected offers request");
        };

        let mut table = NormalizedOfferTable::new();
        let mut us = RegionOffers::new();
        us.insert("Amazon Video".into(), Some(OfferEntry::new("a", None)));
        let mut fr = RegionOffers::new();
        fr.insert("Amazon Video".into(), None);
        table.insert("US", us);
        table.insert("FR", fr);
        app.complete_offers(id, Ok(table));

        app.handle_key(key(KeyCode::Char('s')));
        let View::Offers(view) = &app.view else {
            panic!("expected offers view");
        };
        assert_eq!(view.sort, OfferSort::Service(0));
        // Unavailable cells go last
        assert_eq!(view.regions, vec!["US", "FR"]);
    }

    #[test]
    fn test_offers_after_leaving_view_are_dropped() {
        let mut app = App::default();
        app.input_mode = InputMode::Normal;
        app.search.results = vec![record("tm1")];
        app.search.list.set_len(1);

        let Action::LoadOffers { id, .. } = app.begin_offers() else {
            panic!("expected offers request");
        };
        app.handle_key(key(KeyCode::Esc));
        assert!(matches!(app.view, View::Search));
        assert!(!app.complete_offers(id, Ok(NormalizedOfferTable::new())));
        assert!(matches!(app.view, View::Search));
    }

    #[test]
    fn test_search_error_sets_message() {
        let mut app = App::default();
        let Action::Search { id, .. } = app.begin_search() else {
            panic!("expected search");
        };
        app.complete_search(id, Err("Server returned HTTP 500".into()));
        assert!(app.search.loading.is_error());
        assert_eq!(app.error.as_deref(), Some("Server returned HTTP 500"));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = App::default();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(app.handle_key(ctrl_c), Action::Quit);
        assert!(!app.running);

        let mut app = App::default();
        // 'q' is text while editing
        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.running);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), Action::Quit);
    }
}

use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use ratatui::layout::Rect;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::columns::ColumnId;
use crate::debounce::Debouncer;
use crate::domain::{DashConfig, DashError, Message};
use crate::inputter::{InputResult, Inputter};
use crate::map::{self, MapView};
use crate::state::{Derived, FilterValue, SortDirection, ViewController};
use crate::store::Person;
use crate::table::{HeaderGesture, TableView};
use crate::ui;

const PAGE_SIZE_STEP: usize = 5;

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Focus {
    TABLE,
    MAP,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    NORMAL,
    FILTERINPUT,
    POPUP,
}

/// The dashboard: one view controller shared by the table and the map.
pub struct Model {
    pub status: Status,
    modus: Modus,
    focus: Focus,
    controller: ViewController,
    derived: Derived,
    table: TableView,
    map: MapView,
    input: Inputter,
    last_input: InputResult,
    filter_column: Option<ColumnId>,
    debouncer: Debouncer<String>,
    clipboard: Option<Clipboard>,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(
        config: &DashConfig,
        records: Vec<Person>,
        ui_width: u16,
        ui_height: u16,
    ) -> Result<Self, DashError> {
        let clipboard = match Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(e) => {
                warn!("Clipboard not available: {e:?}");
                None
            }
        };
        let mut model = Self::new(config, records, clipboard);
        model.ui_resize(ui_width, ui_height);
        let total = model.records().len();
        model.set_status_message(format!("Loaded {total} records"));
        Ok(model)
    }

    fn new(config: &DashConfig, records: Vec<Person>, clipboard: Option<Clipboard>) -> Self {
        let controller = ViewController::new(Arc::new(records), config);
        let derived = controller.derive();
        Self {
            status: Status::READY,
            modus: Modus::NORMAL,
            focus: Focus::TABLE,
            controller,
            derived,
            table: TableView::default(),
            map: MapView::new(config),
            input: Inputter::default(),
            last_input: InputResult::default(),
            filter_column: None,
            debouncer: Debouncer::new(config.filter_debounce),
            clipboard,
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        }
    }

    // ----------------------------- Read access ----------------------------- //

    pub fn records(&self) -> &[Person] {
        self.controller.records()
    }

    pub fn controller(&self) -> &ViewController {
        &self.controller
    }

    pub fn derived(&self) -> &Derived {
        &self.derived
    }

    pub fn table(&self) -> &TableView {
        &self.table
    }

    pub fn map(&self) -> &MapView {
        &self.map
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn show_help(&self) -> bool {
        self.modus == Modus::POPUP
    }

    /// Column and text of the filter being edited, if any.
    pub fn filter_input(&self) -> Option<(ColumnId, &InputResult)> {
        self.filter_column.map(|c| (c, &self.last_input))
    }

    /// Typed filter text that is not applied yet.
    pub fn filter_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::FILTERINPUT
    }

    /// Record under the table curser.
    pub fn current_record(&self) -> Option<&Person> {
        self.derived
            .page_rows()
            .get(self.table.curser_row)
            .map(|&idx| &self.records()[idx])
    }

    // ------------------------------- Updates ------------------------------- //

    /// Applies filters and sorting given by column key, e.g. from the command
    /// line. Unknown keys and unparsable values are logged and skipped.
    pub fn preset(&mut self, filters: &[(String, String)], sorting: &[(String, SortDirection)]) {
        for (key, text) in filters {
            let Some(column) = ColumnId::from_key(key) else {
                warn!("Ignoring filter for unknown column {key}");
                continue;
            };
            match FilterValue::parse(column.filter_kind(), text) {
                Ok(value) => self.controller.set_filter_by_key(key, value),
                Err(reason) => warn!("Ignoring filter {key}={text}: {reason}"),
            }
        }
        if !sorting.is_empty() {
            let directives: Vec<(&str, SortDirection)> =
                sorting.iter().map(|(key, d)| (key.as_str(), *d)).collect();
            self.controller.set_sort_by_keys(&directives);
        }
        self.refresh();
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), DashError> {
        self.update_at(message, Instant::now())
    }

    /// Applies a message. Called on every loop iteration, also without a
    /// message, so due filter edits get committed.
    pub fn update_at(&mut self, message: Option<Message>, now: Instant) -> Result<(), DashError> {
        if let Some(text) = self.debouncer.poll(now) {
            self.commit_filter(text);
        }

        let Some(msg) = message else {
            return Ok(());
        };
        trace!("Update: Modus {:?}, Focus {:?}, Message {:?}", self.modus, self.focus, msg);

        match self.modus {
            Modus::FILTERINPUT => match msg {
                Message::Quit => self.quit(),
                Message::RawKey(key) => self.raw_input(key, now),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::POPUP => match msg {
                Message::Quit => self.quit(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                Message::Exit | Message::Help | Message::Enter => self.modus = Modus::NORMAL,
                _ => (),
            },
            Modus::NORMAL => match msg {
                Message::Quit => self.quit(),
                Message::Help => self.modus = Modus::POPUP,
                Message::SwitchFocus => self.switch_focus(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                Message::MouseDown(x, y) => {
                    let order = self.controller.column_order().to_vec();
                    self.table.press(&order, x, y);
                }
                Message::MouseUp(x, y) => {
                    let order = self.controller.column_order().to_vec();
                    if let Some(gesture) = self.table.release(&order, x, y) {
                        self.apply_gesture(gesture);
                    }
                }
                msg => match self.focus {
                    Focus::TABLE => self.update_table(msg),
                    Focus::MAP => self.update_map(msg),
                },
            },
        }
        Ok(())
    }

    fn update_table(&mut self, msg: Message) {
        let order = self.controller.column_order().to_vec();
        match msg {
            Message::MoveUp => self.table.move_up(),
            Message::MoveDown => self.table.move_down(self.derived.page_rows().len()),
            Message::MoveLeft => self.table.move_left(&order),
            Message::MoveRight => self.table.move_right(&order),
            Message::NextPage => {
                if self.controller.can_next_page() {
                    self.controller.next_page();
                    self.refresh();
                } else {
                    self.set_status_message("No next page");
                }
            }
            Message::PreviousPage => {
                if self.controller.can_previous_page() {
                    self.controller.previous_page();
                    self.refresh();
                } else {
                    self.set_status_message("No previous page");
                }
            }
            Message::FirstPage => {
                self.controller.first_page();
                self.refresh();
            }
            Message::LastPage => {
                self.controller.last_page();
                self.refresh();
            }
            Message::Grow => {
                let size = self.controller.pagination().page_size + PAGE_SIZE_STEP;
                self.set_page_size(size);
            }
            Message::Shrink => {
                let size = self
                    .controller
                    .pagination()
                    .page_size
                    .saturating_sub(PAGE_SIZE_STEP)
                    .max(PAGE_SIZE_STEP);
                self.set_page_size(size);
            }
            Message::ToggleSort => {
                if let Some(column) = self.table.current_column(&order) {
                    self.apply_gesture(HeaderGesture::ToggleSort(column));
                }
            }
            Message::EditFilter => self.enter_filter_mode(),
            Message::ClearFilter => {
                if let Some(column) = self.table.current_column(&order) {
                    self.controller.set_filter(column, None);
                    self.refresh();
                    self.set_status_message(format!("Cleared filter on {}", column.label()));
                }
            }
            Message::ClearAllFilters => {
                self.controller.clear_filters();
                self.refresh();
                self.set_status_message("Cleared all filters");
            }
            Message::GrabColumn => {
                if let Some(gesture) = self.table.grab(&order) {
                    self.apply_gesture(gesture);
                } else if let Some(column) = self.table.grabbed {
                    self.set_status_message(format!("Moving {}, m to drop", column.label()));
                }
            }
            Message::Exit => {
                if self.table.cancel_grab() {
                    self.set_status_message("Move canceled");
                }
            }
            Message::CopySummary => {
                if let Some(text) = self.current_record().map(map::summary) {
                    self.copy_to_clipboard(text);
                }
            }
            Message::Enter => {
                if let Some(person) = self.current_record().cloned() {
                    self.map.select(&person);
                    self.focus = Focus::MAP;
                }
            }
            _ => (),
        }
    }

    fn update_map(&mut self, msg: Message) {
        let records = Arc::clone(self.controller.records());
        let filtered = Arc::clone(&self.derived.filtered);
        match msg {
            Message::MoveUp => self.map.pan(1, 0),
            Message::MoveDown => self.map.pan(-1, 0),
            Message::MoveLeft => self.map.pan(0, -1),
            Message::MoveRight => self.map.pan(0, 1),
            Message::Grow => self.map.zoom_in(),
            Message::Shrink => self.map.zoom_out(),
            Message::NextPage => self.map.select_next(&records, &filtered, true),
            Message::PreviousPage => self.map.select_next(&records, &filtered, false),
            Message::Enter => {
                if self.map.selected.is_none() {
                    self.map.select_next(&records, &filtered, true);
                }
                self.map.toggle_popup();
            }
            Message::Exit => self.map.show_popup = false,
            Message::FitMarkers => self.map.fit(&records, &filtered),
            Message::ResetMap => self.map.reset(),
            Message::CopySummary => {
                if let Some(text) = self.map.selected_record(&records, &filtered).map(map::summary) {
                    self.copy_to_clipboard(text);
                }
            }
            _ => (),
        }
    }

    /// Recomputes the shared snapshot after the view state changed.
    fn refresh(&mut self) {
        let start_time = Instant::now();
        self.derived = self.controller.derive();
        self.table.clamp_row(self.derived.page_rows().len());
        self.map.sync(self.controller.records(), &self.derived.filtered);
        trace!(
            "Derived {} of {} rows, page {}/{} in {}us",
            self.derived.filtered.len(),
            self.records().len(),
            self.derived.page_index + 1,
            self.derived.page_count,
            start_time.elapsed().as_micros()
        );
    }

    fn apply_gesture(&mut self, gesture: HeaderGesture) {
        debug!("Header gesture {:?}", gesture);
        match gesture {
            HeaderGesture::ToggleSort(column) => {
                self.controller.toggle_sort(column);
                let state = match self.controller.sort_direction(column) {
                    Some(direction) => format!("{direction:?}").to_lowercase(),
                    None => "off".to_string(),
                };
                self.set_status_message(format!("Sort {}: {state}", column.label()));
            }
            HeaderGesture::Reorder(moved, target) => self.controller.reorder_column(moved, target),
        }
        self.refresh();
    }

    fn set_page_size(&mut self, size: usize) {
        self.controller.set_page_size(size);
        self.refresh();
        self.set_status_message(format!("{size} rows per page"));
    }

    fn switch_focus(&mut self) {
        self.table.cancel_grab();
        self.focus = match self.focus {
            Focus::TABLE => Focus::MAP,
            Focus::MAP => Focus::TABLE,
        };
    }

    fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    fn ui_resize(&mut self, width: u16, height: u16) {
        trace!("UI was resized to w:{width}, h:{height}");
        let layout = ui::dashboard_layout(Rect::new(0, 0, width, height));
        self.table.set_area(ui::panel_inner(layout.table));
    }

    // ----------------------------- Filter input ---------------------------- //

    fn enter_filter_mode(&mut self) {
        let order = self.controller.column_order().to_vec();
        let Some(column) = self.table.current_column(&order) else {
            return;
        };
        trace!("Editing filter of {}", column.key());
        let current = self
            .controller
            .filter(column)
            .map(FilterValue::to_input)
            .unwrap_or_default();
        self.input.set(&current);
        self.last_input = self.input.get();
        self.filter_column = Some(column);
        self.debouncer.cancel();
        self.modus = Modus::FILTERINPUT;
    }

    fn raw_input(&mut self, key: KeyEvent, now: Instant) {
        self.last_input = self.input.read(key);
        if self.last_input.finished {
            if self.last_input.canceled {
                self.debouncer.cancel();
                self.set_status_message("Filter edit canceled");
            } else {
                let text = self
                    .debouncer
                    .flush()
                    .unwrap_or_else(|| self.last_input.input.clone());
                self.commit_filter(text);
            }
            self.filter_column = None;
            self.modus = Modus::NORMAL;
        } else if self.last_input.changed {
            self.debouncer.push(self.last_input.input.clone(), now);
        }
    }

    fn commit_filter(&mut self, text: String) {
        let Some(column) = self.filter_column else {
            return;
        };
        match FilterValue::parse(column.filter_kind(), &text) {
            Ok(value) => {
                let cleared = value.is_none();
                self.controller.set_filter(column, value);
                self.refresh();
                if cleared {
                    self.set_status_message(format!("Cleared filter on {}", column.label()));
                } else {
                    self.set_status_message(format!(
                        "Filter on {}: {} of {} records",
                        column.label(),
                        self.derived.filtered.len(),
                        self.records().len()
                    ));
                }
            }
            Err(reason) => self.set_status_message(format!("Invalid filter: {reason}")),
        }
    }

    // ------------------------------ Clipboard ------------------------------ //

    fn copy_to_clipboard(&mut self, text: String) {
        let Some(clipboard) = self.clipboard.as_mut() else {
            error!("Error copying to clipboard: no clipboard available");
            return;
        };
        match clipboard.set_text(text) {
            Ok(_) => {
                info!("Copied summary to clipboard.");
                self.set_status_message("Copied summary to clipboard");
            }
            Err(e) => error!("Error copying to clipboard: {:?}", e),
        }
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }

    pub fn status_message_age(&self) -> std::time::Duration {
        self.last_status_message_update.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::COLUMNS;
    use crate::store::testing::person;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};
    use std::time::Duration;

    fn model_with(records: Vec<Person>) -> Model {
        let mut model = Model::new(&DashConfig::default(), records, None);
        model.ui_resize(140, 40);
        model
    }

    fn three() -> Vec<Person> {
        vec![
            person(1, "Aysel", "Mammadova", 1990, "2024-01-15T09:30:00Z"),
            person(2, "Rashad", "Aliyev", 1985, "2024-02-01T00:00:00Z"),
            person(3, "Aynur", "Huseynova", 2000, "2023-12-31T23:59:00Z"),
        ]
    }

    fn many(n: i64) -> Vec<Person> {
        (1..=n)
            .map(|i| person(i, "Name", "Last", 1960 + i as i32, "2024-01-01"))
            .collect()
    }

    fn send(model: &mut Model, message: Message, now: Instant) {
        model.update_at(Some(message), now).unwrap();
    }

    fn type_keys(model: &mut Model, text: &str, now: Instant) {
        for c in text.chars() {
            send(model, Message::RawKey(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)), now);
        }
    }

    fn key(model: &mut Model, code: KeyCode, now: Instant) {
        send(model, Message::RawKey(KeyEvent::new(code, KeyModifiers::NONE)), now);
    }

    fn table_ids(model: &Model) -> Vec<i64> {
        model.derived().page_rows().iter().map(|&r| model.records()[r].id).collect()
    }

    fn map_ids(model: &Model) -> Vec<i64> {
        map::markers(model.records(), &model.derived().filtered)
            .iter()
            .map(|m| m.id)
            .collect()
    }

    fn header_x(model: &Model, column: ColumnId) -> u16 {
        model
            .table()
            .spans(model.controller().column_order())
            .iter()
            .find(|s| s.column == column)
            .unwrap()
            .x
    }

    fn focus_column(model: &mut Model, column: ColumnId, now: Instant) {
        let pos = model.controller().column_order().iter().position(|&c| c == column).unwrap();
        for _ in 0..pos {
            send(model, Message::MoveRight, now);
        }
    }

    #[test]
    fn debounced_range_filter_drives_table_and_map() {
        let mut model = model_with(three());
        let start = Instant::now();
        focus_column(&mut model, ColumnId::BirthYear, start);
        send(&mut model, Message::EditFilter, start);
        assert!(model.raw_keyevents());
        type_keys(&mut model, "1985..1995", start);

        // Nothing is committed before the delay passed.
        model.update_at(None, start + Duration::from_millis(499)).unwrap();
        assert_eq!(map_ids(&model), vec![1, 2, 3]);

        model.update_at(None, start + Duration::from_millis(500)).unwrap();
        assert_eq!(table_ids(&model), vec![1, 2]);
        assert_eq!(map_ids(&model), vec![1, 2]);
        assert!(model.raw_keyevents());

        key(&mut model, KeyCode::Enter, start + Duration::from_millis(600));
        assert!(!model.raw_keyevents());
        assert_eq!(
            model.controller().filter(ColumnId::BirthYear),
            Some(&FilterValue::Range { min: Some(1985.0), max: Some(1995.0) })
        );
    }

    #[test]
    fn every_keystroke_restarts_the_debounce() {
        let mut model = model_with(three());
        let start = Instant::now();
        focus_column(&mut model, ColumnId::FirstName, start);
        send(&mut model, Message::EditFilter, start);
        type_keys(&mut model, "R", start);
        type_keys(&mut model, "a", start + Duration::from_millis(400));
        model.update_at(None, start + Duration::from_millis(800)).unwrap();
        assert_eq!(map_ids(&model), vec![1, 2, 3]);
        model.update_at(None, start + Duration::from_millis(900)).unwrap();
        assert_eq!(map_ids(&model), vec![2]);
    }

    #[test]
    fn enter_commits_at_once_and_escape_drops_pending_input() {
        let mut model = model_with(three());
        let now = Instant::now();
        focus_column(&mut model, ColumnId::LastName, now);
        send(&mut model, Message::EditFilter, now);
        type_keys(&mut model, "ova", now);
        key(&mut model, KeyCode::Enter, now);
        assert_eq!(map_ids(&model), vec![1, 3]);

        send(&mut model, Message::EditFilter, now);
        assert_eq!(model.filter_input().map(|(_, i)| i.input.clone()), Some("ova".to_string()));
        type_keys(&mut model, "xyz", now);
        key(&mut model, KeyCode::Esc, now);
        model.update_at(None, now + Duration::from_secs(1)).unwrap();
        assert_eq!(map_ids(&model), vec![1, 3]);
        assert!(model.filter_input().is_none());
    }

    #[test]
    fn quit_is_honored_while_editing_a_filter() {
        let mut model = model_with(three());
        let now = Instant::now();
        send(&mut model, Message::EditFilter, now);
        assert!(model.raw_keyevents());
        send(&mut model, Message::Quit, now);
        assert_eq!(model.status, Status::QUITTING);
    }

    #[test]
    fn invalid_filter_input_keeps_the_committed_filter() {
        let mut model = model_with(three());
        let now = Instant::now();
        focus_column(&mut model, ColumnId::Datetime, now);
        send(&mut model, Message::EditFilter, now);
        type_keys(&mut model, "2024-01-15", now);
        key(&mut model, KeyCode::Enter, now);
        assert_eq!(map_ids(&model), vec![1, 2]);

        send(&mut model, Message::EditFilter, now);
        key(&mut model, KeyCode::Home, now);
        type_keys(&mut model, "x", now);
        key(&mut model, KeyCode::Enter, now);
        assert_eq!(map_ids(&model), vec![1, 2]);
        assert!(model.status_message().starts_with("Invalid filter"));
    }

    #[test]
    fn header_click_toggles_sort_and_drag_reorders() {
        let mut model = model_with(three());
        let now = Instant::now();
        let y = model.table().area().y;
        let x = header_x(&model, ColumnId::BirthYear) + 1;

        send(&mut model, Message::MouseDown(x, y), now);
        send(&mut model, Message::MouseUp(x, y), now);
        assert_eq!(table_ids(&model), vec![2, 1, 3]);
        send(&mut model, Message::MouseDown(x, y), now);
        send(&mut model, Message::MouseUp(x, y), now);
        assert_eq!(table_ids(&model), vec![3, 1, 2]);
        send(&mut model, Message::MouseDown(x, y), now);
        send(&mut model, Message::MouseUp(x, y), now);
        assert_eq!(table_ids(&model), vec![1, 2, 3]);

        let from = header_x(&model, ColumnId::PhoneNumber);
        let to = header_x(&model, ColumnId::Id);
        send(&mut model, Message::MouseDown(from, y), now);
        send(&mut model, Message::MouseUp(to, y), now);
        let order = model.controller().column_order();
        assert_eq!(&order[..3], &[ColumnId::PhoneNumber, ColumnId::Id, ColumnId::FirstName]);
        let mut sorted = order.to_vec();
        sorted.sort();
        assert_eq!(sorted, COLUMNS.to_vec());

        // Dropped below the header: nothing changes.
        let before = model.controller().column_order().to_vec();
        send(&mut model, Message::MouseDown(to, y), now);
        send(&mut model, Message::MouseUp(to, y + 3), now);
        assert_eq!(model.controller().column_order(), before.as_slice());
    }

    #[test]
    fn keyboard_sort_cycle_on_birth_year() {
        let mut model = model_with(three());
        let now = Instant::now();
        focus_column(&mut model, ColumnId::BirthYear, now);
        send(&mut model, Message::ToggleSort, now);
        assert_eq!(table_ids(&model), vec![2, 1, 3]);
        send(&mut model, Message::ToggleSort, now);
        assert_eq!(table_ids(&model), vec![3, 1, 2]);
        send(&mut model, Message::ToggleSort, now);
        assert_eq!(table_ids(&model), vec![1, 2, 3]);
    }

    #[test]
    fn paging_stops_at_the_last_page() {
        let mut model = model_with(many(25));
        let now = Instant::now();
        assert_eq!(model.derived().page_count, 3);
        for _ in 0..5 {
            send(&mut model, Message::NextPage, now);
        }
        assert_eq!(model.derived().page_index, 2);
        assert_eq!(table_ids(&model), (21..=25).collect::<Vec<_>>());
        assert_eq!(model.status_message(), "No next page");
        // The map ignores pagination.
        assert_eq!(map_ids(&model).len(), 25);

        send(&mut model, Message::Grow, now);
        assert_eq!(model.controller().pagination().page_size, 15);
        assert_eq!(model.derived().page_index, 1);
        send(&mut model, Message::FirstPage, now);
        send(&mut model, Message::PreviousPage, now);
        assert_eq!(model.status_message(), "No previous page");
    }

    #[test]
    fn enter_on_a_row_selects_the_marker_until_filtered_out() {
        let mut model = model_with(three());
        let now = Instant::now();
        send(&mut model, Message::MoveDown, now);
        send(&mut model, Message::Enter, now);
        assert_eq!(model.focus(), Focus::MAP);
        assert_eq!(model.map().selected, Some(2));
        assert!(model.map().show_popup);

        send(&mut model, Message::SwitchFocus, now);
        send(&mut model, Message::MoveUp, now);
        send(&mut model, Message::EditFilter, now);
        type_keys(&mut model, "1", now);
        key(&mut model, KeyCode::Enter, now);
        assert_eq!(map_ids(&model), vec![1]);
        assert_eq!(model.map().selected, None);
    }

    #[test]
    fn map_keys_never_touch_the_view_state() {
        let mut model = model_with(many(25));
        let now = Instant::now();
        let before = model.controller().state().clone();
        send(&mut model, Message::SwitchFocus, now);
        for msg in [
            Message::NextPage,
            Message::NextPage,
            Message::Grow,
            Message::MoveLeft,
            Message::Enter,
            Message::FitMarkers,
            Message::CopySummary,
        ] {
            send(&mut model, msg, now);
        }
        assert_eq!(model.controller().state(), &before);
        assert_eq!(model.map().selected, Some(2));
        assert!(model.map().show_popup);
    }

    #[test]
    fn presets_resolve_column_keys() {
        let mut model = model_with(three());
        model.preset(
            &[
                ("last_name".into(), "ova".into()),
                ("nickname".into(), "x".into()),
                ("birth_year".into(), "abc".into()),
            ],
            &[("birth_year".into(), SortDirection::Descending)],
        );
        assert_eq!(table_ids(&model), vec![3, 1]);
        assert_eq!(model.controller().state().filters.len(), 1);
    }

    #[test]
    fn empty_store_renders_an_empty_dashboard() {
        let mut model = model_with(Vec::new());
        let now = Instant::now();
        assert_eq!(model.derived().page_count, 0);
        assert!(table_ids(&model).is_empty());
        assert!(map_ids(&model).is_empty());
        assert!(model.current_record().is_none());

        send(&mut model, Message::NextPage, now);
        send(&mut model, Message::LastPage, now);
        send(&mut model, Message::MoveDown, now);
        assert_eq!(model.derived().page_index, 0);
        send(&mut model, Message::SwitchFocus, now);
        send(&mut model, Message::NextPage, now);
        send(&mut model, Message::FitMarkers, now);
        assert_eq!(model.map().selected, None);
    }

    #[test]
    fn copy_without_clipboard_does_not_confirm() {
        let mut model = model_with(three());
        let now = Instant::now();
        send(&mut model, Message::CopySummary, now);
        assert_ne!(model.status_message(), "Copied summary to clipboard");
    }

    #[test]
    fn help_popup_swallows_keys_until_closed() {
        let mut model = model_with(three());
        let now = Instant::now();
        send(&mut model, Message::Help, now);
        assert!(model.show_help());
        send(&mut model, Message::ToggleSort, now);
        assert!(model.controller().state().sorting.is_empty());
        send(&mut model, Message::Exit, now);
        assert!(!model.show_help());
        send(&mut model, Message::Quit, now);
        assert_eq!(model.status, Status::QUITTING);
    }
}

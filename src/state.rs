use chrono::NaiveDateTime;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::columns::{COLUMNS, ColumnId, FilterKind, parse_timestamp};
use crate::domain::DashConfig;
use crate::store::Person;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortDirective {
    pub column: ColumnId,
    pub direction: SortDirection,
}

impl SortDirective {
    pub fn asc(column: ColumnId) -> Self {
        Self {
            column,
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(column: ColumnId) -> Self {
        Self {
            column,
            direction: SortDirection::Descending,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Range { min: Option<f64>, max: Option<f64> },
    Choice(String),
    Since(NaiveDateTime),
}

impl FilterValue {
    pub fn kind(&self) -> FilterKind {
        match self {
            FilterValue::Text(_) => FilterKind::Text,
            FilterValue::Range { .. } => FilterKind::Range,
            FilterValue::Choice(_) => FilterKind::Choice,
            FilterValue::Since(_) => FilterKind::Since,
        }
    }

    /// An empty value is the same as no filter.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Text(s) => s.is_empty(),
            FilterValue::Choice(s) => s.trim().is_empty(),
            FilterValue::Range { min, max } => min.is_none() && max.is_none(),
            FilterValue::Since(_) => false,
        }
    }

    pub fn matches(&self, column: ColumnId, person: &Person, case_sensitive: bool) -> bool {
        match self {
            FilterValue::Text(term) => {
                let value = column.raw_value(person);
                if case_sensitive {
                    value.contains(term.as_str())
                } else {
                    value.to_lowercase().contains(&term.to_lowercase())
                }
            }
            FilterValue::Range { min, max } => match column.numeric_value(person) {
                Some(v) => min.is_none_or(|m| v >= m) && max.is_none_or(|m| v <= m),
                None => false,
            },
            FilterValue::Choice(choice) => column.raw_value(person) == choice.trim(),
            FilterValue::Since(bound) => person.datetime >= *bound,
        }
    }

    /// Parses filter input typed for a column of the given kind.
    /// `Ok(None)` means the input clears the filter.
    pub fn parse(kind: FilterKind, input: &str) -> Result<Option<Self>, String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        match kind {
            FilterKind::Text => Ok(Some(FilterValue::Text(input.to_string()))),
            FilterKind::Choice => Ok(Some(FilterValue::Choice(trimmed.to_string()))),
            FilterKind::Range => {
                let bound = |s: &str| -> Result<Option<f64>, String> {
                    let s = s.trim();
                    if s.is_empty() {
                        Ok(None)
                    } else {
                        s.parse::<f64>()
                            .ok()
                            .filter(|v| v.is_finite())
                            .map(Some)
                            .ok_or_else(|| format!("\"{s}\" is not a number"))
                    }
                };
                let (min, max) = match trimmed.split_once("..") {
                    Some((lo, hi)) => (bound(lo)?, bound(hi)?),
                    None => {
                        let v = bound(trimmed)?;
                        (v, v)
                    }
                };
                let value = FilterValue::Range { min, max };
                Ok((!value.is_empty()).then_some(value))
            }
            FilterKind::Since => parse_timestamp(trimmed)
                .map(|dt| Some(FilterValue::Since(dt)))
                .ok_or_else(|| format!("\"{trimmed}\" is not a date (YYYY-MM-DD [HH:MM])")),
        }
    }

    /// Text form that parses back into the same value.
    pub fn to_input(&self) -> String {
        match self {
            FilterValue::Text(s) | FilterValue::Choice(s) => s.clone(),
            FilterValue::Range { min, max } if min == max && min.is_some() => {
                min.map(|v| v.to_string()).unwrap_or_default()
            }
            FilterValue::Range { min, max } => format!(
                "{}..{}",
                min.map(|v| v.to_string()).unwrap_or_default(),
                max.map(|v| v.to_string()).unwrap_or_default()
            ),
            FilterValue::Since(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page_index: usize,
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub pagination: Pagination,
    pub sorting: Vec<SortDirective>,
    pub filters: Vec<(ColumnId, FilterValue)>, // insertion order
    pub column_order: Vec<ColumnId>,
}

impl ViewState {
    pub fn new(page_size: usize) -> Self {
        Self {
            pagination: Pagination {
                page_index: 0,
                page_size: page_size.max(1),
            },
            sorting: Vec::new(),
            filters: Vec::new(),
            column_order: COLUMNS.to_vec(),
        }
    }
}

/// Result of running the pipeline once. Both views read the same snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Derived {
    pub filtered: Arc<Vec<usize>>, // store order
    pub sorted: Arc<Vec<usize>>,
    pub page_index: usize,
    pub page_count: usize,
    pub page: Range<usize>, // slice of `sorted`
}

impl Derived {
    pub fn page_rows(&self) -> &[usize] {
        &self.sorted[self.page.clone()]
    }

    pub fn can_previous_page(&self) -> bool {
        self.page_index > 0
    }

    pub fn can_next_page(&self) -> bool {
        self.page_index + 1 < self.page_count
    }
}

// -------------------------- Pure pipeline stages -------------------------- //

pub fn derive_filtered(
    records: &[Person],
    filters: &[(ColumnId, FilterValue)],
    case_sensitive: bool,
) -> Vec<usize> {
    if filters.is_empty() {
        return (0..records.len()).collect();
    }
    records
        .par_iter()
        .enumerate()
        .filter(|(_, person)| {
            filters
                .iter()
                .all(|(column, filter)| filter.matches(*column, person, case_sensitive))
        })
        .map(|(idx, _)| idx)
        .collect()
}

pub fn compare_records(a: &Person, b: &Person, sorting: &[SortDirective]) -> Ordering {
    for directive in sorting {
        let ordering = match directive.direction {
            SortDirection::Ascending => directive.column.compare(a, b),
            SortDirection::Descending => directive.column.compare(a, b).reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Stable: equal keys keep their relative order from `filtered`.
pub fn derive_sorted(records: &[Person], filtered: &[usize], sorting: &[SortDirective]) -> Vec<usize> {
    let mut sorted = filtered.to_vec();
    if !sorting.is_empty() {
        sorted.sort_by(|&a, &b| compare_records(&records[a], &records[b], sorting));
    }
    sorted
}

pub fn page_count(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1))
}

pub fn clamp_page(page_index: usize, page_count: usize) -> usize {
    page_index.min(page_count.saturating_sub(1))
}

/// Returns the clamped page index and the row range it covers.
pub fn derive_paged(len: usize, pagination: Pagination) -> (usize, Range<usize>) {
    let size = pagination.page_size.max(1);
    let index = clamp_page(pagination.page_index, page_count(len, size));
    let start = (index * size).min(len);
    let end = (start + size).min(len);
    (index, start..end)
}

/// Removes `moved` and reinserts it at the index `target` had before the move.
pub fn move_column(order: &[ColumnId], moved: ColumnId, target: Option<ColumnId>) -> Vec<ColumnId> {
    let mut new_order = order.to_vec();
    let Some(target) = target else {
        return new_order;
    };
    if moved == target {
        return new_order;
    }
    if let (Some(from), Some(to)) = (
        order.iter().position(|&c| c == moved),
        order.iter().position(|&c| c == target),
    ) {
        let column = new_order.remove(from);
        new_order.insert(to, column);
    }
    new_order
}

// ----------------------------- The controller ----------------------------- //

pub struct ViewController {
    records: Arc<Vec<Person>>,
    state: ViewState,
    filtered: Arc<Vec<usize>>, // follows `state.filters`
    case_sensitive: bool,
    sort_filtered_columns: bool,
}

impl ViewController {
    pub fn new(records: Arc<Vec<Person>>, config: &DashConfig) -> Self {
        let state = ViewState::new(config.page_size);
        let filtered = Arc::new(derive_filtered(
            &records,
            &state.filters,
            config.text_filter_case_sensitive,
        ));
        Self {
            records,
            state,
            filtered,
            case_sensitive: config.text_filter_case_sensitive,
            sort_filtered_columns: config.sort_filtered_columns,
        }
    }

    /// Reruns the filter pass. Called whenever the filter set changes.
    fn refilter(&mut self) {
        self.filtered = Arc::new(derive_filtered(
            &self.records,
            &self.state.filters,
            self.case_sensitive,
        ));
    }

    pub fn records(&self) -> &Arc<Vec<Person>> {
        &self.records
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn column_order(&self) -> &[ColumnId] {
        &self.state.column_order
    }

    pub fn pagination(&self) -> Pagination {
        self.state.pagination
    }

    pub fn filter(&self, column: ColumnId) -> Option<&FilterValue> {
        self.state
            .filters
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, f)| f)
    }

    pub fn sort_direction(&self, column: ColumnId) -> Option<SortDirection> {
        self.state
            .sorting
            .iter()
            .find(|d| d.column == column)
            .map(|d| d.direction)
    }

    pub fn filtered(&self) -> Arc<Vec<usize>> {
        Arc::clone(&self.filtered)
    }

    pub fn derive(&self) -> Derived {
        let filtered = self.filtered();
        let sorted = derive_sorted(&self.records, &filtered, &self.state.sorting);
        let (page_index, page) = derive_paged(sorted.len(), self.state.pagination);
        Derived {
            page_count: page_count(sorted.len(), self.state.pagination.page_size),
            filtered,
            sorted: Arc::new(sorted),
            page_index,
            page,
        }
    }

    pub fn page_count(&self) -> usize {
        page_count(self.filtered.len(), self.state.pagination.page_size)
    }

    /// Page index as seen by readers, clamped to the current page count.
    pub fn page_index(&self) -> usize {
        clamp_page(self.state.pagination.page_index, self.page_count())
    }

    pub fn set_page(&mut self, index: usize) {
        let clamped = clamp_page(index, self.page_count());
        if clamped != index {
            trace!("Clamped page {index} to {clamped}");
        }
        self.state.pagination.page_index = clamped;
    }

    pub fn can_previous_page(&self) -> bool {
        self.page_index() > 0
    }

    pub fn can_next_page(&self) -> bool {
        self.page_index() + 1 < self.page_count()
    }

    pub fn next_page(&mut self) {
        if self.can_next_page() {
            self.state.pagination.page_index = self.page_index() + 1;
        }
    }

    pub fn previous_page(&mut self) {
        if self.can_previous_page() {
            self.state.pagination.page_index = self.page_index() - 1;
        }
    }

    pub fn first_page(&mut self) {
        self.set_page(0);
    }

    pub fn last_page(&mut self) {
        self.set_page(self.page_count().saturating_sub(1));
    }

    pub fn set_page_size(&mut self, size: usize) {
        if size == 0 {
            debug!("Ignoring page size 0");
            return;
        }
        self.state.pagination.page_size = size;
    }

    /// Replaces or clears the filter of `column`. The page index is left alone.
    pub fn set_filter(&mut self, column: ColumnId, value: Option<FilterValue>) {
        let filters = &mut self.state.filters;
        let existing = filters.iter().position(|(c, _)| *c == column);
        match value {
            Some(v) if v.kind() != column.filter_kind() => {
                debug!("Ignoring {:?} filter for column {}", v.kind(), column.key());
                return;
            }
            Some(v) if !v.is_empty() => match existing {
                Some(pos) => filters[pos].1 = v,
                None => filters.push((column, v)),
            },
            _ => {
                if let Some(pos) = existing {
                    filters.remove(pos);
                }
            }
        }
        trace!("Filters: {:?}", self.state.filters);
        self.refilter();

        if self.sort_filtered_columns {
            self.state.sorting = self
                .state
                .filters
                .iter()
                .map(|(c, _)| SortDirective::asc(*c))
                .collect();
        }
    }

    pub fn set_filter_by_key(&mut self, key: &str, value: Option<FilterValue>) {
        match ColumnId::from_key(key) {
            Some(column) => self.set_filter(column, value),
            None => debug!("Ignoring filter for unknown column {key}"),
        }
    }

    pub fn clear_filters(&mut self) {
        self.state.filters.clear();
        self.refilter();
        if self.sort_filtered_columns {
            self.state.sorting.clear();
        }
    }

    /// Empty directives restore store order. Later duplicates of a column are dropped.
    pub fn set_sort(&mut self, directives: Vec<SortDirective>) {
        let mut sorting: Vec<SortDirective> = Vec::with_capacity(directives.len());
        for directive in directives {
            if !sorting.iter().any(|d| d.column == directive.column) {
                sorting.push(directive);
            }
        }
        self.state.sorting = sorting;
    }

    pub fn set_sort_by_keys(&mut self, directives: &[(&str, SortDirection)]) {
        let resolved = directives
            .iter()
            .filter_map(|(key, direction)| {
                ColumnId::from_key(key).map(|column| SortDirective {
                    column,
                    direction: *direction,
                })
            })
            .collect();
        self.set_sort(resolved);
    }

    /// unsorted -> ascending -> descending -> unsorted, single column only.
    pub fn toggle_sort(&mut self, column: ColumnId) {
        let next = match self.sort_direction(column) {
            None => vec![SortDirective::asc(column)],
            Some(SortDirection::Ascending) => vec![SortDirective::desc(column)],
            Some(SortDirection::Descending) => Vec::new(),
        };
        self.set_sort(next);
    }

    pub fn reorder_column(&mut self, moved: ColumnId, target: Option<ColumnId>) {
        self.state.column_order = move_column(&self.state.column_order, moved, target);
        trace!("Column order: {:?}", self.state.column_order);
    }
}

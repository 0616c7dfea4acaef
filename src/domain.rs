use std::fmt;
use std::io::Error;
use std::time::Duration;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

#[derive(Debug)]
pub enum DashError {
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
    MissingColumn(String),
    MalformedRecord {
        row: usize,
        column: String,
        value: String,
    },
    DuplicateId(i64),
}

impl fmt::Display for DashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashError::IoError(e) => write!(f, "io error: {e}"),
            DashError::PolarsError(e) => write!(f, "could not read data: {e}"),
            DashError::LoadingFailed(reason) => write!(f, "loading failed: {reason}"),
            DashError::FileNotFound => write!(f, "data file not found"),
            DashError::PermissionDenied => write!(f, "permission denied reading data file"),
            DashError::UnknownFileType => write!(f, "unknown data file type"),
            DashError::MissingColumn(name) => write!(f, "data file has no column \"{name}\""),
            DashError::MalformedRecord { row, column, value } => {
                write!(f, "record {row}: invalid {column} value \"{value}\"")
            }
            DashError::DuplicateId(id) => write!(f, "record id {id} appears more than once"),
        }
    }
}

impl From<Error> for DashError {
    fn from(err: Error) -> Self {
        DashError::IoError(err)
    }
}

impl From<PolarsError> for DashError {
    fn from(err: PolarsError) -> Self {
        DashError::PolarsError(err)
    }
}

#[derive(Debug, Clone, PartialEq, Setters)]
#[setters(prefix = "with_")]
pub struct DashConfig {
    pub event_poll_time: u64,
    pub page_size: usize,
    pub filter_debounce: Duration,
    pub text_filter_case_sensitive: bool,
    pub sort_filtered_columns: bool,
    pub map_center: (f64, f64), // (latitude, longitude)
    pub map_zoom: u8,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            page_size: 10,
            filter_debounce: Duration::from_millis(500),
            text_filter_case_sensitive: false,
            sort_filtered_columns: false,
            map_center: (52.4402961, 20.6717224),
            map_zoom: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,
    Grow,
    Shrink,
    ToggleSort,
    EditFilter,
    ClearFilter,
    ClearAllFilters,
    GrabColumn,
    CopySummary,
    SwitchFocus,
    FitMarkers,
    ResetMap,
    Enter,
    Exit,
    Help,
    Resize(u16, u16),
    MouseDown(u16, u16),
    MouseUp(u16, u16),
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "\
Table
  ←/→ ↑/↓     move cursor
  n / p       next / previous page
  Home / End  first / last page
  + / -       grow / shrink page size
  s           toggle sort (asc, desc, off)
  f           edit column filter
  x / X       clear column filter / all filters
  m           grab column, move, m to drop
  y           copy row summary
  Enter       show record on map

Map
  arrows      pan
  + / -       zoom in / out
  n / p       next / previous marker
  Enter       toggle popup
  y           copy marker summary
  c / F       recenter / fit markers

Tab switch focus   ? help   Esc close   q quit

Filters: text, 1985..1995, 2024-01-31 12:00";

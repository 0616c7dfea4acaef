use ratatui::layout::Rect;
use tracing::trace;

use crate::columns::ColumnId;

pub const COLUMN_SPACING: u16 = 1;

/// Where a header cell is drawn inside the table panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSpan {
    pub column: ColumnId,
    pub x: u16,
    pub width: u16,
}

/// What a finished header gesture asks the view state to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderGesture {
    ToggleSort(ColumnId),
    Reorder(ColumnId, Option<ColumnId>),
}

/// Cursor and gesture state of the grid. The rows themselves come from the
/// derived snapshot, this only tracks where the user is.
#[derive(Debug, Default)]
pub struct TableView {
    pub curser_row: usize,    // within the current page
    pub curser_column: usize, // position in the column order
    pub offset_column: usize,
    pub grabbed: Option<ColumnId>,
    drag_source: Option<ColumnId>,
    area: Rect, // inside the panel border
}

/// Lays the columns out from `offset` on. The last column is cut to the remaining width.
pub fn header_spans(order: &[ColumnId], offset: usize, area: Rect) -> Vec<HeaderSpan> {
    let mut spans = Vec::new();
    let mut x = area.x;
    for &column in order.iter().skip(offset) {
        if x >= area.right() {
            break;
        }
        let width = column.width().min(area.right() - x);
        spans.push(HeaderSpan { column, x, width });
        x = x.saturating_add(width + COLUMN_SPACING);
    }
    spans
}

impl TableView {
    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn spans(&self, order: &[ColumnId]) -> Vec<HeaderSpan> {
        header_spans(order, self.offset_column, self.area)
    }

    pub fn current_column(&self, order: &[ColumnId]) -> Option<ColumnId> {
        order.get(self.curser_column).copied()
    }

    pub fn column_at(&self, order: &[ColumnId], x: u16, y: u16) -> Option<ColumnId> {
        if y != self.area.y {
            return None;
        }
        self.spans(order)
            .into_iter()
            .find(|s| x >= s.x && x < s.x + s.width)
            .map(|s| s.column)
    }

    pub fn move_left(&mut self, order: &[ColumnId]) {
        self.curser_column = self.curser_column.saturating_sub(1);
        self.scroll_to_curser(order);
    }

    pub fn move_right(&mut self, order: &[ColumnId]) {
        if self.curser_column + 1 < order.len() {
            self.curser_column += 1;
        }
        self.scroll_to_curser(order);
    }

    pub fn move_up(&mut self) {
        self.curser_row = self.curser_row.saturating_sub(1);
    }

    pub fn move_down(&mut self, page_len: usize) {
        if self.curser_row + 1 < page_len {
            self.curser_row += 1;
        }
    }

    /// Keeps the curser inside the current page after the page changed.
    pub fn clamp_row(&mut self, page_len: usize) {
        self.curser_row = self.curser_row.min(page_len.saturating_sub(1));
    }

    fn scroll_to_curser(&mut self, order: &[ColumnId]) {
        if self.curser_column < self.offset_column {
            self.offset_column = self.curser_column;
        }
        // Shift right until the curser column is fully visible.
        while self.offset_column < self.curser_column {
            let spans = self.spans(order);
            let visible = spans.iter().find(|s| Some(s.column) == order.get(self.curser_column).copied());
            match visible {
                Some(s) if s.width == s.column.width() => break,
                _ => self.offset_column += 1,
            }
        }
    }

    /// Keyboard grab. The first call picks the curser column up, the second
    /// drops it onto the column under the curser.
    pub fn grab(&mut self, order: &[ColumnId]) -> Option<HeaderGesture> {
        let current = self.current_column(order)?;
        match self.grabbed.take() {
            None => {
                self.grabbed = Some(current);
                None
            }
            Some(moved) => {
                trace!("Drop {:?} on {:?}", moved, current);
                // Follow the column that was moved.
                if let Some(pos) = crate::state::move_column(order, moved, Some(current))
                    .iter()
                    .position(|&c| c == moved)
                {
                    self.curser_column = pos;
                }
                Some(HeaderGesture::Reorder(moved, Some(current)))
            }
        }
    }

    pub fn cancel_grab(&mut self) -> bool {
        self.drag_source = None;
        self.grabbed.take().is_some()
    }

    pub fn press(&mut self, order: &[ColumnId], x: u16, y: u16) {
        self.drag_source = self.column_at(order, x, y);
        trace!("Header press at {x}:{y} => {:?}", self.drag_source);
    }

    /// Release on the pressed header toggles its sort, on another header
    /// reorders, anywhere else drops onto nothing.
    pub fn release(&mut self, order: &[ColumnId], x: u16, y: u16) -> Option<HeaderGesture> {
        let source = self.drag_source.take()?;
        let target = self.column_at(order, x, y);
        if target == Some(source) {
            Some(HeaderGesture::ToggleSort(source))
        } else {
            Some(HeaderGesture::Reorder(source, target))
        }
    }
}

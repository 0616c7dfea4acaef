use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::{self, border},
    text::{Line, Span, Text},
    widgets::{
        Block, Cell, Clear, Paragraph, Row, Table, TableState, Wrap,
        canvas::{Canvas, Map as WorldMap, MapResolution, Points},
    },
};
use std::time::Duration;

use crate::columns::ColumnId;
use crate::domain::HELP_TEXT;
use crate::map;
use crate::model::{Focus, Model};
use crate::state::SortDirection;
use crate::store::Person;
use crate::table::COLUMN_SPACING;

pub const CMDLINE_HEIGH: u16 = 1;
pub const HEADER_HEIGHT: u16 = 1;
const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct DashLayout {
    pub header: Rect,
    pub table: Rect,
    pub map: Rect,
    pub statusline: Rect,
}

/// Splits the screen. The model uses the same split for mouse hit-testing.
pub fn dashboard_layout(area: Rect) -> DashLayout {
    let [header, body, statusline] = Layout::vertical([
        Constraint::Length(HEADER_HEIGHT),
        Constraint::Fill(1),
        Constraint::Length(CMDLINE_HEIGH),
    ])
    .areas(area);
    let [table, map] =
        Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(body);
    DashLayout {
        header,
        table,
        map,
        statusline,
    }
}

pub fn panel_inner(area: Rect) -> Rect {
    Block::bordered().inner(area)
}

pub fn draw(model: &Model, frame: &mut Frame) {
    let layout = dashboard_layout(frame.area());

    frame.render_widget(
        Paragraph::new(Line::from(" Geo-Dash Dashboard ".bold()))
            .style(Style::default().bg(Color::Blue).fg(Color::White)),
        layout.header,
    );
    draw_table(model, frame, layout.table);
    draw_map(model, frame, layout.map);
    draw_statusline(model, frame, layout.statusline);

    if model.show_help() {
        draw_help(frame);
    }
}

fn panel_block(title: &str, focused: bool) -> Block<'_> {
    let block = Block::bordered().title(Line::from(format!(" {title} ").bold()));
    if focused {
        block.border_set(border::THICK).border_style(Style::default().fg(Color::Cyan))
    } else {
        block
    }
}

fn header_label(model: &Model, column: ColumnId) -> String {
    let controller = model.controller();
    let mut label = column.label().to_string();
    match controller.sort_direction(column) {
        Some(SortDirection::Ascending) => label.push_str(" ▲"),
        Some(SortDirection::Descending) => label.push_str(" ▼"),
        None => {}
    }
    if let Some(filter) = controller.filter(column) {
        label.push_str(&format!(" [{}]", filter.to_input()));
    }
    label
}

fn draw_table(model: &Model, frame: &mut Frame, area: Rect) {
    let focused = model.focus() == Focus::TABLE;
    let controller = model.controller();
    let derived = model.derived();
    let table_view = model.table();
    let order = controller.column_order();
    let spans = table_view.spans(order);
    let curser_column = table_view.current_column(order);

    let header = Row::new(spans.iter().map(|s| {
        let mut style = Style::default().add_modifier(Modifier::BOLD);
        if table_view.grabbed == Some(s.column) {
            style = style.add_modifier(Modifier::REVERSED);
        } else if focused && curser_column == Some(s.column) {
            style = style.fg(Color::Yellow);
        }
        Cell::from(header_label(model, s.column)).style(style)
    }))
    .height(HEADER_HEIGHT);

    let records = model.records();
    let rows = derived.page_rows().iter().map(|&idx| {
        let person = &records[idx];
        Row::new(spans.iter().map(|s| {
            let cell = Cell::from(s.column.display_value(person));
            if focused && curser_column == Some(s.column) {
                cell.style(Style::default().add_modifier(Modifier::BOLD))
            } else {
                cell
            }
        }))
    });

    let enabled = Style::default().fg(Color::Cyan).bold();
    let disabled = Style::default().fg(Color::DarkGray);
    let pager = Line::from(vec![
        Span::styled(
            " ◀ p ",
            if derived.can_previous_page() { enabled } else { disabled },
        ),
        Span::raw(format!(
            " Page {} of {} ",
            derived.page_index + 1,
            derived.page_count.max(1)
        )),
        Span::styled(
            " n ▶ ",
            if derived.can_next_page() { enabled } else { disabled },
        ),
    ]);

    let title = format!(
        "Records {}/{}",
        derived.filtered.len(),
        records.len()
    );
    let widths = spans.iter().map(|s| Constraint::Length(s.width));
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(COLUMN_SPACING)
        .row_highlight_style(Style::default().bg(if focused { Color::DarkGray } else { Color::Reset }))
        .block(panel_block(&title, focused).title_bottom(pager.centered()));

    let mut state = TableState::default().with_selected(Some(table_view.curser_row));
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_map(model: &Model, frame: &mut Frame, area: Rect) {
    let focused = model.focus() == Focus::MAP;
    let map_view = model.map();
    let records = model.records();
    let filtered = &model.derived().filtered;
    let markers = map::markers(records, filtered);
    let selected = map_view.selected_record(records, filtered);

    let coords: Vec<(f64, f64)> = markers
        .iter()
        .filter(|m| Some(m.id) != map_view.selected)
        .map(|m| (m.longitude, m.latitude))
        .collect();

    let title = format!(
        "Map {} markers, z{} ({:.3}, {:.3})",
        markers.len(),
        map_view.zoom,
        map_view.center.0,
        map_view.center.1
    );
    let canvas = Canvas::default()
        .block(panel_block(&title, focused))
        .marker(symbols::Marker::Braille)
        .x_bounds(map_view.x_bounds())
        .y_bounds(map_view.y_bounds())
        .paint(|ctx| {
            ctx.draw(&WorldMap {
                color: Color::DarkGray,
                resolution: MapResolution::High,
            });
            ctx.layer();
            ctx.draw(&Points {
                coords: &coords,
                color: Color::Red,
            });
            if let Some(person) = selected {
                ctx.print(person.longitude, person.latitude, "◉".yellow().bold());
            }
        });
    frame.render_widget(canvas, area);

    if let Some(person) = selected
        && map_view.show_popup
    {
        draw_marker_popup(person, frame, panel_inner(area));
    }
}

fn draw_marker_popup(person: &Person, frame: &mut Frame, area: Rect) {
    let text = map::summary(person);
    let height = (text.lines().count() as u16 + 2).min(area.height);
    let width = (text.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 4).min(area.width);
    let popup = Rect::new(area.right().saturating_sub(width), area.y, width, height);

    let block = Block::bordered()
        .title(Line::from(format!(" {} {} ", person.first_name, person.last_name).bold()))
        .title_bottom(Line::from(" y copy ").centered())
        .border_style(Style::default().fg(Color::Yellow));
    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(text).block(block), popup);
}

fn draw_statusline(model: &Model, frame: &mut Frame, area: Rect) {
    if let Some((column, input)) = model.filter_input() {
        let prompt = format!("Filter {}: ", column.label());
        let x = area.x + (prompt.chars().count() + input.curser_pos) as u16;
        let mut line = Line::from(vec![prompt.bold(), Span::raw(input.input.clone())]);
        if model.filter_pending() {
            line.push_span(" …".dark_gray());
        }
        frame.render_widget(Paragraph::new(line), area);
        frame.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
        return;
    }

    let focus = match model.focus() {
        Focus::TABLE => "TABLE",
        Focus::MAP => "MAP",
    };
    let message = if model.status_message_age() < STATUS_MESSAGE_TIMEOUT {
        model.status_message().to_string()
    } else {
        String::new()
    };
    let [left, right] =
        Layout::horizontal([Constraint::Fill(1), Constraint::Length(24)]).areas(area);
    frame.render_widget(Paragraph::new(message), left);
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            focus.cyan().bold(),
            "  Tab ".into(),
            "?".blue().bold(),
            " help ".into(),
            "q".blue().bold(),
            " quit".into(),
        ]))
        .right_aligned(),
        right,
    );
}

fn draw_help(frame: &mut Frame) {
    let text = Text::from(HELP_TEXT);
    let [area] = Layout::vertical([Constraint::Length(text.height() as u16 + 2)])
        .flex(Flex::Center)
        .areas(frame.area());
    let [area] = Layout::horizontal([Constraint::Length(text.width() as u16 + 4)])
        .flex(Flex::Center)
        .areas(area);
    let block = Block::bordered()
        .title(Line::from(" Help ".bold()).centered())
        .title_bottom(Line::from(" Esc close ").centered())
        .border_set(border::THICK);
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }).block(block), area);
}

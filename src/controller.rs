use std::time::Duration;
use tracing::trace;

use ratatui::crossterm::event::{
    self, Event, KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crate::domain::{DashConfig, DashError, Message};
use crate::model::Model;

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &DashConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    /// Waits up to the poll time for one terminal event and maps it to a Message.
    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, DashError> {
        if !event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(None);
        }
        let message = match event::read()? {
            Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                self.route_key(key, model.raw_keyevents())
            }
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(width, height) => Some(Message::Resize(width, height)),
            _ => None,
        };
        Ok(message)
    }

    /// Ctrl-c quits in every mode, other keys go raw to the filter input while it is open.
    fn route_key(&self, key: event::KeyEvent, raw_keyevents: bool) -> Option<Message> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            Some(Message::Quit)
        } else if raw_keyevents {
            Some(Message::RawKey(key))
        } else {
            self.handle_key(key)
        }
    }

    fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Up | KeyCode::Char('k') => Some(Message::MoveUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Message::MoveDown),
            KeyCode::Left | KeyCode::Char('h') => Some(Message::MoveLeft),
            KeyCode::Right | KeyCode::Char('l') => Some(Message::MoveRight),
            KeyCode::PageDown | KeyCode::Char('n') => Some(Message::NextPage),
            KeyCode::PageUp | KeyCode::Char('p') => Some(Message::PreviousPage),
            KeyCode::Home => Some(Message::FirstPage),
            KeyCode::End => Some(Message::LastPage),
            KeyCode::Char('+') | KeyCode::Char('=') => Some(Message::Grow),
            KeyCode::Char('-') => Some(Message::Shrink),
            KeyCode::Char('s') => Some(Message::ToggleSort),
            KeyCode::Char('f') | KeyCode::Char('/') => Some(Message::EditFilter),
            KeyCode::Char('x') => Some(Message::ClearFilter),
            KeyCode::Char('X') => Some(Message::ClearAllFilters),
            KeyCode::Char('m') => Some(Message::GrabColumn),
            KeyCode::Char('y') => Some(Message::CopySummary),
            KeyCode::Char('F') => Some(Message::FitMarkers),
            KeyCode::Char('c') => Some(Message::ResetMap),
            KeyCode::Tab | KeyCode::BackTab => Some(Message::SwitchFocus),
            KeyCode::Enter => Some(Message::Enter),
            KeyCode::Esc => Some(Message::Exit),
            KeyCode::Char('?') => Some(Message::Help),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }

    fn handle_mouse(&self, mouse: MouseEvent) -> Option<Message> {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                Some(Message::MouseDown(mouse.column, mouse.row))
            }
            MouseEventKind::Up(MouseButton::Left) => Some(Message::MouseUp(mouse.column, mouse.row)),
            _ => None,
        }
    }
}

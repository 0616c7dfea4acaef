use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};
use tracing::trace;

/// Single line editor used for the column filter input.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    curser_pos: usize, // in chars
    finished: bool,
    canceled: bool,
}

#[derive(Default, Clone, Debug, PartialEq)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub curser_pos: usize,
    pub changed: bool,
}

impl Inputter {
    pub fn read(&mut self, key: event::KeyEvent) -> InputResult {
        let before = self.current_input.clone();
        let mut result = match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => self.enter(),
            (KeyCode::Esc, _) => self.escape(),
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Left, _) => self.left(),
            (KeyCode::Right, _) => self.right(),
            (KeyCode::Home, _) => self.home(),
            (KeyCode::End, _) => self.end(),
            (kc, km) => self.key(kc, km),
        };
        result.changed = !result.canceled && result.input != before;
        trace!("Input: {:?}", result);
        result
    }

    /// Replaces the content and puts the curser at the end.
    pub fn set(&mut self, s: &str) {
        self.current_input = s.to_string();
        self.curser_pos = s.chars().count();
        self.finished = false;
        self.canceled = false;
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            canceled: self.canceled,
            finished: self.finished,
            input: self.current_input.clone(),
            curser_pos: self.curser_pos,
            changed: false,
        }
    }

    pub fn clear(&mut self) {
        self.canceled = false;
        self.finished = false;
        self.current_input.clear();
        self.curser_pos = 0;
    }

    fn enter(&mut self) -> InputResult {
        self.finished = true;
        self.get()
    }

    fn escape(&mut self) -> InputResult {
        self.clear();
        self.canceled = true;
        self.finished = true;
        self.get()
    }

    fn backspace(&mut self) -> InputResult {
        if self.curser_pos > 0 {
            self.curser_pos -= 1;
            self.current_input.remove(self.getbytepos());
        }
        self.get()
    }

    fn delete(&mut self) -> InputResult {
        if self.curser_pos < self.current_input.chars().count() {
            self.current_input.remove(self.getbytepos());
        }
        self.get()
    }

    fn left(&mut self) -> InputResult {
        self.curser_pos = self.curser_pos.saturating_sub(1);
        self.get()
    }

    fn right(&mut self) -> InputResult {
        if self.curser_pos < self.current_input.chars().count() {
            self.curser_pos += 1;
        }
        self.get()
    }

    fn home(&mut self) -> InputResult {
        self.curser_pos = 0;
        self.get()
    }

    fn end(&mut self) -> InputResult {
        self.curser_pos = self.current_input.chars().count();
        self.get()
    }

    fn key(&mut self, code: KeyCode, modifier: KeyModifiers) -> InputResult {
        if modifier.contains(KeyModifiers::CONTROL) {
            return self.get();
        }
        if let Some(chr) = code.as_char() {
            self.current_input.insert(self.getbytepos(), chr);
            self.curser_pos += 1;
        }
        self.get()
    }

    fn getbytepos(&self) -> usize {
        self.current_input
            .char_indices()
            .nth(self.curser_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn press(input: &mut Inputter, code: KeyCode) -> InputResult {
        input.read(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(input: &mut Inputter, s: &str) {
        for c in s.chars() {
            press(input, KeyCode::Char(c));
        }
    }

    #[test]
    fn typing_and_editing_in_the_middle() {
        let mut input = Inputter::default();
        type_str(&mut input, "1995");
        press(&mut input, KeyCode::Home);
        let r = press(&mut input, KeyCode::Char('.'));
        assert_eq!(r.input, ".1995");
        assert!(r.changed);
        type_str(&mut input, ".");
        press(&mut input, KeyCode::Home);
        type_str(&mut input, "1985");
        assert_eq!(input.get().input, "1985..1995");

        press(&mut input, KeyCode::End);
        let r = press(&mut input, KeyCode::Backspace);
        assert_eq!(r.input, "1985..199");
        press(&mut input, KeyCode::Home);
        let r = press(&mut input, KeyCode::Delete);
        assert_eq!(r.input, "985..199");
        let r = press(&mut input, KeyCode::Left);
        assert!(!r.changed);
    }

    #[test]
    fn multibyte_characters_keep_curser_consistent() {
        let mut input = Inputter::default();
        input.set("Doğ");
        assert_eq!(input.get().curser_pos, 3);
        press(&mut input, KeyCode::Backspace);
        assert_eq!(input.get().input, "Do");
        type_str(&mut input, "ğum");
        assert_eq!(input.get().input, "Doğum");
    }

    #[test]
    fn enter_finishes_and_escape_cancels() {
        let mut input = Inputter::default();
        type_str(&mut input, "Ali");
        let r = press(&mut input, KeyCode::Enter);
        assert!(r.finished && !r.canceled);
        assert_eq!(r.input, "Ali");

        input.set("Ali");
        let r = press(&mut input, KeyCode::Esc);
        assert!(r.finished && r.canceled);
        assert!(!r.changed);
        assert_eq!(r.input, "");
    }
}

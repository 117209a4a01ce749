use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

/// Single-line text input with a byte-offset cursor on char boundaries.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TextInput {
    pub input: String,
    pub cursor_position: usize,
}

impl TextInput {
    /// Replace the text and put the cursor at its end.
    pub fn set(&mut self, text: impl Into<String>) {
        self.input = text.into();
        self.cursor_position = self.input.len();
    }

    pub fn text(&self) -> &str {
        &self.input
    }

    /// Insert a character at the current cursor position.
    pub fn input_char(&mut self, c: char) {
        self.input.insert(self.cursor_position, c);
        self.cursor_position += c.len_utf8();
    }

    /// Delete the character before the cursor (backspace).
    pub fn delete_char(&mut self) {
        if let Some(prev) = self.input[..self.cursor_position].chars().next_back() {
            self.cursor_position -= prev.len_utf8();
            self.input.remove(self.cursor_position);
        }
    }

    pub fn move_cursor_left(&mut self) {
        if let Some(prev) = self.input[..self.cursor_position].chars().next_back() {
            self.cursor_position -= prev.len_utf8();
        }
    }

    pub fn move_cursor_right(&mut self) {
        if let Some(next) = self.input[self.cursor_position..].chars().next() {
            self.cursor_position += next.len_utf8();
        }
    }

    pub fn cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor_position = self.input.len();
    }
}

/// Renders a [`TextInput`], showing the cursor block when focused.
pub struct PathInputWidget<'a> {
    state: &'a TextInput,
    focused: bool,
    block: Option<Block<'a>>,
}

impl<'a> PathInputWidget<'a> {
    pub fn new(state: &'a TextInput, focused: bool) -> Self {
        Self {
            state,
            focused,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl<'a> Widget for PathInputWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let input = &self.state.input;
        let cursor_pos = self.state.cursor_position;
        let max_width = inner.width as usize;

        let before = &input[..cursor_pos];
        let (cursor_char, after) = match input[cursor_pos..].chars().next() {
            Some(c) => (
                &input[cursor_pos..cursor_pos + c.len_utf8()],
                &input[cursor_pos + c.len_utf8()..],
            ),
            None => (" ", ""),
        };

        // Keep the cursor on screen by dropping leading characters.
        let before_chars = before.chars().count();
        let keep = max_width.saturating_sub(2);
        let before_display = if before_chars > keep {
            let skip = before
                .char_indices()
                .nth(before_chars - keep)
                .map_or(0, |(i, _)| i);
            &before[skip..]
        } else {
            before
        };

        let input_style = Style::default().fg(Color::White);
        let cursor_style = if self.focused {
            Style::default()
                .bg(Color::White)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD)
        } else {
            input_style
        };

        let line = Line::from(vec![
            Span::styled(before_display, input_style),
            Span::styled(cursor_char, cursor_style),
            Span::styled(after, input_style),
        ]);
        buf.set_line(inner.x, inner.y, &line, inner.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_char_inserts() {
        let mut input = TextInput::default();
        input.input_char('a');
        input.input_char('b');
        input.input_char('c');
        assert_eq!(input.input, "abc");
        assert_eq!(input.cursor_position, 3);
    }

    #[test]
    fn delete_char_removes() {
        let mut input = TextInput::default();
        input.input_char('a');
        input.input_char('b');
        input.delete_char();
        assert_eq!(input.input, "a");
        assert_eq!(input.cursor_position, 1);
    }

    #[test]
    fn delete_char_at_start_is_noop() {
        let mut input = TextInput::default();
        input.delete_char();
        assert!(input.input.is_empty());
        assert_eq!(input.cursor_position, 0);
    }

    #[test]
    fn cursor_left_right_respects_multibyte() {
        let mut input = TextInput::default();
        input.input_char('é');
        input.input_char('x');
        input.move_cursor_left();
        assert_eq!(input.cursor_position, 2);
        input.move_cursor_left();
        assert_eq!(input.cursor_position, 0);
        input.move_cursor_left();
        assert_eq!(input.cursor_position, 0);
        input.move_cursor_right();
        assert_eq!(input.cursor_position, 2);
    }

    #[test]
    fn cursor_home_end() {
        let mut input = TextInput::default();
        input.set("/home/me");
        assert_eq!(input.cursor_position, 8);
        input.cursor_home();
        assert_eq!(input.cursor_position, 0);
        input.cursor_end();
        assert_eq!(input.cursor_position, 8);
    }

    #[test]
    fn renders_tail_of_long_input() {
        let mut input = TextInput::default();
        input.set("/very/long/path/name");
        let area = Rect::new(0, 0, 8, 1);
        let mut buf = Buffer::empty(area);
        PathInputWidget::new(&input, true).render(area, &mut buf);
        let rendered: String = (0..8)
            .map(|x| buf.cell((x, 0)).unwrap().symbol().to_string())
            .collect();
        assert!(rendered.starts_with("h/name"));
    }
}

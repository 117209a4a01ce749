use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::focus::ControlKind;

/// Read-only lines with a scroll offset.
///
/// With `follow` set, appending keeps the last line in view as long as the
/// view was showing the last line before. Scrolling back detaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextView {
    lines: Vec<String>,
    scroll: usize,
    height: usize,
    follow: bool,
    scrollable: bool,
}

impl Default for TextView {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            scroll: 0,
            height: 1,
            follow: false,
            scrollable: true,
        }
    }
}

impl TextView {
    /// State for a `ControlKind::Text` control.
    pub fn from_kind(kind: &ControlKind) -> Self {
        let scrollable = match kind {
            ControlKind::Text { scrollable } => *scrollable,
            _ => true,
        };
        Self {
            scrollable,
            ..Default::default()
        }
    }

    pub fn follow(mut self, follow: bool) -> Self {
        self.follow = follow;
        self
    }

    pub fn set_lines(&mut self, lines: Vec<String>) {
        self.lines = lines;
        self.scroll = 0;
        if self.follow {
            self.scroll = self.max_scroll();
        }
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        let at_bottom = self.at_bottom();
        self.lines.push(line.into());
        self.stick_to_bottom(at_bottom);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.scroll = 0;
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn set_height(&mut self, height: usize) {
        let at_bottom = self.at_bottom();
        self.height = height.max(1);
        self.scroll = self.scroll.min(self.max_scroll());
        self.stick_to_bottom(at_bottom);
    }

    pub fn scroll_up(&mut self) {
        if self.scrollable {
            self.scroll = self.scroll.saturating_sub(1);
        }
    }

    pub fn scroll_down(&mut self) {
        if self.scrollable {
            self.scroll = (self.scroll + 1).min(self.max_scroll());
        }
    }

    pub fn page_up(&mut self) {
        if self.scrollable {
            self.scroll = self.scroll.saturating_sub(self.page());
        }
    }

    pub fn page_down(&mut self) {
        if self.scrollable {
            self.scroll = (self.scroll + self.page()).min(self.max_scroll());
        }
    }

    fn page(&self) -> usize {
        self.height.saturating_sub(1).max(1)
    }

    fn max_scroll(&self) -> usize {
        self.lines.len().saturating_sub(self.height)
    }

    fn at_bottom(&self) -> bool {
        self.scroll >= self.max_scroll()
    }

    fn stick_to_bottom(&mut self, was_at_bottom: bool) {
        if self.follow && was_at_bottom {
            self.scroll = self.max_scroll();
        }
    }
}

pub struct TextViewWidget<'a> {
    state: &'a TextView,
    block: Option<Block<'a>>,
}

impl<'a> TextViewWidget<'a> {
    pub fn new(state: &'a TextView) -> Self {
        Self { state, block: None }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl<'a> Widget for TextViewWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let visible = self
            .state
            .lines
            .iter()
            .skip(self.state.scroll)
            .take(inner.height as usize);
        for (row, text) in visible.enumerate() {
            let line = Line::from(Span::styled(
                text.as_str(),
                Style::default().fg(Color::White),
            ));
            buf.set_line(inner.x, inner.y + row as u16, &line, inner.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("line {}", i)).collect()
    }

    #[test]
    fn scroll_is_clamped_to_content() {
        let mut view = TextView::default();
        view.set_height(4);
        view.set_lines(numbered(6));
        view.page_down();
        view.page_down();
        assert_eq!(view.scroll(), 2);
        view.page_up();
        view.scroll_up();
        assert_eq!(view.scroll(), 0);
    }

    #[test]
    fn following_view_tracks_new_lines() {
        let mut view = TextView::default().follow(true);
        view.set_height(3);
        for line in numbered(5) {
            view.push_line(line);
        }
        assert_eq!(view.scroll(), 2);
    }

    #[test]
    fn resize_keeps_scrolled_back_position() {
        let mut view = TextView::default().follow(true);
        view.set_height(3);
        for line in numbered(10) {
            view.push_line(line);
        }
        assert_eq!(view.scroll(), 7);

        view.page_up();
        assert_eq!(view.scroll(), 5);
        view.set_height(3);
        assert_eq!(view.scroll(), 5);
        view.push_line("line 10");
        assert_eq!(view.scroll(), 5);

        view.page_down();
        view.page_down();
        assert_eq!(view.scroll(), 8);
        view.push_line("line 11");
        assert_eq!(view.scroll(), 9);
    }

    #[test]
    fn fixed_text_ignores_scroll_keys() {
        let mut view = TextView::from_kind(&ControlKind::Text { scrollable: false });
        view.set_height(2);
        view.set_lines(numbered(6));
        view.scroll_down();
        view.page_down();
        assert_eq!(view.scroll(), 0);
    }

    #[test]
    fn short_text_never_scrolls() {
        let mut view = TextView::default();
        view.set_height(10);
        view.set_lines(numbered(3));
        view.scroll_down();
        assert_eq!(view.scroll(), 0);
    }

    #[test]
    fn renders_from_scroll_offset() {
        let mut view = TextView::default();
        view.set_height(2);
        view.set_lines(numbered(4));
        view.scroll_down();
        let area = Rect::new(0, 0, 10, 2);
        let mut buf = Buffer::empty(area);
        TextViewWidget::new(&view).render(area, &mut buf);
        let first: String = (0..6)
            .map(|x| buf.cell((x, 0)).unwrap().symbol().to_string())
            .collect();
        assert_eq!(first, "line 1");
    }
}

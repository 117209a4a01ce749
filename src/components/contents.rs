use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

/// File names of the selected directory, with cursor and scroll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentList {
    items: Vec<String>,
    selected: usize,
    scroll: usize,
    height: usize,
}

impl Default for ContentList {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected: 0,
            scroll: 0,
            height: 1,
        }
    }
}

impl ContentList {
    pub fn set_items(&mut self, items: Vec<String>) {
        self.items = items;
        self.selected = 0;
        self.scroll = 0;
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn selected(&self) -> Option<&str> {
        self.items.get(self.selected).map(String::as_str)
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = height.max(1);
        self.update_scroll();
    }

    pub fn move_up(&mut self) {
        self.move_by(-1);
    }

    pub fn move_down(&mut self) {
        self.move_by(1);
    }

    /// Move by `height - 1` rows.
    pub fn page_up(&mut self) {
        let step = self.height.saturating_sub(1).max(1) as isize;
        self.move_by(-step);
    }

    pub fn page_down(&mut self) {
        let step = self.height.saturating_sub(1).max(1) as isize;
        self.move_by(step);
    }

    pub fn move_to_top(&mut self) {
        self.selected = 0;
        self.update_scroll();
    }

    pub fn move_to_bottom(&mut self) {
        self.selected = self.items.len().saturating_sub(1);
        self.update_scroll();
    }

    fn move_by(&mut self, delta: isize) {
        let last = self.items.len().saturating_sub(1);
        self.selected = self.selected.saturating_add_signed(delta).min(last);
        self.update_scroll();
    }

    fn update_scroll(&mut self) {
        if self.selected < self.scroll {
            self.scroll = self.selected;
        } else if self.selected >= self.scroll + self.height {
            self.scroll = self.selected + 1 - self.height;
        }
    }
}

pub struct ContentListWidget<'a> {
    state: &'a ContentList,
    focused: bool,
    block: Option<Block<'a>>,
}

impl<'a> ContentListWidget<'a> {
    pub fn new(state: &'a ContentList, focused: bool) -> Self {
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

impl<'a> Widget for ContentListWidget<'a> {
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
            .items
            .iter()
            .enumerate()
            .skip(self.state.scroll)
            .take(inner.height as usize);
        for (row, (idx, name)) in visible.enumerate() {
            let style = if idx == self.state.selected && self.focused {
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Green)
            };
            let line = Line::from(Span::styled(name.as_str(), style));
            buf.set_line(inner.x, inner.y + row as u16, &line, inner.width);
        }
    }
}

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Widget},
};

use crate::focus::Control;

/// `value * num / den` without overflowing `u16`.
pub fn scaled(value: u16, num: u32, den: u32) -> u16 {
    (value as u32 * num / den.max(1)).min(u16::MAX as u32) as u16
}

/// Calculate a centered rectangle within the given area.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + area.width.saturating_sub(w) / 2;
    let y = area.y + area.height.saturating_sub(h) / 2;
    Rect::new(x, y, w, h)
}

/// Clear `rect` and draw a modal frame around it, returning the inner area.
pub fn render_frame(title: &str, rect: Rect, buf: &mut Buffer) -> Rect {
    Clear.render(rect, buf);
    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .padding(Padding::horizontal(1));
    let inner = block.inner(rect);
    block.render(rect, buf);
    inner
}

/// Bordered panel block; cyan when one of its controls has focus.
pub fn panel_block(title: &str, focused: bool) -> Block<'static> {
    let color = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
}

/// A one-line `[ label ]` button.
pub struct ButtonWidget<'a> {
    label: &'a str,
    focused: bool,
}

impl<'a> ButtonWidget<'a> {
    pub fn new(label: &'a str, focused: bool) -> Self {
        Self { label, focused }
    }

    /// Button captioned with the label of a `ControlKind::Button` control.
    pub fn for_control(control: &'a Control, focused: bool) -> Self {
        Self::new(control.label(), focused)
    }
}

impl<'a> Widget for ButtonWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let style = if self.focused {
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let line = Line::from(Span::styled(format!("[ {} ]", self.label), style));
        buf.set_line(area.x, area.y, &line, area.width);
    }
}

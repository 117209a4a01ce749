use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// Status bar widget that displays the current context, key hints, or status messages.
pub struct StatusBarWidget<'a> {
    context: &'a str,
    key_hints: &'a str,
    status_message: Option<&'a str>,
    is_error: bool,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(context: &'a str, key_hints: &'a str) -> Self {
        Self {
            context,
            key_hints,
            status_message: None,
            is_error: false,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }
}

/// Keep the last `budget` characters, marking the cut with an ellipsis.
fn truncate_left(text: &str, budget: usize) -> String {
    let len = text.chars().count();
    if len <= budget {
        return text.to_string();
    }
    if budget <= 3 {
        return text.chars().take(budget).collect();
    }
    let tail: String = text.chars().skip(len - (budget - 3)).collect();
    format!("...{}", tail)
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default().bg(Color::Red).fg(Color::White)
            } else {
                Style::default().fg(Color::Green)
            };
            let display: String = msg.chars().take(width).collect();
            let display = format!("{:<width$}", display, width = width);
            let line = Line::from(Span::styled(display, style));
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        let hints_len = self.key_hints.chars().count();
        let budget = width.saturating_sub(hints_len).saturating_sub(1);
        let context = truncate_left(self.context, budget);
        let gap = width
            .saturating_sub(context.chars().count())
            .saturating_sub(hints_len);

        let spans = vec![
            Span::styled(context, Style::default().fg(Color::White)),
            Span::raw(" ".repeat(gap)),
            Span::styled(
                self.key_hints,
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::DIM),
            ),
        ];
        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(widget: StatusBarWidget<'_>, width: u16) -> (String, Buffer) {
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        let content = (0..width)
            .map(|x| buf.cell((x, 0)).unwrap().symbol().to_string())
            .collect();
        (content, buf)
    }

    #[test]
    fn status_message_error_style() {
        let widget = StatusBarWidget::new("/path", "tab:focus")
            .status_message("This folder does not appear to be a valid training package", true);
        let (content, buf) = rendered(widget, 80);
        assert!(content.contains("valid training package"));
        assert_eq!(buf.cell((0, 0)).unwrap().bg, Color::Red);
    }

    #[test]
    fn normal_bar_shows_context_and_hints() {
        let widget = StatusBarWidget::new("/home/user/dojo", "tab:focus  esc:back");
        let (content, _) = rendered(widget, 60);
        assert!(content.starts_with("/home/user/dojo"));
        assert!(content.trim_end().ends_with("esc:back"));
    }

    #[test]
    fn long_context_is_cut_from_the_left() {
        assert_eq!(truncate_left("/a/very/long/path", 8), ".../path");
        assert_eq!(truncate_left("/short", 8), "/short");
    }

    #[test]
    fn zero_area_does_not_panic() {
        let widget = StatusBarWidget::new("/path", "hints");
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
    }
}

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::fs::listing::EntryKind;
use crate::fs::tree::{FlatRow, LoadState, Row};
use crate::navigator::TreeNavigator;

/// Tree widget that renders the navigator rows with box-drawing characters.
pub struct TreeWidget<'a> {
    navigator: &'a TreeNavigator,
    focused: bool,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(navigator: &'a TreeNavigator, focused: bool) -> Self {
        Self {
            navigator,
            focused,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    /// Build the indentation prefix from the last-sibling flags of the ancestors.
    fn build_prefix(row: &FlatRow, rows: &[FlatRow], index: usize) -> String {
        if row.depth == 0 {
            return String::new();
        }

        let mut parts: Vec<&str> = Vec::new();
        for d in 1..row.depth {
            let mut ancestor_is_last = false;
            for j in (0..index).rev() {
                if rows[j].depth == d {
                    ancestor_is_last = rows[j].is_last_sibling;
                    break;
                }
                if rows[j].depth < d {
                    break;
                }
            }
            parts.push(if ancestor_is_last { "   " } else { "│  " });
        }
        parts.push(if row.is_last_sibling { "└──" } else { "├──" });
        parts.join("")
    }

    fn label(&self, row: Row) -> (String, Style) {
        let tree = self.navigator.tree();
        match row {
            Row::Node(id) => {
                let Some(node) = tree.get(id) else {
                    return (String::new(), Style::default());
                };
                let marker = match (node.kind, node.load, node.extended) {
                    (EntryKind::Unknown, _, _) => "[?] ",
                    (_, LoadState::Loaded, true) => "[-] ",
                    _ => "[+] ",
                };
                let style = match node.kind {
                    EntryKind::Directory => Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                    EntryKind::File => Style::default().fg(Color::Green),
                    EntryKind::Unknown => Style::default().fg(Color::Red),
                };
                (format!("{}{}", marker, node.name), style)
            }
            Row::More { .. } => (
                "...".to_string(),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ),
            Row::Loading { .. } => (
                "loading...".to_string(),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ),
        }
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let rows = self.navigator.rows();
        let cursor = self.navigator.cursor();
        let visible_height = inner_area.height as usize;
        if rows.is_empty() || visible_height == 0 {
            return;
        }

        let visible_rows = rows
            .iter()
            .enumerate()
            .skip(self.navigator.scroll())
            .take(visible_height);

        for (i, (idx, row)) in visible_rows.enumerate() {
            let y = inner_area.y + i as u16;
            let prefix = Self::build_prefix(row, rows, idx);
            let (label, base_style) = self.label(row.row);

            let style = if idx == cursor {
                let selected = Style::default().add_modifier(Modifier::BOLD);
                if self.focused {
                    selected.bg(Color::Blue).fg(Color::White)
                } else {
                    selected.add_modifier(Modifier::REVERSED)
                }
            } else {
                base_style
            };

            let line = Line::from(Span::styled(format!("{}{}", prefix, label), style));
            buf.set_line(inner_area.x, y, &line, inner_area.width);
        }
    }
}

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Cell, Row, StatefulWidget, Table, TableState, Widget},
};

use crate::focus::ControlKind;

/// Rows of text cells under a fixed header, with a selected row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnList {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    selected: usize,
}

impl ColumnList {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            ..Default::default()
        }
    }

    /// State for a `ControlKind::ColumnList` control.
    pub fn from_kind(kind: &ControlKind) -> Self {
        match kind {
            ControlKind::ColumnList { headers } => Self::new(headers.clone()),
            _ => Self::default(),
        }
    }

    /// Replace the rows, keeping the selection in range.
    pub fn set_rows(&mut self, rows: Vec<Vec<String>>) {
        self.rows = rows;
        self.selected = self.selected.min(self.rows.len().saturating_sub(1));
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn selected(&self) -> Option<usize> {
        (!self.rows.is_empty()).then_some(self.selected)
    }

    pub fn select(&mut self, index: usize) {
        self.selected = index.min(self.rows.len().saturating_sub(1));
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        self.select(self.selected + 1);
    }
}

pub struct ColumnListWidget<'a> {
    state: &'a ColumnList,
    focused: bool,
    block: Option<Block<'a>>,
}

impl<'a> ColumnListWidget<'a> {
    pub fn new(state: &'a ColumnList, focused: bool) -> Self {
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

impl<'a> Widget for ColumnListWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let columns = self.state.headers.len().max(1);
        let header = Row::new(self.state.headers.iter().map(|h| Cell::from(h.as_str()))).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
        let rows = self
            .state
            .rows
            .iter()
            .map(|cells| Row::new(cells.iter().map(|c| Cell::from(c.as_str()))));
        let highlight = if self.focused {
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::REVERSED)
        };

        let mut table = Table::new(rows, vec![Constraint::Ratio(1, columns as u32); columns])
            .header(header)
            .row_highlight_style(highlight);
        if let Some(block) = self.block {
            table = table.block(block);
        }

        let mut state = TableState::default().with_selected(self.state.selected());
        StatefulWidget::render(table, area, buf, &mut state);
    }
}

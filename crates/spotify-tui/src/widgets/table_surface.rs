//! A selectable two-column table that behaves like a classic
//! widget table: row 0 may be a header and is selectable like any other row,
//! every Up/Down press reports a selection (even when clamped), and
//! programmatic selections are queued so the owner can replay them as
//! ordinary selection events.

use ratatui::{
    layout::{Constraint, Rect},
    widgets::{Block, Cell, Row, Table, TableState},
    Frame,
};

use crate::list_window::RowSurface;
use crate::theme::{style_default, style_header, style_selected, style_selected_focused};

pub struct TableSurface {
    rows: Vec<[String; 2]>,
    state: TableState,
    forced: Option<usize>,
    columns: usize,
    has_header: bool,
}

impl TableSurface {
    pub fn new(columns: usize, has_header: bool) -> Self {
        Self {
            rows: Vec::new(),
            state: TableState::default(),
            forced: None,
            columns: columns.clamp(1, 2),
            has_header,
        }
    }

    pub fn rows(&self) -> &[[String; 2]] {
        &self.rows
    }

    /// Move the selection one row down. The first press selects row 0.
    pub fn step_down(&mut self) -> Option<usize> {
        let last = self.rows.len().checked_sub(1)?;
        let next = match self.state.selected() {
            None => 0,
            Some(i) => (i + 1).min(last),
        };
        self.state.select(Some(next));
        Some(next)
    }

    /// Move the selection one row up. Nothing happens before the first
    /// selection.
    pub fn step_up(&mut self) -> Option<usize> {
        if self.rows.is_empty() {
            return None;
        }
        let next = self.state.selected()?.saturating_sub(1);
        self.state.select(Some(next));
        Some(next)
    }

    /// Selection made through [`RowSurface::select`] since the last call.
    pub fn take_forced(&mut self) -> Option<usize> {
        self.forced.take()
    }

    /// Data row under the cursor, skipping the header when there is one.
    pub fn selected_data_row(&self) -> Option<usize> {
        let selected = self.state.selected()?;
        if self.has_header {
            selected.checked_sub(1)
        } else {
            Some(selected)
        }
    }

    /// Set the selection without queueing a replay.
    pub fn select_quietly(&mut self, row: Option<usize>) {
        self.state.select(row.filter(|&r| r < self.rows.len()));
    }

    pub fn draw(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        block: Block,
        widths: &[Constraint],
        focused: bool,
    ) {
        let columns = self.columns;
        let has_header = self.has_header;
        let rows = self.rows.iter().enumerate().map(|(i, cells)| {
            let style = if has_header && i == 0 {
                style_header()
            } else {
                style_default()
            };
            Row::new(cells.iter().take(columns).map(|c| Cell::from(c.as_str()))).style(style)
        });

        let highlight = if focused {
            style_selected_focused()
        } else {
            style_selected()
        };
        let table = Table::new(rows, widths.iter().copied())
            .block(block)
            .row_highlight_style(highlight);
        frame.render_stateful_widget(table, area, &mut self.state);
    }
}

impl RowSurface for TableSurface {
    fn clear_rows(&mut self) {
        self.rows.clear();
        self.state.select(None);
        self.forced = None;
    }

    fn append_row(&mut self, cells: [String; 2]) {
        self.rows.push(cells);
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn select(&mut self, row: usize) {
        let Some(last) = self.rows.len().checked_sub(1) else {
            return;
        };
        let row = row.min(last);
        self.state.select(Some(row));
        self.forced = Some(row);
    }
}

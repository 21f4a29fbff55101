//! Search entry on top of tui-input.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{style_input, C_INPUT_FG, C_MUTED};

#[derive(Debug, PartialEq, Eq)]
pub enum QueryAction {
    Submitted(String),
    Cleared,
    /// Esc on an empty input.
    Cancelled,
    Edited,
    None,
}

pub struct QueryInput {
    input: Input,
    placeholder: String,
}

impl QueryInput {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            placeholder: placeholder.into(),
        }
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }

    pub fn is_empty(&self) -> bool {
        self.input.value().is_empty()
    }

    /// Esc clears a non-empty input; a second Esc cancels. Enter submits the
    /// trimmed query unless it is blank.
    pub fn handle_key(&mut self, key: KeyEvent) -> QueryAction {
        match key.code {
            KeyCode::Esc => {
                if self.is_empty() {
                    QueryAction::Cancelled
                } else {
                    self.input = Input::default();
                    QueryAction::Cleared
                }
            }
            KeyCode::Enter => {
                let query = self.input.value().trim();
                if query.is_empty() {
                    QueryAction::None
                } else {
                    QueryAction::Submitted(query.to_string())
                }
            }
            _ => match self.input.handle_event(&Event::Key(key)) {
                Some(_) => QueryAction::Edited,
                None => QueryAction::None,
            },
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let scroll = self.input.visual_scroll(area.width.saturating_sub(3) as usize);
        let value = self.input.value();
        let display = if value.is_empty() {
            Span::styled(format!("> {}", self.placeholder), Style::default().fg(C_MUTED))
        } else {
            Span::styled(
                format!("> {}", value.chars().skip(scroll).collect::<String>()),
                Style::default().fg(C_INPUT_FG),
            )
        };

        let paragraph = Paragraph::new(Line::from(vec![display])).style(style_input());
        frame.render_widget(paragraph, area);

        if focused && area.width > 0 {
            let cursor_x = area.x + 2 + (self.input.visual_cursor().saturating_sub(scroll)) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
        }
    }
}

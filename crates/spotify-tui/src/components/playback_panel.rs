//! Now-playing label and the transport buttons.
//!
//! Left/Right (or h/l) move between buttons, Enter presses the one under the
//! cursor.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    spotify::PlayTarget,
    theme::{style_button, style_muted, style_playing},
    widgets::pane_chrome::pane_chrome,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Previous,
    Play,
    Stop,
    Next,
}

impl Button {
    pub const ALL: [Button; 4] = [Button::Previous, Button::Play, Button::Stop, Button::Next];

    pub fn label(self) -> &'static str {
        match self {
            Button::Previous => "[ |◄ Previous ]",
            Button::Play => "[ ▷ Play]",
            Button::Stop => "[ ■ Stop]",
            Button::Next => "[ ►| Next ]",
        }
    }

    /// Stop pauses; the remote API has no separate stop.
    pub fn action(self) -> Action {
        match self {
            Button::Previous => Action::Previous,
            Button::Play => Action::Play(PlayTarget::Resume),
            Button::Stop => Action::Pause,
            Button::Next => Action::Next,
        }
    }
}

pub struct PlaybackPanel {
    cursor: usize,
}

impl PlaybackPanel {
    pub fn new() -> Self {
        // cursor starts on Play
        Self { cursor: 1 }
    }

    pub fn selected(&self) -> Button {
        Button::ALL[self.cursor]
    }
}

impl Default for PlaybackPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for PlaybackPanel {
    fn id(&self) -> ComponentId {
        ComponentId::Transport
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.cursor = self.cursor.saturating_sub(1);
                vec![]
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.cursor = (self.cursor + 1).min(Button::ALL.len() - 1);
                vec![]
            }
            KeyCode::Enter | KeyCode::Char(' ') => vec![self.selected().action()],
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let block = pane_chrome("Currently playing", Some('1'), focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner);

        let label_style = if state.now_playing.is_some() {
            style_playing()
        } else {
            style_muted()
        };
        let label: Vec<Line> = state
            .now_playing_text()
            .lines()
            .map(|l| Line::from(Span::styled(l.to_string(), label_style)))
            .collect();
        frame.render_widget(Paragraph::new(label), rows[0]);

        let mut buttons = Vec::with_capacity(Button::ALL.len() * 2);
        for (i, button) in Button::ALL.iter().enumerate() {
            if i > 0 {
                buttons.push(Span::raw(" "));
            }
            buttons.push(Span::styled(
                button.label(),
                style_button(i == self.cursor, focused),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(buttons)), rows[1]);
    }

    fn min_height(&self) -> u16 {
        6
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn press(panel: &mut PlaybackPanel, code: KeyCode) -> Vec<Action> {
        panel.handle_key(KeyEvent::new(code, KeyModifiers::NONE), &AppState::default())
    }

    #[test]
    fn test_buttons_map_to_transport_actions() {
        let mut panel = PlaybackPanel::new();
        assert_eq!(press(&mut panel, KeyCode::Enter), vec![Action::Play(PlayTarget::Resume)]);

        press(&mut panel, KeyCode::Right);
        assert_eq!(press(&mut panel, KeyCode::Enter), vec![Action::Pause]);

        press(&mut panel, KeyCode::Char('l'));
        assert_eq!(press(&mut panel, KeyCode::Enter), vec![Action::Next]);

        for _ in 0..5 {
            press(&mut panel, KeyCode::Left);
        }
        assert_eq!(panel.selected(), Button::Previous);
        assert_eq!(press(&mut panel, KeyCode::Enter), vec![Action::Previous]);
    }

    #[test]
    fn test_cursor_clamps_at_the_ends() {
        let mut panel = PlaybackPanel::new();
        for _ in 0..10 {
            press(&mut panel, KeyCode::Right);
        }
        assert_eq!(panel.selected(), Button::Next);
        assert!(press(&mut panel, KeyCode::Char('x')).is_empty());
    }
}

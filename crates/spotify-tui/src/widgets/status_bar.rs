//! Bottom lines with session state, last log line and keybindings.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::action::ComponentId;
use crate::theme::{C_CONNECTING, C_MODE_NORMAL, C_MODE_SEARCH, C_MUTED, C_PLAYING, C_SECONDARY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Search,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Search => "SEARCH",
        }
    }

    pub fn color(self) -> ratatui::style::Color {
        match self {
            Self::Normal => C_MODE_NORMAL,
            Self::Search => C_MODE_SEARCH,
        }
    }
}

/// Draw the log bar: session badge plus the last log line.
pub fn draw_log_bar(frame: &mut Frame, area: Rect, last_log: Option<&str>, debug: bool) {
    let session_span = if debug {
        Span::styled("● debug", Style::default().fg(C_CONNECTING))
    } else {
        Span::styled("●", Style::default().fg(C_PLAYING))
    };

    let log_span = Span::styled(last_log.unwrap_or(""), Style::default().fg(C_SECONDARY));

    let line = Line::from(vec![session_span, Span::raw(" "), log_span]);
    frame.render_widget(Paragraph::new(line), area);
}

fn keys_for(mode: InputMode, focused: Option<ComponentId>) -> &'static str {
    match mode {
        InputMode::Search => " type query  Enter search  Esc clear/quit  Tab next pane",
        InputMode::Normal => match focused {
            Some(ComponentId::Transport) => {
                " ←→/hl button  Enter press  n/p next/prev  Tab/1-7 panes  Esc/q quit"
            }
            Some(ComponentId::AlbumList) => {
                " ↑↓/jk select  Enter play album  n/p next/prev  Tab/1-7 panes  Esc/q quit"
            }
            Some(ComponentId::Devices) => {
                " ↑↓/jk select  Enter transfer playback  Tab/1-7 panes  Esc/q quit"
            }
            _ => " ↑↓/jk select  Enter play  n/p next/prev  Tab/1-7 panes  Esc/q quit",
        },
    }
}

/// Draw the keybindings footer bar (one row).
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, mode: InputMode, focused: Option<ComponentId>) {
    let spans = vec![
        Span::styled(
            format!(" {} ", mode.label()),
            Style::default().fg(mode.color()).add_modifier(Modifier::BOLD),
        ),
        Span::styled(keys_for(mode, focused), Style::default().fg(C_MUTED)),
    ];
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_follow_mode_and_focus() {
        assert!(keys_for(InputMode::Search, Some(ComponentId::SearchInput)).contains("Enter search"));
        assert!(keys_for(InputMode::Normal, Some(ComponentId::Devices)).contains("transfer"));
        assert!(keys_for(InputMode::Normal, None).contains("quit"));
    }
}

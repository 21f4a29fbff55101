//! "User albums" sidebar.
//!
//! Holds the materialized library ([`ListWindow`]), the cursor bookkeeping
//! ([`Paginator`]) and the table it renders into. Every Up/Down press is one
//! selection event; window flips force a new selection that is replayed
//! through the paginator before the key handler returns.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::Span,
    widgets::Paragraph,
    Frame,
};
use tracing::{debug, warn};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    list_window::{ListWindow, PageConfig},
    paginator::{Paginator, Transition},
    spotify::PlayTarget,
    theme::{C_CONNECTING, C_ERROR, C_MUTED, C_SECONDARY},
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        table_surface::TableSurface,
    },
};

pub struct AlbumList {
    window: ListWindow,
    paginator: Paginator,
    table: TableSurface,
    badge: String,
}

impl AlbumList {
    pub fn new(config: PageConfig) -> Self {
        Self {
            window: ListWindow::new(config),
            paginator: Paginator::new(config.window_size),
            table: TableSurface::new(2, true),
            badge: String::new(),
        }
    }

    /// Install a freshly loaded library and show its first window.
    pub fn set_window(&mut self, window: ListWindow) {
        self.window = window;
        self.paginator.reset();
        let w = self.paginator.window_size();
        if let Err(e) = self.window.render_window(0, w, &mut self.table) {
            debug!("album list: {}", e);
        }
        self.update_badge();
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[[String; 2]] {
        self.table.rows()
    }

    /// Feed one raw selection into the paginator and replay any forced
    /// selection the flip produced.
    fn on_selection_changed(&mut self, raw: usize) {
        let mut next = Some(raw);
        while let Some(row) = next.take() {
            let transition = self
                .paginator
                .on_selection_changed(row, &self.window, &mut self.table);
            if let Transition::Abandoned = transition {
                warn!(
                    "album list: window flip abandoned at cursor {} (recent {:?})",
                    self.paginator.cursor(),
                    self.paginator.recent_selections()
                );
            }
            next = self.table.take_forced();
        }
        self.update_badge();
    }

    fn update_badge(&mut self) {
        self.badge = match self.paginator.highlighted_index() {
            Some(idx) if idx < self.window.len() => format!("{}/{}", idx + 1, self.window.len()),
            _ if self.window.is_empty() => String::new(),
            _ => format!("{}", self.window.len()),
        };
    }

    fn activate(&self) -> Vec<Action> {
        // header row is not an album
        if self.table.selected_data_row().is_none() {
            return vec![];
        }
        match self
            .paginator
            .highlighted_index()
            .and_then(|idx| self.window.get(idx))
        {
            Some(item) => vec![Action::Play(PlayTarget::Context(item.playback_handle.clone()))],
            None => vec![],
        }
    }
}

impl Component for AlbumList {
    fn id(&self) -> ComponentId {
        ComponentId::AlbumList
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(raw) = self.table.step_down() {
                    self.on_selection_changed(raw);
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(raw) = self.table.step_up() {
                    self.on_selection_changed(raw);
                }
            }
            KeyCode::Enter => return self.activate(),
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let badge = if state.albums_error.is_some() {
            Some(Badge {
                text: "ERR",
                color: C_ERROR,
            })
        } else if state.albums_loading {
            Some(Badge {
                text: "loading",
                color: C_CONNECTING,
            })
        } else if self.badge.is_empty() {
            None
        } else {
            Some(Badge {
                text: &self.badge,
                color: C_SECONDARY,
            })
        };
        let block = pane_chrome("User albums", Some('2'), focused, badge);

        if self.window.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let msg = if state.albums_loading {
                "  loading albums…"
            } else {
                "  no data"
            };
            frame.render_widget(
                Paragraph::new(Span::styled(msg, Style::default().fg(C_MUTED))),
                inner,
            );
            return;
        }

        let width = self.window.config().column_width as u16 + 3;
        let widths = [Constraint::Length(width), Constraint::Min(width)];
        self.table.draw(frame, area, block, &widths, focused);
    }

    fn min_height(&self) -> u16 {
        5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list_window::tests::items;
    use ratatui::crossterm::event::KeyModifiers;

    fn press(list: &mut AlbumList, code: KeyCode) -> Vec<Action> {
        list.handle_key(KeyEvent::new(code, KeyModifiers::NONE), &AppState::default())
    }

    fn loaded(n: usize) -> AlbumList {
        let mut list = AlbumList::new(PageConfig::default());
        list.set_window(ListWindow::with_items(PageConfig::default(), items(n)));
        list
    }

    #[test]
    fn test_first_window_is_rendered_on_load() {
        let list = loaded(50);
        assert_eq!(list.rows().len(), 46);
        assert_eq!(list.rows()[0][0], "Title");
        assert_eq!(list.rows()[45][0], "Album 44");
    }

    #[test]
    fn test_header_is_not_playable() {
        let mut list = loaded(3);
        assert!(press(&mut list, KeyCode::Enter).is_empty());
        press(&mut list, KeyCode::Down);
        assert!(press(&mut list, KeyCode::Enter).is_empty());
        press(&mut list, KeyCode::Char('j'));
        assert_eq!(
            press(&mut list, KeyCode::Enter),
            vec![Action::Play(PlayTarget::Context("spotify:album:0".into()))]
        );
    }

    #[test]
    fn test_walking_past_the_window_flips_pages() {
        let mut list = loaded(50);
        // header + 45 rows, then one more press on the last row
        for _ in 0..=45 {
            press(&mut list, KeyCode::Down);
        }
        assert_eq!(list.rows()[1][0], "Album 0");
        press(&mut list, KeyCode::Down);
        assert_eq!(list.rows().len(), 6);
        assert_eq!(list.rows()[1][0], "Album 45");
        assert_eq!(
            press(&mut list, KeyCode::Enter),
            vec![Action::Play(PlayTarget::Context("spotify:album:45".into()))]
        );

        press(&mut list, KeyCode::Down);
        assert_eq!(
            press(&mut list, KeyCode::Enter),
            vec![Action::Play(PlayTarget::Context("spotify:album:46".into()))]
        );

        // back up to the first row of the window, then onto the header
        press(&mut list, KeyCode::Up);
        press(&mut list, KeyCode::Up);
        assert_eq!(list.rows()[1][0], "Album 0");
        assert_eq!(list.rows().len(), 46);
        assert_eq!(
            press(&mut list, KeyCode::Enter),
            vec![Action::Play(PlayTarget::Context("spotify:album:44".into()))]
        );
    }

    #[test]
    fn test_empty_library_stays_quiet() {
        let mut list = loaded(0);
        assert_eq!(list.rows().len(), 1);
        press(&mut list, KeyCode::Down);
        press(&mut list, KeyCode::Down);
        assert!(press(&mut list, KeyCode::Enter).is_empty());
        assert_eq!(list.len(), 0);
    }
}

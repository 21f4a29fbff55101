//! Search input plus the three result tables (songs, albums, artists).
//!
//! Result tables have no header row, so the selected row is the hit index.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::Span,
    widgets::Paragraph,
    Frame,
};

use spotify_proto::protocol::{SearchHit, SearchResults};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    list_window::RowSurface,
    spotify::PlayTarget,
    theme::{C_MUTED, C_SECONDARY},
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        query_input::{QueryAction, QueryInput},
        table_surface::TableSurface,
    },
};

// ── Input ─────────────────────────────────────────────────────────────────────

pub struct SearchInput {
    input: QueryInput,
}

impl SearchInput {
    pub fn new() -> Self {
        Self {
            input: QueryInput::new("type a query, Enter to search"),
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }
}

impl Default for SearchInput {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for SearchInput {
    fn id(&self) -> ComponentId {
        ComponentId::SearchInput
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match self.input.handle_key(key) {
            QueryAction::Submitted(query) => vec![Action::Search(query)],
            QueryAction::Cancelled => vec![Action::Quit],
            QueryAction::Cleared | QueryAction::Edited | QueryAction::None => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, _state: &AppState) {
        let block = pane_chrome("Search", Some('3'), focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.input.draw(frame, inner, focused);
    }
}

// ── Results ───────────────────────────────────────────────────────────────────

/// Which slice of [`SearchResults`] a table shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Songs,
    Albums,
    Artists,
}

impl ResultKind {
    fn id(self) -> ComponentId {
        match self {
            ResultKind::Songs => ComponentId::SongResults,
            ResultKind::Albums => ComponentId::AlbumResults,
            ResultKind::Artists => ComponentId::ArtistResults,
        }
    }

    fn title(self) -> &'static str {
        match self {
            ResultKind::Songs => "Songs",
            ResultKind::Albums => "Albums",
            ResultKind::Artists => "Artists",
        }
    }

    fn number_key(self) -> char {
        match self {
            ResultKind::Songs => '4',
            ResultKind::Albums => '5',
            ResultKind::Artists => '6',
        }
    }

    fn hits(self, results: &SearchResults) -> &[SearchHit] {
        match self {
            ResultKind::Songs => &results.tracks,
            ResultKind::Albums => &results.albums,
            ResultKind::Artists => &results.artists,
        }
    }

    /// Songs play as a single-track queue; albums and artists as a context.
    fn activate(self, hit: &SearchHit) -> Action {
        match self {
            ResultKind::Songs => Action::PlayTrack(hit.uri.clone()),
            ResultKind::Albums | ResultKind::Artists => {
                Action::Play(PlayTarget::Context(hit.uri.clone()))
            }
        }
    }
}

pub struct ResultsTable {
    kind: ResultKind,
    hits: Vec<SearchHit>,
    table: TableSurface,
    badge: String,
}

impl ResultsTable {
    pub fn new(kind: ResultKind) -> Self {
        Self {
            kind,
            hits: Vec::new(),
            table: TableSurface::new(1, false),
            badge: String::new(),
        }
    }

    /// Rebuild the table when the shared results changed.
    fn sync(&mut self, state: &AppState) {
        let hits = self.kind.hits(&state.search_results);
        if hits == self.hits.as_slice() {
            return;
        }
        self.hits = hits.to_vec();
        self.table.clear_rows();
        for hit in &self.hits {
            self.table.append_row([hit.name.clone(), String::new()]);
        }
        self.badge = if self.hits.is_empty() {
            String::new()
        } else {
            self.hits.len().to_string()
        };
    }
}

impl Component for ResultsTable {
    fn id(&self) -> ComponentId {
        self.kind.id()
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        self.sync(state);
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.table.step_down();
                vec![]
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.table.step_up();
                vec![]
            }
            KeyCode::Enter => self
                .table
                .selected_data_row()
                .and_then(|row| self.hits.get(row))
                .map(|hit| vec![self.kind.activate(hit)])
                .unwrap_or_default(),
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        self.sync(state);
        let badge = (!self.badge.is_empty()).then(|| Badge {
            text: &self.badge,
            color: C_SECONDARY,
        });
        let block = pane_chrome(self.kind.title(), Some(self.kind.number_key()), focused, badge);

        if self.hits.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let msg = if state.last_query.is_some() {
                "  no results"
            } else {
                ""
            };
            frame.render_widget(
                Paragraph::new(Span::styled(msg, Style::default().fg(C_MUTED))),
                inner,
            );
            return;
        }

        self.table
            .draw(frame, area, block, &[Constraint::Percentage(100)], focused);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn hit(name: &str, uri: &str) -> SearchHit {
        SearchHit {
            name: name.into(),
            uri: uri.into(),
        }
    }

    fn state_with_results() -> AppState {
        let mut state = AppState::default();
        state.search_results = SearchResults {
            tracks: vec![hit("One More Time", "spotify:track:1"), hit("Aerodynamic", "spotify:track:2")],
            albums: vec![hit("Discovery", "spotify:album:1")],
            artists: vec![hit("Daft Punk", "spotify:artist:1")],
        };
        state
    }

    #[test]
    fn test_input_submits_search() {
        let mut input = SearchInput::new();
        let state = AppState::default();
        for c in "daft".chars() {
            assert!(input.handle_key(key(KeyCode::Char(c)), &state).is_empty());
        }
        assert_eq!(
            input.handle_key(key(KeyCode::Enter), &state),
            vec![Action::Search("daft".into())]
        );
        // Esc clears, then quits on an empty input
        assert!(input.handle_key(key(KeyCode::Esc), &state).is_empty());
        assert!(input.is_empty());
        assert_eq!(input.handle_key(key(KeyCode::Esc), &state), vec![Action::Quit]);
    }

    #[test]
    fn test_song_row_plays_track() {
        let state = state_with_results();
        let mut songs = ResultsTable::new(ResultKind::Songs);
        // nothing selected yet
        assert!(songs.handle_key(key(KeyCode::Enter), &state).is_empty());

        songs.handle_key(key(KeyCode::Down), &state);
        songs.handle_key(key(KeyCode::Down), &state);
        assert_eq!(
            songs.handle_key(key(KeyCode::Enter), &state),
            vec![Action::PlayTrack("spotify:track:2".into())]
        );
    }

    #[test]
    fn test_album_and_artist_rows_play_context() {
        let state = state_with_results();
        for (kind, uri) in [
            (ResultKind::Albums, "spotify:album:1"),
            (ResultKind::Artists, "spotify:artist:1"),
        ] {
            let mut table = ResultsTable::new(kind);
            table.handle_key(key(KeyCode::Down), &state);
            assert_eq!(
                table.handle_key(key(KeyCode::Enter), &state),
                vec![Action::Play(PlayTarget::Context(uri.into()))]
            );
        }
    }

    #[test]
    fn test_new_results_reset_selection() {
        let mut state = state_with_results();
        let mut songs = ResultsTable::new(ResultKind::Songs);
        songs.handle_key(key(KeyCode::Down), &state);

        state.search_results.tracks = vec![hit("Digital Love", "spotify:track:3")];
        assert!(songs.handle_key(key(KeyCode::Enter), &state).is_empty());
        songs.handle_key(key(KeyCode::Down), &state);
        assert_eq!(
            songs.handle_key(key(KeyCode::Enter), &state),
            vec![Action::PlayTrack("spotify:track:3".into())]
        );
    }
}

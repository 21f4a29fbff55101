//! Shared read-only data passed to all components during render/event.
//!
//! Components read this but never mutate it.
//! The App event-loop is the only thing that writes to AppState.

use spotify_proto::protocol::{Device, SearchResults};

use crate::widgets::status_bar::InputMode;

/// Maximum number of log lines kept for the status bar.
const MAX_LOGS: usize = 500;

#[derive(Debug, Clone, Default)]
pub struct AppState {
    // ── Session ─────────────────────────────────────────────────────────────
    /// Device id the browser web player registered under.
    pub web_player_id: String,
    /// Running against the in-memory fixtures.
    pub debug: bool,

    // ── Playback ────────────────────────────────────────────────────────────
    /// Three-line now-playing text; `None` when unknown.
    pub now_playing: Option<String>,
    pub devices: Vec<Device>,

    // ── Library / search ────────────────────────────────────────────────────
    pub albums_loading: bool,
    pub albums_error: Option<String>,
    pub search_results: SearchResults,
    pub last_query: Option<String>,

    // ── UI mode ─────────────────────────────────────────────────────────────
    pub input_mode: InputMode,

    /// Recent warnings and command results, newest last.
    pub logs: Vec<String>,
}

impl AppState {
    pub fn new(web_player_id: impl Into<String>, debug: bool) -> Self {
        Self {
            web_player_id: web_player_id.into(),
            debug,
            input_mode: InputMode::Normal,
            ..Self::default()
        }
    }

    pub fn push_log(&mut self, msg: String) {
        self.logs.push(msg);
        if self.logs.len() > MAX_LOGS {
            self.logs.remove(0);
        }
    }

    pub fn last_log(&self) -> Option<&str> {
        self.logs.last().map(String::as_str)
    }

    pub fn now_playing_text(&self) -> &str {
        self.now_playing.as_deref().unwrap_or("None")
    }
}

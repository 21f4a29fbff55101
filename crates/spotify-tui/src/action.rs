//! All user-initiated intents and internal events.

use crate::spotify::PlayTarget;

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    Transport,
    AlbumList,
    SearchInput,
    SongResults,
    AlbumResults,
    ArtistResults,
    Devices,
}

impl ComponentId {
    /// Tab order, left to right and top to bottom.
    pub const FOCUS_ORDER: [ComponentId; 7] = [
        ComponentId::Transport,
        ComponentId::AlbumList,
        ComponentId::SearchInput,
        ComponentId::SongResults,
        ComponentId::AlbumResults,
        ComponentId::ArtistResults,
        ComponentId::Devices,
    ];
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Playback ─────────────────────────────────────────────────────────────
    Play(PlayTarget),
    /// Play a track URI, falling back to playing it as a context.
    PlayTrack(String),
    Pause,
    Next,
    Previous,
    TransferPlayback(String),

    // ── Search ───────────────────────────────────────────────────────────────
    Search(String),

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
    Resize(u16, u16),
    Noop,
}

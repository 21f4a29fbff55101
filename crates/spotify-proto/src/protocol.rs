use serde::{Deserialize, Serialize};

// ── Library items ────────────────────────────────────────────────────────────

/// One row of a remote collection (a saved album, for instance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDescription {
    pub primary_label: String,
    pub secondary_label: String,
    /// Spotify URI handed back to the player when the row is activated.
    pub playback_handle: String,
}

impl ItemDescription {
    pub fn new(
        primary_label: impl Into<String>,
        secondary_label: impl Into<String>,
        playback_handle: impl Into<String>,
    ) -> Self {
        Self {
            primary_label: primary_label.into(),
            secondary_label: secondary_label.into(),
            playback_handle: playback_handle.into(),
        }
    }
}

/// A named, playable search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub name: String,
    pub uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    pub tracks: Vec<SearchHit>,
    pub albums: Vec<SearchHit>,
    pub artists: Vec<SearchHit>,
}

/// A Spotify Connect device as reported by the player API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub is_active: bool,
}

/// Currently playing track, flattened to what the playback panel shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub album: String,
    pub artists: Vec<String>,
}

impl Track {
    /// Three lines: track, album, first artist.
    pub fn display(&self) -> String {
        let artist = self.artists.first().map(String::as_str).unwrap_or("");
        format!("{}\n{}\n{}", self.name, self.album, artist)
    }
}

// ── Web player socket ────────────────────────────────────────────────────────

/// First message of the player socket: `{"DeviceReady": "<device id>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceReady {
    #[serde(rename = "DeviceReady")]
    pub device_id: String,
}

/// Every later message of the player socket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlaybackState {
    pub current_track_name: String,
    pub current_album_name: String,
    pub current_artist_name: String,
}

impl PlaybackState {
    pub fn display(&self) -> String {
        format!(
            "{}\n{}\n{}",
            self.current_track_name, self.current_album_name, self.current_artist_name
        )
    }
}

/// Sent to the player page when the terminal client shuts down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseNotice {
    pub close: bool,
}

impl CloseNotice {
    pub fn new() -> Self {
        Self { close: true }
    }
}

impl Default for CloseNotice {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_ready_wire_format() {
        let ready: DeviceReady = serde_json::from_str(r#"{"DeviceReady":"abc123"}"#).unwrap();
        assert_eq!(ready.device_id, "abc123");
    }

    #[test]
    fn test_playback_state_wire_format() {
        let json = r#"{"CurrentTrackName":"Cornfield Chase","CurrentAlbumName":"Interstellar","CurrentArtistName":"Hans Zimmer"}"#;
        let state: PlaybackState = serde_json::from_str(json).unwrap();
        assert_eq!(state.current_track_name, "Cornfield Chase");
        assert_eq!(state.display(), "Cornfield Chase\nInterstellar\nHans Zimmer");
    }

    #[test]
    fn test_device_ready_is_not_a_playback_state() {
        assert!(serde_json::from_str::<PlaybackState>(r#"{"DeviceReady":"abc"}"#).is_err());
    }

    #[test]
    fn test_close_notice_wire_format() {
        assert_eq!(
            serde_json::to_string(&CloseNotice::new()).unwrap(),
            r#"{"close":true}"#
        );
    }

    #[test]
    fn test_track_display_uses_first_artist() {
        let track = Track {
            name: "Name".into(),
            album: "alb".into(),
            artists: vec!["art1".into(), "art2".into()],
        };
        assert_eq!(track.display(), "Name\nalb\nart1");

        let no_artist = Track {
            name: "Name".into(),
            album: "alb".into(),
            artists: vec![],
        };
        assert_eq!(no_artist.display(), "Name\nalb\n");
    }
}

//! Deterministic in-memory client for `--debug` runs.

use async_trait::async_trait;
use spotify_proto::protocol::{Device, ItemDescription, SearchHit, SearchResults, Track};

use super::{CollectionFetcher, Page, PlayTarget, SpotifyApi};
use crate::error::ApiError;

/// Device id reported for the (absent) web player in debug mode.
pub const DEBUG_DEVICE_ID: &str = "debug";

/// Three full album windows.
pub const FIXTURE_ALBUM_COUNT: usize = 135;

const SEED_ALBUMS: &[(&str, &str)] = &[
    ("Interstellar", "Hans Zimmer"),
    ("Tubular Bells", "Mike Oldfield"),
    ("A Humdrum Star (Deluxe)", "GoGo Penguin"),
    ("Timeline", "Yellowjackets"),
    ("Floa", "Mammal Hands"),
    ("groundUP", "Snarky Puppy"),
];

pub struct FixtureClient {
    albums: Vec<ItemDescription>,
}

impl FixtureClient {
    pub fn new() -> Self {
        let albums = (0..FIXTURE_ALBUM_COUNT)
            .map(|i| {
                let (album, artist) = SEED_ALBUMS[i % SEED_ALBUMS.len()];
                let round = i / SEED_ALBUMS.len();
                let title = if round == 0 {
                    album.to_string()
                } else {
                    format!("{} ({})", album, round + 1)
                };
                ItemDescription::new(title, artist, format!("spotify:album:fixture{:03}", i))
            })
            .collect();
        Self { albums }
    }
}

impl Default for FixtureClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CollectionFetcher for FixtureClient {
    async fn fetch_page(&self, limit: usize, offset: usize) -> Result<Page, ApiError> {
        let start = offset.min(self.albums.len());
        let end = (start + limit).min(self.albums.len());
        Ok(Page {
            items: self.albums[start..end].to_vec(),
            total: self.albums.len(),
        })
    }
}

#[async_trait]
impl SpotifyApi for FixtureClient {
    async fn play(&self, _target: PlayTarget) -> Result<(), ApiError> {
        Ok(())
    }

    async fn pause(&self) -> Result<(), ApiError> {
        Ok(())
    }

    async fn next(&self) -> Result<(), ApiError> {
        Ok(())
    }

    async fn previous(&self) -> Result<(), ApiError> {
        Ok(())
    }

    async fn currently_playing(&self) -> Result<Option<Track>, ApiError> {
        Ok(Some(Track {
            name: "Currently Playing Song".to_string(),
            album: "Interstellar".to_string(),
            artists: vec!["Hans Zimmer".to_string()],
        }))
    }

    async fn devices(&self) -> Result<Vec<Device>, ApiError> {
        let device = |id: &str, name: &str, kind: &str| Device {
            id: id.to_string(),
            name: name.to_string(),
            kind: kind.to_string(),
            is_active: false,
        };
        Ok(vec![
            device("ipad", "iPad", "Tablet"),
            device("iphone", "iPhone", "Smartphone"),
            device(DEBUG_DEVICE_ID, "Mac", "Computer"),
        ])
    }

    async fn transfer_playback(&self, _device_id: &str, _force_play: bool) -> Result<(), ApiError> {
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<SearchResults, ApiError> {
        let needle = query.to_lowercase();
        let matching: Vec<&ItemDescription> = self
            .albums
            .iter()
            .take(SEED_ALBUMS.len())
            .filter(|a| {
                a.primary_label.to_lowercase().contains(&needle)
                    || a.secondary_label.to_lowercase().contains(&needle)
            })
            .collect();
        Ok(SearchResults {
            tracks: matching
                .iter()
                .enumerate()
                .map(|(i, a)| SearchHit {
                    name: format!("{} - Track 1", a.primary_label),
                    uri: format!("spotify:track:fixture{:03}", i),
                })
                .collect(),
            albums: matching
                .iter()
                .map(|a| SearchHit {
                    name: a.primary_label.clone(),
                    uri: a.playback_handle.clone(),
                })
                .collect(),
            artists: matching
                .iter()
                .enumerate()
                .map(|(i, a)| SearchHit {
                    name: a.secondary_label.clone(),
                    uri: format!("spotify:artist:fixture{:03}", i),
                })
                .collect(),
        })
    }
}

//! Spotify Web API client over reqwest.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use spotify_proto::protocol::{Device, ItemDescription, SearchHit, SearchResults, Track};
use tracing::debug;

use super::{CollectionFetcher, Page, PlayTarget, SpotifyApi};
use crate::error::ApiError;

// ── Response shapes ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SavedAlbumPage {
    items: Vec<SavedAlbum>,
    total: usize,
}

#[derive(Debug, Deserialize)]
struct SavedAlbum {
    album: SimpleAlbum,
}

#[derive(Debug, Deserialize)]
struct SimpleAlbum {
    name: String,
    uri: String,
    #[serde(default)]
    artists: Vec<SimpleArtist>,
}

#[derive(Debug, Deserialize)]
struct SimpleArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CurrentlyPlaying {
    item: Option<FullTrack>,
}

#[derive(Debug, Deserialize)]
struct FullTrack {
    name: String,
    album: AlbumName,
    #[serde(default)]
    artists: Vec<SimpleArtist>,
}

#[derive(Debug, Deserialize)]
struct AlbumName {
    name: String,
}

#[derive(Debug, Deserialize)]
struct DeviceList {
    devices: Vec<RawDevice>,
}

#[derive(Debug, Deserialize)]
struct RawDevice {
    id: Option<String>,
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<Paging<Named>>,
    albums: Option<Paging<Named>>,
    artists: Option<Paging<Named>>,
}

#[derive(Debug, Deserialize)]
struct Paging<T> {
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
    uri: String,
}

impl From<SavedAlbum> for ItemDescription {
    fn from(saved: SavedAlbum) -> Self {
        let artist = saved
            .album
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .unwrap_or_default();
        ItemDescription::new(saved.album.name, artist, saved.album.uri)
    }
}

fn hits(paging: Option<Paging<Named>>) -> Vec<SearchHit> {
    paging
        .map(|p| {
            p.items
                .into_iter()
                .map(|n| SearchHit { name: n.name, uri: n.uri })
                .collect()
        })
        .unwrap_or_default()
}

// ── Client ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl SpotifyClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            access_token: access_token.into(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.access_token)
    }

    async fn send(&self, req: RequestBuilder, endpoint: &str) -> Result<Response, ApiError> {
        let response = req.send().await?;
        let status = response.status();
        debug!("{} -> {}", endpoint, status);
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn command(&self, method: Method, path: &str) -> Result<(), ApiError> {
        // The player endpoints reject bodiless PUT/POST without a length.
        let req = self.request(method, path).header("Content-Length", "0");
        self.send(req, path).await.map(|_| ())
    }
}

#[async_trait]
impl CollectionFetcher for SpotifyClient {
    async fn fetch_page(&self, limit: usize, offset: usize) -> Result<Page, ApiError> {
        let req = self
            .request(Method::GET, "/me/albums")
            .query(&[("limit", limit), ("offset", offset)]);
        let page: SavedAlbumPage = self.send(req, "/me/albums").await?.json().await?;
        Ok(Page {
            items: page.items.into_iter().map(ItemDescription::from).collect(),
            total: page.total,
        })
    }
}

#[async_trait]
impl SpotifyApi for SpotifyClient {
    async fn play(&self, target: PlayTarget) -> Result<(), ApiError> {
        let path = "/me/player/play";
        match target {
            PlayTarget::Resume => self.command(Method::PUT, path).await,
            PlayTarget::Context(uri) => {
                let req = self
                    .request(Method::PUT, path)
                    .json(&json!({ "context_uri": uri }));
                self.send(req, path).await.map(|_| ())
            }
            PlayTarget::Uris(uris) => {
                let req = self.request(Method::PUT, path).json(&json!({ "uris": uris }));
                self.send(req, path).await.map(|_| ())
            }
        }
    }

    async fn pause(&self) -> Result<(), ApiError> {
        self.command(Method::PUT, "/me/player/pause").await
    }

    async fn next(&self) -> Result<(), ApiError> {
        self.command(Method::POST, "/me/player/next").await
    }

    async fn previous(&self) -> Result<(), ApiError> {
        self.command(Method::POST, "/me/player/previous").await
    }

    async fn currently_playing(&self) -> Result<Option<Track>, ApiError> {
        let path = "/me/player/currently-playing";
        let response = self.send(self.request(Method::GET, path), path).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let playing: CurrentlyPlaying = response.json().await?;
        Ok(playing.item.map(|t| Track {
            name: t.name,
            album: t.album.name,
            artists: t.artists.into_iter().map(|a| a.name).collect(),
        }))
    }

    async fn devices(&self) -> Result<Vec<Device>, ApiError> {
        let path = "/me/player/devices";
        let list: DeviceList = self
            .send(self.request(Method::GET, path), path)
            .await?
            .json()
            .await?;
        // Restricted devices come back without an id and cannot be targeted.
        Ok(list
            .devices
            .into_iter()
            .filter_map(|d| {
                Some(Device {
                    id: d.id?,
                    name: d.name,
                    kind: d.kind,
                    is_active: d.is_active,
                })
            })
            .collect())
    }

    async fn transfer_playback(&self, device_id: &str, force_play: bool) -> Result<(), ApiError> {
        let path = "/me/player";
        let req = self
            .request(Method::PUT, path)
            .json(&json!({ "device_ids": [device_id], "play": force_play }));
        self.send(req, path).await.map(|_| ())
    }

    async fn search(&self, query: &str) -> Result<SearchResults, ApiError> {
        let req = self
            .request(Method::GET, "/search")
            .query(&[("q", query), ("type", "album,track,artist")]);
        let found: SearchResponse = self.send(req, "/search").await?.json().await?;
        Ok(SearchResults {
            tracks: hits(found.tracks),
            albums: hits(found.albums),
            artists: hits(found.artists),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_album_maps_to_item_description() {
        let json = r#"{
            "items": [
                {"album": {"name": "Tubular Bells", "uri": "spotify:album:1", "artists": [{"name": "Mike Oldfield"}, {"name": "Other"}]}},
                {"album": {"name": "Untitled", "uri": "spotify:album:2", "artists": []}}
            ],
            "total": 2
        }"#;
        let page: SavedAlbumPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.total, 2);
        let items: Vec<ItemDescription> = page.items.into_iter().map(Into::into).collect();
        assert_eq!(
            items[0],
            ItemDescription::new("Tubular Bells", "Mike Oldfield", "spotify:album:1")
        );
        assert_eq!(items[1].secondary_label, "");
    }

    #[test]
    fn test_search_response_tolerates_missing_sections() {
        let json = r#"{"tracks": {"items": [{"name": "Song", "uri": "spotify:track:1"}]}}"#;
        let found: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(hits(found.tracks).len(), 1);
        assert!(hits(found.albums).is_empty());
    }

    #[test]
    fn test_device_list_decodes_type_field() {
        let json = r#"{"devices": [{"id": "d1", "name": "Mac", "type": "Computer", "is_active": true}, {"id": null, "name": "TV", "type": "TV"}]}"#;
        let list: DeviceList = serde_json::from_str(json).unwrap();
        assert_eq!(list.devices.len(), 2);
        assert_eq!(list.devices[0].kind, "Computer");
        assert!(list.devices[1].id.is_none());
    }
}

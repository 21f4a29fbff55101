//! Remote collaborators: the Spotify Web API, the OAuth authenticator and
//! the in-memory fixtures used by `--debug`.
//!
//! Everything the UI and the handshake need from the remote side goes
//! through the traits below so both can run against fakes.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use spotify_proto::protocol::{Device, ItemDescription, SearchResults, Track};

use crate::error::ApiError;

pub mod auth;
pub mod client;
pub mod fixtures;

/// One page of a remote collection plus the collection's total size.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<ItemDescription>,
    pub total: usize,
}

/// Page-by-page access to the user's saved albums.
#[async_trait]
pub trait CollectionFetcher: Send + Sync {
    async fn fetch_page(&self, limit: usize, offset: usize) -> Result<Page, ApiError>;
}

/// What a play command should start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayTarget {
    /// Resume whatever was playing.
    Resume,
    /// Album, artist or playlist URI.
    Context(String),
    /// Explicit track URIs.
    Uris(Vec<String>),
}

#[async_trait]
pub trait SpotifyApi: CollectionFetcher {
    async fn play(&self, target: PlayTarget) -> Result<(), ApiError>;
    async fn pause(&self) -> Result<(), ApiError>;
    async fn next(&self) -> Result<(), ApiError>;
    async fn previous(&self) -> Result<(), ApiError>;
    /// `Ok(None)` when nothing is playing.
    async fn currently_playing(&self) -> Result<Option<Track>, ApiError>;
    async fn devices(&self) -> Result<Vec<Device>, ApiError>;
    async fn transfer_playback(&self, device_id: &str, force_play: bool) -> Result<(), ApiError>;
    async fn search(&self, query: &str) -> Result<SearchResults, ApiError>;
}

/// Token issued by the accounts service.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// OAuth authorization-code flow.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// URL the user opens to log in; `state` comes back on the callback.
    fn auth_url(&self, state: &str) -> String;
    async fn exchange(&self, code: &str) -> Result<AccessToken, ApiError>;
    fn client(&self, token: &AccessToken) -> Arc<dyn SpotifyApi>;
}

//! Error taxonomy for the remote API, the album list and the session handshake.

use thiserror::Error;

/// A single remote call failed.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("{0}")]
    Other(String),
}

/// Loading the collection failed on some page. Nothing is retried; the page
/// count is kept for diagnostics only.
#[derive(Debug, Error)]
#[error("could not fetch page at offset {offset} ({pages_fetched} pages fetched before it): {source}")]
pub struct FetchError {
    pub pages_fetched: usize,
    pub offset: usize,
    #[source]
    pub source: ApiError,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("could not render a window of an empty collection")]
pub struct EmptyCollectionError;

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("state token does not match the one issued at startup")]
    StateMismatch,
    #[error("authorization code missing from callback")]
    MissingCode,
    #[error("authorization denied: {0}")]
    Denied(String),
    #[error("could not exchange authorization code: {0}")]
    Exchange(#[source] ApiError),
    #[error("could not decode player message: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0} channel closed before it was published")]
    ChannelClosed(&'static str),
    #[error("{0} was already published")]
    AlreadyPublished(&'static str),
}

/// A transport command (play, pause, next, ...) failed. Logged, never fatal.
#[derive(Debug, Error)]
#[error("{command} failed: {source}")]
pub struct TransportCommandError {
    pub command: &'static str,
    #[source]
    pub source: ApiError,
}

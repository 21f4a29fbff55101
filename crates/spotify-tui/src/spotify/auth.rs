//! OAuth authorization-code flow against the Spotify accounts service.

use std::sync::Arc;

use async_trait::async_trait;
use rand::{distributions::Alphanumeric, Rng};
use thiserror::Error;
use tracing::info;

use super::{client::SpotifyClient, AccessToken, Authenticator, SpotifyApi};
use crate::error::ApiError;

pub const CLIENT_ID_VAR: &str = "SPOTIFY_CLIENT_ID";
pub const SECRET_VAR: &str = "SPOTIFY_SECRET";

pub const SCOPES: &[&str] = &[
    "user-read-private",
    "user-read-currently-playing",
    "user-read-playback-state",
    "user-modify-playback-state",
    "user-library-read",
    // Web Playback SDK
    "streaming",
    "user-read-email",
];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("there is no {0} environment variable")]
pub struct MissingCredential(pub &'static str);

#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, MissingCredential> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Empty values count as missing.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MissingCredential> {
        let read = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or(MissingCredential(key))
        };
        Ok(Self {
            client_id: read(CLIENT_ID_VAR)?,
            secret: read(SECRET_VAR)?,
        })
    }
}

/// Random token sent with the auth URL and checked on the callback.
pub fn state_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

pub struct SpotifyAuthenticator {
    http: reqwest::Client,
    credentials: Credentials,
    redirect_uri: String,
    accounts_url: String,
    api_base_url: String,
}

impl SpotifyAuthenticator {
    pub fn new(
        credentials: Credentials,
        redirect_uri: impl Into<String>,
        accounts_url: impl Into<String>,
        api_base_url: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
            redirect_uri: redirect_uri.into(),
            accounts_url: accounts_url.into(),
            api_base_url: api_base_url.into(),
        }
    }

    /// Code-for-token request, authenticated with the app credentials.
    fn token_request(&self, endpoint: &str, code: &str) -> reqwest::RequestBuilder {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        self.http
            .post(endpoint)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.secret))
            .form(&params)
    }
}

#[async_trait]
impl Authenticator for SpotifyAuthenticator {
    fn auth_url(&self, state: &str) -> String {
        let base = format!("{}/authorize", self.accounts_url);
        let scope = SCOPES.join(" ");
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("scope", scope.as_str()),
            ("state", state),
        ];
        match url::Url::parse_with_params(&base, &params) {
            Ok(url) => url.to_string(),
            // unparseable accounts_url from config
            Err(_) => base,
        }
    }

    async fn exchange(&self, code: &str) -> Result<AccessToken, ApiError> {
        let endpoint = format!("{}/api/token", self.accounts_url);
        let response = self.token_request(&endpoint, code).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }
        let token: AccessToken = response.json().await?;
        info!("token exchange succeeded (expires in {}s)", token.expires_in);
        Ok(token)
    }

    fn client(&self, token: &AccessToken) -> Arc<dyn SpotifyApi> {
        Arc::new(SpotifyClient::new(
            self.http.clone(),
            self.api_base_url.clone(),
            token.access_token.clone(),
        ))
    }
}

/// Open the auth URL in the user's default browser.
pub fn open_in_browser(url: &str) -> anyhow::Result<()> {
    open::that(url).map_err(|e| anyhow::anyhow!("could not open browser with url {}: {}", url, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn authenticator() -> SpotifyAuthenticator {
        SpotifyAuthenticator::new(
            Credentials {
                client_id: "client".into(),
                secret: "secret".into(),
            },
            "http://localhost:8888/spotify-cli",
            "https://accounts.example.com",
            "https://api.example.com/v1",
        )
    }

    #[test]
    fn test_auth_url_carries_state_and_scopes() {
        let url = url::Url::parse(&authenticator().auth_url("xyz")).unwrap();
        assert_eq!(url.path(), "/authorize");
        let query: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(query["state"], "xyz");
        assert_eq!(query["client_id"], "client");
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["redirect_uri"], "http://localhost:8888/spotify-cli");
        assert!(query["scope"].split(' ').any(|s| s == "streaming"));
    }

    #[test]
    fn test_token_request_uses_basic_auth() {
        let request = authenticator()
            .token_request("https://accounts.example.com/api/token", "abc")
            .build()
            .unwrap();
        assert_eq!(
            request.headers()[reqwest::header::AUTHORIZATION],
            "Basic Y2xpZW50OnNlY3JldA=="
        );
        let body = std::str::from_utf8(request.body().unwrap().as_bytes().unwrap()).unwrap();
        assert!(body.contains("grant_type=authorization_code"));
        assert!(body.contains("code=abc"));
    }

    #[test]
    fn test_state_tokens_differ() {
        let a = state_token();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, state_token());
    }

    #[test]
    fn test_credentials_require_both_variables() {
        let env: HashMap<&str, &str> = [(CLIENT_ID_VAR, "id")].into_iter().collect();
        let err = Credentials::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap_err();
        assert_eq!(err, MissingCredential(SECRET_VAR));

        let env: HashMap<&str, &str> = [(CLIENT_ID_VAR, ""), (SECRET_VAR, "s")].into_iter().collect();
        let err = Credentials::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap_err();
        assert_eq!(err, MissingCredential(CLIENT_ID_VAR));

        let env: HashMap<&str, &str> = [(CLIENT_ID_VAR, "id"), (SECRET_VAR, "s")].into_iter().collect();
        let creds = Credentials::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(creds.client_id, "id");
        assert!(!format!("{:?}", creds).contains("\"s\""));
    }
}

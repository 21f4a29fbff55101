mod action;
mod app;
mod app_state;
mod component;
mod components;
mod error;
mod focus;
mod handshake;
mod http;
mod list_window;
mod paginator;
mod refresh;
mod spotify;
mod theme;
mod widgets;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use spotify_proto::config::Config;
use spotify_proto::platform;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::app::{App, AppMessage};
use crate::handshake::{ReadySession, SessionHandshake};
use crate::spotify::auth::{self, Credentials, SpotifyAuthenticator};
use crate::spotify::fixtures::{FixtureClient, DEBUG_DEVICE_ID};
use crate::spotify::Authenticator;

#[derive(Debug, Parser)]
#[command(name = "spotify-cli", version, about = "Spotify client for the terminal")]
struct Cli {
    /// Skip login and the web player; run against built-in sample data.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = platform::log_path();

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the user can tail it immediately.
    eprintln!("spotify-cli log: {}", log_path.display());

    info!("spotify-cli starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = Config::load().unwrap_or_default();

    // ── Session: fixtures or the real login + web player ─────────────────────
    let (session, handshake) = if cli.debug {
        info!("debug mode, using fixture client");
        let (_playback_tx, playback) = mpsc::unbounded_channel();
        let session = ReadySession {
            client: Arc::new(FixtureClient::new()),
            device_id: DEBUG_DEVICE_ID.to_string(),
            playback,
        };
        (session, None)
    } else {
        let credentials = match Credentials::from_env() {
            Ok(c) => c,
            Err(e) => {
                error!("{}", e);
                return Err(e.into());
            }
        };
        let (session, handshake) = connect(&config, credentials).await?;
        (session, Some(handshake))
    };

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let (app, rx) = App::new(session.client, session.device_id, cli.debug, &config);
    let refresh = refresh::spawn_refresh_loop(
        app.sender(),
        Duration::from_millis(config.ui.refresh_interval_ms.max(1)),
        || AppMessage::Refresh,
    );

    let result = app.run(rx, session.playback).await;
    refresh.abort();

    if let Some(handshake) = handshake {
        handshake.shutdown().await;
    }
    if let Err(e) = &result {
        error!("UI exited with error: {}", e);
    }
    info!("spotify-cli stopped");
    result
}

/// Start the callback server, send the user to the login page and wait for
/// both the authenticated client and the web player's device id.
async fn connect(
    config: &Config,
    credentials: Credentials,
) -> anyhow::Result<(ReadySession, Arc<SessionHandshake>)> {
    let authenticator: Arc<dyn Authenticator> = Arc::new(SpotifyAuthenticator::new(
        credentials,
        config.http.redirect_uri(),
        config.api.accounts_url.clone(),
        config.api.base_url.clone(),
    ));

    let callback_path = config.http.callback_path();
    http::check_redirect_path(&callback_path)?;

    let state = auth::state_token();
    let (handshake, pending) = SessionHandshake::new(state.clone());

    http::start_server(
        config.http.bind_address.clone(),
        config.http.port,
        callback_path,
        handshake.clone(),
        authenticator.clone(),
        Duration::from_millis(config.ui.refresh_interval_ms.max(1)),
    );

    let auth_url = authenticator.auth_url(&state);
    info!("login url: {}", auth_url);
    eprintln!("Log in to Spotify: {}", auth_url);
    if let Err(e) = auth::open_in_browser(&auth_url) {
        warn!("{}", e);
    }

    let session = pending.await_ready().await?;
    Ok((session, handshake))
}

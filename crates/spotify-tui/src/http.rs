use crate::error::HandshakeError;
use crate::handshake::{CallbackParams, SessionHandshake, ShutdownSignal};
use crate::spotify::Authenticator;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use futures_util::{future, SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

const PLAYER_PAGE: &str = include_str!("../assets/player.html");
const PLAYER_PATH: &str = "/player";
const SOCKET_PATH: &str = "/ws";

#[derive(Clone)]
struct HttpState {
    handshake: Arc<SessionHandshake>,
    authenticator: Arc<dyn Authenticator>,
    poll: Duration,
}

#[derive(Deserialize)]
struct PlayerParams {
    token: Option<String>,
}

pub fn router(
    redirect_path: &str,
    handshake: Arc<SessionHandshake>,
    authenticator: Arc<dyn Authenticator>,
    poll: Duration,
) -> Router {
    let app_state = HttpState {
        handshake,
        authenticator,
        poll,
    };

    Router::new()
        .route(redirect_path, get(complete_auth).post(complete_auth))
        .route(PLAYER_PATH, get(player_page))
        .route(SOCKET_PATH, get(player_socket))
        .with_state(app_state)
}

/// The callback route must be absolute and must not shadow the player routes.
pub fn check_redirect_path(path: &str) -> anyhow::Result<()> {
    if !path.starts_with('/') {
        anyhow::bail!("redirect path {:?} must start with '/'", path);
    }
    if path == PLAYER_PATH || path == SOCKET_PATH {
        anyhow::bail!("redirect path {:?} is reserved for the web player", path);
    }
    if path.contains(['*', '{', '}']) {
        anyhow::bail!("redirect path {:?} contains route pattern characters", path);
    }
    Ok(())
}

pub fn start_server(
    bind_address: String,
    port: u16,
    redirect_path: String,
    handshake: Arc<SessionHandshake>,
    authenticator: Arc<dyn Authenticator>,
    poll: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = check_redirect_path(&redirect_path) {
            error!("HTTP server not started: {}", e);
            return;
        }
        let app = router(&redirect_path, handshake, authenticator, poll);

        let addr = format!("{}:{}", bind_address, port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to bind HTTP server to {}: {}", addr, e);
                return;
            }
        };

        info!("HTTP server listening on http://{}", addr);

        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server error: {}", e);
        }
    })
}

async fn complete_auth(
    State(state): State<HttpState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    match state
        .handshake
        .complete_authorization(state.authenticator.as_ref(), params)
        .await
    {
        Ok(token) => {
            let location = format!("/player?token={}", token);
            (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
        }
        Err(e @ HandshakeError::AlreadyPublished(_)) => {
            warn!("HTTP: repeated auth callback: {}", e);
            (StatusCode::CONFLICT, e.to_string()).into_response()
        }
        Err(e) => {
            warn!("HTTP: auth callback rejected: {}", e);
            (StatusCode::NOT_FOUND, e.to_string()).into_response()
        }
    }
}

/// OAuth access tokens only use URL-safe characters; anything else would
/// end up inside the page's script.
fn is_token_safe(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'))
}

async fn player_page(Query(params): Query<PlayerParams>) -> Response {
    match params.token {
        Some(token) if is_token_safe(&token) => {
            Html(PLAYER_PAGE.replace("{{TOKEN}}", &token)).into_response()
        }
        Some(_) => (StatusCode::BAD_REQUEST, "malformed token").into_response(),
        None => (StatusCode::BAD_REQUEST, "missing token").into_response(),
    }
}

async fn player_socket(ws: WebSocketUpgrade, State(state): State<HttpState>) -> Response {
    match state.handshake.claim_socket().await {
        Some(shutdown) => ws.on_upgrade(move |socket| handle_socket(socket, state, shutdown)),
        None => {
            warn!("HTTP: refusing second player socket");
            (StatusCode::CONFLICT, "player already connected").into_response()
        }
    }
}

async fn handle_socket(
    socket: WebSocket,
    state: HttpState,
    shutdown: ShutdownSignal,
) {
    info!("web player connected");
    let (ws_sender, ws_receiver) = socket.split();

    let incoming = ws_receiver
        .take_while(|msg| {
            future::ready(match msg {
                Ok(Message::Close(_)) => false,
                Ok(_) => true,
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    false
                }
            })
        })
        .filter_map(|msg| {
            future::ready(match msg {
                Ok(Message::Text(text)) => Some(text),
                _ => None,
            })
        });
    let outgoing =
        ws_sender.with(|text: String| future::ready(Ok::<_, axum::Error>(Message::Text(text))));

    state
        .handshake
        .run_socket(incoming, outgoing, shutdown, state.poll)
        .await;
    info!("web player disconnected");
}

//! Session handshake between the OAuth callback, the browser web player and
//! the terminal UI.
//!
//! Two things have to happen, in either order, before the UI can start: the
//! OAuth callback yields an authenticated client, and the web player reports
//! the id of the device it registered. Each is published exactly once over a
//! oneshot. After the device id, the player socket keeps streaming playback
//! states until shutdown is signalled.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{pin_mut, Sink, SinkExt, Stream, StreamExt};
use serde::Deserialize;
use spotify_proto::protocol::{CloseNotice, DeviceReady, PlaybackState};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::HandshakeError;
use crate::spotify::{Authenticator, SpotifyApi};

/// Longest wait for the player socket to confirm the close notice.
const CLOSE_ACK_TIMEOUT: Duration = Duration::from_secs(1);

/// Shutdown request handed to the player socket. Carries the sender the
/// socket fires once the close notice is written.
pub type ShutdownSignal = oneshot::Receiver<oneshot::Sender<()>>;

/// Query string of the OAuth redirect.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Both halves of the handshake, ready for the UI.
pub struct ReadySession {
    pub client: Arc<dyn SpotifyApi>,
    pub device_id: String,
    pub playback: mpsc::UnboundedReceiver<PlaybackState>,
}

/// Receiving side, owned by whoever waits for the session.
pub struct PendingSession {
    client_rx: oneshot::Receiver<Arc<dyn SpotifyApi>>,
    device_rx: oneshot::Receiver<String>,
    playback_rx: mpsc::UnboundedReceiver<PlaybackState>,
}

impl PendingSession {
    /// Wait until both the client and the device id are published.
    ///
    /// There is no timeout: the user may take as long as they like to log in.
    pub async fn await_ready(self) -> Result<ReadySession, HandshakeError> {
        let (client, device_id) = tokio::join!(self.client_rx, self.device_rx);
        let client = client.map_err(|_| HandshakeError::ChannelClosed("client"))?;
        let device_id = device_id.map_err(|_| HandshakeError::ChannelClosed("device id"))?;
        info!("session ready on device {}", device_id);
        Ok(ReadySession {
            client,
            device_id,
            playback: self.playback_rx,
        })
    }
}

/// Sending side, shared with the HTTP handlers.
pub struct SessionHandshake {
    state_token: String,
    client_tx: Mutex<Option<oneshot::Sender<Arc<dyn SpotifyApi>>>>,
    device_tx: Mutex<Option<oneshot::Sender<String>>>,
    shutdown_tx: Mutex<Option<oneshot::Sender<oneshot::Sender<()>>>>,
    shutdown_rx: Mutex<Option<ShutdownSignal>>,
    playback_tx: mpsc::UnboundedSender<PlaybackState>,
}

impl SessionHandshake {
    pub fn new(state_token: impl Into<String>) -> (Arc<Self>, PendingSession) {
        let (client_tx, client_rx) = oneshot::channel();
        let (device_tx, device_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (playback_tx, playback_rx) = mpsc::unbounded_channel();

        let handshake = Arc::new(Self {
            state_token: state_token.into(),
            client_tx: Mutex::new(Some(client_tx)),
            device_tx: Mutex::new(Some(device_tx)),
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            shutdown_rx: Mutex::new(Some(shutdown_rx)),
            playback_tx,
        });
        let pending = PendingSession {
            client_rx,
            device_rx,
            playback_rx,
        };
        (handshake, pending)
    }

    pub async fn publish_client(&self, client: Arc<dyn SpotifyApi>) -> Result<(), HandshakeError> {
        let tx = self
            .client_tx
            .lock()
            .await
            .take()
            .ok_or(HandshakeError::AlreadyPublished("client"))?;
        tx.send(client)
            .map_err(|_| HandshakeError::ChannelClosed("client"))
    }

    pub async fn publish_device(&self, device_id: String) -> Result<(), HandshakeError> {
        let tx = self
            .device_tx
            .lock()
            .await
            .take()
            .ok_or(HandshakeError::AlreadyPublished("device id"))?;
        tx.send(device_id)
            .map_err(|_| HandshakeError::ChannelClosed("device id"))
    }

    /// Validate the OAuth redirect, exchange the code and publish the client.
    /// Returns the access token for the web player.
    pub async fn complete_authorization(
        &self,
        authenticator: &dyn Authenticator,
        params: CallbackParams,
    ) -> Result<String, HandshakeError> {
        if params.state.as_deref() != Some(self.state_token.as_str()) {
            return Err(HandshakeError::StateMismatch);
        }
        if let Some(reason) = params.error {
            return Err(HandshakeError::Denied(reason));
        }
        let code = params
            .code
            .filter(|c| !c.is_empty())
            .ok_or(HandshakeError::MissingCode)?;
        if self.client_tx.lock().await.is_none() {
            return Err(HandshakeError::AlreadyPublished("client"));
        }

        let token = authenticator
            .exchange(&code)
            .await
            .map_err(HandshakeError::Exchange)?;
        self.publish_client(authenticator.client(&token)).await?;
        info!("authorization complete");
        Ok(token.access_token)
    }

    /// Hand out the shutdown receiver to the one player socket allowed.
    /// `None` once a socket has claimed it.
    pub async fn claim_socket(&self) -> Option<ShutdownSignal> {
        self.shutdown_rx.lock().await.take()
    }

    /// Ask the player socket to close and wait, bounded, until the close
    /// notice is written. Safe to call more than once.
    pub async fn shutdown(&self) {
        let Some(tx) = self.shutdown_tx.lock().await.take() else {
            return;
        };
        if self.shutdown_rx.lock().await.take().is_some() {
            debug!("shutdown with no player socket connected");
            return;
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        if tx.send(ack_tx).is_err() {
            debug!("player socket already gone at shutdown");
            return;
        }
        info!("shutdown signalled to player socket");
        match tokio::time::timeout(CLOSE_ACK_TIMEOUT, ack_rx).await {
            Ok(Ok(())) => debug!("player socket acknowledged close"),
            Ok(Err(_)) => warn!("player socket ended without acknowledging close"),
            Err(_) => warn!(
                "player socket did not acknowledge close within {:?}",
                CLOSE_ACK_TIMEOUT
            ),
        }
    }

    /// Drive one player socket.
    ///
    /// The first well-formed message must be the device id; anything that
    /// does not decode before it is dropped. After that one message is read
    /// per `poll` tick and forwarded as a playback state. On shutdown a
    /// close notice is written and the pump returns.
    pub async fn run_socket<R, W>(
        &self,
        incoming: R,
        outgoing: W,
        mut shutdown: ShutdownSignal,
        poll: Duration,
    ) where
        R: Stream<Item = String>,
        W: Sink<String>,
        W::Error: Display,
    {
        pin_mut!(incoming);
        pin_mut!(outgoing);

        loop {
            let text = tokio::select! {
                ack = &mut shutdown => {
                    send_close(&mut outgoing, ack.ok()).await;
                    return;
                }
                msg = incoming.next() => match msg {
                    Some(text) => text,
                    None => {
                        warn!("player socket closed before reporting a device");
                        return;
                    }
                },
            };
            match serde_json::from_str::<DeviceReady>(&text) {
                Ok(ready) => {
                    info!("web player ready as device {}", ready.device_id);
                    if let Err(e) = self.publish_device(ready.device_id).await {
                        warn!("could not publish device id: {}", e);
                    }
                    break;
                }
                Err(e) => warn!(
                    "dropping player message before DeviceReady: {}",
                    HandshakeError::from(e)
                ),
            }
        }

        let mut ticker = interval(poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            let text = tokio::select! {
                ack = &mut shutdown => {
                    send_close(&mut outgoing, ack.ok()).await;
                    return;
                }
                _ = ticker.tick() => {
                    tokio::select! {
                        ack = &mut shutdown => {
                            send_close(&mut outgoing, ack.ok()).await;
                            return;
                        }
                        msg = incoming.next() => match msg {
                            Some(text) => text,
                            None => {
                                info!("player socket closed");
                                return;
                            }
                        },
                    }
                }
            };
            match serde_json::from_str::<PlaybackState>(&text) {
                Ok(state) => {
                    debug!("playback state: {:?}", state);
                    if self.playback_tx.send(state).is_err() {
                        debug!("playback receiver gone, stopping socket pump");
                        return;
                    }
                }
                Err(e) => warn!("dropping playback state: {}", HandshakeError::from(e)),
            }
        }
    }
}

async fn send_close<W>(outgoing: &mut std::pin::Pin<&mut W>, ack: Option<oneshot::Sender<()>>)
where
    W: Sink<String>,
    W::Error: Display,
{
    match serde_json::to_string(&CloseNotice::new()) {
        Ok(notice) => {
            if let Err(e) = outgoing.send(notice).await {
                warn!("could not send close notice to player: {}", e);
            }
        }
        Err(e) => warn!("could not encode close notice: {}", e),
    }
    if let Some(ack) = ack {
        // fails only once shutdown stopped waiting
        let _ = ack.send(());
    }
}

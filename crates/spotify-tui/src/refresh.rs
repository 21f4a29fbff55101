//! Fixed-cadence redraw nudges for the UI loop.
//!
//! Playback states arrive from the browser on their own schedule; the ticker
//! makes sure whatever they changed gets painted even while the keyboard is
//! idle.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Send `make()` every `period` until the receiver is dropped.
pub fn spawn_refresh_loop<M, F>(tx: mpsc::Sender<M>, period: Duration, make: F) -> JoinHandle<()>
where
    M: Send + 'static,
    F: Fn() -> M + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if tx.send(make()).await.is_err() {
                debug!("UI loop gone, stopping refresh ticker");
                break;
            }
        }
    })
}

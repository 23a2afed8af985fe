//! Live session loop
//!
//! One WebSocket connection per campaign group. Every (re)connect is
//! preceded by a REST snapshot fetch and reconciliation, because push
//! delivery has no sequence numbers to replay from. Frames are decoded
//! by ingest and fed to the store one at a time, run to completion.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, warn};

use callwatch_common::config::ClientConfig;
use callwatch_common::Result;

use crate::api::CampaignApi;
use crate::ingest::decode_frame;
use crate::store::CampaignStore;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);
/// How long to wait for server confirmation after a cancel request
/// before marking the campaign cancelled locally.
const CANCEL_CONFIRM_TIMEOUT: Duration = Duration::from_secs(30);

/// A live view session for one campaign group.
pub struct LiveSession {
    group_id: String,
    socket_url: String,
    api: CampaignApi,
    store: Arc<CampaignStore>,
    cancel_requested_at: Mutex<Option<Instant>>,
}

impl LiveSession {
    pub fn new(config: &ClientConfig, group_id: impl Into<String>) -> Result<Self> {
        let group_id = group_id.into();
        Ok(Self {
            socket_url: config.transcript_socket_url(&group_id),
            api: CampaignApi::new(config)?,
            store: Arc::new(CampaignStore::new(group_id.clone())),
            group_id,
            cancel_requested_at: Mutex::new(None),
        })
    }

    pub fn store(&self) -> Arc<CampaignStore> {
        Arc::clone(&self.store)
    }

    pub fn api(&self) -> &CampaignApi {
        &self.api
    }

    /// Request cancellation. Fire-and-forget toward the orchestrator;
    /// the session keeps consuming late terminal events for calls that
    /// were already in flight, and flips to cancelled only on server
    /// confirmation or after `CANCEL_CONFIRM_TIMEOUT`.
    pub async fn cancel(&self) -> Result<()> {
        self.api.cancel(&self.group_id).await?;
        *self.cancel_requested_at.lock().await = Some(Instant::now());
        Ok(())
    }

    /// Entrypoint: keeps the socket alive until the campaign is over.
    pub async fn run(&self) -> Result<()> {
        let mut backoff = INITIAL_BACKOFF;

        loop {
            // Snapshot before every connect: initial load fallback and
            // the reconnect safety net. A failed fetch is non-fatal,
            // the projector continues on last-known state.
            match self.api.fetch_snapshot(&self.group_id).await {
                Ok(snapshot) => self.store.reconcile(&snapshot).await,
                Err(e) => {
                    warn!(error = %e, "snapshot fetch failed, continuing on last-known state")
                }
            }
            if self.finished().await {
                return Ok(());
            }

            let (ws, _) = match connect_async(&self.socket_url).await {
                Ok(pair) => {
                    info!(url = %self.socket_url, "transcript socket connected");
                    backoff = INITIAL_BACKOFF;
                    pair
                }
                Err(e) => {
                    warn!(error = %e, "socket connect failed, retrying in {:?}", backoff);
                    sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                    continue;
                }
            };

            let (mut write, mut read) = ws.split();
            let mut tick = tokio::time::interval(Duration::from_secs(1));
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    msg = read.next() => match msg {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(event) = decode_frame(&text) {
                                self.store.apply(event).await;
                            }
                            if self.finished().await {
                                return Ok(());
                            }
                        }
                        Some(Ok(Message::Ping(payload))) => {
                            let _ = write.send(Message::Pong(payload)).await;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            info!(?frame, "socket closed by server");
                            break;
                        }
                        Some(Ok(other)) => {
                            debug!(?other, "ignoring non-text frame");
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "socket read error");
                            break;
                        }
                        None => {
                            info!("socket stream ended");
                            break;
                        }
                    },
                    _ = tick.tick() => {
                        // Render cadence only, never state-affecting:
                        // republish so elapsed call times move.
                        self.store.touch().await;
                        if self.cancel_confirmation_overdue().await {
                            info!("cancel confirmation timed out, marking campaign cancelled");
                            self.store.mark_cancelled().await;
                            return Ok(());
                        }
                    }
                }
            }

            // Disconnected: back off, then reconcile-and-reconnect.
            sleep(backoff).await;
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    async fn finished(&self) -> bool {
        let view = self.store.view().await;
        view.phase.is_over() && view.active == 0
    }

    async fn cancel_confirmation_overdue(&self) -> bool {
        let requested = *self.cancel_requested_at.lock().await;
        match requested {
            Some(at) if at.elapsed() >= CANCEL_CONFIRM_TIMEOUT => {
                !self.store.view().await.phase.is_over()
            }
            _ => false,
        }
    }
}

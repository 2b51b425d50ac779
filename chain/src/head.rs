//! Chain head tracking with indefinite reconnects.

use std::sync::Arc;
use std::time::Duration;

use quill_types::ChainHead;
use tokio::sync::{broadcast, mpsc};

use crate::client::HeadSource;

/// Default pause before re-subscribing after the stream ends or fails.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);

type ReconnectHook = Box<dyn Fn() + Send + Sync>;

/// Keeps a head subscription alive and forwards validated heads.
pub struct HeadTracker {
    source: Arc<dyn HeadSource>,
    reconnect_delay: Duration,
    on_reconnect: Option<ReconnectHook>,
}

impl HeadTracker {
    pub fn new(source: Arc<dyn HeadSource>) -> Self {
        Self {
            source,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            on_reconnect: None,
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Called every time the tracker is about to re-subscribe.
    pub fn with_reconnect_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_reconnect = Some(Box::new(hook));
        self
    }

    /// Run until shutdown or until the consumer drops `heads`.
    ///
    /// Malformed heights are logged and dropped. Any end of the subscription,
    /// including a clean close, is followed by a reconnect after the delay.
    pub async fn run(self, heads: mpsc::Sender<ChainHead>, mut shutdown: broadcast::Receiver<()>) {
        loop {
            match self.source.subscribe().await {
                Ok(mut notifications) => {
                    tracing::info!("subscribed to new chain heads");
                    loop {
                        let next = tokio::select! {
                            biased;
                            _ = shutdown.recv() => {
                                tracing::info!("head tracker shutting down");
                                return;
                            }
                            next = notifications.recv() => next,
                        };
                        let Some(notification) = next else {
                            tracing::warn!("head subscription closed");
                            break;
                        };
                        match notification.parse() {
                            Ok(head) => {
                                tracing::debug!(height = head.height, hash = %head.hash, "new head");
                                if heads.send(head).await.is_err() {
                                    tracing::info!("head consumer gone, stopping tracker");
                                    return;
                                }
                            }
                            Err(e) => {
                                tracing::warn!(number = %notification.number, error = %e, "dropping malformed head");
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "head subscription failed");
                }
            }

            if let Some(hook) = &self.on_reconnect {
                hook();
            }
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("head tracker shutting down");
                    return;
                }
                _ = tokio::time::sleep(self.reconnect_delay) => {
                    tracing::info!(delay_ms = self.reconnect_delay.as_millis() as u64, "reconnecting head subscription");
                }
            }
        }
    }
}

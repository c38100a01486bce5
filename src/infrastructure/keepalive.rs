use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::{self, MissedTickBehavior};

use crate::client::{ConnectionManager, TransportState};
use crate::types::DEFAULT_KEEPALIVE_INTERVAL;

/// Periodic ping probe detecting dead links.
///
/// A ping left unanswered by the next tick marks the link dead and closes it;
/// the read loop's closure path then drives reconnection.
pub struct KeepAlive {
    interval: Duration,
    connection: Weak<ConnectionManager>,
    state: Arc<RwLock<TransportState>>,
}

impl KeepAlive {
    pub fn new(connection: Weak<ConnectionManager>, state: Arc<RwLock<TransportState>>) -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_KEEPALIVE_INTERVAL),
            connection,
            state,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Spawns the probe loop, tracked by the transport's task manager so
    /// disconnect aborts it.
    pub async fn spawn_on(self) {
        let state = Arc::clone(&self.state);
        let mut guard = state.write().await;
        guard.task_manager.spawn(self.run());
    }

    async fn run(self) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let Some(connection) = self.connection.upgrade() else {
                break;
            };

            if !connection.is_connected().await {
                continue;
            }

            let outstanding = self.state.read().await.awaiting_pong;
            if outstanding {
                tracing::warn!("Keepalive timed out, closing connection");
                if let Err(e) = connection.close().await {
                    tracing::error!("Failed to close timed-out connection: {e}");
                }
                self.state.write().await.awaiting_pong = false;
                continue;
            }

            match connection.ping().await {
                Ok(()) => {
                    self.state.write().await.awaiting_pong = true;
                    tracing::debug!("Sent keepalive ping");
                }
                Err(e) => {
                    tracing::error!("Failed to send keepalive ping: {e}");
                }
            }
        }
    }
}

use tokio::sync::watch;

use super::connection::ConnectionState;
use crate::infrastructure::TaskManager;
use crate::messaging::{ListenerRegistry, OutboundQueue};

/// Consolidated mutable state for RealtimeTransport
/// Using a single struct reduces lock contention
pub struct TransportState {
    /// Envelopes awaiting transmission
    pub outbox: OutboundQueue,

    /// Inbound event subscribers
    pub registry: ListenerRegistry,

    /// Background task manager (read loop, keepalive)
    pub task_manager: TaskManager,

    /// Whether the disconnect was manual (prevents auto-reconnect)
    pub was_manual_disconnect: bool,

    /// A keepalive ping is waiting for its pong
    pub awaiting_pong: bool,

    /// Sender for state change notifications
    pub state_change_tx: Option<watch::Sender<(ConnectionState, bool)>>,
}

impl TransportState {
    pub fn new(outbox: OutboundQueue) -> Self {
        Self {
            outbox,
            registry: ListenerRegistry::new(),
            task_manager: TaskManager::new(),
            was_manual_disconnect: false,
            awaiting_pong: false,
            state_change_tx: None,
        }
    }

    /// Notify state change watchers
    pub fn notify_state_change(&self, state: ConnectionState, manual: bool) {
        if let Some(tx) = &self.state_change_tx
            && tx.send((state, manual)).is_err()
        {
            tracing::debug!(
                "State change watcher disconnected, could not notify state: {:?}",
                state
            );
        }
    }
}

use std::sync::Arc;

use tokio::sync::{RwLock, watch};
use url::Url;

use super::{ConnectionManager, ConnectionState, RealtimeTransport, TransportState};
use crate::messaging::{OutboundQueue, OverflowPolicy};
use crate::session::SessionStore;
use crate::types::{
    DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_OUTBOX_CAPACITY, Envelope, OUTBOX_CHECKPOINT_KEY,
    Result, TransportError,
};
use crate::websocket::{Connector, WebSocketConnector};

/// Configuration for [`RealtimeTransport`]
#[derive(Debug, Clone)]
pub struct RealtimeTransportOptions {
    /// Scheduled reconnect attempts before the budget is exhausted
    pub max_reconnect_attempts: u32,
    /// Base reconnect delay in milliseconds; doubles per attempt
    pub reconnect_base_delay: Option<u64>,
    /// Keepalive ping interval in milliseconds
    pub keepalive_interval: Option<u64>,
    /// Outbound queue capacity
    pub outbox_capacity: usize,
    /// What to do with new envelopes once the queue is full
    pub overflow_policy: OverflowPolicy,
    /// Optional session store used to checkpoint the outbox
    pub session_store: Option<Arc<SessionStore>>,
}

impl Default for RealtimeTransportOptions {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_base_delay: None,
            keepalive_interval: None,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
            overflow_policy: OverflowPolicy::default(),
            session_store: None,
        }
    }
}

/// Builder for RealtimeTransport that validates the endpoint and wires up
/// the reconnection watcher
pub struct TransportBuilder {
    endpoint: Url,
    options: RealtimeTransportOptions,
    connector: Arc<dyn Connector>,
}

impl TransportBuilder {
    /// Create a new builder. The endpoint is resolved once, here; only `ws`
    /// and `wss` schemes are accepted.
    pub fn new(endpoint: impl AsRef<str>, options: RealtimeTransportOptions) -> Result<Self> {
        let endpoint = Url::parse(endpoint.as_ref())?;

        match endpoint.scheme() {
            "ws" | "wss" => {}
            other => return Err(TransportError::UnsupportedScheme(other.to_string())),
        }

        Ok(Self {
            endpoint,
            options,
            connector: Arc::new(WebSocketConnector),
        })
    }

    /// Substitutes the wire implementation. Tests use this to run isolated
    /// transports against a fake endpoint.
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    /// Build the transport and spawn the reconnection watcher
    pub fn build(self) -> RealtimeTransport {
        let mut outbox = OutboundQueue::new(self.options.outbox_capacity, self.options.overflow_policy);
        if let Some(store) = &self.options.session_store
            && let Some(envelopes) = store.get::<Vec<Envelope>>(OUTBOX_CHECKPOINT_KEY)
            && !envelopes.is_empty()
        {
            tracing::info!(
                "Restoring {} checkpointed envelope(s) into the outbox",
                envelopes.len()
            );
            outbox.restore(envelopes);
        }

        let mut transport_state = TransportState::new(outbox);

        // Initialize state watcher channel
        let (state_tx, state_rx) = watch::channel((ConnectionState::Disconnected, false));
        transport_state.state_change_tx = Some(state_tx);

        let transport = RealtimeTransport {
            endpoint: self.endpoint,
            options: self.options,
            connection: Arc::new(ConnectionManager::new()),
            state: Arc::new(RwLock::new(transport_state)),
            connector: self.connector,
        };

        // Spawn reconnection watcher task
        let transport_for_watcher = transport.clone();
        tokio::spawn(async move {
            let mut rx = state_rx;

            while rx.changed().await.is_ok() {
                let (state, was_manual) = *rx.borrow_and_update();

                // Reconnect if disconnected AND not manual
                if matches!(state, ConnectionState::Disconnected) && !was_manual {
                    tracing::info!("State watcher detected disconnect, attempting reconnection...");

                    if let Err(e) = transport_for_watcher.try_reconnect().await {
                        tracing::error!("Reconnection watcher failed: {e}");
                    }
                }
            }
            tracing::debug!("Reconnection watcher task finished");
        });

        transport
    }
}

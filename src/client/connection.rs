use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::types::{Envelope, Result, TransportError};
use crate::websocket::{Frame, WireSink};

/// Connection lifecycle state, visible to callers through `status()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// The reconnect budget is spent; only an explicit `connect()` resets it
    Exhausted,
}

/// Owns the write half of the link and the lifecycle state.
///
/// State transitions are driven exclusively by the transport facade; nothing
/// else mutates them.
pub struct ConnectionManager {
    // Mutex rather than RwLock: every link access is exclusive, and the
    // write half is Send but not Sync
    link: Arc<Mutex<Option<Box<dyn WireSink>>>>,
    state: Arc<RwLock<ConnectionState>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            link: Arc::new(Mutex::new(None)),
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
        }
    }

    /// Atomically enters `Connecting` unless an attempt is already underway
    /// or the link is open. Returns whether the caller now holds the attempt.
    pub async fn begin_connecting(&self) -> bool {
        let mut state = self.state.write().await;
        match *state {
            ConnectionState::Connecting | ConnectionState::Connected => false,
            _ => {
                *state = ConnectionState::Connecting;
                true
            }
        }
    }

    /// Sets the write half (called after a successful open)
    pub async fn set_link(&self, link: Box<dyn WireSink>) {
        let mut guard = self.link.lock().await;
        *guard = Some(link);
    }

    /// Drops the write half (used during teardown)
    pub async fn clear_link(&self) {
        let mut guard = self.link.lock().await;
        *guard = None;
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    pub async fn set_state(&self, new_state: ConnectionState) {
        let mut state = self.state.write().await;
        *state = new_state;
    }

    pub async fn is_connected(&self) -> bool {
        *self.state.read().await == ConnectionState::Connected
    }

    /// Serializes an envelope and hands it to the link
    pub async fn transmit(&self, envelope: &Envelope) -> Result<()> {
        let json = serde_json::to_string(envelope)?;
        self.send_frame(Frame::Text(json)).await
    }

    pub async fn ping(&self) -> Result<()> {
        self.send_frame(Frame::Ping(Vec::new())).await
    }

    pub async fn pong(&self, data: Vec<u8>) -> Result<()> {
        self.send_frame(Frame::Pong(data)).await
    }

    async fn send_frame(&self, frame: Frame) -> Result<()> {
        let mut guard = self.link.lock().await;
        match guard.as_mut() {
            Some(link) => link.transmit(frame).await,
            None => Err(TransportError::NotConnected),
        }
    }

    /// Closes the link. State transitions stay with the facade.
    pub async fn close(&self) -> Result<()> {
        let mut guard = self.link.lock().await;
        if let Some(link) = guard.as_mut() {
            link.close().await?;
        }
        *guard = None;
        Ok(())
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

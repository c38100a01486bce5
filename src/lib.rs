//! # Messenger Realtime
//!
//! Realtime transport core for messenger-style applications: a reconnecting
//! WebSocket client with an offline outbound queue and typed event dispatch.
//!
//! The transport keeps one logical connection to the delivery endpoint.
//! Envelopes sent while offline queue up and replay in order once the
//! connection is back; dropped connections are retried with exponential
//! backoff up to a bounded budget; inbound envelopes fan out to subscribers
//! by event kind.
//!
//! ## Example
//!
//! ```no_run
//! use messenger_realtime_rs::{EventKind, RealtimeTransport, RealtimeTransportOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = RealtimeTransport::new(
//!         "wss://chat.example.com/ws",
//!         RealtimeTransportOptions::default(),
//!     )?;
//!
//!     let _subscription = transport
//!         .subscribe(EventKind::Message, |envelope| {
//!             println!("inbound: {:?}", envelope.payload());
//!             Ok(())
//!         })
//!         .await;
//!
//!     transport.connect().await?;
//!     transport.send_chat_message("room-1", "hello", "user-7").await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod infrastructure;
pub mod messaging;
pub mod session;
pub mod types;
pub mod websocket;

pub use client::{
    ConnectionManager, ConnectionState, RealtimeTransport, RealtimeTransportOptions,
    TransportBuilder,
};
pub use messaging::{ListenerRegistry, ListenerResult, OutboundQueue, OverflowPolicy, Subscription};
pub use session::SessionStore;
pub use types::{
    ContentType, DeliveryState, Envelope, EventKind, EventPayload, MessageBody, PresenceBody,
    Result, StatusBody, TransportError, TypingBody,
};
pub use websocket::{Connector, Frame, WebSocketConnector, WireSink, WireStream};

// Messaging module - outbound queueing and inbound event dispatch
pub mod outbox;
pub mod registry;

pub use outbox::{OutboundQueue, OverflowPolicy};
pub use registry::{ListenerRegistry, ListenerResult, RegisteredListener, Subscription};

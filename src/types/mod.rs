pub mod constants;
pub mod envelope;
pub mod error;

pub use constants::*;
pub use envelope::{
    ContentType, DeliveryState, Envelope, EventKind, EventPayload, MessageBody, PresenceBody,
    StatusBody, TypingBody,
};
pub use error::{Result, TransportError};

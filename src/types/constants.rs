/// Event kind strings (magic strings layer)
pub mod event_kinds {
    pub const MESSAGE: &str = "message";
    pub const TYPING: &str = "typing";
    pub const PRESENCE: &str = "presence";
    pub const STATUS: &str = "status";
}

/// Scheduled reconnect attempts before the budget is exhausted
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Base reconnect delay (milliseconds); doubles per attempt
pub const DEFAULT_RECONNECT_BASE_DELAY: u64 = 1000;

/// Keepalive ping interval (milliseconds)
pub const DEFAULT_KEEPALIVE_INTERVAL: u64 = 25_000;

/// Outbound queue capacity
pub const DEFAULT_OUTBOX_CAPACITY: usize = 1000;

/// Key prefix shared by all session store entries
pub const SESSION_PREFIX: &str = "messenger_";

/// Session store key for the checkpointed outbox
pub const OUTBOX_CHECKPOINT_KEY: &str = "outbox";

/// How long a checkpointed outbox stays readable (milliseconds)
pub const OUTBOX_CHECKPOINT_TTL: u64 = 7 * 24 * 60 * 60 * 1000;

use thiserror::Error;

/// Errors that can occur when using the realtime transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// WebSocket protocol error (connection failed, invalid frame, etc.)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The endpoint could not be reached
    #[error("transport unavailable: {0}")]
    Unavailable(String),

    /// The reconnect budget was spent without re-establishing the link
    #[error("retry budget exhausted after {attempts} attempts")]
    RetryExhausted { attempts: u32 },

    /// JSON serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing error (malformed endpoint URL)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Endpoint scheme is not `ws` or `wss`
    #[error("unsupported endpoint scheme: {0}")]
    UnsupportedScheme(String),

    /// A transmission attempt failed after the link was established
    #[error("send failed: {0}")]
    Send(String),

    /// The outbound queue is at capacity and the policy rejects new envelopes
    #[error("outbound queue full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// Attempted operation while not connected
    #[error("not connected")]
    NotConnected,
}

/// Convenience type alias for `Result<T, TransportError>`.
pub type Result<T> = std::result::Result<T, TransportError>;

//! Error types for signal-relay.

/// Main error type for relay operations.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Registry error.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket handshake or protocol error.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Call registry errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Code generation kept colliding with live calls.
    ///
    /// With a 36^5 code space this only happens when the registry is
    /// pathologically full; the request is dropped rather than looping
    /// forever.
    #[error("call code space exhausted after {attempts} attempts")]
    CodeSpaceExhausted {
        /// Number of generation attempts made.
        attempts: usize,
    },
}

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

//! Error types for the client seam.

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the debugging server.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure (connection dropped, write failed).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed or unexpected protocol traffic.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Error reported by the server itself.
    #[error("{name}: {message}")]
    Remote {
        /// Server-side error name (e.g. "noSuchActor").
        name: String,
        /// Human-readable error message.
        message: String,
    },

    /// The addressed actor no longer exists.
    #[error("Actor gone: {0}")]
    ActorGone(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The connection was closed while a request was outstanding.
    #[error("Channel closed unexpectedly")]
    ChannelClosed,
}

impl Error {
    /// Returns the error name if this is a server-reported error.
    pub fn error_name(&self) -> Option<&str> {
        match self {
            Error::Remote { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns true if the target actor disappeared, either locally
    /// observed or server-reported.
    pub fn is_actor_gone(&self) -> bool {
        match self {
            Error::ActorGone(_) => true,
            Error::Remote { name, .. } => name == "noSuchActor",
            _ => false,
        }
    }
}

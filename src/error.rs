//! Error types for the BrainLook client.

use thiserror::Error;

/// Errors that can occur when using the BrainLook client.
///
/// Every failure here is scoped to a single room session: the caller can
/// always recover by provisioning a fresh session. Nothing is process-fatal.
#[derive(Debug, Error)]
pub enum BrainlookError {
    /// The provisioning endpoint returned a non-success status
    /// (room missing, room full, …).
    #[error("provisioning failed with status {status}: {body}")]
    Provisioning {
        /// HTTP status code returned by the server.
        status: u16,
        /// Response body, if any.
        body: String,
    },

    /// The provisioning HTTP request itself failed (DNS, refused connection, …).
    #[cfg(feature = "provisioning")]
    #[error("provisioning request error: {0}")]
    Http(#[from] reqwest::Error),

    /// An inbound message carried a `type` tag this client does not know.
    ///
    /// This is the fail-loud signal for protocol drift between client and
    /// server. The session survives it; the message is discarded without
    /// touching any state.
    #[error("unknown message kind: {kind:?}")]
    UnknownMessageKind {
        /// The unrecognized value of the `type` field.
        kind: String,
    },

    /// An inbound message had no `type` field at all.
    #[error("inbound message is missing the \"type\" tag")]
    MissingMessageKind,

    /// Failed to send a message through the transport.
    #[error("transport send error: {0}")]
    TransportSend(String),

    /// Failed to receive a message from the transport.
    #[error("transport receive error: {0}")]
    TransportReceive(String),

    /// The transport connection was closed.
    #[error("transport connection closed")]
    TransportClosed,

    /// Failed to serialize or deserialize a wire message.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Attempted to send after the session was closed or disconnected.
    #[error("not connected to room")]
    NotConnected,

    /// An operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized [`Result`] type for BrainLook client operations.
pub type Result<T> = std::result::Result<T, BrainlookError>;

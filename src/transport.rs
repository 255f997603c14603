//! Transport abstraction for the BrainLook session connection.
//!
//! The [`Transport`] trait defines a bidirectional text message channel
//! between the client and a room. The protocol exchanges JSON text messages,
//! so every transport implementation must handle message framing internally
//! (WebSocket frames, length-prefixed TCP, …).
//!
//! # Connection Setup
//!
//! Connection setup is intentionally NOT part of this trait — different
//! transports have fundamentally different connection parameters. Construct
//! a connected transport externally (after a successful join-room
//! provisioning call, see [`crate::provision`]), then pass it to
//! [`GameSession::start`](crate::session::GameSession::start).
//!
//! # Implementing a Custom Transport
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use brainlook_client::error::BrainlookError;
//! use brainlook_client::transport::Transport;
//!
//! struct MyTransport { /* ... */ }
//!
//! #[async_trait]
//! impl Transport for MyTransport {
//!     async fn send(&mut self, message: String) -> Result<(), BrainlookError> {
//!         // Send the JSON text message over your transport
//!         todo!()
//!     }
//!
//!     async fn recv(&mut self) -> Option<Result<String, BrainlookError>> {
//!         // Receive the next JSON text message
//!         // Return None when the connection is closed cleanly
//!         todo!()
//!     }
//!
//!     async fn close(&mut self) -> Result<(), BrainlookError> {
//!         // Gracefully shut down the connection
//!         todo!()
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::BrainlookError;

/// A bidirectional text message transport for one room session.
///
/// Implementors shuttle serialized JSON strings between the client and the
/// server. Each call to [`send`](Transport::send) transmits one complete
/// wire message; each call to [`recv`](Transport::recv) returns one.
///
/// # Object Safety
///
/// This trait is object-safe, so `Box<dyn Transport>` works for dynamic
/// dispatch. [`GameSession::start`](crate::session::GameSession::start)
/// accepts `impl Transport` (monomorphized) for the common case.
///
/// # Cancel Safety
///
/// The [`recv`](Transport::recv) method **MUST** be cancel-safe because it is
/// used inside `tokio::select!`. If `recv` is cancelled before completion,
/// calling it again must not lose data. Channel-based implementations are
/// naturally cancel-safe.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Send a JSON text message to the server.
    ///
    /// # Errors
    ///
    /// Returns [`BrainlookError::TransportSend`] if the message could not be
    /// sent (e.g., connection broken, write buffer full).
    async fn send(&mut self, message: String) -> Result<(), BrainlookError>;

    /// Receive the next JSON text message from the server.
    ///
    /// Returns:
    /// - `Some(Ok(text))` — a complete message was received
    /// - `Some(Err(e))` — a transport error occurred
    ///   (e.g., [`BrainlookError::TransportReceive`])
    /// - `None` — the connection was closed cleanly by the server
    ///
    /// # Cancel Safety
    ///
    /// This method **MUST** be cancel-safe (see [trait documentation](Transport)).
    async fn recv(&mut self) -> Option<Result<String, BrainlookError>>;

    /// Close the transport connection gracefully.
    ///
    /// Must be idempotent: a second call (or a call racing the open
    /// handshake) returns without error. After closing, [`send`](Transport::send)
    /// and [`recv`](Transport::recv) may return errors or `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the graceful shutdown fails. Implementations
    /// should still release resources even if the close handshake fails.
    async fn close(&mut self) -> Result<(), BrainlookError>;
}

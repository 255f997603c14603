//! # BrainLook Client
//!
//! Transport-agnostic Rust client for the BrainLook live word-guessing
//! protocol.
//!
//! BrainLook rooms host one game each: a secret word is revealed letter by
//! letter on a timer while participants submit free-text guesses, the server
//! judges them, and a scoreboard tracks who got there first. This crate
//! implements the client side of that protocol — room provisioning, the
//! persistent session connection, outbound action encoding, inbound message
//! routing, and the local session state those messages drive.
//!
//! ## Features
//!
//! - **Transport-agnostic** — implement the [`Transport`] trait for any
//!   backend; the default `transport-websocket` feature provides
//!   [`WebSocketTransport`]
//! - **Wire-compatible** — all protocol types match the server's JSON
//!   envelope exactly
//! - **Event-driven** — receive typed [`SessionEvent`]s via a channel while
//!   a shared [`GameSessionState`] snapshot stays queryable
//! - **Fail-loud on drift** — unknown inbound message kinds surface as
//!   [`SessionEvent::ProtocolDrift`] instead of being silently dropped
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), brainlook_client::BrainlookError> {
//! use brainlook_client::{
//!     join_room_session, ProvisioningClient, SessionConfig, SessionEvent,
//! };
//!
//! // Create a room, then join it over the live connection.
//! let provisioner = ProvisioningClient::new("http://localhost:8080");
//! let room_code = provisioner.create_room().await?;
//!
//! let (session, mut events) = join_room_session(
//!     "http://localhost:8080",
//!     "ws://localhost:8080",
//!     SessionConfig::new(&room_code, "Ann"),
//! )
//! .await?;
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         SessionEvent::Ready => session.submit_guess("whale")?,
//!         SessionEvent::Disconnected { .. } => break,
//!         _ => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod event;
pub mod protocol;
#[cfg(feature = "provisioning")]
pub mod provision;
pub mod router;
#[cfg(feature = "tokio-runtime")]
pub mod session;
pub mod state;
pub mod transport;
pub mod transports;

// Re-export primary types for ergonomic imports.
pub use error::{BrainlookError, Result};
pub use event::SessionEvent;
pub use protocol::{ClientMessage, GuessRecord, Player, RoomSettings, ServerMessage, WordClue};
#[cfg(feature = "provisioning")]
pub use provision::ProvisioningClient;
#[cfg(feature = "tokio-runtime")]
pub use session::{GameSession, SessionConfig, SessionPhase};
#[cfg(all(feature = "transport-websocket", feature = "provisioning"))]
pub use session::join_room_session;
pub use state::GameSessionState;
pub use transport::Transport;
#[cfg(feature = "transport-websocket")]
pub use transports::WebSocketTransport;

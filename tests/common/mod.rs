#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for BrainLook client integration tests.
//!
//! Provides a scripted [`MockTransport`] and helper functions for
//! constructing the server's broadcast JSON strings.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use brainlook_client::protocol::{Player, RoomSettings, ServerMessage};
use brainlook_client::{BrainlookError, Transport};

// ── MockTransport ───────────────────────────────────────────────────

/// A channel-based mock transport for integration testing.
///
/// Scripted server broadcasts are consumed in order by `recv()`.
/// All messages sent by the client are recorded in `sent`.
pub struct MockTransport {
    /// Scripted server broadcasts (consumed in order by `recv`).
    incoming: VecDeque<Option<Result<String, BrainlookError>>>,
    /// Recorded outgoing messages from the client.
    pub sent: Arc<StdMutex<Vec<String>>>,
    /// Whether `close()` has been called.
    pub closed: Arc<AtomicBool>,
}

impl MockTransport {
    /// Create a new mock transport with the given scripted incoming messages.
    ///
    /// Returns the transport plus shared handles for inspecting sent messages
    /// and whether close was called.
    pub fn new(
        incoming: Vec<Option<Result<String, BrainlookError>>>,
    ) -> (Self, Arc<StdMutex<Vec<String>>>, Arc<AtomicBool>) {
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let transport = Self {
            incoming: VecDeque::from(incoming),
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        };
        (transport, sent, closed)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, message: String) -> Result<(), BrainlookError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, BrainlookError>> {
        if let Some(item) = self.incoming.pop_front() {
            item
        } else {
            // No more scripted messages — hang forever so the transport loop
            // stays alive until shutdown is called.
            std::future::pending().await
        }
    }

    async fn close(&mut self) -> Result<(), BrainlookError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

// ── JSON helper functions ───────────────────────────────────────────

/// Returns the JSON string for a `scoreboard` broadcast.
pub fn scoreboard_json(entries: &[(&str, u32)]) -> String {
    let players: Vec<Player> = entries
        .iter()
        .map(|(name, score)| Player {
            name: (*name).into(),
            score: *score,
        })
        .collect();
    serde_json::to_string(&ServerMessage::Scoreboard { players })
        .expect("scoreboard_json serialization")
}

/// Returns the JSON string for a judged-`guess` broadcast.
pub fn guess_json(player: &str, guess: &str, correct: bool) -> String {
    serde_json::to_string(&ServerMessage::Guess {
        player: player.into(),
        guess: guess.into(),
        correct,
    })
    .expect("guess_json serialization")
}

/// Returns the JSON string for a `word` broadcast.
pub fn word_json(displayed: &str, clue: &str) -> String {
    serde_json::to_string(&ServerMessage::Word {
        displayed: displayed.into(),
        clue: clue.into(),
    })
    .expect("word_json serialization")
}

/// Returns the JSON string for a `settings` echo.
pub fn settings_json(min_length: u32, max_length: u32, interval: u32) -> String {
    serde_json::to_string(&ServerMessage::Settings {
        settings: RoomSettings {
            min_length,
            max_length,
            interval,
        },
    })
    .expect("settings_json serialization")
}

//! Typed events emitted by a running [`GameSession`](crate::session::GameSession).
//!
//! Events arrive on the bounded channel returned from
//! [`GameSession::start`](crate::session::GameSession::start). `Ready` is
//! always first and `Disconnected` is always last; everything in between
//! mirrors a state mutation that has already been applied.

use crate::protocol::{GuessRecord, Player, RoomSettings, ServerMessage, WordClue};

/// An event from the session's transport loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The transport is open and the session is live. Emitted exactly once,
    /// before any other event. Sends are accepted from this point on.
    Ready,
    /// The scoreboard was replaced wholesale.
    ScoreboardUpdated {
        /// The new, complete player set.
        players: Vec<Player>,
    },
    /// A judged guess was appended to the guess log.
    GuessLogged {
        /// The appended entry.
        entry: GuessRecord,
    },
    /// The masked word and clue were replaced.
    WordRevealed {
        /// The new word/clue pair.
        word: WordClue,
    },
    /// The room settings were replaced by a server echo.
    SettingsChanged {
        /// The authoritative settings.
        settings: RoomSettings,
    },
    /// An inbound message carried an unrecognized `type` tag.
    ///
    /// The message was discarded without touching state and the session
    /// keeps running; this event exists so drift is observable.
    ProtocolDrift {
        /// The unrecognized tag.
        kind: String,
    },
    /// The session ended. Always the final event; never dropped.
    Disconnected {
        /// Human-readable reason, if one is known. `None` means the server
        /// closed the connection cleanly.
        reason: Option<String>,
    },
}

impl From<ServerMessage> for SessionEvent {
    fn from(msg: ServerMessage) -> Self {
        match msg {
            ServerMessage::Scoreboard { players } => Self::ScoreboardUpdated { players },
            ServerMessage::Guess {
                player,
                guess,
                correct,
            } => Self::GuessLogged {
                entry: GuessRecord {
                    player,
                    guess,
                    correct,
                },
            },
            ServerMessage::Word { displayed, clue } => Self::WordRevealed {
                word: WordClue { displayed, clue },
            },
            ServerMessage::Settings { settings } => Self::SettingsChanged { settings },
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    #[test]
    fn server_message_maps_to_matching_event() {
        let event = SessionEvent::from(ServerMessage::Word {
            displayed: "_ _".into(),
            clue: "c".into(),
        });
        assert!(matches!(event, SessionEvent::WordRevealed { .. }));

        let event = SessionEvent::from(ServerMessage::Guess {
            player: "Ann".into(),
            guess: "whale".into(),
            correct: true,
        });
        let SessionEvent::GuessLogged { entry } = event else {
            panic!("expected GuessLogged");
        };
        assert_eq!(entry.player, "Ann");
        assert!(entry.correct);
    }
}

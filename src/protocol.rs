//! Wire-compatible protocol types for the BrainLook word-guessing protocol.
//!
//! Every type in this module produces identical JSON to the server's wire
//! format: a flat envelope with a lowercase `type` discriminant and
//! type-specific fields alongside it, e.g.
//!
//! ```json
//! {"type":"guess","player":"Ann","guess":"whale","correct":true}
//! ```
//!
//! The envelope carries no version field and no sequence numbers; adding a
//! message kind is a breaking change for any client that fails loudly on
//! unknown tags (which this one does, see [`crate::router`]).

use serde::{Deserialize, Serialize};

// ── Advisory bounds ─────────────────────────────────────────────────

/// Smallest word length the settings UI offers. Advisory only — the server
/// is the authority and may reject or clamp.
pub const MIN_WORD_LENGTH: u32 = 3;
/// Largest word length the settings UI offers. Advisory only.
pub const MAX_WORD_LENGTH: u32 = 21;
/// Smallest reveal interval (seconds) the settings UI offers. Advisory only.
pub const MIN_INTERVAL_SECS: u32 = 1;
/// Largest reveal interval (seconds) the settings UI offers. Advisory only.
pub const MAX_INTERVAL_SECS: u32 = 30;

// ── Entities ────────────────────────────────────────────────────────

/// One scoreboard entry.
///
/// The scoreboard is replaced wholesale on every `scoreboard` broadcast —
/// entries are never merged with prior state. Names are unique within one
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Display name, unique within a room.
    pub name: String,
    /// Accumulated score.
    pub score: u32,
}

/// One judged guess, as broadcast to every participant.
///
/// Appended to the client's guess log in receipt order; the log never
/// shrinks and prior entries are never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessRecord {
    /// Name of the participant who guessed.
    pub player: String,
    /// The guessed text, verbatim.
    pub guess: String,
    /// Whether the server judged the guess correct.
    pub correct: bool,
}

/// The progressively revealed word and its hint.
///
/// `displayed` is the server-masked form (e.g. `"w _ _ l e"`); the secret
/// word itself never crosses the wire. Replaced wholesale on every `word`
/// broadcast, no history retained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordClue {
    /// Masked representation of the secret word.
    pub displayed: String,
    /// Auxiliary hint text.
    pub clue: String,
}

/// Room-wide game settings.
///
/// Field names are camelCase on the wire (`minLength`, `maxLength`,
/// `interval`). The client's local copy may lag server truth between
/// sending a change and receiving the server's (possibly adjusted) echo;
/// the authoritative copy is whatever the server last broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettings {
    /// Minimum secret word length.
    pub min_length: u32,
    /// Maximum secret word length.
    pub max_length: u32,
    /// Seconds between letter reveals.
    pub interval: u32,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            min_length: MIN_WORD_LENGTH,
            max_length: MAX_WORD_LENGTH,
            interval: 5,
        }
    }
}

// ── Messages ────────────────────────────────────────────────────────

/// Message types sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Submit a free-text guess at the current word.
    Guess {
        /// The guessed text.
        guess: String,
    },
    /// Request a change to the room-wide settings.
    ///
    /// The server may reject or clamp the values; the authoritative result
    /// arrives back as a [`ServerMessage::Settings`] echo.
    Settings {
        /// The requested settings.
        settings: RoomSettings,
    },
}

/// Message types broadcast from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Full scoreboard snapshot. Replaces the prior scoreboard wholesale.
    Scoreboard {
        /// Every participant and their score.
        players: Vec<Player>,
    },
    /// One judged guess from any participant. Appended to the guess log.
    Guess {
        /// Name of the guessing participant.
        player: String,
        /// The guessed text, verbatim.
        guess: String,
        /// Whether the guess was correct.
        correct: bool,
    },
    /// Updated masked word and clue. Replaces the prior word wholesale.
    Word {
        /// Masked representation of the secret word.
        displayed: String,
        /// Auxiliary hint text.
        clue: String,
    },
    /// Echo of the current room settings, possibly server-adjusted.
    Settings {
        /// The authoritative settings.
        settings: RoomSettings,
    },
}

impl ServerMessage {
    /// The complete set of `type` tags this client understands.
    pub const KNOWN_KINDS: [&'static str; 4] = ["scoreboard", "guess", "word", "settings"];

    /// Whether `kind` is a tag this client can route.
    pub fn is_known_kind(kind: &str) -> bool {
        Self::KNOWN_KINDS.contains(&kind)
    }

    /// The wire `type` tag of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scoreboard { .. } => "scoreboard",
            Self::Guess { .. } => "guess",
            Self::Word { .. } => "word",
            Self::Settings { .. } => "settings",
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
    fn outbound_guess_matches_wire_shape() {
        let msg = ClientMessage::Guess {
            guess: "whale".into(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"guess","guess":"whale"}"#);
    }

    #[test]
    fn outbound_settings_uses_camel_case_keys() {
        let msg = ClientMessage::Settings {
            settings: RoomSettings {
                min_length: 4,
                max_length: 12,
                interval: 10,
            },
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(
            json,
            r#"{"type":"settings","settings":{"minLength":4,"maxLength":12,"interval":10}}"#
        );
    }

    #[test]
    fn inbound_scoreboard_parses_server_fixture() {
        // Field order as the server emits it.
        let raw = r#"{"type":"scoreboard","players":[{"name":"Ann","score":7},{"name":"Bo","score":0}]}"#;
        let msg: ServerMessage = serde_json::from_str(raw).unwrap();
        let ServerMessage::Scoreboard { players } = msg else {
            panic!("expected Scoreboard variant");
        };
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].name, "Ann");
        assert_eq!(players[0].score, 7);
    }

    #[test]
    fn inbound_guess_parses_server_fixture() {
        let raw = r#"{"type":"guess","guess":"whale","player":"Ann","correct":true}"#;
        let msg: ServerMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(
            msg,
            ServerMessage::Guess {
                player: "Ann".into(),
                guess: "whale".into(),
                correct: true,
            }
        );
    }

    #[test]
    fn inbound_word_parses_server_fixture() {
        let raw = r#"{"type":"word","clue":"sea mammal","displayed":"w _ _ l e"}"#;
        let msg: ServerMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(
            msg,
            ServerMessage::Word {
                displayed: "w _ _ l e".into(),
                clue: "sea mammal".into(),
            }
        );
    }

    #[test]
    fn settings_default_matches_ui_defaults() {
        let settings = RoomSettings::default();
        assert_eq!(settings.min_length, 3);
        assert_eq!(settings.max_length, 21);
        assert_eq!(settings.interval, 5);
    }

    #[test]
    fn kind_covers_every_known_tag() {
        let msgs = [
            ServerMessage::Scoreboard { players: vec![] },
            ServerMessage::Guess {
                player: String::new(),
                guess: String::new(),
                correct: false,
            },
            ServerMessage::Word {
                displayed: String::new(),
                clue: String::new(),
            },
            ServerMessage::Settings {
                settings: RoomSettings::default(),
            },
        ];
        for msg in &msgs {
            assert!(ServerMessage::is_known_kind(msg.kind()));
        }
        assert!(!ServerMessage::is_known_kind("reveal"));
    }
}

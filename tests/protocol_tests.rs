#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Wire-format tests for the BrainLook protocol types.
//!
//! Verifies that every message kind serializes to (and parses from) the
//! exact JSON envelope the server speaks, and that routing is total over the
//! known tags and loud about everything else.

use brainlook_client::protocol::{
    ClientMessage, Player, RoomSettings, ServerMessage, MAX_INTERVAL_SECS, MAX_WORD_LENGTH,
    MIN_INTERVAL_SECS, MIN_WORD_LENGTH,
};
use brainlook_client::{router, BrainlookError, GameSessionState};

// ── Outbound shapes ─────────────────────────────────────────────────

#[test]
fn outbound_guess_wire_shape() {
    let msg = ClientMessage::Guess {
        guess: "whale".into(),
    };
    assert_eq!(
        serde_json::to_string(&msg).unwrap(),
        r#"{"type":"guess","guess":"whale"}"#
    );
}

#[test]
fn outbound_settings_wire_shape() {
    let msg = ClientMessage::Settings {
        settings: RoomSettings {
            min_length: 3,
            max_length: 21,
            interval: 5,
        },
    };
    assert_eq!(
        serde_json::to_string(&msg).unwrap(),
        r#"{"type":"settings","settings":{"minLength":3,"maxLength":21,"interval":5}}"#
    );
}

#[test]
fn outbound_guess_preserves_text_verbatim() {
    // The client does no normalization; the server strips non-letters itself.
    let msg = ClientMessage::Guess {
        guess: "  Whale! ".into(),
    };
    let json = serde_json::to_string(&msg).unwrap();
    let parsed: ClientMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, msg);
}

// ── Inbound fixtures (field order as the server emits) ──────────────

#[test]
fn inbound_scoreboard_fixture() {
    let raw = r#"{"type":"scoreboard","players":[{"name":"Ann","score":12},{"name":"Bo","score":3}]}"#;
    let msg: ServerMessage = serde_json::from_str(raw).unwrap();
    assert_eq!(
        msg,
        ServerMessage::Scoreboard {
            players: vec![
                Player {
                    name: "Ann".into(),
                    score: 12
                },
                Player {
                    name: "Bo".into(),
                    score: 3
                },
            ],
        }
    );
}

#[test]
fn inbound_empty_scoreboard_fixture() {
    let msg: ServerMessage =
        serde_json::from_str(r#"{"type":"scoreboard","players":[]}"#).unwrap();
    let ServerMessage::Scoreboard { players } = msg else {
        panic!("expected Scoreboard");
    };
    assert!(players.is_empty());
}

#[test]
fn inbound_guess_fixture() {
    // The server emits guess/player/correct in this order.
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
fn inbound_word_fixture() {
    let raw = r#"{"type":"word","clue":"sea mammal","displayed":"w _ a _ e"}"#;
    let msg: ServerMessage = serde_json::from_str(raw).unwrap();
    assert_eq!(
        msg,
        ServerMessage::Word {
            displayed: "w _ a _ e".into(),
            clue: "sea mammal".into(),
        }
    );
}

#[test]
fn inbound_settings_fixture() {
    let raw = r#"{"type":"settings","settings":{"minLength":4,"maxLength":12,"interval":8}}"#;
    let msg: ServerMessage = serde_json::from_str(raw).unwrap();
    assert_eq!(
        msg,
        ServerMessage::Settings {
            settings: RoomSettings {
                min_length: 4,
                max_length: 12,
                interval: 8,
            },
        }
    );
}

// ── Routing contract ────────────────────────────────────────────────

#[test]
fn router_is_total_over_known_kinds() {
    let mut state = GameSessionState::new();
    let fixtures = [
        r#"{"type":"scoreboard","players":[]}"#,
        r#"{"type":"guess","player":"Ann","guess":"x","correct":false}"#,
        r#"{"type":"word","displayed":"_","clue":"c"}"#,
        r#"{"type":"settings","settings":{"minLength":3,"maxLength":21,"interval":5}}"#,
    ];
    for raw in fixtures {
        router::route(&mut state, raw).unwrap();
    }
    assert_eq!(state.guess_log().len(), 1);
}

#[test]
fn router_rejects_unknown_kind_without_side_effects() {
    let mut state = GameSessionState::new();
    router::route(&mut state, r#"{"type":"word","displayed":"_","clue":"c"}"#).unwrap();
    let before = state.clone();

    let err = router::route(&mut state, r#"{"type":"pong"}"#).unwrap_err();
    assert!(matches!(
        err,
        BrainlookError::UnknownMessageKind { ref kind } if kind == "pong"
    ));
    assert_eq!(state, before);
}

#[test]
fn router_rejects_envelope_without_kind() {
    let mut state = GameSessionState::new();
    let err = router::route(&mut state, r#"{"guess":"whale"}"#).unwrap_err();
    assert!(matches!(err, BrainlookError::MissingMessageKind));
}

#[test]
fn router_rejects_non_object_envelope() {
    let mut state = GameSessionState::new();
    assert!(matches!(
        router::route(&mut state, r#""guess""#).unwrap_err(),
        BrainlookError::MissingMessageKind
    ));
    assert!(matches!(
        router::route(&mut state, "[1,2,3]").unwrap_err(),
        BrainlookError::MissingMessageKind
    ));
}

#[test]
fn known_kinds_and_kind_accessor_agree() {
    assert_eq!(
        ServerMessage::KNOWN_KINDS,
        ["scoreboard", "guess", "word", "settings"]
    );
    assert!(ServerMessage::is_known_kind("guess"));
    assert!(!ServerMessage::is_known_kind("GUESS")); // tags are case-sensitive
    assert!(!ServerMessage::is_known_kind(""));
}

// ── Advisory bounds ─────────────────────────────────────────────────

#[test]
fn advisory_bounds_match_the_settings_ui() {
    assert_eq!(MIN_WORD_LENGTH, 3);
    assert_eq!(MAX_WORD_LENGTH, 21);
    assert_eq!(MIN_INTERVAL_SECS, 1);
    assert_eq!(MAX_INTERVAL_SECS, 30);

    let defaults = RoomSettings::default();
    assert!(defaults.min_length >= MIN_WORD_LENGTH);
    assert!(defaults.max_length <= MAX_WORD_LENGTH);
}

#[test]
fn out_of_bounds_settings_still_encode() {
    // Bounds are advisory UI affordances; the encoder never enforces them.
    let msg = ClientMessage::Settings {
        settings: RoomSettings {
            min_length: 1,
            max_length: 99,
            interval: 600,
        },
    };
    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains(r#""maxLength":99"#));
}

//! Inbound message routing.
//!
//! [`route`] is the single writer of [`GameSessionState`]: it classifies each
//! raw wire message by its `type` tag and applies exactly one state mutation.
//! Messages are processed strictly in arrival order, with no reordering or
//! coalescing — the wire protocol carries no sequence numbers, so whatever
//! order the transport delivers is the order the state sees.
//!
//! The router is total over the four known tags and fails loudly on anything
//! else ([`BrainlookError::UnknownMessageKind`]). Silently ignoring an
//! unrecognized tag would make protocol drift between client and server
//! invisible; a loud failure keeps it observable while leaving the session
//! (and all state) intact.

use tracing::debug;

use crate::error::{BrainlookError, Result};
use crate::protocol::{GuessRecord, ServerMessage, WordClue};
use crate::state::GameSessionState;

/// Route one raw inbound message into `state`.
///
/// On success the applied [`ServerMessage`] is returned so the caller can
/// surface it as an event. On any failure `state` is left untouched.
///
/// # Errors
///
/// - [`BrainlookError::UnknownMessageKind`] — the `type` tag is not one of
///   the four known kinds.
/// - [`BrainlookError::MissingMessageKind`] — the message has no `type` tag.
/// - [`BrainlookError::Serialization`] — the envelope is not valid JSON, or
///   a known-tag payload has the wrong shape.
pub fn route(state: &mut GameSessionState, raw: &str) -> Result<ServerMessage> {
    let value: serde_json::Value = serde_json::from_str(raw)?;

    let Some(kind) = value.get("type").and_then(serde_json::Value::as_str) else {
        return Err(BrainlookError::MissingMessageKind);
    };
    if !ServerMessage::is_known_kind(kind) {
        return Err(BrainlookError::UnknownMessageKind { kind: kind.into() });
    }

    let msg: ServerMessage = serde_json::from_value(value)?;
    apply(state, &msg);
    Ok(msg)
}

/// Apply one classified message to the session state.
fn apply(state: &mut GameSessionState, msg: &ServerMessage) {
    match msg {
        ServerMessage::Scoreboard { players } => {
            debug!(count = players.len(), "scoreboard replaced");
            state.replace_scoreboard(players.clone());
        }
        ServerMessage::Guess {
            player,
            guess,
            correct,
        } => {
            debug!(%player, correct, "guess appended");
            state.append_guess(GuessRecord {
                player: player.clone(),
                guess: guess.clone(),
                correct: *correct,
            });
        }
        ServerMessage::Word { displayed, clue } => {
            debug!(%displayed, "word replaced");
            state.replace_word(WordClue {
                displayed: displayed.clone(),
                clue: clue.clone(),
            });
        }
        ServerMessage::Settings { settings } => {
            debug!(?settings, "settings replaced");
            state.replace_settings(*settings);
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
    use crate::protocol::RoomSettings;

    #[test]
    fn scoreboard_message_replaces_player_set() {
        let mut state = GameSessionState::new();
        route(
            &mut state,
            r#"{"type":"scoreboard","players":[{"name":"Ann","score":3}]}"#,
        )
        .unwrap();
        route(
            &mut state,
            r#"{"type":"scoreboard","players":[{"name":"Bo","score":9},{"name":"Cy","score":1}]}"#,
        )
        .unwrap();

        let names: Vec<&str> = state.scoreboard().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Bo", "Cy"]);
    }

    #[test]
    fn n_guess_messages_yield_n_log_entries_in_order() {
        let mut state = GameSessionState::new();
        for i in 0..4 {
            let raw = format!(
                r#"{{"type":"guess","player":"Ann","guess":"g{i}","correct":false}}"#
            );
            route(&mut state, &raw).unwrap();
        }

        assert_eq!(state.guess_log().len(), 4);
        assert_eq!(state.guess_log()[0].guess, "g0");
        assert_eq!(state.guess_log()[3].guess, "g3");
    }

    #[test]
    fn word_message_keeps_only_latest_payload() {
        let mut state = GameSessionState::new();
        route(
            &mut state,
            r#"{"type":"word","displayed":"w _ _ l e","clue":"sea mammal"}"#,
        )
        .unwrap();
        route(
            &mut state,
            r#"{"type":"word","displayed":"w h a l e","clue":"sea mammal"}"#,
        )
        .unwrap();

        assert_eq!(
            state.word(),
            &WordClue {
                displayed: "w h a l e".into(),
                clue: "sea mammal".into(),
            }
        );
    }

    #[test]
    fn settings_message_replaces_settings() {
        let mut state = GameSessionState::new();
        route(
            &mut state,
            r#"{"type":"settings","settings":{"minLength":4,"maxLength":8,"interval":12}}"#,
        )
        .unwrap();

        assert_eq!(
            state.settings(),
            RoomSettings {
                min_length: 4,
                max_length: 8,
                interval: 12,
            }
        );
    }

    #[test]
    fn unknown_kind_fails_loudly_and_leaves_state_untouched() {
        let mut state = GameSessionState::new();
        route(
            &mut state,
            r#"{"type":"scoreboard","players":[{"name":"Ann","score":3}]}"#,
        )
        .unwrap();
        let before = state.clone();

        let err = route(&mut state, r#"{"type":"reveal","letters":3}"#).unwrap_err();
        assert!(matches!(
            err,
            BrainlookError::UnknownMessageKind { ref kind } if kind == "reveal"
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn missing_kind_is_distinguishable_from_unknown() {
        let mut state = GameSessionState::new();
        let err = route(&mut state, r#"{"players":[]}"#).unwrap_err();
        assert!(matches!(err, BrainlookError::MissingMessageKind));
    }

    #[test]
    fn malformed_payload_under_known_tag_leaves_state_untouched() {
        let mut state = GameSessionState::new();
        let before = state.clone();

        // Known tag, wrong payload shape.
        let err = route(&mut state, r#"{"type":"guess","player":42}"#).unwrap_err();
        assert!(matches!(err, BrainlookError::Serialization(_)));
        assert_eq!(state, before);
    }

    #[test]
    fn invalid_json_is_a_serialization_error() {
        let mut state = GameSessionState::new();
        let err = route(&mut state, "{not json").unwrap_err();
        assert!(matches!(err, BrainlookError::Serialization(_)));
    }

    #[test]
    fn route_returns_the_applied_message() {
        let mut state = GameSessionState::new();
        let msg = route(
            &mut state,
            r#"{"type":"guess","player":"Ann","guess":"whale","correct":true}"#,
        )
        .unwrap();
        assert_eq!(msg.kind(), "guess");
    }
}

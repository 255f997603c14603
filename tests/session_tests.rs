#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
#![cfg(feature = "tokio-runtime")]
//! End-to-end session scenarios over a scripted mock transport.
//!
//! These exercise full message sequences the way a real room produces them:
//! join, reveal ticks, judged guesses, settings changes, disconnects.

mod common;

use brainlook_client::{
    BrainlookError, GameSession, RoomSettings, SessionConfig, SessionEvent, SessionPhase,
};
use common::{guess_json, scoreboard_json, settings_json, word_json, MockTransport};

fn config() -> SessionConfig {
    SessionConfig::new("amber-otter-lane", "Ann")
}

/// Drain events until a predicate matches or the channel closes.
async fn recv_until<F: Fn(&SessionEvent) -> bool>(
    events: &mut tokio::sync::mpsc::Receiver<SessionEvent>,
    pred: F,
) -> Option<SessionEvent> {
    while let Some(event) = events.recv().await {
        if pred(&event) {
            return Some(event);
        }
    }
    None
}

#[tokio::test]
async fn guess_round_trip_scenario() {
    // Scenario from the wire contract: client sends a guess, the server's
    // judged broadcast comes back, the log holds exactly that entry.
    let (transport, sent, _closed) =
        MockTransport::new(vec![Some(Ok(guess_json("Ann", "whale", true)))]);

    let (mut session, mut events) = GameSession::start(transport, config());

    let first = events.recv().await.unwrap();
    assert!(matches!(first, SessionEvent::Ready));

    session.submit_guess("whale").unwrap();

    let event = recv_until(&mut events, |e| matches!(e, SessionEvent::GuessLogged { .. }))
        .await
        .unwrap();
    let SessionEvent::GuessLogged { entry } = event else {
        unreachable!()
    };
    assert_eq!(entry.player, "Ann");
    assert_eq!(entry.guess, "whale");
    assert!(entry.correct);

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.guess_log().len(), 1);

    // Give the loop a moment to flush the queued send.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    // The outbound frame matches the wire contract exactly.
    assert_eq!(
        sent.lock().unwrap().as_slice(),
        [r#"{"type":"guess","guess":"whale"}"#]
    );

    session.shutdown().await;
}

#[tokio::test]
async fn progressive_reveal_keeps_latest_word_only() {
    let (transport, _sent, _closed) = MockTransport::new(vec![
        Some(Ok(word_json("w _ _ l e", "sea mammal"))),
        Some(Ok(word_json("w h a l e", "sea mammal"))),
    ]);

    let (mut session, mut events) = GameSession::start(transport, config());

    let mut reveals = 0;
    while reveals < 2 {
        if let Some(SessionEvent::WordRevealed { .. }) = events.recv().await {
            reveals += 1;
        }
    }

    let word = session.word().await;
    assert_eq!(word.displayed, "w h a l e");
    assert_eq!(word.clue, "sea mammal");

    session.shutdown().await;
}

#[tokio::test]
async fn full_round_drives_all_four_entities() {
    // A realistic slice of room traffic: join broadcast, a few ticks, one
    // winning guess, a settings change echo.
    let (transport, _sent, _closed) = MockTransport::new(vec![
        Some(Ok(scoreboard_json(&[("Ann", 0)]))),
        Some(Ok(word_json("_ _ _ _ _", "sea mammal"))),
        Some(Ok(word_json("_ h _ _ _", "sea mammal"))),
        Some(Ok(guess_json("Ann", "otter", false))),
        Some(Ok(guess_json("Ann", "whale", true))),
        Some(Ok(scoreboard_json(&[("Ann", 4)]))),
        Some(Ok(settings_json(4, 9, 10))),
    ]);

    let (mut session, mut events) = GameSession::start(transport, config());

    recv_until(&mut events, |e| {
        matches!(e, SessionEvent::SettingsChanged { .. })
    })
    .await
    .unwrap();

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.scoreboard().len(), 1);
    assert_eq!(snapshot.scoreboard()[0].score, 4);
    assert_eq!(snapshot.guess_log().len(), 2);
    assert!(!snapshot.guess_log()[0].correct);
    assert!(snapshot.guess_log()[1].correct);
    assert_eq!(snapshot.word().displayed, "_ h _ _ _");
    assert_eq!(
        snapshot.settings(),
        RoomSettings {
            min_length: 4,
            max_length: 9,
            interval: 10,
        }
    );

    session.shutdown().await;
}

#[tokio::test]
async fn drift_does_not_stop_subsequent_messages() {
    // An unknown kind mid-stream is reported and skipped; everything after
    // it is still routed.
    let (transport, _sent, _closed) = MockTransport::new(vec![
        Some(Ok(scoreboard_json(&[("Ann", 1)]))),
        Some(Ok(r#"{"type":"round-over","winner":"Ann"}"#.into())),
        Some(Ok(guess_json("Bo", "heron", false))),
    ]);

    let (mut session, mut events) = GameSession::start(transport, config());

    let drift = recv_until(&mut events, |e| {
        matches!(e, SessionEvent::ProtocolDrift { .. })
    })
    .await
    .unwrap();
    let SessionEvent::ProtocolDrift { kind } = drift else {
        unreachable!()
    };
    assert_eq!(kind, "round-over");

    let event = recv_until(&mut events, |e| matches!(e, SessionEvent::GuessLogged { .. }))
        .await
        .unwrap();
    assert!(matches!(event, SessionEvent::GuessLogged { .. }));

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.scoreboard().len(), 1);
    assert_eq!(snapshot.guess_log().len(), 1);
    assert!(session.is_connected());

    session.shutdown().await;
}

#[tokio::test]
async fn settings_round_trip_through_draft() {
    let (transport, sent, _closed) = MockTransport::new(vec![Some(Ok(settings_json(5, 15, 20)))]);

    let (mut session, mut events) = GameSession::start(transport, config());
    let _ = events.recv().await; // Ready

    // User edits the draft and submits it.
    session
        .set_settings_draft(RoomSettings {
            min_length: 5,
            max_length: 15,
            interval: 20,
        })
        .await;
    session.submit_settings_draft().await.unwrap();

    // The server's echo replaces the authoritative copy.
    recv_until(&mut events, |e| {
        matches!(e, SessionEvent::SettingsChanged { .. })
    })
    .await
    .unwrap();

    assert_eq!(session.settings().await.interval, 20);

    // Give the loop a moment to flush the queued send.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    assert_eq!(
        sent.lock().unwrap().last().unwrap(),
        r#"{"type":"settings","settings":{"minLength":5,"maxLength":15,"interval":20}}"#
    );

    session.shutdown().await;
}

#[tokio::test]
async fn server_close_ends_session_with_clean_disconnect() {
    let (transport, _sent, _closed) = MockTransport::new(vec![
        Some(Ok(scoreboard_json(&[("Ann", 0)]))),
        None, // clean server close
    ]);

    let (mut session, mut events) = GameSession::start(transport, config());

    let event = recv_until(&mut events, |e| {
        matches!(e, SessionEvent::Disconnected { .. })
    })
    .await
    .unwrap();
    assert_eq!(event, SessionEvent::Disconnected { reason: None });

    assert!(!session.is_connected());
    assert_eq!(session.phase().await, SessionPhase::Closed);

    // Sends after disconnect are rejected, never queued.
    assert!(matches!(
        session.submit_guess("late"),
        Err(BrainlookError::NotConnected)
    ));

    // The state survives the disconnect for final display.
    assert_eq!(session.scoreboard().await.len(), 1);

    session.shutdown().await;
}

#[tokio::test]
async fn transport_error_is_terminal_with_reason() {
    let (transport, _sent, _closed) = MockTransport::new(vec![
        Some(Ok(word_json("_ _", "c"))),
        Some(Err(BrainlookError::TransportReceive(
            "connection reset".into(),
        ))),
    ]);

    let (mut session, mut events) = GameSession::start(transport, config());

    let event = recv_until(&mut events, |e| {
        matches!(e, SessionEvent::Disconnected { .. })
    })
    .await
    .unwrap();
    let SessionEvent::Disconnected { reason } = event else {
        unreachable!()
    };
    assert!(reason.unwrap().contains("connection reset"));
    assert_eq!(session.phase().await, SessionPhase::Closed);

    session.shutdown().await;
}

#[tokio::test]
async fn shutdown_before_any_traffic_is_safe() {
    // Tearing the view down before the server said anything must still close
    // the transport exactly once and not hang.
    let (transport, _sent, closed) = MockTransport::new(vec![]);

    let (mut session, mut events) = GameSession::start(transport, config());

    session.shutdown().await;
    session.shutdown().await; // idempotent

    assert!(closed.load(std::sync::atomic::Ordering::Relaxed));
    assert_eq!(session.phase().await, SessionPhase::Closed);

    // Ready may or may not have been observed before shutdown; the final
    // event is Disconnected, then the channel closes.
    let mut last = None;
    while let Some(event) = events.recv().await {
        last = Some(event);
    }
    assert!(matches!(last, Some(SessionEvent::Disconnected { .. })));
}

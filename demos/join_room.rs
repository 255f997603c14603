//! # Join Room Example
//!
//! Demonstrates a complete BrainLook client lifecycle:
//!
//! 1. Create a room (or join an existing one via `BRAINLOOK_ROOM`)
//! 2. Open the session connection
//! 3. React to game events (reveals, judged guesses, scoreboard updates)
//! 4. Shut down gracefully on Ctrl+C or disconnect
//!
//! ## Running
//!
//! ```sh
//! # Start a BrainLook server on localhost:8080, then:
//! cargo run --example join_room
//!
//! # Join an existing room as a named player:
//! BRAINLOOK_ROOM=amber-otter-lane BRAINLOOK_NAME=Ann cargo run --example join_room
//! ```

use brainlook_client::{
    join_room_session, ProvisioningClient, SessionConfig, SessionEvent,
};

/// Default server hosts when the env vars are not set.
const DEFAULT_HTTP: &str = "http://localhost:8080";
const DEFAULT_WS: &str = "ws://localhost:8080";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    // Initialize tracing. Set `RUST_LOG=debug` for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ── Configuration ───────────────────────────────────────────────
    let http_base = std::env::var("BRAINLOOK_HTTP").unwrap_or_else(|_| DEFAULT_HTTP.to_string());
    let ws_base = std::env::var("BRAINLOOK_WS").unwrap_or_else(|_| DEFAULT_WS.to_string());
    let name = std::env::var("BRAINLOOK_NAME").unwrap_or_else(|_| "RustPlayer".to_string());

    // ── Provision ───────────────────────────────────────────────────
    // Use an existing room code, or create a fresh room.
    let room_code = match std::env::var("BRAINLOOK_ROOM") {
        Ok(code) => code,
        Err(_) => {
            let provisioner = ProvisioningClient::new(&http_base);
            let code = provisioner.create_room().await?;
            tracing::info!("Created room {code} — share this code with other players");
            code
        }
    };

    // ── Connect ─────────────────────────────────────────────────────
    // join-room registration, socket open, and transport loop startup.
    let (mut session, mut events) =
        join_room_session(&http_base, &ws_base, SessionConfig::new(&room_code, &name)).await?;
    tracing::info!("Joining room {room_code} as {name}");

    // ── Event loop ──────────────────────────────────────────────────
    // Use `tokio::select!` to listen for both game events and Ctrl+C.
    loop {
        tokio::select! {
            // Branch 1: Incoming event from the room.
            event = events.recv() => {
                let Some(event) = event else {
                    // Channel closed — transport loop exited.
                    tracing::info!("Event channel closed, exiting");
                    break;
                };

                match event {
                    SessionEvent::Ready => {
                        tracing::info!("Session ready — guesses are open");
                    }

                    SessionEvent::WordRevealed { word } => {
                        tracing::info!("Word: {}   (clue: {})", word.displayed, word.clue);
                    }

                    SessionEvent::GuessLogged { entry } => {
                        let verdict = if entry.correct { "correctly" } else { "incorrectly" };
                        tracing::info!("{} {verdict} guessed {:?}", entry.player, entry.guess);
                    }

                    SessionEvent::ScoreboardUpdated { players } => {
                        for player in &players {
                            tracing::info!("  {}: {}", player.name, player.score);
                        }
                    }

                    SessionEvent::SettingsChanged { settings } => {
                        tracing::info!(
                            "Settings now: length {}–{}, reveal every {}s",
                            settings.min_length, settings.max_length, settings.interval
                        );
                    }

                    SessionEvent::ProtocolDrift { kind } => {
                        tracing::warn!("Server sent unknown message kind {kind:?} — update the client?");
                    }

                    SessionEvent::Disconnected { reason } => {
                        tracing::warn!("Disconnected: {}", reason.as_deref().unwrap_or("server closed"));
                        break;
                    }
                }
            }

            // Branch 2: Ctrl+C — shut down gracefully.
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, shutting down…");
                break;
            }
        }
    }

    // ── Cleanup ─────────────────────────────────────────────────────
    session.shutdown().await;
    tracing::info!("Session closed. Goodbye!");
    Ok(())
}

//! Async session handle for one BrainLook room.
//!
//! [`GameSession`] is a thin handle that communicates with a background
//! transport loop task via an unbounded MPSC channel. Events are emitted on
//! a bounded channel ([`tokio::sync::mpsc::Receiver<SessionEvent>`]) returned
//! from [`GameSession::start`].
//!
//! The loop is the single writer of [`GameSessionState`]: every inbound wire
//! message goes through [`crate::router::route`] under one lock, so state
//! mutation is never concurrent with itself. Sends are fire-and-forget; the
//! protocol offers no per-message acknowledgement.
//!
//! # Lifecycle
//!
//! A session moves through [`SessionPhase`]s:
//!
//! ```text
//! Idle ──join request──▶ Provisioning ──ok──▶ AwaitingOpen ──transport ready──▶ Open
//!   ▲                        │                                                   │
//!   └──── join failure ──────┘            teardown / transport error ──▶ Closed ◀┘
//! ```
//!
//! A join failure surfaces an error with no socket constructed and no state
//! retained.
//!
//! `Idle`, `Provisioning` and `AwaitingOpen` are traversed inside
//! [`join_room_session`] before a handle exists; a constructed [`GameSession`]
//! starts in `Open` and ends in `Closed`, which is terminal and idempotent.
//! Exactly one close of the transport is guaranteed on every exit path:
//! [`GameSession::shutdown`], handle drop, or transport failure.
//!
//! # Example
//!
//! ```rust,ignore
//! let (session, mut events) = join_room_session(
//!     "http://localhost:8080",
//!     "ws://localhost:8080",
//!     SessionConfig::new("amber-otter-lane", "Ann"),
//! ).await?;
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         SessionEvent::Ready => session.submit_guess("whale")?,
//!         SessionEvent::Disconnected { .. } => break,
//!         _ => {}
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, warn};

use crate::error::{BrainlookError, Result};
use crate::event::SessionEvent;
use crate::protocol::{ClientMessage, Player, RoomSettings, WordClue};
use crate::router;
use crate::state::GameSessionState;

/// Default capacity of the bounded event channel.
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default timeout for the graceful shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

// ── Lifecycle ───────────────────────────────────────────────────────

/// Connection lifecycle phase of a session.
///
/// See the [module docs](self) for the transition diagram. The first three
/// phases exist only inside [`join_room_session`]; a [`GameSession`] handle
/// observes `Open` and `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session activity; the starting and join-failure phase.
    Idle,
    /// The one-shot join-room HTTP call is in flight.
    Provisioning,
    /// The socket is being opened; sends are not yet accepted.
    AwaitingOpen,
    /// The transport is ready; traffic flows in both directions.
    Open,
    /// Terminal. Reached on teardown or transport failure, idempotently.
    Closed,
}

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for a [`GameSession`].
///
/// The required fields are the room code and the participant's display name;
/// the name is immutable for the lifetime of one connection.
///
/// # Example
///
/// ```
/// use brainlook_client::session::SessionConfig;
/// use std::time::Duration;
///
/// let config = SessionConfig::new("amber-otter-lane", "Ann")
///     .with_event_channel_capacity(512)
///     .with_shutdown_timeout(Duration::from_secs(5));
/// assert_eq!(config.room_code, "amber-otter-lane");
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Opaque server-generated room code.
    pub room_code: String,
    /// Display name for this participant.
    pub participant_name: String,
    /// Capacity of the bounded event channel.
    ///
    /// When the consumer cannot keep up with incoming broadcasts, events are
    /// dropped (with a warning logged) to avoid blocking the transport loop.
    /// The `Disconnected` event is always delivered regardless of capacity.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    pub event_channel_capacity: usize,
    /// Timeout for the graceful shutdown.
    ///
    /// When [`GameSession::shutdown`] is called, the background loop is given
    /// this much time to close the transport and emit a final `Disconnected`
    /// event. If the timeout expires the task is aborted.
    ///
    /// Defaults to **1 second**.
    pub shutdown_timeout: Duration,
}

impl SessionConfig {
    /// Create a new configuration with the given room code and display name.
    pub fn new(room_code: impl Into<String>, participant_name: impl Into<String>) -> Self {
        Self {
            room_code: room_code.into(),
            participant_name: participant_name.into(),
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Set the capacity of the bounded event channel.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// Set the timeout for the graceful shutdown.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

// ── Shared state ────────────────────────────────────────────────────

/// Internal state shared between the session handle and the transport loop.
struct SessionShared {
    connected: AtomicBool,
    phase: Mutex<SessionPhase>,
    state: Mutex<GameSessionState>,
}

impl SessionShared {
    fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            phase: Mutex::new(SessionPhase::Open),
            state: Mutex::new(GameSessionState::new()),
        }
    }
}

// ── Session handle ──────────────────────────────────────────────────

/// Async handle to one live room session.
///
/// Created via [`GameSession::start`], which spawns a background transport
/// loop and returns this handle together with an event receiver. Exactly one
/// handle owns the connection; dropping it (or calling
/// [`shutdown`](Self::shutdown)) releases the transport on every exit path.
///
/// Outbound methods serialize a [`ClientMessage`] and queue it to the loop
/// over an unbounded channel. They return immediately once queued (no
/// round-trip await) and fail with [`BrainlookError::NotConnected`] once the
/// session has closed — a send is never buffered past the connection.
pub struct GameSession {
    /// Room code this session is attached to.
    room_code: String,
    /// Display name used on the socket URL; immutable for the connection.
    participant_name: String,
    /// Sender half of the command channel to the transport loop.
    cmd_tx: mpsc::UnboundedSender<ClientMessage>,
    /// Shared state updated by the transport loop.
    shared: Arc<SessionShared>,
    /// Handle to the background transport loop task.
    task: Option<tokio::task::JoinHandle<()>>,
    /// Oneshot sender to signal the transport loop to shut down gracefully.
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    /// Timeout for the graceful shutdown.
    shutdown_timeout: Duration,
}

impl GameSession {
    /// Start the session transport loop over an already-open transport.
    ///
    /// The synthetic [`SessionEvent::Ready`] is the first event on the
    /// returned receiver; [`SessionEvent::Disconnected`] is always the last.
    ///
    /// Construction requires a prior successful join-room provisioning call —
    /// use [`join_room_session`] for the full sequence, or call this directly
    /// with a custom [`Transport`](crate::transport::Transport) after
    /// provisioning yourself.
    #[must_use = "the event receiver must be used to receive events"]
    pub fn start(
        transport: impl crate::transport::Transport,
        config: SessionConfig,
    ) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<ClientMessage>();
        // Clamp capacity to at least 1 (tokio panics on 0).
        let capacity = config.event_channel_capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(capacity);
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let shared = Arc::new(SessionShared::new());
        let loop_shared = Arc::clone(&shared);

        let task = tokio::spawn(transport_loop(
            transport,
            cmd_rx,
            event_tx,
            loop_shared,
            shutdown_rx,
        ));

        let session = Self {
            room_code: config.room_code,
            participant_name: config.participant_name,
            cmd_tx,
            shared,
            task: Some(task),
            shutdown_tx: Some(shutdown_tx),
            shutdown_timeout: config.shutdown_timeout,
        };

        (session, event_rx)
    }

    // ── Outbound actions ────────────────────────────────────────────

    /// Submit a free-text guess at the current word.
    ///
    /// # Errors
    ///
    /// Returns [`BrainlookError::NotConnected`] if the session has closed.
    pub fn submit_guess(&self, guess: impl Into<String>) -> Result<()> {
        self.send(ClientMessage::Guess {
            guess: guess.into(),
        })
    }

    /// Submit the pending guess text held in the session state, clearing it.
    ///
    /// An empty pending guess is still submitted — the server judges it
    /// incorrect like any other miss.
    ///
    /// # Errors
    ///
    /// Returns [`BrainlookError::NotConnected`] if the session has closed.
    pub async fn submit_pending_guess(&self) -> Result<()> {
        let guess = self.shared.state.lock().await.take_pending_guess();
        self.submit_guess(guess)
    }

    /// Request a room-wide settings change.
    ///
    /// The change takes effect locally only when the server's echo comes back
    /// as a [`SessionEvent::SettingsChanged`]; until then the local copy may
    /// lag server truth.
    ///
    /// # Errors
    ///
    /// Returns [`BrainlookError::NotConnected`] if the session has closed.
    pub fn change_settings(&self, settings: RoomSettings) -> Result<()> {
        self.send(ClientMessage::Settings { settings })
    }

    /// Submit the settings draft held in the session state.
    ///
    /// # Errors
    ///
    /// Returns [`BrainlookError::NotConnected`] if the session has closed.
    pub async fn submit_settings_draft(&self) -> Result<()> {
        let draft = self.shared.state.lock().await.settings_draft();
        self.change_settings(draft)
    }

    // ── Draft edits ─────────────────────────────────────────────────

    /// Overwrite the pending (unsent) guess text.
    pub async fn set_pending_guess(&self, text: impl Into<String>) {
        self.shared.state.lock().await.set_pending_guess(text);
    }

    /// Overwrite the locally edited settings draft.
    pub async fn set_settings_draft(&self, settings: RoomSettings) {
        self.shared.state.lock().await.set_settings_draft(settings);
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// The room code this session is attached to.
    pub fn room_code(&self) -> &str {
        &self.room_code
    }

    /// The display name this session joined with.
    pub fn participant_name(&self) -> &str {
        &self.participant_name
    }

    /// Returns `true` if the transport is believed to be connected.
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    /// The current lifecycle phase.
    pub async fn phase(&self) -> SessionPhase {
        *self.shared.phase.lock().await
    }

    /// A snapshot clone of the full session state.
    pub async fn snapshot(&self) -> GameSessionState {
        self.shared.state.lock().await.clone()
    }

    /// The most recently broadcast scoreboard.
    pub async fn scoreboard(&self) -> Vec<Player> {
        self.shared.state.lock().await.scoreboard().to_vec()
    }

    /// The current masked word and clue.
    pub async fn word(&self) -> WordClue {
        self.shared.state.lock().await.word().clone()
    }

    /// The room settings the server last broadcast.
    pub async fn settings(&self) -> RoomSettings {
        self.shared.state.lock().await.settings()
    }

    // ── Teardown ────────────────────────────────────────────────────

    /// Shut down the session, closing the transport and stopping the
    /// background task. Idempotent: calling it again is a no-op.
    ///
    /// After this method returns, the event receiver yields the final
    /// `Disconnected` event (if not already delivered) and then `None`.
    pub async fn shutdown(&mut self) {
        debug!(room = %self.room_code, "GameSession: shutdown requested");

        // Signal the transport loop to shut down gracefully.
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        // Await the transport loop with a timeout. If it doesn't exit in
        // time, abort it so the task cannot detach and run indefinitely.
        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!("transport loop terminated with join error: {join_err}");
                }
                Err(_) => {
                    warn!("transport loop did not exit within timeout; aborting task");
                    task.abort();
                    if let Err(join_err) = task.await {
                        debug!("transport loop aborted: {join_err}");
                    }
                }
            }
        }

        self.shared.connected.store(false, Ordering::Release);
        *self.shared.phase.lock().await = SessionPhase::Closed;
    }

    // ── Internal helpers ────────────────────────────────────────────

    /// Queue a `ClientMessage` to the transport loop.
    fn send(&self, msg: ClientMessage) -> Result<()> {
        if !self.shared.connected.load(Ordering::Acquire) {
            return Err(BrainlookError::NotConnected);
        }
        self.cmd_tx
            .send(msg)
            .map_err(|_| BrainlookError::NotConnected)
    }
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("room_code", &self.room_code)
            .field("participant_name", &self.participant_name)
            .field("connected", &self.is_connected())
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        // `Drop` is synchronous so we cannot await a graceful shutdown.
        // The only safe action is to abort the spawned task, which causes
        // the transport loop future to be dropped immediately.  The
        // `shutdown_tx` oneshot is intentionally *not* sent here: sending
        // it would trigger a graceful path that calls async `transport.close()`,
        // but there is no executor context to drive it inside `Drop`.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ── Full join sequence ──────────────────────────────────────────────

/// Provision and open a session: the full `Idle → … → Open` sequence.
///
/// Runs the one-shot join-room call against `http_base` first — the server
/// must register the participant's intent to join before it can correlate
/// the socket handshake with the room. Only on success is the WebSocket to
/// `ws_base` opened and the transport loop started.
///
/// # Errors
///
/// - [`BrainlookError::Provisioning`] / [`BrainlookError::Http`] — join-room
///   failed. No socket is constructed and no state is retained; the machine
///   is back in `Idle` and the caller decides whether to retry.
/// - Any error of [`WebSocketTransport::connect`](crate::transports::websocket::WebSocketTransport::connect)
///   if the socket cannot be opened.
#[cfg(all(feature = "transport-websocket", feature = "provisioning"))]
pub async fn join_room_session(
    http_base: &str,
    ws_base: &str,
    config: SessionConfig,
) -> Result<(GameSession, mpsc::Receiver<SessionEvent>)> {
    // Idle → Provisioning
    let provisioner = crate::provision::ProvisioningClient::new(http_base);
    provisioner.join_room(&config.room_code).await?;

    // Provisioning → AwaitingOpen → Open (connect completes the open)
    let url = crate::transports::websocket::session_url(
        ws_base,
        &config.room_code,
        &config.participant_name,
    );
    let transport = crate::transports::websocket::WebSocketTransport::connect(&url).await?;

    Ok(GameSession::start(transport, config))
}

// ── Transport loop ──────────────────────────────────────────────────

/// Background transport loop that multiplexes send/receive via `tokio::select!`.
///
/// Exits when:
/// - The command channel closes (session handle dropped or shutdown called)
/// - The transport returns `None` (server closed connection)
/// - A transport error occurs
async fn transport_loop(
    mut transport: impl crate::transport::Transport,
    mut cmd_rx: mpsc::UnboundedReceiver<ClientMessage>,
    event_tx: mpsc::Sender<SessionEvent>,
    shared: Arc<SessionShared>,
    mut shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) {
    debug!("transport loop started");

    // Emit the synthetic Ready event before entering the select loop.
    emit_event(&event_tx, SessionEvent::Ready).await;

    loop {
        tokio::select! {
            // Branch 1: outgoing action from the session handle
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(msg) => {
                        debug!("sending client message: {:?}", std::mem::discriminant(&msg));
                        match serde_json::to_string(&msg) {
                            Ok(json) => {
                                if let Err(e) = transport.send(json).await {
                                    error!("transport send error: {e}");
                                    emit_disconnected(
                                        &event_tx,
                                        &shared,
                                        Some(format!("transport send error: {e}")),
                                    ).await;
                                    break;
                                }
                            }
                            Err(e) => {
                                error!("failed to serialize ClientMessage: {e}");
                                // Serialization errors are programming bugs; don't kill the loop.
                            }
                        }
                    }
                    // Command channel closed — session handle dropped.
                    None => {
                        debug!("command channel closed, shutting down transport loop");
                        let _ = transport.close().await;
                        emit_disconnected(&event_tx, &shared, Some("session shut down".into())).await;
                        break;
                    }
                }
            }

            // Branch 2: shutdown signal
            _ = &mut shutdown_rx => {
                debug!("shutdown signal received");
                let _ = transport.close().await;
                emit_disconnected(&event_tx, &shared, Some("session shut down".into())).await;
                break;
            }

            // Branch 3: incoming broadcast from the server
            incoming = transport.recv() => {
                match incoming {
                    Some(Ok(text)) => {
                        let routed = {
                            let mut state = shared.state.lock().await;
                            router::route(&mut state, &text)
                        };
                        match routed {
                            Ok(msg) => {
                                emit_event(&event_tx, SessionEvent::from(msg)).await;
                            }
                            Err(BrainlookError::UnknownMessageKind { kind }) => {
                                // Fail-loud on drift, but keep the session alive.
                                warn!(%kind, "unknown inbound message kind — raw: {text}");
                                emit_event(&event_tx, SessionEvent::ProtocolDrift { kind }).await;
                            }
                            Err(e) => {
                                warn!("failed to route server message: {e} — raw: {text}");
                            }
                        }
                    }
                    Some(Err(e)) => {
                        error!("transport receive error: {e}");
                        emit_disconnected(
                            &event_tx,
                            &shared,
                            Some(format!("transport receive error: {e}")),
                        ).await;
                        break;
                    }
                    // Transport closed cleanly.
                    None => {
                        debug!("transport closed by server");
                        emit_disconnected(&event_tx, &shared, None).await;
                        break;
                    }
                }
            }
        }
    }

    debug!("transport loop exited");
}

/// Emit an event to the event channel. If the channel is full, log a warning
/// and drop the event to avoid blocking the transport loop.
async fn emit_event(event_tx: &mpsc::Sender<SessionEvent>, event: SessionEvent) {
    match event_tx.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(dropped)) => {
            warn!(
                "event channel full, dropping event: {:?}",
                std::mem::discriminant(&dropped)
            );
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!("event channel closed, receiver dropped");
        }
    }
}

/// Emit a [`Disconnected`](SessionEvent::Disconnected) event and mark the
/// session closed.
///
/// Uses `send().await` (blocking) instead of `try_send` because `Disconnected`
/// is always the last event on the channel and must never be silently dropped.
async fn emit_disconnected(
    event_tx: &mpsc::Sender<SessionEvent>,
    shared: &SessionShared,
    reason: Option<String>,
) {
    shared.connected.store(false, Ordering::Release);
    *shared.phase.lock().await = SessionPhase::Closed;
    let event = SessionEvent::Disconnected { reason };
    if event_tx.send(event).await.is_err() {
        debug!("event channel closed, receiver dropped");
    }
}

// ── Tests ───────────────────────────────────────────────────────────

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
    use crate::protocol::ServerMessage;
    use crate::transport::Transport;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    // ── Mock transport ──────────────────────────────────────────────

    /// A mock transport that records sent messages and replays scripted
    /// server broadcasts.
    struct MockTransport {
        /// Messages that `recv()` will yield in order.
        incoming: VecDeque<Option<std::result::Result<String, BrainlookError>>>,
        /// Recorded outgoing messages.
        sent: Arc<StdMutex<Vec<String>>>,
        /// Whether `close()` was called.
        closed: Arc<AtomicBool>,
    }

    impl MockTransport {
        fn new(
            incoming: Vec<Option<std::result::Result<String, BrainlookError>>>,
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
        async fn send(&mut self, message: String) -> std::result::Result<(), BrainlookError> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }

        async fn recv(&mut self) -> Option<std::result::Result<String, BrainlookError>> {
            if let Some(item) = self.incoming.pop_front() {
                // An explicit `None` entry signals a clean transport close;
                // `Some(result)` delivers the scripted message or error.
                item
            } else {
                // All scripted messages have been delivered — hang forever
                // so the transport loop stays alive until shutdown.
                std::future::pending().await
            }
        }

        async fn close(&mut self) -> std::result::Result<(), BrainlookError> {
            self.closed.store(true, Ordering::Relaxed);
            Ok(())
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────

    fn scoreboard_json(entries: &[(&str, u32)]) -> String {
        let players: Vec<Player> = entries
            .iter()
            .map(|(name, score)| Player {
                name: (*name).into(),
                score: *score,
            })
            .collect();
        serde_json::to_string(&ServerMessage::Scoreboard { players }).unwrap()
    }

    fn guess_json(player: &str, guess: &str, correct: bool) -> String {
        serde_json::to_string(&ServerMessage::Guess {
            player: player.into(),
            guess: guess.into(),
            correct,
        })
        .unwrap()
    }

    fn word_json(displayed: &str, clue: &str) -> String {
        serde_json::to_string(&ServerMessage::Word {
            displayed: displayed.into(),
            clue: clue.into(),
        })
        .unwrap()
    }

    fn test_config() -> SessionConfig {
        SessionConfig::new("amber-otter-lane", "Ann")
    }

    // ── Tests ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn ready_is_first_event() {
        let (transport, _sent, _closed) =
            MockTransport::new(vec![Some(Ok(scoreboard_json(&[("Ann", 0)])))]);

        let (mut session, mut events) = GameSession::start(transport, test_config());

        let first = events.recv().await.unwrap();
        assert!(
            matches!(first, SessionEvent::Ready),
            "expected Ready as first event, got {first:?}"
        );

        session.shutdown().await;
    }

    #[tokio::test]
    async fn scoreboard_broadcast_replaces_state_and_emits_event() {
        let (transport, _sent, _closed) = MockTransport::new(vec![
            Some(Ok(scoreboard_json(&[("Ann", 0), ("Bo", 2)]))),
            Some(Ok(scoreboard_json(&[("Bo", 5)]))),
        ]);

        let (mut session, mut events) = GameSession::start(transport, test_config());

        let _ = events.recv().await; // Ready
        let _ = events.recv().await; // first scoreboard
        let event = events.recv().await.unwrap(); // second scoreboard
        let SessionEvent::ScoreboardUpdated { players } = event else {
            panic!("expected ScoreboardUpdated");
        };
        assert_eq!(players.len(), 1);

        let scoreboard = session.scoreboard().await;
        assert_eq!(scoreboard.len(), 1);
        assert_eq!(scoreboard[0].name, "Bo");
        assert_eq!(scoreboard[0].score, 5);

        session.shutdown().await;
    }

    #[tokio::test]
    async fn guesses_accumulate_in_receipt_order() {
        let (transport, _sent, _closed) = MockTransport::new(vec![
            Some(Ok(guess_json("Ann", "otter", false))),
            Some(Ok(guess_json("Bo", "whale", true))),
        ]);

        let (mut session, mut events) = GameSession::start(transport, test_config());

        let _ = events.recv().await; // Ready
        let _ = events.recv().await;
        let _ = events.recv().await;

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.guess_log().len(), 2);
        assert_eq!(snapshot.guess_log()[0].guess, "otter");
        assert_eq!(snapshot.guess_log()[1].guess, "whale");
        assert!(snapshot.guess_log()[1].correct);

        session.shutdown().await;
    }

    #[tokio::test]
    async fn word_update_keeps_only_latest() {
        let (transport, _sent, _closed) = MockTransport::new(vec![
            Some(Ok(word_json("w _ _ l e", "sea mammal"))),
            Some(Ok(word_json("w h a l e", "sea mammal"))),
        ]);

        let (mut session, mut events) = GameSession::start(transport, test_config());

        let _ = events.recv().await; // Ready
        let _ = events.recv().await;
        let _ = events.recv().await;

        let word = session.word().await;
        assert_eq!(word.displayed, "w h a l e");
        assert_eq!(word.clue, "sea mammal");

        session.shutdown().await;
    }

    #[tokio::test]
    async fn settings_echo_updates_state() {
        let raw = r#"{"type":"settings","settings":{"minLength":4,"maxLength":9,"interval":2}}"#;
        let (transport, _sent, _closed) = MockTransport::new(vec![Some(Ok(raw.into()))]);

        let (mut session, mut events) = GameSession::start(transport, test_config());

        let _ = events.recv().await; // Ready
        let event = events.recv().await.unwrap();
        assert!(matches!(event, SessionEvent::SettingsChanged { .. }));

        assert_eq!(
            session.settings().await,
            RoomSettings {
                min_length: 4,
                max_length: 9,
                interval: 2,
            }
        );

        session.shutdown().await;
    }

    #[tokio::test]
    async fn unknown_kind_emits_drift_and_preserves_state() {
        let (transport, _sent, _closed) = MockTransport::new(vec![
            Some(Ok(scoreboard_json(&[("Ann", 3)]))),
            Some(Ok(r#"{"type":"leaderboard","players":[]}"#.into())),
        ]);

        let (mut session, mut events) = GameSession::start(transport, test_config());

        let _ = events.recv().await; // Ready
        let _ = events.recv().await; // ScoreboardUpdated
        let event = events.recv().await.unwrap();
        let SessionEvent::ProtocolDrift { kind } = event else {
            panic!("expected ProtocolDrift, got {event:?}");
        };
        assert_eq!(kind, "leaderboard");

        // The earlier scoreboard survives; the session stays connected.
        assert_eq!(session.scoreboard().await.len(), 1);
        assert!(session.is_connected());

        session.shutdown().await;
    }

    #[tokio::test]
    async fn malformed_payload_is_skipped_without_killing_session() {
        let (transport, _sent, _closed) = MockTransport::new(vec![
            Some(Ok(r#"{"type":"guess","player":42}"#.into())),
            Some(Ok(guess_json("Ann", "whale", true))),
        ]);

        let (mut session, mut events) = GameSession::start(transport, test_config());

        let _ = events.recv().await; // Ready
        // The malformed message produces no event; the next valid one does.
        let event = events.recv().await.unwrap();
        assert!(matches!(event, SessionEvent::GuessLogged { .. }));
        assert_eq!(session.snapshot().await.guess_log().len(), 1);

        session.shutdown().await;
    }

    #[tokio::test]
    async fn submit_guess_sends_wire_message() {
        let (transport, sent, _closed) = MockTransport::new(vec![]);

        let (mut session, mut events) = GameSession::start(transport, test_config());
        let _ = events.recv().await; // Ready

        session.submit_guess("whale").unwrap();

        // Give the loop a moment to process.
        tokio::time::sleep(Duration::from_millis(50)).await;

        {
            let messages = sent.lock().unwrap();
            assert_eq!(messages.len(), 1);
            assert_eq!(messages[0], r#"{"type":"guess","guess":"whale"}"#);
        }

        session.shutdown().await;
    }

    #[tokio::test]
    async fn change_settings_sends_wire_message() {
        let (transport, sent, _closed) = MockTransport::new(vec![]);

        let (mut session, mut events) = GameSession::start(transport, test_config());
        let _ = events.recv().await; // Ready

        session
            .change_settings(RoomSettings {
                min_length: 4,
                max_length: 12,
                interval: 10,
            })
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        {
            let messages = sent.lock().unwrap();
            let last: ClientMessage = serde_json::from_str(messages.last().unwrap()).unwrap();
            let ClientMessage::Settings { settings } = last else {
                panic!("expected Settings message");
            };
            assert_eq!(settings.interval, 10);
        }

        session.shutdown().await;
    }

    #[tokio::test]
    async fn submit_pending_guess_drains_the_draft() {
        let (transport, sent, _closed) = MockTransport::new(vec![]);

        let (mut session, mut events) = GameSession::start(transport, test_config());
        let _ = events.recv().await; // Ready

        session.set_pending_guess("otter").await;
        session.submit_pending_guess().await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        {
            let messages = sent.lock().unwrap();
            assert_eq!(messages.last().unwrap(), r#"{"type":"guess","guess":"otter"}"#);
        }
        assert_eq!(session.snapshot().await.pending_guess(), "");

        session.shutdown().await;
    }

    #[tokio::test]
    async fn submit_settings_draft_sends_the_draft() {
        let (transport, sent, _closed) = MockTransport::new(vec![]);

        let (mut session, mut events) = GameSession::start(transport, test_config());
        let _ = events.recv().await; // Ready

        let draft = RoomSettings {
            min_length: 5,
            max_length: 15,
            interval: 20,
        };
        session.set_settings_draft(draft).await;
        session.submit_settings_draft().await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        {
            let messages = sent.lock().unwrap();
            let last: ClientMessage = serde_json::from_str(messages.last().unwrap()).unwrap();
            assert_eq!(last, ClientMessage::Settings { settings: draft });
        }

        session.shutdown().await;
    }

    #[tokio::test]
    async fn disconnected_on_transport_close() {
        let (transport, _sent, _closed) = MockTransport::new(vec![
            Some(Ok(scoreboard_json(&[("Ann", 0)]))),
            // Explicit None signals clean transport close.
            None,
        ]);

        let (mut session, mut events) = GameSession::start(transport, test_config());

        let _ = events.recv().await; // Ready
        let _ = events.recv().await; // ScoreboardUpdated
        let event = events.recv().await.unwrap();
        assert!(matches!(event, SessionEvent::Disconnected { reason: None }));

        assert!(!session.is_connected());
        assert_eq!(session.phase().await, SessionPhase::Closed);

        session.shutdown().await;
    }

    #[tokio::test]
    async fn transport_recv_error_emits_disconnected_with_reason() {
        let (transport, _sent, _closed) = MockTransport::new(vec![Some(Err(
            BrainlookError::TransportReceive("boom".into()),
        ))]);

        let (mut session, mut events) = GameSession::start(transport, test_config());

        let _ = events.recv().await; // Ready
        let event = events.recv().await.unwrap();
        let SessionEvent::Disconnected { reason } = event else {
            panic!("expected Disconnected");
        };
        assert!(reason.unwrap().contains("boom"));

        session.shutdown().await;
    }

    #[tokio::test]
    async fn sends_after_shutdown_are_rejected_not_queued() {
        let (transport, _sent, _closed) = MockTransport::new(vec![]);

        let (mut session, mut events) = GameSession::start(transport, test_config());
        let _ = events.recv().await; // Ready

        session.shutdown().await;

        let result = session.submit_guess("late");
        assert!(matches!(result, Err(BrainlookError::NotConnected)));
    }

    #[tokio::test]
    async fn shutdown_emits_disconnected_and_closes_transport() {
        let (transport, _sent, closed) = MockTransport::new(vec![]);

        let (mut session, mut events) = GameSession::start(transport, test_config());
        let _ = events.recv().await; // Ready

        session.shutdown().await;

        let event = events.recv().await.unwrap();
        let SessionEvent::Disconnected { reason } = event else {
            panic!("expected Disconnected");
        };
        assert_eq!(reason.as_deref(), Some("session shut down"));
        assert!(closed.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn double_shutdown_is_idempotent() {
        let (transport, _sent, _closed) = MockTransport::new(vec![]);

        let (mut session, mut events) = GameSession::start(transport, test_config());
        let _ = events.recv().await; // Ready

        session.shutdown().await;
        session.shutdown().await; // must not panic or hang
        assert_eq!(session.phase().await, SessionPhase::Closed);
    }

    #[tokio::test]
    async fn drop_without_explicit_shutdown_releases_the_loop() {
        let (transport, _sent, _closed) = MockTransport::new(vec![]);

        let (session, mut events) = GameSession::start(transport, test_config());
        let _ = events.recv().await; // Ready

        drop(session);

        // The transport loop is aborted; the event channel closes. We just
        // verify we don't hang or panic.
        while let Some(_event) = events.recv().await {}
    }

    #[tokio::test]
    async fn event_channel_backpressure_does_not_block_the_loop() {
        // More broadcasts than the event channel can hold.
        let mut incoming: Vec<Option<std::result::Result<String, BrainlookError>>> = Vec::new();
        for i in 0..30 {
            incoming.push(Some(Ok(guess_json("Ann", &format!("g{i}"), false))));
        }
        incoming.push(None);

        let (transport, _sent, _closed) = MockTransport::new(incoming);

        let config = test_config().with_event_channel_capacity(1);
        let (mut session, mut events) = GameSession::start(transport, config);

        // Don't read events immediately — let the channel fill up.
        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut count = 0;
        while let Some(_event) = events.recv().await {
            count += 1;
        }
        // Some events were dropped, but Disconnected still arrived and the
        // loop completed. The state, unlike the event stream, is lossless.
        assert!(count >= 2, "expected at least Ready and Disconnected, got {count}");
        assert!(count < 32, "expected backpressure to drop events, got all {count}");
        assert_eq!(session.snapshot().await.guess_log().len(), 30);

        session.shutdown().await;
    }

    /// Transport that hangs forever in `close()` so shutdown timeout/abort
    /// can be tested.
    struct HangingCloseTransport {
        close_called: Arc<AtomicBool>,
        dropped: Arc<AtomicBool>,
    }

    impl HangingCloseTransport {
        fn new() -> (Self, Arc<AtomicBool>, Arc<AtomicBool>) {
            let close_called = Arc::new(AtomicBool::new(false));
            let dropped = Arc::new(AtomicBool::new(false));
            (
                Self {
                    close_called: Arc::clone(&close_called),
                    dropped: Arc::clone(&dropped),
                },
                close_called,
                dropped,
            )
        }
    }

    impl Drop for HangingCloseTransport {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::Release);
        }
    }

    #[async_trait]
    impl Transport for HangingCloseTransport {
        async fn send(&mut self, _message: String) -> std::result::Result<(), BrainlookError> {
            Ok(())
        }

        async fn recv(&mut self) -> Option<std::result::Result<String, BrainlookError>> {
            std::future::pending().await
        }

        async fn close(&mut self) -> std::result::Result<(), BrainlookError> {
            self.close_called.store(true, Ordering::Release);
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn shutdown_timeout_aborts_stuck_transport_task() {
        let (transport, close_called, dropped) = HangingCloseTransport::new();
        let config = test_config().with_shutdown_timeout(Duration::from_millis(20));
        let (mut session, mut events) = GameSession::start(transport, config);

        // Drain Ready so the channel remains uncongested.
        let event = events.recv().await.unwrap();
        assert!(matches!(event, SessionEvent::Ready));

        session.shutdown().await;

        assert!(
            close_called.load(Ordering::Acquire),
            "transport.close() should have been attempted during graceful shutdown"
        );
        assert!(
            dropped.load(Ordering::Acquire),
            "timed-out shutdown should abort and drop the transport loop task"
        );
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn config_defaults() {
        let config = test_config();
        assert_eq!(config.room_code, "amber-otter-lane");
        assert_eq!(config.participant_name, "Ann");
        assert_eq!(config.event_channel_capacity, 256);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn event_channel_capacity_is_clamped_to_one() {
        let config = test_config().with_event_channel_capacity(0);
        assert_eq!(config.event_channel_capacity, 1);
    }

    #[tokio::test]
    async fn session_starts_open() {
        let (transport, _sent, _closed) = MockTransport::new(vec![]);

        let (mut session, mut events) = GameSession::start(transport, test_config());
        let _ = events.recv().await; // Ready

        assert_eq!(session.phase().await, SessionPhase::Open);
        assert_eq!(session.room_code(), "amber-otter-lane");
        assert_eq!(session.participant_name(), "Ann");

        session.shutdown().await;
    }

    #[tokio::test]
    async fn debug_impl_for_session() {
        let (transport, _sent, _closed) = MockTransport::new(vec![]);

        let (mut session, mut events) = GameSession::start(transport, test_config());
        let _ = events.recv().await; // Ready

        let debug_str = format!("{session:?}");
        assert!(debug_str.contains("GameSession"));
        assert!(debug_str.contains("amber-otter-lane"));

        session.shutdown().await;
    }
}

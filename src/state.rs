//! The authoritative local view of one game session.
//!
//! [`GameSessionState`] is a plain aggregate, not a state machine: four
//! server-owned entities (scoreboard, guess log, word/clue, settings) plus
//! two client-local drafts (the unsent guess text and the not-yet-submitted
//! settings edit).
//!
//! The four entity mutators are `pub(crate)` on purpose: the only write path
//! is [`crate::router::route`], invoked from the session's transport loop.
//! Presentation code reads snapshots and edits drafts, nothing else.

use crate::protocol::{GuessRecord, Player, RoomSettings, WordClue};

/// Local view model for one room session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameSessionState {
    scoreboard: Vec<Player>,
    guess_log: Vec<GuessRecord>,
    word: WordClue,
    settings: RoomSettings,
    pending_guess: String,
    settings_draft: RoomSettings,
}

impl GameSessionState {
    /// Fresh state for a newly opened session.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// The most recently broadcast scoreboard.
    pub fn scoreboard(&self) -> &[Player] {
        &self.scoreboard
    }

    /// Every judged guess received so far, in receipt order.
    pub fn guess_log(&self) -> &[GuessRecord] {
        &self.guess_log
    }

    /// The current masked word and clue.
    pub fn word(&self) -> &WordClue {
        &self.word
    }

    /// The room settings the server last broadcast.
    pub fn settings(&self) -> RoomSettings {
        self.settings
    }

    /// The guess text the user has typed but not yet submitted.
    pub fn pending_guess(&self) -> &str {
        &self.pending_guess
    }

    /// The locally edited, not-yet-submitted settings.
    pub fn settings_draft(&self) -> RoomSettings {
        self.settings_draft
    }

    // ── Router mutations (the only writers of the four entities) ────

    /// Replace the scoreboard wholesale. No merging with prior entries.
    pub(crate) fn replace_scoreboard(&mut self, players: Vec<Player>) {
        self.scoreboard = players;
    }

    /// Append one judged guess. The log never shrinks or reorders.
    pub(crate) fn append_guess(&mut self, entry: GuessRecord) {
        self.guess_log.push(entry);
    }

    /// Replace the masked word and clue wholesale.
    pub(crate) fn replace_word(&mut self, word: WordClue) {
        self.word = word;
    }

    /// Replace the room settings with the server's echo.
    pub(crate) fn replace_settings(&mut self, settings: RoomSettings) {
        self.settings = settings;
    }

    // ── Draft edits (UI-owned, never touched by the router) ─────────

    /// Overwrite the pending guess text.
    pub fn set_pending_guess(&mut self, text: impl Into<String>) {
        self.pending_guess = text.into();
    }

    /// Take the pending guess text, leaving it empty.
    pub fn take_pending_guess(&mut self) -> String {
        std::mem::take(&mut self.pending_guess)
    }

    /// Overwrite the settings draft.
    pub fn set_settings_draft(&mut self, settings: RoomSettings) {
        self.settings_draft = settings;
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

    fn player(name: &str, score: u32) -> Player {
        Player {
            name: name.into(),
            score,
        }
    }

    #[test]
    fn scoreboard_is_replaced_not_merged() {
        let mut state = GameSessionState::new();
        state.replace_scoreboard(vec![player("Ann", 3), player("Bo", 1)]);
        state.replace_scoreboard(vec![player("Cy", 0)]);

        assert_eq!(state.scoreboard().len(), 1);
        assert_eq!(state.scoreboard()[0].name, "Cy");
    }

    #[test]
    fn guess_log_preserves_receipt_order() {
        let mut state = GameSessionState::new();
        for i in 0..5 {
            state.append_guess(GuessRecord {
                player: "Ann".into(),
                guess: format!("guess-{i}"),
                correct: false,
            });
        }

        assert_eq!(state.guess_log().len(), 5);
        for (i, entry) in state.guess_log().iter().enumerate() {
            assert_eq!(entry.guess, format!("guess-{i}"));
        }
    }

    #[test]
    fn word_keeps_only_latest() {
        let mut state = GameSessionState::new();
        state.replace_word(WordClue {
            displayed: "w _ _ l e".into(),
            clue: "sea mammal".into(),
        });
        state.replace_word(WordClue {
            displayed: "w h a l e".into(),
            clue: "sea mammal".into(),
        });

        assert_eq!(state.word().displayed, "w h a l e");
    }

    #[test]
    fn settings_echo_does_not_touch_draft() {
        let mut state = GameSessionState::new();
        let draft = RoomSettings {
            min_length: 4,
            max_length: 10,
            interval: 2,
        };
        state.set_settings_draft(draft);

        // Server-adjusted echo arrives; the unsent draft stays put.
        state.replace_settings(RoomSettings {
            min_length: 5,
            max_length: 10,
            interval: 2,
        });

        assert_eq!(state.settings_draft(), draft);
        assert_eq!(state.settings().min_length, 5);
    }

    #[test]
    fn take_pending_guess_empties_the_draft() {
        let mut state = GameSessionState::new();
        state.set_pending_guess("whale");
        assert_eq!(state.take_pending_guess(), "whale");
        assert_eq!(state.pending_guess(), "");
    }
}

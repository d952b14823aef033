use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    games::GameContext,
    services::persistence::{load_slice, merge_or_warn, replace_or_warn},
    state::{
        host::HostEvent,
        time_accounting::{PauseReason, TimeAccounting, TimerEvent},
    },
};

/// Slice key of the memory match game.
pub const GAME_ID: &str = "memory";

/// Card faces; each appears twice in a deck.
pub const FACES: [&str; 8] = ["🍎", "🍌", "🍇", "🍓", "🍒", "🍍", "🥝", "🍉"];

/// One card on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Unique per deal.
    pub id: Uuid,
    /// Face shared with exactly one other card.
    pub face: &'static str,
    /// Whether the card's pair was found.
    pub matched: bool,
}

/// What a flip did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOutcome {
    /// Out of range, already matched, already face up, or two cards are waiting.
    Ignored,
    /// First card of a pair turned over.
    Revealed,
    /// Second card matched the first.
    Matched {
        /// Whether this pair completed the board.
        won: bool,
    },
    /// Second card did not match; both stay face up until [`MemorySession::settle`].
    Mismatch,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemorySave {
    #[serde(default)]
    wins: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    best_time_ms: Option<u64>,
}

/// Deal a shuffled deck of [`FACES`] pairs.
pub fn shuffled_deck() -> Vec<Card> {
    let mut faces: Vec<&'static str> = FACES.iter().flat_map(|face| [*face, *face]).collect();
    faces.shuffle(&mut rand::rng());
    deck_from_faces(&faces)
}

fn deck_from_faces(faces: &[&'static str]) -> Vec<Card> {
    faces
        .iter()
        .map(|&face| Card {
            id: Uuid::new_v4(),
            face,
            matched: false,
        })
        .collect()
}

/// A memory match board plus the saved win count and best time.
pub struct MemorySession {
    context: GameContext,
    deck: Vec<Card>,
    face_up: Vec<usize>,
    moves: u32,
    timer: TimeAccounting,
    wins: u32,
    best_time_ms: Option<u64>,
}

impl MemorySession {
    /// Open the game with a freshly shuffled deck.
    pub async fn open(context: GameContext) -> Self {
        Self::open_with_deck(context, shuffled_deck()).await
    }

    async fn open_with_deck(context: GameContext, deck: Vec<Card>) -> Self {
        let saved: MemorySave = load_slice(context.repository(), GAME_ID).await;
        Self {
            context,
            deck,
            face_up: Vec::with_capacity(2),
            moves: 0,
            timer: TimeAccounting::new(),
            wins: saved.wins,
            best_time_ms: saved.best_time_ms,
        }
    }

    /// Cards in board order.
    pub fn deck(&self) -> &[Card] {
        &self.deck
    }

    /// Whether the card at `index` shows its face.
    pub fn is_showing(&self, index: usize) -> bool {
        self.face_up.contains(&index) || self.deck.get(index).is_some_and(|card| card.matched)
    }

    /// Pair comparisons made this round.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Rounds completed ever.
    pub fn wins(&self) -> u32 {
        self.wins
    }

    /// Fastest completed round, if any.
    pub fn best_time_ms(&self) -> Option<u64> {
        self.best_time_ms
    }

    /// Round time so far.
    pub fn elapsed_ms(&self) -> u64 {
        self.timer.elapsed_ms(self.context.now_ms())
    }

    /// Whether every pair was found.
    pub fn is_complete(&self) -> bool {
        self.deck.iter().all(|card| card.matched)
    }

    /// Turn the card at `index` face up.
    pub async fn flip(&mut self, index: usize) -> FlipOutcome {
        let Some(card) = self.deck.get(index) else {
            return FlipOutcome::Ignored;
        };
        if card.matched || self.face_up.contains(&index) || self.face_up.len() == 2 {
            return FlipOutcome::Ignored;
        }

        if !self.timer.has_started() {
            let now = self.context.now_ms();
            // a stopped timer always accepts Start
            let _ = self.timer.apply(TimerEvent::Start, now);
        }

        self.face_up.push(index);
        let &[first, second] = self.face_up.as_slice() else {
            return FlipOutcome::Revealed;
        };

        self.moves += 1;
        if self.deck[first].face != self.deck[second].face {
            return FlipOutcome::Mismatch;
        }

        self.deck[first].matched = true;
        self.deck[second].matched = true;
        self.face_up.clear();

        let won = self.is_complete();
        if won {
            self.finish_round().await;
        }
        FlipOutcome::Matched { won }
    }

    /// Turn an unmatched pair back face down.
    pub fn settle(&mut self) {
        if self.face_up.len() == 2 {
            self.face_up.clear();
        }
    }

    /// Deal a new deck and reset moves and the round timer.
    pub fn new_round(&mut self) {
        self.reset_board(shuffled_deck());
    }

    fn reset_board(&mut self, deck: Vec<Card>) {
        self.deck = deck;
        self.face_up.clear();
        self.moves = 0;
        self.timer = TimeAccounting::new();
    }

    /// Forget every win and the best time.
    pub async fn reset_progress(&mut self) {
        self.wins = 0;
        self.best_time_ms = None;
        let save = MemorySave::default();
        replace_or_warn(self.context.repository(), GAME_ID, &save).await;
    }

    /// Pause or resume the round timer when the host changes visibility.
    pub fn on_host_event(&mut self, event: HostEvent) {
        let now = self.context.now_ms();
        self.timer.on_host_event(event, now);
    }

    async fn finish_round(&mut self) {
        let now = self.context.now_ms();
        let round_ms = self.timer.elapsed_ms(now);
        if let Err(err) = self
            .timer
            .apply(TimerEvent::Pause(PauseReason::Finished), now)
        {
            debug!(error = %err, "round timer already stopped");
        }

        self.wins += 1;
        self.best_time_ms = Some(self.best_time_ms.map_or(round_ms, |best| best.min(round_ms)));
        info!(wins = self.wins, round_ms, moves = self.moves, "memory round won");

        let save = MemorySave {
            wins: self.wins,
            best_time_ms: self.best_time_ms,
        };
        merge_or_warn(self.context.repository(), GAME_ID, &save).await;
    }
}

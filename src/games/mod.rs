//! Game session controllers. Each game owns its in-memory state, reads its
//! slice of the save document on open and writes its fields back whenever a
//! transition changes them.

pub mod arcade;
pub mod clicker;
pub mod countries;
pub mod memory;
pub mod tap_counter;

use std::sync::Arc;

use crate::{
    dao::save_repository::SaveRepository,
    state::clock::{Clock, SystemClock},
};

/// Static description of a game on the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameInfo {
    /// Identifier used as the slice key in the save document.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Flat key the game used before the unified document existed.
    pub legacy_key: Option<&'static str>,
}

/// Every game with a session controller.
pub const CATALOG: &[GameInfo] = &[
    GameInfo {
        id: clicker::GAME_ID,
        name: "Clicker",
        legacy_key: None,
    },
    GameInfo {
        id: memory::GAME_ID,
        name: "Memory Match",
        legacy_key: None,
    },
    GameInfo {
        id: tap_counter::GAME_ID,
        name: "Tap Counter",
        legacy_key: Some(tap_counter::LEGACY_KEY),
    },
    GameInfo {
        id: countries::GAME_ID,
        name: "Name All Countries",
        legacy_key: Some(countries::LEGACY_KEY),
    },
    GameInfo {
        id: arcade::ArcadeGame::Flappy.id(),
        name: "Flappy Bird",
        legacy_key: Some(arcade::ArcadeGame::Flappy.legacy_key()),
    },
    GameInfo {
        id: arcade::ArcadeGame::Stack.id(),
        name: "Stack",
        legacy_key: Some(arcade::ArcadeGame::Stack.legacy_key()),
    },
];

/// Find a game by identifier.
pub fn find(id: &str) -> Option<&'static GameInfo> {
    CATALOG.iter().find(|game| game.id == id)
}

/// Handles every session needs: the save repository and a wall clock.
#[derive(Clone)]
pub struct GameContext {
    repository: SaveRepository,
    clock: Arc<dyn Clock>,
}

impl GameContext {
    /// Context over `repository` using the system clock.
    pub fn new(repository: SaveRepository) -> Self {
        Self::with_clock(repository, Arc::new(SystemClock))
    }

    /// Context with an explicit clock.
    pub fn with_clock(repository: SaveRepository, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Save repository shared by every session.
    pub fn repository(&self) -> &SaveRepository {
        &self.repository
    }

    /// Current wall-clock time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}

/// Render a duration as `MM:SS`, truncating partial seconds.
///
/// Minutes are not wrapped into hours.
pub fn format_clock(ms: u64) -> String {
    let total_seconds = ms / 1_000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

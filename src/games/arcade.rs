//! High-score bookkeeping for the canvas arcade games. The games themselves
//! only report finished runs.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    games::GameContext,
    services::persistence::{import_legacy_or_warn, load_slice, merge_or_warn, replace_or_warn},
};

/// Arcade games that only persist a high score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcadeGame {
    /// Flappy-bird clone.
    Flappy,
    /// Block stacking game.
    Stack,
}

impl ArcadeGame {
    /// Slice key in the save document.
    pub const fn id(self) -> &'static str {
        match self {
            ArcadeGame::Flappy => "game-3",
            ArcadeGame::Stack => "game-4",
        }
    }

    /// Flat key the game wrote before the unified document.
    pub const fn legacy_key(self) -> &'static str {
        match self {
            ArcadeGame::Flappy => "flappy-bird:highscore:v1",
            ArcadeGame::Stack => "stack-game:highscore:v1",
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HighScoreSave {
    #[serde(default)]
    high_score: u64,
}

/// Saved high score of one arcade game.
pub struct ArcadeSession {
    context: GameContext,
    game: ArcadeGame,
    high_score: u64,
}

impl ArcadeSession {
    /// Open `game`, importing its pre-unification save on first run.
    pub async fn open(context: GameContext, game: ArcadeGame) -> Self {
        import_legacy_or_warn(context.repository(), game.id(), game.legacy_key()).await;
        let saved: HighScoreSave = load_slice(context.repository(), game.id()).await;
        Self {
            context,
            game,
            high_score: saved.high_score,
        }
    }

    /// Which game this session tracks.
    pub fn game(&self) -> ArcadeGame {
        self.game
    }

    /// Best score so far.
    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    /// Record a finished run. Returns `true` when it set a new record.
    pub async fn finish_run(&mut self, score: u64) -> bool {
        if score <= self.high_score {
            return false;
        }
        self.high_score = score;
        info!(game_id = self.game.id(), score, "new high score");
        let save = HighScoreSave { high_score: score };
        merge_or_warn(self.context.repository(), self.game.id(), &save).await;
        true
    }

    /// Wipe the saved progress, leaving only a zero high score.
    pub async fn reset_progress(&mut self) {
        self.high_score = 0;
        let save = HighScoreSave { high_score: 0 };
        replace_or_warn(self.context.repository(), self.game.id(), &save).await;
    }
}

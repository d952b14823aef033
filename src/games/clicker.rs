use serde::{Deserialize, Serialize};

use crate::{
    games::GameContext,
    services::persistence::{load_slice, merge_or_warn},
};

/// Slice key of the clicker game.
pub const GAME_ID: &str = "clicker";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClickerSave {
    #[serde(default)]
    high_score: u64,
}

/// One clicker screen: a run score that lives in memory and a saved high score.
pub struct ClickerSession {
    context: GameContext,
    score: u64,
    high_score: u64,
}

impl ClickerSession {
    /// Open the game and read the saved high score.
    pub async fn open(context: GameContext) -> Self {
        let saved: ClickerSave = load_slice(context.repository(), GAME_ID).await;
        Self {
            context,
            score: 0,
            high_score: saved.high_score,
        }
    }

    /// Current run score.
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Best score ever reached.
    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    /// Count one click; a new record is persisted right away.
    pub async fn click(&mut self) -> u64 {
        self.score += 1;
        if self.score > self.high_score {
            self.high_score = self.score;
            self.persist().await;
        }
        self.score
    }

    /// Start a new run. The high score is untouched.
    pub fn reset_run(&mut self) {
        self.score = 0;
    }

    /// Clear the run and the saved high score.
    pub async fn reset_high(&mut self) {
        self.score = 0;
        self.high_score = 0;
        self.persist().await;
    }

    async fn persist(&self) {
        let save = ClickerSave {
            high_score: self.high_score,
        };
        merge_or_warn(self.context.repository(), GAME_ID, &save).await;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::games::testing::{context, context_over};

    #[tokio::test]
    async fn high_score_survives_reopen() {
        let (ctx, store, clock) = context();
        let mut session = ClickerSession::open(ctx).await;
        for _ in 0..3 {
            session.click().await;
        }
        session.reset_run();
        session.click().await;
        assert_eq!(session.score(), 1);
        assert_eq!(session.high_score(), 3);

        let reopened = ClickerSession::open(context_over(&store, &clock)).await;
        assert_eq!(reopened.high_score(), 3);
        assert_eq!(reopened.score(), 0);
    }

    #[tokio::test]
    async fn reset_high_persists_zero() {
        let (ctx, _store, _clock) = context();
        let mut session = ClickerSession::open(ctx.clone()).await;
        session.click().await;
        session.reset_high().await;

        let slice = ctx.repository().get_game_save(GAME_ID).await.unwrap();
        assert_eq!(serde_json::to_value(slice).unwrap(), json!({"highScore": 0}));
        assert_eq!(session.high_score(), 0);
    }
}

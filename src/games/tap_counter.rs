use serde::{Deserialize, Serialize};

use crate::{
    games::GameContext,
    services::persistence::{import_legacy_or_warn, load_slice, merge_or_warn},
};

/// Slice key of the tap counter.
pub const GAME_ID: &str = "game-1";
/// Flat key the tap counter wrote before the unified document.
pub const LEGACY_KEY: &str = "gamevault:clicker:v1";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TapSave {
    #[serde(default)]
    clicks: u64,
    #[serde(default)]
    best: u64,
    #[serde(default)]
    updated_at: u64,
}

/// Tap counter whose running count is persisted too, not only the best.
pub struct TapCounterSession {
    context: GameContext,
    clicks: u64,
    best: u64,
}

impl TapCounterSession {
    /// Open the game, importing the pre-unification save on first run.
    pub async fn open(context: GameContext) -> Self {
        import_legacy_or_warn(context.repository(), GAME_ID, LEGACY_KEY).await;
        let saved: TapSave = load_slice(context.repository(), GAME_ID).await;
        Self {
            context,
            clicks: saved.clicks,
            best: saved.best.max(saved.clicks),
        }
    }

    /// Taps so far.
    pub fn clicks(&self) -> u64 {
        self.clicks
    }

    /// Highest count ever reached.
    pub fn best(&self) -> u64 {
        self.best
    }

    /// Count one tap.
    pub async fn tap(&mut self) -> u64 {
        self.clicks += 1;
        self.best = self.best.max(self.clicks);
        self.persist().await;
        self.clicks
    }

    /// Zero the count and keep the best.
    pub async fn reset_clicks(&mut self) {
        self.clicks = 0;
        self.persist().await;
    }

    async fn persist(&self) {
        let save = TapSave {
            clicks: self.clicks,
            best: self.best,
            updated_at: self.context.now_ms(),
        };
        merge_or_warn(self.context.repository(), GAME_ID, &save).await;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        dao::kv_store::KeyValueStore,
        games::testing::{T0, context, context_over},
    };

    #[tokio::test]
    async fn imports_the_flat_key_once() {
        let (ctx, store, clock) = context();
        store
            .set(LEGACY_KEY, json!({"clicks": 4, "best": 9, "updatedAt": 1}))
            .await
            .unwrap();

        let mut session = TapCounterSession::open(ctx).await;
        assert_eq!((session.clicks(), session.best()), (4, 9));
        session.reset_clicks().await;

        let reopened = TapCounterSession::open(context_over(&store, &clock)).await;
        assert_eq!((reopened.clicks(), reopened.best()), (0, 9));
        assert!(store.snapshot(LEGACY_KEY).is_some());
    }

    #[tokio::test]
    async fn taps_are_stamped_with_the_clock() {
        let (ctx, _store, clock) = context();
        let mut session = TapCounterSession::open(ctx.clone()).await;
        clock.advance(250);
        session.tap().await;

        let slice = ctx.repository().get_game_save(GAME_ID).await.unwrap();
        assert_eq!(
            serde_json::to_value(slice).unwrap(),
            json!({"clicks": 1, "best": 1, "updatedAt": T0 + 250})
        );
    }
}

//! Fire-and-log persistence used by the game sessions.
//!
//! A failed write never interrupts play: the failure is logged and the
//! in-memory state of the session stays authoritative until the next write.

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::dao::{
    models::{GameSave, decode_slice, encode_patch},
    save_repository::SaveRepository,
};

/// Load one game's slice as `T`, falling back to `T::default()` on any failure.
pub async fn load_slice<T>(repository: &SaveRepository, game_id: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match repository.get_game_save(game_id).await {
        Ok(slice) => decode_slice(game_id, &slice),
        Err(err) => {
            warn!(game_id, error = %err, "failed to load game save; starting fresh");
            T::default()
        }
    }
}

/// Shallow-merge `patch` into the game's slice. Returns whether the write landed.
pub async fn merge_or_warn<T>(repository: &SaveRepository, game_id: &str, patch: &T) -> bool
where
    T: Serialize,
{
    let Some(fields) = encode_or_warn(game_id, patch) else {
        return false;
    };
    match repository.set_game_save(game_id, fields).await {
        Ok(()) => true,
        Err(err) => {
            warn!(game_id, error = %err, "failed to persist game progress");
            false
        }
    }
}

/// Overwrite the game's slice with `slice`. Returns whether the write landed.
pub async fn replace_or_warn<T>(repository: &SaveRepository, game_id: &str, slice: &T) -> bool
where
    T: Serialize,
{
    let Some(fields) = encode_or_warn(game_id, slice) else {
        return false;
    };
    match repository.replace_game_save(game_id, fields).await {
        Ok(()) => true,
        Err(err) => {
            warn!(game_id, error = %err, "failed to reset game progress");
            false
        }
    }
}

/// Pull a pre-unification per-game value into the unified document if needed.
pub async fn import_legacy_or_warn(repository: &SaveRepository, game_id: &str, legacy_key: &str) {
    match repository.import_legacy_slice(game_id, legacy_key).await {
        Ok(true) => debug!(game_id, legacy_key, "legacy progress imported"),
        Ok(false) => {}
        Err(err) => {
            warn!(game_id, legacy_key, error = %err, "failed to import legacy progress");
        }
    }
}

fn encode_or_warn<T>(game_id: &str, value: &T) -> Option<GameSave>
where
    T: Serialize,
{
    match encode_patch(value) {
        Ok(fields) => Some(fields),
        Err(err) => {
            warn!(game_id, error = %err, "game progress is not an object; not persisted");
            None
        }
    }
}

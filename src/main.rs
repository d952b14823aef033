//! arcade-save binary: opens the configured store, migrates older saves,
//! records a hub load and reports what each game has saved.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arcade_save::{
    config::AppConfig,
    games::CATALOG,
    services::{persistence::import_legacy_or_warn, store_supervisor},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let repository = store_supervisor::connect(&config)
        .await
        .context("connecting save store")?;

    for game in CATALOG {
        if let Some(legacy_key) = game.legacy_key {
            import_legacy_or_warn(&repository, game.id, legacy_key).await;
        }
    }

    let loads = repository
        .bump_site_loads()
        .await
        .context("recording site load")?;
    let save = repository
        .load_save()
        .await
        .context("loading save document")?;

    info!(
        total_site_loads = loads,
        version = save.version,
        saved_games = save.games.len(),
        "save document ready"
    );
    for game in CATALOG {
        let slice = save.game(game.id);
        if !slice.is_empty() {
            info!(game_id = game.id, name = game.name, fields = slice.len(), "saved progress");
        }
    }

    Ok(())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

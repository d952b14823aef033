//! "Name all countries" quiz: type country names against a clock that keeps
//! counting across reloads but not while the quiz is paused or backgrounded.

pub mod catalog;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    games::GameContext,
    services::persistence::{import_legacy_or_warn, load_slice, merge_or_warn},
    state::{
        host::HostEvent,
        time_accounting::{PauseReason, TimeAccounting, TimerEvent, TimerPhase, TimerSnapshot},
    },
};

pub use self::catalog::{COUNTRIES, Continent};

/// Slice key of the countries quiz.
pub const GAME_ID: &str = "game-2";
/// Flat key the quiz wrote before the unified document.
pub const LEGACY_KEY: &str = "arcade:game-2:name-all-countries:v1";

/// Result of submitting a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    /// A new country was named.
    Correct {
        /// Display spelling of the country.
        country: &'static str,
        /// Whether this was the last missing country.
        completed: bool,
    },
    /// Named earlier in this round.
    AlreadyGuessed,
    /// Not in the catalog.
    NotACountry,
    /// Empty input, or the quiz is paused.
    Ignored,
}

/// Progress on one continent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinentProgress {
    /// Continent the row describes.
    pub continent: Continent,
    /// Named countries, alphabetically.
    pub named: Vec<&'static str>,
    /// Countries the continent has in the catalog.
    pub total: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountriesSave {
    #[serde(default)]
    guessed: Vec<String>,
    #[serde(default)]
    is_paused: bool,
    #[serde(flatten)]
    timer: TimerSnapshot,
    #[serde(default)]
    best_count: usize,
    #[serde(default)]
    best_count_time_ms: u64,
}

/// Fields of [`CountriesSave`] touched by one event; absent fields are left alone.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct CountriesPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    guessed: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_paused: Option<bool>,
    #[serde(flatten)]
    timer: Option<TimerSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    best_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    best_count_time_ms: Option<u64>,
}

/// One quiz round plus the saved best result.
pub struct CountriesSession {
    context: GameContext,
    guessed: IndexSet<String>,
    paused: bool,
    timer: TimeAccounting,
    best_count: usize,
    best_count_time_ms: u64,
}

impl CountriesSession {
    /// Open the quiz and pick the round up where it was left.
    ///
    /// A clock stopped only because the quiz was backgrounded or closed
    /// resumes on its own; a manual pause is kept.
    pub async fn open(context: GameContext) -> Self {
        import_legacy_or_warn(context.repository(), GAME_ID, LEGACY_KEY).await;
        let saved: CountriesSave = load_slice(context.repository(), GAME_ID).await;

        let mut session = Self {
            context,
            guessed: saved.guessed.iter().map(|name| name.to_lowercase()).collect(),
            paused: saved.is_paused,
            timer: TimeAccounting::restore(saved.timer),
            best_count: saved.best_count,
            best_count_time_ms: saved.best_count_time_ms,
        };

        let reopen_event = match session.timer.phase() {
            TimerPhase::Running | TimerPhase::Paused(PauseReason::Hidden)
                if session.is_complete() =>
            {
                Some(TimerEvent::Pause(PauseReason::Finished))
            }
            TimerPhase::Running | TimerPhase::Paused(PauseReason::Hidden) if session.paused => {
                Some(TimerEvent::Pause(PauseReason::Manual))
            }
            TimerPhase::Paused(PauseReason::Hidden) => Some(TimerEvent::Resume),
            _ => None,
        };
        if let Some(event) = reopen_event {
            session.apply_timer(event);
            session.persist(session.timer_patch()).await;
        }

        session
    }

    /// Countries named this round.
    pub fn guessed_count(&self) -> usize {
        self.guessed.len()
    }

    /// Whether `country` was named this round.
    pub fn has_guessed(&self, country: &str) -> bool {
        self.guessed.contains(&country.trim().to_lowercase())
    }

    /// Whether every country was named.
    pub fn is_complete(&self) -> bool {
        self.guessed.len() >= COUNTRIES.len()
    }

    /// Whether the player paused the quiz.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current clock phase.
    pub fn timer_phase(&self) -> TimerPhase {
        self.timer.phase()
    }

    /// Most countries ever named in one round.
    pub fn best_count(&self) -> usize {
        self.best_count
    }

    /// Time at which the best count was reached.
    pub fn best_count_time_ms(&self) -> u64 {
        self.best_count_time_ms
    }

    /// Round time so far.
    pub fn elapsed_ms(&self) -> u64 {
        self.timer.elapsed_ms(self.context.now_ms())
    }

    /// Observe the text box. The first non-empty input starts the clock
    /// unless the quiz is paused. Returns whether the clock started.
    pub async fn on_input(&mut self, text: &str) -> bool {
        if self.timer.has_started() || self.paused || text.trim().is_empty() {
            return false;
        }
        self.apply_timer(TimerEvent::Start);
        self.persist(self.timer_patch()).await;
        true
    }

    /// Submit a guess.
    pub async fn guess(&mut self, text: &str) -> GuessOutcome {
        let trimmed = text.trim();
        if self.paused || trimmed.is_empty() {
            return GuessOutcome::Ignored;
        }
        self.on_input(trimmed).await;

        let normalized = trimmed.to_lowercase();
        if self.guessed.contains(&normalized) {
            return GuessOutcome::AlreadyGuessed;
        }
        let Some((country, _)) = catalog::find(trimmed) else {
            return GuessOutcome::NotACountry;
        };

        self.guessed.insert(normalized);
        let mut patch = CountriesPatch {
            guessed: Some(self.guessed_list()),
            ..CountriesPatch::default()
        };

        let count = self.guessed.len();
        let elapsed = self.elapsed_ms();
        if count > self.best_count
            || (count == self.best_count
                && (self.best_count_time_ms == 0 || elapsed < self.best_count_time_ms))
        {
            self.best_count = count;
            self.best_count_time_ms = elapsed;
            patch.best_count = Some(count);
            patch.best_count_time_ms = Some(elapsed);
        }

        let completed = self.is_complete();
        if completed {
            self.apply_timer(TimerEvent::Pause(PauseReason::Finished));
            patch.timer = Some(self.timer.snapshot());
            info!(elapsed_ms = elapsed, "every country named");
        }

        self.persist(patch).await;
        GuessOutcome::Correct { country, completed }
    }

    /// Flip the manual pause. Returns whether the quiz is now paused.
    ///
    /// A finished round cannot be paused or resumed.
    pub async fn toggle_pause(&mut self) -> bool {
        if self.is_complete() {
            return self.paused;
        }

        self.paused = !self.paused;
        let event = match (self.paused, self.timer.phase()) {
            (true, TimerPhase::Running | TimerPhase::Paused(PauseReason::Hidden)) => {
                Some(TimerEvent::Pause(PauseReason::Manual))
            }
            (false, TimerPhase::Paused(PauseReason::Manual)) => Some(TimerEvent::Resume),
            _ => None,
        };
        if let Some(event) = event {
            self.apply_timer(event);
        }

        self.persist(CountriesPatch {
            is_paused: Some(self.paused),
            ..self.timer_patch()
        })
        .await;
        self.paused
    }

    /// Feed a host lifecycle event to the clock.
    pub async fn on_host_event(&mut self, event: HostEvent) {
        let now = self.context.now_ms();
        if self.timer.on_host_event(event, now).is_some() {
            self.persist(self.timer_patch()).await;
        }
    }

    /// Leave the screen. A running clock stops and resumes on the next open.
    pub async fn close(&mut self) {
        if self.timer.is_running() {
            self.apply_timer(TimerEvent::Pause(PauseReason::Hidden));
            self.persist(self.timer_patch()).await;
        }
    }

    /// Clear the round. The best result is kept.
    pub async fn restart(&mut self) {
        self.guessed.clear();
        self.paused = false;
        self.apply_timer(TimerEvent::Restart);
        self.persist(CountriesPatch {
            guessed: Some(Vec::new()),
            is_paused: Some(false),
            ..self.timer_patch()
        })
        .await;
    }

    /// Named countries grouped by continent, in board order. Each row lists
    /// its countries alphabetically.
    pub fn by_continent(&self) -> Vec<ContinentProgress> {
        Continent::ALL
            .into_iter()
            .map(|continent| {
                let members = COUNTRIES.iter().filter(|(_, c)| *c == continent);
                let mut named: Vec<&'static str> = members
                    .clone()
                    .filter(|(name, _)| self.guessed.contains(&name.to_lowercase()))
                    .map(|(name, _)| *name)
                    .collect();
                named.sort_unstable();
                ContinentProgress {
                    continent,
                    named,
                    total: members.count(),
                }
            })
            .collect()
    }

    fn apply_timer(&mut self, event: TimerEvent) {
        let now = self.context.now_ms();
        if let Err(err) = self.timer.apply(event, now) {
            debug!(error = %err, "quiz clock ignored event");
        }
    }

    fn guessed_list(&self) -> Vec<String> {
        self.guessed.iter().cloned().collect()
    }

    fn timer_patch(&self) -> CountriesPatch {
        CountriesPatch {
            timer: Some(self.timer.snapshot()),
            ..CountriesPatch::default()
        }
    }

    async fn persist(&self, patch: CountriesPatch) {
        merge_or_warn(self.context.repository(), GAME_ID, &patch).await;
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
    async fn first_non_empty_input_starts_the_clock() {
        let (ctx, _store, clock) = context();
        let mut session = CountriesSession::open(ctx).await;

        assert!(!session.on_input("   ").await);
        assert_eq!(session.timer_phase(), TimerPhase::Stopped);
        assert!(session.on_input("fr").await);
        assert!(!session.on_input("fra").await);

        clock.advance(4_000);
        assert_eq!(session.elapsed_ms(), 4_000);
    }

    #[tokio::test]
    async fn pausing_before_the_first_input_keeps_the_clock_stopped() {
        let (ctx, _store, _clock) = context();
        let mut session = CountriesSession::open(ctx).await;

        assert!(session.toggle_pause().await);
        assert!(!session.on_input("peru").await);
        assert_eq!(session.guess("peru").await, GuessOutcome::Ignored);
        assert!(!session.toggle_pause().await);
        assert_eq!(session.timer_phase(), TimerPhase::Stopped);
    }

    #[tokio::test]
    async fn guesses_are_classified() {
        let (ctx, _store, _clock) = context();
        let mut session = CountriesSession::open(ctx).await;

        assert_eq!(
            session.guess("  costa RICA ").await,
            GuessOutcome::Correct {
                country: "Costa Rica",
                completed: false
            }
        );
        assert_eq!(session.guess("Costa Rica").await, GuessOutcome::AlreadyGuessed);
        assert_eq!(session.guess("Atlantis").await, GuessOutcome::NotACountry);
        assert_eq!(session.guess("").await, GuessOutcome::Ignored);
        assert!(session.has_guessed("costa rica"));
        assert_eq!(session.guessed_count(), 1);
    }

    #[tokio::test]
    async fn best_record_prefers_more_then_faster() {
        let (ctx, _store, clock) = context();
        let mut session = CountriesSession::open(ctx).await;

        session.on_input("c").await;
        clock.advance(5_000);
        session.guess("Chile").await;
        assert_eq!((session.best_count(), session.best_count_time_ms()), (1, 5_000));

        session.restart().await;
        session.on_input("c").await;
        clock.advance(3_000);
        session.guess("Chile").await;
        assert_eq!((session.best_count(), session.best_count_time_ms()), (1, 3_000));

        session.restart().await;
        session.on_input("c").await;
        clock.advance(4_000);
        session.guess("Chile").await;
        assert_eq!((session.best_count(), session.best_count_time_ms()), (1, 3_000));
        clock.advance(1_000);
        session.guess("Peru").await;
        assert_eq!((session.best_count(), session.best_count_time_ms()), (2, 5_000));
    }

    #[tokio::test]
    async fn closed_time_is_excluded_and_the_clock_resumes_on_open() {
        let (ctx, store, clock) = context();
        let mut session = CountriesSession::open(ctx).await;
        session.guess("Japan").await;
        clock.advance(2_000);
        session.close().await;

        clock.advance(60_000);
        let reopened = CountriesSession::open(context_over(&store, &clock)).await;
        assert_eq!(reopened.timer_phase(), TimerPhase::Running);
        clock.advance(1_000);
        assert_eq!(reopened.elapsed_ms(), 3_000);
        assert!(reopened.has_guessed("japan"));
    }

    #[tokio::test]
    async fn a_running_clock_keeps_counting_across_a_reload() {
        let (ctx, store, clock) = context();
        let mut session = CountriesSession::open(ctx).await;
        session.guess("Japan").await;

        clock.advance(4_000);
        let reopened = CountriesSession::open(context_over(&store, &clock)).await;
        assert_eq!(reopened.elapsed_ms(), 4_000);
    }

    #[tokio::test]
    async fn manual_pause_survives_reload_and_visibility() {
        let (ctx, store, clock) = context();
        let mut session = CountriesSession::open(ctx).await;
        session.guess("Japan").await;
        clock.advance(1_000);
        session.toggle_pause().await;

        clock.advance(30_000);
        let mut reopened = CountriesSession::open(context_over(&store, &clock)).await;
        assert!(reopened.is_paused());
        reopened.on_host_event(HostEvent::Visible).await;
        assert_eq!(
            reopened.timer_phase(),
            TimerPhase::Paused(PauseReason::Manual)
        );
        assert_eq!(reopened.elapsed_ms(), 1_000);

        reopened.toggle_pause().await;
        clock.advance(500);
        assert_eq!(reopened.elapsed_ms(), 1_500);
    }

    #[tokio::test]
    async fn hidden_host_pauses_and_visible_resumes() {
        let (ctx, _store, clock) = context();
        let mut session = CountriesSession::open(ctx).await;
        session.guess("Japan").await;
        clock.advance(1_000);
        session.on_host_event(HostEvent::Hidden).await;
        clock.advance(9_000);
        session.on_host_event(HostEvent::Visible).await;
        clock.advance(1_000);
        assert_eq!(session.elapsed_ms(), 2_000);
    }

    #[tokio::test]
    async fn naming_everything_finishes_the_round() {
        let (ctx, store, clock) = context();
        let mut session = CountriesSession::open(ctx).await;
        let mut last = GuessOutcome::Ignored;
        for (name, _) in COUNTRIES {
            clock.advance(100);
            last = session.guess(name).await;
        }
        assert_eq!(
            last,
            GuessOutcome::Correct {
                country: COUNTRIES[COUNTRIES.len() - 1].0,
                completed: true
            }
        );
        assert_eq!(
            session.timer_phase(),
            TimerPhase::Paused(PauseReason::Finished)
        );
        let paused = session.is_paused();
        assert_eq!(session.toggle_pause().await, paused);

        let finished_at = session.elapsed_ms();
        clock.advance(10_000);
        let reopened = CountriesSession::open(context_over(&store, &clock)).await;
        assert_eq!(reopened.elapsed_ms(), finished_at);
        assert_eq!(reopened.best_count(), COUNTRIES.len());
    }

    #[tokio::test]
    async fn legacy_save_is_imported_and_resumed() {
        let (ctx, store, clock) = context();
        let legacy = json!({
            "guessed": ["france", "peru"],
            "timerStarted": true,
            "isPaused": false,
            "pausedElapsedMs": 7_000,
            "startWallTimeMs": 0,
            "running": false,
            "bestCount": 5,
            "bestCountTimeMs": 90_000
        });
        store
            .set(LEGACY_KEY, json!(legacy.to_string()))
            .await
            .unwrap();

        let session = CountriesSession::open(ctx.clone()).await;
        assert_eq!(session.guessed_count(), 2);
        assert_eq!(session.best_count(), 5);
        assert_eq!(session.timer_phase(), TimerPhase::Running);
        clock.advance(1_000);
        assert_eq!(session.elapsed_ms(), 8_000);

        let slice = ctx.repository().get_game_save(GAME_ID).await.unwrap();
        assert_eq!(slice.get("startWallTimeMs"), Some(&json!(T0)));
        assert_eq!(slice.get("pauseReason"), Some(&json!(null)));
    }

    #[tokio::test]
    async fn events_write_only_the_fields_they_change() {
        let (ctx, _store, clock) = context();
        let mut session = CountriesSession::open(ctx.clone()).await;
        session.guess("Japan").await;

        let marked = [
            ("bestCount".to_owned(), json!(40)),
            ("pausedElapsedMs".to_owned(), json!(123)),
        ];
        ctx.repository()
            .set_game_save(GAME_ID, marked.into_iter().collect())
            .await
            .unwrap();

        clock.advance(1_000);
        session.guess("Peru").await;
        let slice = ctx.repository().get_game_save(GAME_ID).await.unwrap();
        assert_eq!(slice.get("guessed"), Some(&json!(["japan", "peru"])));
        assert_eq!(slice.get("bestCount"), Some(&json!(2)));
        assert_eq!(slice.get("pausedElapsedMs"), Some(&json!(123)));

        ctx.repository()
            .set_game_save(GAME_ID, [("guessed".to_owned(), json!(["chad"]))].into_iter().collect())
            .await
            .unwrap();
        session.toggle_pause().await;
        let slice = ctx.repository().get_game_save(GAME_ID).await.unwrap();
        assert_eq!(slice.get("guessed"), Some(&json!(["chad"])));
        assert_eq!(slice.get("bestCount"), Some(&json!(2)));
        assert_eq!(slice.get("isPaused"), Some(&json!(true)));
        assert_eq!(slice.get("pauseReason"), Some(&json!("manual")));
        assert_eq!(slice.get("pausedElapsedMs"), Some(&json!(1_000)));
    }

    #[tokio::test]
    async fn continent_rows_are_alphabetical() {
        let (ctx, _store, _clock) = context();
        let mut session = CountriesSession::open(ctx).await;
        for name in ["Papua New Guinea", "New Zealand", "Fiji", "Samoa"] {
            session.guess(name).await;
        }

        let oceania = session
            .by_continent()
            .into_iter()
            .find(|row| row.continent == Continent::Oceania)
            .unwrap();
        assert_eq!(
            oceania.named,
            vec!["Fiji", "New Zealand", "Papua New Guinea", "Samoa"]
        );
    }

    #[tokio::test]
    async fn continent_board_covers_the_catalog() {
        let (ctx, _store, _clock) = context();
        let mut session = CountriesSession::open(ctx).await;
        session.guess("kenya").await;

        let board = session.by_continent();
        assert_eq!(board.len(), 6);
        assert_eq!(board.iter().map(|row| row.total).sum::<usize>(), COUNTRIES.len());
        let africa = board
            .iter()
            .find(|row| row.continent == Continent::Africa)
            .unwrap();
        assert_eq!(africa.named, vec!["Kenya"]);
    }
}

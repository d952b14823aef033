use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::host::HostEvent;

/// Why a started clock is currently not advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PauseReason {
    /// The player paused explicitly.
    Manual,
    /// The host went to the background; resumes on its own when visible again.
    Hidden,
    /// The round is over. Only a restart leaves this state.
    Finished,
}

/// Phases of the elapsed-time clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    /// Never started, or restarted.
    Stopped,
    /// Elapsed time is advancing with the wall clock.
    Running,
    /// Elapsed time is frozen.
    Paused(PauseReason),
}

/// Events that can be applied to the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// First qualifying input of a round.
    Start,
    /// Stop advancing for the given reason.
    Pause(PauseReason),
    /// Continue a manual or background pause.
    Resume,
    /// Discard all accumulated time.
    Restart,
}

/// Error returned when an event does not apply to the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while {from:?}")]
pub struct InvalidTransition {
    /// Phase the clock was in when the event arrived.
    pub from: TimerPhase,
    /// The rejected event.
    pub event: TimerEvent,
}

/// Persisted form of the clock: two numbers and a handful of flags.
///
/// Field names match the per-game layout older saves already use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    /// Whether the clock has left [`TimerPhase::Stopped`].
    #[serde(default)]
    pub timer_started: bool,
    /// Whether the clock is advancing.
    #[serde(default)]
    pub running: bool,
    /// Time accumulated by all finished running intervals.
    #[serde(default)]
    pub paused_elapsed_ms: u64,
    /// Wall-clock start of the current running interval; 0 when not running.
    #[serde(default)]
    pub start_wall_time_ms: u64,
    /// Reason for the current pause. Written as `null` when not paused.
    #[serde(default)]
    pub pause_reason: Option<PauseReason>,
}

/// Elapsed-time tracker that survives suspension and full process restarts.
///
/// Only `paused_elapsed_ms`, `start_wall_time_ms` and the phase need to be
/// persisted; elapsed time is recomputed from them and the caller's clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeAccounting {
    phase: TimerPhase,
    paused_elapsed_ms: u64,
    start_wall_time_ms: u64,
}

impl Default for TimeAccounting {
    fn default() -> Self {
        Self {
            phase: TimerPhase::Stopped,
            paused_elapsed_ms: 0,
            start_wall_time_ms: 0,
        }
    }
}

impl TimeAccounting {
    /// A clock that has never started.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a clock from its persisted fields.
    ///
    /// A started, non-running snapshot without a reason comes from older data
    /// and is treated as a background pause.
    pub fn restore(snapshot: TimerSnapshot) -> Self {
        if !snapshot.timer_started {
            return Self::new();
        }

        let phase = if snapshot.running {
            TimerPhase::Running
        } else {
            TimerPhase::Paused(snapshot.pause_reason.unwrap_or(PauseReason::Hidden))
        };

        Self {
            phase,
            paused_elapsed_ms: snapshot.paused_elapsed_ms,
            start_wall_time_ms: if snapshot.running {
                snapshot.start_wall_time_ms
            } else {
                0
            },
        }
    }

    /// Persisted form of the current state.
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            timer_started: self.phase != TimerPhase::Stopped,
            running: self.phase == TimerPhase::Running,
            paused_elapsed_ms: self.paused_elapsed_ms,
            start_wall_time_ms: self.start_wall_time_ms,
            pause_reason: match self.phase {
                TimerPhase::Paused(reason) => Some(reason),
                _ => None,
            },
        }
    }

    /// Current phase.
    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    /// Whether the clock is advancing.
    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    /// Whether the clock left the stopped phase.
    pub fn has_started(&self) -> bool {
        self.phase != TimerPhase::Stopped
    }

    /// Elapsed running time at `now_ms`. Pure: safe to call every frame.
    ///
    /// A wall clock that moved backwards never pulls the result below the
    /// time already accumulated.
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        match self.phase {
            TimerPhase::Running => self
                .paused_elapsed_ms
                .saturating_add(now_ms.saturating_sub(self.start_wall_time_ms)),
            _ => self.paused_elapsed_ms,
        }
    }

    /// Apply `event` at `now_ms`, returning the new phase.
    pub fn apply(&mut self, event: TimerEvent, now_ms: u64) -> Result<TimerPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;

        if self.phase == TimerPhase::Running && next != TimerPhase::Running {
            self.paused_elapsed_ms = self.elapsed_ms(now_ms);
            self.start_wall_time_ms = 0;
        }

        match (event, next) {
            (TimerEvent::Restart, _) => {
                self.paused_elapsed_ms = 0;
                self.start_wall_time_ms = 0;
            }
            (_, TimerPhase::Running) => {
                self.start_wall_time_ms = now_ms;
            }
            _ => {}
        }

        self.phase = next;
        Ok(next)
    }

    /// Map a host lifecycle event onto the clock.
    ///
    /// Hiding or unloading pauses a running clock; becoming visible resumes
    /// only a clock that was paused by hiding. Returns the new phase when the
    /// event changed anything.
    pub fn on_host_event(&mut self, event: HostEvent, now_ms: u64) -> Option<TimerPhase> {
        let timer_event = match (event, self.phase) {
            (HostEvent::Hidden | HostEvent::Unloading, TimerPhase::Running) => {
                TimerEvent::Pause(PauseReason::Hidden)
            }
            (HostEvent::Visible, TimerPhase::Paused(PauseReason::Hidden)) => TimerEvent::Resume,
            _ => return None,
        };
        self.apply(timer_event, now_ms).ok()
    }

    fn compute_transition(&self, event: TimerEvent) -> Result<TimerPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (_, TimerEvent::Restart) => TimerPhase::Stopped,
            (TimerPhase::Stopped, TimerEvent::Start) => TimerPhase::Running,
            (TimerPhase::Running, TimerEvent::Pause(reason)) => TimerPhase::Paused(reason),
            (
                TimerPhase::Paused(PauseReason::Hidden),
                TimerEvent::Pause(reason @ (PauseReason::Manual | PauseReason::Finished)),
            ) => TimerPhase::Paused(reason),
            (
                TimerPhase::Paused(PauseReason::Manual),
                TimerEvent::Pause(PauseReason::Finished),
            ) => TimerPhase::Paused(PauseReason::Finished),
            (
                TimerPhase::Paused(PauseReason::Manual | PauseReason::Hidden),
                TimerEvent::Resume,
            ) => TimerPhase::Running,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 1_700_000_000_000;

    fn started_at(now: u64) -> TimeAccounting {
        let mut clock = TimeAccounting::new();
        clock.apply(TimerEvent::Start, now).unwrap();
        clock
    }

    #[test]
    fn initial_state_is_stopped_with_no_time() {
        let clock = TimeAccounting::new();
        assert_eq!(clock.phase(), TimerPhase::Stopped);
        assert_eq!(clock.elapsed_ms(T0), 0);
    }

    #[test]
    fn paused_interval_is_excluded() {
        let mut clock = started_at(T0);
        clock
            .apply(TimerEvent::Pause(PauseReason::Manual), T0 + 5_000)
            .unwrap();
        assert_eq!(clock.elapsed_ms(T0 + 8_000), 5_000);

        clock.apply(TimerEvent::Resume, T0 + 8_000).unwrap();
        assert_eq!(clock.elapsed_ms(T0 + 10_000), 7_000);
    }

    #[test]
    fn running_snapshot_keeps_counting_after_reload() {
        let snapshot = TimerSnapshot {
            timer_started: true,
            running: true,
            paused_elapsed_ms: 1_000,
            start_wall_time_ms: T0,
            pause_reason: None,
        };
        let reloaded = TimeAccounting::restore(snapshot);
        assert_eq!(reloaded.phase(), TimerPhase::Running);
        assert_eq!(reloaded.elapsed_ms(T0 + 4_000), 5_000);
    }

    #[test]
    fn snapshot_round_trips_through_restore() {
        let mut clock = started_at(T0);
        clock
            .apply(TimerEvent::Pause(PauseReason::Manual), T0 + 2_500)
            .unwrap();

        let restored = TimeAccounting::restore(clock.snapshot());
        assert_eq!(restored, clock);
        assert_eq!(restored.elapsed_ms(T0 + 60_000), 2_500);
    }

    #[test]
    fn older_snapshot_without_reason_is_a_background_pause() {
        let restored = TimeAccounting::restore(TimerSnapshot {
            timer_started: true,
            running: false,
            paused_elapsed_ms: 300,
            start_wall_time_ms: 0,
            pause_reason: None,
        });
        assert_eq!(restored.phase(), TimerPhase::Paused(PauseReason::Hidden));
    }

    #[test]
    fn snapshot_serializes_with_legacy_field_names() {
        let snapshot = started_at(T0).snapshot();
        let value = serde_json::to_value(snapshot).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "timerStarted": true,
                "running": true,
                "pausedElapsedMs": 0,
                "startWallTimeMs": T0,
                "pauseReason": null
            })
        );
    }

    #[test]
    fn hidden_pauses_and_visible_resumes() {
        let mut clock = started_at(T0);
        assert_eq!(
            clock.on_host_event(HostEvent::Hidden, T0 + 1_000),
            Some(TimerPhase::Paused(PauseReason::Hidden))
        );
        assert_eq!(
            clock.on_host_event(HostEvent::Visible, T0 + 9_000),
            Some(TimerPhase::Running)
        );
        assert_eq!(clock.elapsed_ms(T0 + 10_000), 2_000);
    }

    #[test]
    fn visible_does_not_resume_a_manual_pause() {
        let mut clock = started_at(T0);
        clock
            .apply(TimerEvent::Pause(PauseReason::Manual), T0 + 1_000)
            .unwrap();
        assert_eq!(clock.on_host_event(HostEvent::Visible, T0 + 2_000), None);
        assert_eq!(clock.phase(), TimerPhase::Paused(PauseReason::Manual));
    }

    #[test]
    fn host_events_ignore_a_stopped_clock() {
        let mut clock = TimeAccounting::new();
        assert_eq!(clock.on_host_event(HostEvent::Hidden, T0), None);
        assert_eq!(clock.on_host_event(HostEvent::Unloading, T0), None);
        assert_eq!(clock.phase(), TimerPhase::Stopped);
    }

    #[test]
    fn finished_only_leaves_through_restart() {
        let mut clock = started_at(T0);
        clock
            .apply(TimerEvent::Pause(PauseReason::Finished), T0 + 4_000)
            .unwrap();

        let err = clock.apply(TimerEvent::Resume, T0 + 5_000).unwrap_err();
        assert_eq!(
            err,
            InvalidTransition {
                from: TimerPhase::Paused(PauseReason::Finished),
                event: TimerEvent::Resume,
            }
        );
        assert_eq!(clock.on_host_event(HostEvent::Visible, T0 + 5_000), None);

        assert_eq!(
            clock.apply(TimerEvent::Restart, T0 + 6_000).unwrap(),
            TimerPhase::Stopped
        );
        assert_eq!(clock.elapsed_ms(T0 + 7_000), 0);
    }

    #[test]
    fn restart_from_running_discards_time() {
        let mut clock = started_at(T0);
        clock.apply(TimerEvent::Restart, T0 + 3_000).unwrap();
        assert_eq!(clock.snapshot(), TimerSnapshot::default());
    }

    #[test]
    fn starting_twice_is_rejected() {
        let mut clock = started_at(T0);
        assert!(clock.apply(TimerEvent::Start, T0 + 1).is_err());
        assert!(TimeAccounting::new().apply(TimerEvent::Resume, T0).is_err());
    }

    #[test]
    fn background_pause_can_escalate() {
        let mut clock = started_at(T0);
        clock.on_host_event(HostEvent::Hidden, T0 + 100);
        assert_eq!(
            clock
                .apply(TimerEvent::Pause(PauseReason::Manual), T0 + 200)
                .unwrap(),
            TimerPhase::Paused(PauseReason::Manual)
        );
        assert_eq!(clock.elapsed_ms(T0 + 1_000), 100);
    }

    #[test]
    fn clock_regression_never_drops_below_accumulated_time() {
        let mut clock = started_at(T0);
        clock
            .apply(TimerEvent::Pause(PauseReason::Manual), T0 + 2_000)
            .unwrap();
        clock.apply(TimerEvent::Resume, T0 + 3_000).unwrap();
        assert_eq!(clock.elapsed_ms(T0 + 1_000), 2_000);
    }
}

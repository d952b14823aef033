//! Runtime state shared by the game sessions: wall clocks, host lifecycle and
//! the elapsed-time state machine.

pub mod clock;
pub mod host;
pub mod time_accounting;

pub use self::clock::{Clock, ManualClock, SystemClock};
pub use self::host::HostEvent;
pub use self::time_accounting::{
    InvalidTransition, PauseReason, TimeAccounting, TimerEvent, TimerPhase, TimerSnapshot,
};

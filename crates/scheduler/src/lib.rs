//! Adaptive scan scheduler
//!
//! Drives the scanner tick by tick: fast rescans while opportunities last,
//! regular cooldowns otherwise, backoff on failed scans and endpoint
//! rotation after too many of them in a row.

pub mod reporter;
pub mod scheduler;
pub mod state;

pub use reporter::Reporter;
pub use scheduler::Scheduler;
pub use state::{Phase, SchedulerState, TickOutcome, Transition};

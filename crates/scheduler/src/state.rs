//! Scheduler state machine
//!
//! Pure bookkeeping: which phase the loop is in, which endpoint is active and
//! how long to wait before the next tick. Owned by the scheduler task.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use triarb_core::ScheduleSettings;

/// Scheduler phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    Scanning,
    /// Waiting the regular interval (no opportunities, or failure backoff)
    Cooldown,
    /// Opportunities found, rescanning quickly
    FastRetry,
    Stopped,
}

/// How a tick ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Opportunities,
    Quiet,
    Failed,
}

/// What the loop should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next_delay: Duration,
    /// The active endpoint changed
    pub rotated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerState {
    pub phase: Phase,
    /// Ticks started so far; the current tick's number while scanning
    pub tick: u64,
    pub endpoint_index: usize,
    pub endpoint_count: usize,
    pub consecutive_failures: u32,
    pub quiet_ticks: u64,
    pub rotations: u64,
    pub last_scan_at: Option<DateTime<Utc>>,
}

impl SchedulerState {
    pub fn new(endpoint_count: usize) -> Self {
        Self {
            phase: Phase::Idle,
            tick: 0,
            endpoint_index: 0,
            endpoint_count: endpoint_count.max(1),
            consecutive_failures: 0,
            quiet_ticks: 0,
            rotations: 0,
            last_scan_at: None,
        }
    }

    /// Enter `Scanning`; returns the new tick number
    pub fn begin_tick(&mut self, now: DateTime<Utc>) -> u64 {
        self.tick += 1;
        self.phase = Phase::Scanning;
        self.last_scan_at = Some(now);
        self.tick
    }

    pub fn record_outcome(&mut self, outcome: TickOutcome, schedule: &ScheduleSettings) -> Transition {
        match outcome {
            TickOutcome::Opportunities => {
                self.consecutive_failures = 0;
                self.phase = Phase::FastRetry;
                Transition {
                    next_delay: schedule.quick_scan_interval,
                    rotated: false,
                }
            }
            TickOutcome::Quiet => {
                self.consecutive_failures = 0;
                self.quiet_ticks += 1;
                self.phase = Phase::Cooldown;
                Transition {
                    next_delay: schedule.scan_interval,
                    rotated: false,
                }
            }
            TickOutcome::Failed => {
                self.consecutive_failures += 1;
                self.phase = Phase::Cooldown;

                if self.consecutive_failures >= schedule.max_consecutive_failures {
                    self.rotate();
                    return Transition {
                        next_delay: schedule.scan_interval,
                        rotated: true,
                    };
                }

                Transition {
                    next_delay: backoff(schedule, self.consecutive_failures),
                    rotated: false,
                }
            }
        }
    }

    pub fn stop(&mut self) {
        self.phase = Phase::Stopped;
    }

    fn rotate(&mut self) {
        self.endpoint_index = (self.endpoint_index + 1) % self.endpoint_count;
        self.consecutive_failures = 0;
        self.rotations += 1;
    }
}

/// `scan_interval * (failures + 1)`, capped at `max_backoff_interval`
fn backoff(schedule: &ScheduleSettings, failures: u32) -> Duration {
    schedule
        .scan_interval
        .saturating_mul(failures.saturating_add(1))
        .min(schedule.max_backoff_interval)
}

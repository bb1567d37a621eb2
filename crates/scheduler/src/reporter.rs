//! Tick result sink

use triarb_core::{ScanFailure, ScanResult};

/// Receives every completed tick. Called from the scheduler task, between
/// ticks; implementations should not block for long.
pub trait Reporter: Send + Sync {
    fn report_scan(&self, result: &ScanResult);

    fn report_failure(&self, tick: u64, endpoint: &str, failure: &ScanFailure);

    fn report_rotation(&self, _from: &str, _to: &str) {}
}

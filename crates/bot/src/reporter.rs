//! Log-based tick reporter

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use triarb_core::{EvaluationResult, ScanFailure, ScanResult};
use triarb_scheduler::Reporter;

/// Reports ticks through `tracing`
#[derive(Debug, Clone, Default)]
pub struct LogReporter {
    /// Also log each reportable result as a JSON document
    json_results: bool,
}

impl LogReporter {
    pub fn new(json_results: bool) -> Self {
        Self { json_results }
    }

    fn log_json(&self, result: &EvaluationResult) {
        if !self.json_results {
            return;
        }
        match serde_json::to_string(result) {
            Ok(json) => info!(target: "triarb::report", "{}", json),
            Err(e) => warn!("Failed to serialize result for {}: {}", result.cycle, e),
        }
    }
}

impl Reporter for LogReporter {
    fn report_scan(&self, result: &ScanResult) {
        let profitable = result.profitable.len();
        for (i, opp) in result.reportable().enumerate() {
            if i < profitable {
                info!("PROFITABLE {}", describe(opp));
            } else {
                info!("Near-profitable {}", describe(opp));
            }
            for (hop_index, hop) in opp.hops.iter().enumerate() {
                debug!(
                    "  hop {}: {} {} -> {} {} @ {}",
                    hop_index,
                    human(hop.amount_in_decimal()),
                    hop.token_in.symbol,
                    human(hop.amount_out_decimal()),
                    hop.token_out.symbol,
                    human(hop.effective_price())
                );
            }
            self.log_json(opp);
        }

        let stats = &result.stats;
        debug!(
            "Tick #{} stats: {}/{} ok, liquidity={} reverted={} network={} timeout={} fallback_rates={}",
            result.tick,
            stats.succeeded,
            stats.combinations,
            stats.insufficient_liquidity,
            stats.reverted,
            stats.network_errors,
            stats.timeouts,
            stats.conversion_fallbacks
        );
    }

    fn report_failure(&self, tick: u64, endpoint: &str, failure: &ScanFailure) {
        error!("Tick #{} on {} produced no results: {}", tick, endpoint, failure);
    }

    fn report_rotation(&self, from: &str, to: &str) {
        warn!("Switched RPC endpoint {} -> {}", from, to);
    }
}

fn human(value: Option<Decimal>) -> String {
    value
        .map(|d| d.normalize().to_string())
        .unwrap_or_else(|| "?".to_string())
}

/// One-line summary of an evaluated cycle
pub fn describe(result: &EvaluationResult) -> String {
    let symbol = &result.start_token.symbol;
    let final_amount = triarb_core::to_decimal(result.final_amount, result.start_token.decimals);

    format!(
        "{}: {} {} -> {} {}, gross {} {}, net {} {} ({}%), gas {} {}{}",
        result.cycle,
        human(result.input_decimal()),
        symbol,
        human(final_amount),
        symbol,
        human(result.gross_profit_decimal()),
        symbol,
        human(result.net_profit_decimal()),
        symbol,
        result.net_profit_pct.normalize(),
        human(result.gas_cost_decimal()),
        symbol,
        if result.gas_cost.is_estimated() { " (estimated)" } else { "" }
    )
}

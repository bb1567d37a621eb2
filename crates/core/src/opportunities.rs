//! Evaluation and scan result types

use alloy_primitives::{I256, U256};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Duration;

use crate::{signed_to_decimal, to_decimal, ConfigError, ConfigResult, Quote, QuoteError, Token};

/// Where the gas-asset -> start-token rate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RateSource {
    /// Start token is the gas asset, no conversion needed
    Native,
    /// Fresh auxiliary quote this evaluation
    Quoted,
    /// Conversion failed, reused the last successful quote
    LastKnown,
    /// Conversion failed with no history, used the configured rate
    Default,
}

/// Gas cost of a cycle, in start-token raw units
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GasCost {
    pub amount: U256,
    pub gas_units: u64,
    pub gas_price_wei: U256,
    pub rate_source: RateSource,
}

impl GasCost {
    /// True when conversion fell back to a cached or configured rate
    pub fn is_estimated(&self) -> bool {
        matches!(self.rate_source, RateSource::LastKnown | RateSource::Default)
    }
}

/// Fully evaluated (cycle, amount) combination
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationResult {
    pub cycle: String,
    /// Declaration position of the cycle, used as a ranking tie-break
    pub cycle_index: usize,
    pub amount_index: usize,
    pub start_token: Token,
    pub input_amount: U256,
    pub hops: Vec<Quote>,
    pub final_amount: U256,
    pub gross_profit: I256,
    pub gas_cost: GasCost,
    /// Always `gross_profit - gas_cost.amount`
    pub net_profit: I256,
    pub net_profit_pct: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl EvaluationResult {
    pub fn hop_outputs(&self) -> Vec<U256> {
        self.hops.iter().map(|h| h.amount_out).collect()
    }

    pub fn input_decimal(&self) -> Option<Decimal> {
        to_decimal(self.input_amount, self.start_token.decimals)
    }

    pub fn gross_profit_decimal(&self) -> Option<Decimal> {
        signed_to_decimal(self.gross_profit, self.start_token.decimals)
    }

    pub fn gas_cost_decimal(&self) -> Option<Decimal> {
        to_decimal(self.gas_cost.amount, self.start_token.decimals)
    }

    pub fn net_profit_decimal(&self) -> Option<Decimal> {
        signed_to_decimal(self.net_profit, self.start_token.decimals)
    }
}

/// Reporting band by net-profit percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Band {
    Profitable,
    NearProfitable,
    Unprofitable,
}

/// Band boundaries, in percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Thresholds {
    pub min_profit_pct: Decimal,
    pub near_floor_pct: Decimal,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_profit_pct: Decimal::new(1, 1),  // 0.1%
            near_floor_pct: Decimal::new(-5, 1), // -0.5%
        }
    }
}

impl Thresholds {
    pub fn new(min_profit_pct: Decimal, near_floor_pct: Decimal) -> ConfigResult<Self> {
        if near_floor_pct > min_profit_pct {
            return Err(ConfigError::InvalidThresholds {
                floor: near_floor_pct.to_string(),
                min: min_profit_pct.to_string(),
            });
        }
        Ok(Self {
            min_profit_pct,
            near_floor_pct,
        })
    }

    /// Above the minimum is profitable; the floor itself is still near-profitable
    pub fn classify(&self, net_profit_pct: Decimal) -> Band {
        if net_profit_pct > self.min_profit_pct {
            Band::Profitable
        } else if net_profit_pct >= self.near_floor_pct {
            Band::NearProfitable
        } else {
            Band::Unprofitable
        }
    }
}

/// Per-tick counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub combinations: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub insufficient_liquidity: usize,
    pub reverted: usize,
    pub network_errors: usize,
    pub timeouts: usize,
    pub other_failures: usize,
    pub profitable: usize,
    pub near_profitable: usize,
    pub unprofitable: usize,
    pub conversion_fallbacks: usize,
    pub duration: Duration,
}

impl ScanStats {
    pub fn record_failure(&mut self, cause: Option<&QuoteError>) {
        self.failed += 1;
        match cause {
            Some(QuoteError::InsufficientLiquidity) => self.insufficient_liquidity += 1,
            Some(QuoteError::Reverted(_)) => self.reverted += 1,
            Some(QuoteError::Network(_)) => self.network_errors += 1,
            Some(QuoteError::Timeout(_)) => self.timeouts += 1,
            None => self.other_failures += 1,
        }
    }

    pub fn record_band(&mut self, band: Band) {
        match band {
            Band::Profitable => self.profitable += 1,
            Band::NearProfitable => self.near_profitable += 1,
            Band::Unprofitable => self.unprofitable += 1,
        }
    }
}

/// Output of one scan tick. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult {
    pub tick: u64,
    pub timestamp: DateTime<Utc>,
    pub endpoint: String,
    /// Ranked, best first
    pub profitable: Vec<EvaluationResult>,
    /// Ranked, best first
    pub near_profitable: Vec<EvaluationResult>,
    pub stats: ScanStats,
}

impl ScanResult {
    pub fn has_opportunities(&self) -> bool {
        !self.profitable.is_empty()
    }

    /// Top profitable result, else top near-profitable
    pub fn best(&self) -> Option<&EvaluationResult> {
        self.profitable.first().or_else(|| self.near_profitable.first())
    }

    /// Results worth reporting, profitable first
    pub fn reportable(&self) -> impl Iterator<Item = &EvaluationResult> {
        self.profitable.iter().chain(self.near_profitable.iter())
    }
}

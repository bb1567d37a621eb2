//! Gas cost pricing in start-token units
//!
//! When the start token is not the gas asset, one whole gas-asset unit is
//! quoted into the start token. Failed conversions fall back to the last
//! successful rate, then to the configured default, then to a zero cost.

use alloy_primitives::U256;
use dashmap::DashMap;
use tracing::{debug, warn};

use triarb_core::{estimate_cost_raw, pow10, GasCost, QuoteError, RateSource, Token};
use triarb_quote_source::quote_hop;

use crate::EvalContext;

/// Last successful gas-asset -> token rates, keyed by token symbol
#[derive(Debug, Default)]
pub struct ConversionRates {
    last_known: DashMap<String, U256>,
}

impl ConversionRates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_known(&self, symbol: &str) -> Option<U256> {
        self.last_known.get(symbol).map(|rate| *rate)
    }

    pub fn record(&self, symbol: &str, rate: U256) {
        self.last_known.insert(symbol.to_string(), rate);
    }
}

/// Prices the gas of one evaluation
pub struct GasPricer<'a> {
    ctx: &'a EvalContext,
}

impl<'a> GasPricer<'a> {
    pub fn new(ctx: &'a EvalContext) -> Self {
        Self { ctx }
    }

    /// Gas cost of a `hops`-hop cycle starting in `start`. Never fails.
    pub async fn cost_for(&self, start: &Token, hops: usize) -> GasCost {
        let gas = &self.ctx.gas;
        let gas_units = gas.schedule.gas_units(hops);
        let (rate, rate_source) = self.conversion_rate(start).await;

        let amount = match (rate, rate_source) {
            (None, RateSource::Native) => {
                estimate_cost_raw(gas_units, self.ctx.gas_price_wei, None, gas.gas_asset.decimals)
            }
            (Some(rate), _) => estimate_cost_raw(
                gas_units,
                self.ctx.gas_price_wei,
                Some(rate),
                gas.gas_asset.decimals,
            ),
            (None, _) => U256::ZERO,
        };

        GasCost {
            amount,
            gas_units,
            gas_price_wei: self.ctx.gas_price_wei,
            rate_source,
        }
    }

    /// Start-token raw units per one whole gas-asset unit
    async fn conversion_rate(&self, start: &Token) -> (Option<U256>, RateSource) {
        let gas = &self.ctx.gas;
        if start.address == gas.gas_asset.address {
            return (None, RateSource::Native);
        }

        let one = pow10(gas.gas_asset.decimals);
        let attempts = gas.conversion_retries.saturating_add(1);
        let mut last_error: Option<QuoteError> = None;

        for attempt in 1..=attempts {
            match quote_hop(
                self.ctx.source.as_ref(),
                one,
                gas.gas_asset.address,
                start.address,
                self.ctx.quote_timeout,
            )
            .await
            {
                Ok(rate) => {
                    self.ctx.rates.record(&start.symbol, rate);
                    return (Some(rate), RateSource::Quoted);
                }
                Err(e) => {
                    debug!(
                        "Conversion {} -> {} attempt {}/{} failed: {}",
                        gas.gas_asset.symbol, start.symbol, attempt, attempts, e
                    );
                    last_error = Some(e);
                }
            }
        }

        let reason = last_error.map(|e| e.to_string()).unwrap_or_default();

        if let Some(rate) = self.ctx.rates.last_known(&start.symbol) {
            warn!(
                "Gas conversion for {} failed ({}), using last known rate {}",
                start.symbol, reason, rate
            );
            return (Some(rate), RateSource::LastKnown);
        }

        if let Some(rate) = gas.default_rates.get(&start.symbol) {
            warn!(
                "Gas conversion for {} failed ({}), using configured default rate {}",
                start.symbol, reason, rate
            );
            return (Some(*rate), RateSource::Default);
        }

        warn!(
            "Gas conversion for {} failed ({}) with no fallback rate, gas cost treated as zero",
            start.symbol, reason
        );
        (None, RateSource::Default)
    }
}

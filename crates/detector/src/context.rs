//! Per-tick evaluation context

use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use triarb_core::GasSettings;
use triarb_quote_source::QuoteSource;

use crate::gas::ConversionRates;

const DEFAULT_QUOTE_TIMEOUT: Duration = Duration::from_secs(3);

/// Everything one tick's evaluations share. Built fresh by the scheduler
/// for every tick. No evaluation results carry over between ticks; only
/// the last-known conversion rates in `rates` do.
#[derive(Clone)]
pub struct EvalContext {
    pub tick: u64,
    pub source: Arc<dyn QuoteSource>,
    pub gas: Arc<GasSettings>,
    /// Gas price for this tick (live or static)
    pub gas_price_wei: U256,
    pub quote_timeout: Duration,
    pub timestamp: DateTime<Utc>,
    /// Last-known conversion rates, shared across ticks
    pub rates: Arc<ConversionRates>,
}

impl EvalContext {
    pub fn new(source: Arc<dyn QuoteSource>, gas: Arc<GasSettings>, rates: Arc<ConversionRates>) -> Self {
        let gas_price_wei = gas.static_gas_price_wei;
        Self {
            tick: 0,
            source,
            gas,
            gas_price_wei,
            quote_timeout: DEFAULT_QUOTE_TIMEOUT,
            timestamp: Utc::now(),
            rates,
        }
    }

    pub fn with_tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }

    pub fn with_gas_price(mut self, gas_price_wei: U256) -> Self {
        self.gas_price_wei = gas_price_wei;
        self
    }

    pub fn with_quote_timeout(mut self, quote_timeout: Duration) -> Self {
        self.quote_timeout = quote_timeout;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn endpoint(&self) -> &str {
        self.source.endpoint()
    }
}

impl std::fmt::Debug for EvalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvalContext")
            .field("tick", &self.tick)
            .field("endpoint", &self.source.endpoint())
            .field("gas_price_wei", &self.gas_price_wei)
            .field("quote_timeout", &self.quote_timeout)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

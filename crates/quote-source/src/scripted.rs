//! Deterministic in-memory quote source
//!
//! Each directed pair has a fixed rate `amount_out = amount_in * num / den`.
//! Failures can be injected per pair or for every call. A `recording()`
//! source also logs every call so tests can assert which hops were (not)
//! quoted; without it nothing accumulates, so dry runs can run indefinitely.

use alloy_primitives::{Address, U256};
use parking_lot::Mutex;
use std::collections::HashMap;

use triarb_core::{QuoteError, QuoteResult};

use crate::QuoteSource;

#[derive(Debug, Clone, Copy)]
struct Rate {
    numerator: U256,
    denominator: U256,
}

#[derive(Debug, Default)]
struct ScriptState {
    rates: HashMap<(Address, Address), Rate>,
    pair_failures: HashMap<(Address, Address), QuoteError>,
    global_failure: Option<QuoteError>,
    gas_price: Option<U256>,
    record_calls: bool,
    calls: Vec<(U256, Vec<Address>)>,
}

/// Scripted quote source for tests and dry runs
#[derive(Debug)]
pub struct ScriptedQuoteSource {
    endpoint: String,
    state: Mutex<ScriptState>,
}

impl ScriptedQuoteSource {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            state: Mutex::new(ScriptState::default()),
        }
    }

    pub fn with_rate(self, from: Address, to: Address, numerator: U256, denominator: U256) -> Self {
        self.set_rate(from, to, numerator, denominator);
        self
    }

    /// Log every `get_amounts_out` call
    pub fn recording(self) -> Self {
        self.state.lock().record_calls = true;
        self
    }

    pub fn with_gas_price(self, wei: U256) -> Self {
        self.state.lock().gas_price = Some(wei);
        self
    }

    /// Replace the rate of a directed pair
    pub fn set_rate(&self, from: Address, to: Address, numerator: U256, denominator: U256) {
        self.state.lock().rates.insert(
            (from, to),
            Rate {
                numerator,
                denominator,
            },
        );
    }

    /// Make every quote of `from -> to` fail with `error`
    pub fn fail_pair(&self, from: Address, to: Address, error: QuoteError) {
        self.state.lock().pair_failures.insert((from, to), error);
    }

    pub fn clear_pair_failure(&self, from: Address, to: Address) {
        self.state.lock().pair_failures.remove(&(from, to));
    }

    /// Fail every quote (endpoint down); `None` restores service
    pub fn fail_all(&self, error: Option<QuoteError>) {
        self.state.lock().global_failure = error;
    }

    /// Logged `get_amounts_out` calls, in arrival order. Empty unless `recording()`.
    pub fn calls(&self) -> Vec<(U256, Vec<Address>)> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Calls whose path starts with `from -> to`
    pub fn calls_for(&self, from: Address, to: Address) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|(_, path)| path.len() >= 2 && path[0] == from && path[1] == to)
            .count()
    }

}

#[async_trait::async_trait]
impl QuoteSource for ScriptedQuoteSource {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get_amounts_out(&self, amount_in: U256, path: &[Address]) -> QuoteResult<Vec<U256>> {
        let mut state = self.state.lock();
        if state.record_calls {
            state.calls.push((amount_in, path.to_vec()));
        }

        if let Some(err) = &state.global_failure {
            return Err(err.clone());
        }
        if path.len() < 2 {
            return Err(QuoteError::Reverted("INVALID_PATH".to_string()));
        }

        let mut amounts = Vec::with_capacity(path.len());
        amounts.push(amount_in);

        let mut current = amount_in;
        for pair in path.windows(2) {
            let key = (pair[0], pair[1]);
            if let Some(err) = state.pair_failures.get(&key) {
                return Err(err.clone());
            }
            let rate = state
                .rates
                .get(&key)
                .ok_or_else(|| QuoteError::Reverted(format!("no pool for {} -> {}", pair[0], pair[1])))?;
            if rate.denominator.is_zero() {
                return Err(QuoteError::InsufficientLiquidity);
            }
            current = current.saturating_mul(rate.numerator) / rate.denominator;
            amounts.push(current);
        }

        Ok(amounts)
    }

    async fn gas_price(&self) -> QuoteResult<U256> {
        let state = self.state.lock();
        if let Some(err) = &state.global_failure {
            return Err(err.clone());
        }
        state
            .gas_price
            .ok_or_else(|| QuoteError::Network("gas price not scripted".to_string()))
    }
}

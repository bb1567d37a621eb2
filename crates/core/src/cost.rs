//! Gas cost model
//!
//! Gas units are static per hop count; gas price is a live per-tick input.

use alloy_primitives::U256;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::{pow10, to_raw, AmountError};

/// Fixed overhead of an arbitrage transaction (call, transfers, checks)
pub const GAS_BASE_OVERHEAD: u64 = 60_000;

/// Marginal gas of one V2 swap
pub const GAS_PER_SWAP: u64 = 90_000;

const WEI_PER_GWEI: u64 = 1_000_000_000;

/// Human-unit cost: `gas_units * gas_price_gwei * 1e-9 * price`.
///
/// `base_asset_price_in_input_token` is how many input tokens one whole gas
/// asset buys (1 when the input token is the gas asset). Saturates at
/// `Decimal::MAX`.
pub fn estimate_cost(
    gas_units: u64,
    gas_price_gwei: Decimal,
    base_asset_price_in_input_token: Decimal,
) -> Decimal {
    Decimal::from(gas_units)
        .checked_mul(gas_price_gwei)
        .and_then(|v| v.checked_mul(base_asset_price_in_input_token))
        .and_then(|v| v.checked_div(Decimal::from(WEI_PER_GWEI)))
        .unwrap_or(Decimal::MAX)
}

/// Fixed-point cost in raw start-token units.
///
/// `rate` is start-token raw units per one whole gas-asset unit; `None`
/// means the start token is the gas asset and the cost stays in wei.
pub fn estimate_cost_raw(
    gas_units: u64,
    gas_price_wei: U256,
    rate: Option<U256>,
    gas_asset_decimals: u8,
) -> U256 {
    let native = U256::from(gas_units).saturating_mul(gas_price_wei);
    match rate {
        None => native,
        Some(rate) => native.saturating_mul(rate) / pow10(gas_asset_decimals),
    }
}

/// Gwei (possibly fractional) to wei. Sub-wei digits are dropped.
pub fn gwei_to_wei(gwei: Decimal) -> Result<U256, AmountError> {
    to_raw(gwei.round_dp_with_strategy(9, RoundingStrategy::ToZero), 9)
}

/// Gas units per hop count
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GasSchedule {
    units_per_hop_count: BTreeMap<usize, u64>,
}

impl GasSchedule {
    pub fn new(units_per_hop_count: BTreeMap<usize, u64>) -> Self {
        Self { units_per_hop_count }
    }

    pub fn gas_units(&self, hops: usize) -> u64 {
        self.units_per_hop_count
            .get(&hops)
            .copied()
            .unwrap_or(GAS_BASE_OVERHEAD + GAS_PER_SWAP * hops as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_estimate_cost_human() {
        // 300k gas at 5 gwei = 0.0015 BNB; at 600 BUSD/BNB = 0.9 BUSD
        assert_eq!(estimate_cost(300_000, dec("5"), dec("1")), dec("0.0015"));
        assert_eq!(estimate_cost(300_000, dec("5"), dec("600")), dec("0.9"));
    }

    #[test]
    fn test_estimate_cost_raw_native() {
        let wei = gwei_to_wei(dec("0.1")).unwrap();
        assert_eq!(wei, U256::from(100_000_000u64));
        let cost = estimate_cost_raw(300_000, wei, None, 18);
        assert_eq!(cost, U256::from(30_000_000_000_000u64)); // 0.00003 BNB
    }

    #[test]
    fn test_estimate_cost_raw_converted() {
        // 1 BNB = 600 USDC (6 decimals)
        let rate = U256::from(600_000_000u64);
        let wei = gwei_to_wei(dec("5")).unwrap();
        let cost = estimate_cost_raw(300_000, wei, Some(rate), 18);
        assert_eq!(cost, U256::from(900_000u64)); // 0.9 USDC
    }

    #[test]
    fn test_raw_and_human_agree() {
        let rate = U256::from(600_000_000_000_000_000_000u128); // 600 BUSD, 18 decimals
        let wei = gwei_to_wei(dec("5")).unwrap();
        let raw = estimate_cost_raw(300_000, wei, Some(rate), 18);
        let human = estimate_cost(300_000, dec("5"), dec("600"));
        assert_eq!(crate::to_decimal(raw, 18).unwrap(), human);
    }

    #[test]
    fn test_gas_schedule_fallback() {
        let mut units = BTreeMap::new();
        units.insert(3, 350_000);
        let schedule = GasSchedule::new(units);
        assert_eq!(schedule.gas_units(3), 350_000);
        assert_eq!(schedule.gas_units(4), GAS_BASE_OVERHEAD + 4 * GAS_PER_SWAP);
    }
}

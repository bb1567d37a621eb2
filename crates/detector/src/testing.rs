//! Shared test fixtures

use alloy_primitives::{Address, U256};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

use triarb_core::{pow10, Cycle, GasSchedule, GasSettings, Token, TokenRegistry};
pub use triarb_quote_source::ScriptedQuoteSource;

use crate::{ConversionRates, EvalContext};

pub fn wbnb() -> Token {
    Token::new("WBNB", Address::repeat_byte(0xbb), 18)
}

pub fn cake() -> Token {
    Token::new("CAKE", Address::repeat_byte(0x0e), 18)
}

pub fn busd() -> Token {
    Token::new("BUSD", Address::repeat_byte(0xe9), 18)
}

pub fn registry() -> TokenRegistry {
    TokenRegistry::new([wbnb(), cake(), busd()]).unwrap()
}

pub fn cycle(name: &str, symbols: &[&str]) -> Cycle {
    Cycle::new(name, symbols, None, &registry()).unwrap()
}

pub fn ranked_cycle(name: &str, symbols: &[&str], priority: u32) -> Cycle {
    Cycle::new(name, symbols, Some(priority), &registry()).unwrap()
}

/// `n` whole tokens in raw units
pub fn units(n: u64, decimals: u8) -> U256 {
    U256::from(n) * pow10(decimals)
}

pub fn tick_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

/// WBNB gas asset, default schedule, no default rates
pub fn gas_settings(gas_price_wei: U256) -> GasSettings {
    GasSettings::new(wbnb(), gas_price_wei)
}

pub fn context(source: Arc<ScriptedQuoteSource>, gas_price_wei: U256) -> EvalContext {
    context_with_gas(source, gas_settings(gas_price_wei))
}

pub fn context_with_gas(source: Arc<ScriptedQuoteSource>, gas: GasSettings) -> EvalContext {
    EvalContext::new(source, Arc::new(gas), Arc::new(ConversionRates::new()))
        .with_tick(1)
        .with_timestamp(tick_time())
}

/// 0.01 WBNB -> 3.2 CAKE -> 9.58 BUSD -> 0.00998 WBNB
pub fn scenario_a_source() -> ScriptedQuoteSource {
    ScriptedQuoteSource::new("mock")
        .recording()
        .with_rate(wbnb().address, cake().address, U256::from(320u64), U256::from(1u64))
        .with_rate(cake().address, busd().address, U256::from(299_375u64), U256::from(100_000u64))
        .with_rate(busd().address, wbnb().address, U256::from(998u64), U256::from(958_000u64))
}

/// Gas settings where a 3-hop cycle costs 0.00003 WBNB
pub fn scenario_a_gas() -> GasSettings {
    let mut units = BTreeMap::new();
    units.insert(3, 300_000);
    let mut gas = gas_settings(U256::from(100_000_000u64)); // 0.1 gwei
    gas.schedule = GasSchedule::new(units);
    gas
}

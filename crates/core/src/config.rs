//! Configuration types
//!
//! `ScannerConfig` is the raw serde shape (TOML file + `TRIARB__*` env
//! overrides). `Settings` is the validated, typed form the engine runs on.

use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::{
    gwei_to_wei, normalize_symbol, to_raw, ConfigError, ConfigResult, Cycle, GasSchedule,
    Thresholds, Token, TokenRegistry,
};

/// Token entry in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSpec {
    pub address: Address,
    pub decimals: u8,
}

/// Cycle entry in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleSpec {
    pub name: String,
    pub tokens: Vec<String>,
    #[serde(default)]
    pub priority: Option<u32>,
}

/// Raw scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    pub tokens: HashMap<String, TokenSpec>,
    pub cycles: Vec<CycleSpec>,
    /// Human amounts in each cycle's start token
    pub amounts: Vec<Decimal>,
    pub endpoints: Vec<String>,
    pub router: Address,
    pub gas_asset: String,

    #[serde(default = "default_min_profit_percentage")]
    pub min_profit_percentage: Decimal,
    #[serde(default = "default_near_profitable_floor")]
    pub near_profitable_floor: Decimal,
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,
    #[serde(default = "default_quick_scan_interval_ms")]
    pub quick_scan_interval_ms: u64,
    #[serde(default = "default_max_backoff_interval_ms")]
    pub max_backoff_interval_ms: u64,
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    /// Hop count (as string key) -> gas units
    #[serde(default)]
    pub gas_units_per_hop_count: BTreeMap<String, u64>,
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
    #[serde(default = "default_gas_price_gwei")]
    pub gas_price_gwei: Decimal,
    #[serde(default = "default_live_gas_price")]
    pub live_gas_price: bool,
    #[serde(default = "default_quote_timeout_ms")]
    pub quote_timeout_ms: u64,
    #[serde(default = "default_conversion_retries")]
    pub conversion_retries: u32,
    /// Start token -> human units per one whole gas asset
    #[serde(default)]
    pub default_conversion_rates: HashMap<String, Decimal>,
    #[serde(default)]
    pub max_ticks: Option<u64>,
}

fn default_min_profit_percentage() -> Decimal {
    Thresholds::default().min_profit_pct
}

fn default_near_profitable_floor() -> Decimal {
    Thresholds::default().near_floor_pct
}

fn default_scan_interval_ms() -> u64 {
    2_000
}

fn default_quick_scan_interval_ms() -> u64 {
    500
}

fn default_max_backoff_interval_ms() -> u64 {
    30_000
}

fn default_max_consecutive_failures() -> u32 {
    5
}

fn default_concurrency_limit() -> usize {
    4
}

fn default_gas_price_gwei() -> Decimal {
    Decimal::from(3)
}

fn default_live_gas_price() -> bool {
    true
}

fn default_quote_timeout_ms() -> u64 {
    3_000
}

fn default_conversion_retries() -> u32 {
    1
}

impl ScannerConfig {
    /// Load from a config file, overridden by `TRIARB__*` environment variables
    pub fn load(path: &str) -> ConfigResult<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("TRIARB")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("endpoints")
                    .with_list_parse_key("amounts"),
            )
            .build()?;

        Ok(cfg.try_deserialize()?)
    }

    /// Validate into typed settings. Every error here is fatal at startup.
    pub fn validate(&self) -> ConfigResult<Settings> {
        let registry = TokenRegistry::new(
            self.tokens
                .iter()
                .map(|(symbol, spec)| Token::new(symbol, spec.address, spec.decimals)),
        )?;

        if self.cycles.is_empty() {
            return Err(ConfigError::NoCycles);
        }
        let cycles = self
            .cycles
            .iter()
            .map(|c| Cycle::new(&c.name, c.tokens.as_slice(), c.priority, &registry))
            .collect::<ConfigResult<Vec<Cycle>>>()?;

        if self.amounts.is_empty() {
            return Err(ConfigError::NoAmounts);
        }
        for cycle in &cycles {
            let token = cycle.start_token();
            for amount in &self.amounts {
                let raw = to_raw(*amount, token.decimals).map_err(|reason| {
                    ConfigError::InvalidAmount {
                        amount: amount.to_string(),
                        token: token.symbol.clone(),
                        reason,
                    }
                })?;
                if raw.is_zero() {
                    return Err(ConfigError::InvalidSetting {
                        key: "amounts",
                        reason: format!("amount {} is zero", amount),
                    });
                }
            }
        }

        let thresholds = Thresholds::new(self.min_profit_percentage, self.near_profitable_floor)?;

        if self.endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }

        let schedule = ScheduleSettings {
            scan_interval: positive_ms("scan_interval_ms", self.scan_interval_ms)?,
            quick_scan_interval: positive_ms("quick_scan_interval_ms", self.quick_scan_interval_ms)?,
            max_backoff_interval: positive_ms("max_backoff_interval_ms", self.max_backoff_interval_ms)?,
            max_consecutive_failures: self.max_consecutive_failures,
            max_ticks: self.max_ticks,
        };
        if schedule.max_consecutive_failures == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "max_consecutive_failures",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.concurrency_limit == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "concurrency_limit",
                reason: "must be at least 1".to_string(),
            });
        }

        let gas = self.gas_settings(&registry)?;

        Ok(Settings {
            registry,
            cycles,
            amounts: self.amounts.clone(),
            thresholds,
            schedule,
            gas,
            concurrency_limit: self.concurrency_limit,
            quote_timeout: positive_ms("quote_timeout_ms", self.quote_timeout_ms)?,
            endpoints: self.endpoints.clone(),
            router: self.router,
        })
    }

    fn gas_settings(&self, registry: &TokenRegistry) -> ConfigResult<GasSettings> {
        let gas_asset = registry.get(&self.gas_asset)?.clone();

        let mut units = BTreeMap::new();
        for (hops, gas) in &self.gas_units_per_hop_count {
            let hops: usize = hops.trim().parse().map_err(|_| ConfigError::InvalidSetting {
                key: "gas_units_per_hop_count",
                reason: format!("hop count '{}' is not an integer", hops),
            })?;
            units.insert(hops, *gas);
        }

        let static_gas_price_wei =
            gwei_to_wei(self.gas_price_gwei).map_err(|e| ConfigError::InvalidSetting {
                key: "gas_price_gwei",
                reason: e.to_string(),
            })?;

        let mut default_rates = HashMap::new();
        for (symbol, rate) in &self.default_conversion_rates {
            let token = registry.get(symbol)?;
            let raw = to_raw(*rate, token.decimals).map_err(|reason| ConfigError::InvalidAmount {
                amount: rate.to_string(),
                token: token.symbol.clone(),
                reason,
            })?;
            default_rates.insert(normalize_symbol(symbol), raw);
        }

        Ok(GasSettings {
            gas_asset,
            schedule: GasSchedule::new(units),
            static_gas_price_wei,
            live_gas_price: self.live_gas_price,
            conversion_retries: self.conversion_retries,
            default_rates,
        })
    }
}

fn positive_ms(key: &'static str, ms: u64) -> ConfigResult<Duration> {
    if ms == 0 {
        return Err(ConfigError::InvalidSetting {
            key,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_millis(ms))
}

/// Scheduler timing
#[derive(Debug, Clone)]
pub struct ScheduleSettings {
    pub scan_interval: Duration,
    pub quick_scan_interval: Duration,
    pub max_backoff_interval: Duration,
    pub max_consecutive_failures: u32,
    pub max_ticks: Option<u64>,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_millis(default_scan_interval_ms()),
            quick_scan_interval: Duration::from_millis(default_quick_scan_interval_ms()),
            max_backoff_interval: Duration::from_millis(default_max_backoff_interval_ms()),
            max_consecutive_failures: default_max_consecutive_failures(),
            max_ticks: None,
        }
    }
}

/// Gas pricing inputs
#[derive(Debug, Clone)]
pub struct GasSettings {
    pub gas_asset: Token,
    pub schedule: GasSchedule,
    pub static_gas_price_wei: U256,
    pub live_gas_price: bool,
    pub conversion_retries: u32,
    /// Start token symbol -> raw start-token units per whole gas asset
    pub default_rates: HashMap<String, U256>,
}

impl GasSettings {
    /// Settings for a chain whose gas asset is `gas_asset`, with defaults elsewhere
    pub fn new(gas_asset: Token, static_gas_price_wei: U256) -> Self {
        Self {
            gas_asset,
            schedule: GasSchedule::default(),
            static_gas_price_wei,
            live_gas_price: false,
            conversion_retries: default_conversion_retries(),
            default_rates: HashMap::new(),
        }
    }
}

/// Validated configuration
#[derive(Debug, Clone)]
pub struct Settings {
    pub registry: TokenRegistry,
    pub cycles: Vec<Cycle>,
    pub amounts: Vec<Decimal>,
    pub thresholds: Thresholds,
    pub schedule: ScheduleSettings,
    pub gas: GasSettings,
    pub concurrency_limit: usize,
    pub quote_timeout: Duration,
    pub endpoints: Vec<String>,
    pub router: Address,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const SAMPLE: &str = r#"
        endpoints = ["https://bsc-dataseed.binance.org", "https://bsc-dataseed1.defibit.io"]
        router = "0x10ED43C718714eb63d5aA57B78B54704E256024E"
        gas_asset = "WBNB"
        amounts = ["0.01", "0.1", "1"]
        min_profit_percentage = "0.15"

        [gas_units_per_hop_count]
        "3" = 350000

        [default_conversion_rates]
        BUSD = "600"

        [tokens.WBNB]
        address = "0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"
        decimals = 18

        [tokens.CAKE]
        address = "0x0E09FaBB73Bd3Ade0a17ECC321fD13a19e81cE82"
        decimals = 18

        [tokens.BUSD]
        address = "0xe9e7CEA3DedcA5984780Bafc599bD69ADd087D56"
        decimals = 18

        [[cycles]]
        name = "wbnb-cake-busd"
        tokens = ["WBNB", "CAKE", "BUSD", "WBNB"]
        priority = 1

        [[cycles]]
        name = "busd-wbnb-cake"
        tokens = ["BUSD", "WBNB", "CAKE", "BUSD"]
    "#;

    fn parse(toml: &str) -> ScannerConfig {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_sample_config_validates() {
        let settings = parse(SAMPLE).validate().unwrap();

        assert_eq!(settings.cycles.len(), 2);
        assert_eq!(settings.cycles[0].name(), "wbnb-cake-busd");
        assert_eq!(settings.amounts.len(), 3);
        assert_eq!(settings.thresholds.min_profit_pct, Decimal::from_str("0.15").unwrap());
        assert_eq!(settings.thresholds.near_floor_pct, Decimal::from_str("-0.5").unwrap());
        assert_eq!(settings.schedule.scan_interval, Duration::from_millis(2_000));
        assert_eq!(settings.schedule.quick_scan_interval, Duration::from_millis(500));
        assert_eq!(settings.schedule.max_consecutive_failures, 5);
        assert_eq!(settings.concurrency_limit, 4);
        assert_eq!(settings.gas.gas_asset.symbol, "WBNB");
        assert_eq!(settings.gas.schedule.gas_units(3), 350_000);
        assert_eq!(settings.gas.static_gas_price_wei, U256::from(3_000_000_000u64));
        assert_eq!(
            settings.gas.default_rates.get("BUSD"),
            Some(&U256::from(600_000_000_000_000_000_000u128))
        );
    }

    #[test]
    fn test_unknown_cycle_token_is_fatal() {
        let toml = SAMPLE.replace(r#"["BUSD", "WBNB", "CAKE", "BUSD"]"#, r#"["BUSD", "ETH", "CAKE", "BUSD"]"#);
        let err = parse(&toml).validate().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownToken(s) if s == "ETH"));
    }

    #[test]
    fn test_open_cycle_is_fatal() {
        let toml = SAMPLE.replace(r#"["BUSD", "WBNB", "CAKE", "BUSD"]"#, r#"["BUSD", "WBNB", "CAKE"]"#);
        let err = parse(&toml).validate().unwrap_err();
        assert!(matches!(err, ConfigError::CycleNotClosed { .. }));
    }

    #[test]
    fn test_inverted_thresholds_are_fatal() {
        let toml = SAMPLE.replace(r#"min_profit_percentage = "0.15""#, r#"min_profit_percentage = "-0.9""#);
        let err = parse(&toml).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidThresholds { .. }));
    }

    #[test]
    fn test_zero_concurrency_is_fatal() {
        let toml = format!("concurrency_limit = 0\n{}", SAMPLE);
        let err = parse(&toml).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { key: "concurrency_limit", .. }));
    }
}

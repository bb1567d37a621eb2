//! Token definitions and the ticker lookup table
//!
//! CRITICAL: Always use correct decimals!
//! - USDC/USDT on Ethereum: 6 decimals (NOT 18!)
//! - USDC/USDT/BUSD on BSC: 18 decimals
//! - WBTC: 8 decimals

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{ConfigError, ConfigResult, MAX_DECIMAL_SCALE};

/// Token information
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
}

impl Token {
    pub fn new(symbol: &str, address: Address, decimals: u8) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            address,
            decimals,
        }
    }
}

/// Tickers are matched case-insensitively
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Read-only ticker -> token table, built once at startup
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    tokens: HashMap<String, Token>,
}

impl TokenRegistry {
    pub fn new(tokens: impl IntoIterator<Item = Token>) -> ConfigResult<Self> {
        let mut map = HashMap::new();
        for token in tokens {
            if token.decimals > MAX_DECIMAL_SCALE {
                return Err(ConfigError::InvalidSetting {
                    key: "tokens",
                    reason: format!(
                        "{} has {} decimals, at most {} supported",
                        token.symbol, token.decimals, MAX_DECIMAL_SCALE
                    ),
                });
            }
            if map.insert(token.symbol.clone(), token.clone()).is_some() {
                return Err(ConfigError::InvalidSetting {
                    key: "tokens",
                    reason: format!("{} declared twice", token.symbol),
                });
            }
        }
        Ok(Self { tokens: map })
    }

    /// Get token by ticker
    pub fn get(&self, symbol: &str) -> ConfigResult<&Token> {
        self.tokens
            .get(&normalize_symbol(symbol))
            .ok_or_else(|| ConfigError::UnknownToken(symbol.to_string()))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

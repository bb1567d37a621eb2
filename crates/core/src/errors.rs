//! Error types

use std::time::Duration;

use thiserror::Error;

/// Failure of a single Quote Source call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    #[error("Insufficient liquidity")]
    InsufficientLiquidity,

    #[error("Call reverted: {0}")]
    Reverted(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Quote timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure of one (cycle, amount) evaluation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("{cycle}: hop {hop_index} failed: {cause}")]
    HopQuote {
        cycle: String,
        hop_index: usize,
        cause: QuoteError,
    },

    #[error("{cycle}: input amount is zero")]
    ZeroInput { cycle: String },

    #[error("{cycle}: invalid input amount: {reason}")]
    InvalidAmount { cycle: String, reason: AmountError },

    #[error("{cycle}: profit percentage out of representable range")]
    Overflow { cycle: String },
}

impl EvalError {
    /// Underlying quote failure, if the evaluation died on a hop
    pub fn cause(&self) -> Option<&QuoteError> {
        match self {
            EvalError::HopQuote { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

/// Every combination of a tick failed; the endpoint is probably down
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("All {attempted} combinations failed (last error: {last_error})")]
pub struct ScanFailure {
    pub attempted: usize,
    pub last_error: String,
}

/// Rejected human amount
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is negative")]
    Negative,

    #[error("amount has {scale} fractional digits but token supports {decimals}")]
    TooPrecise { scale: u32, decimals: u8 },

    #[error("amount overflows 256 bits")]
    Overflow,
}

/// Startup configuration errors. Never recovered at runtime.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Token not found: {0}")]
    UnknownToken(String),

    #[error("Cycle {name} has {len} tokens, need at least 3")]
    CycleTooShort { name: String, len: usize },

    #[error("Cycle {name} does not return to its start token")]
    CycleNotClosed { name: String },

    #[error("Cycle {name} swaps {symbol} into itself")]
    DegenerateHop { name: String, symbol: String },

    #[error("No cycles configured")]
    NoCycles,

    #[error("No input amounts configured")]
    NoAmounts,

    #[error("No RPC endpoints configured")]
    NoEndpoints,

    #[error("Invalid amount {amount} for {token}: {reason}")]
    InvalidAmount {
        amount: String,
        token: String,
        reason: AmountError,
    },

    #[error("Invalid thresholds: floor {floor}% must not exceed minimum profit {min}%")]
    InvalidThresholds { floor: String, min: String },

    #[error("Invalid setting {key}: {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Result type alias
pub type QuoteResult<T> = Result<T, QuoteError>;
pub type EvalResult<T> = Result<T, EvalError>;
pub type ConfigResult<T> = Result<T, ConfigError>;

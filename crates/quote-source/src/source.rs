//! Quote source abstraction

use alloy_primitives::{Address, U256};
use std::future::Future;
use std::time::Duration;

use triarb_core::{QuoteError, QuoteResult};

/// Read-only price oracle, in practice an AMM router's view functions.
///
/// Shared across concurrent evaluations within a tick; implementations must
/// not require mutable access.
#[async_trait::async_trait]
pub trait QuoteSource: Send + Sync {
    /// Endpoint identifier, for logs and reports
    fn endpoint(&self) -> &str;

    /// Amounts along `path`, starting with `amount_in`
    async fn get_amounts_out(&self, amount_in: U256, path: &[Address]) -> QuoteResult<Vec<U256>>;

    /// Current gas price in wei
    async fn gas_price(&self) -> QuoteResult<U256>;
}

/// Bound a quote call; an elapsed deadline becomes `QuoteError::Timeout`
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> QuoteResult<T>
where
    F: Future<Output = QuoteResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(QuoteError::Timeout(limit)),
    }
}

/// Single-hop quote: output of swapping `amount_in` of `token_in` into `token_out`.
///
/// A zero output is treated as missing liquidity.
pub async fn quote_hop(
    source: &dyn QuoteSource,
    amount_in: U256,
    token_in: Address,
    token_out: Address,
    limit: Duration,
) -> QuoteResult<U256> {
    let path = [token_in, token_out];
    let amounts = with_timeout(limit, source.get_amounts_out(amount_in, &path)).await?;

    match amounts.get(1) {
        Some(out) if out.is_zero() => Err(QuoteError::InsufficientLiquidity),
        Some(out) => Ok(*out),
        None => Err(QuoteError::Reverted(format!(
            "router returned {} amounts for a 2-token path",
            amounts.len()
        ))),
    }
}

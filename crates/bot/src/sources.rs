//! Quote source construction from settings

use alloy_primitives::U256;
use std::sync::Arc;
use tracing::info;

use triarb_core::{pow10, QuoteError, Settings, Token};
use triarb_quote_source::{QuoteSource, RpcQuoteSource, ScriptedQuoteSource};

/// Per-hop gain of the simulated market, in basis points
const DRY_RUN_HOP_GAIN_BPS: u64 = 10;

/// One RPC source per configured endpoint, sharing a connection pool
pub fn rpc_sources(settings: &Settings) -> Result<Vec<Arc<dyn QuoteSource>>, QuoteError> {
    let client = reqwest::Client::builder()
        .timeout(settings.quote_timeout)
        .build()
        .map_err(|e| QuoteError::Network(format!("failed to build HTTP client: {}", e)))?;

    Ok(settings
        .endpoints
        .iter()
        .map(|endpoint| {
            Arc::new(RpcQuoteSource::with_client(
                client.clone(),
                endpoint,
                settings.router,
                settings.quote_timeout,
            )) as Arc<dyn QuoteSource>
        })
        .collect())
}

/// Simulated market: every token is valued at its default conversion rate
/// against the gas asset (par when unset) and every configured hop trades at
/// that value plus a small gain, so gas conversion and hops agree.
pub fn dry_run_source(settings: &Settings) -> Arc<dyn QuoteSource> {
    Arc::new(dry_run_market(settings))
}

fn dry_run_market(settings: &Settings) -> ScriptedQuoteSource {
    let gas_asset = &settings.gas.gas_asset;
    let mut source = ScriptedQuoteSource::new("dry-run").with_gas_price(settings.gas.static_gas_price_wei);

    for cycle in &settings.cycles {
        let start = cycle.start_token();
        if start.address != gas_asset.address {
            source = source.with_rate(
                gas_asset.address,
                start.address,
                units_per_gas_asset(settings, start),
                pow10(gas_asset.decimals),
            );
        }
    }

    for cycle in &settings.cycles {
        for (token_in, token_out) in cycle.hops() {
            let (numerator, denominator) = value_with_gain(
                units_per_gas_asset(settings, token_in),
                units_per_gas_asset(settings, token_out),
            );
            source = source.with_rate(token_in.address, token_out.address, numerator, denominator);
        }
    }

    info!("Dry-run market built for {} cycles", settings.cycles.len());
    source
}

/// Raw units of `token` worth one whole gas asset
fn units_per_gas_asset(settings: &Settings, token: &Token) -> U256 {
    let gas_asset = &settings.gas.gas_asset;
    if token.address == gas_asset.address {
        return pow10(gas_asset.decimals);
    }
    settings
        .gas
        .default_rates
        .get(&token.symbol)
        .copied()
        .unwrap_or_else(|| pow10(token.decimals))
}

fn value_with_gain(in_per_gas: U256, out_per_gas: U256) -> (U256, U256) {
    let numerator = out_per_gas * U256::from(10_000 + DRY_RUN_HOP_GAIN_BPS);
    let denominator = in_per_gas * U256::from(10_000u64);
    (numerator, denominator)
}

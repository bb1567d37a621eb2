//! JSON-RPC quote source backed by a UniswapV2-style router
//!
//! Quotes are `eth_call`s of `getAmountsOut(uint256,address[])` against the
//! router; gas price comes from `eth_gasPrice`.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, Revert, SolCall, SolError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use triarb_core::{QuoteError, QuoteResult};

use crate::QuoteSource;

sol! {
    function getAmountsOut(uint256 amountIn, address[] memory path) external view returns (uint256[] memory amounts);
}

/// Revert reasons that mean the pool cannot fill the swap
const LIQUIDITY_MARKERS: &[&str] = &[
    "insufficient_liquidity",
    "insufficient liquidity",
    "insufficient_input_amount",
    "insufficient_output_amount",
    "invalid_path",
];

/// JSON-RPC error code for execution reverts (geth, erigon, bsc)
const EXECUTION_REVERTED_CODE: i64 = 3;

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Clone, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Router quote source over HTTP JSON-RPC
pub struct RpcQuoteSource {
    client: reqwest::Client,
    endpoint: String,
    router: Address,
    request_timeout: Duration,
    next_id: AtomicU64,
}

impl RpcQuoteSource {
    pub fn new(endpoint: &str, router: Address, request_timeout: Duration) -> QuoteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| QuoteError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, endpoint, router, request_timeout))
    }

    /// Share one connection pool between endpoints
    pub fn with_client(
        client: reqwest::Client,
        endpoint: &str,
        router: Address,
        request_timeout: Duration,
    ) -> Self {
        info!("RpcQuoteSource initialized: endpoint={}, router={}", endpoint, router);

        Self {
            client,
            endpoint: endpoint.to_string(),
            router,
            request_timeout,
            next_id: AtomicU64::new(1),
        }
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> QuoteResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(QuoteError::Network(format!(
                "{} returned HTTP {}",
                self.endpoint,
                response.status()
            )));
        }

        let response: RpcResponse<T> = response.json().await.map_err(|e| self.transport_error(e))?;

        match (response.result, response.error) {
            (_, Some(err)) => {
                debug!("{} {} failed: {} ({})", self.endpoint, method, err.message, err.code);
                Err(classify_rpc_error(&err))
            }
            (Some(result), None) => Ok(result),
            (None, None) => Err(QuoteError::Network(format!(
                "{} returned neither result nor error for {}",
                self.endpoint, method
            ))),
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> QuoteError {
        if e.is_timeout() {
            QuoteError::Timeout(self.request_timeout)
        } else {
            QuoteError::Network(e.to_string())
        }
    }
}

#[async_trait::async_trait]
impl QuoteSource for RpcQuoteSource {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get_amounts_out(&self, amount_in: U256, path: &[Address]) -> QuoteResult<Vec<U256>> {
        let call = getAmountsOutCall {
            amountIn: amount_in,
            path: path.to_vec(),
        };
        let data = Bytes::from(call.abi_encode());

        let params = serde_json::json!([
            { "to": self.router, "data": data },
            "latest",
        ]);

        let output: Bytes = self.request("eth_call", params).await?;
        decode_amounts(&output)
    }

    async fn gas_price(&self) -> QuoteResult<U256> {
        self.request("eth_gasPrice", serde_json::json!([])).await
    }
}

fn decode_amounts(output: &[u8]) -> QuoteResult<Vec<U256>> {
    if output.is_empty() {
        // eth_call against a non-contract or a silent revert
        return Err(QuoteError::Reverted("empty return data".to_string()));
    }
    getAmountsOutCall::abi_decode_returns(output, true)
        .map(|ret| ret.amounts)
        .map_err(|e| QuoteError::Reverted(format!("undecodable return data: {}", e)))
}

/// Map a JSON-RPC error onto the quote error taxonomy
fn classify_rpc_error(err: &RpcError) -> QuoteError {
    let reason = revert_reason(err).unwrap_or_else(|| err.message.clone());
    let lowered = reason.to_lowercase();

    if LIQUIDITY_MARKERS.iter().any(|m| lowered.contains(m)) {
        return QuoteError::InsufficientLiquidity;
    }
    if err.code == EXECUTION_REVERTED_CODE || lowered.contains("revert") {
        return QuoteError::Reverted(reason);
    }
    QuoteError::Network(format!("{} (code {})", err.message, err.code))
}

/// Decode an `Error(string)` payload from the error's data field, if present
fn revert_reason(err: &RpcError) -> Option<String> {
    let data = err.data.as_ref()?.as_str()?;
    let bytes: Bytes = data.parse().ok()?;
    Revert::abi_decode(&bytes, true).ok().map(|r| r.reason)
}

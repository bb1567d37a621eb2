//! Opportunity scanner
//!
//! Evaluates every (cycle, amount) combination of one tick with bounded
//! concurrency, then classifies and ranks the survivors.

use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use std::time::Instant;
use tracing::{debug, info};

use triarb_core::{
    to_raw, Band, Cycle, EvalError, EvalResult, EvaluationResult, ScanFailure, ScanResult,
    ScanStats, Settings, Thresholds,
};

use crate::{rank_results, EvalContext, Evaluator};

/// Default number of in-flight evaluations per tick
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 4;

/// Opportunity scanner
#[derive(Debug, Clone)]
pub struct Scanner {
    thresholds: Thresholds,
    concurrency_limit: usize,
}

impl Default for Scanner {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
        }
    }
}

impl Scanner {
    pub fn new(thresholds: Thresholds, concurrency_limit: usize) -> Self {
        Self {
            thresholds,
            concurrency_limit: concurrency_limit.max(1),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.thresholds, settings.concurrency_limit)
    }

    /// Scan every combination of `cycles` x `amounts`.
    ///
    /// `amounts` are human units of each cycle's start token. Individual
    /// failures are counted and skipped; only a tick where every combination
    /// failed is an error.
    pub async fn scan(
        &self,
        cycles: &[Cycle],
        amounts: &[Decimal],
        ctx: &EvalContext,
    ) -> Result<ScanResult, ScanFailure> {
        let start = Instant::now();

        let mut order: Vec<usize> = (0..cycles.len()).collect();
        order.sort_by_key(|&i| (cycles[i].priority().unwrap_or(u32::MAX), i));

        let jobs = order.into_iter().flat_map(|cycle_index| {
            amounts
                .iter()
                .enumerate()
                .map(move |(amount_index, amount)| (cycle_index, amount_index, *amount))
        });

        let mut outcomes: Vec<(usize, usize, EvalResult<EvaluationResult>)> = stream::iter(jobs)
            .map(move |(cycle_index, amount_index, amount)| async move {
                let cycle = &cycles[cycle_index];
                let outcome = match to_raw(amount, cycle.start_token().decimals) {
                    Ok(input) => Evaluator::evaluate(cycle, cycle_index, amount_index, input, ctx).await,
                    Err(reason) => Err(EvalError::InvalidAmount {
                        cycle: cycle.name().to_string(),
                        reason,
                    }),
                };
                (cycle_index, amount_index, outcome)
            })
            .buffer_unordered(self.concurrency_limit)
            .collect()
            .await;

        // completion order is arbitrary
        outcomes.sort_by_key(|(cycle_index, amount_index, _)| (*cycle_index, *amount_index));

        let mut stats = ScanStats {
            combinations: outcomes.len(),
            ..Default::default()
        };
        let mut profitable = Vec::new();
        let mut near_profitable = Vec::new();
        let mut last_error: Option<EvalError> = None;

        for (_, _, outcome) in outcomes {
            match outcome {
                Ok(result) => {
                    stats.succeeded += 1;
                    if result.gas_cost.is_estimated() {
                        stats.conversion_fallbacks += 1;
                    }
                    let band = self.thresholds.classify(result.net_profit_pct);
                    stats.record_band(band);
                    match band {
                        Band::Profitable => profitable.push(result),
                        Band::NearProfitable => near_profitable.push(result),
                        Band::Unprofitable => {}
                    }
                }
                Err(err) => {
                    debug!("Evaluation failed on {}: {}", ctx.endpoint(), err);
                    stats.record_failure(err.cause());
                    last_error = Some(err);
                }
            }
        }

        stats.duration = start.elapsed();

        if stats.combinations > 0 && stats.succeeded == 0 {
            return Err(ScanFailure {
                attempted: stats.combinations,
                last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
            });
        }

        rank_results(&mut profitable);
        rank_results(&mut near_profitable);

        info!(
            "Scan #{} on {}: {} profitable, {} near-profitable, {}/{} failed in {:?}",
            ctx.tick,
            ctx.endpoint(),
            profitable.len(),
            near_profitable.len(),
            stats.failed,
            stats.combinations,
            stats.duration
        );

        Ok(ScanResult {
            tick: ctx.tick,
            timestamp: ctx.timestamp,
            endpoint: ctx.endpoint().to_string(),
            profitable,
            near_profitable,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use alloy_primitives::U256;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use triarb_core::QuoteError;
    use triarb_quote_source::QuoteSource;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn one() -> U256 {
        U256::from(1u64)
    }

    /// WBNB -> CAKE -> BUSD -> WBNB returns `gain_permille` / 1000 of the input;
    /// BUSD -> CAKE -> WBNB -> BUSD returns 1.5%
    fn two_cycle_source(gain_permille: u64) -> ScriptedQuoteSource {
        ScriptedQuoteSource::new("mock")
            .recording()
            .with_rate(wbnb().address, cake().address, U256::from(gain_permille), U256::from(1_000u64))
            .with_rate(cake().address, busd().address, one(), one())
            .with_rate(busd().address, wbnb().address, one(), one())
            .with_rate(busd().address, cake().address, U256::from(1_015u64), U256::from(1_000u64))
            .with_rate(cake().address, wbnb().address, one(), one())
            .with_rate(wbnb().address, busd().address, one(), one())
    }

    fn cycles() -> Vec<Cycle> {
        vec![
            cycle("wbnb-cake-busd", &["WBNB", "CAKE", "BUSD", "WBNB"]),
            cycle("busd-cake-wbnb", &["BUSD", "CAKE", "WBNB", "BUSD"]),
        ]
    }

    fn free_gas() -> triarb_core::GasSettings {
        gas_settings(U256::ZERO)
    }

    #[tokio::test]
    async fn test_scan_ranks_survivors_and_skips_failures() {
        // 2 cycles x 3 amounts; the smallest amount fails on both cycles
        let source = Arc::new(two_cycle_source(1_010));
        let ctx = context_with_gas(source.clone(), free_gas());
        let failing = Arc::new(FailSmallInputs {
            inner: source,
            min_input: units(1, 17),
        });
        let ctx = EvalContext { source: failing, ..ctx };

        let amounts = [dec("0.01"), dec("0.1"), dec("1")];
        let result = Scanner::default().scan(&cycles(), &amounts, &ctx).await.unwrap();

        assert_eq!(result.stats.combinations, 6);
        assert_eq!(result.stats.succeeded, 4);
        assert_eq!(result.stats.failed, 2);
        assert_eq!(result.stats.insufficient_liquidity, 2);
        assert_eq!(result.profitable.len(), 4);
        assert!(result.near_profitable.is_empty());

        let order: Vec<(usize, usize)> = result
            .profitable
            .iter()
            .map(|r| (r.cycle_index, r.amount_index))
            .collect();
        // 1.5% beats 1.0%; equal percentages rank the larger profit first
        assert_eq!(order, vec![(1, 2), (1, 1), (0, 2), (0, 1)]);
        assert_eq!(result.profitable[0].net_profit_pct, dec("1.5"));
        assert_eq!(result.tick, 1);
        assert_eq!(result.timestamp, tick_time());
        assert_eq!(result.endpoint, "mock");
    }

    #[tokio::test]
    async fn test_failed_hop_excludes_only_that_combination() {
        let source = Arc::new(two_cycle_source(1_010));
        source.fail_pair(cake().address, busd().address, QuoteError::InsufficientLiquidity);
        let ctx = context_with_gas(source, free_gas());

        let result = Scanner::default()
            .scan(&cycles(), &[dec("1")], &ctx)
            .await
            .unwrap();

        assert_eq!(result.stats.failed, 1);
        assert_eq!(result.profitable.len(), 1);
        assert_eq!(result.profitable[0].cycle, "busd-cake-wbnb");
    }

    #[tokio::test]
    async fn test_classification_bands() {
        // 0.05% sits between floor and minimum; -1% is below the floor
        let source = Arc::new(
            ScriptedQuoteSource::new("mock")
                .with_rate(wbnb().address, cake().address, U256::from(10_005u64), U256::from(10_000u64))
                .with_rate(cake().address, busd().address, one(), one())
                .with_rate(busd().address, wbnb().address, one(), one())
                .with_rate(busd().address, cake().address, U256::from(99u64), U256::from(100u64))
                .with_rate(cake().address, wbnb().address, one(), one())
                .with_rate(wbnb().address, busd().address, one(), one()),
        );
        let ctx = context_with_gas(source, free_gas());

        let result = Scanner::default()
            .scan(&cycles(), &[dec("1")], &ctx)
            .await
            .unwrap();

        assert!(result.profitable.is_empty());
        assert_eq!(result.near_profitable.len(), 1);
        assert_eq!(result.near_profitable[0].net_profit_pct, dec("0.05"));
        assert_eq!(result.stats.unprofitable, 1);
        assert!(!result.has_opportunities());
        assert_eq!(result.best().map(|r| r.cycle.as_str()), Some("wbnb-cake-busd"));
    }

    #[tokio::test]
    async fn test_all_failed_is_scan_failure() {
        let source = Arc::new(two_cycle_source(1_010));
        source.fail_all(Some(QuoteError::Network("connection refused".into())));
        let ctx = context_with_gas(source, free_gas());

        let err = Scanner::default()
            .scan(&cycles(), &[dec("0.1"), dec("1")], &ctx)
            .await
            .unwrap_err();

        assert_eq!(err.attempted, 4);
        assert!(err.last_error.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_priority_cycles_dispatched_first() {
        let source = Arc::new(two_cycle_source(1_010));
        let ctx = context_with_gas(source.clone(), free_gas());
        let cycles = vec![
            cycle("wbnb-cake-busd", &["WBNB", "CAKE", "BUSD", "WBNB"]),
            ranked_cycle("busd-cake-wbnb", &["BUSD", "CAKE", "WBNB", "BUSD"], 1),
        ];

        Scanner::new(Thresholds::default(), 1)
            .scan(&cycles, &[dec("1")], &ctx)
            .await
            .unwrap();

        let calls = source.calls();
        assert_eq!(calls[0].1, vec![busd().address, cake().address]);
    }

    #[tokio::test]
    async fn test_rescan_is_identical() {
        let source = Arc::new(two_cycle_source(1_010));
        let ctx = context_with_gas(source, free_gas());
        let scanner = Scanner::default();
        let amounts = [dec("0.1"), dec("1")];

        let first = scanner.scan(&cycles(), &amounts, &ctx).await.unwrap();
        let second = scanner.scan(&cycles(), &amounts, &ctx).await.unwrap();

        assert_eq!(first.profitable, second.profitable);
        assert_eq!(first.near_profitable, second.near_profitable);
    }

    #[tokio::test]
    async fn test_empty_scan_is_not_a_failure() {
        let source = Arc::new(two_cycle_source(1_010));
        let ctx = context_with_gas(source, free_gas());

        let result = Scanner::default().scan(&[], &[dec("1")], &ctx).await.unwrap();

        assert_eq!(result.stats.combinations, 0);
        assert!(result.best().is_none());
    }

    #[tokio::test]
    async fn test_in_flight_evaluations_stay_within_limit() {
        let source = Arc::new(two_cycle_source(1_010));
        let ctx = context_with_gas(source.clone(), free_gas());
        let tracked = Arc::new(TrackInFlight::new(source));
        let ctx = EvalContext { source: tracked.clone(), ..ctx };
        let cycles = vec![
            cycle("wbnb-cake-busd", &["WBNB", "CAKE", "BUSD", "WBNB"]),
            cycle("busd-cake-wbnb", &["BUSD", "CAKE", "WBNB", "BUSD"]),
            cycle("cake-busd-wbnb", &["CAKE", "BUSD", "WBNB", "CAKE"]),
            cycle("cake-wbnb-busd", &["CAKE", "WBNB", "BUSD", "CAKE"]),
        ];
        let amounts = [dec("0.1"), dec("0.2"), dec("0.5"), dec("1"), dec("2")];

        let result = Scanner::new(Thresholds::default(), 3)
            .scan(&cycles, &amounts, &ctx)
            .await
            .unwrap();

        assert_eq!(result.stats.combinations, 20);
        assert_eq!(result.stats.failed, 0);
        let peak = tracked.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak in-flight {} exceeds limit", peak);
        assert!(peak > 1, "evaluations never overlapped");
    }

    /// Fails any quote below `min_input` with insufficient liquidity
    struct FailSmallInputs {
        inner: Arc<ScriptedQuoteSource>,
        min_input: U256,
    }

    #[async_trait::async_trait]
    impl QuoteSource for FailSmallInputs {
        fn endpoint(&self) -> &str {
            self.inner.endpoint()
        }

        async fn get_amounts_out(
            &self,
            amount_in: U256,
            path: &[alloy_primitives::Address],
        ) -> triarb_core::QuoteResult<Vec<U256>> {
            if amount_in < self.min_input {
                return Err(QuoteError::InsufficientLiquidity);
            }
            self.inner.get_amounts_out(amount_in, path).await
        }

        async fn gas_price(&self) -> triarb_core::QuoteResult<U256> {
            self.inner.gas_price().await
        }
    }

    /// Records the highest number of concurrent quote calls
    struct TrackInFlight {
        inner: Arc<ScriptedQuoteSource>,
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    impl TrackInFlight {
        fn new(inner: Arc<ScriptedQuoteSource>) -> Self {
            Self {
                inner,
                current: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl QuoteSource for TrackInFlight {
        fn endpoint(&self) -> &str {
            self.inner.endpoint()
        }

        async fn get_amounts_out(
            &self,
            amount_in: U256,
            path: &[alloy_primitives::Address],
        ) -> triarb_core::QuoteResult<Vec<U256>> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            self.inner.get_amounts_out(amount_in, path).await
        }

        async fn gas_price(&self) -> triarb_core::QuoteResult<U256> {
            self.inner.gas_price().await
        }
    }
}

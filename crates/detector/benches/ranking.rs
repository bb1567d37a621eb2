use alloy_primitives::{Address, I256, U256};
use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rust_decimal::Decimal;

use triarb_core::{EvaluationResult, GasCost, RateSource, Token};
use triarb_detector::rank_results;

fn results(n: usize) -> Vec<EvaluationResult> {
    let token = Token::new("WBNB", Address::repeat_byte(0xbb), 18);
    let timestamp = Utc::now();

    (0..n)
        .map(|i| {
            // scrambled but deterministic percentages with frequent ties
            let bps = ((i * 7_919) % 401) as i64 - 200;
            let net = I256::try_from(bps * 1_000).unwrap_or(I256::ZERO);
            EvaluationResult {
                cycle: format!("cycle-{}", i / 8),
                cycle_index: i / 8,
                amount_index: i % 8,
                start_token: token.clone(),
                input_amount: U256::from(1_000_000u64),
                hops: Vec::new(),
                final_amount: U256::from(1_000_000u64),
                gross_profit: net,
                gas_cost: GasCost {
                    amount: U256::ZERO,
                    gas_units: 330_000,
                    gas_price_wei: U256::from(3_000_000_000u64),
                    rate_source: RateSource::Native,
                },
                net_profit: net,
                net_profit_pct: Decimal::new(bps, 2),
                timestamp,
            }
        })
        .collect()
}

fn bench_rank(c: &mut Criterion) {
    for n in [64usize, 1_024] {
        let input = results(n);
        c.bench_function(&format!("rank_results_{}", n), |b| {
            b.iter_batched(
                || input.clone(),
                |mut r| {
                    rank_results(&mut r);
                    black_box(r)
                },
                BatchSize::SmallInput,
            )
        });
    }
}

criterion_group!(benches, bench_rank);
criterion_main!(benches);

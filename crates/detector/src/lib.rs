//! Triangular arbitrage detection engine
//!
//! Features:
//! - Per-cycle evaluation against live router quotes
//! - Gas cost priced in the cycle's start token
//! - Concurrency-limited scanning of every (cycle, amount) combination
//! - Deterministic ranking of profitable and near-profitable results

pub mod context;
pub mod evaluator;
pub mod gas;
pub mod ranking;
pub mod scanner;

#[cfg(test)]
mod testing;

pub use context::EvalContext;
pub use evaluator::Evaluator;
pub use gas::{ConversionRates, GasPricer};
pub use ranking::{compare_results, rank_results};
pub use scanner::{Scanner, DEFAULT_CONCURRENCY_LIMIT};

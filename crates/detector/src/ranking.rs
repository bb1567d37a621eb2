//! Result ranking

use std::cmp::Ordering;

use triarb_core::EvaluationResult;

/// Best first: higher net-profit percentage, then larger net profit, then
/// earlier cycle declaration, then earlier amount.
pub fn compare_results(a: &EvaluationResult, b: &EvaluationResult) -> Ordering {
    b.net_profit_pct
        .cmp(&a.net_profit_pct)
        .then_with(|| b.net_profit.cmp(&a.net_profit))
        .then_with(|| a.cycle_index.cmp(&b.cycle_index))
        .then_with(|| a.amount_index.cmp(&b.amount_index))
}

/// Sort in place. Completion order of the evaluations has no effect on the
/// outcome.
pub fn rank_results(results: &mut [EvaluationResult]) {
    results.sort_by(compare_results);
}

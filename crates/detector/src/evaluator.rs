//! Single-cycle evaluation
//!
//! Quotes each hop in order, feeding every hop's output into the next. The
//! first failed hop ends the evaluation; later hops are never quoted and
//! nothing is retried.

use alloy_primitives::{I256, U256};

use triarb_core::{percentage, Cycle, EvalError, EvalResult, EvaluationResult, Quote};
use triarb_quote_source::quote_hop;

use crate::{EvalContext, GasPricer};

/// Evaluates (cycle, amount) combinations against a tick's context
pub struct Evaluator;

impl Evaluator {
    /// Evaluate `cycle` for `input` raw start-token units.
    ///
    /// `cycle_index` and `amount_index` are the declaration positions used
    /// for ranking tie-breaks. Deterministic given the context and the quote
    /// source's responses.
    pub async fn evaluate(
        cycle: &Cycle,
        cycle_index: usize,
        amount_index: usize,
        input: U256,
        ctx: &EvalContext,
    ) -> EvalResult<EvaluationResult> {
        if input.is_zero() {
            return Err(EvalError::ZeroInput {
                cycle: cycle.name().to_string(),
            });
        }

        let mut hops = Vec::with_capacity(cycle.hop_count());
        let mut current = input;

        for (hop_index, (token_in, token_out)) in cycle.hops().enumerate() {
            let amount_out = quote_hop(
                ctx.source.as_ref(),
                current,
                token_in.address,
                token_out.address,
                ctx.quote_timeout,
            )
            .await
            .map_err(|cause| EvalError::HopQuote {
                cycle: cycle.name().to_string(),
                hop_index,
                cause,
            })?;

            hops.push(Quote {
                token_in: token_in.clone(),
                token_out: token_out.clone(),
                amount_in: current,
                amount_out,
            });
            current = amount_out;
        }

        let overflow = || EvalError::Overflow {
            cycle: cycle.name().to_string(),
        };

        let final_signed = I256::try_from(current).map_err(|_| overflow())?;
        let input_signed = I256::try_from(input).map_err(|_| overflow())?;
        let gross_profit = final_signed.checked_sub(input_signed).ok_or_else(overflow)?;

        let gas_cost = GasPricer::new(ctx)
            .cost_for(cycle.start_token(), cycle.hop_count())
            .await;
        let cost_signed = I256::try_from(gas_cost.amount).map_err(|_| overflow())?;
        let net_profit = gross_profit.checked_sub(cost_signed).ok_or_else(overflow)?;

        let net_profit_pct = percentage(net_profit, input).ok_or_else(overflow)?;

        Ok(EvaluationResult {
            cycle: cycle.name().to_string(),
            cycle_index,
            amount_index,
            start_token: cycle.start_token().clone(),
            input_amount: input,
            hops,
            final_amount: current,
            gross_profit,
            gas_cost,
            net_profit,
            net_profit_pct,
            timestamp: ctx.timestamp,
        })
    }
}

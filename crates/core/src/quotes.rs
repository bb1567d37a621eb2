//! Per-hop quote types

use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{to_decimal, Token};

/// Result of one hop. Produced per call and never reused across evaluations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub token_in: Token,
    pub token_out: Token,
    pub amount_in: U256,
    pub amount_out: U256,
}

impl Quote {
    /// Router path for this hop
    pub fn path(&self) -> [Address; 2] {
        [self.token_in.address, self.token_out.address]
    }

    pub fn amount_in_decimal(&self) -> Option<Decimal> {
        to_decimal(self.amount_in, self.token_in.decimals)
    }

    pub fn amount_out_decimal(&self) -> Option<Decimal> {
        to_decimal(self.amount_out, self.token_out.decimals)
    }

    /// Decimal-adjusted execution price (token_out per token_in)
    pub fn effective_price(&self) -> Option<Decimal> {
        let amount_in = self.amount_in_decimal()?;
        if amount_in.is_zero() {
            return None;
        }
        self.amount_out_decimal()?.checked_div(amount_in)
    }
}

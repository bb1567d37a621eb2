//! Cycle definitions

use serde::Serialize;
use std::fmt;

use crate::{ConfigError, ConfigResult, Token, TokenRegistry};

/// Closed swap path A -> B -> ... -> A
///
/// Adjacent pairs are not checked against the quote source up front; a
/// missing pair surfaces as a hop failure during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cycle {
    name: String,
    tokens: Vec<Token>,
    priority: Option<u32>,
}

impl Cycle {
    /// Resolve and validate a cycle against the token table
    pub fn new<S: AsRef<str>>(
        name: &str,
        symbols: &[S],
        priority: Option<u32>,
        registry: &TokenRegistry,
    ) -> ConfigResult<Self> {
        if symbols.len() < 3 {
            return Err(ConfigError::CycleTooShort {
                name: name.to_string(),
                len: symbols.len(),
            });
        }

        let tokens = symbols
            .iter()
            .map(|s| registry.get(s.as_ref()).cloned())
            .collect::<ConfigResult<Vec<Token>>>()?;

        if tokens.first() != tokens.last() {
            return Err(ConfigError::CycleNotClosed {
                name: name.to_string(),
            });
        }

        if let Some(pair) = tokens.windows(2).find(|w| w[0] == w[1]) {
            return Err(ConfigError::DegenerateHop {
                name: name.to_string(),
                symbol: pair[0].symbol.clone(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            tokens,
            priority,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Token the cycle starts and ends in; profits are denominated in it
    pub fn start_token(&self) -> &Token {
        &self.tokens[0]
    }

    pub fn hop_count(&self) -> usize {
        self.tokens.len() - 1
    }

    /// (token_in, token_out) per hop, in order
    pub fn hops(&self) -> impl Iterator<Item = (&Token, &Token)> {
        self.tokens.windows(2).map(|w| (&w[0], &w[1]))
    }

    /// Scan ordering hint only
    pub fn priority(&self) -> Option<u32> {
        self.priority
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: Vec<&str> = self.tokens.iter().map(|t| t.symbol.as_str()).collect();
        write!(f, "{} [{}]", self.name, path.join(" -> "))
    }
}

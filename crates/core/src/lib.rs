//! Core types and utilities for the triangular arbitrage scanner
//!
//! This crate provides shared types used across all components:
//! - Token and cycle definitions
//! - Fixed-point amount handling
//! - Quote, evaluation and scan result types
//! - Gas cost model
//! - Configuration and error types

pub mod types;
pub mod tokens;
pub mod cycles;
pub mod quotes;
pub mod cost;
pub mod opportunities;
pub mod config;
pub mod errors;

pub use types::*;
pub use tokens::*;
pub use cycles::*;
pub use quotes::*;
pub use cost::*;
pub use opportunities::*;
pub use self::config::*;
pub use errors::*;

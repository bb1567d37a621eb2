//! Triangular arbitrage scanner binary support
//!
//! Wires settings, quote sources and reporting into the scheduler.

pub mod reporter;
pub mod sources;

pub use reporter::{describe, LogReporter};
pub use sources::{dry_run_source, rpc_sources};

/// Config file used when `TRIARB_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "config/scanner.toml";

/// True when `name` is set to `1`, `true` or `yes`
pub fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

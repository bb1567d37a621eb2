//! Quote sources: on-chain router quotes over JSON-RPC, plus a scripted
//! in-memory source for tests and dry runs.

pub mod rpc;
pub mod scripted;
pub mod source;

pub use rpc::RpcQuoteSource;
pub use scripted::ScriptedQuoteSource;
pub use source::{quote_hop, with_timeout, QuoteSource};

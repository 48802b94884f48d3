//! # Swap Engine
//!
//! Execution driver for the coordinator. Local orders are paired with
//! complementary counter-orders and settled in one transaction; cross-chain
//! orders run the HTLC protocol: escrow on the maker's chain, message relay
//! to the counterpart chain, then event-driven completion on secret reveal
//! or a refund once the timelock passes.
//!
//! At most one execution per order is ever in flight; concurrent attempts
//! fail fast instead of racing.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod matching;
pub mod pending;
pub mod service;

pub use error::EngineError;
pub use matching::{effective_price, find_matches_in, is_complementary, price_compatible};
pub use pending::{ExecutionStatus, PendingExecution};
pub use service::{CrossChainExecution, ExecutionEngine, ExecutionOutcome, LocalFill};

//! # Swap Types
//!
//! Domain primitives shared by every coordinator component.
//!
//! ## Contents
//!
//! - Identifiers: [`OrderId`], [`MessageId`], [`CrossChainId`], [`QueuedId`]
//! - Chains: [`ChainTag`], [`TxId`], EVM address parsing
//! - Amounts: [`Amount`] (U256-backed, decimal strings on the wire)
//! - Time: unix second/millisecond helpers
//! - Lifecycles: [`OrderStatus`], [`CrossChainState`]
//! - Errors: [`ErrorCode`] wire codes and [`CoordinatorError`]
//! - Configuration: [`CoordinatorConfig`] with start-time validation
//!
//! Components own their state; this crate only defines the vocabulary they
//! exchange.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod amount;
pub mod chain;
pub mod config;
pub mod error;
pub mod ids;
pub mod status;
pub mod time;

pub use amount::Amount;
pub use chain::{parse_evm_address, ChainTag, SwapDirection, TxId};
pub use config::{ConfigError, CoordinatorConfig};
pub use error::{CoordinatorError, ErrorCode};
pub use ids::{tagged_id, CrossChainId, MessageId, OrderId, QueuedId};
pub use status::{CrossChainState, OrderStatus};
pub use time::{now_millis, now_secs};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol version carried by every cross-chain message.
pub const PROTOCOL_VERSION: &str = "1.0.0";

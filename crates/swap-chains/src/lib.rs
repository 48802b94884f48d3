//! # Swap Chains
//!
//! Thin adapters over the two bridged chains. An adapter knows how to shape
//! a submission for its chain, check inclusion, count confirmations, and
//! poll escrow/fulfillment/refund events from a cursor. Network transport is
//! injected behind [`RpcTransport`]; adapters make exactly one network
//! attempt per call, and every retry decision belongs to the message relay.
//!
//! ## Structure
//!
//! ```text
//! swap-chains/
//! ├── adapter.rs     # ChainAdapter trait, events, cursors, errors
//! ├── transport.rs   # RpcTransport seam
//! ├── evm.rs         # Ethereum adapter (JSON-RPC shapes)
//! ├── ton.rs         # TON adapter (logical-time shapes)
//! └── mock.rs        # scriptable adapter for tests
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod evm;
pub mod mock;
pub mod ton;
pub mod transport;

pub use adapter::{
    ChainAdapter, ChainError, ChainEvent, EscrowParams, EventBatch, EventCursor, RefundParams,
    TradeParams,
};
pub use evm::EvmAdapter;
pub use mock::MockChainAdapter;
pub use ton::TonAdapter;
pub use transport::{RpcTransport, TransportError};

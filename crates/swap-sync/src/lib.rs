//! # Swap Sync
//!
//! Per-order lifecycle tracking across the two chains. Each tracked order
//! carries one record per chain (transaction, position, confirmation count)
//! plus a cross-chain protocol state; a periodic watcher promotes chains to
//! finalized once their confirmation thresholds are met and fails orders
//! whose timelock passed without completion.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod service;
pub mod tracked;

pub use service::{StateSync, SyncError};
pub use tracked::{
    ChainInfoUpdate, ChainRecord, ChainTxStatus, OrderTrackingInfo, TrackedOrder,
};

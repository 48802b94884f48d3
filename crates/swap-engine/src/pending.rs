//! # Pending Executions
//!
//! The engine's in-memory record of an in-progress HTLC protocol instance.
//! At any instant an order has at most one of these.

use serde::{Deserialize, Serialize};
use swap_types::{ChainTag, OrderId, TxId};

/// Progress of an HTLC execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// Registered, escrow not yet placed.
    Pending,
    /// Escrow placed; the escrow message is with the relay.
    Relaying,
    /// Secret revealed and settlement recorded.
    Completed,
    /// Failed permanently.
    Failed,
    /// Escrow refunded after the timelock.
    Refunded,
}

/// One in-flight HTLC execution.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingExecution {
    /// The order being executed.
    pub order_id: OrderId,
    /// Chain carrying the maker's escrow.
    pub source_chain: ChainTag,
    /// Chain the escrow message is delivered to.
    pub target_chain: ChainTag,
    /// SHA-256 hashlock the fulfillment secret must match, lowercase hex.
    pub secret_hash: String,
    /// Absolute refund deadline, unix seconds.
    pub timelock: u64,
    /// The escrow transaction, once placed.
    pub source_tx_hash: Option<TxId>,
    /// Progress.
    pub status: ExecutionStatus,
    /// Recovery attempts consumed.
    pub retry_count: u32,
    /// Revealed secret, once fulfillment arrives. Lowercase hex.
    pub secret: Option<String>,
    /// Fulfillment transaction on the target chain.
    pub target_tx_hash: Option<TxId>,
    /// Unix millis the execution was registered.
    pub created_at: u64,
}

impl PendingExecution {
    /// Register a fresh execution.
    pub fn new(
        order_id: OrderId,
        source_chain: ChainTag,
        target_chain: ChainTag,
        secret_hash: String,
        timelock: u64,
    ) -> Self {
        Self {
            order_id,
            source_chain,
            target_chain,
            secret_hash: secret_hash.to_ascii_lowercase(),
            timelock,
            source_tx_hash: None,
            status: ExecutionStatus::Pending,
            retry_count: 0,
            secret: None,
            target_tx_hash: None,
            created_at: swap_types::now_millis(),
        }
    }

    /// Whether the execution sits past its timelock.
    pub fn past_timelock(&self, now_secs: u64) -> bool {
        now_secs >= self.timelock
    }
}

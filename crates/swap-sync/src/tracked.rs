//! # Tracked Orders
//!
//! The per-order record the synchronizer owns: one chain record per side,
//! the cross-chain protocol state, finality flags, and expiry bookkeeping.

use serde::{Deserialize, Serialize};
use swap_types::{
    Amount, ChainTag, CrossChainId, CrossChainState, OrderId, SwapDirection, TxId,
};

/// Inclusion status of a chain-side transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainTxStatus {
    /// Submitted, not yet confirmed.
    #[default]
    Pending,
    /// Included and successful.
    Confirmed,
    /// Included but reverted, or dropped.
    Failed,
}

/// What the synchronizer knows about one chain's side of an order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainRecord {
    /// Transaction hash, once known.
    pub tx_hash: Option<TxId>,
    /// Block number (EVM) or logical time (TON).
    pub block: Option<u64>,
    /// Log index within the block, where applicable.
    pub log_index: Option<u32>,
    /// Inclusion status.
    pub status: ChainTxStatus,
    /// Confirmations observed at the last finality check.
    pub confirmation_count: u32,
}

/// Partial update merged into a [`ChainRecord`].
#[derive(Clone, Debug, Default)]
pub struct ChainInfoUpdate {
    /// New transaction hash, if learned.
    pub tx_hash: Option<TxId>,
    /// New block/logical-time position, if learned.
    pub block: Option<u64>,
    /// New log index, if learned.
    pub log_index: Option<u32>,
    /// New inclusion status.
    pub status: ChainTxStatus,
}

/// Everything needed to start tracking an order.
#[derive(Clone, Debug)]
pub struct OrderTrackingInfo {
    /// The order's id.
    pub order_id: OrderId,
    /// Correlation id, when the order carries one.
    pub cross_chain_id: Option<CrossChainId>,
    /// Swap direction.
    pub direction: SwapDirection,
    /// SHA-256 hashlock, lowercase hex.
    pub hashlock: String,
    /// Absolute refund deadline, unix seconds.
    pub timelock: u64,
    /// Escrowed amount.
    pub amount: Amount,
    /// The maker's address on the escrow chain.
    pub initiator: String,
    /// The recipient's address on the claim chain.
    pub recipient: String,
}

/// A tracked cross-chain order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackedOrder {
    /// The order's id.
    pub order_id: OrderId,
    /// Correlation id, when the order carries one.
    pub cross_chain_id: Option<CrossChainId>,
    /// Swap direction.
    pub direction: SwapDirection,
    /// SHA-256 hashlock, lowercase hex.
    pub hashlock: String,
    /// Absolute refund deadline, unix seconds.
    pub timelock: u64,
    /// Escrowed amount.
    pub amount: Amount,
    /// The maker's address on the escrow chain.
    pub initiator: String,
    /// The recipient's address on the claim chain.
    pub recipient: String,
    /// EVM-side record.
    pub eth: ChainRecord,
    /// TON-side record.
    pub ton: ChainRecord,
    /// Cross-chain protocol state.
    pub state: CrossChainState,
    /// Whether the source chain reached its confirmation threshold.
    pub src_finalized: bool,
    /// Whether the destination chain reached its confirmation threshold.
    pub dst_finalized: bool,
    /// Expiry instant, unix millis (`timelock × 1000`).
    pub expires_at: u64,
    /// Revealed secret, once recorded. Lowercase hex.
    pub secret: Option<String>,
    /// Recovery attempts consumed.
    pub retry_count: u32,
    /// Last failure description.
    pub last_error: Option<String>,
    /// Unix millis the order entered tracking.
    pub created_at: u64,
    /// Unix millis of the last change.
    pub updated_at: u64,
}

impl TrackedOrder {
    /// Build a fresh PENDING record from tracking info.
    pub fn new(info: OrderTrackingInfo) -> Self {
        let now = swap_types::now_millis();
        Self {
            order_id: info.order_id,
            cross_chain_id: info.cross_chain_id,
            direction: info.direction,
            hashlock: info.hashlock.to_ascii_lowercase(),
            timelock: info.timelock,
            amount: info.amount,
            initiator: info.initiator,
            recipient: info.recipient,
            eth: ChainRecord::default(),
            ton: ChainRecord::default(),
            state: CrossChainState::Pending,
            src_finalized: false,
            dst_finalized: false,
            expires_at: info.timelock.saturating_mul(1_000),
            secret: None,
            retry_count: 0,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The record for one chain.
    pub fn record(&self, chain: ChainTag) -> &ChainRecord {
        match chain {
            ChainTag::Ethereum => &self.eth,
            ChainTag::Ton => &self.ton,
        }
    }

    /// Mutable record for one chain.
    pub fn record_mut(&mut self, chain: ChainTag) -> &mut ChainRecord {
        match chain {
            ChainTag::Ethereum => &mut self.eth,
            ChainTag::Ton => &mut self.ton,
        }
    }

    /// Whether the order is past its expiry instant.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }
}

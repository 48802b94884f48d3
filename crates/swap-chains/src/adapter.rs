//! # Chain Adapter Port
//!
//! The symmetric contract both chain adapters implement, the typed events
//! they decode, and the cursor used to resume polling.

use crate::transport::TransportError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use swap_messages::CrossChainMessage;
use swap_types::{Amount, ChainTag, ErrorCode, OrderId, TxId};
use thiserror::Error;

/// Adapter failure. Network problems are transient and recovered by the
/// relay; decoding problems are permanent.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Transport-level failure.
    #[error("{chain}: {source}")]
    Transport {
        /// The chain whose endpoint failed.
        chain: ChainTag,
        /// The underlying transport error.
        #[source]
        source: TransportError,
    },

    /// The endpoint answered with something the adapter cannot decode.
    #[error("{chain}: invalid response: {detail}")]
    InvalidResponse {
        /// The chain whose endpoint misbehaved.
        chain: ChainTag,
        /// What was wrong.
        detail: String,
    },

    /// The referenced transaction is unknown to the chain.
    #[error("{chain}: unknown transaction {tx}")]
    UnknownTransaction {
        /// The queried chain.
        chain: ChainTag,
        /// The unknown transaction id.
        tx: TxId,
    },
}

impl ChainError {
    /// Wire-level code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Transport { .. } => ErrorCode::NetworkError,
            Self::InvalidResponse { .. } => ErrorCode::InternalError,
            Self::UnknownTransaction { .. } => ErrorCode::NetworkError,
        }
    }

    /// Whether the relay may retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        self.code().is_retryable()
    }
}

/// Position to resume event polling from. For the EVM chain this is a block
/// number; for TON it is a logical time. `sub_position` disambiguates within
/// one block (the log index).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventCursor {
    /// Block number or logical time.
    pub position: u64,
    /// Log index within the position.
    pub sub_position: u32,
}

impl EventCursor {
    /// The beginning of history.
    pub fn origin() -> Self {
        Self::default()
    }
}

/// A typed on-chain event decoded by an adapter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainEvent {
    /// An escrow was created on this chain.
    EscrowCreated {
        /// Order the escrow belongs to.
        order_id: OrderId,
        /// Transaction carrying the escrow.
        tx: TxId,
        /// Where the event sits in chain order.
        cursor: EventCursor,
        /// Escrowed amount.
        amount: Amount,
        /// Hashlock guarding the escrow, lowercase hex.
        hashlock: String,
    },

    /// An escrow was claimed and the secret revealed.
    Fulfillment {
        /// Order being fulfilled.
        order_id: OrderId,
        /// Claim transaction.
        tx: TxId,
        /// Where the event sits in chain order.
        cursor: EventCursor,
        /// Revealed preimage, hex.
        secret: String,
    },

    /// An escrow was refunded after its timelock.
    Refund {
        /// Order being refunded.
        order_id: OrderId,
        /// Refund transaction.
        tx: TxId,
        /// Where the event sits in chain order.
        cursor: EventCursor,
    },
}

impl ChainEvent {
    /// The order this event concerns.
    pub fn order_id(&self) -> &OrderId {
        match self {
            Self::EscrowCreated { order_id, .. }
            | Self::Fulfillment { order_id, .. }
            | Self::Refund { order_id, .. } => order_id,
        }
    }

    /// The event's position in chain order.
    pub fn cursor(&self) -> EventCursor {
        match self {
            Self::EscrowCreated { cursor, .. }
            | Self::Fulfillment { cursor, .. }
            | Self::Refund { cursor, .. } => *cursor,
        }
    }
}

/// Result of one poll: decoded events plus the cursor to resume from.
#[derive(Clone, Debug, Default)]
pub struct EventBatch {
    /// Events after the requested cursor, in chain order.
    pub events: Vec<ChainEvent>,
    /// Resume point for the next poll.
    pub next_cursor: EventCursor,
}

/// Parameters for placing an HTLC escrow on a chain.
#[derive(Clone, Debug)]
pub struct EscrowParams {
    /// Order the escrow belongs to.
    pub order_id: OrderId,
    /// Depositor address, chain-native encoding.
    pub sender: String,
    /// Claimant address, chain-native encoding.
    pub recipient: String,
    /// Escrowed amount in minor units.
    pub amount: Amount,
    /// Token identifier; `None` for the native asset.
    pub token: Option<String>,
    /// SHA-256 hashlock, lowercase hex.
    pub hashlock: String,
    /// Absolute refund deadline, unix seconds.
    pub timelock: u64,
}

/// Parameters for settling a matched pair of local orders.
#[derive(Clone, Debug)]
pub struct TradeParams {
    /// The order execution was requested for.
    pub order_id: OrderId,
    /// The matched counter-order.
    pub counter_order_id: OrderId,
    /// min(maker amounts).
    pub matched_amount: Amount,
}

/// Parameters for refunding an expired escrow.
#[derive(Clone, Debug)]
pub struct RefundParams {
    /// Order whose escrow is refunded.
    pub order_id: OrderId,
    /// The original escrow transaction.
    pub escrow_tx: TxId,
    /// Refund recipient (the original depositor).
    pub recipient: String,
}

/// The symmetric contract both adapters implement.
///
/// Adapters never retry beyond a single network attempt; the relay owns
/// every retry decision.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    /// Which chain this adapter fronts.
    fn chain(&self) -> ChainTag;

    /// Serialize a cross-chain message for this chain and submit it.
    async fn submit(&self, message: &CrossChainMessage) -> Result<TxId, ChainError>;

    /// True if the chain reports the transaction included and successful.
    async fn verify(&self, tx: &TxId) -> Result<bool, ChainError>;

    /// Confirmations behind the transaction; 0 if pending.
    async fn confirmations(&self, tx: &TxId) -> Result<u32, ChainError>;

    /// Decoded events after the cursor, in chain order.
    async fn poll_since(&self, cursor: &EventCursor) -> Result<EventBatch, ChainError>;

    /// Current gas price (or flat fee estimate on TON), minor units.
    async fn gas_price(&self) -> Result<Amount, ChainError>;

    /// Place an HTLC escrow.
    async fn place_escrow(&self, params: &EscrowParams) -> Result<TxId, ChainError>;

    /// Settle a matched pair of resting orders.
    async fn settle_trade(&self, params: &TradeParams) -> Result<TxId, ChainError>;

    /// Refund an expired escrow.
    async fn refund(&self, params: &RefundParams) -> Result<TxId, ChainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_retryable() {
        let err = ChainError::Transport {
            chain: ChainTag::Ethereum,
            source: TransportError::Network("timeout".into()),
        };
        assert!(err.is_retryable());
        assert_eq!(err.code(), ErrorCode::NetworkError);
    }

    #[test]
    fn test_decode_errors_not_retryable() {
        let err = ChainError::InvalidResponse {
            chain: ChainTag::Ton,
            detail: "missing field".into(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_cursor_ordering() {
        let a = EventCursor {
            position: 10,
            sub_position: 2,
        };
        let b = EventCursor {
            position: 10,
            sub_position: 3,
        };
        let c = EventCursor {
            position: 11,
            sub_position: 0,
        };
        assert!(a < b && b < c);
        assert_eq!(EventCursor::origin().position, 0);
    }

    #[test]
    fn test_event_accessors() {
        let event = ChainEvent::Refund {
            order_id: OrderId::new("0x01"),
            tx: TxId::new("0xaa"),
            cursor: EventCursor {
                position: 5,
                sub_position: 1,
            },
        };
        assert_eq!(event.order_id().as_str(), "0x01");
        assert_eq!(event.cursor().position, 5);
    }
}

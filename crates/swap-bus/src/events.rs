//! # Coordinator Events
//!
//! Every event that flows between components, as one closed enum.

use serde::{Deserialize, Serialize};
use swap_types::{
    Amount, ChainTag, CrossChainId, CrossChainState, MessageId, OrderId, OrderStatus, QueuedId,
    TxId,
};

/// All events published on the coordinator bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CoordinatorEvent {
    // =========================================================================
    // ORDER MANAGER
    // =========================================================================
    /// An order was constructed from an intent (not yet signed).
    OrderConstructed {
        /// The new order's id.
        order_id: OrderId,
        /// Whether the order carries a cross-chain destination.
        cross_chain: bool,
    },

    /// An order-book entry changed status.
    ///
    /// Emitted for every lifecycle step, including the initial CREATED
    /// right after the signed order enters the book.
    OrderEvent {
        /// The order's id.
        order_id: OrderId,
        /// Status after the transition.
        status: OrderStatus,
        /// Transaction hash attached to the transition, when one exists.
        tx_hash: Option<TxId>,
        /// Failure detail for FAILED transitions.
        error: Option<String>,
    },

    // =========================================================================
    // MESSAGE RELAY
    // =========================================================================
    /// A queued message was delivered and verified on the target chain.
    MessageDelivered {
        /// Queue entry id.
        queued_id: QueuedId,
        /// The message's id.
        message_id: MessageId,
        /// Chain the message was delivered to.
        target: ChainTag,
        /// Transaction that carried it.
        tx_id: TxId,
        /// Attempts consumed, including the successful one.
        attempts: u32,
        /// Milliseconds from enqueue to verified delivery.
        delivery_ms: u64,
    },

    /// A delivery attempt failed; the message will be retried.
    MessageRetry {
        /// Queue entry id.
        queued_id: QueuedId,
        /// The message's id.
        message_id: MessageId,
        /// Attempts consumed so far.
        attempts: u32,
        /// Unix millis of the next attempt.
        next_retry: u64,
        /// The failure that triggered the retry.
        error: String,
    },

    /// A message exhausted its retry budget.
    MessageFailed {
        /// Queue entry id.
        queued_id: QueuedId,
        /// The message's id.
        message_id: MessageId,
        /// Attempts consumed (equals the configured cap).
        attempts: u32,
        /// The final failure.
        error: String,
    },

    // =========================================================================
    // STATE SYNCHRONIZATION
    // =========================================================================
    /// An order entered the tracked table.
    OrderTracked {
        /// The tracked order's id.
        order_id: OrderId,
        /// Correlation id, when the order carries one.
        cross_chain_id: Option<CrossChainId>,
    },

    /// The tracked cross-chain state advanced.
    SyncStateChanged {
        /// The tracked order's id.
        order_id: OrderId,
        /// State after the transition.
        state: CrossChainState,
    },

    /// The source chain reached its confirmation threshold.
    SourceFinalized {
        /// The tracked order's id.
        order_id: OrderId,
        /// Confirmations observed.
        confirmations: u32,
    },

    /// The destination chain reached its confirmation threshold.
    DestinationFinalized {
        /// The tracked order's id.
        order_id: OrderId,
        /// Confirmations observed.
        confirmations: u32,
    },

    /// A tracked order passed its timelock without completing.
    TimelockReached {
        /// The tracked order's id.
        order_id: OrderId,
    },

    // =========================================================================
    // EXECUTION ENGINE
    // =========================================================================
    /// Two complementary local orders settled.
    OrderExecuted {
        /// The order execution was requested for.
        order_id: OrderId,
        /// The matched counter-order.
        matched_order_id: OrderId,
        /// min(maker amounts).
        matched_amount: Amount,
        /// Arithmetic mean of the two prices.
        matched_price: f64,
    },

    /// A cross-chain execution completed after secret reveal.
    CrossChainExecutionCompleted {
        /// The order's id.
        order_id: OrderId,
        /// Fulfillment transaction on the counterpart chain.
        target_tx: TxId,
    },

    /// A revealed secret did not match the stored hashlock.
    CryptoMismatch {
        /// The order's id.
        order_id: OrderId,
    },

    /// A relaying execution passed its timelock and was failed.
    OrderExecutionTimeout {
        /// The order's id.
        order_id: OrderId,
    },
}

impl CoordinatorEvent {
    /// The topic this event belongs to, for subscription filtering.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::OrderConstructed { .. } | Self::OrderEvent { .. } => EventTopic::Orders,
            Self::MessageDelivered { .. }
            | Self::MessageRetry { .. }
            | Self::MessageFailed { .. } => EventTopic::Relay,
            Self::OrderTracked { .. }
            | Self::SyncStateChanged { .. }
            | Self::SourceFinalized { .. }
            | Self::DestinationFinalized { .. }
            | Self::TimelockReached { .. } => EventTopic::Sync,
            Self::OrderExecuted { .. }
            | Self::CrossChainExecutionCompleted { .. }
            | Self::CryptoMismatch { .. }
            | Self::OrderExecutionTimeout { .. } => EventTopic::Engine,
        }
    }

    /// The order id carried by this event, when it names one.
    #[must_use]
    pub fn order_id(&self) -> Option<&OrderId> {
        match self {
            Self::OrderConstructed { order_id, .. }
            | Self::OrderEvent { order_id, .. }
            | Self::OrderTracked { order_id, .. }
            | Self::SyncStateChanged { order_id, .. }
            | Self::SourceFinalized { order_id, .. }
            | Self::DestinationFinalized { order_id, .. }
            | Self::TimelockReached { order_id }
            | Self::OrderExecuted { order_id, .. }
            | Self::CrossChainExecutionCompleted { order_id, .. }
            | Self::CryptoMismatch { order_id }
            | Self::OrderExecutionTimeout { order_id } => Some(order_id),
            _ => None,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Order manager events.
    Orders,
    /// Message relay events.
    Relay,
    /// State synchronization events.
    Sync,
    /// Execution engine events.
    Engine,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// A filter that accepts every event.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// A filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Whether an event passes this filter.
    #[must_use]
    pub fn matches(&self, event: &CoordinatorEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_event() -> CoordinatorEvent {
        CoordinatorEvent::OrderEvent {
            order_id: OrderId::new("0xabc"),
            status: OrderStatus::Signed,
            tx_hash: None,
            error: None,
        }
    }

    #[test]
    fn test_topic_mapping() {
        assert_eq!(order_event().topic(), EventTopic::Orders);
        let delivered = CoordinatorEvent::MessageDelivered {
            queued_id: QueuedId::new("q_1_a"),
            message_id: MessageId::new("msg_1_a"),
            target: ChainTag::Ton,
            tx_id: TxId::new("0xaa"),
            attempts: 1,
            delivery_ms: 10,
        };
        assert_eq!(delivered.topic(), EventTopic::Relay);
        let timeout = CoordinatorEvent::OrderExecutionTimeout {
            order_id: OrderId::new("0xabc"),
        };
        assert_eq!(timeout.topic(), EventTopic::Engine);
    }

    #[test]
    fn test_filter_all() {
        assert!(EventFilter::all().matches(&order_event()));
    }

    #[test]
    fn test_filter_by_topic() {
        let filter = EventFilter::topics(vec![EventTopic::Orders]);
        assert!(filter.matches(&order_event()));

        let sync = CoordinatorEvent::TimelockReached {
            order_id: OrderId::new("0xabc"),
        };
        assert!(!filter.matches(&sync));
    }

    #[test]
    fn test_order_id_accessor() {
        assert_eq!(
            order_event().order_id().map(|id| id.as_str()),
            Some("0xabc")
        );
    }
}

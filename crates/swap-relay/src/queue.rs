//! # Relay Queue Entries
//!
//! Queue entry lifecycle and observable statistics.

use serde::{Deserialize, Serialize};
use swap_messages::CrossChainMessage;
use swap_types::{ChainTag, QueuedId, TxId};

/// Delivery state of a queued message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueState {
    /// Waiting for its first attempt.
    Pending,
    /// A dispatch is in flight.
    Relaying,
    /// Submitted and verified on the target chain.
    Delivered,
    /// Attempt budget exhausted.
    Failed,
    /// Waiting for the next attempt.
    Retry,
}

impl QueueState {
    /// Terminal entries are only touched by cleanup.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Failed)
    }

    /// States eligible for dispatch.
    pub fn is_due_candidate(&self) -> bool {
        matches!(self, Self::Pending | Self::Retry)
    }
}

/// A message queued for delivery to one chain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueuedMessage {
    /// Queue entry id.
    pub queued_id: QueuedId,
    /// The message to deliver.
    pub message: CrossChainMessage,
    /// Chain to deliver to.
    pub target: ChainTag,
    /// Current delivery state.
    pub state: QueueState,
    /// Attempts made so far.
    pub attempts: u32,
    /// Unix millis the entry becomes due.
    pub next_retry: u64,
    /// Unix millis the entry was enqueued.
    pub created_at: u64,
    /// Unix millis of the last attempt, if any.
    pub last_attempt: Option<u64>,
    /// Failure description from the last attempt, if any.
    pub last_error: Option<String>,
    /// Transaction that carried the message, once delivered.
    pub delivered_tx: Option<TxId>,
    /// Unix millis of verified delivery.
    pub delivered_at: Option<u64>,
    /// Insertion sequence, tie-breaker for identical `created_at`.
    #[serde(skip)]
    pub(crate) seq: u64,
}

impl QueuedMessage {
    /// Whether this entry is due for dispatch at `now`.
    pub fn is_due(&self, now: u64) -> bool {
        self.state.is_due_candidate() && self.next_retry <= now
    }
}

/// Observable relay statistics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayStats {
    /// All entries currently in the queue.
    pub total: usize,
    /// Entries waiting for a first attempt.
    pub pending: usize,
    /// Entries with a dispatch in flight.
    pub relaying: usize,
    /// Verified deliveries.
    pub delivered: usize,
    /// Entries that exhausted their attempt budget.
    pub failed: usize,
    /// Entries waiting for another attempt.
    pub retry: usize,
    /// Mean enqueue-to-delivery latency over delivered entries, ms.
    pub avg_delivery_ms: u64,
}

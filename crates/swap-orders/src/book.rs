//! # Order-Book Entries
//!
//! One entry per signed order, tying it to its lifecycle status and fill
//! bookkeeping. The manager owns the book; everyone else sees snapshots.

use crate::signing::SignedOrder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use swap_types::{now_millis, Amount, OrderId, OrderStatus, TxId};

/// A signed order resting in the book.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderBookEntry {
    /// The signed order; shared by reference with the engine and sync.
    pub signed: Arc<SignedOrder>,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Unix millis the entry was created.
    pub created_at: u64,
    /// Unix millis of the last status change.
    pub updated_at: u64,
    /// Amount filled so far.
    pub filled_amount: Amount,
    /// Amount still open.
    pub remaining_amount: Amount,
    /// Transaction attached to the latest transition, if any.
    pub tx_hash: Option<TxId>,
    /// Failure detail for FAILED entries.
    pub error: Option<String>,
}

impl OrderBookEntry {
    /// A fresh SIGNED entry for a signed order.
    pub fn new(signed: Arc<SignedOrder>) -> Self {
        let now = now_millis();
        let maker_amount = signed.order.maker_amount;
        Self {
            signed,
            status: OrderStatus::Signed,
            created_at: now,
            updated_at: now,
            filled_amount: Amount::ZERO,
            remaining_amount: maker_amount,
            tx_hash: None,
            error: None,
        }
    }

    /// The order's id.
    pub fn order_id(&self) -> &OrderId {
        self.signed.order_id()
    }

    /// Age of the entry in milliseconds.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.created_at)
    }
}

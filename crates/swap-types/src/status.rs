//! # Lifecycle Status Machines
//!
//! Order-book status and two-chain cross-chain state. Both live here because
//! they cross component boundaries: the order manager owns the book, the
//! state synchronizer owns the tracked table, and the event bus carries both.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order-book entry lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Constructed, not yet signed.
    Created,
    /// Signed and resting in the book.
    Signed,
    /// Paired with a counter-order.
    Matched,
    /// Execution in flight.
    Executing,
    /// Settled.
    Completed,
    /// Cancelled by the maker.
    Cancelled,
    /// Deadline passed before execution.
    Expired,
    /// Execution failed permanently.
    Failed,
}

impl OrderStatus {
    /// Valid lifecycle transitions.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Created, Signed) => true,
            (Signed, Matched) | (Signed, Executing) | (Signed, Cancelled) | (Signed, Expired) => {
                true
            }
            (Matched, Executing) => true,
            (Matched, Signed) => true, // failed match reverts to the book
            (Executing, Completed) | (Executing, Failed) | (Executing, Cancelled) => true,
            (Executing, Signed) => true, // failed local fill reverts to the book
            _ => false,
        }
    }

    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Cancelled | Self::Expired | Self::Failed
        )
    }

    /// Wire string, SCREAMING_SNAKE_CASE.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Signed => "SIGNED",
            Self::Matched => "MATCHED",
            Self::Executing => "EXECUTING",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cross-chain protocol state for a tracked order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrossChainState {
    /// Tracked, no escrow confirmed yet.
    Pending,
    /// Source-chain escrow confirmed.
    EscrowedSrc,
    /// Destination-chain escrow confirmed.
    EscrowedDst,
    /// Both escrows confirmed.
    EscrowedBoth,
    /// Secret revealed and recorded.
    Fulfilled,
    /// Source escrow refunded.
    RefundedSrc,
    /// Destination escrow refunded.
    RefundedDst,
    /// Both escrows refunded.
    RefundedBoth,
    /// Cancelled before escrow.
    Cancelled,
    /// Failed permanently (timelock reached, crypto mismatch, ...).
    Failed,
}

impl CrossChainState {
    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Fulfilled | Self::RefundedBoth | Self::Cancelled | Self::Failed
        )
    }
}

impl fmt::Display for CrossChainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::EscrowedSrc => "ESCROWED_SRC",
            Self::EscrowedDst => "ESCROWED_DST",
            Self::EscrowedBoth => "ESCROWED_BOTH",
            Self::Fulfilled => "FULFILLED",
            Self::RefundedSrc => "REFUNDED_SRC",
            Self::RefundedDst => "REFUNDED_DST",
            Self::RefundedBoth => "REFUNDED_BOTH",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

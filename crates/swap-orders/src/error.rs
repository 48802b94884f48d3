//! # Order Errors

use swap_chains::ChainError;
use swap_types::{ErrorCode, OrderId, OrderStatus};
use thiserror::Error;

/// Order manager failure.
#[derive(Debug, Error)]
pub enum OrderError {
    /// An intent or order field failed validation.
    #[error("invalid parameters: {0}")]
    Validation(String),

    /// Cross-chain intent without a destination recipient.
    #[error("cross-chain intent requires a destination recipient")]
    MissingDestination,

    /// Deadline is not in the future.
    #[error("order deadline {deadline} is not after now ({now})")]
    ExpiredDeadline {
        /// The rejected deadline.
        deadline: u64,
        /// Time of the check.
        now: u64,
    },

    /// No order with the given id.
    #[error("order not found: {0}")]
    NotFound(OrderId),

    /// An order with this id is already in the book.
    #[error("order already in book: {0}")]
    Duplicate(OrderId),

    /// Caller is not the order's maker.
    #[error("caller is not the maker of order {0}")]
    UnauthorizedCancellation(OrderId),

    /// The requested status change is not a legal lifecycle transition.
    #[error("illegal status transition {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: OrderStatus,
        /// Requested status.
        to: OrderStatus,
    },

    /// Signing failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// A chain adapter call failed.
    #[error(transparent)]
    Adapter(#[from] ChainError),
}

impl OrderError {
    /// Wire-level code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) | Self::MissingDestination | Self::Duplicate(_) => {
                ErrorCode::InvalidParameters
            }
            Self::ExpiredDeadline { .. } => ErrorCode::ExpiredOrder,
            Self::NotFound(_) => ErrorCode::OrderNotFound,
            Self::UnauthorizedCancellation(_) => ErrorCode::UnauthorizedCancellation,
            Self::InvalidTransition { from, .. } if from.is_terminal() => {
                ErrorCode::OrderAlreadyFilled
            }
            Self::InvalidTransition { .. } => ErrorCode::InvalidParameters,
            Self::Signing(_) => ErrorCode::InvalidSignature,
            Self::Adapter(e) => e.code(),
        }
    }
}

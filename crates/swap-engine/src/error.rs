//! # Engine Errors

use swap_chains::ChainError;
use swap_orders::OrderError;
use swap_relay::RelayError;
use swap_sync::SyncError;
use swap_types::{ErrorCode, OrderId, OrderStatus};
use thiserror::Error;

/// Execution failure.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No order with the given id.
    #[error("order not found: {0}")]
    NotFound(OrderId),

    /// An execution for this order is already in flight.
    #[error("order already in execution: {0}")]
    AlreadyInExecution(OrderId),

    /// The order is not in an executable status.
    #[error("order {order_id} not executable from {status}")]
    NotExecutable {
        /// The order.
        order_id: OrderId,
        /// Its current status.
        status: OrderStatus,
    },

    /// Cross-chain execution requires an HTLC profile.
    #[error("order {0} has no HTLC profile")]
    UnsupportedToken(OrderId),

    /// The revealed secret does not match the stored hashlock.
    #[error("secret mismatch for order {0}")]
    SecretMismatch(OrderId),

    /// Refund requested before the timelock.
    #[error("timelock {timelock} not reached (now {now})")]
    TimelockNotReached {
        /// The order's timelock.
        timelock: u64,
        /// Time of the attempt.
        now: u64,
    },

    /// Order manager failure.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Relay failure.
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// State sync failure.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Chain adapter failure.
    #[error(transparent)]
    Adapter(#[from] ChainError),
}

impl EngineError {
    /// Wire-level code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::OrderNotFound,
            Self::AlreadyInExecution(_) => ErrorCode::OrderAlreadyInExecution,
            Self::NotExecutable { .. } => ErrorCode::InvalidParameters,
            Self::UnsupportedToken(_) => ErrorCode::UnsupportedToken,
            Self::SecretMismatch(_) => ErrorCode::InvalidSecret,
            Self::TimelockNotReached { .. } => ErrorCode::UnauthorizedCancellation,
            Self::Order(e) => e.code(),
            Self::Relay(e) => e.code(),
            Self::Sync(e) => e.code(),
            Self::Adapter(e) => e.code(),
        }
    }
}

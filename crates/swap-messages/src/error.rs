//! # Message Errors
//!
//! Validation and hashing failures for cross-chain messages. Each variant
//! maps to one wire-level code.

use swap_types::{ErrorCode, MessageId};
use thiserror::Error;

/// Message validation/hashing error.
#[derive(Debug, Error)]
pub enum MessageError {
    /// Structural problem: missing, malformed, or out-of-window field.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// The inclusion proof was rejected.
    #[error("invalid proof: {0}")]
    InvalidProof(String),

    /// Timelock falls outside the accepted window.
    #[error("timelock {timelock} outside [{min}, {max}]")]
    ExpiredTimelock {
        /// The rejected timelock (unix seconds).
        timelock: u64,
        /// Lower bound of the accepted window.
        min: u64,
        /// Upper bound of the accepted window.
        max: u64,
    },

    /// Not enough confirmations behind the referenced transaction.
    #[error("insufficient confirmations: {got}/{required}")]
    InsufficientConfirmations {
        /// Confirmations observed.
        got: u32,
        /// Confirmations required.
        required: u32,
    },

    /// Secret does not match the hashlock, or is not 32 bytes of hex.
    #[error("invalid secret")]
    InvalidSecret,

    /// This message id has already been accepted.
    #[error("duplicate message: {0}")]
    DuplicateMessage(MessageId),

    /// The relayer signature is not recognized.
    #[error("unauthorized relayer")]
    UnauthorizedRelayer,

    /// Bridge operations are paused.
    #[error("bridge paused")]
    BridgePaused,
}

impl MessageError {
    /// The wire-level code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidFormat(_) => ErrorCode::InvalidFormat,
            Self::InvalidProof(_) => ErrorCode::InvalidProof,
            Self::ExpiredTimelock { .. } => ErrorCode::ExpiredTimelock,
            Self::InsufficientConfirmations { .. } => ErrorCode::InsufficientConfirmations,
            Self::InvalidSecret => ErrorCode::InvalidSecret,
            Self::DuplicateMessage(_) => ErrorCode::DuplicateMessage,
            Self::UnauthorizedRelayer => ErrorCode::UnauthorizedRelayer,
            Self::BridgePaused => ErrorCode::BridgePaused,
        }
    }
}

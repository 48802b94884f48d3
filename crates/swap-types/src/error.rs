//! # Error Taxonomy
//!
//! Wire-level error codes shared by every component, and the typed error
//! callers of imperative APIs receive. Component crates define their own
//! error enums and map into these codes at the boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// How an error class propagates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Returned synchronously from the failing operation; no retry.
    Validation,
    /// Caller is not allowed to perform the operation; no retry.
    Authorization,
    /// The referenced entity is missing or in the wrong state; no retry.
    State,
    /// The operation is not supported in the current configuration.
    Capability,
    /// Recovered locally by relay retries, then elevated to FAILED.
    Transient,
    /// Permanent failure with an explicit alerting event; never retried.
    SafetyCritical,
    /// Deadline or timelock reached; drives EXPIRED/FAILED or the refund path.
    Timeout,
}

/// Wire-level error codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed or missing input fields.
    InvalidParameters,
    /// Signature did not verify.
    InvalidSignature,
    /// Order deadline has passed.
    ExpiredOrder,
    /// Message failed structural validation.
    InvalidFormat,
    /// Inclusion proof rejected.
    InvalidProof,
    /// Secret does not match the hashlock.
    InvalidSecret,
    /// Timelock outside the accepted window.
    ExpiredTimelock,
    /// Not enough chain confirmations.
    InsufficientConfirmations,
    /// Message id already seen.
    DuplicateMessage,
    /// Relayer signature not recognized.
    UnauthorizedRelayer,
    /// Caller is not the order maker.
    UnauthorizedCancellation,
    /// No order with the given id.
    OrderNotFound,
    /// Order already filled.
    OrderAlreadyFilled,
    /// An execution for this order is already in flight.
    OrderAlreadyInExecution,
    /// Token/route not supported (e.g. missing HTLC profile).
    UnsupportedToken,
    /// Bridge operations are paused.
    BridgePaused,
    /// Network-level adapter failure.
    NetworkError,
    /// Unexpected internal failure.
    InternalError,
}

impl ErrorCode {
    /// The SCREAMING_SNAKE_CASE wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidParameters => "INVALID_PARAMETERS",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::ExpiredOrder => "EXPIRED_ORDER",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::InvalidProof => "INVALID_PROOF",
            Self::InvalidSecret => "INVALID_SECRET",
            Self::ExpiredTimelock => "EXPIRED_TIMELOCK",
            Self::InsufficientConfirmations => "INSUFFICIENT_CONFIRMATIONS",
            Self::DuplicateMessage => "DUPLICATE_MESSAGE",
            Self::UnauthorizedRelayer => "UNAUTHORIZED_RELAYER",
            Self::UnauthorizedCancellation => "UNAUTHORIZED_CANCELLATION",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::OrderAlreadyFilled => "ORDER_ALREADY_FILLED",
            Self::OrderAlreadyInExecution => "ORDER_ALREADY_IN_EXECUTION",
            Self::UnsupportedToken => "UNSUPPORTED_TOKEN",
            Self::BridgePaused => "BRIDGE_PAUSED",
            Self::NetworkError => "NETWORK_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Propagation class for this code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameters
            | Self::InvalidSignature
            | Self::InvalidFormat
            | Self::InvalidProof => ErrorKind::Validation,
            Self::InvalidSecret => ErrorKind::SafetyCritical,
            Self::UnauthorizedCancellation | Self::UnauthorizedRelayer => ErrorKind::Authorization,
            Self::OrderNotFound
            | Self::OrderAlreadyFilled
            | Self::OrderAlreadyInExecution
            | Self::DuplicateMessage => ErrorKind::State,
            Self::UnsupportedToken | Self::BridgePaused => ErrorKind::Capability,
            Self::NetworkError | Self::InternalError => ErrorKind::Transient,
            Self::ExpiredOrder | Self::ExpiredTimelock | Self::InsufficientConfirmations => {
                ErrorKind::Timeout
            }
        }
    }

    /// Whether the relay may retry an operation failing with this code.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transient)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed error returned to callers of imperative coordinator APIs.
#[derive(Clone, Debug, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct CoordinatorError {
    /// Wire-level error code.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Optional structured context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CoordinatorError {
    /// Build an error with a code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attach structured context.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

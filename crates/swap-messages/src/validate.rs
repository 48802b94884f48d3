//! # Message Validation
//!
//! Structural and semantic checks for inbound and outbound messages. All
//! variants share the header checks; each body adds its own.

use crate::error::MessageError;
use crate::message::CrossChainMessage;
use swap_types::now_secs;

/// How far in the past a message timestamp may lie (seconds).
pub const MAX_MESSAGE_AGE_S: u64 = 3_600;

/// How far in the future a message timestamp may lie (seconds).
pub const MAX_CLOCK_SKEW_S: u64 = 300;

/// Timelock window relative to now.
#[derive(Clone, Copy, Debug)]
pub struct TimelockBounds {
    /// Minimum distance from now, seconds.
    pub min_s: u64,
    /// Maximum distance from now, seconds.
    pub max_s: u64,
}

impl Default for TimelockBounds {
    fn default() -> Self {
        Self {
            min_s: swap_types::config::DEFAULT_MIN_TIMELOCK_S,
            max_s: swap_types::config::DEFAULT_MAX_TIMELOCK_S,
        }
    }
}

/// Validate a message against the default timelock bounds.
pub fn validate(message: &CrossChainMessage) -> Result<(), MessageError> {
    validate_with(message, TimelockBounds::default())
}

/// Validate a message against explicit timelock bounds.
pub fn validate_with(
    message: &CrossChainMessage,
    bounds: TimelockBounds,
) -> Result<(), MessageError> {
    let now = now_secs();
    validate_header(message, now)?;

    match message {
        CrossChainMessage::EthToTonEscrow { body, .. } => {
            require_hashlock(&body.hashlock)?;
            require_positive_amount(body.amount)?;
            require_timelock(body.timelock, now, bounds)?;
            require_nonempty("sourceTxHash", body.source_tx_hash.as_str())?;
            require_nonempty("senderAddress", &body.sender_address)?;
            require_nonempty("tonRecipient", &body.ton_recipient)?;
            require_proof(&body.proof)?;
        }
        CrossChainMessage::TonToEthEscrow { body, .. } => {
            require_hashlock(&body.hashlock)?;
            require_positive_amount(body.amount)?;
            require_timelock(body.timelock, now, bounds)?;
            require_nonempty("tonTxHash", body.ton_tx_hash.as_str())?;
            require_nonempty("senderAddress", &body.sender_address)?;
            require_nonempty("ethRecipient", &body.eth_recipient)?;
            require_proof(&body.proof)?;
        }
        CrossChainMessage::Fulfillment { body, .. } => {
            require_secret(&body.secret)?;
            require_nonempty("counterpartTxHash", body.counterpart_tx_hash.as_str())?;
            require_nonempty("recipient", &body.recipient)?;
            require_proof(&body.proof)?;
        }
        CrossChainMessage::Error { body, .. } => {
            require_nonempty("originalMessageId", body.original_message_id.as_str())?;
            require_nonempty("error.message", &body.error.message)?;
        }
    }

    Ok(())
}

fn validate_header(message: &CrossChainMessage, now: u64) -> Result<(), MessageError> {
    let header = message.header();

    if header.version != swap_types::PROTOCOL_VERSION {
        return Err(MessageError::InvalidFormat(format!(
            "unsupported protocol version {:?}",
            header.version
        )));
    }
    if header.message_id.as_str().is_empty() {
        return Err(MessageError::InvalidFormat("empty messageId".into()));
    }
    if header.relayer_signature.is_empty() {
        return Err(MessageError::InvalidFormat("empty relayerSignature".into()));
    }
    if header.timestamp + MAX_MESSAGE_AGE_S < now {
        return Err(MessageError::InvalidFormat(format!(
            "stale timestamp {} (now {})",
            header.timestamp, now
        )));
    }
    if header.timestamp > now + MAX_CLOCK_SKEW_S {
        return Err(MessageError::InvalidFormat(format!(
            "future timestamp {} (now {})",
            header.timestamp, now
        )));
    }
    Ok(())
}

/// Hashlocks are stored canonically: exactly 64 lowercase hex chars.
fn require_hashlock(hashlock: &str) -> Result<(), MessageError> {
    let ok = hashlock.len() == 64
        && hashlock
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if ok {
        Ok(())
    } else {
        Err(MessageError::InvalidFormat(
            "hashlock must be 64 lowercase hex chars".into(),
        ))
    }
}

/// Revealed secrets may arrive in either case.
fn require_secret(secret: &str) -> Result<(), MessageError> {
    if secret.len() == 64 && secret.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(MessageError::InvalidSecret)
    }
}

fn require_positive_amount(amount: swap_types::Amount) -> Result<(), MessageError> {
    if amount.is_zero() {
        Err(MessageError::InvalidFormat("amount must be positive".into()))
    } else {
        Ok(())
    }
}

fn require_timelock(timelock: u64, now: u64, bounds: TimelockBounds) -> Result<(), MessageError> {
    let min = now + bounds.min_s;
    let max = now + bounds.max_s;
    if timelock < min || timelock > max {
        return Err(MessageError::ExpiredTimelock {
            timelock,
            min,
            max,
        });
    }
    Ok(())
}

fn require_nonempty(field: &str, value: &str) -> Result<(), MessageError> {
    if value.is_empty() {
        Err(MessageError::InvalidFormat(format!("empty {field}")))
    } else {
        Ok(())
    }
}

fn require_proof(proof: &str) -> Result<(), MessageError> {
    if proof.is_empty() {
        Err(MessageError::InvalidProof("empty proof".into()))
    } else {
        Ok(())
    }
}

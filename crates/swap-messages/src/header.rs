//! # Message Header
//!
//! Common envelope fields shared by every cross-chain message variant.

use serde::{Deserialize, Serialize};
use swap_types::MessageId;

/// Common header carried by every message.
///
/// The `type` discriminator itself lives on [`crate::CrossChainMessage`];
/// on the wire the header fields are flattened next to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHeader {
    /// Protocol version, `"1.0.0"`.
    pub version: String,
    /// Process-unique message id.
    pub message_id: MessageId,
    /// Creation time, unix seconds.
    pub timestamp: u64,
    /// Monotonic per-coordinator nonce.
    pub nonce: u64,
    /// Coordinator signature over the canonical hash, hex.
    pub relayer_signature: String,
}

impl MessageHeader {
    /// Build a header stamped with the current time.
    pub fn new(message_id: MessageId, nonce: u64) -> Self {
        Self {
            version: swap_types::PROTOCOL_VERSION.to_string(),
            message_id,
            timestamp: swap_types::now_secs(),
            nonce,
            relayer_signature: String::new(),
        }
    }

    /// Attach the coordinator signature.
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.relayer_signature = signature.into();
        self
    }
}

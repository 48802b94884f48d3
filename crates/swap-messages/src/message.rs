//! # Cross-Chain Messages
//!
//! The four wire variants as one tagged union. Validation lives in
//! [`crate::validate`]; this module only defines shape and accessors.

use crate::header::MessageHeader;
use serde::{Deserialize, Serialize};
use swap_types::{Amount, ChainTag, ErrorCode, MessageId, OrderId, TxId};

/// Escrow created on the EVM chain, to be mirrored on TON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EthEscrowBody {
    /// The swap order this escrow belongs to.
    pub order_id: OrderId,
    /// Escrow transaction hash on the EVM chain.
    pub source_tx_hash: TxId,
    /// Block the transaction was included in.
    pub source_block_number: u64,
    /// Log index of the escrow event within the block.
    pub source_log_index: u32,
    /// Escrow depositor on the EVM chain.
    pub sender_address: String,
    /// Recipient on TON, chain-native encoding.
    pub ton_recipient: String,
    /// Escrowed amount in minor units.
    pub amount: Amount,
    /// ERC-20 token address; `None` for the native asset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_address: Option<String>,
    /// Jetton master on TON; `None` for the native asset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jetton_master: Option<String>,
    /// SHA-256 hashlock, 64 lowercase hex chars.
    pub hashlock: String,
    /// Absolute refund deadline, unix seconds.
    pub timelock: u64,
    /// Opaque inclusion proof consumed by the on-chain verifier.
    pub proof: String,
}

/// Escrow created on TON, to be mirrored on the EVM chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TonEscrowBody {
    /// The swap order this escrow belongs to.
    pub order_id: OrderId,
    /// Escrow transaction hash on TON.
    pub ton_tx_hash: TxId,
    /// Logical time of the TON transaction.
    pub ton_logical_time: u64,
    /// Masterchain block seqno the transaction was included in.
    pub ton_block_seqno: u64,
    /// Escrow depositor on TON, chain-native encoding.
    pub sender_address: String,
    /// Recipient on the EVM chain.
    pub eth_recipient: String,
    /// Escrowed amount in minor units.
    pub amount: Amount,
    /// Jetton master on TON; `None` for the native asset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jetton_master: Option<String>,
    /// ERC-20 token address on the EVM side; `None` for the native asset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_address: Option<String>,
    /// SHA-256 hashlock, 64 lowercase hex chars.
    pub hashlock: String,
    /// Absolute refund deadline, unix seconds.
    pub timelock: u64,
    /// Opaque proof bundle for the TON-side inclusion.
    pub proof: String,
}

/// Secret reveal after a destination-side claim, either direction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentBody {
    /// The swap order being fulfilled.
    pub order_id: OrderId,
    /// Revealed preimage of the hashlock, 64 hex chars.
    pub secret: String,
    /// Claim transaction on the counterpart chain.
    pub counterpart_tx_hash: TxId,
    /// Recipient on the counterpart chain.
    pub recipient: String,
    /// Opaque inclusion proof of the counterpart fulfillment.
    pub proof: String,
}

/// Error payload carried by [`CrossChainMessage::Error`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireError {
    /// Wire-level error code.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Optional structured context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response referencing a previously received message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// The message that failed.
    pub original_message_id: MessageId,
    /// What went wrong.
    pub error: WireError,
}

/// A cross-chain message: common header plus one of four bodies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CrossChainMessage {
    /// EVM-side escrow announcement (src→dst direction).
    #[serde(rename = "ETH_TO_TON_ESCROW")]
    EthToTonEscrow {
        /// Common header.
        #[serde(flatten)]
        header: MessageHeader,
        /// Escrow details.
        #[serde(flatten)]
        body: EthEscrowBody,
    },

    /// TON-side escrow announcement (dst→src direction).
    #[serde(rename = "TON_TO_ETH_ESCROW")]
    TonToEthEscrow {
        /// Common header.
        #[serde(flatten)]
        header: MessageHeader,
        /// Escrow details.
        #[serde(flatten)]
        body: TonEscrowBody,
    },

    /// Secret reveal, either direction.
    #[serde(rename = "FULFILLMENT")]
    Fulfillment {
        /// Common header.
        #[serde(flatten)]
        header: MessageHeader,
        /// Fulfillment details.
        #[serde(flatten)]
        body: FulfillmentBody,
    },

    /// Error response.
    #[serde(rename = "ERROR")]
    Error {
        /// Common header.
        #[serde(flatten)]
        header: MessageHeader,
        /// Error details.
        #[serde(flatten)]
        body: ErrorBody,
    },
}

impl CrossChainMessage {
    /// The wire discriminator.
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::EthToTonEscrow { .. } => "ETH_TO_TON_ESCROW",
            Self::TonToEthEscrow { .. } => "TON_TO_ETH_ESCROW",
            Self::Fulfillment { .. } => "FULFILLMENT",
            Self::Error { .. } => "ERROR",
        }
    }

    /// Borrow the common header.
    pub fn header(&self) -> &MessageHeader {
        match self {
            Self::EthToTonEscrow { header, .. }
            | Self::TonToEthEscrow { header, .. }
            | Self::Fulfillment { header, .. }
            | Self::Error { header, .. } => header,
        }
    }

    /// Mutably borrow the common header.
    pub fn header_mut(&mut self) -> &mut MessageHeader {
        match self {
            Self::EthToTonEscrow { header, .. }
            | Self::TonToEthEscrow { header, .. }
            | Self::Fulfillment { header, .. }
            | Self::Error { header, .. } => header,
        }
    }

    /// The message id.
    pub fn message_id(&self) -> &MessageId {
        &self.header().message_id
    }

    /// The order this message concerns, when it names one.
    pub fn order_id(&self) -> Option<&OrderId> {
        match self {
            Self::EthToTonEscrow { body, .. } => Some(&body.order_id),
            Self::TonToEthEscrow { body, .. } => Some(&body.order_id),
            Self::Fulfillment { body, .. } => Some(&body.order_id),
            Self::Error { .. } => None,
        }
    }

    /// The chain that originated this message's referenced transaction.
    pub fn origin_chain(&self) -> Option<ChainTag> {
        match self {
            Self::EthToTonEscrow { .. } => Some(ChainTag::Ethereum),
            Self::TonToEthEscrow { .. } => Some(ChainTag::Ton),
            Self::Fulfillment { .. } | Self::Error { .. } => None,
        }
    }
}

//! # Orders
//!
//! An order is an intent plus a salt, a discriminator, and (for cross-chain
//! orders) an HTLC profile. Order ids are keccak-256 over the identity
//! fields, giving EVM-shaped identifiers.

use crate::intent::{SwapIntent, TonDestination};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use swap_types::{parse_evm_address, Amount, OrderId, SwapDirection};

/// Order discriminator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Both legs settle on the source chain's book.
    Local,
    /// Cross-chain swap in the given direction.
    CrossChain(SwapDirection),
}

impl OrderKind {
    /// Classify an intent: a destination makes it cross-chain, and the
    /// maker's address encoding picks the direction.
    pub fn classify(intent: &SwapIntent) -> Self {
        match &intent.destination {
            None => Self::Local,
            Some(_) => {
                if parse_evm_address(&intent.maker).is_some() {
                    Self::CrossChain(SwapDirection::EthToTon)
                } else {
                    Self::CrossChain(SwapDirection::TonToEth)
                }
            }
        }
    }

    /// The swap direction, for cross-chain orders.
    pub fn direction(&self) -> Option<SwapDirection> {
        match self {
            Self::Local => None,
            Self::CrossChain(direction) => Some(*direction),
        }
    }
}

/// HTLC parameters attached to a cross-chain order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtlcProfile {
    /// SHA-256 hashlock, 64 lowercase hex chars.
    pub hashlock: String,
    /// Absolute refund deadline, unix seconds.
    pub timelock: u64,
    /// Relayer fee, minor units.
    pub relayer_fee: Amount,
}

/// A constructed (not yet signed) order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// keccak-256 identity digest, 0x-prefixed.
    pub order_id: OrderId,
    /// Maker address.
    pub maker: String,
    /// Receiver of the taker asset.
    pub receiver: String,
    /// Asset the maker gives.
    pub maker_asset: String,
    /// Asset the maker wants.
    pub taker_asset: String,
    /// Amount given, minor units.
    pub maker_amount: Amount,
    /// Amount wanted, minor units.
    pub taker_amount: Amount,
    /// 256-bit salt.
    pub salt: [u8; 32],
    /// Absolute deadline, unix seconds.
    pub deadline: u64,
    /// Discriminator.
    pub kind: OrderKind,
    /// Destination details for cross-chain orders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<TonDestination>,
    /// HTLC profile for cross-chain orders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub htlc: Option<HtlcProfile>,
    /// Unix millis the order was constructed.
    pub created_at: u64,
}

impl Order {
    /// Price expressed as taker amount per unit of maker amount.
    pub fn price(&self) -> f64 {
        let maker = self.maker_amount.as_f64_lossy();
        if maker == 0.0 {
            return f64::MAX;
        }
        self.taker_amount.as_f64_lossy() / maker
    }

    /// Whether the deadline has passed.
    pub fn is_expired(&self, now_secs: u64) -> bool {
        self.deadline < now_secs
    }
}

/// Derive an order id: `keccak256(lowercase(maker) ‖ salt ‖ deadline_be)`.
pub fn derive_order_id(maker: &str, salt: &[u8; 32], deadline: u64) -> OrderId {
    let mut hasher = Keccak256::new();
    hasher.update(maker.to_ascii_lowercase().as_bytes());
    hasher.update(salt);
    hasher.update(deadline.to_be_bytes());
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    OrderId::from_digest(out)
}

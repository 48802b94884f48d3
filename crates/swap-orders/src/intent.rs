//! # Swap Intents
//!
//! The external submitter's input: what to trade, for how much, until when,
//! and optionally where on the other chain the proceeds should land.

use serde::{Deserialize, Serialize};
use swap_types::Amount;

/// Destination details for a cross-chain intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TonDestination {
    /// Recipient on the destination chain, chain-native encoding.
    pub recipient: String,
    /// Destination chain id.
    pub chain_id: u64,
    /// Jetton master for token swaps; `None` for the native asset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jetton_master: Option<String>,
    /// Relayer fee hint in minor units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relayer_fee: Option<Amount>,
}

/// A swap intent as submitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapIntent {
    /// Maker address, chain-specific encoding.
    pub maker: String,
    /// Receiver of the taker asset; often equals the maker.
    pub receiver: String,
    /// Asset the maker gives.
    pub maker_asset: String,
    /// Asset the maker wants.
    pub taker_asset: String,
    /// Amount given, minor units.
    pub maker_amount: Amount,
    /// Amount wanted, minor units.
    pub taker_amount: Amount,
    /// Absolute deadline, unix seconds.
    pub deadline: u64,
    /// Present for cross-chain intents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<TonDestination>,
    /// Salt override; random when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<[u8; 32]>,
}

//! # Chain Primitives
//!
//! The two chains the coordinator bridges, opaque transaction identifiers,
//! and EVM address parsing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The chains the coordinator bridges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainTag {
    /// EVM-compatible chain (Ethereum).
    Ethereum,
    /// Message-based chain (TON).
    Ton,
}

impl ChainTag {
    /// The counterpart chain.
    pub fn other(&self) -> Self {
        match self {
            Self::Ethereum => Self::Ton,
            Self::Ton => Self::Ethereum,
        }
    }

    /// Short lowercase name, matching the wire encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::Ton => "ton",
        }
    }
}

impl fmt::Display for ChainTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a cross-chain swap. The EVM chain is the protocol's source
/// side, TON its destination side; the direction says where the maker's
/// funds start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapDirection {
    /// Maker escrows on Ethereum, receives on TON.
    EthToTon,
    /// Maker escrows on TON, receives on Ethereum.
    TonToEth,
}

impl SwapDirection {
    /// Chain the maker's escrow is placed on.
    pub fn escrow_chain(&self) -> ChainTag {
        match self {
            Self::EthToTon => ChainTag::Ethereum,
            Self::TonToEth => ChainTag::Ton,
        }
    }

    /// Chain the maker receives on.
    pub fn claim_chain(&self) -> ChainTag {
        self.escrow_chain().other()
    }
}

impl fmt::Display for SwapDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EthToTon => f.write_str("eth_to_ton"),
            Self::TonToEth => f.write_str("ton_to_eth"),
        }
    }
}

/// Opaque transaction identifier returned by a chain adapter.
///
/// EVM adapters return 0x-prefixed hashes; TON adapters return the message
/// hash in hex. The coordinator never interprets the contents.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(String);

impl TxId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TxId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Parse a 0x-prefixed (or bare) 40-hex-char EVM address into its 20 bytes.
pub fn parse_evm_address(s: &str) -> Option<[u8; 20]> {
    let raw = s.strip_prefix("0x").unwrap_or(s);
    if raw.len() != 40 {
        return None;
    }
    let bytes = hex::decode(raw).ok()?;
    let mut out = [0u8; 20];
    out.copy_from_slice(&bytes);
    Some(out)
}

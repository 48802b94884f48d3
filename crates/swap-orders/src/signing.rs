//! # Typed-Data Signing
//!
//! EIP-712 encoding of orders and secp256k1 recoverable signatures. The
//! schema is fixed: field order and types never change, and the destination
//! struct is hashed (zeroed) even for local-only orders so the digest shape
//! is stable.

use crate::error::OrderError;
use crate::order::Order;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use swap_types::{parse_evm_address, Amount, CrossChainId, OrderId};

/// Signing domain name.
pub const DOMAIN_NAME: &str = "1inch Fusion+ TON Extension";

/// Signing domain version.
pub const DOMAIN_VERSION: &str = "1.0.0";

const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

const ORDER_TYPE: &str = "Order(address maker,address receiver,address makerAsset,address takerAsset,uint256 makerAmount,uint256 takerAmount,uint256 salt,uint256 deadline,bytes32 extension,bytes32 interactions,TonDestination tonDestination)";

const TON_DESTINATION_TYPE: &str = "TonDestination(string tonRecipient,string jettonMaster,uint256 tonChainId,bytes32 hashlock,uint256 timelock,uint256 relayerFee)";

/// EIP-712 signing domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningDomain {
    /// Domain name.
    pub name: String,
    /// Domain version.
    pub version: String,
    /// Chain id.
    pub chain_id: u64,
    /// Verifying contract address.
    pub verifying_contract: String,
}

impl SigningDomain {
    /// The coordinator's domain over a chain id and contract.
    pub fn new(chain_id: u64, verifying_contract: impl Into<String>) -> Self {
        Self {
            name: DOMAIN_NAME.to_string(),
            version: DOMAIN_VERSION.to_string(),
            chain_id,
            verifying_contract: verifying_contract.into(),
        }
    }

    /// `keccak256(typehash ‖ hash(name) ‖ hash(version) ‖ chainId ‖ contract)`.
    pub fn separator(&self) -> [u8; 32] {
        let mut hasher = Keccak256::new();
        hasher.update(keccak(DOMAIN_TYPE.as_bytes()));
        hasher.update(keccak(self.name.as_bytes()));
        hasher.update(keccak(self.version.as_bytes()));
        hasher.update(uint_word(self.chain_id));
        hasher.update(address_word(&self.verifying_contract));
        finish(hasher)
    }
}

/// An order with its signature and typed-data digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedOrder {
    /// The signed order.
    pub order: Order,
    /// 65-byte r‖s‖v signature, 0x-prefixed hex.
    pub signature: String,
    /// EIP-712 digest, 0x-prefixed hex. This is the canonical order hash.
    pub order_hash: String,
    /// Correlation id, assigned only to cross-chain orders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_chain_id: Option<CrossChainId>,
}

impl SignedOrder {
    /// The order's id.
    pub fn order_id(&self) -> &OrderId {
        &self.order.order_id
    }
}

/// Something that can sign 32-byte digests.
pub trait Signer: Send + Sync {
    /// The signer's EVM address, 0x-prefixed lowercase hex.
    fn address(&self) -> String;

    /// Sign a digest; returns a 65-byte r‖s‖v hex signature.
    fn sign_digest(&self, digest: [u8; 32]) -> Result<String, OrderError>;
}

/// In-process secp256k1 signer.
pub struct LocalSigner {
    key: SigningKey,
}

impl LocalSigner {
    /// Build from a 32-byte private key.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, OrderError> {
        let key = SigningKey::from_slice(bytes)
            .map_err(|e| OrderError::Signing(format!("invalid key: {e}")))?;
        Ok(Self { key })
    }

    /// Fresh random key (tests and local runs).
    pub fn random() -> Self {
        Self {
            key: SigningKey::random(&mut rand::thread_rng()),
        }
    }
}

impl Signer for LocalSigner {
    fn address(&self) -> String {
        verifying_key_address(self.key.verifying_key())
    }

    fn sign_digest(&self, digest: [u8; 32]) -> Result<String, OrderError> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(&digest)
            .map_err(|e| OrderError::Signing(e.to_string()))?;
        let bytes = signature.to_bytes();
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(bytes.as_slice());
        out[64] = 27 + recovery_id.to_byte();
        Ok(format!("0x{}", hex::encode(out)))
    }
}

/// Recover the signing address from a digest and a 65-byte hex signature.
pub fn recover_signer(digest: [u8; 32], signature_hex: &str) -> Option<String> {
    let raw = hex::decode(signature_hex.strip_prefix("0x").unwrap_or(signature_hex)).ok()?;
    if raw.len() != 65 {
        return None;
    }
    let signature = Signature::from_slice(&raw[..64]).ok()?;
    let recovery_id = RecoveryId::from_byte(raw[64].checked_sub(27)?)?;
    let key = VerifyingKey::recover_from_prehash(&digest, &signature, recovery_id).ok()?;
    Some(verifying_key_address(&key))
}

/// The EIP-712 signing digest for an order under a domain.
pub fn order_digest(order: &Order, domain: &SigningDomain) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update([0x19, 0x01]);
    hasher.update(domain.separator());
    hasher.update(order_struct_hash(order));
    finish(hasher)
}

/// `keccak256(typehash ‖ encoded fields)`, destination struct included.
pub fn order_struct_hash(order: &Order) -> [u8; 32] {
    let type_hash = keccak(format!("{ORDER_TYPE}{TON_DESTINATION_TYPE}").as_bytes());

    let mut hasher = Keccak256::new();
    hasher.update(type_hash);
    hasher.update(address_word(&order.maker));
    hasher.update(address_word(&order.receiver));
    hasher.update(address_word(&order.maker_asset));
    hasher.update(address_word(&order.taker_asset));
    hasher.update(amount_word(order.maker_amount));
    hasher.update(amount_word(order.taker_amount));
    hasher.update(order.salt);
    hasher.update(uint_word(order.deadline));
    hasher.update([0u8; 32]); // extension: unused, zeroed
    hasher.update([0u8; 32]); // interactions: unused, zeroed
    hasher.update(destination_struct_hash(order));
    finish(hasher)
}

/// Destination struct hash. Local-only orders hash the zeroed struct so the
/// outer schema never changes shape.
fn destination_struct_hash(order: &Order) -> [u8; 32] {
    let recipient = order
        .destination
        .as_ref()
        .map(|d| d.recipient.as_str())
        .unwrap_or_default();
    let jetton_master = order
        .destination
        .as_ref()
        .and_then(|d| d.jetton_master.as_deref())
        .unwrap_or_default();
    let chain_id = order
        .destination
        .as_ref()
        .map(|d| d.chain_id)
        .unwrap_or_default();
    let hashlock = order
        .htlc
        .as_ref()
        .and_then(|h| bytes32_from_hex(&h.hashlock))
        .unwrap_or_default();
    let timelock = order.htlc.as_ref().map(|h| h.timelock).unwrap_or_default();
    let relayer_fee = order
        .htlc
        .as_ref()
        .map(|h| h.relayer_fee)
        .unwrap_or(Amount::ZERO);

    let mut hasher = Keccak256::new();
    hasher.update(keccak(TON_DESTINATION_TYPE.as_bytes()));
    hasher.update(keccak(recipient.as_bytes()));
    hasher.update(keccak(jetton_master.as_bytes()));
    hasher.update(uint_word(chain_id));
    hasher.update(hashlock);
    hasher.update(uint_word(timelock));
    hasher.update(amount_word(relayer_fee));
    finish(hasher)
}

fn keccak(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(bytes);
    finish(hasher)
}

fn finish(hasher: Keccak256) -> [u8; 32] {
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// A `uint256` word from a u64.
fn uint_word(value: u64) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[24..].copy_from_slice(&value.to_be_bytes());
    out
}

/// A `uint256` word from an amount.
fn amount_word(amount: Amount) -> [u8; 32] {
    let mut out = [0u8; 32];
    amount.raw().to_big_endian(&mut out);
    out
}

/// An `address` word. Non-EVM identifiers (TON addresses, asset labels) are
/// mapped through keccak to a stable 20-byte surrogate.
fn address_word(value: &str) -> [u8; 32] {
    let bytes = parse_evm_address(value).unwrap_or_else(|| {
        let digest = keccak(value.as_bytes());
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest[12..]);
        out
    });
    let mut out = [0u8; 32];
    out[12..].copy_from_slice(&bytes);
    out
}

fn bytes32_from_hex(s: &str) -> Option<[u8; 32]> {
    let raw = hex::decode(s).ok()?;
    if raw.len() != 32 {
        return None;
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&raw);
    Some(out)
}

/// Address of a verifying key: `keccak256(uncompressed pubkey)[12..]`.
fn verifying_key_address(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    let digest = keccak(&point.as_bytes()[1..]);
    format!("0x{}", hex::encode(&digest[12..]))
}

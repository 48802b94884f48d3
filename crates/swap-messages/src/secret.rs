//! # Secrets and Hashlocks
//!
//! SHA-256 hashlocks over 32-byte secrets. The secret wrapper zeroizes its
//! memory on drop and never prints its contents; secrets leave the process
//! only on intentional reveal.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A 32-byte HTLC secret, zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes {
    inner: [u8; 32],
}

impl SecretBytes {
    /// Wrap raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self { inner: bytes }
    }

    /// Parse from 64 hex chars, either case.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 64 {
            return None;
        }
        let bytes = hex::decode(s).ok()?;
        let mut inner = [0u8; 32];
        inner.copy_from_slice(&bytes);
        Some(Self { inner })
    }

    /// Borrow the secret bytes. Use immediately; do not hold the reference.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.inner
    }

    /// Lowercase hex rendering, for intentional reveal only.
    pub fn to_hex(&self) -> String {
        hex::encode(self.inner)
    }

    /// The SHA-256 hashlock of this secret.
    pub fn hashlock(&self) -> [u8; 32] {
        hashlock(&self.inner)
    }
}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the actual secret.
        f.write_str("SecretBytes(***)")
    }
}

impl Serialize for SecretBytes {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SecretBytes {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).ok_or_else(|| serde::de::Error::custom("invalid secret length"))
    }
}

/// Generate a fresh random secret.
pub fn generate_secret() -> SecretBytes {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    SecretBytes::new(bytes)
}

/// SHA-256 hashlock of arbitrary secret bytes.
pub fn hashlock(secret: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(secret);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// SHA-256 hashlock as lowercase hex, the canonical storage form.
pub fn hashlock_hex(secret: &[u8]) -> String {
    hex::encode(hashlock(secret))
}

/// Verify a revealed secret (hex) against a hashlock (hex).
///
/// Hashlock comparison is case-insensitive; malformed inputs fail closed.
pub fn verify_secret(secret_hex: &str, hashlock_hex_str: &str) -> bool {
    let Some(secret) = SecretBytes::from_hex(secret_hex) else {
        return false;
    };
    if hashlock_hex_str.len() != 64 {
        return false;
    }
    hashlock_hex(secret.as_bytes()) == hashlock_hex_str.to_ascii_lowercase()
}

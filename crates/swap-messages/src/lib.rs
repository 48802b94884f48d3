//! # Swap Messages
//!
//! The cross-chain message vocabulary and its supporting cryptography:
//!
//! - [`CrossChainMessage`]: tagged union of the four wire variants
//!   (escrow in each direction, fulfillment, error)
//! - [`validate`]: structural and semantic validation
//! - [`canonical_hash`]: SHA-256 over a sorted-key canonical rendering,
//!   stable across implementations
//! - [`SecretBytes`] and the hashlock helpers: SHA-256 hashlocks over
//!   32-byte secrets, zeroized on drop
//!
//! The wire format is self-describing JSON with camelCase fields; the
//! `type` tag selects the variant.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod canonical;
pub mod error;
pub mod header;
pub mod message;
pub mod secret;
pub mod validate;

pub use canonical::canonical_hash;
pub use error::MessageError;
pub use header::MessageHeader;
pub use message::{
    CrossChainMessage, ErrorBody, EthEscrowBody, FulfillmentBody, TonEscrowBody, WireError,
};
pub use secret::{generate_secret, hashlock, hashlock_hex, verify_secret, SecretBytes};
pub use validate::{validate, validate_with, TimelockBounds};

/// Generate a process-unique message id with the given prefix.
pub fn new_message_id(prefix: &str) -> swap_types::MessageId {
    swap_types::MessageId::generate(prefix)
}

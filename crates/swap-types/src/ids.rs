//! # Identifiers
//!
//! Newtypes for the ids that flow between components, plus the shared
//! `{prefix}_{unix_millis}_{random}` generator used for message and
//! cross-chain correlation ids.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Alphabet for the random suffix of generated ids.
const ALNUM: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of the random suffix.
const SUFFIX_LEN: usize = 8;

/// Last millisecond value handed out, used to keep generated ids unique
/// within the process even when the clock does not advance between calls.
static LAST_MILLIS: AtomicU64 = AtomicU64::new(0);

/// Guards the monotonic bump so two callers cannot observe the same value.
static GEN_LOCK: Mutex<()> = Mutex::new(());

/// Generate a `"{prefix}_{unix_millis}_{random alnum}"` id.
///
/// The millisecond component is bumped monotonically if the clock stalls,
/// so ids are unique within the process.
pub fn tagged_id(prefix: &str) -> String {
    use rand::Rng;

    let _guard = GEN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let now = crate::time::now_millis();
    let last = LAST_MILLIS.load(Ordering::Relaxed);
    let millis = if now > last { now } else { last + 1 };
    LAST_MILLIS.store(millis, Ordering::Relaxed);

    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALNUM[rng.gen_range(0..ALNUM.len())] as char)
        .collect();

    format!("{prefix}_{millis}_{suffix}")
}

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing id string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id! {
    /// Order identifier: lowercase 0x-prefixed keccak-256 digest of the
    /// order's identity fields.
    OrderId
}

string_id! {
    /// Cross-chain message identifier (`msg_…`).
    MessageId
}

string_id! {
    /// Correlation id linking a signed cross-chain order to its messages
    /// and tracked state (`cc_…`).
    CrossChainId
}

string_id! {
    /// Relay queue entry identifier (`q_…`).
    QueuedId
}

impl OrderId {
    /// Build an order id from a 32-byte digest.
    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self(format!("0x{}", hex::encode(digest)))
    }
}

impl MessageId {
    /// Generate a fresh message id.
    pub fn generate(prefix: &str) -> Self {
        Self(tagged_id(prefix))
    }
}

impl CrossChainId {
    /// Generate a fresh cross-chain correlation id.
    pub fn generate() -> Self {
        Self(tagged_id("cc"))
    }
}

impl QueuedId {
    /// Generate a fresh queue entry id.
    pub fn generate() -> Self {
        Self(tagged_id("q"))
    }
}

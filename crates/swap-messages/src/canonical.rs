//! # Canonical Hashing
//!
//! Deterministic SHA-256 digest of a message, independent of field order in
//! the input representation. The signature field is excluded so the digest
//! is what the coordinator signs.

use crate::error::MessageError;
use crate::message::CrossChainMessage;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Wire name of the signature field excluded from hashing.
const SIGNATURE_FIELD: &str = "relayerSignature";

/// Canonical SHA-256 digest of a message, signature excluded.
///
/// The message is rendered with lexicographically sorted keys at every
/// nesting level, then hashed. Two representations of the same message
/// always produce the same digest.
pub fn canonical_hash(message: &CrossChainMessage) -> Result<[u8; 32], MessageError> {
    let mut value = serde_json::to_value(message)
        .map_err(|e| MessageError::InvalidFormat(format!("serialization failed: {e}")))?;
    if let Value::Object(map) = &mut value {
        map.remove(SIGNATURE_FIELD);
    }
    Ok(hash_value(&value))
}

/// Canonical digest of an arbitrary JSON value (used by tests and by the
/// adapters when hashing chain payloads).
pub fn hash_value(value: &Value) -> [u8; 32] {
    let mut rendered = String::new();
    write_canonical(value, &mut rendered);

    let mut hasher = Sha256::new();
    hasher.update(rendered.as_bytes());
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Render a JSON value deterministically: object keys sorted, no
/// insignificant whitespace.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => {
            // serde_json string escaping is deterministic.
            out.push_str(&serde_json::to_string(s).unwrap_or_default());
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key).unwrap_or_default());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::MessageHeader;
    use crate::message::{EthEscrowBody, FulfillmentBody};
    use swap_types::{Amount, MessageId, OrderId, TxId};

    fn message() -> CrossChainMessage {
        CrossChainMessage::EthToTonEscrow {
            header: MessageHeader::new(MessageId::new("msg_1_abcdefgh"), 4)
                .with_signature("0xsig"),
            body: EthEscrowBody {
                order_id: OrderId::new("0x1234"),
                source_tx_hash: TxId::new("0xaa"),
                source_block_number: 19_000_000,
                source_log_index: 3,
                sender_address: "0x742d35cc6634c0532925a3b844bc454e4438f44e".into(),
                ton_recipient: "EQCD39VS5jcptHL8vMjEXrzGaRcCVYto7HUn4bpAOg8xqB2N".into(),
                amount: Amount::from_u64(1_000_000),
                token_address: None,
                jetton_master: None,
                hashlock: "a".repeat(64),
                timelock: 2_000_000_000,
                proof: "deadbeef".into(),
            },
        }
    }

    #[test]
    fn test_stable_across_field_reordering() {
        // Same message decoded from JSON with fields in a different order.
        let direct = message();
        let json = serde_json::to_value(&direct).unwrap();
        let mut scrambled = String::from("{");
        let obj = json.as_object().unwrap();
        let mut keys: Vec<&String> = obj.keys().collect();
        keys.reverse();
        for (i, key) in keys.iter().enumerate() {
            if i > 0 {
                scrambled.push(',');
            }
            scrambled.push_str(&format!(
                "{}:{}",
                serde_json::to_string(key).unwrap(),
                serde_json::to_string(&obj[*key]).unwrap()
            ));
        }
        scrambled.push('}');
        let reordered: CrossChainMessage = serde_json::from_str(&scrambled).unwrap();

        assert_eq!(
            canonical_hash(&direct).unwrap(),
            canonical_hash(&reordered).unwrap()
        );
    }

    #[test]
    fn test_signature_excluded() {
        let unsigned = message();
        let mut signed = unsigned.clone();
        signed.header_mut().relayer_signature = "0xother".into();
        assert_eq!(
            canonical_hash(&unsigned).unwrap(),
            canonical_hash(&signed).unwrap()
        );
    }

    #[test]
    fn test_body_change_changes_hash() {
        let a = message();
        let mut b = a.clone();
        if let CrossChainMessage::EthToTonEscrow { body, .. } = &mut b {
            body.timelock += 1;
        }
        assert_ne!(canonical_hash(&a).unwrap(), canonical_hash(&b).unwrap());
    }

    #[test]
    fn test_variant_tag_hashed() {
        let escrow = message();
        let fulfillment = CrossChainMessage::Fulfillment {
            header: escrow.header().clone(),
            body: FulfillmentBody {
                order_id: OrderId::new("0x1234"),
                secret: "b".repeat(64),
                counterpart_tx_hash: TxId::new("0xbb"),
                recipient: "0x742d35cc6634c0532925a3b844bc454e4438f44e".into(),
                proof: "deadbeef".into(),
            },
        };
        assert_ne!(
            canonical_hash(&escrow).unwrap(),
            canonical_hash(&fulfillment).unwrap()
        );
    }

    #[test]
    fn test_nested_objects_sorted() {
        let a = serde_json::json!({"b": {"y": 1, "x": 2}, "a": 3});
        let b = serde_json::json!({"a": 3, "b": {"x": 2, "y": 1}});
        assert_eq!(hash_value(&a), hash_value(&b));
    }
}

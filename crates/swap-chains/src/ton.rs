//! # TON Adapter
//!
//! Mirror of the EVM adapter for the message-based side. Positions are
//! logical times, inclusion is a found-and-not-aborted transaction, and
//! confirmations count masterchain blocks behind the inclusion seqno.

use crate::adapter::{
    ChainAdapter, ChainError, ChainEvent, EscrowParams, EventBatch, EventCursor, RefundParams,
    TradeParams,
};
use crate::transport::RpcTransport;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use swap_messages::CrossChainMessage;
use swap_types::{Amount, ChainTag, OrderId, TxId};
use tracing::debug;

/// Adapter for the TON side of the bridge.
pub struct TonAdapter {
    transport: Arc<dyn RpcTransport>,
    /// Bridge contract address submissions are directed to.
    bridge_address: String,
}

impl TonAdapter {
    /// Create an adapter over a transport.
    pub fn new(transport: Arc<dyn RpcTransport>, bridge_address: impl Into<String>) -> Self {
        Self {
            transport,
            bridge_address: bridge_address.into(),
        }
    }

    fn err_invalid(&self, detail: impl Into<String>) -> ChainError {
        ChainError::InvalidResponse {
            chain: ChainTag::Ton,
            detail: detail.into(),
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        self.transport
            .call(method, params)
            .await
            .map_err(|source| ChainError::Transport {
                chain: ChainTag::Ton,
                source,
            })
    }

    async fn transaction(&self, tx: &TxId) -> Result<Option<Value>, ChainError> {
        let result = self
            .call(
                "getTransaction",
                json!({ "address": self.bridge_address, "hash": tx.as_str() }),
            )
            .await?;
        Ok(if result.is_null() { None } else { Some(result) })
    }

    /// Send a message body to the bridge contract; returns the message hash.
    async fn send_to_bridge(&self, payload: Value) -> Result<TxId, ChainError> {
        let boc = hex::encode(payload.to_string().as_bytes());
        let result = self
            .call(
                "sendBoc",
                json!({ "address": self.bridge_address, "boc": boc }),
            )
            .await?;
        let hash = result["hash"]
            .as_str()
            .ok_or_else(|| self.err_invalid("sendBoc response without hash"))?;
        Ok(TxId::new(hash))
    }
}

#[async_trait]
impl ChainAdapter for TonAdapter {
    fn chain(&self) -> ChainTag {
        ChainTag::Ton
    }

    async fn submit(&self, message: &CrossChainMessage) -> Result<TxId, ChainError> {
        debug!(
            message_id = %message.message_id(),
            message_type = message.message_type(),
            "submitting message to bridge"
        );
        let payload = serde_json::to_value(message)
            .map_err(|e| self.err_invalid(format!("unencodable message: {e}")))?;
        self.send_to_bridge(json!({ "op": "relay_message", "message": payload }))
            .await
    }

    async fn verify(&self, tx: &TxId) -> Result<bool, ChainError> {
        match self.transaction(tx).await? {
            None => Ok(false),
            Some(transaction) => Ok(transaction["aborted"].as_bool() == Some(false)),
        }
    }

    async fn confirmations(&self, tx: &TxId) -> Result<u32, ChainError> {
        let Some(transaction) = self.transaction(tx).await? else {
            return Ok(0);
        };
        let included = transaction["blockSeqno"]
            .as_u64()
            .ok_or_else(|| self.err_invalid("transaction without blockSeqno"))?;
        let info = self.call("getMasterchainInfo", json!({})).await?;
        let latest = info["last"]["seqno"]
            .as_u64()
            .ok_or_else(|| self.err_invalid("masterchain info without seqno"))?;
        Ok(latest.saturating_sub(included).saturating_add(1) as u32)
    }

    async fn poll_since(&self, cursor: &EventCursor) -> Result<EventBatch, ChainError> {
        let result = self
            .call(
                "getBridgeEvents",
                json!({ "address": self.bridge_address, "fromLt": cursor.position }),
            )
            .await?;
        let entries = result
            .as_array()
            .ok_or_else(|| self.err_invalid("getBridgeEvents did not return an array"))?;

        let mut events = Vec::new();
        let mut next = *cursor;
        for entry in entries {
            let event = decode_entry(entry).ok_or_else(|| self.err_invalid("undecodable event"))?;
            if event.cursor() <= *cursor {
                continue;
            }
            if event.cursor() > next {
                next = event.cursor();
            }
            events.push(event);
        }
        Ok(EventBatch {
            events,
            next_cursor: next,
        })
    }

    async fn gas_price(&self) -> Result<Amount, ChainError> {
        let result = self
            .call("estimateFee", json!({ "address": self.bridge_address }))
            .await?;
        let fee = result["fee"]
            .as_str()
            .and_then(Amount::from_dec_str)
            .ok_or_else(|| self.err_invalid("estimateFee without decimal fee"))?;
        Ok(fee)
    }

    async fn place_escrow(&self, params: &EscrowParams) -> Result<TxId, ChainError> {
        debug!(order_id = %params.order_id, amount = %params.amount, "placing escrow");
        self.send_to_bridge(json!({
            "op": "create_escrow",
            "orderId": params.order_id,
            "sender": params.sender,
            "recipient": params.recipient,
            "amount": params.amount,
            "jettonMaster": params.token,
            "hashlock": params.hashlock,
            "timelock": params.timelock,
        }))
        .await
    }

    async fn settle_trade(&self, params: &TradeParams) -> Result<TxId, ChainError> {
        self.send_to_bridge(json!({
            "op": "settle_trade",
            "orderId": params.order_id,
            "counterOrderId": params.counter_order_id,
            "amount": params.matched_amount,
        }))
        .await
    }

    async fn refund(&self, params: &RefundParams) -> Result<TxId, ChainError> {
        debug!(order_id = %params.order_id, "submitting refund");
        self.send_to_bridge(json!({
            "op": "refund_escrow",
            "orderId": params.order_id,
            "escrowTx": params.escrow_tx,
            "recipient": params.recipient,
        }))
        .await
    }
}

/// Decode one bridge event entry.
///
/// Expected shape:
/// ```json
/// {
///   "txHash": "abc…",
///   "lt": 41234567000001,
///   "event": { "kind": "escrow_created", "orderId": "0x..", "amount": "1", "hashlock": ".." }
/// }
/// ```
fn decode_entry(entry: &Value) -> Option<ChainEvent> {
    let tx = TxId::new(entry["txHash"].as_str()?);
    let cursor = EventCursor {
        position: entry["lt"].as_u64()?,
        sub_position: 0,
    };
    let event = &entry["event"];
    let order_id = OrderId::new(event["orderId"].as_str()?);

    match event["kind"].as_str()? {
        "escrow_created" => Some(ChainEvent::EscrowCreated {
            order_id,
            tx,
            cursor,
            amount: Amount::from_dec_str(event["amount"].as_str()?)?,
            hashlock: event["hashlock"].as_str()?.to_ascii_lowercase(),
        }),
        "fulfillment" => Some(ChainEvent::Fulfillment {
            order_id,
            tx,
            cursor,
            secret: event["secret"].as_str()?.to_string(),
        }),
        "refund" => Some(ChainEvent::Refund {
            order_id,
            tx,
            cursor,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::ScriptedTransport;
    use crate::transport::TransportError;

    const BRIDGE: &str = "EQCD39VS5jcptHL8vMjEXrzGaRcCVYto7HUn4bpAOg8xqB2N";

    fn adapter(responses: Vec<Result<Value, TransportError>>) -> (TonAdapter, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new(responses));
        (TonAdapter::new(transport.clone(), BRIDGE), transport)
    }

    #[tokio::test]
    async fn test_verify_found_not_aborted() {
        let (adapter, _) = adapter(vec![Ok(json!({"aborted": false, "blockSeqno": 100}))]);
        assert!(adapter.verify(&TxId::new("abc")).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_aborted_is_false() {
        let (adapter, _) = adapter(vec![Ok(json!({"aborted": true, "blockSeqno": 100}))]);
        assert!(!adapter.verify(&TxId::new("abc")).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_missing_is_false() {
        let (adapter, _) = adapter(vec![Ok(Value::Null)]);
        assert!(!adapter.verify(&TxId::new("abc")).await.unwrap());
    }

    #[tokio::test]
    async fn test_confirmations_from_seqno_distance() {
        let (adapter, _) = adapter(vec![
            Ok(json!({"aborted": false, "blockSeqno": 100})),
            Ok(json!({"last": {"seqno": 104}})),
        ]);
        assert_eq!(adapter.confirmations(&TxId::new("abc")).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_submit_returns_message_hash() {
        let (adapter, transport) = adapter(vec![Ok(json!({"hash": "beef"}))]);
        let msg_tx = adapter
            .settle_trade(&TradeParams {
                order_id: OrderId::new("0x01"),
                counter_order_id: OrderId::new("0x02"),
                matched_amount: Amount::from_u64(1),
            })
            .await
            .unwrap();
        assert_eq!(msg_tx.as_str(), "beef");
        assert_eq!(transport.calls.lock()[0].0, "sendBoc");
    }

    #[tokio::test]
    async fn test_poll_since_uses_logical_time() {
        let entries = json!([
            {"txHash": "t1", "lt": 100, "event": {"kind": "refund", "orderId": "0x01"}},
            {"txHash": "t2", "lt": 200, "event": {"kind": "refund", "orderId": "0x02"}}
        ]);
        let (adapter, _) = adapter(vec![Ok(entries)]);
        let batch = adapter
            .poll_since(&EventCursor {
                position: 100,
                sub_position: 0,
            })
            .await
            .unwrap();
        assert_eq!(batch.events.len(), 1);
        assert_eq!(batch.next_cursor.position, 200);
    }

    #[tokio::test]
    async fn test_gas_price_is_fee_estimate() {
        let (adapter, _) = adapter(vec![Ok(json!({"fee": "30000000"}))]);
        assert_eq!(
            adapter.gas_price().await.unwrap(),
            Amount::from_u64(30_000_000)
        );
    }
}

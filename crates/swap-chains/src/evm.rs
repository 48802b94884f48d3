//! # Ethereum Adapter
//!
//! Shapes Ethereum JSON-RPC requests for the bridge contract and decodes
//! its event logs. Transaction construction and signing live in the node
//! behind the transport; this adapter only defines the request/response
//! contract.

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

/// Adapter for the EVM side of the bridge.
pub struct EvmAdapter {
    transport: Arc<dyn RpcTransport>,
    /// Bridge contract address submissions are directed to.
    bridge_address: String,
}

impl EvmAdapter {
    /// Create an adapter over a transport.
    pub fn new(transport: Arc<dyn RpcTransport>, bridge_address: impl Into<String>) -> Self {
        Self {
            transport,
            bridge_address: bridge_address.into(),
        }
    }

    fn err_invalid(&self, detail: impl Into<String>) -> ChainError {
        ChainError::InvalidResponse {
            chain: ChainTag::Ethereum,
            detail: detail.into(),
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        self.transport
            .call(method, params)
            .await
            .map_err(|source| ChainError::Transport {
                chain: ChainTag::Ethereum,
                source,
            })
    }

    async fn receipt(&self, tx: &TxId) -> Result<Option<Value>, ChainError> {
        let result = self
            .call("eth_getTransactionReceipt", json!([tx.as_str()]))
            .await?;
        Ok(if result.is_null() { None } else { Some(result) })
    }

    async fn latest_block(&self) -> Result<u64, ChainError> {
        let result = self.call("eth_blockNumber", json!([])).await?;
        parse_hex_u64(&result).ok_or_else(|| self.err_invalid("non-hex block number"))
    }

    /// Send a payload to the bridge contract and return the tx hash.
    async fn send_to_bridge(&self, payload: Value) -> Result<TxId, ChainError> {
        let data = format!("0x{}", hex::encode(payload.to_string().as_bytes()));
        let result = self
            .call(
                "eth_sendTransaction",
                json!([{ "to": self.bridge_address, "data": data }]),
            )
            .await?;
        let hash = result
            .as_str()
            .ok_or_else(|| self.err_invalid("non-string tx hash"))?;
        Ok(TxId::new(hash))
    }
}

#[async_trait]
impl ChainAdapter for EvmAdapter {
    fn chain(&self) -> ChainTag {
        ChainTag::Ethereum
    }

    async fn submit(&self, message: &CrossChainMessage) -> Result<TxId, ChainError> {
        debug!(
            message_id = %message.message_id(),
            message_type = message.message_type(),
            "submitting message to bridge"
        );
        let payload = serde_json::to_value(message)
            .map_err(|e| self.err_invalid(format!("unencodable message: {e}")))?;
        self.send_to_bridge(json!({ "action": "relayMessage", "message": payload }))
            .await
    }

    async fn verify(&self, tx: &TxId) -> Result<bool, ChainError> {
        match self.receipt(tx).await? {
            None => Ok(false),
            Some(receipt) => Ok(receipt["status"].as_str() == Some("0x1")),
        }
    }

    async fn confirmations(&self, tx: &TxId) -> Result<u32, ChainError> {
        let Some(receipt) = self.receipt(tx).await? else {
            return Ok(0);
        };
        let included = parse_hex_u64(&receipt["blockNumber"])
            .ok_or_else(|| self.err_invalid("receipt without block number"))?;
        let latest = self.latest_block().await?;
        Ok(latest.saturating_sub(included).saturating_add(1) as u32)
    }

    async fn poll_since(&self, cursor: &EventCursor) -> Result<EventBatch, ChainError> {
        let result = self
            .call(
                "eth_getLogs",
                json!([{
                    "address": self.bridge_address,
                    "fromBlock": format!("0x{:x}", cursor.position),
                }]),
            )
            .await?;
        let logs = result
            .as_array()
            .ok_or_else(|| self.err_invalid("eth_getLogs did not return an array"))?;

        let mut events = Vec::new();
        let mut next = *cursor;
        for log in logs {
            let event = decode_log(log).ok_or_else(|| self.err_invalid("undecodable log"))?;
            if event.cursor() <= *cursor {
                continue; // already seen within the overlap block
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
        let result = self.call("eth_gasPrice", json!([])).await?;
        let price = parse_hex_u64(&result).ok_or_else(|| self.err_invalid("non-hex gas price"))?;
        Ok(Amount::from_u64(price))
    }

    async fn place_escrow(&self, params: &EscrowParams) -> Result<TxId, ChainError> {
        debug!(order_id = %params.order_id, amount = %params.amount, "placing escrow");
        self.send_to_bridge(json!({
            "action": "createEscrow",
            "orderId": params.order_id,
            "sender": params.sender,
            "recipient": params.recipient,
            "amount": params.amount,
            "token": params.token,
            "hashlock": params.hashlock,
            "timelock": params.timelock,
        }))
        .await
    }

    async fn settle_trade(&self, params: &TradeParams) -> Result<TxId, ChainError> {
        self.send_to_bridge(json!({
            "action": "settleTrade",
            "orderId": params.order_id,
            "counterOrderId": params.counter_order_id,
            "amount": params.matched_amount,
        }))
        .await
    }

    async fn refund(&self, params: &RefundParams) -> Result<TxId, ChainError> {
        debug!(order_id = %params.order_id, "submitting refund");
        self.send_to_bridge(json!({
            "action": "refundEscrow",
            "orderId": params.order_id,
            "escrowTx": params.escrow_tx,
            "recipient": params.recipient,
        }))
        .await
    }
}

/// Parse `"0x1a"`-style quantities.
fn parse_hex_u64(value: &Value) -> Option<u64> {
    let s = value.as_str()?;
    u64::from_str_radix(s.strip_prefix("0x")?, 16).ok()
}

/// Decode one bridge log entry into a typed event.
///
/// Expected shape (the node pre-decodes ABI data into `event`):
/// ```json
/// {
///   "transactionHash": "0x..",
///   "blockNumber": "0x12",
///   "logIndex": "0x0",
///   "event": { "kind": "escrow_created", "orderId": "0x..", "amount": "1", "hashlock": ".." }
/// }
/// ```
fn decode_log(log: &Value) -> Option<ChainEvent> {
    let tx = TxId::new(log["transactionHash"].as_str()?);
    let cursor = EventCursor {
        position: parse_hex_u64(&log["blockNumber"])?,
        sub_position: parse_hex_u64(&log["logIndex"])? as u32,
    };
    let event = &log["event"];
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

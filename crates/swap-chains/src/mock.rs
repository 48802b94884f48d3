//! # Mock Adapter
//!
//! Scriptable in-memory adapter for tests: programmable submit failures,
//! per-transaction verification and confirmation schedules, and queued
//! events. Shared by the relay, sync, engine, and integration suites.

use crate::adapter::{
    ChainAdapter, ChainError, ChainEvent, EscrowParams, EventBatch, EventCursor, RefundParams,
    TradeParams,
};
use crate::transport::TransportError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use swap_messages::CrossChainMessage;
use swap_types::{Amount, ChainTag, TxId};

#[derive(Default)]
struct MockState {
    fail_submits: u32,
    fail_verifies: u32,
    submit_seq: u64,
    verify_overrides: HashMap<String, bool>,
    confirmations: HashMap<String, u32>,
    default_confirmations: u32,
    gas_price: Amount,
    events: Vec<ChainEvent>,
    submitted: Vec<CrossChainMessage>,
    escrows: Vec<EscrowParams>,
    trades: Vec<TradeParams>,
    refunds: Vec<RefundParams>,
}

/// In-memory scriptable chain adapter.
pub struct MockChainAdapter {
    chain: ChainTag,
    state: Mutex<MockState>,
}

impl MockChainAdapter {
    /// A mock fronting the given chain, verifying everything by default.
    pub fn new(chain: ChainTag) -> Self {
        Self {
            chain,
            state: Mutex::new(MockState {
                gas_price: Amount::from_u64(20_000_000_000),
                ..Default::default()
            }),
        }
    }

    /// Fail the next `n` submissions (submit, escrow, trade, refund) with a
    /// transport error.
    pub fn fail_submits(&self, n: u32) {
        self.state.lock().fail_submits = n;
    }

    /// Fail the next `n` verify calls with a transport error.
    pub fn fail_verifies(&self, n: u32) {
        self.state.lock().fail_verifies = n;
    }

    /// Force the verification result for a transaction.
    pub fn set_verify(&self, tx: &TxId, ok: bool) {
        self.state
            .lock()
            .verify_overrides
            .insert(tx.as_str().to_string(), ok);
    }

    /// Set the confirmation count for a transaction.
    pub fn set_confirmations(&self, tx: &TxId, confirmations: u32) {
        self.state
            .lock()
            .confirmations
            .insert(tx.as_str().to_string(), confirmations);
    }

    /// Confirmation count reported for transactions without an override.
    pub fn set_default_confirmations(&self, confirmations: u32) {
        self.state.lock().default_confirmations = confirmations;
    }

    /// Set the reported gas price.
    pub fn set_gas_price(&self, price: Amount) {
        self.state.lock().gas_price = price;
    }

    /// Queue an event for the next poll.
    pub fn push_event(&self, event: ChainEvent) {
        self.state.lock().events.push(event);
    }

    /// Messages submitted so far.
    pub fn submitted_messages(&self) -> Vec<CrossChainMessage> {
        self.state.lock().submitted.clone()
    }

    /// Escrows placed so far.
    pub fn escrows(&self) -> Vec<EscrowParams> {
        self.state.lock().escrows.clone()
    }

    /// Trades settled so far.
    pub fn trades(&self) -> Vec<TradeParams> {
        self.state.lock().trades.clone()
    }

    /// Refunds submitted so far.
    pub fn refunds(&self) -> Vec<RefundParams> {
        self.state.lock().refunds.clone()
    }

    /// Total successful submissions.
    pub fn submit_count(&self) -> u64 {
        self.state.lock().submit_seq
    }

    fn transport_err(&self) -> ChainError {
        ChainError::Transport {
            chain: self.chain,
            source: TransportError::Network("mock failure".into()),
        }
    }

    fn next_tx(state: &mut MockState, chain: ChainTag) -> TxId {
        state.submit_seq += 1;
        TxId::new(format!("0x{}mock{:04}", chain.as_str(), state.submit_seq))
    }

    fn take_submit_slot(&self) -> Result<TxId, ChainError> {
        let mut state = self.state.lock();
        if state.fail_submits > 0 {
            state.fail_submits -= 1;
            return Err(self.transport_err());
        }
        Ok(Self::next_tx(&mut state, self.chain))
    }
}

#[async_trait]
impl ChainAdapter for MockChainAdapter {
    fn chain(&self) -> ChainTag {
        self.chain
    }

    async fn submit(&self, message: &CrossChainMessage) -> Result<TxId, ChainError> {
        let tx = self.take_submit_slot()?;
        self.state.lock().submitted.push(message.clone());
        Ok(tx)
    }

    async fn verify(&self, tx: &TxId) -> Result<bool, ChainError> {
        let mut state = self.state.lock();
        if state.fail_verifies > 0 {
            state.fail_verifies -= 1;
            return Err(self.transport_err());
        }
        Ok(*state.verify_overrides.get(tx.as_str()).unwrap_or(&true))
    }

    async fn confirmations(&self, tx: &TxId) -> Result<u32, ChainError> {
        let state = self.state.lock();
        Ok(*state
            .confirmations
            .get(tx.as_str())
            .unwrap_or(&state.default_confirmations))
    }

    async fn poll_since(&self, cursor: &EventCursor) -> Result<EventBatch, ChainError> {
        let state = self.state.lock();
        let mut next = *cursor;
        let events: Vec<ChainEvent> = state
            .events
            .iter()
            .filter(|e| e.cursor() > *cursor)
            .cloned()
            .collect();
        for event in &events {
            if event.cursor() > next {
                next = event.cursor();
            }
        }
        Ok(EventBatch {
            events,
            next_cursor: next,
        })
    }

    async fn gas_price(&self) -> Result<Amount, ChainError> {
        Ok(self.state.lock().gas_price)
    }

    async fn place_escrow(&self, params: &EscrowParams) -> Result<TxId, ChainError> {
        let tx = self.take_submit_slot()?;
        self.state.lock().escrows.push(params.clone());
        Ok(tx)
    }

    async fn settle_trade(&self, params: &TradeParams) -> Result<TxId, ChainError> {
        let tx = self.take_submit_slot()?;
        self.state.lock().trades.push(params.clone());
        Ok(tx)
    }

    async fn refund(&self, params: &RefundParams) -> Result<TxId, ChainError> {
        let tx = self.take_submit_slot()?;
        self.state.lock().refunds.push(params.clone());
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swap_types::OrderId;

    #[tokio::test]
    async fn test_scripted_failures_then_success() {
        let mock = MockChainAdapter::new(ChainTag::Ethereum);
        mock.fail_submits(2);

        let params = TradeParams {
            order_id: OrderId::new("0x01"),
            counter_order_id: OrderId::new("0x02"),
            matched_amount: Amount::from_u64(1),
        };
        assert!(mock.settle_trade(&params).await.is_err());
        assert!(mock.settle_trade(&params).await.is_err());
        assert!(mock.settle_trade(&params).await.is_ok());
        assert_eq!(mock.trades().len(), 1);
    }

    #[tokio::test]
    async fn test_verify_override() {
        let mock = MockChainAdapter::new(ChainTag::Ton);
        let tx = TxId::new("0xaa");
        assert!(mock.verify(&tx).await.unwrap());
        mock.set_verify(&tx, false);
        assert!(!mock.verify(&tx).await.unwrap());
    }

    #[tokio::test]
    async fn test_poll_respects_cursor() {
        let mock = MockChainAdapter::new(ChainTag::Ethereum);
        for position in [5u64, 10, 15] {
            mock.push_event(ChainEvent::Refund {
                order_id: OrderId::new(format!("0x{position:02}")),
                tx: TxId::new("0xaa"),
                cursor: EventCursor {
                    position,
                    sub_position: 0,
                },
            });
        }

        let batch = mock
            .poll_since(&EventCursor {
                position: 5,
                sub_position: 0,
            })
            .await
            .unwrap();
        assert_eq!(batch.events.len(), 2);
        assert_eq!(batch.next_cursor.position, 15);
    }
}

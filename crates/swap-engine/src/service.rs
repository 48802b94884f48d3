//! # Execution Engine Service
//!
//! Owns pending executions and drives both execution paths. A scheduler
//! tick sweeps timed-out executions, then walks eligible SIGNED orders.

use crate::error::EngineError;
use crate::matching::find_matches_in;
use crate::pending::{ExecutionStatus, PendingExecution};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use swap_bus::{CoordinatorEvent, SwapEventBus};
use swap_chains::{ChainAdapter, EscrowParams, RefundParams, TradeParams};
use swap_messages::{
    canonical_hash, verify_secret, CrossChainMessage, EthEscrowBody, MessageHeader, TonEscrowBody,
};
use swap_orders::{OrderBookEntry, OrderKind, OrderManager, Signer};
use swap_relay::{MessageRelay, RelayError};
use swap_sync::{ChainInfoUpdate, ChainTxStatus, OrderTrackingInfo, StateSync};
use swap_types::{
    now_millis, now_secs, parse_evm_address, Amount, ChainTag, CoordinatorConfig, MessageId,
    OrderId, OrderStatus, SwapDirection, TxId,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Result of a local fill.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocalFill {
    /// The order execution was requested for.
    pub order_id: OrderId,
    /// The matched counter-order.
    pub matched_order_id: OrderId,
    /// min(maker amounts).
    pub matched_amount: Amount,
    /// Arithmetic mean of the two prices.
    pub matched_price: f64,
    /// Settlement transaction.
    pub tx: TxId,
}

/// Result of starting a cross-chain execution. Completion is event-driven.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrossChainExecution {
    /// The order being executed.
    pub order_id: OrderId,
    /// The escrow transaction on the maker's chain.
    pub source_tx: TxId,
    /// Progress at return time.
    pub status: ExecutionStatus,
}

/// What one execution attempt produced.
#[derive(Clone, Debug)]
pub enum ExecutionOutcome {
    /// Two complementary local orders settled.
    Local(LocalFill),
    /// A cross-chain execution started; completion is event-driven.
    CrossChain(CrossChainExecution),
    /// No complementary order was available.
    NoMatch,
}

/// Drives execution for both order paths.
pub struct ExecutionEngine {
    config: CoordinatorConfig,
    bus: Arc<SwapEventBus>,
    manager: Arc<OrderManager>,
    relay: Arc<MessageRelay>,
    sync: Arc<StateSync>,
    adapters: HashMap<ChainTag, Arc<dyn ChainAdapter>>,
    signer: Arc<dyn Signer>,
    pending: Mutex<HashMap<OrderId, PendingExecution>>,
    in_flight: Mutex<HashSet<OrderId>>,
    nonce: AtomicU64,
    running: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ExecutionEngine {
    /// Wire the engine to its collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: CoordinatorConfig,
        manager: Arc<OrderManager>,
        relay: Arc<MessageRelay>,
        sync: Arc<StateSync>,
        source: Arc<dyn ChainAdapter>,
        destination: Arc<dyn ChainAdapter>,
        signer: Arc<dyn Signer>,
        bus: Arc<SwapEventBus>,
    ) -> Self {
        let mut adapters: HashMap<ChainTag, Arc<dyn ChainAdapter>> = HashMap::new();
        adapters.insert(source.chain(), source);
        adapters.insert(destination.chain(), destination);
        Self {
            config,
            bus,
            manager,
            relay,
            sync,
            adapters,
            signer,
            pending: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
            nonce: AtomicU64::new(0),
            running: AtomicBool::new(false),
            task: Mutex::new(None),
        }
    }

    /// Matches for a resting order, best price first.
    pub fn find_matches(&self, order_id: &OrderId) -> Result<Vec<OrderBookEntry>, EngineError> {
        let target = self
            .manager
            .get(order_id)
            .ok_or_else(|| EngineError::NotFound(order_id.clone()))?;
        let candidates = self.manager.by_status(OrderStatus::Signed);
        Ok(find_matches_in(
            &target,
            &candidates,
            self.config.max_slippage,
        ))
    }

    /// Execute an order: local fill for local orders, HTLC start for
    /// cross-chain orders. At most one attempt per order is in flight; a
    /// concurrent second call fails with the in-execution error.
    pub async fn execute_order(&self, order_id: &OrderId) -> Result<ExecutionOutcome, EngineError> {
        self.claim(order_id)?;
        let result = self.execute_claimed(order_id).await;
        match &result {
            // Cross-chain executions keep their claim until fulfillment,
            // refund, or timeout.
            Ok(ExecutionOutcome::CrossChain(_)) => {}
            _ => self.release(order_id),
        }
        result
    }

    /// The engine's record of an in-flight execution.
    pub fn pending_execution(&self, order_id: &OrderId) -> Option<PendingExecution> {
        self.pending.lock().get(order_id).cloned()
    }

    /// Handle a secret reveal from the counterpart chain.
    ///
    /// Unknown orders are logged and ignored. A mismatching secret fails the
    /// order permanently.
    pub fn handle_fulfillment(
        &self,
        order_id: &OrderId,
        secret: &str,
        target_tx: TxId,
    ) -> Result<(), EngineError> {
        let Some(pending) = self.pending.lock().get(order_id).cloned() else {
            debug!(order_id = %order_id, "fulfillment for unknown execution; ignoring");
            return Ok(());
        };

        if !verify_secret(secret, &pending.secret_hash) {
            warn!(order_id = %order_id, "fulfillment secret does not match hashlock");
            if let Some(entry) = self.pending.lock().get_mut(order_id) {
                entry.status = ExecutionStatus::Failed;
            }
            let _ = self.manager.update_status(
                order_id,
                OrderStatus::Failed,
                None,
                Some("fulfillment secret mismatch".into()),
            );
            self.release(order_id);
            self.bus.publish(CoordinatorEvent::CryptoMismatch {
                order_id: order_id.clone(),
            });
            return Err(EngineError::SecretMismatch(order_id.clone()));
        }

        {
            let mut map = self.pending.lock();
            if let Some(entry) = map.get_mut(order_id) {
                entry.status = ExecutionStatus::Completed;
                entry.secret = Some(secret.to_ascii_lowercase());
                entry.target_tx_hash = Some(target_tx.clone());
            }
        }
        self.manager.update_status(
            order_id,
            OrderStatus::Completed,
            Some(target_tx.clone()),
            None,
        )?;
        if let Err(e) =
            self.sync
                .record_fulfillment(order_id, secret, target_tx.clone(), pending.target_chain)
        {
            warn!(order_id = %order_id, error = %e, "fulfillment not recorded in sync");
        }
        self.manager.discard_secret(order_id);
        self.release(order_id);

        info!(order_id = %order_id, target_tx = %target_tx, "cross-chain execution completed");
        self.bus
            .publish(CoordinatorEvent::CrossChainExecutionCompleted {
                order_id: order_id.clone(),
                target_tx,
            });
        Ok(())
    }

    /// Refund an expired execution. Rejected while `now < timelock`.
    pub async fn cancel_execution(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<TxId>, EngineError> {
        let pending = self
            .pending
            .lock()
            .get(order_id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(order_id.clone()))?;

        let now = now_secs();
        if now < pending.timelock {
            return Err(EngineError::TimelockNotReached {
                timelock: pending.timelock,
                now,
            });
        }

        let refund_tx = if let Some(escrow_tx) = pending.source_tx_hash.clone() {
            let adapter = self
                .adapters
                .get(&pending.source_chain)
                .ok_or_else(|| EngineError::NotFound(order_id.clone()))?;
            let entry = self
                .manager
                .get(order_id)
                .ok_or_else(|| EngineError::NotFound(order_id.clone()))?;
            let tx = adapter
                .refund(&RefundParams {
                    order_id: order_id.clone(),
                    escrow_tx,
                    recipient: entry.signed.order.maker.clone(),
                })
                .await?;
            if let Err(e) = self
                .sync
                .record_refund(order_id, tx.clone(), pending.source_chain)
            {
                warn!(order_id = %order_id, error = %e, "refund not recorded in sync");
            }
            Some(tx)
        } else {
            None
        };

        self.manager
            .update_status(order_id, OrderStatus::Cancelled, refund_tx.clone(), None)?;
        self.pending.lock().remove(order_id);
        self.release(order_id);
        info!(order_id = %order_id, ?refund_tx, "execution cancelled and refunded");
        Ok(refund_tx)
    }

    /// One scheduler tick: sweep timed-out executions, then walk eligible
    /// SIGNED orders. Public so tests and the runtime can drive it directly.
    pub async fn process_tick(&self) {
        self.sweep_timeouts();

        let now = now_millis();
        let eligible: Vec<OrderId> = self
            .manager
            .by_status(OrderStatus::Signed)
            .into_iter()
            .filter(|e| e.age_ms(now) <= self.config.max_order_age_ms)
            .filter(|e| e.signed.order.maker_amount >= self.config.min_order_size)
            .take(self.config.max_batch_size)
            .map(|e| e.order_id().clone())
            .collect();

        for order_id in eligible {
            match self.execute_order(&order_id).await {
                Ok(_) | Err(EngineError::AlreadyInExecution(_)) => {}
                Err(e) => {
                    warn!(order_id = %order_id, error = %e, "scheduled execution failed");
                }
            }
        }
    }

    /// Fail every relaying execution whose timelock has passed.
    fn sweep_timeouts(&self) {
        let now = now_secs();
        let timed_out: Vec<OrderId> = {
            let mut map = self.pending.lock();
            map.values_mut()
                .filter(|p| p.status == ExecutionStatus::Relaying && p.past_timelock(now))
                .map(|p| {
                    p.status = ExecutionStatus::Failed;
                    p.order_id.clone()
                })
                .collect()
        };

        for order_id in timed_out {
            warn!(order_id = %order_id, "execution timed out at its timelock");
            let _ = self.manager.update_status(
                &order_id,
                OrderStatus::Failed,
                None,
                Some("execution timeout".into()),
            );
            self.release(&order_id);
            self.bus.publish(CoordinatorEvent::OrderExecutionTimeout {
                order_id,
            });
        }
    }

    /// Start the scheduler loop. Calling `start` twice is a no-op.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(
            interval_ms = self.config.execution_interval_ms,
            "execution engine started"
        );
        let engine = Arc::clone(self);
        let handle = tokio::spawn(async move {
            while engine.running.load(Ordering::SeqCst) {
                engine.process_tick().await;
                tokio::time::sleep(Duration::from_millis(engine.config.execution_interval_ms))
                    .await;
            }
        });
        *self.task.lock() = Some(handle);
    }

    /// Stop the scheduler loop. Calling `stop` twice is a no-op.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            let drain = Duration::from_millis(self.config.drain_timeout_ms);
            if tokio::time::timeout(drain, handle).await.is_err() {
                warn!("engine drain timeout; abandoning in-flight tick");
            }
        }
        info!("execution engine stopped");
    }

    /// Whether the scheduler is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn claim(&self, order_id: &OrderId) -> Result<(), EngineError> {
        if self.pending.lock().contains_key(order_id) {
            return Err(EngineError::AlreadyInExecution(order_id.clone()));
        }
        if !self.in_flight.lock().insert(order_id.clone()) {
            return Err(EngineError::AlreadyInExecution(order_id.clone()));
        }
        Ok(())
    }

    fn release(&self, order_id: &OrderId) {
        self.in_flight.lock().remove(order_id);
    }

    async fn execute_claimed(&self, order_id: &OrderId) -> Result<ExecutionOutcome, EngineError> {
        let entry = self
            .manager
            .get(order_id)
            .ok_or_else(|| EngineError::NotFound(order_id.clone()))?;
        if entry.status != OrderStatus::Signed {
            return Err(EngineError::NotExecutable {
                order_id: order_id.clone(),
                status: entry.status,
            });
        }

        match entry.signed.order.kind {
            OrderKind::Local => self.execute_local(entry).await,
            OrderKind::CrossChain(direction) => self.execute_cross_chain(entry, direction).await,
        }
    }

    async fn execute_local(&self, target: OrderBookEntry) -> Result<ExecutionOutcome, EngineError> {
        let candidates = self.manager.by_status(OrderStatus::Signed);
        let matches = find_matches_in(&target, &candidates, self.config.max_slippage);
        let Some(best) = matches.first() else {
            return Ok(ExecutionOutcome::NoMatch);
        };

        let target_id = target.order_id().clone();
        let match_id = best.order_id().clone();
        debug!(order_id = %target_id, matched = %match_id, "local match found");

        // Claim both legs in one atomic transition. The in-flight guard only
        // covers the target, so a concurrent execution of the counter-order
        // races this claim; whichever claim commits first owns both legs,
        // and the loser's failure mutates nothing (there is nothing of ours
        // to revert).
        self.manager
            .update_status_pair(&target_id, &match_id, OrderStatus::Matched, None)?;

        // From here on both legs are ours; any failure returns them to the
        // book together.
        if let Err(e) =
            self.manager
                .update_status_pair(&target_id, &match_id, OrderStatus::Executing, None)
        {
            self.revert_pair(&target_id, &match_id);
            return Err(e.into());
        }

        let matched_amount = target
            .signed
            .order
            .maker_amount
            .min(best.signed.order.maker_amount);
        let matched_price =
            (target.signed.order.price() + best.signed.order.price()) / 2.0;

        let source = &self.adapters[&ChainTag::Ethereum];
        let settlement = source
            .settle_trade(&TradeParams {
                order_id: target_id.clone(),
                counter_order_id: match_id.clone(),
                matched_amount,
            })
            .await;

        match settlement {
            Ok(tx) => {
                self.manager.update_status_pair(
                    &target_id,
                    &match_id,
                    OrderStatus::Completed,
                    Some(tx.clone()),
                )?;
                info!(order_id = %target_id, matched = %match_id, %tx, "local fill completed");
                self.bus.publish(CoordinatorEvent::OrderExecuted {
                    order_id: target_id.clone(),
                    matched_order_id: match_id.clone(),
                    matched_amount,
                    matched_price,
                });
                Ok(ExecutionOutcome::Local(LocalFill {
                    order_id: target_id,
                    matched_order_id: match_id,
                    matched_amount,
                    matched_price,
                    tx,
                }))
            }
            Err(e) => {
                warn!(order_id = %target_id, error = %e, "local fill reverted");
                self.revert_pair(&target_id, &match_id);
                Err(e.into())
            }
        }
    }

    /// Return both legs of a failed fill to the book. A revert that cannot
    /// commit is loud: the legs are stranded outside SIGNED and need an
    /// operator.
    fn revert_pair(&self, target_id: &OrderId, match_id: &OrderId) {
        if let Err(e) =
            self.manager
                .update_status_pair(target_id, match_id, OrderStatus::Signed, None)
        {
            warn!(
                order_id = %target_id,
                matched = %match_id,
                error = %e,
                "failed to return legs to the book"
            );
        }
    }

    async fn execute_cross_chain(
        &self,
        entry: OrderBookEntry,
        direction: SwapDirection,
    ) -> Result<ExecutionOutcome, EngineError> {
        let order = &entry.signed.order;
        let order_id = order.order_id.clone();
        let htlc = order
            .htlc
            .clone()
            .ok_or_else(|| EngineError::UnsupportedToken(order_id.clone()))?;
        let destination = order
            .destination
            .clone()
            .ok_or_else(|| EngineError::UnsupportedToken(order_id.clone()))?;

        self.manager
            .update_status(&order_id, OrderStatus::Executing, None, None)?;
        self.pending.lock().insert(
            order_id.clone(),
            PendingExecution::new(
                order_id.clone(),
                direction.escrow_chain(),
                direction.claim_chain(),
                htlc.hashlock.clone(),
                htlc.timelock,
            ),
        );

        // Escrow on the maker's chain.
        let escrow_chain = direction.escrow_chain();
        let token = match direction {
            SwapDirection::EthToTon => parse_evm_address(&order.maker_asset)
                .is_some()
                .then(|| order.maker_asset.clone()),
            SwapDirection::TonToEth => destination.jetton_master.clone(),
        };
        let escrow = EscrowParams {
            order_id: order_id.clone(),
            sender: order.maker.clone(),
            recipient: destination.recipient.clone(),
            amount: order.maker_amount,
            token: token.clone(),
            hashlock: htlc.hashlock.clone(),
            timelock: htlc.timelock,
        };
        let source_tx = match self.adapters[&escrow_chain].place_escrow(&escrow).await {
            Ok(tx) => tx,
            Err(e) => {
                self.pending.lock().remove(&order_id);
                let _ = self
                    .manager
                    .update_status(&order_id, OrderStatus::Signed, None, None);
                return Err(e.into());
            }
        };

        // Announce the escrow to the counterpart chain.
        let message = self.build_escrow_message(
            &entry,
            &destination,
            direction,
            &source_tx,
            &htlc.hashlock,
            htlc.timelock,
            token,
        )?;
        let target_chain = direction.claim_chain();
        if let Err(e) = self.relay.enqueue(message, target_chain) {
            self.pending.lock().remove(&order_id);
            let _ = self.manager.update_status(
                &order_id,
                OrderStatus::Failed,
                None,
                Some(format!("escrow message rejected: {e}")),
            );
            return Err(e.into());
        }

        {
            let mut map = self.pending.lock();
            if let Some(pending) = map.get_mut(&order_id) {
                pending.status = ExecutionStatus::Relaying;
                pending.source_tx_hash = Some(source_tx.clone());
            }
        }

        // Register with state sync; the escrow tx is submitted but not yet
        // confirmed.
        let tracking = OrderTrackingInfo {
            order_id: order_id.clone(),
            cross_chain_id: entry.signed.cross_chain_id.clone(),
            direction,
            hashlock: htlc.hashlock.clone(),
            timelock: htlc.timelock,
            amount: order.maker_amount,
            initiator: order.maker.clone(),
            recipient: destination.recipient.clone(),
        };
        if let Err(e) = self.sync.track(tracking) {
            debug!(order_id = %order_id, error = %e, "order already tracked");
        }
        if let Err(e) = self.sync.update_chain_info(
            &order_id,
            escrow_chain,
            ChainInfoUpdate {
                tx_hash: Some(source_tx.clone()),
                status: ChainTxStatus::Pending,
                ..Default::default()
            },
        ) {
            warn!(order_id = %order_id, error = %e, "escrow tx not recorded in sync");
        }

        info!(order_id = %order_id, source_tx = %source_tx, %direction, "cross-chain execution started");
        Ok(ExecutionOutcome::CrossChain(CrossChainExecution {
            order_id,
            source_tx,
            status: ExecutionStatus::Relaying,
        }))
    }

    #[allow(clippy::too_many_arguments)]
    fn build_escrow_message(
        &self,
        entry: &OrderBookEntry,
        destination: &swap_orders::TonDestination,
        direction: SwapDirection,
        source_tx: &TxId,
        hashlock: &str,
        timelock: u64,
        token: Option<String>,
    ) -> Result<CrossChainMessage, EngineError> {
        let order = &entry.signed.order;
        let header = MessageHeader::new(
            MessageId::generate("msg"),
            self.nonce.fetch_add(1, Ordering::Relaxed),
        );
        // The inclusion proof is fetched by the on-chain verifier from the
        // escrow transaction; the message carries its identity.
        let proof = hex::encode(source_tx.as_str().as_bytes());

        let mut message = match direction {
            SwapDirection::EthToTon => CrossChainMessage::EthToTonEscrow {
                header,
                body: EthEscrowBody {
                    order_id: order.order_id.clone(),
                    source_tx_hash: source_tx.clone(),
                    source_block_number: 0,
                    source_log_index: 0,
                    sender_address: order.maker.clone(),
                    ton_recipient: destination.recipient.clone(),
                    amount: order.maker_amount,
                    token_address: token,
                    jetton_master: destination.jetton_master.clone(),
                    hashlock: hashlock.to_string(),
                    timelock,
                    proof,
                },
            },
            SwapDirection::TonToEth => CrossChainMessage::TonToEthEscrow {
                header,
                body: TonEscrowBody {
                    order_id: order.order_id.clone(),
                    ton_tx_hash: source_tx.clone(),
                    ton_logical_time: 0,
                    ton_block_seqno: 0,
                    sender_address: order.maker.clone(),
                    eth_recipient: destination.recipient.clone(),
                    amount: order.maker_amount,
                    jetton_master: token,
                    token_address: None,
                    hashlock: hashlock.to_string(),
                    timelock,
                    proof,
                },
            },
        };

        let digest = canonical_hash(&message).map_err(RelayError::Invalid)?;
        let signature = self.signer.sign_digest(digest)?;
        message.header_mut().relayer_signature = signature;
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swap_bus::{EventFilter, EventTopic};
    use swap_chains::MockChainAdapter;
    use swap_orders::{LocalSigner, SwapIntent, TonDestination};
    use swap_sync::SyncError;
    use swap_types::CrossChainState;

    struct Harness {
        engine: Arc<ExecutionEngine>,
        manager: Arc<OrderManager>,
        relay: Arc<MessageRelay>,
        sync: Arc<StateSync>,
        source: Arc<MockChainAdapter>,
        bus: Arc<SwapEventBus>,
        signer: LocalSigner,
    }

    fn harness_with(config: CoordinatorConfig) -> Harness {
        let source = Arc::new(MockChainAdapter::new(ChainTag::Ethereum));
        let destination = Arc::new(MockChainAdapter::new(ChainTag::Ton));
        let bus = Arc::new(SwapEventBus::new());
        let manager = Arc::new(OrderManager::new(
            config.clone(),
            source.clone(),
            bus.clone(),
        ));
        let relay = Arc::new(MessageRelay::new(
            config.clone(),
            source.clone(),
            destination.clone(),
            bus.clone(),
        ));
        let sync = Arc::new(StateSync::new(
            config.clone(),
            source.clone(),
            destination.clone(),
            bus.clone(),
        ));
        let engine = Arc::new(ExecutionEngine::new(
            config,
            manager.clone(),
            relay.clone(),
            sync.clone(),
            source.clone(),
            destination,
            Arc::new(LocalSigner::random()),
            bus.clone(),
        ));
        Harness {
            engine,
            manager,
            relay,
            sync,
            source,
            bus,
            signer: LocalSigner::random(),
        }
    }

    fn harness() -> Harness {
        harness_with(CoordinatorConfig::default())
    }

    fn local_intent(maker: &str, give_asset: &str, want_asset: &str, give: u64, want: u64) -> SwapIntent {
        SwapIntent {
            maker: maker.into(),
            receiver: maker.into(),
            maker_asset: give_asset.into(),
            taker_asset: want_asset.into(),
            maker_amount: Amount::from_u64(give),
            taker_amount: Amount::from_u64(want),
            deadline: now_secs() + 3_600,
            destination: None,
            salt: None,
        }
    }

    fn cross_intent() -> SwapIntent {
        SwapIntent {
            maker: "0x742d35cc6634c0532925a3b844bc454e4438f44e".into(),
            receiver: "0x742d35cc6634c0532925a3b844bc454e4438f44e".into(),
            maker_asset: "0x0000000000000000000000000000000000000001".into(),
            taker_asset: "ton:native".into(),
            maker_amount: Amount::from_dec_str("1000000000000000000").unwrap(),
            taker_amount: Amount::from_dec_str("100000000000").unwrap(),
            deadline: now_secs() + 3_600,
            destination: Some(TonDestination {
                recipient: "EQCD39VS5jcptHL8vMjEXrzGaRcCVYto7HUn4bpAOg8xqB2N".into(),
                chain_id: 607,
                jetton_master: None,
                relayer_fee: None,
            }),
            salt: None,
        }
    }

    fn add_order(h: &Harness, intent: SwapIntent) -> OrderId {
        let order = h.manager.construct(intent).unwrap();
        let signed = h.manager.sign(order, &h.signer).unwrap();
        h.manager.add(signed).unwrap()
    }

    #[tokio::test]
    async fn test_local_complementary_match_completes_both() {
        let h = harness();
        let a = add_order(
            &h,
            local_intent("0x00000000000000000000000000000000000000a1", "X", "Y", 1, 2),
        );
        let b = add_order(
            &h,
            local_intent("0x00000000000000000000000000000000000000b2", "Y", "X", 2, 1),
        );

        let mut sub = h.bus.subscribe(EventFilter::topics(vec![EventTopic::Engine]));
        let outcome = h.engine.execute_order(&a).await.unwrap();

        match outcome {
            ExecutionOutcome::Local(fill) => {
                assert_eq!(fill.matched_order_id, b);
                assert_eq!(fill.matched_amount, Amount::from_u64(1));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(h.manager.get(&a).unwrap().status, OrderStatus::Completed);
        assert_eq!(h.manager.get(&b).unwrap().status, OrderStatus::Completed);
        assert_eq!(h.source.trades().len(), 1);
        assert!(matches!(
            sub.try_recv(),
            Some(CoordinatorEvent::OrderExecuted { .. })
        ));
    }

    #[tokio::test]
    async fn test_local_no_match() {
        let h = harness();
        let a = add_order(
            &h,
            local_intent("0x00000000000000000000000000000000000000a1", "X", "Y", 1, 2),
        );
        let outcome = h.engine.execute_order(&a).await.unwrap();
        assert!(matches!(outcome, ExecutionOutcome::NoMatch));
        assert_eq!(h.manager.get(&a).unwrap().status, OrderStatus::Signed);
    }

    #[tokio::test]
    async fn test_local_failure_reverts_both_legs() {
        let h = harness();
        let a = add_order(
            &h,
            local_intent("0x00000000000000000000000000000000000000a1", "X", "Y", 1, 2),
        );
        let b = add_order(
            &h,
            local_intent("0x00000000000000000000000000000000000000b2", "Y", "X", 2, 1),
        );

        h.source.fail_submits(1);
        assert!(h.engine.execute_order(&a).await.is_err());

        assert_eq!(h.manager.get(&a).unwrap().status, OrderStatus::Signed);
        assert_eq!(h.manager.get(&b).unwrap().status, OrderStatus::Signed);
    }

    #[tokio::test]
    async fn test_cross_chain_execution_starts() {
        let h = harness();
        let id = add_order(&h, cross_intent());

        let outcome = h.engine.execute_order(&id).await.unwrap();
        let execution = match outcome {
            ExecutionOutcome::CrossChain(execution) => execution,
            other => panic!("unexpected outcome: {other:?}"),
        };

        assert_eq!(execution.status, ExecutionStatus::Relaying);
        assert_eq!(h.manager.get(&id).unwrap().status, OrderStatus::Executing);

        // Escrow placed on the source chain.
        let escrows = h.source.escrows();
        assert_eq!(escrows.len(), 1);
        assert_eq!(escrows[0].order_id, id);

        // Escrow message queued for the counterpart chain.
        assert_eq!(h.relay.stats().total, 1);

        // Tracked by sync with the escrow tx pending.
        let tracked = h.sync.get(&id).unwrap();
        assert_eq!(tracked.state, CrossChainState::Pending);
        assert_eq!(tracked.eth.tx_hash, Some(execution.source_tx.clone()));

        // Pending execution registered.
        let pending = h.engine.pending_execution(&id).unwrap();
        assert_eq!(pending.status, ExecutionStatus::Relaying);
        assert_eq!(pending.source_tx_hash, Some(execution.source_tx));
    }

    #[tokio::test]
    async fn test_cross_chain_message_validates() {
        // The enqueued escrow message passes full message validation,
        // signature included.
        let h = harness();
        let id = add_order(&h, cross_intent());
        h.engine.execute_order(&id).await.unwrap();
        h.relay.process_cycle().await;
        assert_eq!(h.relay.stats().delivered, 1);
    }

    #[tokio::test]
    async fn test_fulfillment_completes_order() {
        let h = harness();
        let id = add_order(&h, cross_intent());
        let secret = h.manager.secret_for(&id).unwrap();
        h.engine.execute_order(&id).await.unwrap();

        let mut sub = h.bus.subscribe(EventFilter::topics(vec![EventTopic::Engine]));
        h.engine
            .handle_fulfillment(&id, &secret.to_hex(), TxId::new("0xbb"))
            .unwrap();

        assert_eq!(h.manager.get(&id).unwrap().status, OrderStatus::Completed);
        let pending = h.engine.pending_execution(&id).unwrap();
        assert_eq!(pending.status, ExecutionStatus::Completed);
        assert_eq!(pending.secret, Some(secret.to_hex()));
        assert_eq!(h.sync.get(&id).unwrap().state, CrossChainState::Fulfilled);
        // Secret dropped after reveal.
        assert!(h.manager.secret_for(&id).is_none());
        assert!(matches!(
            sub.try_recv(),
            Some(CoordinatorEvent::CrossChainExecutionCompleted { .. })
        ));
    }

    #[tokio::test]
    async fn test_fulfillment_with_wrong_secret_fails_order() {
        let h = harness();
        let id = add_order(&h, cross_intent());
        h.engine.execute_order(&id).await.unwrap();

        let mut sub = h.bus.subscribe(EventFilter::topics(vec![EventTopic::Engine]));
        let wrong = swap_messages::generate_secret();
        let err = h
            .engine
            .handle_fulfillment(&id, &wrong.to_hex(), TxId::new("0xbb"))
            .unwrap_err();

        assert!(matches!(err, EngineError::SecretMismatch(_)));
        assert_eq!(h.manager.get(&id).unwrap().status, OrderStatus::Failed);
        assert_eq!(
            h.engine.pending_execution(&id).unwrap().status,
            ExecutionStatus::Failed
        );
        // Sync keeps its record untouched apart from the failure event.
        assert_eq!(h.sync.get(&id).unwrap().state, CrossChainState::Pending);
        assert!(matches!(
            sub.try_recv(),
            Some(CoordinatorEvent::CryptoMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_fulfillment_for_unknown_order_ignored() {
        let h = harness();
        let result = h.engine.handle_fulfillment(
            &OrderId::new("0xunknown"),
            &"ab".repeat(32),
            TxId::new("0xbb"),
        );
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_rejected_before_timelock() {
        let h = harness();
        let id = add_order(&h, cross_intent());
        h.engine.execute_order(&id).await.unwrap();

        let err = h.engine.cancel_execution(&id).await.unwrap_err();
        assert!(matches!(err, EngineError::TimelockNotReached { .. }));
        assert_eq!(h.manager.get(&id).unwrap().status, OrderStatus::Executing);
    }

    #[tokio::test]
    async fn test_cancel_after_timelock_refunds() {
        let config = CoordinatorConfig {
            min_timelock_s: 1,
            ..Default::default()
        };
        let h = harness_with(config);
        let id = add_order(&h, cross_intent());
        h.engine.execute_order(&id).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        let refund_tx = h.engine.cancel_execution(&id).await.unwrap();

        assert!(refund_tx.is_some());
        assert_eq!(h.manager.get(&id).unwrap().status, OrderStatus::Cancelled);
        assert!(h.engine.pending_execution(&id).is_none());
        assert_eq!(h.source.refunds().len(), 1);
        assert_eq!(
            h.sync.get(&id).unwrap().state,
            CrossChainState::RefundedSrc
        );
    }

    #[tokio::test]
    async fn test_tick_sweeps_timed_out_executions() {
        let config = CoordinatorConfig {
            min_timelock_s: 1,
            ..Default::default()
        };
        let h = harness_with(config);
        let id = add_order(&h, cross_intent());
        h.engine.execute_order(&id).await.unwrap();

        let mut sub = h.bus.subscribe(EventFilter::topics(vec![EventTopic::Engine]));
        tokio::time::sleep(Duration::from_millis(1_100)).await;
        h.engine.process_tick().await;

        assert_eq!(h.manager.get(&id).unwrap().status, OrderStatus::Failed);
        assert_eq!(
            h.engine.pending_execution(&id).unwrap().status,
            ExecutionStatus::Failed
        );
        let mut saw_timeout = false;
        while let Some(event) = sub.try_recv() {
            if matches!(event, CoordinatorEvent::OrderExecutionTimeout { .. }) {
                saw_timeout = true;
            }
        }
        assert!(saw_timeout);
    }

    #[tokio::test]
    async fn test_concurrent_executions_one_wins() {
        let h = harness();
        let id = add_order(&h, cross_intent());

        let (r1, r2, r3) = tokio::join!(
            h.engine.execute_order(&id),
            h.engine.execute_order(&id),
            h.engine.execute_order(&id),
        );

        let results = [r1, r2, r3];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        let rejections = results
            .iter()
            .filter(|r| matches!(r, Err(EngineError::AlreadyInExecution(_))))
            .count();
        assert_eq!(wins, 1);
        assert_eq!(rejections, 2);
        // Exactly one pending execution exists.
        assert!(h.engine.pending_execution(&id).is_some());
    }

    #[tokio::test]
    async fn test_concurrent_complementary_fills_settle_once() {
        // A and B are each other's match; executing both concurrently must
        // produce exactly one settlement, with both legs completed by the
        // winner and nothing stranded mid-transition by the loser.
        let h = harness();
        let a = add_order(
            &h,
            local_intent("0x00000000000000000000000000000000000000a1", "X", "Y", 1, 2),
        );
        let b = add_order(
            &h,
            local_intent("0x00000000000000000000000000000000000000b2", "Y", "X", 2, 1),
        );

        let (ra, rb) = tokio::join!(h.engine.execute_order(&a), h.engine.execute_order(&b));

        let results = [ra, rb];
        let fills = results
            .iter()
            .filter(|r| matches!(r, Ok(ExecutionOutcome::Local(_))))
            .count();
        assert_eq!(fills, 1);
        assert_eq!(h.source.trades().len(), 1);
        assert_eq!(h.manager.get(&a).unwrap().status, OrderStatus::Completed);
        assert_eq!(h.manager.get(&b).unwrap().status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_counter_order_in_execution_is_not_disturbed() {
        // The counter-order is already mid-execution; the target neither
        // claims it nor reverts it, and stays SIGNED itself.
        let h = harness();
        let a = add_order(
            &h,
            local_intent("0x00000000000000000000000000000000000000a1", "X", "Y", 1, 2),
        );
        let b = add_order(
            &h,
            local_intent("0x00000000000000000000000000000000000000b2", "Y", "X", 2, 1),
        );

        h.manager
            .update_status(&b, OrderStatus::Executing, None, None)
            .unwrap();
        // B is no longer SIGNED, so A simply finds no match.
        let outcome = h.engine.execute_order(&a).await.unwrap();
        assert!(matches!(outcome, ExecutionOutcome::NoMatch));
        assert_eq!(h.manager.get(&a).unwrap().status, OrderStatus::Signed);
        assert_eq!(h.manager.get(&b).unwrap().status, OrderStatus::Executing);
        assert!(h.source.trades().is_empty());
    }

    #[tokio::test]
    async fn test_tick_respects_eligibility() {
        let config = CoordinatorConfig {
            min_order_size: Amount::from_u64(100),
            ..Default::default()
        };
        let h = harness_with(config);
        // Too small for the scheduler.
        let small = add_order(
            &h,
            local_intent("0x00000000000000000000000000000000000000a1", "X", "Y", 1, 2),
        );

        h.engine.process_tick().await;
        assert_eq!(h.manager.get(&small).unwrap().status, OrderStatus::Signed);
    }

    #[tokio::test]
    async fn test_scheduler_executes_cross_chain_orders() {
        let h = harness();
        let id = add_order(&h, cross_intent());
        h.engine.process_tick().await;
        assert_eq!(h.manager.get(&id).unwrap().status, OrderStatus::Executing);
        assert!(h.engine.pending_execution(&id).is_some());
    }

    #[tokio::test]
    async fn test_start_stop_idempotent() {
        let h = harness();
        h.engine.start();
        h.engine.start();
        assert!(h.engine.is_running());
        h.engine.stop().await;
        h.engine.stop().await;
        assert!(!h.engine.is_running());
    }

    #[tokio::test]
    async fn test_sync_error_type_exported() {
        // Engine surfaces sync errors through its own error type.
        let err: EngineError = SyncError::NotTracked(OrderId::new("0x01")).into();
        assert_eq!(err.code(), swap_types::ErrorCode::OrderNotFound);
    }
}

//! # Coordinator
//!
//! The composition root: one instance owns the bus, the four services, and
//! the two background tasks that glue them together (event router and chain
//! event pump).

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use swap_bus::{CoordinatorEvent, EventFilter, EventTopic, SwapEventBus};
use swap_chains::{ChainAdapter, ChainEvent, EventCursor};
use swap_engine::{EngineError, ExecutionEngine};
use swap_orders::{OrderError, OrderManager, SignedOrder, Signer, SwapIntent};
use swap_relay::MessageRelay;
use swap_sync::{ChainInfoUpdate, ChainTxStatus, StateSync};
use swap_types::{ChainTag, ConfigError, CoordinatorConfig, OrderId, OrderStatus};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// The assembled coordinator.
pub struct Coordinator {
    config: CoordinatorConfig,
    bus: Arc<SwapEventBus>,
    adapters: HashMap<ChainTag, Arc<dyn ChainAdapter>>,
    manager: Arc<OrderManager>,
    relay: Arc<MessageRelay>,
    sync: Arc<StateSync>,
    engine: Arc<ExecutionEngine>,
    signer: Arc<dyn Signer>,
    cursors: Mutex<HashMap<ChainTag, EventCursor>>,
    running: AtomicBool,
    shutdown: Arc<Notify>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Coordinator {
    /// Validate the config and wire every component.
    pub fn new(
        config: CoordinatorConfig,
        source: Arc<dyn ChainAdapter>,
        destination: Arc<dyn ChainAdapter>,
        signer: Arc<dyn Signer>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

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
            config.clone(),
            manager.clone(),
            relay.clone(),
            sync.clone(),
            source.clone(),
            destination.clone(),
            signer.clone(),
            bus.clone(),
        ));

        let mut adapters: HashMap<ChainTag, Arc<dyn ChainAdapter>> = HashMap::new();
        adapters.insert(source.chain(), source);
        adapters.insert(destination.chain(), destination);

        Ok(Self {
            config,
            bus,
            adapters,
            manager,
            relay,
            sync,
            engine,
            signer,
            cursors: Mutex::new(HashMap::new()),
            running: AtomicBool::new(false),
            shutdown: Arc::new(Notify::new()),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// The shared event bus.
    pub fn bus(&self) -> &Arc<SwapEventBus> {
        &self.bus
    }

    /// The order manager.
    pub fn manager(&self) -> &Arc<OrderManager> {
        &self.manager
    }

    /// The message relay.
    pub fn relay(&self) -> &Arc<MessageRelay> {
        &self.relay
    }

    /// The state synchronizer.
    pub fn sync(&self) -> &Arc<StateSync> {
        &self.sync
    }

    /// The execution engine.
    pub fn engine(&self) -> &Arc<ExecutionEngine> {
        &self.engine
    }

    /// Construct, sign, and book an intent in one step.
    pub fn submit_intent(&self, intent: SwapIntent) -> Result<OrderId, OrderError> {
        let order = self.manager.construct(intent)?;
        let signed = self.manager.sign(order, self.signer.as_ref())?;
        self.manager.add(signed)
    }

    /// Book an externally signed order.
    pub fn submit_signed(&self, signed: SignedOrder) -> Result<OrderId, OrderError> {
        self.manager.add(signed)
    }

    /// Start every service and the glue tasks. Idempotent.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("coordinator starting");
        self.relay.start();
        self.sync.start();
        self.engine.start();

        let mut tasks = self.tasks.lock();
        tasks.push(tokio::spawn(Self::route_events(Arc::clone(self))));
        tasks.push(tokio::spawn(Self::pump_loop(Arc::clone(self))));
        info!("coordinator started");
    }

    /// Stop everything: engine first (no new executions), then relay, then
    /// sync, then the glue tasks. Idempotent.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("coordinator stopping");
        self.engine.stop().await;
        self.relay.stop().await;
        self.sync.stop().await;

        self.shutdown.notify_waiters();
        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            let drain = Duration::from_millis(self.config.drain_timeout_ms);
            if tokio::time::timeout(drain, task).await.is_err() {
                warn!("glue task drain timeout");
            }
        }
        info!("coordinator stopped");
    }

    /// One pass over both adapters' event feeds. Public so tests can drive
    /// it deterministically.
    pub async fn pump_chain_events(&self) {
        for (&chain, adapter) in &self.adapters {
            let cursor = self
                .cursors
                .lock()
                .get(&chain)
                .copied()
                .unwrap_or_else(EventCursor::origin);
            let batch = match adapter.poll_since(&cursor).await {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(%chain, error = %e, "event poll failed");
                    continue;
                }
            };
            self.cursors.lock().insert(chain, batch.next_cursor);

            for event in batch.events {
                self.handle_chain_event(chain, event);
            }
        }
    }

    fn handle_chain_event(&self, chain: ChainTag, event: ChainEvent) {
        match event {
            ChainEvent::EscrowCreated {
                order_id,
                tx,
                cursor,
                ..
            } => {
                debug!(order_id = %order_id, %chain, "escrow confirmed on chain");
                if let Err(e) = self.sync.update_chain_info(
                    &order_id,
                    chain,
                    ChainInfoUpdate {
                        tx_hash: Some(tx),
                        block: Some(cursor.position),
                        log_index: Some(cursor.sub_position),
                        status: ChainTxStatus::Confirmed,
                    },
                ) {
                    debug!(order_id = %order_id, error = %e, "escrow event for untracked order");
                }
            }
            ChainEvent::Fulfillment {
                order_id,
                tx,
                secret,
                ..
            } => {
                if let Err(e) = self.engine.handle_fulfillment(&order_id, &secret, tx) {
                    warn!(order_id = %order_id, error = %e, "fulfillment rejected");
                }
            }
            ChainEvent::Refund { order_id, tx, .. } => {
                if let Err(e) = self.sync.record_refund(&order_id, tx, chain) {
                    debug!(order_id = %order_id, error = %e, "refund event for untracked order");
                }
            }
        }
    }

    async fn pump_loop(coordinator: Arc<Self>) {
        let interval = Duration::from_millis(coordinator.config.processing_interval_ms);
        loop {
            tokio::select! {
                _ = coordinator.shutdown.notified() => break,
                _ = tokio::time::sleep(interval) => coordinator.pump_chain_events().await,
            }
        }
    }

    async fn route_events(coordinator: Arc<Self>) {
        let mut sub = coordinator.bus.subscribe(EventFilter::topics(vec![
            EventTopic::Orders,
            EventTopic::Relay,
            EventTopic::Sync,
        ]));
        loop {
            let event = tokio::select! {
                _ = coordinator.shutdown.notified() => break,
                event = sub.recv() => match event {
                    Ok(event) => event,
                    Err(_) => break,
                },
            };
            coordinator.route_one(event).await;
        }
    }

    async fn route_one(&self, event: CoordinatorEvent) {
        match event {
            // A freshly signed order gets immediate consideration.
            CoordinatorEvent::OrderEvent {
                order_id,
                status: OrderStatus::Signed,
                ..
            } => match self.engine.execute_order(&order_id).await {
                Ok(_) | Err(EngineError::AlreadyInExecution(_)) => {}
                Err(e) => {
                    debug!(order_id = %order_id, error = %e, "immediate execution declined")
                }
            },

            // A reached timelock triggers the refund path.
            CoordinatorEvent::TimelockReached { order_id } => {
                match self.engine.cancel_execution(&order_id).await {
                    Ok(refund_tx) => {
                        info!(order_id = %order_id, ?refund_tx, "refund path completed")
                    }
                    Err(EngineError::NotFound(_)) => {}
                    Err(e) => warn!(order_id = %order_id, error = %e, "refund path failed"),
                }
            }

            CoordinatorEvent::MessageDelivered {
                message_id,
                target,
                delivery_ms,
                ..
            } => {
                debug!(message_id = %message_id, %target, delivery_ms, "message delivered");
            }
            CoordinatorEvent::MessageFailed {
                message_id, error, ..
            } => {
                warn!(message_id = %message_id, error, "message failed permanently");
            }

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swap_chains::MockChainAdapter;
    use swap_orders::LocalSigner;
    use swap_types::Amount;

    fn coordinator() -> (Arc<Coordinator>, Arc<MockChainAdapter>, Arc<MockChainAdapter>) {
        let source = Arc::new(MockChainAdapter::new(ChainTag::Ethereum));
        let destination = Arc::new(MockChainAdapter::new(ChainTag::Ton));
        let coordinator = Arc::new(
            Coordinator::new(
                CoordinatorConfig::default(),
                source.clone(),
                destination.clone(),
                Arc::new(LocalSigner::random()),
            )
            .unwrap(),
        );
        (coordinator, source, destination)
    }

    fn intent() -> SwapIntent {
        SwapIntent {
            maker: "0x742d35cc6634c0532925a3b844bc454e4438f44e".into(),
            receiver: "0x742d35cc6634c0532925a3b844bc454e4438f44e".into(),
            maker_asset: "0x0000000000000000000000000000000000000001".into(),
            taker_asset: "0x0000000000000000000000000000000000000002".into(),
            maker_amount: Amount::from_u64(10),
            taker_amount: Amount::from_u64(20),
            deadline: swap_types::now_secs() + 3_600,
            destination: None,
            salt: None,
        }
    }

    #[tokio::test]
    async fn test_rejects_invalid_config() {
        let source = Arc::new(MockChainAdapter::new(ChainTag::Ethereum));
        let destination = Arc::new(MockChainAdapter::new(ChainTag::Ton));
        let config = CoordinatorConfig {
            max_slippage: 9.0,
            ..Default::default()
        };
        assert!(Coordinator::new(
            config,
            source,
            destination,
            Arc::new(LocalSigner::random())
        )
        .is_err());
    }

    #[tokio::test]
    async fn test_submit_intent_books_order() {
        let (coordinator, _, _) = coordinator();
        let id = coordinator.submit_intent(intent()).unwrap();
        assert_eq!(
            coordinator.manager().get(&id).unwrap().status,
            OrderStatus::Signed
        );
    }

    #[tokio::test]
    async fn test_start_stop_idempotent() {
        let (coordinator, _, _) = coordinator();
        coordinator.start();
        coordinator.start();
        assert!(coordinator.relay().is_running());
        assert!(coordinator.sync().is_running());
        assert!(coordinator.engine().is_running());

        coordinator.stop().await;
        coordinator.stop().await;
        assert!(!coordinator.relay().is_running());
        assert!(!coordinator.sync().is_running());
        assert!(!coordinator.engine().is_running());
    }

    #[tokio::test]
    async fn test_pump_routes_refund_events() {
        use swap_chains::{ChainEvent, EventCursor};
        use swap_sync::OrderTrackingInfo;
        use swap_types::{OrderId, SwapDirection, TxId};

        let (coordinator, source, _) = coordinator();
        coordinator
            .sync()
            .track(OrderTrackingInfo {
                order_id: OrderId::new("0x01"),
                cross_chain_id: None,
                direction: SwapDirection::EthToTon,
                hashlock: "ab".repeat(32),
                timelock: swap_types::now_secs() + 7_200,
                amount: Amount::from_u64(5),
                initiator: "0x742d35cc6634c0532925a3b844bc454e4438f44e".into(),
                recipient: "EQCD39VS5jcptHL8vMjEXrzGaRcCVYto7HUn4bpAOg8xqB2N".into(),
            })
            .unwrap();

        source.push_event(ChainEvent::Refund {
            order_id: OrderId::new("0x01"),
            tx: TxId::new("0xaa"),
            cursor: EventCursor {
                position: 10,
                sub_position: 0,
            },
        });

        coordinator.pump_chain_events().await;
        assert_eq!(
            coordinator
                .sync()
                .get(&OrderId::new("0x01"))
                .unwrap()
                .state,
            swap_types::CrossChainState::RefundedSrc
        );

        // The cursor advanced; the same event is not replayed.
        coordinator.pump_chain_events().await;
    }
}

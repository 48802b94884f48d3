//! # State Synchronization Service
//!
//! Owner of the tracked-order table. Chain observations arrive through
//! `update_chain_info` / `record_fulfillment` / `record_refund`; a periodic
//! watcher promotes chains to finalized and fails orders whose timelock
//! passed without completion.

use crate::tracked::{ChainInfoUpdate, ChainTxStatus, OrderTrackingInfo, TrackedOrder};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use swap_bus::{CoordinatorEvent, SwapEventBus};
use swap_chains::ChainAdapter;
use swap_messages::verify_secret;
use swap_types::{
    now_millis, ChainTag, CoordinatorConfig, CrossChainState, ErrorCode, OrderId, SwapDirection,
    TxId,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Age past which a still-PENDING order requires attention (1 hour).
const PENDING_ATTENTION_AGE_MS: u64 = 3_600_000;

/// Tracking failure.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No tracked order with the given id.
    #[error("order not tracked: {0}")]
    NotTracked(OrderId),

    /// The order is already in the table.
    #[error("order already tracked: {0}")]
    AlreadyTracked(OrderId),

    /// The revealed secret does not hash to the stored hashlock.
    #[error("secret does not match hashlock for order {0}")]
    SecretMismatch(OrderId),
}

impl SyncError {
    /// Wire-level code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotTracked(_) => ErrorCode::OrderNotFound,
            Self::AlreadyTracked(_) => ErrorCode::InvalidParameters,
            Self::SecretMismatch(_) => ErrorCode::InvalidSecret,
        }
    }
}

/// Per-order state tracker across two chains.
pub struct StateSync {
    config: CoordinatorConfig,
    adapters: HashMap<ChainTag, Arc<dyn ChainAdapter>>,
    bus: Arc<SwapEventBus>,
    orders: Mutex<HashMap<OrderId, TrackedOrder>>,
    running: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl StateSync {
    /// Create a synchronizer over the two chain adapters.
    pub fn new(
        config: CoordinatorConfig,
        source: Arc<dyn ChainAdapter>,
        destination: Arc<dyn ChainAdapter>,
        bus: Arc<SwapEventBus>,
    ) -> Self {
        let mut adapters: HashMap<ChainTag, Arc<dyn ChainAdapter>> = HashMap::new();
        adapters.insert(source.chain(), source);
        adapters.insert(destination.chain(), destination);
        Self {
            config,
            adapters,
            bus,
            orders: Mutex::new(HashMap::new()),
            running: AtomicBool::new(false),
            task: Mutex::new(None),
        }
    }

    /// Start tracking an order in PENDING.
    pub fn track(&self, info: OrderTrackingInfo) -> Result<(), SyncError> {
        let order_id = info.order_id.clone();
        let cross_chain_id = info.cross_chain_id.clone();
        {
            let mut orders = self.orders.lock();
            if orders.contains_key(&order_id) {
                return Err(SyncError::AlreadyTracked(order_id));
            }
            orders.insert(order_id.clone(), TrackedOrder::new(info));
        }
        info!(order_id = %order_id, "order tracked");
        self.bus.publish(CoordinatorEvent::OrderTracked {
            order_id,
            cross_chain_id,
        });
        Ok(())
    }

    /// Merge a chain observation and advance the cross-chain state.
    pub fn update_chain_info(
        &self,
        order_id: &OrderId,
        chain: ChainTag,
        update: ChainInfoUpdate,
    ) -> Result<(), SyncError> {
        let transition = {
            let mut orders = self.orders.lock();
            let order = orders
                .get_mut(order_id)
                .ok_or_else(|| SyncError::NotTracked(order_id.clone()))?;

            let record = order.record_mut(chain);
            if update.tx_hash.is_some() {
                record.tx_hash = update.tx_hash;
            }
            if update.block.is_some() {
                record.block = update.block;
            }
            if update.log_index.is_some() {
                record.log_index = update.log_index;
            }
            record.status = update.status;
            order.updated_at = now_millis();

            let next = if update.status == ChainTxStatus::Confirmed {
                escrow_transition(order.state, order.direction, chain)
            } else {
                None
            };
            if let Some(next) = next {
                order.state = next;
            }
            next
        };

        if let Some(state) = transition {
            debug!(order_id = %order_id, %state, "cross-chain state advanced");
            self.bus.publish(CoordinatorEvent::SyncStateChanged {
                order_id: order_id.clone(),
                state,
            });
        }
        Ok(())
    }

    /// Record a secret reveal. The secret must hash to the stored hashlock.
    pub fn record_fulfillment(
        &self,
        order_id: &OrderId,
        secret: &str,
        tx_hash: TxId,
        chain: ChainTag,
    ) -> Result<(), SyncError> {
        {
            let mut orders = self.orders.lock();
            let order = orders
                .get_mut(order_id)
                .ok_or_else(|| SyncError::NotTracked(order_id.clone()))?;

            if !verify_secret(secret, &order.hashlock) {
                return Err(SyncError::SecretMismatch(order_id.clone()));
            }

            let record = order.record_mut(chain);
            record.tx_hash = Some(tx_hash);
            record.status = ChainTxStatus::Confirmed;
            order.secret = Some(secret.to_ascii_lowercase());
            order.state = CrossChainState::Fulfilled;
            order.updated_at = now_millis();
        }
        info!(order_id = %order_id, %chain, "fulfillment recorded");
        self.bus.publish(CoordinatorEvent::SyncStateChanged {
            order_id: order_id.clone(),
            state: CrossChainState::Fulfilled,
        });
        Ok(())
    }

    /// Record a refund on one chain.
    pub fn record_refund(
        &self,
        order_id: &OrderId,
        tx_hash: TxId,
        chain: ChainTag,
    ) -> Result<(), SyncError> {
        let state = {
            let mut orders = self.orders.lock();
            let order = orders
                .get_mut(order_id)
                .ok_or_else(|| SyncError::NotTracked(order_id.clone()))?;

            let record = order.record_mut(chain);
            record.tx_hash = Some(tx_hash);
            record.status = ChainTxStatus::Confirmed;

            let refunded_here = match chain {
                ChainTag::Ethereum => CrossChainState::RefundedSrc,
                ChainTag::Ton => CrossChainState::RefundedDst,
            };
            let refunded_other = match chain {
                ChainTag::Ethereum => CrossChainState::RefundedDst,
                ChainTag::Ton => CrossChainState::RefundedSrc,
            };
            order.state = if order.state == refunded_other {
                CrossChainState::RefundedBoth
            } else {
                refunded_here
            };
            order.updated_at = now_millis();
            order.state
        };
        info!(order_id = %order_id, %chain, %state, "refund recorded");
        self.bus.publish(CoordinatorEvent::SyncStateChanged {
            order_id: order_id.clone(),
            state,
        });
        Ok(())
    }

    /// Snapshot of one tracked order.
    pub fn get(&self, order_id: &OrderId) -> Option<TrackedOrder> {
        self.orders.lock().get(order_id).cloned()
    }

    /// All orders currently in the given state.
    pub fn query_by_state(&self, state: CrossChainState) -> Vec<TrackedOrder> {
        self.orders
            .lock()
            .values()
            .filter(|o| o.state == state)
            .cloned()
            .collect()
    }

    /// Non-terminal orders past their expiry instant.
    pub fn query_expired(&self) -> Vec<TrackedOrder> {
        let now = now_millis();
        self.orders
            .lock()
            .values()
            .filter(|o| o.is_expired(now) && !o.state.is_terminal())
            .cloned()
            .collect()
    }

    /// Orders an operator should look at: expired and non-terminal, stuck in
    /// PENDING for over an hour, or FAILED with retries remaining.
    pub fn query_requiring_attention(&self) -> Vec<TrackedOrder> {
        let now = now_millis();
        self.orders
            .lock()
            .values()
            .filter(|o| {
                (o.is_expired(now) && !o.state.is_terminal())
                    || (o.state == CrossChainState::Pending
                        && now.saturating_sub(o.created_at) > PENDING_ATTENTION_AGE_MS)
                    || (o.state == CrossChainState::Failed
                        && o.retry_count < self.config.max_attempts)
            })
            .cloned()
            .collect()
    }

    /// Remove terminal orders whose last change is older than the given age.
    pub fn cleanup(&self, max_age_ms: u64) -> usize {
        let now = now_millis();
        let mut orders = self.orders.lock();
        let before = orders.len();
        orders.retain(|_, o| {
            !(o.state.is_terminal() && now.saturating_sub(o.updated_at) >= max_age_ms)
        });
        before - orders.len()
    }

    /// One watcher tick: finality checks, then the expiry sweep. Public so
    /// tests and the runtime can drive it directly.
    pub async fn check_finality(&self) {
        // Pass 1: confirmation counting for non-finalized chains.
        let candidates: Vec<(OrderId, ChainTag, TxId)> = {
            let orders = self.orders.lock();
            orders
                .values()
                .filter(|o| !o.state.is_terminal())
                .flat_map(|o| {
                    [ChainTag::Ethereum, ChainTag::Ton]
                        .into_iter()
                        .filter_map(|chain| {
                            let finalized = match chain {
                                ChainTag::Ethereum => o.src_finalized,
                                ChainTag::Ton => o.dst_finalized,
                            };
                            if finalized {
                                return None;
                            }
                            let record = o.record(chain);
                            if record.status != ChainTxStatus::Confirmed {
                                return None;
                            }
                            record
                                .tx_hash
                                .clone()
                                .map(|tx| (o.order_id.clone(), chain, tx))
                        })
                        .collect::<Vec<_>>()
                })
                .collect()
        };

        for (order_id, chain, tx) in candidates {
            let Some(adapter) = self.adapters.get(&chain) else {
                continue;
            };
            let confirmations = match adapter.confirmations(&tx).await {
                Ok(confirmations) => confirmations,
                Err(e) => {
                    warn!(order_id = %order_id, %chain, error = %e, "confirmation check failed");
                    continue;
                }
            };

            let required = self.config.required_confirmations(chain);
            let finalized = {
                let mut orders = self.orders.lock();
                let Some(order) = orders.get_mut(&order_id) else {
                    continue;
                };
                order.record_mut(chain).confirmation_count = confirmations;
                if confirmations >= required {
                    match chain {
                        ChainTag::Ethereum => order.src_finalized = true,
                        ChainTag::Ton => order.dst_finalized = true,
                    }
                    order.updated_at = now_millis();
                    true
                } else {
                    false
                }
            };

            if finalized {
                debug!(order_id = %order_id, %chain, confirmations, "chain finalized");
                let event = match chain {
                    ChainTag::Ethereum => CoordinatorEvent::SourceFinalized {
                        order_id,
                        confirmations,
                    },
                    ChainTag::Ton => CoordinatorEvent::DestinationFinalized {
                        order_id,
                        confirmations,
                    },
                };
                self.bus.publish(event);
            }
        }

        // Pass 2: expiry sweep on the same tick.
        let now = now_millis();
        let expired: Vec<OrderId> = {
            let mut orders = self.orders.lock();
            let mut expired = Vec::new();
            for order in orders.values_mut() {
                let exempt = matches!(
                    order.state,
                    CrossChainState::Fulfilled
                        | CrossChainState::RefundedBoth
                        | CrossChainState::Failed
                );
                if !exempt && order.is_expired(now) {
                    order.state = CrossChainState::Failed;
                    order.last_error = Some("timelock reached".into());
                    order.updated_at = now;
                    expired.push(order.order_id.clone());
                }
            }
            expired
        };

        for order_id in expired {
            warn!(order_id = %order_id, "timelock reached");
            self.bus.publish(CoordinatorEvent::TimelockReached {
                order_id: order_id.clone(),
            });
            self.bus.publish(CoordinatorEvent::SyncStateChanged {
                order_id,
                state: CrossChainState::Failed,
            });
        }
    }

    /// Start the watcher loop. Calling `start` twice is a no-op.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(
            interval_ms = self.config.finality_check_interval_ms,
            "state sync started"
        );
        let sync = Arc::clone(self);
        let handle = tokio::spawn(async move {
            while sync.running.load(Ordering::SeqCst) {
                sync.check_finality().await;
                tokio::time::sleep(Duration::from_millis(
                    sync.config.finality_check_interval_ms,
                ))
                .await;
            }
        });
        *self.task.lock() = Some(handle);
    }

    /// Stop the watcher loop; the table is preserved. Calling `stop` twice
    /// is a no-op.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            let drain = Duration::from_millis(self.config.drain_timeout_ms);
            if tokio::time::timeout(drain, handle).await.is_err() {
                warn!("state sync drain timeout; abandoning in-flight tick");
            }
        }
        info!("state sync stopped");
    }

    /// Whether the watcher is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Escrow-confirmation transition table.
///
/// The EVM chain is the protocol's source side (SRC), TON the destination
/// side (DST). The first escrow confirmation lands on the maker's escrow
/// chain; the second completes the pair.
fn escrow_transition(
    state: CrossChainState,
    direction: SwapDirection,
    chain: ChainTag,
) -> Option<CrossChainState> {
    use CrossChainState::*;
    match (direction, chain, state) {
        (SwapDirection::EthToTon, ChainTag::Ethereum, Pending) => Some(EscrowedSrc),
        (SwapDirection::EthToTon, ChainTag::Ton, EscrowedSrc) => Some(EscrowedBoth),
        (SwapDirection::TonToEth, ChainTag::Ton, Pending) => Some(EscrowedDst),
        (SwapDirection::TonToEth, ChainTag::Ethereum, EscrowedDst) => Some(EscrowedBoth),
        _ => None,
    }
}

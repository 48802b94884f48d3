//! # Order Manager
//!
//! Constructs orders from intents, signs them as typed data, and owns the
//! order book through its lifecycle. Secrets for cross-chain orders are
//! generated here and kept only in memory until reveal.

use crate::book::OrderBookEntry;
use crate::error::OrderError;
use crate::intent::SwapIntent;
use crate::order::{derive_order_id, HtlcProfile, Order, OrderKind};
use crate::signing::{order_digest, SignedOrder, Signer, SigningDomain};
use parking_lot::Mutex;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use swap_bus::{CoordinatorEvent, SwapEventBus};
use swap_chains::ChainAdapter;
use swap_messages::{hashlock_hex, generate_secret, SecretBytes};
use swap_types::{
    now_millis, now_secs, Amount, CoordinatorConfig, CrossChainId, OrderId, OrderStatus, TxId,
};
use tracing::{debug, info};

/// Gas units budgeted for a cross-chain settlement transaction.
const SETTLEMENT_GAS_UNITS: u64 = 200_000;

/// Fee estimate for an order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeEstimate {
    /// Relayer fee, minor units.
    pub relayer_fee: Amount,
    /// Gas fee, minor units.
    pub gas_fee: Amount,
    /// Protocol fee, minor units.
    pub protocol_fee: Amount,
    /// Sum of the above.
    pub total: Amount,
}

/// Constructs, signs, and owns swap orders.
pub struct OrderManager {
    config: CoordinatorConfig,
    domain: SigningDomain,
    source: Arc<dyn ChainAdapter>,
    bus: Arc<SwapEventBus>,
    book: Mutex<HashMap<OrderId, OrderBookEntry>>,
    secrets: Mutex<HashMap<OrderId, SecretBytes>>,
}

impl OrderManager {
    /// Create a manager; the source adapter is used for gas sampling.
    pub fn new(
        config: CoordinatorConfig,
        source: Arc<dyn ChainAdapter>,
        bus: Arc<SwapEventBus>,
    ) -> Self {
        let domain = SigningDomain::new(config.chain_id, config.verifying_contract.clone());
        Self {
            config,
            domain,
            source,
            bus,
            book: Mutex::new(HashMap::new()),
            secrets: Mutex::new(HashMap::new()),
        }
    }

    /// The signing domain in use.
    pub fn domain(&self) -> &SigningDomain {
        &self.domain
    }

    /// Validate an intent and derive an order from it.
    ///
    /// Cross-chain intents get a generated secret; its hashlock and the
    /// derived timelock form the HTLC profile. The secret stays in memory
    /// here until reveal.
    pub fn construct(&self, intent: SwapIntent) -> Result<Order, OrderError> {
        self.validate_intent(&intent)?;

        let salt = intent.salt.unwrap_or_else(|| {
            let mut salt = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut salt);
            salt
        });
        let order_id = derive_order_id(&intent.maker, &salt, intent.deadline);
        let kind = OrderKind::classify(&intent);

        let htlc = match kind {
            OrderKind::Local => None,
            OrderKind::CrossChain(_) => {
                let secret = generate_secret();
                let hashlock = hashlock_hex(secret.as_bytes());
                self.secrets.lock().insert(order_id.clone(), secret);

                let relayer_fee = intent
                    .destination
                    .as_ref()
                    .and_then(|d| d.relayer_fee)
                    .unwrap_or(self.config.default_relayer_fee);
                Some(HtlcProfile {
                    hashlock,
                    timelock: now_secs() + self.config.min_timelock_s,
                    relayer_fee,
                })
            }
        };

        let order = Order {
            order_id: order_id.clone(),
            maker: intent.maker,
            receiver: intent.receiver,
            maker_asset: intent.maker_asset,
            taker_asset: intent.taker_asset,
            maker_amount: intent.maker_amount,
            taker_amount: intent.taker_amount,
            salt,
            deadline: intent.deadline,
            kind,
            destination: intent.destination,
            htlc,
            created_at: now_millis(),
        };

        debug!(order_id = %order_id, kind = ?order.kind, "order constructed");
        self.bus.publish(CoordinatorEvent::OrderConstructed {
            order_id,
            cross_chain: matches!(order.kind, OrderKind::CrossChain(_)),
        });
        Ok(order)
    }

    /// Re-validate and sign an order as typed structured data.
    pub fn sign(&self, order: Order, signer: &dyn Signer) -> Result<SignedOrder, OrderError> {
        self.validate_order(&order)?;

        let digest = order_digest(&order, &self.domain);
        let signature = signer.sign_digest(digest)?;
        let cross_chain_id = order.destination.as_ref().map(|_| CrossChainId::generate());

        Ok(SignedOrder {
            order,
            signature,
            order_hash: format!("0x{}", hex::encode(digest)),
            cross_chain_id,
        })
    }

    /// Add a signed order to the book in SIGNED.
    pub fn add(&self, signed: SignedOrder) -> Result<OrderId, OrderError> {
        let order_id = signed.order_id().clone();
        {
            let mut book = self.book.lock();
            if book.contains_key(&order_id) {
                return Err(OrderError::Duplicate(order_id));
            }
            book.insert(order_id.clone(), OrderBookEntry::new(Arc::new(signed)));
        }
        info!(order_id = %order_id, "order added to book");
        self.bus.publish(CoordinatorEvent::OrderEvent {
            order_id: order_id.clone(),
            status: OrderStatus::Created,
            tx_hash: None,
            error: None,
        });
        self.bus.publish(CoordinatorEvent::OrderEvent {
            order_id: order_id.clone(),
            status: OrderStatus::Signed,
            tx_hash: None,
            error: None,
        });
        Ok(order_id)
    }

    /// Transition an order through its lifecycle.
    pub fn update_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
        tx_hash: Option<TxId>,
        error: Option<String>,
    ) -> Result<(), OrderError> {
        {
            let mut book = self.book.lock();
            let entry = book
                .get_mut(order_id)
                .ok_or_else(|| OrderError::NotFound(order_id.clone()))?;

            if !entry.status.can_transition_to(status) {
                return Err(OrderError::InvalidTransition {
                    from: entry.status,
                    to: status,
                });
            }
            entry.status = status;
            entry.updated_at = now_millis();
            if tx_hash.is_some() {
                entry.tx_hash = tx_hash.clone();
            }
            if error.is_some() {
                entry.error = error.clone();
            }
            if status == OrderStatus::Completed {
                entry.filled_amount = entry.signed.order.maker_amount;
                entry.remaining_amount = Amount::ZERO;
            }
        }
        if status.is_terminal() && status != OrderStatus::Completed {
            // The secret is useless once the order can no longer complete.
            self.secrets.lock().remove(order_id);
        }
        debug!(order_id = %order_id, %status, "order status updated");
        self.bus.publish(CoordinatorEvent::OrderEvent {
            order_id: order_id.clone(),
            status,
            tx_hash,
            error,
        });
        Ok(())
    }

    /// Transition two entries in one critical section: both move or neither
    /// does. Validation of both transitions happens before either entry is
    /// touched, so a failure never leaves one leg moved and the other not.
    pub fn update_status_pair(
        &self,
        first: &OrderId,
        second: &OrderId,
        status: OrderStatus,
        tx_hash: Option<TxId>,
    ) -> Result<(), OrderError> {
        if first == second {
            return Err(OrderError::Validation(
                "pair transition requires two distinct orders".into(),
            ));
        }
        {
            let mut book = self.book.lock();
            for id in [first, second] {
                let entry = book
                    .get(id)
                    .ok_or_else(|| OrderError::NotFound(id.clone()))?;
                if !entry.status.can_transition_to(status) {
                    return Err(OrderError::InvalidTransition {
                        from: entry.status,
                        to: status,
                    });
                }
            }
            let now = now_millis();
            for id in [first, second] {
                if let Some(entry) = book.get_mut(id) {
                    entry.status = status;
                    entry.updated_at = now;
                    if tx_hash.is_some() {
                        entry.tx_hash = tx_hash.clone();
                    }
                    if status == OrderStatus::Completed {
                        entry.filled_amount = entry.signed.order.maker_amount;
                        entry.remaining_amount = Amount::ZERO;
                    }
                }
            }
        }
        if status.is_terminal() && status != OrderStatus::Completed {
            let mut secrets = self.secrets.lock();
            secrets.remove(first);
            secrets.remove(second);
        }
        debug!(first = %first, second = %second, %status, "order pair status updated");
        for id in [first, second] {
            self.bus.publish(CoordinatorEvent::OrderEvent {
                order_id: id.clone(),
                status,
                tx_hash: tx_hash.clone(),
                error: None,
            });
        }
        Ok(())
    }

    /// Snapshot of one entry.
    pub fn get(&self, order_id: &OrderId) -> Option<OrderBookEntry> {
        self.book.lock().get(order_id).cloned()
    }

    /// Snapshots of every entry in a status.
    pub fn by_status(&self, status: OrderStatus) -> Vec<OrderBookEntry> {
        self.book
            .lock()
            .values()
            .filter(|e| e.status == status)
            .cloned()
            .collect()
    }

    /// Snapshots of every entry for a maker (case-insensitive).
    pub fn by_maker(&self, maker: &str) -> Vec<OrderBookEntry> {
        self.book
            .lock()
            .values()
            .filter(|e| e.signed.order.maker.eq_ignore_ascii_case(maker))
            .cloned()
            .collect()
    }

    /// Cancel a resting order. Only the maker may cancel.
    pub fn cancel(&self, order_id: &OrderId, caller: &str) -> Result<(), OrderError> {
        {
            let book = self.book.lock();
            let entry = book
                .get(order_id)
                .ok_or_else(|| OrderError::NotFound(order_id.clone()))?;
            if !entry.signed.order.maker.eq_ignore_ascii_case(caller) {
                return Err(OrderError::UnauthorizedCancellation(order_id.clone()));
            }
        }
        self.update_status(order_id, OrderStatus::Cancelled, None, None)
    }

    /// Estimate fees. Local orders cost nothing; cross-chain orders pay the
    /// relayer, gas for one settlement, and the protocol's cut.
    pub async fn estimate_fees(&self, order: &Order) -> Result<FeeEstimate, OrderError> {
        let Some(htlc) = &order.htlc else {
            return Ok(FeeEstimate::default());
        };

        let gas_price = self.source.gas_price().await?;
        let gas_fee = gas_price.saturating_mul_u64(SETTLEMENT_GAS_UNITS);
        let protocol_fee = order.maker_amount.div_u64(1_000);
        let relayer_fee = htlc.relayer_fee;

        let total = relayer_fee
            .checked_add(gas_fee)
            .and_then(|sum| sum.checked_add(protocol_fee))
            .unwrap_or(Amount::ZERO);
        Ok(FeeEstimate {
            relayer_fee,
            gas_fee,
            protocol_fee,
            total,
        })
    }

    /// Expire every non-terminal entry whose deadline has passed. Returns
    /// the number of entries expired.
    pub fn cleanup_expired(&self) -> usize {
        let now = now_secs();
        let expired: Vec<OrderId> = {
            let book = self.book.lock();
            book.values()
                .filter(|e| !e.status.is_terminal() && e.signed.order.is_expired(now))
                .map(|e| e.order_id().clone())
                .collect()
        };

        let mut count = 0;
        for order_id in expired {
            if self
                .update_status(&order_id, OrderStatus::Expired, None, None)
                .is_ok()
            {
                count += 1;
            }
        }
        count
    }

    /// The in-memory secret for a cross-chain order, if still held.
    pub fn secret_for(&self, order_id: &OrderId) -> Option<SecretBytes> {
        self.secrets.lock().get(order_id).cloned()
    }

    /// Drop a secret (after reveal or when the order dies).
    pub fn discard_secret(&self, order_id: &OrderId) {
        self.secrets.lock().remove(order_id);
    }

    fn validate_intent(&self, intent: &SwapIntent) -> Result<(), OrderError> {
        if intent.maker.is_empty() || intent.receiver.is_empty() {
            return Err(OrderError::Validation(
                "maker and receiver are required".into(),
            ));
        }
        if intent.maker_asset.is_empty() || intent.taker_asset.is_empty() {
            return Err(OrderError::Validation("assets are required".into()));
        }
        if intent.maker_amount.is_zero() || intent.taker_amount.is_zero() {
            return Err(OrderError::Validation("amounts must be positive".into()));
        }
        let now = now_secs();
        if intent.deadline <= now {
            return Err(OrderError::ExpiredDeadline {
                deadline: intent.deadline,
                now,
            });
        }
        if let Some(destination) = &intent.destination {
            if destination.recipient.is_empty() {
                return Err(OrderError::MissingDestination);
            }
        }
        Ok(())
    }

    fn validate_order(&self, order: &Order) -> Result<(), OrderError> {
        if order.maker_amount.is_zero() || order.taker_amount.is_zero() {
            return Err(OrderError::Validation("amounts must be positive".into()));
        }
        let now = now_secs();
        if order.deadline <= now {
            return Err(OrderError::ExpiredDeadline {
                deadline: order.deadline,
                now,
            });
        }
        if let OrderKind::CrossChain(_) = order.kind {
            let htlc = order
                .htlc
                .as_ref()
                .ok_or_else(|| OrderError::Validation("cross-chain order without HTLC".into()))?;
            let min = now + self.config.min_timelock_s;
            let max = now + self.config.max_timelock_s;
            // Construction stamps timelock at exactly now + min; allow the
            // seconds that elapsed since.
            if htlc.timelock + 60 < min || htlc.timelock > max {
                return Err(OrderError::Validation(format!(
                    "timelock {} outside [{min}, {max}]",
                    htlc.timelock
                )));
            }
            if order
                .destination
                .as_ref()
                .map(|d| d.recipient.is_empty())
                .unwrap_or(true)
            {
                return Err(OrderError::MissingDestination);
            }
        }
        Ok(())
    }
}

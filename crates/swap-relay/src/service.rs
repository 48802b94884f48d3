//! # Message Relay Service
//!
//! Queue owner and processing loop. One cycle selects every due entry
//! oldest-first, dispatches it to the target adapter, and requires a
//! positive `verify` before declaring delivery. Failures back off linearly
//! (`retry_delay_ms × attempts`) until the attempt budget is spent.

use crate::queue::{QueueState, QueuedMessage, RelayStats};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use swap_bus::{CoordinatorEvent, SwapEventBus};
use swap_chains::ChainAdapter;
use swap_messages::{validate_with, CrossChainMessage, MessageError, TimelockBounds};
use swap_types::{now_millis, ChainTag, CoordinatorConfig, ErrorCode, QueuedId};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Enqueue failure.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The message failed validation.
    #[error(transparent)]
    Invalid(#[from] MessageError),

    /// No adapter serves the requested target chain.
    #[error("no adapter for target chain {0}")]
    UnknownTarget(ChainTag),
}

impl RelayError {
    /// Wire-level code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Invalid(e) => e.code(),
            Self::UnknownTarget(_) => ErrorCode::InvalidParameters,
        }
    }
}

/// At-least-once message relay.
pub struct MessageRelay {
    config: CoordinatorConfig,
    adapters: HashMap<ChainTag, Arc<dyn ChainAdapter>>,
    bus: Arc<SwapEventBus>,
    queue: Mutex<HashMap<QueuedId, QueuedMessage>>,
    seen_ids: Mutex<HashSet<String>>,
    seq: AtomicU64,
    running: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MessageRelay {
    /// Create a relay over the two chain adapters.
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
            queue: Mutex::new(HashMap::new()),
            seen_ids: Mutex::new(HashSet::new()),
            seq: AtomicU64::new(0),
            running: AtomicBool::new(false),
            task: Mutex::new(None),
        }
    }

    fn bounds(&self) -> TimelockBounds {
        // Orders stamp their timelock at construction; by enqueue time part
        // of the window has already elapsed, so the lower bound yields the
        // same allowance a skewed clock gets.
        TimelockBounds {
            min_s: self
                .config
                .min_timelock_s
                .saturating_sub(swap_messages::validate::MAX_CLOCK_SKEW_S),
            max_s: self.config.max_timelock_s,
        }
    }

    /// Validate and append a message; it becomes due immediately.
    pub fn enqueue(
        &self,
        message: CrossChainMessage,
        target: ChainTag,
    ) -> Result<QueuedId, RelayError> {
        validate_with(&message, self.bounds())?;
        if !self.adapters.contains_key(&target) {
            return Err(RelayError::UnknownTarget(target));
        }

        let message_id = message.message_id().clone();
        {
            let mut seen = self.seen_ids.lock();
            if !seen.insert(message_id.as_str().to_string()) {
                return Err(RelayError::Invalid(MessageError::DuplicateMessage(
                    message_id,
                )));
            }
        }

        let now = now_millis();
        let queued_id = QueuedId::generate();
        let entry = QueuedMessage {
            queued_id: queued_id.clone(),
            message,
            target,
            state: QueueState::Pending,
            attempts: 0,
            next_retry: now,
            created_at: now,
            last_attempt: None,
            last_error: None,
            delivered_tx: None,
            delivered_at: None,
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
        };
        debug!(queued_id = %queued_id, message_id = %message_id, %target, "message enqueued");
        self.queue.lock().insert(queued_id.clone(), entry);
        Ok(queued_id)
    }

    /// Snapshot of one entry.
    pub fn status(&self, queued_id: &QueuedId) -> Option<QueuedMessage> {
        self.queue.lock().get(queued_id).cloned()
    }

    /// Observable statistics.
    pub fn stats(&self) -> RelayStats {
        let queue = self.queue.lock();
        let mut stats = RelayStats {
            total: queue.len(),
            ..Default::default()
        };
        let mut latency_sum = 0u64;
        for entry in queue.values() {
            match entry.state {
                QueueState::Pending => stats.pending += 1,
                QueueState::Relaying => stats.relaying += 1,
                QueueState::Delivered => {
                    stats.delivered += 1;
                    if let Some(at) = entry.delivered_at {
                        latency_sum += at.saturating_sub(entry.created_at);
                    }
                }
                QueueState::Failed => stats.failed += 1,
                QueueState::Retry => stats.retry += 1,
            }
        }
        if stats.delivered > 0 {
            stats.avg_delivery_ms = latency_sum / stats.delivered as u64;
        }
        stats
    }

    /// Remove terminal entries whose last activity is older than the given
    /// age. Returns the number removed.
    pub fn cleanup(&self, older_than_ms: u64) -> usize {
        let now = now_millis();
        let mut queue = self.queue.lock();
        let before = queue.len();
        queue.retain(|_, entry| {
            if !entry.state.is_terminal() {
                return true;
            }
            let settled_at = entry
                .delivered_at
                .or(entry.last_attempt)
                .unwrap_or(entry.created_at);
            now.saturating_sub(settled_at) < older_than_ms
        });
        before - queue.len()
    }

    /// One cooperative processing cycle: dispatch every due entry,
    /// oldest-first. Public so tests and the runtime can drive it directly.
    pub async fn process_cycle(&self) {
        let now = now_millis();

        // Claim due entries under the lock, then dispatch without it.
        let due: Vec<(QueuedId, CrossChainMessage, ChainTag, u32, u64)> = {
            let mut queue = self.queue.lock();
            let mut due: Vec<&mut QueuedMessage> = queue
                .values_mut()
                .filter(|entry| entry.is_due(now))
                .collect();
            due.sort_by_key(|entry| (entry.created_at, entry.seq));
            due.into_iter()
                .map(|entry| {
                    entry.state = QueueState::Relaying;
                    entry.attempts += 1;
                    entry.last_attempt = Some(now);
                    (
                        entry.queued_id.clone(),
                        entry.message.clone(),
                        entry.target,
                        entry.attempts,
                        entry.created_at,
                    )
                })
                .collect()
        };

        for (queued_id, message, target, attempts, created_at) in due {
            self.dispatch(queued_id, message, target, attempts, created_at)
                .await;
        }
    }

    async fn dispatch(
        &self,
        queued_id: QueuedId,
        message: CrossChainMessage,
        target: ChainTag,
        attempts: u32,
        created_at: u64,
    ) {
        let adapter = match self.adapters.get(&target) {
            Some(adapter) => adapter.clone(),
            None => {
                // Unreachable after enqueue validation; treat as permanent.
                self.finish_failure(&queued_id, attempts, "adapter missing".into());
                return;
            }
        };

        let outcome = match adapter.submit(&message).await {
            Ok(tx) => match adapter.verify(&tx).await {
                Ok(true) => Ok(tx),
                Ok(false) => Err(format!("submitted {tx} but verification reported failure")),
                Err(e) => Err(format!("verify failed: {e}")),
            },
            Err(e) => Err(format!("submit failed: {e}")),
        };

        match outcome {
            Ok(tx) => {
                let delivered_at = now_millis();
                {
                    let mut queue = self.queue.lock();
                    if let Some(entry) = queue.get_mut(&queued_id) {
                        entry.state = QueueState::Delivered;
                        entry.delivered_tx = Some(tx.clone());
                        entry.delivered_at = Some(delivered_at);
                        entry.last_error = None;
                    }
                }
                info!(queued_id = %queued_id, %tx, attempts, "message delivered");
                self.bus.publish(CoordinatorEvent::MessageDelivered {
                    queued_id,
                    message_id: message.message_id().clone(),
                    target,
                    tx_id: tx,
                    attempts,
                    delivery_ms: delivered_at.saturating_sub(created_at),
                });
            }
            Err(error) => {
                if attempts >= self.config.max_attempts {
                    self.finish_failure(&queued_id, attempts, error.clone());
                    self.bus.publish(CoordinatorEvent::MessageFailed {
                        queued_id,
                        message_id: message.message_id().clone(),
                        attempts,
                        error,
                    });
                } else {
                    // Linear backoff: monotonically non-decreasing by design
                    // of attempts × base.
                    let next_retry =
                        now_millis() + self.config.retry_delay_ms.saturating_mul(attempts as u64);
                    {
                        let mut queue = self.queue.lock();
                        if let Some(entry) = queue.get_mut(&queued_id) {
                            entry.state = QueueState::Retry;
                            entry.next_retry = next_retry;
                            entry.last_error = Some(error.clone());
                        }
                    }
                    debug!(queued_id = %queued_id, attempts, next_retry, "message retry scheduled");
                    self.bus.publish(CoordinatorEvent::MessageRetry {
                        queued_id,
                        message_id: message.message_id().clone(),
                        attempts,
                        next_retry,
                        error,
                    });
                }
            }
        }
    }

    fn finish_failure(&self, queued_id: &QueuedId, attempts: u32, error: String) {
        warn!(queued_id = %queued_id, attempts, error, "message failed permanently");
        let mut queue = self.queue.lock();
        if let Some(entry) = queue.get_mut(queued_id) {
            entry.state = QueueState::Failed;
            entry.last_error = Some(error);
        }
    }

    /// Start the processing loop. Calling `start` twice is a no-op.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(
            interval_ms = self.config.processing_interval_ms,
            "relay started"
        );
        let relay = Arc::clone(self);
        let handle = tokio::spawn(async move {
            while relay.running.load(Ordering::SeqCst) {
                relay.process_cycle().await;
                tokio::time::sleep(Duration::from_millis(relay.config.processing_interval_ms))
                    .await;
            }
        });
        *self.task.lock() = Some(handle);
    }

    /// Stop the loop, waiting up to the drain timeout for in-flight work.
    /// The queue is preserved for a subsequent `start`. Calling `stop`
    /// twice is a no-op.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            let drain = Duration::from_millis(self.config.drain_timeout_ms);
            if tokio::time::timeout(drain, handle).await.is_err() {
                warn!("relay drain timeout; abandoning in-flight cycle");
            }
        }
        // Anything still marked RELAYING goes back to a recoverable RETRY.
        let now = now_millis();
        let mut queue = self.queue.lock();
        for entry in queue.values_mut() {
            if entry.state == QueueState::Relaying {
                entry.state = QueueState::Retry;
                entry.next_retry = now;
            }
        }
        info!("relay stopped");
    }

    /// Whether the loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

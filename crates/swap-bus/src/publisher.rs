//! # Event Publisher
//!
//! Broadcast-backed in-memory bus. Single-node by design; every component
//! holds an `Arc<SwapEventBus>` and publishes synchronously.

use crate::events::{CoordinatorEvent, EventFilter};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

/// In-memory event bus over `tokio::sync::broadcast`.
pub struct SwapEventBus {
    sender: broadcast::Sender<CoordinatorEvent>,
    events_published: AtomicU64,
    capacity: usize,
}

impl SwapEventBus {
    /// Create a bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus with a specific per-subscriber buffer capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Publish an event to all live subscribers.
    ///
    /// Returns the number of subscribers that received it. Publishing with
    /// no subscribers is not an error; the event is counted and dropped.
    pub fn publish(&self, event: CoordinatorEvent) -> usize {
        let topic = event.topic();
        self.events_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(event) {
            Ok(receiver_count) => {
                debug!(?topic, receivers = receiver_count, "event published");
                receiver_count
            }
            Err(_) => {
                debug!(?topic, "event dropped (no receivers)");
                0
            }
        }
    }

    /// Subscribe to events matching a filter.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Total events published since creation.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

impl Default for SwapEventBus {
    fn default() -> Self {
        Self::new()
    }
}

//! # Event Subscriber
//!
//! Filtered receive side of the bus.

use crate::events::{CoordinatorEvent, EventFilter};
use tokio::sync::broadcast;
use tracing::warn;

/// Why a receive ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvError {
    /// The bus was dropped; no more events will arrive.
    Closed,
}

/// A filtered subscription to the bus.
///
/// Events not matching the filter are consumed and discarded; `recv` only
/// resolves with matching events. A slow subscriber that overflows its
/// buffer skips the lost events and keeps receiving (the loss is logged).
pub struct Subscription {
    receiver: broadcast::Receiver<CoordinatorEvent>,
    filter: EventFilter,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<CoordinatorEvent>,
        filter: EventFilter,
    ) -> Self {
        Self { receiver, filter }
    }

    /// Await the next event matching the filter.
    pub async fn recv(&mut self) -> Result<CoordinatorEvent, RecvError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Ok(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "subscriber lagged; events dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return Err(RecvError::Closed),
            }
        }
    }

    /// Non-blocking variant; `None` when no matching event is buffered.
    pub fn try_recv(&mut self) -> Option<CoordinatorEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    warn!(missed, "subscriber lagged; events dropped");
                    continue;
                }
                Err(_) => return None,
            }
        }
    }
}

//! # Swap Relay
//!
//! At-least-once delivery of cross-chain messages. Messages are validated on
//! enqueue, dispatched oldest-first by a cooperative processing cycle, and
//! retried with a linearly growing backoff until delivered, or failed once
//! the attempt budget is spent. Delivery requires both a successful submit
//! and a positive `verify` on the returned transaction.
//!
//! The relay owns the queue; every retry decision lives here and never in
//! the adapters.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod queue;
pub mod service;

pub use queue::{QueueState, QueuedMessage, RelayStats};
pub use service::{MessageRelay, RelayError};

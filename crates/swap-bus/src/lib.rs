//! # Swap Bus - Event Bus for Coordinator Components
//!
//! Typed choreography between coordinator components: the order manager
//! announces signed orders, the relay reports delivery outcomes, the state
//! synchronizer reports finality and expiry, the engine reports executions.
//!
//! ```text
//! ┌───────────────┐                     ┌───────────────┐
//! │ Order Manager │                     │   Execution   │
//! │               │     publish()       │    Engine     │
//! │               │ ──────┐             │               │
//! └───────────────┘       ▼             └───────────────┘
//!                   ┌───────────┐              ↑
//!                   │ Event Bus │ ─────────────┘
//!                   └───────────┘   subscribe()
//! ```
//!
//! Events are a closed enum, not name strings; subscribers filter by topic
//! and receive only matching variants. An event carrying one status is
//! delivered to all live subscribers before the next status change is sent,
//! which is the ordering guarantee downstream components rely on.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{CoordinatorEvent, EventFilter, EventTopic};
pub use publisher::SwapEventBus;
pub use subscriber::{RecvError, Subscription};

/// Maximum events buffered per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

//! # Coordinator Runtime
//!
//! Builds and wires every component over a shared bus and two chain
//! adapters, routes events between them, and owns startup/shutdown order.
//!
//! ## Choreography
//!
//! - order manager publishes `OrderEvent{SIGNED}` → engine considers the
//!   order immediately (the scheduler would also pick it up later)
//! - sync publishes `TimelockReached` → engine runs the refund path
//! - adapters' polled chain events → fulfillment and refund handlers
//! - relay delivery outcomes are logged and observable via `stats`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coordinator;

pub use coordinator::Coordinator;

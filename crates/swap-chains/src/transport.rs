//! # RPC Transport Seam
//!
//! Adapters shape requests; something else moves bytes. The real client
//! (HTTP JSON-RPC, liteserver proxy) lives outside this workspace and
//! implements this trait; tests plug in closures or canned responses.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Transport-level failure. Always treated as transient by callers.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Could not reach the endpoint.
    #[error("network error: {0}")]
    Network(String),

    /// The endpoint answered with an RPC-level error object.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// Chain-specific error code.
        code: i64,
        /// Error description.
        message: String,
    },
}

/// One network attempt against a chain endpoint.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Perform a single request; no internal retry.
    async fn call(&self, method: &str, params: Value) -> Result<Value, TransportError>;
}

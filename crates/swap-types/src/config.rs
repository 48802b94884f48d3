//! # Coordinator Configuration
//!
//! One flat config object shared by all components, validated once at start.
//! Timing parameters are milliseconds, timelocks are seconds (as on-chain),
//! confirmations are small integers, amounts are decimal strings.

use crate::amount::Amount;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default relay processing tick.
pub const DEFAULT_PROCESSING_INTERVAL_MS: u64 = 2_000;
/// Default finality watcher tick.
pub const DEFAULT_FINALITY_CHECK_INTERVAL_MS: u64 = 10_000;
/// Default execution scheduler tick.
pub const DEFAULT_EXECUTION_INTERVAL_MS: u64 = 10_000;
/// Default per-message retry cap.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default base backoff unit.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 5_000;
/// Default bounded wait when stopping a loop with work in flight.
pub const DEFAULT_DRAIN_TIMEOUT_MS: u64 = 5_000;
/// Default source-chain finality threshold.
pub const DEFAULT_SRC_CONFIRMATIONS: u32 = 12;
/// Default destination-chain finality threshold.
pub const DEFAULT_DST_CONFIRMATIONS: u32 = 5;
/// Default minimum HTLC timelock distance (1 hour).
pub const DEFAULT_MIN_TIMELOCK_S: u64 = 3_600;
/// Default maximum HTLC timelock distance (7 days).
pub const DEFAULT_MAX_TIMELOCK_S: u64 = 604_800;
/// Default execution eligibility age.
pub const DEFAULT_MAX_ORDER_AGE_MS: u64 = 3_600_000;
/// Default slippage bound.
pub const DEFAULT_MAX_SLIPPAGE: f64 = 0.05;
/// Default orders processed per scheduler tick.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 10;
/// Default age past which terminal tracked orders are removed (24 hours).
pub const DEFAULT_CLEANUP_MAX_AGE_MS: u64 = 86_400_000;

/// Flat coordinator configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Relay tick interval in milliseconds.
    pub processing_interval_ms: u64,
    /// Finality watcher tick interval in milliseconds.
    pub finality_check_interval_ms: u64,
    /// Execution scheduler tick interval in milliseconds.
    pub execution_interval_ms: u64,
    /// Per-message relay retry cap.
    pub max_attempts: u32,
    /// Base backoff unit in milliseconds.
    pub retry_delay_ms: u64,
    /// Bounded wait for in-flight work when stopping a loop, milliseconds.
    pub drain_timeout_ms: u64,
    /// Confirmations required to finalize the source chain.
    pub src_confirmations: u32,
    /// Confirmations required to finalize the destination chain.
    pub dst_confirmations: u32,
    /// Minimum timelock distance from now, seconds.
    pub min_timelock_s: u64,
    /// Maximum timelock distance from now, seconds.
    pub max_timelock_s: u64,
    /// Maximum age of a SIGNED order still eligible for execution, ms.
    pub max_order_age_ms: u64,
    /// Minimum maker amount eligible for execution.
    pub min_order_size: Amount,
    /// Price compatibility bound, in [0, 1].
    pub max_slippage: f64,
    /// Relayer fee applied when the order carries no hint.
    pub default_relayer_fee: Amount,
    /// Orders processed per scheduler tick.
    pub max_batch_size: usize,
    /// Age past which terminal entries are removed by cleanup, ms.
    pub cleanup_max_age_ms: u64,
    /// EIP-712 signing domain chain id.
    pub chain_id: u64,
    /// EIP-712 signing domain verifying contract.
    pub verifying_contract: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            processing_interval_ms: DEFAULT_PROCESSING_INTERVAL_MS,
            finality_check_interval_ms: DEFAULT_FINALITY_CHECK_INTERVAL_MS,
            execution_interval_ms: DEFAULT_EXECUTION_INTERVAL_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            drain_timeout_ms: DEFAULT_DRAIN_TIMEOUT_MS,
            src_confirmations: DEFAULT_SRC_CONFIRMATIONS,
            dst_confirmations: DEFAULT_DST_CONFIRMATIONS,
            min_timelock_s: DEFAULT_MIN_TIMELOCK_S,
            max_timelock_s: DEFAULT_MAX_TIMELOCK_S,
            max_order_age_ms: DEFAULT_MAX_ORDER_AGE_MS,
            min_order_size: Amount::from_u64(1),
            max_slippage: DEFAULT_MAX_SLIPPAGE,
            default_relayer_fee: Amount::ZERO,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            cleanup_max_age_ms: DEFAULT_CLEANUP_MAX_AGE_MS,
            chain_id: 1,
            verifying_contract: "0x0000000000000000000000000000000000000000".to_string(),
        }
    }
}

/// Configuration validation failure; names the offending key.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid config key `{key}`: {reason}")]
pub struct ConfigError {
    /// The rejected key.
    pub key: &'static str,
    /// Why it was rejected.
    pub reason: String,
}

impl ConfigError {
    fn new(key: &'static str, reason: impl Into<String>) -> Self {
        Self {
            key,
            reason: reason.into(),
        }
    }
}

impl CoordinatorConfig {
    /// Validate every field; called once at start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing_interval_ms == 0 {
            return Err(ConfigError::new("processing_interval_ms", "must be > 0"));
        }
        if self.finality_check_interval_ms == 0 {
            return Err(ConfigError::new("finality_check_interval_ms", "must be > 0"));
        }
        if self.execution_interval_ms == 0 {
            return Err(ConfigError::new("execution_interval_ms", "must be > 0"));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::new("max_attempts", "must be >= 1"));
        }
        if self.min_timelock_s == 0 || self.min_timelock_s >= self.max_timelock_s {
            return Err(ConfigError::new(
                "min_timelock_s",
                format!(
                    "must be > 0 and < max_timelock_s ({})",
                    self.max_timelock_s
                ),
            ));
        }
        if !(0.0..=1.0).contains(&self.max_slippage) {
            return Err(ConfigError::new("max_slippage", "must be within [0, 1]"));
        }
        if self.max_batch_size == 0 {
            return Err(ConfigError::new("max_batch_size", "must be >= 1"));
        }
        if self.chain_id == 0 {
            return Err(ConfigError::new("chain_id", "must be > 0"));
        }
        if crate::chain::parse_evm_address(&self.verifying_contract).is_none() {
            return Err(ConfigError::new(
                "verifying_contract",
                "must be a 20-byte hex address",
            ));
        }
        Ok(())
    }

    /// Finality threshold for a chain.
    pub fn required_confirmations(&self, chain: crate::ChainTag) -> u32 {
        match chain {
            crate::ChainTag::Ethereum => self.src_confirmations,
            crate::ChainTag::Ton => self.dst_confirmations,
        }
    }
}

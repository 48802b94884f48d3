//! # TonFusion Coordinator Binary
//!
//! Assembles the coordinator and runs it until interrupted. Chain transports
//! are deployment-specific; this binary wires the in-memory adapters so the
//! full pipeline (order book, relay, sync, engine) can be exercised without
//! live endpoints.

use anyhow::Result;
use std::sync::Arc;
use swap_chains::MockChainAdapter;
use swap_orders::LocalSigner;
use swap_types::{ChainTag, CoordinatorConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use coordinator_runtime::Coordinator;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("===========================================");
    info!("  TonFusion Coordinator v{}", swap_types::VERSION);
    info!("===========================================");

    let config = CoordinatorConfig::default();
    info!(
        processing_interval_ms = config.processing_interval_ms,
        finality_check_interval_ms = config.finality_check_interval_ms,
        execution_interval_ms = config.execution_interval_ms,
        "configuration loaded"
    );

    let source = Arc::new(MockChainAdapter::new(ChainTag::Ethereum));
    let destination = Arc::new(MockChainAdapter::new(ChainTag::Ton));
    let signer = Arc::new(LocalSigner::random());

    let coordinator = Arc::new(Coordinator::new(config, source, destination, signer)?);
    coordinator.start();

    info!("coordinator is running; press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;

    info!("shutting down gracefully");
    coordinator.stop().await;
    Ok(())
}

//! Shared setup for integration scenarios: an assembled coordinator over
//! two mock adapters.

use std::sync::Arc;
use swap_chains::MockChainAdapter;
use swap_orders::{LocalSigner, SwapIntent, TonDestination};
use swap_types::{Amount, ChainTag, CoordinatorConfig};

use coordinator_runtime::Coordinator;

/// Assembled coordinator plus handles to its mocks.
pub struct Harness {
    pub coordinator: Arc<Coordinator>,
    pub source: Arc<MockChainAdapter>,
    pub destination: Arc<MockChainAdapter>,
}

/// Build a coordinator over fresh mocks.
pub fn harness_with(config: CoordinatorConfig) -> Harness {
    let source = Arc::new(MockChainAdapter::new(ChainTag::Ethereum));
    let destination = Arc::new(MockChainAdapter::new(ChainTag::Ton));
    let coordinator = Arc::new(
        Coordinator::new(
            config,
            source.clone(),
            destination.clone(),
            Arc::new(LocalSigner::random()),
        )
        .expect("default config is valid"),
    );
    Harness {
        coordinator,
        source,
        destination,
    }
}

/// Build a coordinator with the default config.
pub fn harness() -> Harness {
    harness_with(CoordinatorConfig::default())
}

/// A local intent: `maker` gives `give` of `give_asset` for `want` of
/// `want_asset`, deadline one hour out.
pub fn local_intent(
    maker: &str,
    give_asset: &str,
    want_asset: &str,
    give: u64,
    want: u64,
) -> SwapIntent {
    SwapIntent {
        maker: maker.into(),
        receiver: maker.into(),
        maker_asset: give_asset.into(),
        taker_asset: want_asset.into(),
        maker_amount: Amount::from_u64(give),
        taker_amount: Amount::from_u64(want),
        deadline: swap_types::now_secs() + 3_600,
        destination: None,
        salt: None,
    }
}

/// A cross-chain intent: 1×10¹⁸ source units for 1×10¹¹ destination units,
/// destination recipient on TON, deadline one hour out.
pub fn cross_intent() -> SwapIntent {
    SwapIntent {
        maker: "0x742d35cc6634c0532925a3b844bc454e4438f44e".into(),
        receiver: "0x742d35cc6634c0532925a3b844bc454e4438f44e".into(),
        maker_asset: "0x0000000000000000000000000000000000000001".into(),
        taker_asset: "ton:native".into(),
        maker_amount: Amount::from_dec_str("1000000000000000000").unwrap(),
        taker_amount: Amount::from_dec_str("100000000000").unwrap(),
        deadline: swap_types::now_secs() + 3_600,
        destination: Some(TonDestination {
            recipient: "EQCD39VS5jcptHL8vMjEXrzGaRcCVYto7HUn4bpAOg8xqB2N".into(),
            chain_id: 607,
            jetton_master: None,
            relayer_fee: None,
        }),
        salt: None,
    }
}

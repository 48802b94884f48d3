//! Lifecycle scenarios: expired-order sweep, cancellation authorization,
//! start/stop idempotence, and timelock expiry through the watcher.


use super::harness::{cross_intent, harness, harness_with, local_intent};
use std::time::Duration;
use swap_bus::{CoordinatorEvent, EventFilter, EventTopic};
use swap_orders::SignedOrder;
use swap_types::{CoordinatorConfig, CrossChainState, ErrorCode, OrderStatus};

const MAKER: &str = "0x00000000000000000000000000000000000000a1";
const ASSET_X: &str = "0x0000000000000000000000000000000000000011";
const ASSET_Y: &str = "0x0000000000000000000000000000000000000022";

#[tokio::test]
async fn expired_deadline_sweep_emits_event() {
    let h = harness();
    // Construct with a valid deadline, then backdate the signed order to
    // simulate time passing.
    let order = h
        .coordinator
        .manager()
        .construct(local_intent(MAKER, ASSET_X, ASSET_Y, 1, 2))
        .unwrap();
    let mut backdated = order;
    backdated.deadline = swap_types::now_secs() - 10;
    let signed = SignedOrder {
        order: backdated,
        signature: "0xsig".into(),
        order_hash: "0xhash".into(),
        cross_chain_id: None,
    };
    let id = h.coordinator.manager().add(signed).unwrap();

    let mut sub = h
        .coordinator
        .bus()
        .subscribe(EventFilter::topics(vec![EventTopic::Orders]));
    assert_eq!(h.coordinator.manager().cleanup_expired(), 1);
    assert_eq!(
        h.coordinator.manager().get(&id).unwrap().status,
        OrderStatus::Expired
    );

    let mut saw_expired = false;
    while let Some(event) = sub.try_recv() {
        if let CoordinatorEvent::OrderEvent {
            status: OrderStatus::Expired,
            ..
        } = event
        {
            saw_expired = true;
        }
    }
    assert!(saw_expired);
}

#[tokio::test]
async fn only_the_maker_cancels() {
    let h = harness();
    let id = h
        .coordinator
        .submit_intent(local_intent(MAKER, ASSET_X, ASSET_Y, 1, 2))
        .unwrap();

    let err = h
        .coordinator
        .manager()
        .cancel(&id, "0x00000000000000000000000000000000000000ff")
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnauthorizedCancellation);

    h.coordinator
        .manager()
        .cancel(&id, &MAKER.to_uppercase().replace("0X", "0x"))
        .unwrap();
    assert_eq!(
        h.coordinator.manager().get(&id).unwrap().status,
        OrderStatus::Cancelled
    );
}

#[tokio::test]
async fn coordinator_start_stop_twice_is_noop() {
    let h = harness();
    h.coordinator.start();
    h.coordinator.start();
    assert!(h.coordinator.relay().is_running());

    h.coordinator.stop().await;
    h.coordinator.stop().await;
    assert!(!h.coordinator.relay().is_running());
    assert!(!h.coordinator.sync().is_running());
    assert!(!h.coordinator.engine().is_running());
}

#[tokio::test]
async fn watcher_fails_orders_past_timelock() {
    let config = CoordinatorConfig {
        min_timelock_s: 1,
        ..Default::default()
    };
    let h = harness_with(config);
    let id = h.coordinator.submit_intent(cross_intent()).unwrap();
    h.coordinator.engine().execute_order(&id).await.unwrap();

    tokio::time::sleep(Duration::from_millis(1_100)).await;
    h.coordinator.sync().check_finality().await;

    let tracked = h.coordinator.sync().get(&id).unwrap();
    assert_eq!(tracked.state, CrossChainState::Failed);
    assert_eq!(tracked.last_error.as_deref(), Some("timelock reached"));
}

#[tokio::test]
async fn signed_orders_get_immediate_consideration_when_running() {
    let h = harness();
    h.coordinator.start();

    // Submit both legs; the router reacts to the SIGNED events without
    // waiting for a scheduler tick.
    h.coordinator
        .submit_intent(local_intent(MAKER, ASSET_X, ASSET_Y, 1, 2))
        .unwrap();
    let b = h
        .coordinator
        .submit_intent(local_intent(
            "0x00000000000000000000000000000000000000b2",
            ASSET_Y,
            ASSET_X,
            2,
            1,
        ))
        .unwrap();

    let deadline = swap_types::now_millis() + 2_000;
    loop {
        let status = h.coordinator.manager().get(&b).unwrap().status;
        if status == OrderStatus::Completed {
            break;
        }
        assert!(
            swap_types::now_millis() < deadline,
            "orders not matched in time (status {status})"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    h.coordinator.stop().await;
}

//! Relay behavior through the assembled coordinator: retry-then-deliver,
//! permanent failure, and delivery verification.


use super::harness::{cross_intent, harness_with};
use std::time::Duration;
use swap_types::{now_millis, CoordinatorConfig};

fn fast_config() -> CoordinatorConfig {
    CoordinatorConfig {
        processing_interval_ms: 10,
        retry_delay_ms: 10,
        ..Default::default()
    }
}

#[tokio::test]
async fn submit_fails_twice_then_delivers() {
    let h = harness_with(fast_config());
    let id = h.coordinator.submit_intent(cross_intent()).unwrap();
    h.destination.fail_submits(2);
    h.coordinator.engine().execute_order(&id).await.unwrap();

    // Drive the relay until the message lands.
    let deadline = now_millis() + 2_000;
    loop {
        h.coordinator.relay().process_cycle().await;
        let stats = h.coordinator.relay().stats();
        if stats.delivered == 1 {
            break;
        }
        assert!(now_millis() < deadline, "message not delivered in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // Attempts == 3, elapsed ≥ 2 × base delay.
    let stats = h.coordinator.relay().stats();
    assert_eq!(stats.delivered, 1);
    assert_eq!(stats.failed, 0);
    assert!(stats.avg_delivery_ms >= 2 * 10);
    assert_eq!(h.destination.submitted_messages().len(), 1);
}

#[tokio::test]
async fn exhausted_attempts_fail_permanently() {
    let h = harness_with(fast_config());
    let id = h.coordinator.submit_intent(cross_intent()).unwrap();
    h.destination.fail_submits(100);
    h.coordinator.engine().execute_order(&id).await.unwrap();

    let deadline = now_millis() + 2_000;
    loop {
        h.coordinator.relay().process_cycle().await;
        if h.coordinator.relay().stats().failed == 1 {
            break;
        }
        assert!(now_millis() < deadline, "message did not fail in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(h.coordinator.relay().stats().delivered, 0);
}

#[tokio::test]
async fn delivery_requires_positive_verification() {
    let h = harness_with(fast_config());
    let id = h.coordinator.submit_intent(cross_intent()).unwrap();
    h.coordinator.engine().execute_order(&id).await.unwrap();

    // The destination's first submission is the relayed message (the escrow
    // went to the source adapter); its tx verifies false.
    h.destination
        .set_verify(&swap_types::TxId::new("0xtonmock0001"), false);

    h.coordinator.relay().process_cycle().await;

    let stats = h.coordinator.relay().stats();
    assert_eq!(stats.delivered, 0);
    assert_eq!(stats.retry, 1);
    // Entry is preserved, not lost.
    assert_eq!(stats.total, 1);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn relay_queue_ordering_is_fifo() {
    let h = harness_with(fast_config());
    let first = h.coordinator.submit_intent(cross_intent()).unwrap();
    let mut second_intent = cross_intent();
    second_intent.salt = Some([3u8; 32]);
    let second = h.coordinator.submit_intent(second_intent).unwrap();

    h.coordinator.engine().execute_order(&first).await.unwrap();
    h.coordinator.engine().execute_order(&second).await.unwrap();
    h.coordinator.relay().process_cycle().await;

    let delivered = h.destination.submitted_messages();
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[0].order_id().unwrap(), &first);
    assert_eq!(delivered[1].order_id().unwrap(), &second);
}

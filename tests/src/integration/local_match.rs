//! Local complementary fills through the assembled coordinator.


use super::harness::{harness, local_intent};
use swap_bus::{CoordinatorEvent, EventFilter, EventTopic};
use swap_types::{Amount, OrderStatus};

const MAKER_A: &str = "0x00000000000000000000000000000000000000a1";
const MAKER_B: &str = "0x00000000000000000000000000000000000000b2";
const ASSET_X: &str = "0x0000000000000000000000000000000000000011";
const ASSET_Y: &str = "0x0000000000000000000000000000000000000022";

#[tokio::test]
async fn complementary_orders_complete_together() {
    let h = harness();
    let mut sub = h
        .coordinator
        .bus()
        .subscribe(EventFilter::topics(vec![EventTopic::Orders]));

    // A offers 1 X for 2 Y; B offers 2 Y for 1 X.
    let a = h
        .coordinator
        .submit_intent(local_intent(MAKER_A, ASSET_X, ASSET_Y, 1, 2))
        .unwrap();
    let b = h
        .coordinator
        .submit_intent(local_intent(MAKER_B, ASSET_Y, ASSET_X, 2, 1))
        .unwrap();

    let outcome = h.coordinator.engine().execute_order(&a).await.unwrap();
    match outcome {
        swap_engine::ExecutionOutcome::Local(fill) => {
            assert_eq!(fill.matched_order_id, b);
            assert_eq!(fill.matched_amount, Amount::from_u64(1));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    assert_eq!(
        h.coordinator.manager().get(&a).unwrap().status,
        OrderStatus::Completed
    );
    assert_eq!(
        h.coordinator.manager().get(&b).unwrap().status,
        OrderStatus::Completed
    );

    // Both legs produced a COMPLETED order event.
    let mut completed = 0;
    while let Some(event) = sub.try_recv() {
        if let CoordinatorEvent::OrderEvent {
            status: OrderStatus::Completed,
            ..
        } = event
        {
            completed += 1;
        }
    }
    assert_eq!(completed, 2);
}

#[tokio::test]
async fn filled_amounts_settle_on_completion() {
    let h = harness();
    let a = h
        .coordinator
        .submit_intent(local_intent(MAKER_A, ASSET_X, ASSET_Y, 1, 2))
        .unwrap();
    h.coordinator
        .submit_intent(local_intent(MAKER_B, ASSET_Y, ASSET_X, 2, 1))
        .unwrap();

    h.coordinator.engine().execute_order(&a).await.unwrap();

    let entry = h.coordinator.manager().get(&a).unwrap();
    assert_eq!(entry.filled_amount, Amount::from_u64(1));
    assert_eq!(entry.remaining_amount, Amount::ZERO);
}

#[tokio::test]
async fn concurrent_complementary_executions_settle_once() {
    // Both legs rest in the book, then both are driven into execution
    // concurrently, each finding the other as its match. Exactly one fill
    // settles; the loser must not strand either leg mid-transition.
    let h = harness();
    let a = h
        .coordinator
        .submit_intent(local_intent(MAKER_A, ASSET_X, ASSET_Y, 1, 2))
        .unwrap();
    let b = h
        .coordinator
        .submit_intent(local_intent(MAKER_B, ASSET_Y, ASSET_X, 2, 1))
        .unwrap();

    let engine = h.coordinator.engine();
    let (ra, rb) = tokio::join!(engine.execute_order(&a), engine.execute_order(&b));

    let results = [ra, rb];
    let fills = results
        .iter()
        .filter(|r| matches!(r, Ok(swap_engine::ExecutionOutcome::Local(_))))
        .count();
    assert_eq!(fills, 1);
    assert_eq!(h.source.trades().len(), 1);
    assert_eq!(
        h.coordinator.manager().get(&a).unwrap().status,
        OrderStatus::Completed
    );
    assert_eq!(
        h.coordinator.manager().get(&b).unwrap().status,
        OrderStatus::Completed
    );
}

#[tokio::test]
async fn incompatible_prices_never_match() {
    let h = harness();
    // A wants 2 Y per X; B wants 3 X per 2 Y. Product 2 × 1.5 = 3 > 1.05.
    let a = h
        .coordinator
        .submit_intent(local_intent(MAKER_A, ASSET_X, ASSET_Y, 1, 2))
        .unwrap();
    h.coordinator
        .submit_intent(local_intent(MAKER_B, ASSET_Y, ASSET_X, 2, 3))
        .unwrap();

    let outcome = h.coordinator.engine().execute_order(&a).await.unwrap();
    assert!(matches!(outcome, swap_engine::ExecutionOutcome::NoMatch));
    assert_eq!(
        h.coordinator.manager().get(&a).unwrap().status,
        OrderStatus::Signed
    );
}

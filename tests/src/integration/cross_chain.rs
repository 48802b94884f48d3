//! Cross-chain HTLC scenarios: happy path, invalid secret, refund path,
//! and the concurrent execution guard.


use super::harness::{cross_intent, harness, harness_with};
use std::time::Duration;
use swap_bus::{CoordinatorEvent, EventFilter, EventTopic};
use swap_chains::{ChainEvent, EventCursor};
use swap_engine::{EngineError, ExecutionOutcome};
use swap_messages::generate_secret;
use swap_types::{CoordinatorConfig, CrossChainState, OrderStatus, TxId};

#[tokio::test]
async fn happy_path_completes_on_secret_reveal() {
    let h = harness();
    let id = h.coordinator.submit_intent(cross_intent()).unwrap();
    let secret = h.coordinator.manager().secret_for(&id).unwrap();

    // Execution places the escrow and enqueues the announcement.
    let outcome = h.coordinator.engine().execute_order(&id).await.unwrap();
    let execution = match outcome {
        ExecutionOutcome::CrossChain(execution) => execution,
        other => panic!("unexpected outcome: {other:?}"),
    };
    assert_eq!(h.source.escrows().len(), 1);
    assert_eq!(h.coordinator.relay().stats().total, 1);

    // The relay delivers the escrow message to TON.
    h.coordinator.relay().process_cycle().await;
    assert_eq!(h.coordinator.relay().stats().delivered, 1);
    assert_eq!(h.destination.submitted_messages().len(), 1);

    // The destination chain reports the fulfillment; the pump routes it.
    let mut sub = h
        .coordinator
        .bus()
        .subscribe(EventFilter::topics(vec![EventTopic::Engine]));
    h.destination.push_event(ChainEvent::Fulfillment {
        order_id: id.clone(),
        tx: TxId::new("0xbb"),
        cursor: EventCursor {
            position: 7,
            sub_position: 0,
        },
        secret: secret.to_hex(),
    });
    h.coordinator.pump_chain_events().await;

    assert_eq!(
        h.coordinator.manager().get(&id).unwrap().status,
        OrderStatus::Completed
    );
    assert_eq!(
        h.coordinator.sync().get(&id).unwrap().state,
        CrossChainState::Fulfilled
    );
    let pending = h.coordinator.engine().pending_execution(&id).unwrap();
    assert_eq!(pending.source_tx_hash, Some(execution.source_tx));
    assert!(matches!(
        sub.try_recv(),
        Some(CoordinatorEvent::CrossChainExecutionCompleted { .. })
    ));
}

#[tokio::test]
async fn invalid_secret_fails_order_without_corrupting_sync() {
    let h = harness();
    let id = h.coordinator.submit_intent(cross_intent()).unwrap();
    h.coordinator.engine().execute_order(&id).await.unwrap();

    let mut sub = h
        .coordinator
        .bus()
        .subscribe(EventFilter::topics(vec![EventTopic::Engine]));
    h.destination.push_event(ChainEvent::Fulfillment {
        order_id: id.clone(),
        tx: TxId::new("0xbb"),
        cursor: EventCursor {
            position: 7,
            sub_position: 0,
        },
        secret: generate_secret().to_hex(),
    });
    h.coordinator.pump_chain_events().await;

    assert_eq!(
        h.coordinator.manager().get(&id).unwrap().status,
        OrderStatus::Failed
    );
    // No cross-chain state change beyond the failure event.
    assert_eq!(
        h.coordinator.sync().get(&id).unwrap().state,
        CrossChainState::Pending
    );
    assert!(matches!(
        sub.try_recv(),
        Some(CoordinatorEvent::CryptoMismatch { .. })
    ));
}

#[tokio::test]
async fn escrow_confirmation_advances_tracked_state() {
    let h = harness();
    let id = h.coordinator.submit_intent(cross_intent()).unwrap();
    let execution = match h.coordinator.engine().execute_order(&id).await.unwrap() {
        ExecutionOutcome::CrossChain(execution) => execution,
        other => panic!("unexpected outcome: {other:?}"),
    };

    h.source.push_event(ChainEvent::EscrowCreated {
        order_id: id.clone(),
        tx: execution.source_tx.clone(),
        cursor: EventCursor {
            position: 19_000_001,
            sub_position: 2,
        },
        amount: h.coordinator.manager().get(&id).unwrap().signed.order.maker_amount,
        hashlock: h
            .coordinator
            .sync()
            .get(&id)
            .unwrap()
            .hashlock
            .clone(),
    });
    h.coordinator.pump_chain_events().await;

    let tracked = h.coordinator.sync().get(&id).unwrap();
    assert_eq!(tracked.state, CrossChainState::EscrowedSrc);
    assert_eq!(tracked.eth.block, Some(19_000_001));
}

#[tokio::test]
async fn refund_path_runs_after_timelock() {
    let config = CoordinatorConfig {
        min_timelock_s: 1,
        ..Default::default()
    };
    let h = harness_with(config);
    let id = h.coordinator.submit_intent(cross_intent()).unwrap();
    h.coordinator.engine().execute_order(&id).await.unwrap();

    // Before the timelock the refund is rejected.
    let err = h.coordinator.engine().cancel_execution(&id).await;
    assert!(matches!(
        err,
        Err(EngineError::TimelockNotReached { .. })
    ));

    tokio::time::sleep(Duration::from_millis(1_100)).await;
    let refund_tx = h.coordinator.engine().cancel_execution(&id).await.unwrap();
    assert!(refund_tx.is_some());
    assert_eq!(h.source.refunds().len(), 1);
    assert_eq!(
        h.coordinator.manager().get(&id).unwrap().status,
        OrderStatus::Cancelled
    );
    assert_eq!(
        h.coordinator.sync().get(&id).unwrap().state,
        CrossChainState::RefundedSrc
    );
}

#[tokio::test]
async fn concurrent_executions_resolve_to_one_winner() {
    let h = harness();
    let id = h.coordinator.submit_intent(cross_intent()).unwrap();
    let engine = h.coordinator.engine();

    let (r1, r2, r3) = tokio::join!(
        engine.execute_order(&id),
        engine.execute_order(&id),
        engine.execute_order(&id),
    );

    let results = [r1, r2, r3];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(EngineError::AlreadyInExecution(_))))
            .count(),
        2
    );
    // Exactly one escrow was placed.
    assert_eq!(h.source.escrows().len(), 1);
}

#[tokio::test]
async fn destination_finality_is_tracked() {
    let h = harness();
    let id = h.coordinator.submit_intent(cross_intent()).unwrap();
    h.coordinator.engine().execute_order(&id).await.unwrap();

    // Destination escrow confirmed on TON.
    h.destination.push_event(ChainEvent::EscrowCreated {
        order_id: id.clone(),
        tx: TxId::new("tonescrow"),
        cursor: EventCursor {
            position: 41,
            sub_position: 0,
        },
        amount: swap_types::Amount::from_u64(1),
        hashlock: h.coordinator.sync().get(&id).unwrap().hashlock.clone(),
    });
    h.coordinator.pump_chain_events().await;

    // With 5 confirmations TON finalizes (threshold 5), Ethereum does not
    // (threshold 12).
    h.destination.set_default_confirmations(5);
    h.coordinator.sync().check_finality().await;

    let tracked = h.coordinator.sync().get(&id).unwrap();
    assert!(tracked.dst_finalized);
    assert!(!tracked.src_finalized);
}

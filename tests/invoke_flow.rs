//! End-to-end tests of the propose, order, commit protocol.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use fabric_orchestrator::ledger::mock::{EventScript, HubStats, MockLedger};
use fabric_orchestrator::ledger::types::QueryResponse;
use fabric_orchestrator::ledger::Identity;
use fabric_orchestrator::{CommitStatus, FabricError, OrderStatus, TransactionOutcome};

mod common;

fn args() -> Vec<String> {
    vec!["CAR10".into(), "Chevy".into(), "Volt".into(), "Red".into(), "Nick".into()]
}

#[tokio::test(start_paused = true)]
async fn test_invoke_commit_confirmed() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockLedger::new());
    let client = common::build_client(&mock, dir.path());

    let start = tokio::time::Instant::now();
    let outcome = client.invoke("mychannel", "fabcar", "createCar", args()).await.unwrap();

    assert_eq!(outcome.order, OrderStatus::Success);
    assert_eq!(outcome.commit, CommitStatus::Valid);
    assert_eq!(outcome.outcome(), TransactionOutcome::Success);
    assert!(start.elapsed() < Duration::from_millis(100));

    // Let the abandoned timer's deadline pass; nothing may fire.
    tokio::time::sleep(Duration::from_secs(5)).await;
    let stats = mock.hub_stats();
    assert_eq!(HubStats::get(&stats.late_deliveries), 0);
    assert_eq!(HubStats::get(&stats.unregisters), 1);
    assert_eq!(HubStats::get(&stats.disconnects), 1);
}

#[tokio::test(start_paused = true)]
async fn test_invoke_times_out_without_event() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockLedger::new());
    mock.update(|s| s.event = EventScript::Silent);
    let client = common::build_client(&mock, dir.path());

    let start = tokio::time::Instant::now();
    let outcome = client.invoke("mychannel", "fabcar", "createCar", args()).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(outcome.commit, CommitStatus::Timeout);
    assert_eq!(outcome.outcome(), TransactionOutcome::Timeout);
    assert!(elapsed >= Duration::from_millis(3000));
    assert!(elapsed < Duration::from_millis(3100));

    let stats = mock.hub_stats();
    assert_eq!(HubStats::get(&stats.unregisters), 1);
    assert_eq!(HubStats::get(&stats.disconnects), 1);
}

#[tokio::test(start_paused = true)]
async fn test_event_after_timeout_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockLedger::new());
    mock.update(|s| s.event = EventScript::valid_after(Duration::from_millis(5000)));
    let client = common::build_client(&mock, dir.path());

    let outcome = client.invoke("mychannel", "fabcar", "createCar", args()).await.unwrap();
    assert_eq!(outcome.commit, CommitStatus::Timeout);

    tokio::time::sleep(Duration::from_secs(3)).await;
    let stats = mock.hub_stats();
    assert_eq!(HubStats::get(&stats.late_deliveries), 1);
    assert_eq!(HubStats::get(&stats.unregisters), 1);
    assert_eq!(HubStats::get(&stats.disconnects), 1);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_commit_code_is_soft() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockLedger::new());
    mock.update(|s| {
        s.event = EventScript::Deliver {
            code: "MVCC_READ_CONFLICT".into(),
            after: Duration::from_millis(20),
        }
    });
    let client = common::build_client(&mock, dir.path());

    let outcome = client.invoke("mychannel", "fabcar", "changeCarOwner", args()).await.unwrap();
    assert_eq!(outcome.commit, CommitStatus::Invalid("MVCC_READ_CONFLICT".into()));
    assert_eq!(outcome.outcome(), TransactionOutcome::Failure("MVCC_READ_CONFLICT".into()));
    assert!(!outcome.is_committed());
}

#[tokio::test(start_paused = true)]
async fn test_order_refusal_is_soft() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockLedger::new());
    mock.update(|s| s.order_status = "BAD_REQUEST".into());
    let client = common::build_client(&mock, dir.path());

    let outcome = client.invoke("mychannel", "fabcar", "createCar", args()).await.unwrap();
    assert_eq!(outcome.order, OrderStatus::Failure("BAD_REQUEST".into()));
    assert_eq!(outcome.outcome(), TransactionOutcome::Failure("BAD_REQUEST".into()));
}

#[tokio::test(start_paused = true)]
async fn test_order_transport_error_is_hard() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockLedger::new());
    mock.update(|s| s.order_error = Some("orderer unreachable".into()));
    let client = common::build_client(&mock, dir.path());

    let err = client.invoke("mychannel", "fabcar", "createCar", args()).await.unwrap_err();
    assert!(matches!(err, FabricError::Ledger(_)));
    assert_eq!(HubStats::get(&mock.hub_stats().disconnects), 1);
}

#[tokio::test(start_paused = true)]
async fn test_order_transport_error_does_not_wait_for_commit() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockLedger::new());
    mock.update(|s| {
        s.order_error = Some("orderer unreachable".into());
        s.event = EventScript::Silent;
    });
    let client = common::build_client(&mock, dir.path());

    let start = tokio::time::Instant::now();
    let err = client.invoke("mychannel", "fabcar", "createCar", args()).await.unwrap_err();
    assert!(matches!(err, FabricError::Ledger(msg) if msg.to_string().contains("orderer unreachable")));
    assert!(start.elapsed() < Duration::from_millis(100));

    let stats = mock.hub_stats();
    assert_eq!(HubStats::get(&stats.unregisters), 1);
    assert_eq!(HubStats::get(&stats.disconnects), 1);
}

#[tokio::test]
async fn test_listener_registered_before_ordering() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockLedger::new());
    let client = common::build_client(&mock, dir.path());

    client.invoke("mychannel", "fabcar", "createCar", args()).await.unwrap();

    let calls = mock.calls();
    let proposal = common::position(&calls, "send_transaction_proposal").unwrap();
    let register = common::position(&calls, "hub.register_tx_event").unwrap();
    let order = common::position(&calls, "send_transaction").unwrap();
    assert!(proposal < register);
    assert!(register < order);
}

#[tokio::test]
async fn test_rejected_proposal_short_circuits() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockLedger::new());
    mock.update(|s| s.proposal_statuses = vec![500]);
    let client = common::build_client(&mock, dir.path());

    let err = client.invoke("mychannel", "fabcar", "createCar", args()).await.unwrap_err();
    match err {
        FabricError::ProposalRejected { status, .. } => assert_eq!(status, Some(500)),
        other => panic!("expected ProposalRejected, got {:?}", other),
    }
    assert_eq!(mock.count("send_transaction"), 0);
    assert_eq!(mock.count("new_event_hub"), 0);
}

#[tokio::test]
async fn test_empty_endorsement_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockLedger::new());
    mock.update(|s| s.proposal_statuses = Vec::new());
    let client = common::build_client(&mock, dir.path());

    let err = client.invoke("mychannel", "fabcar", "createCar", args()).await.unwrap_err();
    assert!(matches!(err, FabricError::ProposalRejected { status: None, .. }));
    assert_eq!(mock.count("send_transaction"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_transaction_ids_never_reused() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockLedger::new());
    let client = common::build_client(&mock, dir.path());

    for _ in 0..20 {
        client.invoke("mychannel", "fabcar", "createCar", args()).await.unwrap();
    }

    let ids = mock.recorded().tx_ids();
    assert_eq!(ids.len(), 20);
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 20);
}

#[tokio::test]
async fn test_event_stream_failure_is_hard() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockLedger::new());
    mock.update(|s| s.event = EventScript::StreamError("stream reset".into()));
    let client = common::build_client(&mock, dir.path());

    let err = client.invoke("mychannel", "fabcar", "createCar", args()).await.unwrap_err();
    assert!(matches!(err, FabricError::EventHub(msg) if msg.contains("stream reset")));
    assert_eq!(HubStats::get(&mock.hub_stats().unregisters), 1);
    assert_eq!(HubStats::get(&mock.hub_stats().disconnects), 1);
}

#[tokio::test]
async fn test_listener_registration_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockLedger::new());
    mock.update(|s| s.event = EventScript::RegisterFails("hub refused".into()));
    let client = common::build_client(&mock, dir.path());

    let err = client.invoke("mychannel", "fabcar", "createCar", args()).await.unwrap_err();
    assert!(matches!(err, FabricError::EventHub(_)));
    assert_eq!(mock.count("send_transaction"), 0);

    let stats = mock.hub_stats();
    assert_eq!(HubStats::get(&stats.unregisters), 0);
    assert_eq!(HubStats::get(&stats.disconnects), 1);
}

#[tokio::test]
async fn test_unknown_user_makes_no_network_call() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockLedger::new());
    mock.update(|s| s.identity = None);
    let client = common::build_client(&mock, dir.path());

    let err = client.invoke("mychannel", "fabcar", "createCar", args()).await.unwrap_err();
    assert!(matches!(err, FabricError::Enrollment(_)));
    assert!(mock.recorded().tx_ids().is_empty());
    assert_eq!(mock.count("send_transaction_proposal"), 0);
}

#[tokio::test]
async fn test_unenrolled_user_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockLedger::new());
    mock.update(|s| {
        s.identity = Some(Identity {
            username: "user1".into(),
            msp_id: "Org1MSP".into(),
            certificate: Vec::new(),
            enrolled: false,
        })
    });
    let client = common::build_client(&mock, dir.path());

    let err = client.query("mychannel", "fabcar", "queryAllCars", Vec::new()).await.unwrap_err();
    assert!(matches!(err, FabricError::Enrollment(msg) if msg.contains("not enrolled")));
    assert_eq!(mock.count("query_by_chaincode"), 0);
}

#[tokio::test]
async fn test_query_single_response() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockLedger::new());
    mock.update(|s| s.query_responses = vec![QueryResponse::Payload(br#"[{"Key":"CAR0"}]"#.to_vec())]);
    let client = common::build_client(&mock, dir.path());

    let result = client.query("mychannel", "fabcar", "queryAllCars", Vec::new()).await.unwrap();
    assert_eq!(result, r#"[{"Key":"CAR0"}]"#);
    assert_eq!(mock.count("new_event_hub"), 0);
    assert_eq!(mock.count("send_transaction"), 0);
}

#[tokio::test]
async fn test_query_response_count_must_be_one() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockLedger::new());
    let client = common::build_client(&mock, dir.path());

    mock.update(|s| s.query_responses = Vec::new());
    let err = client.query("mychannel", "fabcar", "queryAllCars", Vec::new()).await.unwrap_err();
    assert!(matches!(err, FabricError::Query(_)));

    mock.update(|s| {
        s.query_responses = vec![
            QueryResponse::Payload(b"a".to_vec()),
            QueryResponse::Payload(b"b".to_vec()),
        ]
    });
    let err = client.query("mychannel", "fabcar", "queryAllCars", Vec::new()).await.unwrap_err();
    assert!(matches!(err, FabricError::Query(_)));
}

#[tokio::test]
async fn test_query_error_response() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockLedger::new());
    mock.update(|s| s.query_responses = vec![QueryResponse::Error("chaincode fabcar not found".into())]);
    let client = common::build_client(&mock, dir.path());

    let err = client.query("mychannel", "fabcar", "queryAllCars", Vec::new()).await.unwrap_err();
    assert!(matches!(err, FabricError::Query(msg) if msg.contains("not found")));
}

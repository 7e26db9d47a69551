mod common;

use agentflow_console::{LogCategory, RunOutcome, StreamController, PUMP_BUDGET};
use agentflow_network::{StreamError, StreamItem};
use agentflow_protocol::{NodeStatus, StreamEvent, MASTER_NODE};

use common::{ev, send, ScriptedConnector};

#[tokio::test]
async fn test_quote_scenario_ends_the_run() {
    let connector = ScriptedConnector::open();
    let mut controller = StreamController::new(connector.clone(), MASTER_NODE);

    assert!(controller.start());
    assert!(controller.is_streaming());
    let tx = connector.latest();

    send(&tx, ev("USER", NodeStatus::Active, "hi"));
    send(&tx, ev("DB-MASTER", NodeStatus::Active, "processing"));
    send(&tx, ev("DB-MASTER", NodeStatus::Complete, "done"));
    assert_eq!(controller.pump(), 3);

    let view = controller.view();
    let user = view.get("USER").unwrap();
    assert_eq!(user.status, NodeStatus::Inactive);
    assert_eq!(user.message, "hi");
    let master = view.get("DB-MASTER").unwrap();
    assert_eq!(master.status, NodeStatus::Complete);
    assert_eq!(master.message, "done");

    assert!(!controller.is_streaming());
    assert_eq!(controller.last_outcome(), Some(&RunOutcome::Completed));
    assert!(tx.is_closed(), "connection must be closed on the terminal event");
}

#[tokio::test]
async fn test_nothing_is_applied_after_the_terminal_event() {
    let connector = ScriptedConnector::open();
    let mut controller = StreamController::new(connector.clone(), MASTER_NODE);
    controller.start();
    let tx = connector.latest();

    send(&tx, ev("DB-MASTER", NodeStatus::Complete, "done"));
    send(&tx, ev("USER", NodeStatus::Active, "too late"));
    assert_eq!(controller.pump(), 1);
    assert!(controller.view().get("USER").is_none());

    assert!(controller.on_event(ev("USER", NodeStatus::Active, "direct")).is_none());
    assert!(controller.view().get("USER").is_none());
    assert_eq!(controller.events_applied(), 1);
}

#[tokio::test]
async fn test_terminal_requires_configured_node() {
    let connector = ScriptedConnector::open();
    let mut controller = StreamController::new(connector.clone(), "ROOT");
    controller.start();
    let tx = connector.latest();

    send(&tx, ev("DB-MASTER", NodeStatus::Complete, "done"));
    controller.pump();
    assert!(controller.is_streaming());

    send(&tx, ev("ROOT", NodeStatus::Complete, "done"));
    controller.pump();
    assert!(!controller.is_streaming());
}

#[tokio::test]
async fn test_start_while_streaming_opens_no_second_connection() {
    let connector = ScriptedConnector::open();
    let mut controller = StreamController::new(connector.clone(), MASTER_NODE);

    assert!(controller.start());
    let run_id = controller.run_id();
    send(&connector.latest(), ev("USER", NodeStatus::Active, "hi"));
    controller.pump();

    assert!(!controller.start());
    assert_eq!(connector.opened(), 1);
    assert_eq!(controller.runs_started(), 1);
    assert_eq!(controller.run_id(), run_id);
    // state of the running simulation is untouched
    assert_eq!(controller.view().status_of("USER"), NodeStatus::Active);
}

#[tokio::test]
async fn test_transport_error_returns_to_idle() {
    let connector = ScriptedConnector::open();
    let mut controller = StreamController::new(connector.clone(), MASTER_NODE);
    controller.start();
    let tx = connector.latest();

    send(&tx, ev("USER", NodeStatus::Active, "hi"));
    tx.try_send(StreamItem::Error(StreamError::ContentType("text/html".into())))
        .unwrap();
    controller.pump();

    assert!(!controller.is_streaming());
    assert!(tx.is_closed());
    assert!(matches!(controller.last_outcome(), Some(RunOutcome::Failed(msg)) if msg.contains("text/html")));
    assert!(controller.log().any(|e| e.category == LogCategory::Error));
    // state of the failed run stays visible until the next start
    assert_eq!(controller.view().status_of("USER"), NodeStatus::Active);
}

#[tokio::test]
async fn test_malformed_payload_is_a_stream_failure() {
    let connector = ScriptedConnector::open();
    let mut controller = StreamController::new(connector.clone(), MASTER_NODE);
    controller.start();

    let err = StreamEvent::from_json(r#"{"node":"USER","status":"thinking"}"#).unwrap_err();
    controller.on_error(StreamError::Decode(err));
    assert!(!controller.is_streaming());
    assert!(matches!(controller.last_outcome(), Some(RunOutcome::Failed(_))));
}

#[tokio::test]
async fn test_producer_hangup_is_reported_as_closed() {
    let connector = ScriptedConnector::with_script(vec![ev("USER", NodeStatus::Active, "hi")], false);
    let mut controller = StreamController::new(connector, MASTER_NODE);
    controller.start();

    assert_eq!(controller.pump(), 2);
    assert!(!controller.is_streaming());
    assert_eq!(
        controller.last_outcome(),
        Some(&RunOutcome::Failed(StreamError::Closed.to_string()))
    );
}

#[tokio::test]
async fn test_restart_clears_previous_run() {
    let connector = ScriptedConnector::open();
    let mut controller = StreamController::new(connector.clone(), MASTER_NODE);

    controller.start();
    send(&connector.latest(), ev("USER", NodeStatus::Active, "hi"));
    controller.pump();
    controller.on_error(StreamError::Closed);
    let first_run = controller.run_id();

    assert!(controller.start());
    assert_eq!(connector.opened(), 2);
    assert!(controller.view().is_empty());
    assert_eq!(controller.last_outcome(), None);
    assert_ne!(controller.run_id(), first_run);
}

#[tokio::test]
async fn test_errors_without_a_stream_are_ignored() {
    let connector = ScriptedConnector::open();
    let mut controller = StreamController::new(connector, MASTER_NODE);
    controller.on_error(StreamError::Closed);
    assert_eq!(controller.last_outcome(), None);
    assert_eq!(controller.pump(), 0);
    assert!(controller.next_item().await.is_none());
}

#[tokio::test]
async fn test_pump_stops_at_its_budget() {
    let connector = ScriptedConnector::open();
    let mut controller = StreamController::new(connector.clone(), MASTER_NODE);
    controller.start();
    let tx = connector.latest();

    for n in 0..10 {
        send(&tx, ev("USER", NodeStatus::Active, &format!("tick {n}")));
    }
    assert_eq!(controller.pump_at_most(4), 4);
    assert_eq!(controller.view().message_of("USER"), "tick 3");
    assert_eq!(controller.pump_at_most(100), 6);
    assert_eq!(controller.pump_at_most(100), 0);
    assert!(controller.is_streaming());
}

#[tokio::test]
async fn test_pump_leaves_a_backlog_for_the_next_tick() {
    let connector = ScriptedConnector::open().with_capacity(PUMP_BUDGET * 2);
    let mut controller = StreamController::new(connector.clone(), MASTER_NODE);
    controller.start();
    let tx = connector.latest();

    for n in 0..PUMP_BUDGET + 10 {
        send(&tx, ev("USER", NodeStatus::Active, &format!("tick {n}")));
    }
    assert_eq!(controller.pump(), PUMP_BUDGET);
    assert_eq!(controller.pump(), 10);
    assert_eq!(
        controller.view().message_of("USER"),
        format!("tick {}", PUMP_BUDGET + 9)
    );
}

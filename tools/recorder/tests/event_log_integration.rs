use recorder::logging::{clear_event_log, event_log_active, init_event_log, JsonlLogger};
use recorder::receiver::{shared, Receiver};
use recorder::replay::wrap;
use recorder::targets::{Checklist, NullObject};
use recorder::types::LogLevel;
use serde_json::{json, Value};

fn read_events(path: &std::path::Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .expect("read event log")
        .lines()
        .map(|line| serde_json::from_str(line).expect("event json"))
        .collect()
}

// The event log is process-wide, so everything touching it lives in one test.
#[test]
fn ledger_activity_is_logged_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("events.jsonl");
    let mut logger = JsonlLogger::new(&path);
    logger.min_level = LogLevel::Debug;
    init_event_log(logger);
    assert!(event_log_active());

    let mut facade = wrap(shared(NullObject)).expect("wraps");
    assert!(wrap(shared(wrap(shared(NullObject)).expect("wraps"))).is_none());
    facade.send("step2", &[json!("called")], None).expect("accepted");
    facade.send("step1", &[], None).expect("accepted");
    facade.ledger_mut().wrap(shared(Checklist::new()));
    let outcomes = facade.ledger().replay().expect("replay");
    assert_eq!(outcomes.len(), 2);
    facade.ledger_mut().reset();
    let busy = shared(Checklist::new());
    {
        let _held = busy.borrow_mut();
        assert!(wrap(busy.clone()).is_none());
    }

    clear_event_log();
    assert!(!event_log_active());
    // Nothing is written once the log is cleared.
    assert!(facade.send("after", &[], None).is_err());

    let events = read_events(&path);
    let types: Vec<&str> = events
        .iter()
        .filter_map(|e| e["event_type"].as_str())
        .collect();
    assert_eq!(
        types,
        vec![
            "facade.wrap",
            "facade.wrap",
            "facade.wrap_refused",
            "ledger.record",
            "ledger.record",
            "ledger.wrap",
            "ledger.replay_failure",
            "ledger.replay",
            "ledger.reset",
            "facade.wrap_refused",
        ]
    );

    let seqs: Vec<u64> = events.iter().filter_map(|e| e["seq"].as_u64()).collect();
    assert!(seqs.windows(2).all(|pair| pair[0] < pair[1]));

    let failure = &events[6];
    assert_eq!(failure["level"], "warn");
    assert_eq!(failure["payload"]["position"], 0);
    assert_eq!(failure["payload"]["error"], "nope");

    assert_eq!(events[3]["payload"]["record"]["name"], "step2");
    assert_eq!(events[7]["payload"], json!({"records": 2, "failures": 1}));
    assert_eq!(events[8]["payload"], json!({"discarded": 2}));
    assert_eq!(events[2]["payload"], json!({"reason": "proxy"}));
    assert_eq!(events[9]["payload"], json!({"reason": "busy"}));
}

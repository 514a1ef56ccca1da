use recorder::errors::CallError;
use recorder::receiver::{shared, Callback, Outcome, Receiver, SharedTarget};
use recorder::replay::{wrap, Facade, Record};
use recorder::targets::{Blank, Checklist, NullObject, Text};
use serde_json::{json, Value};
use std::rc::Rc;

// ── helpers ───────────────────────────────────────────────────────────────────

/// Counts calls and fails every operation listed in `failing`.
struct Flaky {
    failing: Vec<&'static str>,
    calls: Vec<String>,
}

impl Flaky {
    fn failing(names: &[&'static str]) -> Self {
        Self {
            failing: names.to_vec(),
            calls: Vec::new(),
        }
    }
}

impl Receiver for Flaky {
    fn send(&mut self, name: &str, args: &[Value], _callback: Option<&Callback>) -> Outcome {
        self.calls.push(name.to_string());
        if self.failing.iter().any(|f| *f == name) {
            return Err(CallError::failed(format!("{name} failed")));
        }
        Ok(json!({ "op": name, "argc": args.len() }))
    }
}

fn run_three_steps(facade: &mut Facade) -> Vec<Outcome> {
    let cb = Callback::forward("step3_blk");
    vec![
        facade.send("step1", &[], None),
        facade.send("step2", &[json!("called")], None),
        facade.send("step3", &[json!("arg")], Some(&cb)),
    ]
}

// ── wrapping ──────────────────────────────────────────────────────────────────

#[test]
fn wrapping_a_facade_yields_nothing() {
    let inner = wrap(shared(Checklist::new())).expect("plain target wraps");
    assert!(wrap(shared(inner)).is_none());
}

#[test]
fn every_plain_receiver_wraps() {
    let targets = vec![
        shared(Checklist::new()) as SharedTarget,
        shared(Text::new("")) as SharedTarget,
        shared(NullObject) as SharedTarget,
        shared(Blank) as SharedTarget,
        shared(Flaky::failing(&[])) as SharedTarget,
    ];
    for target in targets {
        let facade = wrap(target).expect("plain target wraps");
        assert!(facade.is_proxy());
        assert!(facade.ledger().is_empty());
    }
}

// ── recording ─────────────────────────────────────────────────────────────────

#[test]
fn records_follow_call_order() {
    let mut facade = wrap(shared(NullObject)).expect("wraps");
    let ops = ["open", "seek", "read", "read", "close", "flush", "open"];
    for (i, op) in ops.iter().enumerate() {
        facade.send(op, &[json!(i)], None).expect("null object accepts");
    }
    let names: Vec<&str> = facade.ledger().records().iter().map(Record::name).collect();
    assert_eq!(names, ops);
    assert_eq!(facade.ledger().records()[3].args(), &[json!(3)]);
}

#[test]
fn records_capture_intent_even_when_target_fails() {
    let flaky = shared(Flaky::failing(&["b"]));
    let mut facade = wrap(flaky.clone()).expect("wraps");
    assert!(facade.send("a", &[], None).is_ok());
    assert_eq!(facade.send("b", &[], None), Err(CallError::failed("b failed")));
    assert_eq!(facade.ledger().len(), 2);
    assert_eq!(flaky.borrow().calls, vec!["a", "b"]);
}

#[test]
fn callbacks_are_recorded_by_identity() {
    let mut facade = wrap(shared(Checklist::new())).expect("wraps");
    let cb = Callback::new(|_, args| Ok(args[0].clone()));
    facade
        .send("name", &[json!("a"), json!("b")], Some(&cb))
        .expect("name yields");

    let same = Record::new("name", vec![json!("a"), json!("b")], Some(cb.clone()));
    let lookalike = Record::new(
        "name",
        vec![json!("a"), json!("b")],
        Some(Callback::new(|_, args| Ok(args[0].clone()))),
    );
    assert_eq!(facade.ledger().records()[0], same);
    assert_ne!(facade.ledger().records()[0], lookalike);
}

// ── replay ────────────────────────────────────────────────────────────────────

#[test]
fn replay_output_matches_record_count_regardless_of_failures() {
    let mut facade = wrap(shared(NullObject)).expect("wraps");
    for op in ["a", "b", "c", "d", "e"] {
        facade.send(op, &[], None).expect("null object accepts");
    }
    facade
        .ledger_mut()
        .wrap(shared(Flaky::failing(&["a", "c", "d"])));
    let outcomes = facade.ledger().replay().expect("replay");
    assert_eq!(outcomes.len(), 5);
    assert_eq!(outcomes.iter().filter(|o| o.is_err()).count(), 3);
}

#[test]
fn replay_continues_past_a_failing_record() {
    let flaky = shared(Flaky::failing(&["b"]));
    let mut facade = wrap(shared(NullObject)).expect("wraps");
    facade.send("a", &[], None).expect("accepted");
    facade.send("b", &[json!(1)], None).expect("accepted");
    facade.send("c", &[json!(1), json!(2)], None).expect("accepted");
    facade.ledger_mut().wrap(flaky.clone());

    let outcomes = facade.ledger().replay().expect("replay");
    assert_eq!(
        outcomes,
        vec![
            Ok(json!({ "op": "a", "argc": 0 })),
            Err(CallError::failed("b failed")),
            Ok(json!({ "op": "c", "argc": 2 })),
        ]
    );
    assert_eq!(flaky.borrow().calls, vec!["a", "b", "c"]);
}

#[test]
fn swapping_target_keeps_log_and_replays_on_new_target() {
    let stub = shared(Flaky::failing(&[]));
    let real = shared(Flaky::failing(&[]));
    let mut facade = wrap(stub.clone()).expect("wraps");
    facade.send("x", &[], None).expect("ok");
    facade.send("y", &[], None).expect("ok");

    facade.ledger_mut().wrap(real.clone());
    assert_eq!(facade.ledger().len(), 2);
    facade.ledger().replay().expect("replay");

    assert_eq!(stub.borrow().calls, vec!["x", "y"]);
    assert_eq!(real.borrow().calls, vec!["x", "y"]);
}

#[test]
fn replays_messages_onto_reset_target() {
    let checklist = shared(Checklist::new());
    let mut facade = wrap(checklist.clone()).expect("wraps");
    let live = run_three_steps(&mut facade);
    assert!(checklist.borrow().completed());

    checklist.borrow_mut().reset();
    assert!(!checklist.borrow().completed());

    let replayed = facade.ledger().replay().expect("replay");
    assert!(checklist.borrow().completed());
    assert_eq!(replayed, live);
}

#[test]
fn replays_messages_recorded_against_null_object_on_new_checklist() {
    let mut facade = wrap(shared(NullObject)).expect("wraps");
    let live = run_three_steps(&mut facade);
    assert_eq!(live, vec![Ok(json!(true)); 3]);

    let checklist = shared(Checklist::new());
    facade.ledger_mut().wrap(checklist.clone());
    facade.ledger().replay().expect("replay");
    assert!(checklist.borrow().completed());
}

#[test]
fn record_applies_to_any_receiver() {
    let mut facade = wrap(shared(NullObject)).expect("wraps");
    facade.send("upcase", &[], None).expect("accepted");
    let record = facade.ledger().records()[0].clone();
    let mut text = Text::new("quiet");
    assert_eq!(record.apply(&mut text), Ok(json!("QUIET")));
}

#[test]
fn raw_target_use_bypasses_recording() {
    let text = shared(Text::new("ab"));
    let mut facade = wrap(text.clone()).expect("wraps");
    facade.send("len", &[], None).expect("len");
    text.borrow_mut()
        .send("push_str", &[json!("c")], None)
        .expect("push");
    assert_eq!(facade.ledger().len(), 1);
    let raw: SharedTarget = text;
    assert!(Rc::ptr_eq(&facade.ledger().unwrap(), &raw));
}

#[test]
fn reset_then_replay_is_empty() {
    let mut facade = wrap(shared(NullObject)).expect("wraps");
    facade.send("a", &[], None).expect("ok");
    facade.ledger_mut().reset();
    assert!(facade.ledger().replay().expect("replay").is_empty());
}

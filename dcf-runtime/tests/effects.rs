//! Effect semantics: dependency gating, cleanup ordering, commit
//! phases and the insertion latch.

use std::cell::RefCell;
use std::rc::Rc;

use dcf_bridge::testing::TestBridge;
use dcf_runtime::Engine;
use dcf_vdom::{ComponentNode, Element, Hooks, Node, PropValue, Props, deps};

type Log = Rc<RefCell<Vec<String>>>;

fn log_of(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

fn effect_engine(log: Log) -> Engine<TestBridge> {
    let mut builder = Engine::builder(TestBridge::new());
    builder.register_component("tracked", move |hooks: &mut Hooks<'_>, props: &Props| -> dcf_vdom::Result<Node> {
        let x = match props.get("x") {
            Some(PropValue::Int(x)) => *x,
            _ => 0,
        };

        let trace = log.clone();
        hooks.use_effect(
            move || {
                trace.borrow_mut().push(format!("effect {x}"));
                let trace = trace.clone();
                Ok(Some(Box::new(move || {
                    trace.borrow_mut().push(format!("cleanup {x}"));
                })))
            },
            deps![x],
        )?;

        Ok(Element::new("Text").prop("content", x).into())
    });
    builder.finish()
}

fn tracked(x: i64) -> Node {
    ComponentNode::new("tracked").prop("x", x).into()
}

#[test]
fn effect_runs_on_mount_and_on_dep_change() {
    let log: Log = Default::default();
    let mut engine = effect_engine(log.clone());

    engine.mount(tracked(1)).unwrap();
    assert_eq!(log_of(&log), ["effect 1"]);

    // Same deps: nothing runs
    engine.mount(tracked(1)).unwrap();
    assert_eq!(log_of(&log), ["effect 1"]);

    // Changed deps: cleanup first, then the new effect
    engine.mount(tracked(2)).unwrap();
    assert_eq!(log_of(&log), ["effect 1", "cleanup 1", "effect 2"]);
}

#[test]
fn terminal_cleanup_runs_at_unmount() {
    let log: Log = Default::default();
    let mut engine = effect_engine(log.clone());

    engine.mount(tracked(7)).unwrap();
    engine.mount(Node::Null).unwrap();

    assert_eq!(log_of(&log), ["effect 7", "cleanup 7"]);
}

#[test]
fn effect_phases_run_in_order() {
    let log: Log = Default::default();

    let mut builder = Engine::builder(TestBridge::new());
    let trace = log.clone();
    builder.register_component("phased", move |hooks: &mut Hooks<'_>, _: &Props| -> dcf_vdom::Result<Node> {
        let t = trace.clone();
        hooks.use_insertion_effect(
            move || {
                t.borrow_mut().push("insertion".to_string());
                Ok(None)
            },
            deps![],
        )?;

        let t = trace.clone();
        hooks.use_effect(
            move || {
                t.borrow_mut().push("normal".to_string());
                Ok(None)
            },
            deps![],
        )?;

        let t = trace.clone();
        hooks.use_layout_effect(
            move || {
                t.borrow_mut().push("layout".to_string());
                Ok(None)
            },
            deps![],
        )?;

        Ok(Element::new("View").into())
    });

    let mut engine = builder.finish();
    engine.mount(ComponentNode::new("phased")).unwrap();

    // Declaration order is insertion, normal, layout; execution order
    // is normal, layout, insertion
    assert_eq!(log_of(&log), ["normal", "layout", "insertion"]);
}

#[test]
fn insertion_effects_wait_for_quiet_queues() {
    let log: Log = Default::default();

    let mut builder = Engine::builder(TestBridge::new());
    let trace = log.clone();
    builder.register_component("eager", move |hooks: &mut Hooks<'_>, _: &Props| -> dcf_vdom::Result<Node> {
        let (warmed, set_warmed) = hooks.use_state(|| false)?;
        if !warmed {
            // Mount schedules an immediate follow-up update
            set_warmed.set(true);
        }

        let t = trace.clone();
        hooks.use_insertion_effect(
            move || {
                t.borrow_mut().push("insertion".to_string());
                Ok(None)
            },
            deps![],
        )?;

        Ok(Element::new("View").into())
    });

    let mut engine = builder.finish();
    engine.mount(ComponentNode::new("eager")).unwrap();

    // The mount commit left a pending update: not latched yet
    assert!(log_of(&log).is_empty());

    engine.run_until_idle().unwrap();
    assert_eq!(log_of(&log), ["insertion"]);
}

#[test]
fn failing_effect_is_not_retried() {
    let log: Log = Default::default();

    let mut builder = Engine::builder(TestBridge::new());
    let trace = log.clone();
    builder.register_component("flaky", move |hooks: &mut Hooks<'_>, _: &Props| -> dcf_vdom::Result<Node> {
        let t = trace.clone();
        hooks.use_effect(
            move || {
                t.borrow_mut().push("ran".to_string());
                Err("no network".into())
            },
            deps![1],
        )?;
        Ok(Element::new("View").into())
    });

    let mut engine = builder.finish();
    engine.mount(ComponentNode::new("flaky")).unwrap();
    assert_eq!(log_of(&log), ["ran"]);

    // Same deps on the next pass: the failure counted as ran
    engine.mount(ComponentNode::new("flaky")).unwrap();
    assert_eq!(log_of(&log), ["ran"]);
}

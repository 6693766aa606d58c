//! Error boundaries: capture, fallback substitution, and the
//! fatal-fallback diagnostic.

use std::cell::Cell;
use std::rc::Rc;

use dcf_bridge::Op;
use dcf_bridge::testing::TestBridge;
use dcf_runtime::Engine;
use dcf_store::ViewId;
use dcf_vdom::{Boundary, ComponentNode, Element, Error, Hooks, Node, PropValue, Props};

fn failing_engine() -> Engine<TestBridge> {
    let mut builder = Engine::builder(TestBridge::new());
    builder.register_component("fragile", |_: &mut Hooks<'_>, props: &Props| -> dcf_vdom::Result<Node> {
        if let Some(PropValue::Bool(true)) = props.get("fail") {
            return Err(Error::render("fragile", "exploded"));
        }
        Ok(Element::new("Text").prop("content", "fine").into())
    });
    builder.finish()
}

fn boundary_around(fail: bool) -> Node {
    Boundary::new(ComponentNode::new("fragile").prop("fail", fail), |err| {
        Element::new("Text").prop("content", format!("error: {err}")).into()
    })
    .into()
}

#[test]
fn render_error_substitutes_the_fallback() {
    let mut engine = failing_engine();
    engine.mount(boundary_around(true)).unwrap();

    let ops = engine.bridge().ops();
    assert_eq!(ops.len(), 2);
    assert!(matches!(
        &ops[0],
        Op::Create { ty, props_json, .. } if ty == "Text" && props_json.contains("exploded")
    ));
    assert_eq!(engine.error_count(), 1);
}

#[test]
fn healthy_subtrees_do_not_touch_the_boundary() {
    let mut engine = failing_engine();
    engine.mount(boundary_around(false)).unwrap();

    assert_eq!(
        engine.bridge().ops(),
        [
            Op::create(ViewId(1), "Text", r#"{"content":"fine"}"#),
            Op::attach(ViewId::ROOT, ViewId(1), 0),
        ]
    );
    assert_eq!(engine.error_count(), 0);
}

#[test]
fn recovery_replaces_the_fallback() {
    let mut engine = failing_engine();
    engine.mount(boundary_around(true)).unwrap();
    engine.bridge_mut().take_batches();

    engine.mount(boundary_around(false)).unwrap();

    let ops = engine.bridge().ops();
    assert!(ops.iter().any(|op| op.deleted().is_some()));
    assert!(ops.iter().any(
        |op| matches!(op, Op::Create { props_json, .. } if props_json.contains("fine"))
    ));
}

#[test]
fn error_without_a_boundary_unmounts_the_subtree() {
    let mut engine = failing_engine();
    let result = engine.mount(ComponentNode::new("fragile").prop("fail", true));

    // Logged and unmounted, not fatal; nothing ever reached the
    // native side
    assert!(result.is_ok());
    assert!(engine.bridge().ops().is_empty());
    assert_eq!(engine.error_count(), 1);
}

#[test]
fn unknown_component_type_is_captured() {
    let mut engine = failing_engine();
    engine
        .mount(Boundary::new(ComponentNode::new("not-registered"), |err| {
            Element::new("Text").prop("content", format!("{err}")).into()
        }))
        .unwrap();

    let ops = engine.bridge().ops();
    assert!(matches!(
        &ops[0],
        Op::Create { props_json, .. } if props_json.contains("not-registered")
    ));
}

#[test]
fn hook_contract_violation_reaches_the_boundary() {
    let grow = Rc::new(Cell::new(false));

    let mut builder = Engine::builder(TestBridge::new());
    let flag = grow.clone();
    builder.register_component("shifty", move |hooks: &mut Hooks<'_>, _: &Props| -> dcf_vdom::Result<Node> {
        let (count, _) = hooks.use_state(|| 0i64)?;
        if flag.get() {
            // A second slot that did not exist on the first render
            let _ = hooks.use_ref(|| 0u8)?;
        }
        Ok(Element::new("Text").prop("content", count).into())
    });
    let mut engine = builder.finish();

    let tree = |b: bool| -> Node {
        // The prop flips to force a re-render of the component
        Boundary::new(ComponentNode::new("shifty").prop("gen", b), |err| {
            Element::new("Text").prop("content", format!("{err}")).into()
        })
        .into()
    };

    engine.mount(tree(false)).unwrap();
    assert_eq!(engine.error_count(), 0);
    engine.bridge_mut().take_batches();

    grow.set(true);
    engine.mount(tree(true)).unwrap();

    assert_eq!(engine.error_count(), 1);
    let ops = engine.bridge().ops();
    assert!(ops.iter().any(
        |op| matches!(op, Op::Create { props_json, .. } if props_json.contains("hook contract violation"))
    ));
}

#[test]
fn throwing_fallback_is_fatal() {
    let mut engine = failing_engine();
    let result = engine.mount(Boundary::new(
        ComponentNode::new("fragile").prop("fail", true),
        |_| ComponentNode::new("also-not-registered").into(),
    ));

    assert!(matches!(
        result,
        Err(dcf_runtime::Error::Vdom(Error::FallbackFailed { .. }))
    ));
}

#[test]
fn nearest_boundary_wins() {
    let mut engine = failing_engine();

    let inner = Boundary::new(ComponentNode::new("fragile").prop("fail", true), |_| {
        Element::new("Text").prop("content", "inner caught").into()
    });
    let outer = Boundary::new(
        Element::new("View").child(inner),
        |_| Element::new("Text").prop("content", "outer caught").into(),
    );

    engine.mount(outer).unwrap();

    let created: Vec<String> = engine
        .bridge()
        .ops()
        .into_iter()
        .filter_map(|op| match op {
            Op::Create { props_json, .. } => Some(props_json),
            _ => None,
        })
        .collect();

    assert!(created.iter().any(|p| p.contains("inner caught")));
    assert!(!created.iter().any(|p| p.contains("outer caught")));
}

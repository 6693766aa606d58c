//! Initial mounts: the op streams produced when a virtual tree is
//! built into an empty native tree.

use dcf_bridge::Op;
use dcf_bridge::testing::TestBridge;
use dcf_runtime::Engine;
use dcf_store::ViewId;
use dcf_vdom::{ComponentNode, Element, Fragment, Hooks, Node, Props};

fn engine() -> Engine<TestBridge> {
    Engine::builder(TestBridge::new()).finish()
}

#[test]
fn mount_view_with_text() {
    let mut engine = engine();
    engine
        .mount(Element::new("View").key("A").child(Element::new("Text").prop("content", "hi")))
        .unwrap();

    assert_eq!(
        engine.bridge().ops(),
        [
            Op::create(ViewId(1), "View", "{}"),
            Op::create(ViewId(2), "Text", r#"{"content":"hi"}"#),
            Op::attach(ViewId(1), ViewId(2), 0),
            Op::attach(ViewId::ROOT, ViewId(1), 0),
        ]
    );
}

#[test]
fn fragment_children_splice_into_the_parent() {
    let mut engine = engine();
    engine
        .mount(
            Element::new("View")
                .child(Element::new("Text").prop("content", "first"))
                .child(
                    Fragment::new()
                        .child(Element::new("Text").prop("content", "inner a"))
                        .child(Element::new("Text").prop("content", "inner b")),
                )
                .child(Element::new("Text").prop("content", "last")),
        )
        .unwrap();

    let attaches: Vec<Op> = engine
        .bridge()
        .ops()
        .into_iter()
        .filter(|op| matches!(op, Op::Attach { parent_id, .. } if *parent_id == ViewId(1)))
        .collect();

    // The fragment has no native peer: four texts at indices 0..=3
    assert_eq!(
        attaches,
        [
            Op::attach(ViewId(1), ViewId(2), 0),
            Op::attach(ViewId(1), ViewId(3), 1),
            Op::attach(ViewId(1), ViewId(4), 2),
            Op::attach(ViewId(1), ViewId(5), 3),
        ]
    );
}

#[test]
fn component_renders_through_to_its_native_root() {
    let mut builder = Engine::builder(TestBridge::new());
    builder.register_component("greeting", |_: &mut Hooks<'_>, props: &Props| -> dcf_vdom::Result<Node> {
        let name = match props.get("name") {
            Some(dcf_vdom::PropValue::Str(name)) => name.clone(),
            _ => "world".to_string(),
        };
        Ok(Element::new("Text").prop("content", format!("hello {name}")).into())
    });
    let mut engine = builder.finish();

    engine
        .mount(ComponentNode::new("greeting").prop("name", "dcf"))
        .unwrap();

    // The component itself has no native peer
    assert_eq!(
        engine.bridge().ops(),
        [
            Op::create(ViewId(1), "Text", r#"{"content":"hello dcf"}"#),
            Op::attach(ViewId::ROOT, ViewId(1), 0),
        ]
    );
}

#[test]
fn nested_components_flatten() {
    let mut builder = Engine::builder(TestBridge::new());
    builder.register_component("inner", |_: &mut Hooks<'_>, _: &Props| -> dcf_vdom::Result<Node> {
        Ok(Element::new("Text").prop("content", "leaf").into())
    });
    builder.register_component("outer", |_: &mut Hooks<'_>, _: &Props| -> dcf_vdom::Result<Node> {
        Ok(Element::new("View").child(ComponentNode::new("inner")).into())
    });
    let mut engine = builder.finish();

    engine.mount(ComponentNode::new("outer")).unwrap();

    assert_eq!(
        engine.bridge().ops(),
        [
            Op::create(ViewId(1), "View", "{}"),
            Op::create(ViewId(2), "Text", r#"{"content":"leaf"}"#),
            Op::attach(ViewId(1), ViewId(2), 0),
            Op::attach(ViewId::ROOT, ViewId(1), 0),
        ]
    );
}

#[test]
fn null_root_mounts_nothing() {
    let mut engine = engine();
    engine.mount(Node::Null).unwrap();
    assert!(engine.bridge().ops().is_empty());
}

#[test]
fn sibling_roots_of_a_fragment_attach_in_order() {
    let mut engine = engine();
    engine
        .mount(
            Fragment::new()
                .child(Element::new("View"))
                .child(Element::new("View")),
        )
        .unwrap();

    assert_eq!(
        engine.bridge().ops(),
        [
            Op::create(ViewId(1), "View", "{}"),
            Op::create(ViewId(2), "View", "{}"),
            Op::attach(ViewId::ROOT, ViewId(1), 0),
            Op::attach(ViewId::ROOT, ViewId(2), 1),
        ]
    );
}

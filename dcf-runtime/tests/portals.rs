//! Portals: content attaches to named anchors, retargeting moves it,
//! contested anchors go to the last declared portal.

use dcf_bridge::Op;
use dcf_bridge::testing::TestBridge;
use dcf_runtime::Engine;
use dcf_store::ViewId;
use dcf_vdom::{Element, Fragment, Node, Portal};

fn engine() -> Engine<TestBridge> {
    Engine::builder(TestBridge::new()).finish()
}

fn overlay_tree(anchor: &str) -> Node {
    Fragment::new()
        .child(Element::new("View").key("anchor").prop("anchor", "overlay"))
        .child(
            Element::new("View").key("page").child(
                Portal::new(anchor).child(Element::new("Text").prop("content", "floating")),
            ),
        )
        .into()
}

#[test]
fn portal_content_attaches_to_the_anchor() {
    let mut engine = engine();
    engine.mount(overlay_tree("overlay")).unwrap();

    let ops = engine.bridge().ops();

    // anchor=1, page=2, floating text=3
    assert!(ops.contains(&Op::attach(ViewId(1), ViewId(3), 0)));
    // The text is not attached under the page view
    assert!(!ops.contains(&Op::attach(ViewId(2), ViewId(3), 0)));
}

#[test]
fn anchor_declared_after_the_portal_still_receives_content() {
    let mut engine = engine();
    engine
        .mount(
            Fragment::new()
                .child(
                    Element::new("View")
                        .key("page")
                        .child(Portal::new("late").child(Element::new("Text").prop("content", "x"))),
                )
                .child(Element::new("View").key("anchor").prop("anchor", "late")),
        )
        .unwrap();

    // page=1, text=2, anchor=3; attachment resolves at the end of the pass
    assert!(engine.bridge().ops().contains(&Op::attach(ViewId(3), ViewId(2), 0)));
}

#[test]
fn unchanged_portal_emits_nothing_on_the_next_pass() {
    let mut engine = engine();
    engine.mount(overlay_tree("overlay")).unwrap();
    engine.bridge_mut().take_batches();

    engine.mount(overlay_tree("overlay")).unwrap();
    assert!(engine.bridge().ops().is_empty());
}

#[test]
fn retargeting_moves_the_content() {
    let two_anchors = |target: &str| -> Node {
        Fragment::new()
            .child(Element::new("View").key("a").prop("anchor", "first"))
            .child(Element::new("View").key("b").prop("anchor", "second"))
            .child(
                Element::new("View")
                    .key("page")
                    .child(Portal::new(target).child(Element::new("Text").prop("content", "x"))),
            )
            .into()
    };

    let mut engine = engine();
    engine.mount(two_anchors("first")).unwrap();
    assert!(engine.bridge().ops().contains(&Op::attach(ViewId(1), ViewId(4), 0)));
    engine.bridge_mut().take_batches();

    engine.mount(two_anchors("second")).unwrap();
    assert!(engine.bridge().ops().contains(&Op::attach(ViewId(2), ViewId(4), 0)));
}

#[test]
fn portal_unmount_deletes_its_content() {
    let without_portal: Node = Fragment::new()
        .child(Element::new("View").key("anchor").prop("anchor", "overlay"))
        .child(Element::new("View").key("page"))
        .into();

    let mut engine = engine();
    engine.mount(overlay_tree("overlay")).unwrap();
    engine.bridge_mut().take_batches();

    engine.mount(without_portal).unwrap();

    let deleted: Vec<ViewId> = engine.bridge().ops().iter().filter_map(Op::deleted).collect();
    assert_eq!(deleted, [ViewId(3)]);
}

#[test]
fn contested_anchor_goes_to_the_last_declared_portal() {
    let mut engine = engine();
    engine
        .mount(
            Fragment::new()
                .child(Element::new("View").key("anchor").prop("anchor", "spot"))
                .child(
                    Element::new("View").key("page").children([
                        Portal::new("spot")
                            .key("p1")
                            .child(Element::new("Text").prop("content", "first"))
                            .into(),
                        Portal::new("spot")
                            .key("p2")
                            .child(Element::new("Text").prop("content", "second"))
                            .into(),
                    ]),
                ),
        )
        .unwrap();

    // anchor=1, page=2, first=3, second=4: the second portal wins
    let attaches: Vec<Op> = engine
        .bridge()
        .ops()
        .into_iter()
        .filter(|op| matches!(op, Op::Attach { parent_id, .. } if *parent_id == ViewId(1)))
        .collect();
    assert_eq!(attaches, [Op::attach(ViewId(1), ViewId(4), 0)]);
}

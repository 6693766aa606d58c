//! Offloaded diffing must be invisible: a pool-backed engine emits
//! exactly the ops a single-threaded one does.

use dcf_bridge::Op;
use dcf_bridge::testing::TestBridge;
use dcf_runtime::Engine;
use dcf_vdom::{Element, Node};

fn wide_list(generation: i64) -> Node {
    Element::new("List")
        .children((0..80).map(|i| {
            Element::new("Row")
                .key(i)
                .prop("index", i)
                // Half the rows change every generation
                .prop("value", if i % 2 == 0 { generation } else { -1 })
                .into()
        }))
        .into()
}

fn ops_with_pool(pool_size: usize) -> Vec<Vec<Op>> {
    let mut builder = Engine::builder(TestBridge::new());
    builder.worker_pool_size(pool_size).isolate_threshold_nodes(50);
    let mut engine = builder.finish();

    engine.mount(wide_list(0)).unwrap();
    engine.bridge_mut().take_batches();

    engine.mount(wide_list(1)).unwrap();
    engine.bridge_mut().take_batches()
}

#[test]
fn pool_and_inline_diffing_agree() {
    let inline = ops_with_pool(0);
    let pooled = ops_with_pool(4);

    assert_eq!(inline, pooled);

    // Sanity: the update ops are actually there
    let updates = inline
        .iter()
        .flatten()
        .filter(|op| matches!(op, Op::Update { .. }))
        .count();
    assert_eq!(updates, 40);
}

#[test]
fn below_the_threshold_the_pool_is_bypassed() {
    let mut builder = Engine::builder(TestBridge::new());
    builder.worker_pool_size(2).isolate_threshold_nodes(1000);
    let mut engine = builder.finish();

    engine.mount(wide_list(0)).unwrap();
    engine.bridge_mut().take_batches();
    engine.mount(wide_list(1)).unwrap();

    let updates = engine
        .bridge()
        .ops()
        .iter()
        .filter(|op| matches!(op, Op::Update { .. }))
        .count();
    assert_eq!(updates, 40);
}

//! Hook runtime behavior beyond plain state: memo, refs, context and
//! user-defined hooks.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dcf_bridge::Op;
use dcf_bridge::testing::TestBridge;
use dcf_runtime::Engine;
use dcf_state::Store;
use dcf_store::{InstanceId, ViewId};
use dcf_vdom::{
    ComponentNode, Element, HookFactory, Hooks, Node, PropValue, Props, deps,
};

#[test]
fn memo_recomputes_only_when_deps_change() {
    let computed = Rc::new(Cell::new(0));

    let mut builder = Engine::builder(TestBridge::new());
    let count = computed.clone();
    builder.register_component("memoized", move |hooks: &mut Hooks<'_>, props: &Props| -> dcf_vdom::Result<Node> {
        let x = match props.get("x") {
            Some(PropValue::Int(x)) => *x,
            _ => 0,
        };

        let count = count.clone();
        let doubled = hooks.use_memo(
            move || {
                count.set(count.get() + 1);
                x * 2
            },
            deps![x],
        )?;

        Ok(Element::new("Text").prop("content", doubled).into())
    });
    let mut engine = builder.finish();

    let tree = |x: i64| -> Node { ComponentNode::new("memoized").prop("x", x).into() };

    engine.mount(tree(2)).unwrap();
    assert_eq!(computed.get(), 1);

    engine.mount(tree(2)).unwrap();
    assert_eq!(computed.get(), 1);

    engine.mount(tree(3)).unwrap();
    assert_eq!(computed.get(), 2);

    assert!(engine.bridge().ops().iter().any(
        |op| matches!(op, Op::Update { props_json_diff, .. } if props_json_diff.contains("6"))
    ));
}

#[test]
fn refs_persist_without_triggering_renders() {
    let renders = Rc::new(Cell::new(0));

    let mut builder = Engine::builder(TestBridge::new());
    let render_count = renders.clone();
    builder.register_component("counted", move |hooks: &mut Hooks<'_>, _: &Props| -> dcf_vdom::Result<Node> {
        render_count.set(render_count.get() + 1);
        let seen = hooks.use_ref(|| 0u32)?;
        seen.with(|n| *n += 1);
        Ok(Element::new("Text").prop("content", i64::from(seen.get())).into())
    });
    let mut engine = builder.finish();

    engine.mount(ComponentNode::new("counted")).unwrap();
    engine.run_until_idle().unwrap();

    // Writing the ref scheduled nothing
    assert_eq!(renders.get(), 1);
}

#[test]
fn context_flows_from_provider_to_consumer() {
    let theme_store: Rc<RefCell<Option<Rc<Store<String>>>>> = Default::default();

    let mut builder = Engine::builder(TestBridge::new());

    builder.register_component("consumer", |hooks: &mut Hooks<'_>, _: &Props| -> dcf_vdom::Result<Node> {
        let theme = hooks.use_context::<String>("theme")?.unwrap_or_else(|| "none".to_string());
        Ok(Element::new("Text").prop("content", theme).into())
    });

    let handle = theme_store.clone();
    builder.register_component("provider", move |hooks: &mut Hooks<'_>, _: &Props| -> dcf_vdom::Result<Node> {
        let store = hooks.use_provider("theme", || "light".to_string())?;
        *handle.borrow_mut() = Some(store);
        Ok(Element::new("View").child(ComponentNode::new("consumer")).into())
    });

    let mut engine = builder.finish();
    engine.mount(ComponentNode::new("provider")).unwrap();

    assert!(engine.bridge().ops().iter().any(
        |op| matches!(op, Op::Create { props_json, .. } if props_json.contains("light"))
    ));
    engine.bridge_mut().take_batches();

    // Writing the provider store re-renders the consumer
    theme_store.borrow().as_ref().unwrap().set("dark".to_string());
    engine.tick().unwrap();

    assert_eq!(
        engine.bridge().ops(),
        [Op::update(ViewId(2), r#"{"content":"dark"}"#)]
    );
}

#[test]
fn consumer_without_a_provider_reads_none() {
    let mut builder = Engine::builder(TestBridge::new());
    builder.register_component("consumer", |hooks: &mut Hooks<'_>, _: &Props| -> dcf_vdom::Result<Node> {
        let theme = hooks.use_context::<String>("theme")?.unwrap_or_else(|| "none".to_string());
        Ok(Element::new("Text").prop("content", theme).into())
    });
    let mut engine = builder.finish();

    engine.mount(ComponentNode::new("consumer")).unwrap();

    assert!(engine.bridge().ops().iter().any(
        |op| matches!(op, Op::Create { props_json, .. } if props_json.contains("none"))
    ));
}

#[test]
fn nearest_provider_shadows_outer_ones() {
    let mut builder = Engine::builder(TestBridge::new());

    builder.register_component("consumer", |hooks: &mut Hooks<'_>, _: &Props| -> dcf_vdom::Result<Node> {
        let theme = hooks.use_context::<String>("theme")?.unwrap_or_default();
        Ok(Element::new("Text").prop("content", theme).into())
    });
    builder.register_component("inner", |hooks: &mut Hooks<'_>, _: &Props| -> dcf_vdom::Result<Node> {
        let _ = hooks.use_provider("theme", || "inner".to_string())?;
        Ok(ComponentNode::new("consumer").into())
    });
    builder.register_component("outer", |hooks: &mut Hooks<'_>, _: &Props| -> dcf_vdom::Result<Node> {
        let _ = hooks.use_provider("theme", || "outer".to_string())?;
        Ok(Element::new("View").child(ComponentNode::new("inner")).into())
    });

    let mut engine = builder.finish();
    engine.mount(ComponentNode::new("outer")).unwrap();

    assert!(engine.bridge().ops().iter().any(
        |op| matches!(op, Op::Create { props_json, .. } if props_json.contains("inner"))
    ));
}

struct TicketCounter(Rc<Cell<u64>>);

impl HookFactory for TicketCounter {
    fn create(&self, _instance: InstanceId) -> Rc<dyn Any> {
        self.0.set(self.0.get() + 1);
        Rc::new(self.0.get())
    }
}

#[test]
fn hook_factories_back_custom_hooks() {
    let issued = Rc::new(Cell::new(0u64));

    let mut builder = Engine::builder(TestBridge::new());
    builder.registry_mut().add_hook_factory("use_ticket", TicketCounter(issued.clone()));

    builder.register_component("holder", |hooks: &mut Hooks<'_>, _: &Props| -> dcf_vdom::Result<Node> {
        let ticket = hooks.use_custom("use_ticket")?;
        let number = ticket.downcast_ref::<u64>().copied().unwrap_or(0);
        Ok(Element::new("Text").prop("content", number as i64).into())
    });
    let mut engine = builder.finish();

    engine.mount(ComponentNode::new("holder")).unwrap();
    engine.mount(ComponentNode::new("holder")).unwrap();

    // The slot is created once and retained across renders
    assert_eq!(issued.get(), 1);
}

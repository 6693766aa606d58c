use dcf_bridge::Op;
use dcf_store::{InstanceId, ViewId};
use fxhash::FxHashSet;
use serde_json::Value;

use crate::component::ComponentRegistry;
use crate::error::{Error, Result};
use crate::events::HandlerTable;
use crate::hooks::{Hooks, teardown_slots};
use crate::node::{ComponentNode, Element, Node};
use crate::portal::PortalManager;
use crate::props::PropValue;
use crate::registry::{LifecycleCtx, PropDiffCtx, Registry};
use crate::schedule::Priority;
use crate::tree::{
    BoundaryInstance, ComponentInstance, Dirty, ElementInstance, FragmentInstance, InstanceKind, InstanceTree,
    PortalInstance, ViewIds,
};

mod children;
mod propdiff;

pub(crate) use self::propdiff::{diff_from_keys, diff_props, handler_changes};

/// The reserved element prop that names a portal anchor.
pub const ANCHOR_PROP: &str = "anchor";

/// Where a node lands in the retained tree and in the native child
/// list of its nearest element ancestor.
#[derive(Debug, Copy, Clone)]
pub struct Slot {
    pub parent: Option<InstanceId>,
    /// `None` for the roots of portal content, whose attachment is
    /// owned by the portal manager
    pub parent_view: Option<ViewId>,
    /// Index in the parent instance's child list
    pub index: usize,
    /// Index of the first native slot in the native parent
    pub native_index: usize,
}

impl Slot {
    pub fn root() -> Self {
        Self {
            parent: None,
            parent_view: Some(ViewId::ROOT),
            index: 0,
            native_index: 0,
        }
    }
}

/// A prop comparison job for the worker pool: the props of a matched
/// old/new element pair as plain JSON data.
pub struct PropDiffJob {
    pub index: usize,
    pub old: Value,
    pub new: Value,
}

/// Worker output: the keys that changed for one job.
pub struct PropDiffOutcome {
    pub index: usize,
    pub changed: Vec<String>,
}

/// Offloads prop comparison of large child lists to pure workers.
/// Purely an optimization: results must match [`diff_json_keys`].
pub trait PropOffload {
    fn diff(&self, jobs: Vec<PropDiffJob>) -> Vec<PropDiffOutcome>;
}

/// The pure comparison workers run: keys whose value changed between
/// two JSON prop objects, including keys that were removed.
pub fn diff_json_keys(old: &Value, new: &Value) -> Vec<String> {
    let empty = serde_json::Map::new();
    let old = old.as_object().unwrap_or(&empty);
    let new = new.as_object().unwrap_or(&empty);

    let mut changed = Vec::new();
    for (key, value) in new {
        if old.get(key) != Some(value) {
            changed.push(key.clone());
        }
    }
    for key in old.keys() {
        if !new.contains_key(key) {
            changed.push(key.clone());
        }
    }
    changed
}

/// Everything one diff pass produced.
pub struct DiffResult {
    pub ops: Vec<Op>,
    /// Instances mounted or updated this pass, in traversal order.
    /// The commit pipeline runs their effect slots.
    pub effects: Vec<InstanceId>,
    /// Errors captured by boundaries during the pass
    pub errors: Vec<Error>,
}

/// One diff pass over the retained tree.
///
/// Borrows the engine's long-lived structures; constructed per pass,
/// accumulates ops, and is consumed by [`Reconciler::take_result`].
pub struct Reconciler<'eng> {
    tree: &'eng mut InstanceTree,
    views: &'eng mut ViewIds,
    registry: &'eng Registry,
    components: &'eng ComponentRegistry,
    handlers: &'eng mut HandlerTable,
    portals: &'eng mut PortalManager,
    offload: Option<&'eng dyn PropOffload>,
    offload_threshold: usize,

    ops: Vec<Op>,
    effects: Vec<InstanceId>,
    errors: Vec<Error>,
    // Boundaries whose fallback already rendered this pass: only the
    // first error per commit reaches the user fallback
    surfaced: FxHashSet<InstanceId>,
}

impl<'eng> Reconciler<'eng> {
    pub fn new(
        tree: &'eng mut InstanceTree,
        views: &'eng mut ViewIds,
        registry: &'eng Registry,
        components: &'eng ComponentRegistry,
        handlers: &'eng mut HandlerTable,
        portals: &'eng mut PortalManager,
    ) -> Self {
        Self {
            tree,
            views,
            registry,
            components,
            handlers,
            portals,
            offload: None,
            offload_threshold: usize::MAX,
            ops: Vec::new(),
            effects: Vec::new(),
            errors: Vec::new(),
            surfaced: FxHashSet::default(),
        }
    }

    pub fn with_offload(mut self, offload: &'eng dyn PropOffload, threshold: usize) -> Self {
        self.offload = Some(offload);
        self.offload_threshold = threshold.max(1);
        self
    }

    pub fn take_result(&mut self) -> DiffResult {
        DiffResult {
            ops: std::mem::take(&mut self.ops),
            effects: std::mem::take(&mut self.effects),
            errors: std::mem::take(&mut self.errors),
        }
    }

    /// Reconcile the tree root against a new virtual tree.
    pub fn reconcile_root(&mut self, new: &Node) -> Result<Option<InstanceId>> {
        let old = self.tree.roots().first().copied();
        match self.reconcile(old, new, Slot::root()) {
            Ok(id) => Ok(id),
            Err(err) => {
                // No boundary above the root: log and leave the slot empty
                log::error!("unhandled error at the tree root: {err}");
                self.errors.push(err.clone());
                if let Some(old) = self.tree.roots().first().copied() {
                    self.unmount(old);
                }
                Err(err)
            }
        }
    }

    /// Re-render one component in place. Scheduled by state writes
    /// and store notifications.
    pub fn rerender(&mut self, instance: InstanceId) -> Result<()> {
        if !self.tree.is_live(instance) {
            // Destroyed between scheduling and running: drop the update
            return Ok(());
        }

        match self.rerender_inner(instance) {
            Ok(()) => Ok(()),
            Err(err) => self.capture_from(instance, err),
        }
    }

    fn rerender_inner(&mut self, instance: InstanceId) -> Result<()> {
        self.lifecycle(instance, |i, ctx| i.before_update(ctx));

        let rendered = self.render_component(instance)?;
        let old_child = self.tree.expect(instance).children.first().copied();
        let slot = Slot {
            parent: Some(instance),
            parent_view: self.tree.native_parent_of(instance),
            index: 0,
            native_index: self.tree.native_index_of(instance),
        };
        self.reconcile(old_child, &rendered, slot)?;
        self.effects.push(instance);

        // A root of portal content has no native parent; its
        // attachment is recomputed by the manager
        if slot.parent_view.is_none() {
            let portal = self
                .tree
                .ancestors(instance)
                .into_iter()
                .find(|id| matches!(self.tree.expect(*id).kind, InstanceKind::Portal(_)));
            if let Some(portal) = portal {
                self.sync_portal_contents(portal);
            }
        }

        self.lifecycle(instance, |i, ctx| i.after_update(ctx));
        Ok(())
    }

    /// Recompute portal anchors touched this pass.
    pub fn flush_portals(&mut self) {
        self.portals.flush(&mut self.ops);
    }

    // ---------------------------------------------------------------
    //   - Dispatch -
    // ---------------------------------------------------------------

    pub(crate) fn reconcile(&mut self, old: Option<InstanceId>, new: &Node, slot: Slot) -> Result<Option<InstanceId>> {
        self.reconcile_inner(old, new, slot, None)
    }

    fn reconcile_inner(
        &mut self,
        old: Option<InstanceId>,
        new: &Node,
        slot: Slot,
        precomputed: Option<Vec<String>>,
    ) -> Result<Option<InstanceId>> {
        // A matching reconciliation handler owns this component type
        if let Node::Component(comp) = new {
            if let Some(handler) = self.registry.reconciler_for(&comp.component) {
                let mut ctx = HandlerCtx { rec: self, slot };
                return handler.reconcile(&mut ctx, old, comp);
            }
        }

        self.reconcile_default(old, new, slot, precomputed)
    }

    fn reconcile_default(
        &mut self,
        old: Option<InstanceId>,
        new: &Node,
        slot: Slot,
        precomputed: Option<Vec<String>>,
    ) -> Result<Option<InstanceId>> {
        let Some(old_id) = old else {
            return self.mount(new, slot);
        };

        if new.is_null() {
            self.unmount(old_id);
            return Ok(None);
        }

        if !self.same_identity(old_id, new) {
            return self.replace(old_id, new, slot);
        }

        match new {
            Node::Element(el) => self.retain_element(old_id, el, precomputed),
            Node::Component(comp) => self.retain_component(old_id, comp, slot),
            Node::Fragment(frag) => {
                {
                    let instance = self.tree.expect_mut(old_id);
                    let InstanceKind::Fragment(retained) = &mut instance.kind else { unreachable!() };
                    retained.metadata = frag.metadata.clone();
                }
                self.reconcile_children(old_id, slot.parent_view, &frag.children, slot.native_index)?;
                Ok(Some(old_id))
            }
            Node::Portal(portal) => {
                let retargeted = {
                    let instance = self.tree.expect_mut(old_id);
                    let InstanceKind::Portal(retained) = &mut instance.kind else { unreachable!() };
                    if retained.anchor != portal.target_anchor {
                        retained.anchor = portal.target_anchor.clone();
                        Some(retained.portal)
                    } else {
                        None
                    }
                };
                if let Some(pid) = retargeted {
                    self.portals.retarget(pid, portal.target_anchor.clone());
                }

                self.reconcile_children(old_id, None, &portal.children, 0)?;
                self.sync_portal_contents(old_id);
                Ok(Some(old_id))
            }
            Node::Boundary(boundary) => {
                {
                    let instance = self.tree.expect_mut(old_id);
                    let InstanceKind::Boundary(retained) = &mut instance.kind else { unreachable!() };
                    retained.fallback = boundary.fallback.clone();
                    retained.failed = false;
                }

                let old_child = self.tree.expect(old_id).children.first().copied();
                let child_slot = Slot {
                    parent: Some(old_id),
                    parent_view: slot.parent_view,
                    index: 0,
                    native_index: slot.native_index,
                };
                if let Err(err) = self.reconcile(old_child, &boundary.child, child_slot) {
                    self.capture(old_id, err)?;
                }
                Ok(Some(old_id))
            }
            Node::Null => unreachable!("handled above"),
        }
    }

    // Same reconciliation identity: same kind, same type string for
    // elements and components, and the same key.
    fn same_identity(&self, old_id: InstanceId, new: &Node) -> bool {
        let instance = self.tree.expect(old_id);
        if instance.kind.key() != new.key() {
            return false;
        }

        match (&instance.kind, new) {
            (InstanceKind::Element(el), Node::Element(node)) => el.tag == node.tag,
            (InstanceKind::Component(comp), Node::Component(node)) => comp.component_type == node.component,
            (InstanceKind::Fragment(_), Node::Fragment(_)) => true,
            (InstanceKind::Portal(_), Node::Portal(_)) => true,
            (InstanceKind::Boundary(_), Node::Boundary(_)) => true,
            _ => false,
        }
    }

    // ---------------------------------------------------------------
    //   - Mount -
    // ---------------------------------------------------------------

    fn mount(&mut self, new: &Node, slot: Slot) -> Result<Option<InstanceId>> {
        match new {
            Node::Null => Ok(None),
            Node::Element(el) => self.mount_element(el, slot).map(Some),
            Node::Component(comp) => self.mount_component(comp, slot).map(Some),
            Node::Fragment(frag) => {
                let id = self.tree.insert(
                    slot.parent,
                    slot.index,
                    InstanceKind::Fragment(FragmentInstance {
                        key: frag.key.clone(),
                        metadata: frag.metadata.clone(),
                    }),
                );
                self.mount_children(&frag.children, id, slot.parent_view, slot.native_index)?;
                Ok(Some(id))
            }
            Node::Portal(portal) => {
                let pid = self.portals.register_portal(&portal.target_anchor);
                let id = self.tree.insert(
                    slot.parent,
                    slot.index,
                    InstanceKind::Portal(PortalInstance {
                        key: portal.key.clone(),
                        portal: pid,
                        anchor: portal.target_anchor.clone(),
                    }),
                );
                self.mount_children(&portal.children, id, None, 0)?;
                self.sync_portal_contents(id);
                Ok(Some(id))
            }
            Node::Boundary(boundary) => {
                let id = self.tree.insert(
                    slot.parent,
                    slot.index,
                    InstanceKind::Boundary(BoundaryInstance {
                        key: boundary.key.clone(),
                        fallback: boundary.fallback.clone(),
                        failed: false,
                    }),
                );
                let child_slot = Slot {
                    parent: Some(id),
                    parent_view: slot.parent_view,
                    index: 0,
                    native_index: slot.native_index,
                };
                if let Err(err) = self.mount(&boundary.child, child_slot) {
                    self.capture(id, err)?;
                }
                Ok(Some(id))
            }
        }
    }

    fn mount_element(&mut self, el: &Element, slot: Slot) -> Result<InstanceId> {
        let view = self.views.allocate();

        self.ops.push(Op::create(view, el.tag.clone(), el.props.to_json()));

        if let Some(PropValue::Str(anchor)) = el.props.get(ANCHOR_PROP) {
            self.portals.register_anchor(anchor.clone(), view);
        }

        for (event, handler) in el.props.handlers() {
            self.handlers.bind(view, event.clone(), handler.clone());
            self.ops.push(Op::bind(view, event));
        }

        let id = self.tree.insert(
            slot.parent,
            slot.index,
            InstanceKind::Element(ElementInstance {
                tag: el.tag.clone(),
                view,
                key: el.key.clone(),
                props: el.props.clone(),
            }),
        );

        self.mount_children(&el.children, id, Some(view), 0)?;

        if let Some(parent_view) = slot.parent_view {
            self.ops.push(Op::attach(parent_view, view, slot.native_index));
        }

        Ok(id)
    }

    fn mount_children(
        &mut self,
        children: &[Node],
        parent: InstanceId,
        parent_view: Option<ViewId>,
        base_native: usize,
    ) -> Result<()> {
        let mut index = 0;
        let mut native = base_native;

        for child in children {
            let slot = Slot {
                parent: Some(parent),
                parent_view,
                index,
                native_index: native,
            };
            if let Some(id) = self.mount(child, slot)? {
                index += 1;
                native += self.tree.native_len(id);
            }
        }

        Ok(())
    }

    fn mount_component(&mut self, comp: &ComponentNode, slot: Slot) -> Result<InstanceId> {
        let def = self
            .components
            .get(&comp.component)
            .ok_or_else(|| Error::UnknownComponentType(comp.component.clone()))?;

        let priority = Priority::for_component(&comp.component, def.priority());

        let id = self.tree.insert(
            slot.parent,
            slot.index,
            InstanceKind::Component(ComponentInstance {
                component_type: comp.component.clone(),
                key: comp.key.clone(),
                props: comp.props.clone(),
                def,
                hooks: Vec::new(),
                priority,
                first_render: true,
                dirty: Default::default(),
            }),
        );

        self.lifecycle(id, |i, ctx| i.before_mount(ctx));

        let rendered = self.render_component(id)?;
        let child_slot = Slot {
            parent: Some(id),
            parent_view: slot.parent_view,
            index: 0,
            native_index: slot.native_index,
        };
        self.reconcile(None, &rendered, child_slot)?;
        self.effects.push(id);

        self.lifecycle(id, |i, ctx| i.after_mount(ctx));
        Ok(id)
    }

    // ---------------------------------------------------------------
    //   - Retain -
    // ---------------------------------------------------------------

    fn retain_element(
        &mut self,
        old_id: InstanceId,
        el: &Element,
        precomputed: Option<Vec<String>>,
    ) -> Result<Option<InstanceId>> {
        let (view, old_props) = {
            let retained = self.tree.expect(old_id).as_element().expect("identity was checked");
            (retained.view, retained.props.clone())
        };

        let changes = handler_changes(&old_props, &el.props);
        for (event, handler) in &changes.replaced {
            self.handlers.bind(view, event.clone(), handler.clone());
        }

        let mut diff = match &precomputed {
            Some(keys) => diff_from_keys(&old_props, &el.props, keys),
            None => diff_props(&old_props, &el.props),
        };

        let ctx = PropDiffCtx {
            tag: &el.tag,
            view,
            old: &old_props,
            new: &el.props,
        };
        for interceptor in self.registry.prop_diffs_for(&el.tag) {
            if interceptor.should_handle(&ctx) {
                interceptor.intercept(&ctx, &mut diff);
            }
        }

        // An update stripped of every key is suppressed, not shipped
        if !diff.is_empty() {
            self.ops.push(Op::update(view, diff.to_json()));
        }

        for (event, handler) in changes.bound {
            self.handlers.bind(view, event.clone(), handler);
            self.ops.push(Op::bind(view, event));
        }
        for event in changes.unbound {
            self.handlers.unbind(view, &event);
            self.ops.push(Op::unbind(view, event));
        }

        let old_anchor = match old_props.get(ANCHOR_PROP) {
            Some(PropValue::Str(name)) => Some(name.clone()),
            _ => None,
        };
        let new_anchor = match el.props.get(ANCHOR_PROP) {
            Some(PropValue::Str(name)) => Some(name.clone()),
            _ => None,
        };
        if old_anchor != new_anchor {
            if let Some(old_anchor) = old_anchor {
                self.portals.remove_anchor(&old_anchor, view);
            }
            if let Some(new_anchor) = new_anchor {
                self.portals.register_anchor(new_anchor, view);
            }
        }

        {
            let instance = self.tree.expect_mut(old_id);
            let InstanceKind::Element(retained) = &mut instance.kind else { unreachable!() };
            retained.props = el.props.clone();
        }

        self.reconcile_children(old_id, Some(view), &el.children, 0)?;
        Ok(Some(old_id))
    }

    fn retain_component(&mut self, old_id: InstanceId, comp: &ComponentNode, slot: Slot) -> Result<Option<InstanceId>> {
        let skip = {
            let retained = self.tree.expect(old_id).as_component().expect("identity was checked");
            retained.def.equals(&retained.props, &comp.props) == Some(true) && retained.dirty.is_empty()
        };

        {
            let instance = self.tree.expect_mut(old_id);
            let InstanceKind::Component(retained) = &mut instance.kind else { unreachable!() };
            retained.props = comp.props.clone();
        }

        if skip {
            // Declared equal, no hook or store changes: the whole
            // subtree is current
            return Ok(Some(old_id));
        }

        self.lifecycle(old_id, |i, ctx| i.before_update(ctx));

        let rendered = self.render_component(old_id)?;
        let old_child = self.tree.expect(old_id).children.first().copied();
        let child_slot = Slot {
            parent: Some(old_id),
            parent_view: slot.parent_view,
            index: 0,
            native_index: slot.native_index,
        };
        self.reconcile(old_child, &rendered, child_slot)?;
        self.effects.push(old_id);

        self.lifecycle(old_id, |i, ctx| i.after_update(ctx));
        Ok(Some(old_id))
    }

    fn replace(&mut self, old_id: InstanceId, new: &Node, slot: Slot) -> Result<Option<InstanceId>> {
        self.unmount(old_id);
        self.mount(new, slot)
    }

    // ---------------------------------------------------------------
    //   - Unmount -
    // ---------------------------------------------------------------

    pub(crate) fn unmount(&mut self, id: InstanceId) {
        enum Teardown {
            Component { hooks: Vec<crate::hooks::HookSlot> },
            Element { view: ViewId, anchor: Option<String> },
            Portal(crate::portal::PortalId),
            Nothing,
        }

        let mut order = Vec::new();
        self.tree.collect_postorder(id, &mut order);

        for id in order {
            let teardown = {
                let instance = self.tree.expect_mut(id);
                match &mut instance.kind {
                    InstanceKind::Component(comp) => Teardown::Component {
                        hooks: std::mem::take(&mut comp.hooks),
                    },
                    InstanceKind::Element(el) => Teardown::Element {
                        view: el.view,
                        anchor: match el.props.get(ANCHOR_PROP) {
                            Some(PropValue::Str(name)) => Some(name.clone()),
                            _ => None,
                        },
                    },
                    InstanceKind::Portal(portal) => Teardown::Portal(portal.portal),
                    InstanceKind::Fragment(_) | InstanceKind::Boundary(_) => Teardown::Nothing,
                }
            };

            match teardown {
                Teardown::Component { mut hooks } => {
                    self.lifecycle(id, |i, ctx| i.before_unmount(ctx));
                    teardown_slots(id, &mut hooks);
                }
                Teardown::Element { view, anchor } => {
                    self.ops.push(Op::Delete { view_id: view });
                    self.handlers.drop_view(view);
                    if let Some(anchor) = anchor {
                        self.portals.remove_anchor(&anchor, view);
                    }
                }
                Teardown::Portal(pid) => self.portals.remove_portal(pid),
                Teardown::Nothing => (),
            }
        }

        self.tree.remove_subtree(id);
    }

    // ---------------------------------------------------------------
    //   - Render & errors -
    // ---------------------------------------------------------------

    fn render_component(&mut self, id: InstanceId) -> Result<Node> {
        let ancestors = self.tree.ancestors(id);
        let mut ticket = self.tree.checkout(id);

        let result = {
            let comp = ticket
                .value
                .as_component_mut()
                .expect("render is only called on components");
            let def = comp.def.clone();
            let priority = comp.priority;
            let first_render = comp.first_render;

            let ComponentInstance {
                component_type,
                props,
                hooks,
                ..
            } = comp;

            let mut frame = Hooks::new(id, component_type, priority, first_render, hooks, &ancestors, self.registry);
            def.render(&mut frame, props).and_then(|node| {
                frame.finish()?;
                Ok(node)
            })
        };

        if result.is_ok() {
            if let Some(comp) = ticket.value.as_component_mut() {
                comp.first_render = false;
                comp.dirty = Dirty::empty();
            }
        }

        self.tree.restore(ticket);
        result
    }

    /// Route an error raised at `origin` to the nearest ancestor
    /// boundary. With no boundary above, the affected subtree is
    /// unmounted and the error only logged.
    pub fn capture_from(&mut self, origin: InstanceId, err: Error) -> Result<()> {
        let boundary = self
            .tree
            .ancestors(origin)
            .into_iter()
            .find(|id| matches!(self.tree.expect(*id).kind, InstanceKind::Boundary(_)));

        match boundary {
            Some(boundary) => self.capture(boundary, err),
            None => {
                log::error!("no boundary above failing instance: {err}");
                self.errors.push(err);
                if self.tree.is_live(origin) {
                    self.unmount(origin);
                }
                Ok(())
            }
        }
    }

    // Record the error at a boundary, unmount the offending subtree
    // and put the fallback in its place.
    fn capture(&mut self, boundary: InstanceId, err: Error) -> Result<()> {
        if let Error::FallbackFailed { .. } = err {
            // A throwing fallback never cascades into other boundaries
            return Err(err);
        }

        log::error!("boundary captured: {err}");
        self.errors.push(err.clone());

        if self.surfaced.contains(&boundary) {
            return Ok(());
        }
        self.surfaced.insert(boundary);

        if let Some(child) = self.tree.expect(boundary).children.first().copied() {
            self.unmount(child);
        }

        let fallback = {
            let instance = self.tree.expect_mut(boundary);
            let InstanceKind::Boundary(b) = &mut instance.kind else {
                unreachable!("capture targets boundaries only")
            };
            b.failed = true;
            b.fallback.clone()
        };

        let node = fallback(&err);
        let slot = Slot {
            parent: Some(boundary),
            parent_view: self.tree.native_parent_of(boundary),
            index: 0,
            native_index: self.tree.native_index_of(boundary),
        };

        match self.mount(&node, slot) {
            Ok(_) => Ok(()),
            Err(inner) => Err(Error::FallbackFailed {
                message: inner.to_string(),
            }),
        }
    }

    // ---------------------------------------------------------------
    //   - Helpers -
    // ---------------------------------------------------------------

    fn lifecycle(&mut self, id: InstanceId, f: impl Fn(&dyn crate::registry::LifecycleInterceptor, &LifecycleCtx<'_>)) {
        let Some(instance) = self.tree.get(id) else { return };
        let Some(comp) = instance.as_component() else { return };

        let ctx = LifecycleCtx {
            instance: id,
            component_type: &comp.component_type,
            props: &comp.props,
        };
        self.registry.lifecycle(&ctx, f);
    }

    fn sync_portal_contents(&mut self, id: InstanceId) {
        let Some(instance) = self.tree.get(id) else { return };
        let InstanceKind::Portal(portal) = &instance.kind else { return };
        let pid = portal.portal;

        let mut roots = Vec::new();
        for child in instance.children.clone() {
            self.tree.native_roots(child, &mut roots);
        }
        self.portals.set_contents(pid, roots);
    }
}

/// Capabilities handed to a [`crate::registry::ReconcileHandler`]:
/// the default algorithm plus the mount/unmount/replace primitives.
pub struct HandlerCtx<'r, 'eng> {
    rec: &'r mut Reconciler<'eng>,
    slot: Slot,
}

impl HandlerCtx<'_, '_> {
    pub fn slot(&self) -> Slot {
        self.slot
    }

    /// Run the default algorithm for this component node.
    pub fn default_reconcile(&mut self, old: Option<InstanceId>, new: &ComponentNode) -> Result<Option<InstanceId>> {
        self.rec
            .reconcile_default(old, &Node::Component(new.clone()), self.slot, None)
    }

    /// Mount a node into the handled slot.
    pub fn mount_node(&mut self, new: &Node) -> Result<Option<InstanceId>> {
        self.rec.mount(new, self.slot)
    }

    /// Unmount a retained instance.
    pub fn unmount_node(&mut self, old: InstanceId) {
        self.rec.unmount(old);
    }

    /// Unmount `old` and mount `new` in the same slot.
    pub fn replace_node(&mut self, old: InstanceId, new: &Node) -> Result<Option<InstanceId>> {
        self.rec.replace(old, new, self.slot)
    }
}

// ------------------
//   - Engine -
//   1. Mount the root tree
//   2. Tick loop            <--------------------------+
//    ^  2.1. Drain inbound events                      |
//    |  2.2. Drain store changes                       v
//    |  2.3. Drain scheduled updates  (anything to do?) (no) (yes)
//    |                                                        |
//    |       +------------------------------------------------+
//    |       |
//    |       V
//    |       1. Render dirty components by priority
//    |       2. Reconcile -> ops
//    +------ 3. Commit: parse, ship, layout, effects
//
// -----------------------------------------------------------------------------

use std::time::{Duration, Instant};

use dcf_bridge::{Bridge, BridgeEvent, EventEmitter, LayoutDefaults, LayoutEngine, ShadowNode};
use dcf_state::{Changes, Store, Subscriber, clear_all_changes, clear_all_subs, drain_changes};
use dcf_store::stack::Stack;
use dcf_store::{InstanceId, ViewId};
use dcf_vdom::{
    ComponentInstance, ComponentRegistry, DiffResult, Dirty, EffectPhase, HandlerTable, HookSlot, InstanceKind,
    InstanceTree, Node, PortalManager, Reconciler, Registry, ScheduledUpdate, ViewIds, clear_scheduled,
    drain_scheduled, has_scheduled, run_effects, teardown_slots,
};
use fxhash::{FxHashMap, FxHashSet};
use serde_json::Value;

use crate::builder::EngineBuilder;
use crate::commit::{CommitStats, parse_ops};
use crate::error::{Error, Result};
use crate::scheduler::Scheduler;
use crate::workers::WorkerPool;

/// The engine: one per process.
///
/// Owns the view-id allocator, the extension registry, the portal
/// manager, the scheduler queues, the handler table and the retained
/// instance tree. Everything runs on the thread that created it.
pub struct Engine<B> {
    pub(crate) bridge: B,
    pub(crate) layout: Box<dyn LayoutEngine>,
    pub(crate) layout_defaults: LayoutDefaults,
    pub(crate) emitter: EventEmitter,
    pub(crate) events_rx: flume::Receiver<BridgeEvent>,

    pub(crate) tree: InstanceTree,
    pub(crate) views: ViewIds,
    pub(crate) registry: Registry,
    pub(crate) components: ComponentRegistry,
    pub(crate) handlers: HandlerTable,
    pub(crate) portals: PortalManager,
    pub(crate) scheduler: Scheduler,
    pub(crate) workers: Option<WorkerPool>,
    pub(crate) isolate_threshold: usize,
    pub(crate) frame_budget: Duration,

    // Local drain buffers, reused across ticks
    changes: Changes,
    pending_updates: Stack<ScheduledUpdate>,

    live_views: FxHashSet<ViewId>,
    system: std::rc::Rc<Store<u64>>,
    system_version: u64,
    insertion_latched: bool,
    committing: bool,
    error_count: u64,

    root: Option<Node>,
    root_pending: Option<Node>,
    remount_pending: bool,
}

impl<B: Bridge> Engine<B> {
    pub fn builder(bridge: B) -> EngineBuilder<B> {
        EngineBuilder::new(bridge)
    }

    pub(crate) fn from_builder(builder: EngineBuilder<B>, events_rx: flume::Receiver<BridgeEvent>) -> Self {
        let mut live_views = FxHashSet::default();
        live_views.insert(ViewId::ROOT);

        let workers = match builder.worker_pool_size {
            0 => None,
            size => Some(WorkerPool::new(size)),
        };

        Self {
            bridge: builder.bridge,
            layout: builder.layout,
            layout_defaults: builder.layout_defaults,
            emitter: builder.emitter,
            events_rx,

            tree: InstanceTree::new(),
            views: ViewIds::new(),
            registry: builder.registry,
            components: builder.components,
            handlers: HandlerTable::new(),
            portals: PortalManager::new(),
            scheduler: Scheduler::new(),
            workers,
            isolate_threshold: builder.isolate_threshold_nodes,
            frame_budget: Duration::from_millis(builder.frame_budget_ms),

            changes: Stack::empty(),
            pending_updates: Stack::empty(),

            live_views,
            system: builder.system,
            system_version: 0,
            insertion_latched: false,
            committing: false,
            error_count: 0,

            root: None,
            root_pending: None,
            remount_pending: false,
        }
    }

    /// Mount the root virtual tree under the host root view and run
    /// the first tick.
    pub fn mount(&mut self, node: impl Into<Node>) -> Result<CommitStats> {
        let node = node.into();
        self.root = Some(node.clone());
        self.root_pending = Some(node);
        self.tick()
    }

    /// One frame tick: drain inputs, render what became dirty within
    /// the frame budget, commit the resulting ops as one batch.
    pub fn tick(&mut self) -> Result<CommitStats> {
        let frame_start = Instant::now();

        self.drain_events();
        self.ingest_store_changes();
        self.ingest_scheduled();

        if self.remount_pending {
            self.reset_after_rejection();
        }

        let result = {
            let mut rec = Reconciler::new(
                &mut self.tree,
                &mut self.views,
                &self.registry,
                &self.components,
                &mut self.handlers,
                &mut self.portals,
            );
            if let Some(pool) = &self.workers {
                rec = rec.with_offload(pool, self.isolate_threshold);
            }

            if let Some(root) = self.root_pending.take() {
                match rec.reconcile_root(&root) {
                    Ok(_) => (),
                    // Already logged and unmounted; a failing fallback
                    // is the one fatal case
                    Err(err @ dcf_vdom::Error::FallbackFailed { .. }) => return Err(err.into()),
                    Err(_) => (),
                }
            }

            loop {
                let over_budget = frame_start.elapsed() >= self.frame_budget;
                let Some(instance) = self.scheduler.pop(over_budget) else { break };
                rec.rerender(instance)?;
            }

            rec.flush_portals();
            rec.take_result()
        };

        self.commit(result)
    }

    /// Tick until no work is pending. Test and shutdown helper.
    pub fn run_until_idle(&mut self) -> Result<()> {
        let mut guard = 0;
        while !self.idle() {
            self.tick()?;
            guard += 1;
            if guard > 1024 {
                log::warn!("run_until_idle gave up after {guard} ticks; update loop suspected");
                break;
            }
        }
        Ok(())
    }

    pub fn idle(&self) -> bool {
        self.scheduler.is_empty()
            && self.events_rx.is_empty()
            && !has_scheduled()
            && !dcf_state::has_changes()
            && self.root_pending.is_none()
            && !self.remount_pending
    }

    /// The recommended delay before the next tick, from the most
    /// urgent pending priority.
    pub fn next_tick_delay(&self) -> Option<Duration> {
        self.scheduler.next_delay()
    }

    // ---------------------------------------------------------------
    //   - Inbound -
    // ---------------------------------------------------------------

    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                BridgeEvent::Event { view, name, payload } => {
                    // Stale events for unmounted views land nowhere
                    if !self.handlers.dispatch(view, &name, &payload) {
                        log::debug!("no handler for `{name}` on view {view}");
                    }
                }
                BridgeEvent::SystemChange(change) => {
                    self.system_version += 1;
                    log::info!("system change {change:?}, version {}", self.system_version);
                    self.system.set(self.system_version);
                }
            }
        }
    }

    fn ingest_store_changes(&mut self) {
        drain_changes(&mut self.changes);
        if self.changes.is_empty() {
            return;
        }

        let notifications: Vec<(dcf_store::StoreId, Vec<Subscriber>)> = self.changes.drain().rev().collect();
        for (_, subscribers) in notifications {
            for Subscriber(instance) in subscribers {
                let Some(comp) = self.tree.get_mut(instance).and_then(|i| i.as_component_mut()) else {
                    continue;
                };
                comp.dirty.insert(Dirty::STORE);
                let priority = comp.priority;
                self.scheduler.enqueue(instance, priority);
            }
        }
    }

    fn ingest_scheduled(&mut self) {
        drain_scheduled(&mut self.pending_updates);
        if self.pending_updates.is_empty() {
            return;
        }

        let updates: Vec<ScheduledUpdate> = self.pending_updates.drain().rev().collect();
        for update in updates {
            // Updates for destroyed instances are dropped
            if !self.tree.is_live(update.instance) {
                self.scheduler.cancel(update.instance);
                continue;
            }

            let component_type = self
                .tree
                .expect(update.instance)
                .as_component()
                .map(|c| c.component_type.clone());
            let Some(component_type) = component_type else { continue };

            let update = match self.registry.state_change_for(&component_type) {
                Some(handler) if handler.should_handle(update.instance, &component_type) => {
                    match handler.handle(update) {
                        Some(update) => update,
                        // Filtered out
                        None => continue,
                    }
                }
                _ => update,
            };

            if !self.tree.is_live(update.instance) {
                continue;
            }

            if let Some(write) = update.write {
                let Some(comp) = self.tree.get_mut(update.instance).and_then(|i| i.as_component_mut()) else {
                    continue;
                };
                match comp.hooks.get_mut(write.slot) {
                    Some(HookSlot::State(value)) => {
                        *value = write.value;
                        comp.dirty.insert(Dirty::HOOK_STATE);
                    }
                    _ => log::warn!(
                        "state write for `{component_type}` addressed slot {} which is not a state slot",
                        write.slot
                    ),
                }
            }

            self.scheduler.enqueue(update.instance, update.priority);
        }
    }

    // ---------------------------------------------------------------
    //   - Commit -
    // ---------------------------------------------------------------

    fn commit(&mut self, result: DiffResult) -> Result<CommitStats> {
        debug_assert!(!self.committing, "commit does not re-enter");

        let DiffResult { ops, effects, errors } = result;
        self.error_count += errors.len() as u64;

        let mut stats = CommitStats::default();

        if !ops.is_empty() {
            let ordered = parse_ops(ops, &self.live_views, &mut stats)?;

            if !ordered.is_empty() {
                let ship_start = Instant::now();
                self.bridge.begin_batch();
                let accepted = self.bridge.commit_batch(&ordered);
                stats.ship = ship_start.elapsed();

                if !accepted {
                    // The native tree may be partially modified; the
                    // engine compensates with a full remount next pass
                    self.error_count += 1;
                    self.remount_pending = true;
                    self.root_pending = self.root.clone();
                    log::error!("commit batch rejected; remounting on the next tick");
                    return Err(Error::BridgeRejected);
                }

                for op in &ordered {
                    if let Some(view) = op.created() {
                        self.live_views.insert(view);
                    }
                    if let Some(view) = op.deleted() {
                        self.live_views.remove(&view);
                    }
                }

                // One layout pass for the whole tree, not per view
                let layout_start = Instant::now();
                let shadow = self.shadow_tree();
                self.layout.compute(&shadow, &self.layout_defaults);
                stats.layout = layout_start.elapsed();
            }
        }

        let effects_start = Instant::now();
        self.committing = true;
        self.run_effect_phase(&effects, EffectPhase::Normal);
        self.run_effect_phase(&effects, EffectPhase::Layout);

        if self.insertion_latched {
            self.run_effect_phase(&effects, EffectPhase::Insertion);
        } else if self.scheduler.is_empty() && !has_scheduled() {
            // The first commit that leaves the queues empty arms the
            // whole tree; later mounts run theirs per commit
            let all = self.tree.instance_ids();
            self.run_effect_phase(&all, EffectPhase::Insertion);
            self.insertion_latched = true;
        }
        self.committing = false;
        stats.effects = effects_start.elapsed();

        log::debug!(
            "commit: {} ops (parse {:?}, ship {:?}, layout {:?}, effects {:?})",
            stats.op_count(),
            stats.parse,
            stats.ship,
            stats.layout,
            stats.effects,
        );

        Ok(stats)
    }

    fn run_effect_phase(&mut self, instances: &[InstanceId], phase: EffectPhase) {
        for id in instances {
            let Some(comp) = self.tree.get_mut(*id).and_then(|i| i.as_component_mut()) else {
                continue;
            };
            let ComponentInstance {
                component_type, hooks, ..
            } = comp;
            run_effects(component_type, hooks, phase);
        }
    }

    // The shadow tree handed to the layout engine: the attached view
    // hierarchy with portal content under its anchor.
    fn shadow_tree(&self) -> ShadowNode {
        let mut portal_content: FxHashMap<ViewId, Vec<InstanceId>> = FxHashMap::default();
        for id in self.tree.instance_ids() {
            let instance = self.tree.expect(id);
            if let InstanceKind::Portal(portal) = &instance.kind {
                if let Some(anchor_view) = self.portals.anchor(&portal.anchor) {
                    portal_content
                        .entry(anchor_view)
                        .or_default()
                        .extend(instance.children.iter().copied());
                }
            }
        }

        let mut children = Vec::new();
        for root in self.tree.roots() {
            self.shadow_collect(*root, &mut children, &portal_content);
        }

        ShadowNode {
            view: ViewId::ROOT,
            tag: "root".to_string(),
            props_json: "{}".to_string(),
            children,
        }
    }

    fn shadow_collect(
        &self,
        id: InstanceId,
        out: &mut Vec<ShadowNode>,
        portal_content: &FxHashMap<ViewId, Vec<InstanceId>>,
    ) {
        let Some(instance) = self.tree.get(id) else { return };

        match &instance.kind {
            InstanceKind::Element(el) => {
                let mut children = Vec::new();
                for child in &instance.children {
                    self.shadow_collect(*child, &mut children, portal_content);
                }
                if let Some(extra) = portal_content.get(&el.view) {
                    for child in extra {
                        self.shadow_collect(*child, &mut children, portal_content);
                    }
                }
                out.push(ShadowNode {
                    view: el.view,
                    tag: el.tag.clone(),
                    props_json: el.props.to_json(),
                    children,
                });
            }
            // Content is collected under its anchor instead
            InstanceKind::Portal(_) => (),
            InstanceKind::Component(_) | InstanceKind::Fragment(_) | InstanceKind::Boundary(_) => {
                for child in &instance.children {
                    self.shadow_collect(*child, out, portal_content);
                }
            }
        }
    }

    // Forget every engine-side binding without emitting ops; the next
    // tick mounts the stored root from scratch with fresh view ids.
    fn reset_after_rejection(&mut self) {
        for id in self.tree.instance_ids() {
            if let Some(comp) = self.tree.get_mut(id).and_then(|i| i.as_component_mut()) {
                let mut hooks = std::mem::take(&mut comp.hooks);
                teardown_slots(id, &mut hooks);
            }
        }
        self.tree.clear();
        self.handlers.clear();
        self.portals.clear();
        self.scheduler.clear();
        self.live_views.clear();
        self.live_views.insert(ViewId::ROOT);
        // Full-tree remount re-arms the insertion latch
        self.insertion_latched = false;
        self.remount_pending = false;
    }

    // ---------------------------------------------------------------
    //   - Public surface -
    // ---------------------------------------------------------------

    /// Imperative native call that cannot be expressed as props.
    pub fn call_method(&mut self, view: ViewId, method: &str, args: Value) -> Result<Value> {
        // Results for views that died in the meantime are not wanted
        if !self.live_views.contains(&view) {
            return Err(dcf_bridge::Error::NoSuchView(view).into());
        }
        Ok(self.bridge.call_method(view, method, args)?)
    }

    /// Sender half of the inbound event channel.
    pub fn emitter(&self) -> EventEmitter {
        self.emitter.clone()
    }

    /// The process-wide system version counter, bumped by every
    /// system change. Components that depend on system state
    /// subscribe via [`Engine::system_store`] and fold the counter
    /// into their props.
    pub fn system_version(&self) -> u64 {
        self.system_version
    }

    /// Shared handle to the system store; components subscribe with
    /// `use_store` to re-render on system changes.
    pub fn system_store(&self) -> std::rc::Rc<Store<u64>> {
        self.system.clone()
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut B {
        &mut self.bridge
    }

    pub fn is_view_live(&self, view: ViewId) -> bool {
        self.live_views.contains(&view)
    }

    /// Unsubscribe all listeners and cancel scheduled work.
    pub fn teardown(&mut self) {
        clear_scheduled();
        self.scheduler.clear();

        for id in self.tree.instance_ids() {
            if let Some(comp) = self.tree.get_mut(id).and_then(|i| i.as_component_mut()) {
                let mut hooks = std::mem::take(&mut comp.hooks);
                teardown_slots(id, &mut hooks);
            }
        }

        self.tree.clear();
        self.handlers.clear();
        self.portals.clear();
        clear_all_subs();
        clear_all_changes();

        self.live_views.clear();
        self.live_views.insert(ViewId::ROOT);
        self.root = None;
        self.root_pending = None;
        self.insertion_latched = false;
    }
}

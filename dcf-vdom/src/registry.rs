use std::any::Any;
use std::rc::Rc;

use dcf_store::{InstanceId, ViewId};
use fxhash::FxHashMap;

use crate::error::Result;
use crate::node::ComponentNode;
use crate::props::Props;
use crate::reconcile::HandlerCtx;
use crate::schedule::ScheduledUpdate;

/// Context handed to prop-diff interceptors.
pub struct PropDiffCtx<'a> {
    pub tag: &'a str,
    pub view: ViewId,
    pub old: &'a Props,
    pub new: &'a Props,
}

/// Rewrites the changed-props map after the raw diff.
///
/// Interceptors may add synthetic keys or remove keys. They must not
/// depend on each other's mutations within a single diff pass; an
/// `Update` left without keys is suppressed entirely.
pub trait PropDiffInterceptor {
    fn should_handle(&self, _ctx: &PropDiffCtx<'_>) -> bool {
        true
    }

    fn intercept(&self, ctx: &PropDiffCtx<'_>, diff: &mut Props);
}

/// Context handed to lifecycle interceptors.
pub struct LifecycleCtx<'a> {
    pub instance: InstanceId,
    pub component_type: &'a str,
    pub props: &'a Props,
}

/// Observes a component type's lifecycle transitions.
pub trait LifecycleInterceptor {
    fn should_handle(&self, _ctx: &LifecycleCtx<'_>) -> bool {
        true
    }

    fn before_mount(&self, _ctx: &LifecycleCtx<'_>) {}

    fn after_mount(&self, _ctx: &LifecycleCtx<'_>) {}

    fn before_update(&self, _ctx: &LifecycleCtx<'_>) {}

    fn after_update(&self, _ctx: &LifecycleCtx<'_>) {}

    fn before_unmount(&self, _ctx: &LifecycleCtx<'_>) {}
}

/// Filters or redirects scheduled state updates for a component type.
/// Returning `None` drops the update.
pub trait StateChangeHandler {
    fn should_handle(&self, _instance: InstanceId, _component_type: &str) -> bool {
        true
    }

    fn handle(&self, update: ScheduledUpdate) -> Option<ScheduledUpdate>;
}

/// Creates the storage for a user-defined hook kind. The returned
/// value lives in a `Custom` hook slot and follows the slot contract.
pub trait HookFactory {
    fn create(&self, instance: InstanceId) -> Rc<dyn Any>;
}

/// Fully overrides reconciliation for a component type.
///
/// The context exposes the default algorithm and the mount/unmount/
/// replace primitives as capabilities, so a handler can wrap rather
/// than reimplement them.
pub trait ReconcileHandler {
    fn should_handle(&self, _component_type: &str) -> bool {
        true
    }

    fn reconcile(
        &self,
        ctx: &mut HandlerCtx<'_, '_>,
        old: Option<InstanceId>,
        new: &ComponentNode,
    ) -> Result<Option<InstanceId>>;
}

/// Extension tables, all keyed for O(1) dispatch.
#[derive(Default)]
pub struct Registry {
    prop_diff: FxHashMap<String, Vec<Rc<dyn PropDiffInterceptor>>>,
    reconcilers: FxHashMap<String, Rc<dyn ReconcileHandler>>,
    lifecycle: FxHashMap<String, Vec<Rc<dyn LifecycleInterceptor>>>,
    state_change: FxHashMap<String, Rc<dyn StateChangeHandler>>,
    hook_factories: FxHashMap<String, Rc<dyn HookFactory>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prop-diff interceptor for an element type.
    pub fn add_prop_diff(&mut self, tag: impl Into<String>, interceptor: impl PropDiffInterceptor + 'static) {
        self.prop_diff.entry(tag.into()).or_default().push(Rc::new(interceptor));
    }

    /// Register a reconciliation handler for a component type.
    /// The last registration for a type wins.
    pub fn add_reconciler(&mut self, component_type: impl Into<String>, handler: impl ReconcileHandler + 'static) {
        self.reconcilers.insert(component_type.into(), Rc::new(handler));
    }

    /// Register a lifecycle interceptor for a component type.
    pub fn add_lifecycle(&mut self, component_type: impl Into<String>, interceptor: impl LifecycleInterceptor + 'static) {
        self.lifecycle
            .entry(component_type.into())
            .or_default()
            .push(Rc::new(interceptor));
    }

    /// Register a state-change handler for a component type.
    /// The last registration for a type wins.
    pub fn add_state_change(&mut self, component_type: impl Into<String>, handler: impl StateChangeHandler + 'static) {
        self.state_change.insert(component_type.into(), Rc::new(handler));
    }

    /// Register a hook factory under a hook name.
    pub fn add_hook_factory(&mut self, name: impl Into<String>, factory: impl HookFactory + 'static) {
        self.hook_factories.insert(name.into(), Rc::new(factory));
    }

    pub fn prop_diffs_for(&self, tag: &str) -> &[Rc<dyn PropDiffInterceptor>] {
        self.prop_diff.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn reconciler_for(&self, component_type: &str) -> Option<Rc<dyn ReconcileHandler>> {
        let handler = self.reconcilers.get(component_type)?;
        handler.should_handle(component_type).then(|| handler.clone())
    }

    pub fn lifecycle_for(&self, component_type: &str) -> &[Rc<dyn LifecycleInterceptor>] {
        self.lifecycle.get(component_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn state_change_for(&self, component_type: &str) -> Option<Rc<dyn StateChangeHandler>> {
        self.state_change.get(component_type).cloned()
    }

    pub fn hook_factory(&self, name: &str) -> Option<Rc<dyn HookFactory>> {
        self.hook_factories.get(name).cloned()
    }

    /// Run every matching lifecycle interceptor.
    pub(crate) fn lifecycle(&self, ctx: &LifecycleCtx<'_>, f: impl Fn(&dyn LifecycleInterceptor, &LifecycleCtx<'_>)) {
        for interceptor in self.lifecycle_for(ctx.component_type) {
            if interceptor.should_handle(ctx) {
                f(interceptor.as_ref(), ctx);
            }
        }
    }
}

pub use crate::component::{Component, ComponentRegistry, Memoized};
pub use crate::error::{Error, Result};
pub use crate::events::HandlerTable;
pub use crate::hooks::{
    Cleanup, DepList, DepValue, EffectPhase, EffectResult, HookKind, HookSlot, Hooks, RefHandle, StateSetter,
    run_effects, teardown_slots,
};
pub use crate::node::{Boundary, ComponentNode, Element, FallbackFn, Fragment, Node, NodeKey, Portal};
pub use crate::portal::{PortalId, PortalManager};
pub use crate::props::{Color, Handler, PropValue, Props, event_name, is_event_prop};
pub use crate::reconcile::{
    ANCHOR_PROP, DiffResult, HandlerCtx, PropDiffJob, PropDiffOutcome, PropOffload, Reconciler, Slot, diff_json_keys,
};
pub use crate::registry::{
    HookFactory, LifecycleCtx, LifecycleInterceptor, PropDiffCtx, PropDiffInterceptor, ReconcileHandler, Registry,
    StateChangeHandler,
};
pub use crate::schedule::{
    Priority, ScheduledUpdate, SlotWrite, clear_scheduled, drain_scheduled, has_scheduled, schedule_update,
};
pub use crate::tree::{
    ComponentInstance, Dirty, ElementInstance, Instance, InstanceKind, InstanceTree, ViewIds,
};

mod component;
mod error;
mod events;
pub mod hooks;
mod node;
mod portal;
mod props;
mod reconcile;
mod registry;
mod schedule;
mod tree;

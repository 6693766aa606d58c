use std::any::Any;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use dcf_state::{
    Store, StoreSetter, StoreValue, Subscriber, provide, read_store, record_access, resolve_provider, subscribe,
    unprovide, unsubscribe,
};
use dcf_store::InstanceId;

pub use self::slot::{Cleanup, DepList, DepValue, EffectPhase, EffectResult, EffectSlot, HookKind, HookSlot};
use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::schedule::{Priority, ScheduledUpdate, SlotWrite, schedule_update};

mod slot;

/// A mutable container that survives renders and never triggers one.
pub struct RefHandle<T> {
    inner: Rc<RefCell<T>>,
}

impl<T> Clone for RefHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> RefHandle<T> {
    pub fn set(&self, value: T) {
        *self.inner.borrow_mut() = value;
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.inner.borrow_mut())
    }
}

impl<T: Clone> RefHandle<T> {
    pub fn get(&self) -> T {
        self.inner.borrow().clone()
    }
}

/// Schedules a state write for the owning instance.
/// Cheap to clone into event handlers and effects.
pub struct StateSetter<T> {
    instance: InstanceId,
    slot: usize,
    priority: Priority,
    _p: PhantomData<*const T>,
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            instance: self.instance,
            slot: self.slot,
            priority: self.priority,
            _p: PhantomData,
        }
    }
}

impl<T: 'static> StateSetter<T> {
    /// Queue a write of this state slot and a re-render of the owning
    /// component at its priority. The write is applied by the runtime
    /// before the next render; it never mutates mid-render.
    pub fn set(&self, value: T) {
        schedule_update(ScheduledUpdate {
            instance: self.instance,
            priority: self.priority,
            write: Some(SlotWrite {
                slot: self.slot,
                value: Box::new(value),
            }),
        });
    }
}

/// The hook frame for one render call.
///
/// Keeps the slot cursor; every `use_*` call consumes exactly one
/// slot. On the first render slots are allocated, afterwards kind and
/// order must match or the render fails with a contract violation.
pub struct Hooks<'a> {
    slots: &'a mut Vec<HookSlot>,
    cursor: usize,
    first_render: bool,
    instance: InstanceId,
    component_type: &'a str,
    priority: Priority,
    ancestors: &'a [InstanceId],
    registry: &'a Registry,
}

impl<'a> Hooks<'a> {
    pub(crate) fn new(
        instance: InstanceId,
        component_type: &'a str,
        priority: Priority,
        first_render: bool,
        slots: &'a mut Vec<HookSlot>,
        ancestors: &'a [InstanceId],
        registry: &'a Registry,
    ) -> Self {
        Self {
            slots,
            cursor: 0,
            first_render,
            instance,
            component_type,
            priority,
            ancestors,
            registry,
        }
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn component_type(&self) -> &str {
        self.component_type
    }

    // Advance the cursor by one slot, allocating on first render and
    // checking kind and order on every later one.
    fn slot_index(&mut self, kind: HookKind, init: impl FnOnce() -> Result<HookSlot>) -> Result<usize> {
        let index = self.cursor;
        self.cursor += 1;

        if index < self.slots.len() {
            let found = self.slots[index].kind();
            if found != kind {
                return Err(Error::hooks(
                    self.component_type,
                    format!("slot {index} was `{found}` on a previous render, now `{kind}`"),
                ));
            }
            return Ok(index);
        }

        if self.first_render {
            self.slots.push(init()?);
            return Ok(index);
        }

        Err(Error::hooks(
            self.component_type,
            format!("render used more hook slots than were allocated ({})", self.slots.len()),
        ))
    }

    /// Per-instance state. The setter schedules an update of the
    /// owning component; priority follows the component.
    pub fn use_state<T: Clone + 'static>(&mut self, initial: impl FnOnce() -> T) -> Result<(T, StateSetter<T>)> {
        let index = self.slot_index(HookKind::State, || Ok(HookSlot::State(Box::new(initial()))))?;

        let HookSlot::State(value) = &self.slots[index] else { unreachable!() };
        let value = value.downcast_ref::<T>().ok_or_else(|| {
            Error::hooks(self.component_type, format!("state slot {index} changed type"))
        })?;

        let setter = StateSetter {
            instance: self.instance,
            slot: index,
            priority: self.priority,
            _p: PhantomData,
        };

        Ok((value.clone(), setter))
    }

    /// A mutable ref cell that persists across renders.
    pub fn use_ref<T: 'static>(&mut self, initial: impl FnOnce() -> T) -> Result<RefHandle<T>> {
        let index = self.slot_index(HookKind::Ref, || {
            let cell: Rc<dyn Any> = Rc::new(RefCell::new(initial()));
            Ok(HookSlot::Ref(cell))
        })?;

        let HookSlot::Ref(cell) = &self.slots[index] else { unreachable!() };
        let inner = cell.clone().downcast::<RefCell<T>>().map_err(|_| {
            Error::hooks(self.component_type, format!("ref slot {index} changed type"))
        })?;

        Ok(RefHandle { inner })
    }

    /// Memoized value, recomputed when `deps` change.
    pub fn use_memo<T: Clone + 'static>(&mut self, f: impl FnOnce() -> T, deps: DepList) -> Result<T> {
        let index = self.cursor;

        if index == self.slots.len() {
            // Allocation path: slot_index would need `f` for init and
            // the recompute below would need it again
            self.slot_index(HookKind::Memo, || {
                Ok(HookSlot::Memo {
                    value: Box::new(f()),
                    deps,
                })
            })?;
        } else {
            self.slot_index(HookKind::Memo, || unreachable!("the slot exists"))?;
            let HookSlot::Memo { value, deps: stored } = &mut self.slots[index] else { unreachable!() };
            if *stored != deps {
                *value = Box::new(f());
                *stored = deps;
            }
        }

        let HookSlot::Memo { value, .. } = &self.slots[index] else { unreachable!() };
        let value = value.downcast_ref::<T>().ok_or_else(|| {
            Error::hooks(self.component_type, format!("memo slot {index} changed type"))
        })?;
        Ok(value.clone())
    }

    fn use_effect_in(
        &mut self,
        phase: EffectPhase,
        f: impl FnOnce() -> EffectResult + 'static,
        deps: DepList,
    ) -> Result<()> {
        let index = self.slot_index(HookKind::Effect(phase), || {
            Ok(HookSlot::Effect(EffectSlot {
                phase,
                deps: None,
                // Reset on first mount no matter what a previous life
                // of this slot identity left behind
                prev_deps: None,
                pending: None,
                cleanup: None,
            }))
        })?;

        let HookSlot::Effect(slot) = &mut self.slots[index] else { unreachable!() };
        slot.deps = Some(deps);
        slot.pending = Some(Box::new(f));
        Ok(())
    }

    /// Side effect tied to a dependency list; runs in the commit's
    /// effect phase, cleanup first when deps changed.
    pub fn use_effect(&mut self, f: impl FnOnce() -> EffectResult + 'static, deps: DepList) -> Result<()> {
        self.use_effect_in(EffectPhase::Normal, f, deps)
    }

    /// Effect that runs after the commit's layout phase.
    pub fn use_layout_effect(&mut self, f: impl FnOnce() -> EffectResult + 'static, deps: DepList) -> Result<()> {
        self.use_effect_in(EffectPhase::Layout, f, deps)
    }

    /// Effect that runs once the entire tree has mounted and the
    /// scheduler queues have drained.
    pub fn use_insertion_effect(&mut self, f: impl FnOnce() -> EffectResult + 'static, deps: DepList) -> Result<()> {
        self.use_effect_in(EffectPhase::Insertion, f, deps)
    }

    /// Subscribe to a store. The instance re-renders when the store
    /// changes; writes go through the returned setter.
    pub fn use_store<T: StoreValue>(&mut self, store: &Store<T>) -> Result<(T, StoreSetter<T>)> {
        let id = store.id();
        let instance = self.instance;
        let component_type = self.component_type;

        let index = self.slot_index(HookKind::StoreSub, || {
            subscribe(id, Subscriber(instance));
            record_access(id, instance, component_type);
            Ok(HookSlot::StoreSub { store: id })
        })?;

        let HookSlot::StoreSub { store: stored } = &mut self.slots[index] else { unreachable!() };
        if *stored != id {
            // A different store was passed this render: follow it
            unsubscribe(*stored, Subscriber(instance));
            subscribe(id, Subscriber(instance));
            record_access(id, instance, component_type);
            *stored = id;
        }

        Ok((store.get(), store.setter()))
    }

    /// Read the nearest provider of `key` above this instance.
    /// Subscribes; returns `None` when no ancestor provides the key.
    pub fn use_context<T: StoreValue>(&mut self, key: &str) -> Result<Option<T>> {
        let resolved = resolve_provider(key, self.ancestors.iter().copied());
        let instance = self.instance;
        let component_type = self.component_type;

        let index = self.slot_index(HookKind::ContextSub, || {
            if let Some(id) = resolved {
                subscribe(id, Subscriber(instance));
                record_access(id, instance, component_type);
            }
            Ok(HookSlot::ContextSub {
                store: resolved,
                key: key.to_string(),
            })
        })?;

        let HookSlot::ContextSub { store: stored, key: stored_key } = &mut self.slots[index] else {
            unreachable!()
        };

        if stored_key != key {
            return Err(Error::hooks(
                self.component_type,
                format!("context slot {index} switched key from `{stored_key}` to `{key}`"),
            ));
        }

        if *stored != resolved {
            // The provider moved (or appeared/disappeared)
            if let Some(old) = *stored {
                unsubscribe(old, Subscriber(self.instance));
            }
            if let Some(new) = resolved {
                subscribe(new, Subscriber(self.instance));
                record_access(new, self.instance, self.component_type);
            }
            *stored = resolved;
        }

        Ok(resolved.and_then(read_store::<T>))
    }

    /// Provide a value for `key` to every descendant. The backing
    /// store is created on first render and owned by the slot.
    pub fn use_provider<T: StoreValue>(
        &mut self,
        key: &str,
        initial: impl FnOnce() -> T,
    ) -> Result<Rc<Store<T>>> {
        let instance = self.instance;
        let index = self.slot_index(HookKind::Provider, || {
            let store = Rc::new(Store::new(initial()));
            provide(instance, key, store.id());
            let any: Rc<dyn Any> = store;
            Ok(HookSlot::Provider {
                store: any,
                key: key.to_string(),
            })
        })?;

        let HookSlot::Provider { store, key: stored_key, .. } = &self.slots[index] else { unreachable!() };

        if stored_key != key {
            return Err(Error::hooks(
                self.component_type,
                format!("provider slot {index} switched key from `{stored_key}` to `{key}`"),
            ));
        }

        store.clone().downcast::<Store<T>>().map_err(|_| {
            Error::hooks(self.component_type, format!("provider slot {index} changed type"))
        })
    }

    /// A user-defined hook registered through a hook factory.
    pub fn use_custom(&mut self, name: &str) -> Result<Rc<dyn Any>> {
        let instance = self.instance;
        let factory = self
            .registry
            .hook_factory(name)
            .ok_or_else(|| Error::hooks(self.component_type, format!("no hook factory named `{name}`")))?;

        let index = self.slot_index(HookKind::Custom, || {
            Ok(HookSlot::Custom {
                name: name.to_string(),
                value: factory.create(instance),
            })
        })?;

        let HookSlot::Custom { name: stored, value } = &self.slots[index] else { unreachable!() };
        if stored != name {
            return Err(Error::hooks(
                self.component_type,
                format!("custom slot {index} switched hook from `{stored}` to `{name}`"),
            ));
        }

        Ok(value.clone())
    }

    /// Close the frame: every previously allocated slot must have
    /// been consumed by this render.
    pub(crate) fn finish(self) -> Result<()> {
        if self.cursor != self.slots.len() {
            return Err(Error::hooks(
                self.component_type,
                format!(
                    "render consumed {} hook slots, previous renders allocated {}",
                    self.cursor,
                    self.slots.len()
                ),
            ));
        }
        Ok(())
    }
}

/// Run every effect of `phase` that is due on this instance.
///
/// When deps changed: cleanup first, then the effect, then record the
/// deps. A failing effect is logged and counted as ran so it is not
/// retried. Returns how many effects ran.
pub fn run_effects(component_type: &str, slots: &mut [HookSlot], phase: EffectPhase) -> usize {
    let mut ran = 0;

    for slot in slots.iter_mut() {
        let HookSlot::Effect(effect) = slot else { continue };
        if effect.phase != phase {
            continue;
        }

        if !effect.deps_changed() {
            // Nothing to do this commit
            effect.pending = None;
            continue;
        }

        let Some(pending) = effect.pending.take() else { continue };

        if let Some(cleanup) = effect.cleanup.take() {
            cleanup();
        }

        match pending() {
            Ok(cleanup) => effect.cleanup = cleanup,
            Err(err) => {
                log::error!("effect in `{component_type}` failed: {err}");
            }
        }

        // Deps are recorded even on failure so the effect is never retried
        effect.prev_deps = effect.deps.clone();
        ran += 1;
    }

    ran
}

/// Release everything an instance's slots hold on the outside world:
/// run terminal cleanups, unsubscribe stores and contexts, withdraw
/// provided values. Called once, when the instance is destroyed.
pub fn teardown_slots(instance: InstanceId, slots: &mut Vec<HookSlot>) {
    let mut had_provider = false;

    for slot in slots.iter_mut() {
        match slot {
            HookSlot::Effect(effect) => {
                effect.pending = None;
                if let Some(cleanup) = effect.cleanup.take() {
                    cleanup();
                }
            }
            HookSlot::StoreSub { store } => unsubscribe(*store, Subscriber(instance)),
            HookSlot::ContextSub { store, .. } => {
                if let Some(store) = store {
                    unsubscribe(*store, Subscriber(instance));
                }
            }
            HookSlot::Provider { .. } => had_provider = true,
            HookSlot::State(_) | HookSlot::Ref(_) | HookSlot::Memo { .. } | HookSlot::Custom { .. } => (),
        }
    }

    if had_provider {
        unprovide(instance);
    }

    // Dropping the slots drops any provider stores and their cells
    slots.clear();
}

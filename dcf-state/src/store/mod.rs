use std::any::Any;
use std::cell::RefCell;

use dcf_store::slab::Slab;
use dcf_store::stack::Stack;
use dcf_store::{InstanceId, StoreId};

pub(crate) use self::change::changed;
pub use self::change::{Changes, clear_all_changes, drain_changes, has_changes};
use self::subscriber::Subscribers;

mod change;
pub(crate) mod subscriber;

thread_local! {
    static CELLS: RefCell<Slab<StoreId, Cell>> = const { RefCell::new(Slab::empty()) };
    static CHANGES: RefCell<Stack<StoreId>> = const { RefCell::new(Stack::empty()) };
}

/// A component instance subscribed to a store cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Subscriber(pub InstanceId);

impl From<InstanceId> for Subscriber {
    fn from(value: InstanceId) -> Self {
        Self(value)
    }
}

impl From<Subscriber> for InstanceId {
    fn from(Subscriber(value): Subscriber) -> Self {
        value
    }
}

// One observable value cell.
//
// `pending` is the notification guard: the first write in a drain
// cycle records the cell into CHANGES, every subsequent write is
// absorbed until the runtime drains.
pub(crate) struct Cell {
    pub(crate) value: Box<dyn Any>,
    pub(crate) subscribers: Subscribers,
    pub(crate) pending: bool,
    access_log: Vec<(InstanceId, String)>,
}

impl Cell {
    fn new(value: Box<dyn Any>) -> Self {
        Self {
            value,
            subscribers: Subscribers::Empty,
            pending: false,
            access_log: Vec::new(),
        }
    }
}

pub(crate) fn new_cell(value: Box<dyn Any>) -> StoreId {
    CELLS.with_borrow_mut(|cells| cells.insert(Cell::new(value)))
}

pub(crate) fn drop_cell(id: StoreId) {
    CELLS.with_borrow_mut(|cells| {
        let _ = cells.try_remove(id);
    });
}

/// Apply `f` to the cell value if the store is still alive.
pub(crate) fn with_cell<R>(id: StoreId, f: impl FnOnce(&mut Cell) -> R) -> Option<R> {
    CELLS.with_borrow_mut(|cells| cells.get_mut(id).map(f))
}

/// Add a subscriber to a store.
/// Subscribing is idempotent per subscriber.
pub fn subscribe(id: StoreId, subscriber: Subscriber) {
    CELLS.with_borrow_mut(|cells| {
        if let Some(cell) = cells.get_mut(id) {
            cell.subscribers.insert(subscriber);
        }
    });
}

/// Remove a subscriber from a store.
pub fn unsubscribe(id: StoreId, subscriber: Subscriber) {
    CELLS.with_borrow_mut(|cells| {
        if let Some(cell) = cells.get_mut(id) {
            cell.subscribers.remove(subscriber);
        }
    });
}

/// Number of live subscribers on a store.
pub fn subscriber_count(id: StoreId) -> usize {
    CELLS
        .with_borrow(|cells| cells.get(id).map(|cell| cell.subscribers.iter().count()))
        .unwrap_or(0)
}

/// Record that a component accessed this store through a hook.
/// Used to validate declared dependencies in tests.
pub fn record_access(id: StoreId, instance: InstanceId, component_type: &str) {
    CELLS.with_borrow_mut(|cells| {
        if let Some(cell) = cells.get_mut(id) {
            if !cell.access_log.iter().any(|(i, _)| *i == instance) {
                cell.access_log.push((instance, component_type.to_string()));
            }
        }
    });
}

/// The `(instance, component type)` pairs that accessed a store via hooks.
pub fn accessors(id: StoreId) -> Vec<(InstanceId, String)> {
    CELLS
        .with_borrow(|cells| cells.get(id).map(|cell| cell.access_log.clone()))
        .unwrap_or_default()
}

/// Remove all subscribers from all stores.
/// The values are kept intact.
pub fn clear_all_subs() {
    CELLS.with_borrow_mut(|cells| {
        for (_, cell) in cells.iter_mut() {
            cell.subscribers = Subscribers::Empty;
        }
    });
}

use std::marker::PhantomData;
use std::rc::Rc;

use dcf_store::StoreId;

use crate::store::{changed, drop_cell, new_cell, with_cell};

/// Values held by a [`Store`].
///
/// Equality is what decides whether a write notifies subscribers:
/// structural for plain values, pointer identity for [`Obj`].
pub trait StoreValue: Clone + PartialEq + 'static {}

impl<T: Clone + PartialEq + 'static> StoreValue for T {}

/// Shared boxed value compared by reference.
///
/// Wrapping a value in `Obj` opts the store out of structural
/// comparison: two `Obj`s are equal only if they share the allocation.
#[derive(Debug)]
pub struct Obj<T>(Rc<T>);

impl<T> Obj<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(value))
    }
}

impl<T> Clone for Obj<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> PartialEq for Obj<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> std::ops::Deref for Obj<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// An observable value.
///
/// The value lives in a thread local cell and is accessed through the
/// `Store`. Writes are coalesced: subscribers are notified once per
/// drain cycle with the last value written.
/// ```
/// # use dcf_state::Store;
/// let counter = Store::new(0usize);
/// counter.set(1);
/// counter.update(|n| n + 1);
/// assert_eq!(counter.get(), 2);
/// ```
#[derive(Debug)]
pub struct Store<T> {
    id: StoreId,
    // Ensure that `Store` is not Send or Sync.
    // Cells live in TLS; sending a store across thread boundaries
    // would read another thread's cells.
    _p: PhantomData<*const T>,
}

impl<T: StoreValue> Store<T> {
    /// Create a new store holding `value`.
    pub fn new(value: T) -> Self {
        let id = new_cell(Box::new(value));
        Self { id, _p: PhantomData }
    }

    /// A copy of the current value.
    pub fn get(&self) -> T {
        with_cell(self.id, |cell| {
            cell.value
                .downcast_ref::<T>()
                .expect("the type of a cell never changes")
                .clone()
        })
        .expect("the cell lives as long as the store")
    }

    /// Replace the value.
    /// If the new value compares equal to the current one the write
    /// is absorbed and no subscriber is notified.
    pub fn set(&self, new: T) {
        let notify = with_cell(self.id, |cell| {
            let current = cell
                .value
                .downcast_mut::<T>()
                .expect("the type of a cell never changes");

            if *current == new {
                return false;
            }

            *current = new;
            true
        })
        .expect("the cell lives as long as the store");

        if notify {
            changed(self.id);
        }
    }

    /// Replace the value with `f(current)`.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let new = {
            let current = self.get();
            f(&current)
        };
        self.set(new);
    }

    /// A detachable setter for this store.
    /// Using the setter after the store is dropped is a no-op.
    pub fn setter(&self) -> StoreSetter<T> {
        StoreSetter {
            id: self.id,
            _p: PhantomData,
        }
    }

    pub fn id(&self) -> StoreId {
        self.id
    }
}

impl<T> Drop for Store<T> {
    fn drop(&mut self) {
        drop_cell(self.id);
    }
}

/// Read a store by id without holding the owning [`Store`].
/// Returns `None` if the store has been dropped.
///
/// Context consumers resolve a provider to a [`dcf_store::StoreId`]
/// through the ancestry walk and read the backing cell this way.
pub fn read_store<T: StoreValue>(id: StoreId) -> Option<T> {
    with_cell(id, |cell| {
        cell.value
            .downcast_ref::<T>()
            .expect("the type of a cell never changes")
            .clone()
    })
}

/// Writes to a store without owning it.
///
/// Handed to components by `use_store`; outliving the store is fine,
/// late writes simply go nowhere.
#[derive(Debug)]
pub struct StoreSetter<T> {
    id: StoreId,
    _p: PhantomData<*const T>,
}

impl<T> Clone for StoreSetter<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            _p: PhantomData,
        }
    }
}

impl<T: StoreValue> StoreSetter<T> {
    pub fn set(&self, new: T) {
        let notify = with_cell(self.id, |cell| {
            let current = cell
                .value
                .downcast_mut::<T>()
                .expect("the type of a cell never changes");

            if *current == new {
                return false;
            }

            *current = new;
            true
        });

        if notify == Some(true) {
            changed(self.id);
        }
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let new = with_cell(self.id, |cell| {
            let current = cell
                .value
                .downcast_ref::<T>()
                .expect("the type of a cell never changes");
            f(current)
        });

        if let Some(new) = new {
            self.set(new);
        }
    }

    pub fn id(&self) -> StoreId {
        self.id
    }
}

#[cfg(test)]
mod test {
    use dcf_store::{InstanceId, SlabIndex, Stack};

    use super::*;
    use crate::store::{Subscriber, drain_changes, subscribe, subscriber_count, testing};

    fn sub(n: usize) -> Subscriber {
        Subscriber(InstanceId::from_usize(n))
    }

    #[test]
    fn set_then_get() {
        let store = Store::new(1u32);
        store.set(2);
        assert_eq!(store.get(), 2);
    }

    #[test]
    fn drop_removes_the_cell() {
        let before = testing::cell_count();
        let store = Store::new(123u32);
        assert_eq!(testing::cell_count(), before + 1);
        drop(store);
        assert_eq!(testing::cell_count(), before);
    }

    #[test]
    fn writes_coalesce_to_one_notification() {
        let store = Store::new(0u32);
        subscribe(store.id(), sub(7));

        store.set(1);
        store.set(2);
        store.set(3);

        let mut local = Stack::empty();
        drain_changes(&mut local);

        let drained = local.drain().collect::<Vec<_>>();
        assert_eq!(drained.len(), 1);
        let (id, subscribers) = &drained[0];
        assert_eq!(*id, store.id());
        assert_eq!(subscribers.as_slice(), &[sub(7)]);

        // The value observed at notification time is the last write
        assert_eq!(store.get(), 3);
    }

    #[test]
    fn equal_write_is_absorbed() {
        let store = Store::new(5u32);
        subscribe(store.id(), sub(1));

        store.set(5);

        let mut local = Stack::empty();
        drain_changes(&mut local);
        assert!(local.is_empty());
    }

    #[test]
    fn obj_compares_by_reference() {
        let store = Store::new(Obj::new(vec![1, 2, 3]));
        subscribe(store.id(), sub(1));

        // Same content, fresh allocation: counts as a change
        store.set(Obj::new(vec![1, 2, 3]));

        let mut local = Stack::empty();
        drain_changes(&mut local);
        assert_eq!(local.len(), 1);

        // Writing back the identical handle does not
        let same = store.get();
        store.set(same);
        let mut local = Stack::empty();
        drain_changes(&mut local);
        assert!(local.is_empty());
    }

    #[test]
    fn setter_outlives_store() {
        let store = Store::new(1u32);
        let setter = store.setter();
        drop(store);
        setter.set(2);
    }

    #[test]
    fn drain_resets_the_guard() {
        let store = Store::new(0u32);
        subscribe(store.id(), sub(1));

        store.set(1);
        let mut local = Stack::empty();
        drain_changes(&mut local);
        assert_eq!(local.len(), 1);

        // A write after the drain opens a new cycle
        store.set(2);
        let mut local = Stack::empty();
        drain_changes(&mut local);
        assert_eq!(local.len(), 1);
    }

    #[test]
    fn unsubscribe_on_teardown() {
        let store = Store::new(0u32);
        subscribe(store.id(), sub(1));
        assert_eq!(subscriber_count(store.id()), 1);
        crate::store::clear_all_subs();
        assert_eq!(subscriber_count(store.id()), 0);
    }
}

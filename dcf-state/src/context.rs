//! Context is a per-provider store plus an ancestry walk.
//!
//! A component registers itself as a provider for a key; consumers
//! resolve the nearest provider by walking their ancestor chain
//! (supplied by the instance tree, which this crate knows nothing
//! about) and subscribe to the backing store.

use std::cell::RefCell;

use dcf_store::{InstanceId, StoreId};

thread_local! {
    static PROVIDERS: RefCell<Vec<Provider>> = const { RefCell::new(Vec::new()) };
}

#[derive(Debug)]
struct Provider {
    instance: InstanceId,
    key: String,
    store: StoreId,
}

/// Register `instance` as the provider of `key`, backed by `store`.
/// Re-providing the same key on the same instance replaces the store.
pub fn provide(instance: InstanceId, key: impl Into<String>, store: StoreId) {
    let key = key.into();
    PROVIDERS.with_borrow_mut(|providers| {
        match providers.iter_mut().find(|p| p.instance == instance && p.key == key) {
            Some(existing) => existing.store = store,
            None => providers.push(Provider { instance, key, store }),
        }
    });
}

/// Remove every provider registered by `instance`.
pub fn unprovide(instance: InstanceId) {
    PROVIDERS.with_borrow_mut(|providers| providers.retain(|p| p.instance != instance));
}

/// Resolve the nearest provider of `key` along an ancestor chain,
/// closest ancestor first.
pub fn resolve_provider(key: &str, ancestors: impl Iterator<Item = InstanceId>) -> Option<StoreId> {
    PROVIDERS.with_borrow(|providers| {
        for ancestor in ancestors {
            if let Some(p) = providers.iter().find(|p| p.instance == ancestor && p.key == key) {
                return Some(p.store);
            }
        }
        None
    })
}

/// The stores provided by `instance`.
pub fn providers_of(instance: InstanceId) -> Vec<StoreId> {
    PROVIDERS.with_borrow(|providers| {
        providers
            .iter()
            .filter(|p| p.instance == instance)
            .map(|p| p.store)
            .collect()
    })
}

#[cfg(test)]
mod test {
    use dcf_store::SlabIndex;

    use super::*;

    fn inst(n: usize) -> InstanceId {
        InstanceId::from_usize(n)
    }

    fn store(n: usize) -> StoreId {
        StoreId::from_usize(n)
    }

    #[test]
    fn nearest_provider_wins() {
        provide(inst(101), "theme", store(1));
        provide(inst(102), "theme", store(2));

        // Ancestors are walked closest first: 102 shadows 101
        let resolved = resolve_provider("theme", [inst(103), inst(102), inst(101)].into_iter());
        assert_eq!(resolved, Some(store(2)));

        unprovide(inst(101));
        unprovide(inst(102));
    }

    #[test]
    fn missing_key_resolves_to_none() {
        provide(inst(110), "theme", store(1));
        let resolved = resolve_provider("locale", [inst(110)].into_iter());
        assert_eq!(resolved, None);
        unprovide(inst(110));
    }

    #[test]
    fn unprovide_removes_all_keys() {
        provide(inst(120), "a", store(1));
        provide(inst(120), "b", store(2));
        unprovide(inst(120));
        assert!(providers_of(inst(120)).is_empty());
    }
}

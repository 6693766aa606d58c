pub use crate::context::{provide, providers_of, resolve_provider, unprovide};
pub use crate::store::{
    Changes, Subscriber, accessors, clear_all_changes, clear_all_subs, drain_changes, has_changes, record_access,
    subscribe, subscriber_count, unsubscribe,
};
pub use crate::value::{Obj, Store, StoreSetter, StoreValue, read_store};

mod context;
mod store;
mod value;

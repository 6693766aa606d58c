use dcf_store::{SmallMap, ViewId};
use fxhash::FxHashMap;
use serde_json::Value;

use crate::props::Handler;

/// The engine-side event handler table.
///
/// Handler functions never cross the bridge; the native side only
/// knows event names. When an inbound event arrives the engine looks
/// up `(view, event)` here and invokes the handler on the render
/// thread. Handlers are dropped when their view unmounts.
#[derive(Debug, Default)]
pub struct HandlerTable {
    inner: FxHashMap<ViewId, SmallMap<String, Handler>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, view: ViewId, event: impl Into<String>, handler: Handler) {
        self.inner.entry(view).or_default().insert(event.into(), handler);
    }

    pub fn unbind(&mut self, view: ViewId, event: &str) {
        if let Some(handlers) = self.inner.get_mut(&view) {
            handlers.remove(event);
            if handlers.is_empty() {
                self.inner.remove(&view);
            }
        }
    }

    /// Drop every handler bound to a view.
    pub fn drop_view(&mut self, view: ViewId) {
        self.inner.remove(&view);
    }

    pub fn has(&self, view: ViewId, event: &str) -> bool {
        self.inner.get(&view).is_some_and(|handlers| handlers.contains_key(event))
    }

    /// Invoke the handler for `(view, event)`.
    /// Returns `false` when no handler is bound; stale events for
    /// unmounted views land here and are ignored.
    pub fn dispatch(&self, view: ViewId, event: &str, payload: &Value) -> bool {
        let Some(handler) = self.inner.get(&view).and_then(|handlers| handlers.get(event)) else {
            return false;
        };
        handler.invoke(payload);
        true
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

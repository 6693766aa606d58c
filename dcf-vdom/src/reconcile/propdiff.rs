use crate::props::{Handler, PropValue, Props, is_event_prop};

/// The raw prop diff: every non-handler key whose value changed,
/// with removed keys mapped to `Null`. Scalars, strings and maps
/// compare structurally; handler props are excluded here, their
/// presence travels as bind/unbind ops.
pub(crate) fn diff_props(old: &Props, new: &Props) -> Props {
    let mut diff = Props::new();

    for (key, value) in new.iter() {
        if value.is_handler() || is_event_prop(key) {
            continue;
        }
        if old.get(key) != Some(value) {
            diff.set(key.clone(), value.clone());
        }
    }

    for (key, value) in old.iter() {
        if value.is_handler() || is_event_prop(key) {
            continue;
        }
        if !new.contains_key(key) {
            diff.set(key.clone(), PropValue::Null);
        }
    }

    diff
}

/// Rebuild a diff from a precomputed changed-key list (worker output).
/// Produces exactly what [`diff_props`] would for those keys.
pub(crate) fn diff_from_keys(old: &Props, new: &Props, changed: &[String]) -> Props {
    let mut diff = Props::new();

    for key in changed {
        match new.get(key) {
            Some(value) if !value.is_handler() => diff.set(key.clone(), value.clone()),
            Some(_) => (),
            None if old.contains_key(key) => diff.set(key.clone(), PropValue::Null),
            None => (),
        }
    }

    diff
}

/// How the handler props of an element changed between renders.
pub(crate) struct HandlerChanges {
    /// Events present now but not before
    pub bound: Vec<(String, Handler)>,
    /// Events present before but not now
    pub unbound: Vec<String>,
    /// Events present in both, with a different function.
    /// Presence did not change, so no op is emitted; the engine-side
    /// table is updated silently.
    pub replaced: Vec<(String, Handler)>,
}

pub(crate) fn handler_changes(old: &Props, new: &Props) -> HandlerChanges {
    let mut changes = HandlerChanges {
        bound: Vec::new(),
        unbound: Vec::new(),
        replaced: Vec::new(),
    };

    let old_handlers: Vec<(String, &Handler)> = old.handlers().collect();

    for (event, handler) in new.handlers() {
        match old_handlers.iter().find(|(name, _)| *name == event) {
            None => changes.bound.push((event, handler.clone())),
            Some((_, previous)) if *previous != handler => changes.replaced.push((event, handler.clone())),
            Some(_) => (),
        }
    }

    for (event, _) in old_handlers {
        if !new.handlers().any(|(name, _)| name == event) {
            changes.unbound.push(event);
        }
    }

    changes
}

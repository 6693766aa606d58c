use dcf_store::{InstanceId, ViewId};
use fxhash::FxHashMap;

use super::{PropDiffJob, Reconciler, Slot};
use crate::error::Result;
use crate::node::{Node, NodeKey};
use crate::tree::InstanceKind;

/// Matching key for one child: a declared key, or a synthetic
/// positional key stable within the keyless subsequence of its
/// generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ChildKey {
    Keyed(NodeKey),
    Index(usize),
}

impl Reconciler<'_> {
    /// Keyed children reconciliation.
    ///
    /// New children are walked in order with a moving pointer into the
    /// old list: a matched child whose old position differs from the
    /// pointer is moved (a repeated `Attach` with the final index),
    /// unmatched new children mount, leftover old children unmount.
    pub(super) fn reconcile_children(
        &mut self,
        parent: InstanceId,
        parent_view: Option<ViewId>,
        new_children: &[Node],
        base_native: usize,
    ) -> Result<()> {
        // The child list is rebuilt from scratch; retained children
        // are pushed back in their new order.
        let old_children = std::mem::take(&mut self.tree.expect_mut(parent).children);

        let mut by_key: FxHashMap<ChildKey, (usize, InstanceId)> = FxHashMap::default();
        {
            let mut keyless = 0;
            for (position, id) in old_children.iter().enumerate() {
                let key = match self.tree.expect(*id).kind.key() {
                    Some(key) => ChildKey::Keyed(key.clone()),
                    None => {
                        let key = ChildKey::Index(keyless);
                        keyless += 1;
                        key
                    }
                };
                by_key.insert(key, (position, *id));
            }
        }

        let mut prefetched = self.prefetch_prop_diffs(&by_key, new_children);

        let mut keyless = 0;
        let mut new_pos = 0;
        let mut native = base_native;

        for (i, child) in new_children.iter().enumerate() {
            if child.is_null() {
                continue;
            }

            let key = match child.key() {
                Some(key) => ChildKey::Keyed(key.clone()),
                None => {
                    let key = ChildKey::Index(keyless);
                    keyless += 1;
                    key
                }
            };

            let slot = Slot {
                parent: Some(parent),
                parent_view,
                index: new_pos,
                native_index: native,
            };

            let result = match by_key.remove(&key) {
                Some((old_pos, old_id)) => {
                    let precomputed = prefetched.remove(&i);
                    let id = self.reconcile_inner(Some(old_id), child, slot, precomputed)?;

                    // Retained but sitting at the wrong position:
                    // reattach every native root at its final index
                    if id == Some(old_id) && old_pos != new_pos {
                        if let Some(parent_view) = parent_view {
                            let mut roots = Vec::new();
                            self.tree.native_roots(old_id, &mut roots);
                            for (offset, root) in roots.into_iter().enumerate() {
                                self.ops.push(dcf_bridge::Op::attach(parent_view, root, native + offset));
                            }
                        }
                    }
                    id
                }
                None => self.reconcile(None, child, slot)?,
            };

            if let Some(id) = result {
                let children = &mut self.tree.expect_mut(parent).children;
                if children.len() <= new_pos || children[new_pos] != id {
                    let at = new_pos.min(children.len());
                    children.insert(at, id);
                }
                new_pos += 1;
                native += self.tree.native_len(id);
            }
        }

        // Anything left in the key map was not consumed by the pass
        let mut leftovers: Vec<(usize, InstanceId)> = by_key.into_values().collect();
        leftovers.sort_by_key(|(position, _)| *position);
        for (_, id) in leftovers {
            self.unmount(id);
        }

        Ok(())
    }

    // Hand the prop comparisons of matched element pairs to the
    // worker pool when the child list is large enough. Pure data in,
    // changed keys out; behavior is identical to diffing inline.
    fn prefetch_prop_diffs(
        &mut self,
        by_key: &FxHashMap<ChildKey, (usize, InstanceId)>,
        new_children: &[Node],
    ) -> FxHashMap<usize, Vec<String>> {
        let mut out = FxHashMap::default();

        let Some(offload) = self.offload else { return out };
        if new_children.len() < self.offload_threshold {
            return out;
        }

        let mut jobs = Vec::new();
        let mut keyless = 0;

        for (i, child) in new_children.iter().enumerate() {
            let Node::Element(el) = child else {
                if !child.is_null() && child.key().is_none() {
                    keyless += 1;
                }
                continue;
            };

            let key = match &el.key {
                Some(key) => ChildKey::Keyed(key.clone()),
                None => {
                    let key = ChildKey::Index(keyless);
                    keyless += 1;
                    key
                }
            };

            let Some((_, old_id)) = by_key.get(&key) else { continue };
            let Some(instance) = self.tree.get(*old_id) else { continue };
            let InstanceKind::Element(old_el) = &instance.kind else { continue };
            if old_el.tag != el.tag {
                continue;
            }

            jobs.push(PropDiffJob {
                index: i,
                old: serde_json::from_str(&old_el.props.to_json()).unwrap_or_default(),
                new: serde_json::from_str(&el.props.to_json()).unwrap_or_default(),
            });
        }

        if jobs.is_empty() {
            return out;
        }

        for outcome in offload.diff(jobs) {
            out.insert(outcome.index, outcome.changed);
        }

        out
    }
}

// Keep the worker contract honest: the pure key diff used by the
// pool must agree with what the inline path would compute.
#[cfg(test)]
mod test {
    use serde_json::json;

    use super::super::diff_json_keys;

    #[test]
    fn json_key_diff() {
        let old = json!({"a": 1, "b": "x", "gone": true});
        let new = json!({"a": 2, "b": "x"});

        let mut changed = diff_json_keys(&old, &new);
        changed.sort();
        assert_eq!(changed, vec!["a".to_string(), "gone".to_string()]);
    }

    #[test]
    fn json_key_diff_empty_for_equal_objects() {
        let value = json!({"a": [1, 2], "b": {"c": 3}});
        assert!(diff_json_keys(&value, &value).is_empty());
    }
}

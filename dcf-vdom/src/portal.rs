use dcf_bridge::Op;
use dcf_store::ViewId;
use fxhash::{FxHashMap, FxHashSet};

/// Stable identity of a portal across update passes. Allocated when
/// the portal instance is created and kept while it is retained.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct PortalId(u64);

#[derive(Debug)]
struct PortalEntry {
    id: PortalId,
    anchor: String,
    roots: Vec<ViewId>,
}

/// Tracks anchors and the portal contents bound to them.
///
/// After each diff pass the manager recomputes the child list of
/// every touched anchor as the concatenation, in declaration order,
/// of the contents of the portals targeting it.
#[derive(Debug, Default)]
pub struct PortalManager {
    anchors: FxHashMap<String, ViewId>,
    portals: Vec<PortalEntry>,
    touched: FxHashSet<String>,
    next: u64,
}

impl PortalManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// An anchor view was created.
    pub fn register_anchor(&mut self, name: impl Into<String>, view: ViewId) {
        let name = name.into();
        self.touched.insert(name.clone());
        self.anchors.insert(name, view);
    }

    /// An anchor view was deleted. The mapping is only dropped if it
    /// still points at `view`; a later element may have re-registered
    /// the name.
    pub fn remove_anchor(&mut self, name: &str, view: ViewId) {
        if self.anchors.get(name) == Some(&view) {
            self.anchors.remove(name);
            self.touched.remove(name);
        }
    }

    pub fn anchor(&self, name: &str) -> Option<ViewId> {
        self.anchors.get(name).copied()
    }

    /// A new portal targeting `anchor` appeared. Declaration order is
    /// registration order.
    pub fn register_portal(&mut self, anchor: impl Into<String>) -> PortalId {
        let id = PortalId(self.next);
        self.next += 1;
        let anchor = anchor.into();
        self.touched.insert(anchor.clone());
        self.portals.push(PortalEntry {
            id,
            anchor,
            roots: Vec::new(),
        });
        id
    }

    /// Replace the native roots belonging to a portal.
    /// Unchanged contents leave the anchor untouched, so a pass that
    /// did not alter the portal re-emits nothing.
    pub fn set_contents(&mut self, id: PortalId, roots: Vec<ViewId>) {
        if let Some(entry) = self.portals.iter_mut().find(|p| p.id == id) {
            if entry.roots == roots {
                return;
            }
            self.touched.insert(entry.anchor.clone());
            entry.roots = roots;
        }
    }

    /// Point a portal at a different anchor. Both the old and the new
    /// anchor are recomputed on the next flush.
    pub fn retarget(&mut self, id: PortalId, anchor: String) {
        if let Some(entry) = self.portals.iter_mut().find(|p| p.id == id) {
            self.touched.insert(entry.anchor.clone());
            self.touched.insert(anchor.clone());
            entry.anchor = anchor;
        }
    }

    /// A portal was unmounted.
    pub fn remove_portal(&mut self, id: PortalId) {
        if let Some(pos) = self.portals.iter().position(|p| p.id == id) {
            let entry = self.portals.remove(pos);
            self.touched.insert(entry.anchor);
        }
    }

    /// The anchor a portal currently resolves to, if the anchor view
    /// exists yet.
    pub fn resolve(&self, id: PortalId) -> Option<ViewId> {
        let entry = self.portals.iter().find(|p| p.id == id)?;
        self.anchors.get(&entry.anchor).copied()
    }

    /// Recompute the child lists of every touched anchor and emit the
    /// attach ops. At most one portal should target an anchor; when
    /// several do, the one declared last wins the pass and a warning
    /// is logged.
    pub fn flush(&mut self, ops: &mut Vec<Op>) {
        let touched = std::mem::take(&mut self.touched);

        for anchor in touched {
            let Some(anchor_view) = self.anchors.get(&anchor).copied() else { continue };

            let targeting = self
                .portals
                .iter()
                .filter(|p| p.anchor == anchor)
                .collect::<Vec<_>>();

            if targeting.len() > 1 {
                log::warn!(
                    "{} portals target anchor `{anchor}`; the last declared wins this pass",
                    targeting.len()
                );
                if let Some(last) = targeting.last() {
                    for (index, root) in last.roots.iter().enumerate() {
                        ops.push(Op::attach(anchor_view, *root, index));
                    }
                }
                continue;
            }

            let mut index = 0;
            for entry in targeting {
                for root in &entry.roots {
                    ops.push(Op::attach(anchor_view, *root, index));
                    index += 1;
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.anchors.clear();
        self.portals.clear();
        self.touched.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn contents_attach_once_anchor_exists() {
        let mut manager = PortalManager::new();
        let portal = manager.register_portal("overlay");
        manager.set_contents(portal, vec![ViewId(7)]);

        // No anchor yet: flush emits nothing
        let mut ops = Vec::new();
        manager.flush(&mut ops);
        assert!(ops.is_empty());

        manager.register_anchor("overlay", ViewId(3));
        manager.flush(&mut ops);
        assert_eq!(ops, vec![Op::attach(ViewId(3), ViewId(7), 0)]);
    }

    #[test]
    fn removing_a_portal_touches_its_anchor() {
        let mut manager = PortalManager::new();
        manager.register_anchor("overlay", ViewId(3));
        let portal = manager.register_portal("overlay");
        manager.set_contents(portal, vec![ViewId(7), ViewId(8)]);

        let mut ops = Vec::new();
        manager.flush(&mut ops);
        assert_eq!(ops.len(), 2);

        manager.remove_portal(portal);
        let mut ops = Vec::new();
        manager.flush(&mut ops);
        // Anchor recomputed to an empty child list: nothing to attach
        assert!(ops.is_empty());
    }

    #[test]
    fn last_declared_portal_wins_a_contested_anchor() {
        let mut manager = PortalManager::new();
        manager.register_anchor("overlay", ViewId(3));
        let first = manager.register_portal("overlay");
        let second = manager.register_portal("overlay");
        manager.set_contents(first, vec![ViewId(7)]);
        manager.set_contents(second, vec![ViewId(8)]);

        let mut ops = Vec::new();
        manager.flush(&mut ops);
        assert_eq!(ops, vec![Op::attach(ViewId(3), ViewId(8), 0)]);
    }
}

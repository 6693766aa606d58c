use std::rc::Rc;

use dcf_store::slab::{Slab, Ticket};
use dcf_store::{InstanceId, ViewId};

use crate::component::Component;
use crate::hooks::HookSlot;
use crate::node::{FallbackFn, NodeKey};
use crate::portal::PortalId;
use crate::props::Props;
use crate::schedule::Priority;

/// Allocates native view ids. Monotonic; freed ids are never reused
/// within a session. The root id belongs to the host.
#[derive(Debug)]
pub struct ViewIds {
    next: u32,
}

impl ViewIds {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn allocate(&mut self) -> ViewId {
        let id = ViewId(self.next);
        self.next += 1;
        id
    }
}

bitflags::bitflags! {
    /// Why an instance needs to re-render. Both flags feed the skip
    /// condition: a clean instance with equal props emits nothing.
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
    pub struct Dirty: u8 {
        /// A state setter wrote to a hook slot
        const HOOK_STATE = 1;
        /// A subscribed store changed
        const STORE = 1 << 1;
    }
}

#[derive(Debug)]
pub struct ElementInstance {
    pub tag: String,
    pub view: ViewId,
    pub key: Option<NodeKey>,
    pub props: Props,
}

pub struct ComponentInstance {
    pub component_type: String,
    pub key: Option<NodeKey>,
    pub props: Props,
    pub def: Rc<dyn Component>,
    pub hooks: Vec<HookSlot>,
    pub priority: Priority,
    pub first_render: bool,
    pub dirty: Dirty,
}

impl std::fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("component_type", &self.component_type)
            .field("key", &self.key)
            .field("hooks", &self.hooks.len())
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct FragmentInstance {
    pub key: Option<NodeKey>,
    pub metadata: Option<String>,
}

#[derive(Debug)]
pub struct PortalInstance {
    pub key: Option<NodeKey>,
    pub portal: PortalId,
    pub anchor: String,
}

pub struct BoundaryInstance {
    pub key: Option<NodeKey>,
    pub fallback: FallbackFn,
    /// Set once the fallback is showing; cleared by a replace
    pub failed: bool,
}

impl std::fmt::Debug for BoundaryInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundaryInstance")
            .field("key", &self.key)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum InstanceKind {
    Element(ElementInstance),
    Component(ComponentInstance),
    Fragment(FragmentInstance),
    Portal(PortalInstance),
    Boundary(BoundaryInstance),
}

impl InstanceKind {
    pub fn key(&self) -> Option<&NodeKey> {
        match self {
            InstanceKind::Element(el) => el.key.as_ref(),
            InstanceKind::Component(comp) => comp.key.as_ref(),
            InstanceKind::Fragment(frag) => frag.key.as_ref(),
            InstanceKind::Portal(portal) => portal.key.as_ref(),
            InstanceKind::Boundary(boundary) => boundary.key.as_ref(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            InstanceKind::Element(_) => "element",
            InstanceKind::Component(_) => "component",
            InstanceKind::Fragment(_) => "fragment",
            InstanceKind::Portal(_) => "portal",
            InstanceKind::Boundary(_) => "boundary",
        }
    }
}

/// One retained node. Parents are indices, never owning handles, so
/// the tree is a flat arena with no reference cycles.
#[derive(Debug)]
pub struct Instance {
    pub kind: InstanceKind,
    pub parent: Option<InstanceId>,
    pub children: Vec<InstanceId>,
}

impl Instance {
    pub fn as_element(&self) -> Option<&ElementInstance> {
        match &self.kind {
            InstanceKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<&ComponentInstance> {
        match &self.kind {
            InstanceKind::Component(comp) => Some(comp),
            _ => None,
        }
    }

    pub fn as_component_mut(&mut self) -> Option<&mut ComponentInstance> {
        match &mut self.kind {
            InstanceKind::Component(comp) => Some(comp),
            _ => None,
        }
    }
}

/// The retained instance arena.
///
/// Roots are the instances mounted directly under the host root view.
#[derive(Debug, Default)]
pub struct InstanceTree {
    values: Slab<InstanceId, Instance>,
    roots: Vec<InstanceId>,
}

impl InstanceTree {
    pub fn new() -> Self {
        Self {
            values: Slab::empty(),
            roots: Vec::new(),
        }
    }

    pub fn roots(&self) -> &[InstanceId] {
        &self.roots
    }

    /// Insert an instance under `parent` at `index` of its child list
    /// (or into the root list).
    pub fn insert(&mut self, parent: Option<InstanceId>, index: usize, kind: InstanceKind) -> InstanceId {
        let id = self.values.insert(Instance {
            kind,
            parent,
            children: Vec::new(),
        });

        let siblings = match parent {
            Some(parent) => &mut self.values.get_mut_unchecked(parent).children,
            None => &mut self.roots,
        };
        let index = index.min(siblings.len());
        siblings.insert(index, id);

        id
    }

    pub fn get(&self, id: InstanceId) -> Option<&Instance> {
        self.values.get(id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut Instance> {
        self.values.get_mut(id)
    }

    /// # Panics
    ///
    /// Panics if the instance does not exist
    pub fn expect(&self, id: InstanceId) -> &Instance {
        self.values.get(id).expect("instance is live")
    }

    /// # Panics
    ///
    /// Panics if the instance does not exist
    pub fn expect_mut(&mut self, id: InstanceId) -> &mut Instance {
        self.values.get_mut(id).expect("instance is live")
    }

    /// Check out an instance so it can be mutated while the rest of
    /// the tree stays reachable. Must be paired with [`Self::restore`].
    pub fn checkout(&mut self, id: InstanceId) -> Ticket<InstanceId, Instance> {
        self.values.checkout(id)
    }

    pub fn restore(&mut self, ticket: Ticket<InstanceId, Instance>) {
        self.values.restore(ticket);
    }

    pub fn is_live(&self, id: InstanceId) -> bool {
        self.values.is_occupied(id)
    }

    /// Collect `id` and every descendant, depth first, children
    /// before parents.
    pub fn collect_postorder(&self, id: InstanceId, out: &mut Vec<InstanceId>) {
        if let Some(instance) = self.values.get(id) {
            for child in &instance.children {
                self.collect_postorder(*child, out);
            }
            out.push(id);
        }
    }

    /// Unlink `id` from its parent and drop the whole subtree from
    /// the arena. Slot teardown is the caller's responsibility.
    pub fn remove_subtree(&mut self, id: InstanceId) {
        let parent = self.values.get(id).and_then(|i| i.parent);
        match parent {
            Some(parent) => {
                if let Some(parent) = self.values.get_mut(parent) {
                    parent.children.retain(|child| *child != id);
                }
            }
            None => self.roots.retain(|child| *child != id),
        }

        let mut ids = Vec::new();
        self.collect_postorder(id, &mut ids);
        for id in ids {
            let _ = self.values.try_remove(id);
        }
    }

    /// The ancestor chain of `id`, closest first.
    pub fn ancestors(&self, id: InstanceId) -> Vec<InstanceId> {
        let mut out = Vec::new();
        let mut current = self.values.get(id).and_then(|i| i.parent);
        while let Some(id) = current {
            out.push(id);
            current = self.values.get(id).and_then(|i| i.parent);
        }
        out
    }

    /// How many native child slots this instance occupies in its
    /// parent's native child list. Portals occupy none; fragments,
    /// components and boundaries splice their children in.
    pub fn native_len(&self, id: InstanceId) -> usize {
        let Some(instance) = self.values.get(id) else { return 0 };
        match &instance.kind {
            InstanceKind::Element(_) => 1,
            InstanceKind::Portal(_) => 0,
            InstanceKind::Component(_) | InstanceKind::Fragment(_) | InstanceKind::Boundary(_) => instance
                .children
                .iter()
                .map(|child| self.native_len(*child))
                .sum(),
        }
    }

    /// The native view ids this subtree contributes to its parent's
    /// child list, in order.
    pub fn native_roots(&self, id: InstanceId, out: &mut Vec<ViewId>) {
        let Some(instance) = self.values.get(id) else { return };
        match &instance.kind {
            InstanceKind::Element(el) => out.push(el.view),
            InstanceKind::Portal(_) => (),
            InstanceKind::Component(_) | InstanceKind::Fragment(_) | InstanceKind::Boundary(_) => {
                for child in &instance.children {
                    self.native_roots(*child, out);
                }
            }
        }
    }

    /// The native view this instance's native roots attach to:
    /// the nearest element ancestor, or the host root.
    ///
    /// Returns `None` inside a portal; portal content attachment is
    /// owned by the portal manager.
    pub fn native_parent_of(&self, id: InstanceId) -> Option<ViewId> {
        let mut current = self.values.get(id).and_then(|i| i.parent);
        while let Some(parent_id) = current {
            let parent = self.values.get(parent_id)?;
            match &parent.kind {
                InstanceKind::Element(el) => return Some(el.view),
                InstanceKind::Portal(_) => return None,
                _ => current = parent.parent,
            }
        }
        Some(ViewId::ROOT)
    }

    /// The index of this instance's first native slot within its
    /// nearest native parent.
    pub fn native_index_of(&self, id: InstanceId) -> usize {
        let mut index = 0;
        let mut current = id;

        loop {
            let Some(instance) = self.values.get(current) else { return index };
            let siblings = match instance.parent {
                Some(parent) => match self.values.get(parent) {
                    Some(parent) => &parent.children,
                    None => return index,
                },
                None => &self.roots,
            };

            for sibling in siblings {
                if *sibling == current {
                    break;
                }
                index += self.native_len(*sibling);
            }

            match instance.parent {
                None => return index,
                Some(parent) => match &self.expect(parent).kind {
                    InstanceKind::Element(_) | InstanceKind::Portal(_) => return index,
                    _ => current = parent,
                },
            }
        }
    }

    /// Every live instance id, in arena order.
    pub fn instance_ids(&self) -> Vec<InstanceId> {
        self.values.iter().map(|(id, _)| id).collect()
    }

    pub fn clear(&mut self) {
        let _ = self.values.consume().count();
        self.roots.clear();
    }
}

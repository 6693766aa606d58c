use std::rc::Rc;

use crate::error::Error;
use crate::props::{Handler, PropValue, Props};

/// Reconciliation key for a child. Keyless children receive a
/// synthetic positional key during children reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Str(String),
    Int(i64),
}

impl From<&str> for NodeKey {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for NodeKey {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for NodeKey {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for NodeKey {
    fn from(value: i32) -> Self {
        Self::Int(value as i64)
    }
}

/// A native widget, addressed by a `type` string the host resolves
/// to a view factory.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub key: Option<NodeKey>,
    pub props: Props,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            key: None,
            props: Props::new(),
            children: Vec::new(),
        }
    }

    pub fn key(mut self, key: impl Into<NodeKey>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn prop(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.set(key, value);
        self
    }

    /// Attach an event handler: `on("press", ..)` sets the `onPress` prop.
    pub fn on(mut self, event: &str, handler: impl Fn(&serde_json::Value) + 'static) -> Self {
        let mut chars = event.chars();
        let key = match chars.next() {
            Some(first) => format!("on{}{}", first.to_ascii_uppercase(), chars.as_str()),
            None => return self,
        };
        self.props.set(key, Handler::new(handler));
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }
}

/// A use of a registered component, addressed by its type name.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentNode {
    pub component: String,
    pub key: Option<NodeKey>,
    pub props: Props,
}

impl ComponentNode {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            key: None,
            props: Props::new(),
        }
    }

    pub fn key(mut self, key: impl Into<NodeKey>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn prop(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.set(key, value);
        self
    }
}

/// A grouping node with no native peer. Its children's native ids are
/// spliced into the parent's child list in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    pub key: Option<NodeKey>,
    pub children: Vec<Node>,
    pub metadata: Option<String>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: impl Into<NodeKey>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }
}

/// Redirects its children's native peers to a named anchor elsewhere
/// in the tree. The children occupy no slot in the portal's own parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Portal {
    pub target_anchor: String,
    pub key: Option<NodeKey>,
    pub children: Vec<Node>,
}

impl Portal {
    pub fn new(target_anchor: impl Into<String>) -> Self {
        Self {
            target_anchor: target_anchor.into(),
            key: None,
            children: Vec::new(),
        }
    }

    pub fn key(mut self, key: impl Into<NodeKey>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }
}

pub type FallbackFn = Rc<dyn Fn(&Error) -> Node>;

/// Captures errors thrown during render or effects of descendants and
/// substitutes a fallback subtree.
#[derive(Clone)]
pub struct Boundary {
    pub key: Option<NodeKey>,
    pub child: Box<Node>,
    pub fallback: FallbackFn,
}

impl Boundary {
    pub fn new(child: impl Into<Node>, fallback: impl Fn(&Error) -> Node + 'static) -> Self {
        Self {
            key: None,
            child: Box::new(child.into()),
            fallback: Rc::new(fallback),
        }
    }

    pub fn key(mut self, key: impl Into<NodeKey>) -> Self {
        self.key = Some(key.into());
        self
    }
}

impl std::fmt::Debug for Boundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Boundary")
            .field("key", &self.key)
            .field("child", &self.child)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Boundary {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.child == other.child && Rc::ptr_eq(&self.fallback, &other.fallback)
    }
}

/// One node of the virtual tree produced by render functions.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Component(ComponentNode),
    Fragment(Fragment),
    Portal(Portal),
    Boundary(Boundary),
    /// Render nothing. Reconciling against `Null` unmounts.
    Null,
}

impl Node {
    pub fn key(&self) -> Option<&NodeKey> {
        match self {
            Node::Element(el) => el.key.as_ref(),
            Node::Component(comp) => comp.key.as_ref(),
            Node::Fragment(frag) => frag.key.as_ref(),
            Node::Portal(portal) => portal.key.as_ref(),
            Node::Boundary(boundary) => boundary.key.as_ref(),
            Node::Null => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Element(_) => "element",
            Node::Component(_) => "component",
            Node::Fragment(_) => "fragment",
            Node::Portal(_) => "portal",
            Node::Boundary(_) => "boundary",
            Node::Null => "null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }
}

impl From<Element> for Node {
    fn from(value: Element) -> Self {
        Self::Element(value)
    }
}

impl From<ComponentNode> for Node {
    fn from(value: ComponentNode) -> Self {
        Self::Component(value)
    }
}

impl From<Fragment> for Node {
    fn from(value: Fragment) -> Self {
        Self::Fragment(value)
    }
}

impl From<Portal> for Node {
    fn from(value: Portal) -> Self {
        Self::Portal(value)
    }
}

impl From<Boundary> for Node {
    fn from(value: Boundary) -> Self {
        Self::Boundary(value)
    }
}

use std::rc::Rc;

use fxhash::FxHashMap;

use crate::error::Result;
use crate::hooks::Hooks;
use crate::node::Node;
use crate::props::Props;
use crate::schedule::Priority;

/// A registered component type.
///
/// `render` is called with a hook frame bound to the owning instance;
/// hook calls consume slots in call order. Stateless components are
/// plain functions, which implement this trait via the blanket impl.
pub trait Component {
    fn render(&self, hooks: &mut Hooks<'_>, props: &Props) -> Result<Node>;

    /// Declared equality for the skip condition.
    ///
    /// `Some(true)` means the props describe the same output, making
    /// the instance eligible to skip its subtree when no hook state
    /// and no subscribed store has changed since the last render.
    /// `None` (the default) declares nothing and never skips.
    fn equals(&self, _old: &Props, _new: &Props) -> Option<bool> {
        None
    }

    /// Explicit update priority. When absent the scheduler falls back
    /// to type-name heuristics.
    fn priority(&self) -> Option<Priority> {
        None
    }
}

impl<F> Component for F
where
    F: Fn(&mut Hooks<'_>, &Props) -> Result<Node>,
{
    fn render(&self, hooks: &mut Hooks<'_>, props: &Props) -> Result<Node> {
        self(hooks, props)
    }
}

/// Wraps a component with a structural-equality `equals` declaration:
/// identical props (and key, which is part of child matching) opt the
/// subtree into the reconciler's skip condition.
pub struct Memoized<C>(pub C);

impl<C: Component> Component for Memoized<C> {
    fn render(&self, hooks: &mut Hooks<'_>, props: &Props) -> Result<Node> {
        self.0.render(hooks, props)
    }

    fn equals(&self, old: &Props, new: &Props) -> Option<bool> {
        Some(old == new)
    }

    fn priority(&self) -> Option<Priority> {
        self.0.priority()
    }
}

/// Component definitions keyed by type name.
#[derive(Default)]
pub struct ComponentRegistry {
    inner: FxHashMap<String, Rc<dyn Component>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, component: impl Component + 'static) {
        self.inner.insert(name.into(), Rc::new(component));
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn Component>> {
        self.inner.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }
}

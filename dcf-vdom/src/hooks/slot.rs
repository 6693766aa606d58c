use std::any::Any;
use std::rc::Rc;

use dcf_store::StoreId;

/// When in the commit an effect runs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EffectPhase {
    /// After the op phases, before layout effects
    Normal,
    /// After the commit's layout phase
    Layout,
    /// Once, after the whole tree has mounted and the scheduler
    /// queues have drained
    Insertion,
}

/// A cleanup returned by an effect, run before the effect re-runs
/// and when the owning instance is destroyed.
pub type Cleanup = Box<dyn FnOnce()>;

pub type EffectResult = std::result::Result<Option<Cleanup>, Box<dyn std::error::Error>>;

pub(crate) type EffectFn = Box<dyn FnOnce() -> EffectResult>;

/// One dependency in an effect/memo dependency list.
///
/// Comparison is structural for primitives and strings, and by
/// allocation for boxed values.
#[derive(Clone)]
pub enum DepValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Obj(Rc<dyn Any>),
}

impl PartialEq for DepValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Obj(a), Self::Obj(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for DepValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
            Self::Obj(_) => write!(f, "<obj>"),
        }
    }
}

impl From<bool> for DepValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for DepValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for DepValue {
    fn from(value: i32) -> Self {
        Self::Int(value as i64)
    }
}

impl From<usize> for DepValue {
    fn from(value: usize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<f64> for DepValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for DepValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for DepValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Rc<dyn Any>> for DepValue {
    fn from(value: Rc<dyn Any>) -> Self {
        Self::Obj(value)
    }
}

pub type DepList = Vec<DepValue>;

/// Build a dependency list for `use_effect` / `use_memo`.
#[macro_export]
macro_rules! deps {
    ($($dep:expr),* $(,)?) => {
        vec![$($crate::hooks::DepValue::from($dep)),*]
    };
}

/// The state of one effect slot across the instance's lifetime.
pub struct EffectSlot {
    pub phase: EffectPhase,
    /// Deps requested by the latest render
    pub deps: Option<DepList>,
    /// Deps recorded the last time the effect ran.
    /// `None` until the first run after mount.
    pub prev_deps: Option<DepList>,
    pub(crate) pending: Option<EffectFn>,
    pub(crate) cleanup: Option<Cleanup>,
}

impl EffectSlot {
    /// An effect re-runs when it has never run, has no dependency
    /// list, or the list changed.
    pub fn deps_changed(&self) -> bool {
        match (&self.prev_deps, &self.deps) {
            (None, _) => true,
            (Some(_), None) => true,
            (Some(prev), Some(next)) => prev != next,
        }
    }
}

impl std::fmt::Debug for EffectSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectSlot")
            .field("phase", &self.phase)
            .field("deps", &self.deps)
            .field("prev_deps", &self.prev_deps)
            .finish_non_exhaustive()
    }
}

/// Discriminant of a hook slot, used to enforce the call order
/// contract across renders.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HookKind {
    State,
    Effect(EffectPhase),
    Ref,
    Memo,
    StoreSub,
    ContextSub,
    Provider,
    Custom,
}

impl std::fmt::Display for HookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HookKind::State => "use_state",
            HookKind::Effect(EffectPhase::Normal) => "use_effect",
            HookKind::Effect(EffectPhase::Layout) => "use_layout_effect",
            HookKind::Effect(EffectPhase::Insertion) => "use_insertion_effect",
            HookKind::Ref => "use_ref",
            HookKind::Memo => "use_memo",
            HookKind::StoreSub => "use_store",
            HookKind::ContextSub => "use_context",
            HookKind::Provider => "use_provider",
            HookKind::Custom => "use_custom",
        };
        f.write_str(name)
    }
}

/// A hook slot. An instance owns a dense sequence of these; the slot
/// index is assigned by call order in the render function and must be
/// identical across every render of the instance.
pub enum HookSlot {
    State(Box<dyn Any>),
    Effect(EffectSlot),
    Ref(Rc<dyn Any>),
    Memo { value: Box<dyn Any>, deps: DepList },
    StoreSub { store: StoreId },
    ContextSub { store: Option<StoreId>, key: String },
    Provider { store: Rc<dyn Any>, key: String },
    Custom { name: String, value: Rc<dyn Any> },
}

impl HookSlot {
    pub fn kind(&self) -> HookKind {
        match self {
            HookSlot::State(_) => HookKind::State,
            HookSlot::Effect(slot) => HookKind::Effect(slot.phase),
            HookSlot::Ref(_) => HookKind::Ref,
            HookSlot::Memo { .. } => HookKind::Memo,
            HookSlot::StoreSub { .. } => HookKind::StoreSub,
            HookSlot::ContextSub { .. } => HookKind::ContextSub,
            HookSlot::Provider { .. } => HookKind::Provider,
            HookSlot::Custom { .. } => HookKind::Custom,
        }
    }
}

impl std::fmt::Debug for HookSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn dep_equality() {
        assert_eq!(DepValue::from(1), DepValue::from(1));
        assert_ne!(DepValue::from(1), DepValue::from(2));
        assert_ne!(DepValue::from(1), DepValue::from("1"));

        let a: Rc<dyn Any> = Rc::new(5u32);
        let b: Rc<dyn Any> = Rc::new(5u32);
        assert_eq!(DepValue::Obj(a.clone()), DepValue::Obj(a.clone()));
        assert_ne!(DepValue::Obj(a), DepValue::Obj(b));
    }

    #[test]
    fn deps_changed() {
        let mut slot = EffectSlot {
            phase: EffectPhase::Normal,
            deps: Some(deps![1]),
            prev_deps: None,
            pending: None,
            cleanup: None,
        };

        // Never ran
        assert!(slot.deps_changed());

        slot.prev_deps = Some(deps![1]);
        assert!(!slot.deps_changed());

        slot.deps = Some(deps![2]);
        assert!(slot.deps_changed());

        // No dependency list: runs every render
        slot.deps = None;
        assert!(slot.deps_changed());
    }
}

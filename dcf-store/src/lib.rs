pub use crate::slab::{Slab, Ticket};
pub use crate::smallmap::SmallMap;
pub use crate::stack::Stack;

pub mod slab;
pub mod smallmap;
pub mod stack;

/// Implemented by the typed indices used with [`Slab`].
pub trait SlabIndex: Copy + PartialEq {
    fn from_usize(index: usize) -> Self;

    fn as_usize(&self) -> usize;
}

impl SlabIndex for usize {
    fn from_usize(index: usize) -> Self {
        index
    }

    fn as_usize(&self) -> usize {
        *self
    }
}

/// Identifies a native view peer for the lifetime of that peer.
///
/// The root view is created by the host and is always `ViewId::ROOT`.
/// Every other id is handed out by the engine, monotonically, and is
/// never reused within a session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct ViewId(pub u32);

impl ViewId {
    pub const ROOT: Self = Self(0);

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u32> for ViewId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ViewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a retained instance in the instance arena.
/// Unlike a [`ViewId`] an instance id can be reused once
/// the instance is destroyed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct InstanceId(u32);

impl InstanceId {
    pub const MAX: Self = Self(u32::MAX);
}

impl SlabIndex for InstanceId {
    fn from_usize(index: usize) -> Self {
        Self(index as u32)
    }

    fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for InstanceId {
    fn from(value: usize) -> Self {
        Self(value as u32)
    }
}

impl From<InstanceId> for usize {
    fn from(value: InstanceId) -> Self {
        value.0 as usize
    }
}

/// Key of an observable store cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct StoreId(u32);

impl SlabIndex for StoreId {
    fn from_usize(index: usize) -> Self {
        Self(index as u32)
    }

    fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for StoreId {
    fn from(value: usize) -> Self {
        Self(value as u32)
    }
}

impl From<StoreId> for usize {
    fn from(value: StoreId) -> Self {
        value.0 as usize
    }
}

use dcf_store::ViewId;
use serde::{Deserialize, Serialize};

/// A mutation of the native view tree.
///
/// Ops are the only way the engine changes native state. Props travel
/// as pre-serialized JSON (UTF-8); event handler functions never cross
/// the bridge, their presence is encoded by `BindEvent`/`UnbindEvent`.
///
/// Within a batch the receiver applies ops in order. A repeated
/// `Attach` for a live child is a reorder, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Op {
    Create {
        view_id: ViewId,
        #[serde(rename = "type")]
        ty: String,
        props_json: String,
    },
    Update {
        view_id: ViewId,
        props_json_diff: String,
    },
    Delete {
        view_id: ViewId,
    },
    Attach {
        parent_id: ViewId,
        child_id: ViewId,
        index: usize,
    },
    BindEvent {
        view_id: ViewId,
        event: String,
    },
    UnbindEvent {
        view_id: ViewId,
        event: String,
    },
}

impl Op {
    pub fn create(view_id: ViewId, ty: impl Into<String>, props_json: impl Into<String>) -> Self {
        Self::Create {
            view_id,
            ty: ty.into(),
            props_json: props_json.into(),
        }
    }

    pub fn update(view_id: ViewId, props_json_diff: impl Into<String>) -> Self {
        Self::Update {
            view_id,
            props_json_diff: props_json_diff.into(),
        }
    }

    pub fn attach(parent_id: ViewId, child_id: ViewId, index: usize) -> Self {
        Self::Attach {
            parent_id,
            child_id,
            index,
        }
    }

    pub fn bind(view_id: ViewId, event: impl Into<String>) -> Self {
        Self::BindEvent {
            view_id,
            event: event.into(),
        }
    }

    pub fn unbind(view_id: ViewId, event: impl Into<String>) -> Self {
        Self::UnbindEvent {
            view_id,
            event: event.into(),
        }
    }

    /// The view this op creates, if any.
    pub fn created(&self) -> Option<ViewId> {
        match self {
            Op::Create { view_id, .. } => Some(*view_id),
            _ => None,
        }
    }

    /// The view this op deletes, if any.
    pub fn deleted(&self) -> Option<ViewId> {
        match self {
            Op::Delete { view_id } => Some(*view_id),
            _ => None,
        }
    }

    /// Every view id this op refers to.
    pub fn referenced(&self) -> impl Iterator<Item = ViewId> {
        let (a, b) = match self {
            Op::Create { view_id, .. }
            | Op::Update { view_id, .. }
            | Op::Delete { view_id }
            | Op::BindEvent { view_id, .. }
            | Op::UnbindEvent { view_id, .. } => (*view_id, None),
            Op::Attach { parent_id, child_id, .. } => (*parent_id, Some(*child_id)),
        };
        std::iter::once(a).chain(b)
    }
}

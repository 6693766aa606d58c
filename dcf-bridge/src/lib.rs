use dcf_store::ViewId;
use serde_json::Value;

pub use crate::events::{BridgeEvent, EventEmitter, SystemChange, event_channel};
pub use crate::ops::Op;

pub mod events;
pub mod ops;
pub mod testing;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The native side reported failure for a whole batch
    #[error("native runtime rejected the batch")]
    BatchRejected,

    /// A method call addressed a view the native side does not know
    #[error("no native peer for view {0}")]
    NoSuchView(ViewId),

    #[error("method call failed: {0}")]
    MethodFailed(String),
}

/// The channel between the engine and the native runtime.
///
/// The engine is the only producer of ops; the native side applies a
/// batch in order and reports success or failure for the batch as a
/// whole. Batches themselves are sequenced by call order.
///
/// Props inside ops arrive pre-serialized; the receiver must not
/// re-serialize per op.
pub trait Bridge {
    /// Open a batch. Ops produced until [`Bridge::commit_batch`] belong
    /// to this batch.
    fn begin_batch(&mut self);

    /// Ship a batch of ops. Returns `false` if the native side
    /// rejected the batch, in which case the native tree may be
    /// partially modified and the engine compensates by remounting.
    fn commit_batch(&mut self, ops: &[Op]) -> bool;

    /// Synchronous request/response for imperative operations that
    /// cannot be expressed as props (`measure`, `focus`, ...).
    fn call_method(&mut self, view: ViewId, method: &str, args: Value) -> Result<Value>;
}

/// Layout default overrides forwarded to the external layout engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutDefaults {
    pub flex_direction: Option<String>,
    pub flex_shrink: Option<f64>,
    pub align_content: Option<String>,
}

/// One node of the shadow tree handed to the layout engine:
/// the attached view hierarchy with the props each view currently has.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowNode {
    pub view: ViewId,
    pub tag: String,
    pub props_json: String,
    pub children: Vec<ShadowNode>,
}

/// The external layout engine.
/// Invoked exactly once per commit with the whole shadow tree.
pub trait LayoutEngine {
    fn compute(&mut self, root: &ShadowNode, defaults: &LayoutDefaults);
}

/// Layout engine that does nothing. Used when the host owns layout
/// entirely, and by tests that assert op streams.
#[derive(Debug, Default)]
pub struct NoopLayout {
    pub passes: usize,
}

impl LayoutEngine for NoopLayout {
    fn compute(&mut self, _root: &ShadowNode, _defaults: &LayoutDefaults) {
        self.passes += 1;
    }
}

//! A recording bridge for driving the engine in tests.
//!
//! Batches are kept verbatim so tests can assert exact op streams,
//! and every batch is checked against the id lifecycle rules: one
//! `Create` per id before any other use, at most one `Delete`, and
//! nothing after the `Delete`.

use std::collections::{BTreeMap, BTreeSet};

use dcf_store::ViewId;
use serde_json::Value;

use crate::ops::Op;
use crate::{Bridge, Error, Result};

#[derive(Debug, Default)]
pub struct TestBridge {
    /// Every committed batch, in order.
    pub batches: Vec<Vec<Op>>,
    /// Method calls received, in order.
    pub method_calls: Vec<(ViewId, String, Value)>,
    /// Canned replies for `call_method`, keyed by method name.
    pub method_replies: BTreeMap<String, Value>,
    /// When set, the next `commit_batch` reports failure once.
    pub reject_next: bool,

    live: BTreeSet<ViewId>,
    ever_created: BTreeSet<ViewId>,
    in_batch: bool,
    begun: usize,
}

impl TestBridge {
    pub fn new() -> Self {
        let mut bridge = Self::default();
        // The host owns the root view
        bridge.live.insert(ViewId::ROOT);
        bridge.ever_created.insert(ViewId::ROOT);
        bridge
    }

    /// All committed ops, flattened across batches.
    pub fn ops(&self) -> Vec<Op> {
        self.batches.iter().flatten().cloned().collect()
    }

    /// Ops committed since the last call to this method.
    pub fn take_batches(&mut self) -> Vec<Vec<Op>> {
        std::mem::take(&mut self.batches)
    }

    pub fn is_live(&self, view: ViewId) -> bool {
        self.live.contains(&view)
    }

    pub fn batch_count(&self) -> usize {
        self.begun
    }

    // Enforce the id lifecycle invariant for one op.
    fn check(&mut self, op: &Op) {
        for view in op.referenced() {
            if op.created() == Some(view) {
                assert!(
                    !self.ever_created.contains(&view),
                    "view {view} created twice"
                );
                self.ever_created.insert(view);
                self.live.insert(view);
            } else {
                assert!(
                    self.live.contains(&view),
                    "op {op:?} references view {view} outside its lifetime"
                );
            }
        }

        if let Some(view) = op.deleted() {
            self.live.remove(&view);
        }
    }
}

impl Bridge for TestBridge {
    fn begin_batch(&mut self) {
        assert!(!self.in_batch, "batch already open");
        self.in_batch = true;
        self.begun += 1;
    }

    fn commit_batch(&mut self, ops: &[Op]) -> bool {
        assert!(self.in_batch, "commit without begin");
        self.in_batch = false;

        if std::mem::take(&mut self.reject_next) {
            return false;
        }

        for op in ops {
            self.check(op);
        }

        self.batches.push(ops.to_vec());
        true
    }

    fn call_method(&mut self, view: ViewId, method: &str, args: Value) -> Result<Value> {
        if !self.live.contains(&view) {
            return Err(Error::NoSuchView(view));
        }
        self.method_calls.push((view, method.to_string(), args));
        Ok(self.method_replies.get(method).cloned().unwrap_or(Value::Null))
    }
}

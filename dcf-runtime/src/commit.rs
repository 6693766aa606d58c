use std::time::{Duration, Instant};

use dcf_bridge::Op;
use dcf_store::ViewId;
use fxhash::FxHashSet;

use crate::error::{Error, Result};

/// Per-phase timings and op counts for one commit, logged at debug
/// level for observability.
#[derive(Debug, Default, Clone)]
pub struct CommitStats {
    pub parse: Duration,
    pub ship: Duration,
    pub layout: Duration,
    pub effects: Duration,
    pub deleted: usize,
    pub created: usize,
    pub updated: usize,
    pub attached: usize,
    pub events: usize,
}

impl CommitStats {
    pub fn op_count(&self) -> usize {
        self.deleted + self.created + self.updated + self.attached + self.events
    }
}

/// The parse phase: cancel views that never become visible, drop
/// duplicate ops, validate referential integrity, and order the
/// stream into its phases (delete, create, update, attach, events).
///
/// Within each phase the reconciler's relative order is preserved;
/// for repeated attaches of the same child only the last (final
/// index) survives.
pub(crate) fn parse_ops(raw: Vec<Op>, live: &FxHashSet<ViewId>, stats: &mut CommitStats) -> Result<Vec<Op>> {
    let start = Instant::now();

    // Views created and deleted within the same batch never reach the
    // native side; every op touching them is dropped.
    let created: FxHashSet<ViewId> = raw.iter().filter_map(Op::created).collect();
    let cancelled: FxHashSet<ViewId> = raw
        .iter()
        .filter_map(Op::deleted)
        .filter(|view| created.contains(view))
        .collect();

    let mut deletes = Vec::new();
    let mut creates = Vec::new();
    let mut updates = Vec::new();
    let mut attaches: Vec<Op> = Vec::new();
    let mut events = Vec::new();

    for op in raw {
        if op.referenced().any(|view| cancelled.contains(&view)) {
            continue;
        }

        // Referential integrity: everything must be live already or
        // created within this batch
        for view in op.referenced() {
            let is_create = op.created() == Some(view);
            if !is_create && !live.contains(&view) && !created.contains(&view) {
                return Err(Error::CommitValidation(format!(
                    "op {op:?} references view {view} which is neither live nor created in this batch"
                )));
            }
        }

        match &op {
            Op::Delete { .. } => deletes.push(op),
            Op::Create { .. } => creates.push(op),
            Op::Update { .. } => updates.push(op),
            Op::Attach { child_id, .. } => {
                // A later attach of the same child supersedes
                let child = *child_id;
                attaches.retain(|prev| !matches!(prev, Op::Attach { child_id, .. } if *child_id == child));
                attaches.push(op);
            }
            Op::BindEvent { .. } | Op::UnbindEvent { .. } => {
                if !events.contains(&op) {
                    events.push(op);
                }
            }
        }
    }

    stats.deleted = deletes.len();
    stats.created = creates.len();
    stats.updated = updates.len();
    stats.attached = attaches.len();
    stats.events = events.len();

    let mut ordered = deletes;
    ordered.extend(creates);
    ordered.extend(updates);
    ordered.extend(attaches);
    ordered.extend(events);

    stats.parse = start.elapsed();
    Ok(ordered)
}

#[cfg(test)]
mod test {
    use super::*;

    fn live(views: &[u32]) -> FxHashSet<ViewId> {
        views.iter().map(|v| ViewId(*v)).collect()
    }

    #[test]
    fn phases_are_ordered() {
        let raw = vec![
            Op::create(ViewId(1), "View", "{}"),
            Op::attach(ViewId::ROOT, ViewId(1), 0),
            Op::Delete { view_id: ViewId(9) },
            Op::update(ViewId(9), "{}"),
        ];

        // 9 is deleted after being updated in reconciler order, but
        // the delete phase runs first
        let mut stats = CommitStats::default();
        let ordered = parse_ops(raw, &live(&[0, 9]), &mut stats).unwrap();

        assert!(matches!(ordered[0], Op::Delete { .. }));
        assert!(matches!(ordered[1], Op::Create { .. }));
        assert!(matches!(ordered[2], Op::Update { .. }));
        assert!(matches!(ordered[3], Op::Attach { .. }));
    }

    #[test]
    fn same_batch_create_delete_cancels_out() {
        let raw = vec![
            Op::create(ViewId(5), "View", "{}"),
            Op::attach(ViewId::ROOT, ViewId(5), 0),
            Op::Delete { view_id: ViewId(5) },
        ];

        let mut stats = CommitStats::default();
        let ordered = parse_ops(raw, &live(&[0]), &mut stats).unwrap();
        assert!(ordered.is_empty());
    }

    #[test]
    fn later_attach_of_a_child_supersedes() {
        let raw = vec![
            Op::attach(ViewId::ROOT, ViewId(1), 2),
            Op::attach(ViewId::ROOT, ViewId(1), 0),
        ];

        let mut stats = CommitStats::default();
        let ordered = parse_ops(raw, &live(&[0, 1]), &mut stats).unwrap();
        assert_eq!(ordered, vec![Op::attach(ViewId::ROOT, ViewId(1), 0)]);
    }

    #[test]
    fn dangling_reference_fails_validation() {
        let raw = vec![Op::attach(ViewId::ROOT, ViewId(42), 0)];

        let mut stats = CommitStats::default();
        let err = parse_ops(raw, &live(&[0]), &mut stats);
        assert!(matches!(err, Err(Error::CommitValidation(_))));
    }
}

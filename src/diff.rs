use std::collections::BTreeSet;

use crate::ids::{ConnectorId, TaskId, WorkerId};

/// An unordered pair `(connectors, tasks)`, both held as sorted sets so any iteration over them is
/// deterministic (§5 "Ordering").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectorsAndTasks {
    pub connectors: BTreeSet<ConnectorId>,
    pub tasks: BTreeSet<TaskId>,
}

impl ConnectorsAndTasks {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty() && self.tasks.is_empty()
    }

    /// `self \ other`, for both the connector set and the task set.
    pub fn diff(&self, other: &ConnectorsAndTasks) -> ConnectorsAndTasks {
        ConnectorsAndTasks {
            connectors: self.connectors.difference(&other.connectors).cloned().collect(),
            tasks: self.tasks.difference(&other.tasks).cloned().collect(),
        }
    }

    pub fn insert_connector(&mut self, connector: ConnectorId) {
        self.connectors.insert(connector);
    }

    pub fn insert_task(&mut self, task: TaskId) {
        self.tasks.insert(task);
    }
}

/// Per-worker `toRevoke[w] = currentAllocation[w] \ newAllocation[w]` and
/// `toStart[w] = newAllocation[w] \ currentAllocation[w]`, with `toStart` post-filtered to enforce
/// I4: nothing that is being revoked anywhere this round may also be started anywhere this round
/// (§4.7).
pub struct DiffResult {
    pub to_start: std::collections::BTreeMap<WorkerId, ConnectorsAndTasks>,
    pub to_revoke: std::collections::BTreeMap<WorkerId, ConnectorsAndTasks>,
}

pub fn diff_allocations(
    current: &std::collections::BTreeMap<WorkerId, ConnectorsAndTasks>,
    new: &std::collections::BTreeMap<WorkerId, ConnectorsAndTasks>,
) -> DiffResult {
    let empty = ConnectorsAndTasks::empty();

    let mut to_revoke = std::collections::BTreeMap::new();
    for (worker, current_alloc) in current {
        let new_alloc = new.get(worker).unwrap_or(&empty);
        to_revoke.insert(worker.clone(), current_alloc.diff(new_alloc));
    }

    let mut to_start = std::collections::BTreeMap::new();
    for (worker, new_alloc) in new {
        let current_alloc = current.get(worker).unwrap_or(&empty);
        to_start.insert(worker.clone(), new_alloc.diff(current_alloc));
    }

    // I4: remove from every toStart anything appearing in the union of all toRevoke sets.
    let mut revoked_connectors: BTreeSet<ConnectorId> = BTreeSet::new();
    let mut revoked_tasks: BTreeSet<TaskId> = BTreeSet::new();
    for revoked in to_revoke.values() {
        revoked_connectors.extend(revoked.connectors.iter().cloned());
        revoked_tasks.extend(revoked.tasks.iter().cloned());
    }

    for started in to_start.values_mut() {
        started
            .connectors
            .retain(|c| !revoked_connectors.contains(c));
        started.tasks.retain(|t| !revoked_tasks.contains(t));
    }

    DiffResult { to_start, to_revoke }
}

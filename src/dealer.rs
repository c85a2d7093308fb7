use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::ids::{ConnectorId, WorkerId};
use crate::task_group::{self, TaskGroup};

/// A shared handle into the `all_groups` side table (§5 "Shared resources", §9 "Shared-handle
/// appends"). Multiple entries in `all_groups`/`intermediate` may reference the same `TaskGroup`;
/// popping from one handle is observed through every other handle pointing at the same group.
pub type TaskGroupHandle = Rc<RefCell<TaskGroup>>;

/// Round-Robin Dealer (§4.4): interleave every connector's class groups and deal them, one
/// appearance per owned task, round-robin across the sorted workforce.
///
/// Returns, per worker, the list of group handles dealt to it (`intermediate[w]` in the spec).
/// Callers must keep `workers` sorted ascending; this function does not sort it, since the
/// workforce (including any missing-but-held-back workers from the Delay Controller) is assembled
/// by the caller.
pub fn deal_class_groups(
    workers: &[WorkerId],
    configured_tasks: &BTreeMap<ConnectorId, BTreeSet<u32>>,
) -> BTreeMap<WorkerId, Vec<TaskGroupHandle>> {
    debug_assert!(!workers.is_empty(), "dealer requires a non-empty workforce");

    let mut all_groups: Vec<TaskGroupHandle> = Vec::new();
    for class_number in 1..=4u32 {
        for (connector, tasks) in configured_tasks {
            if let Some(group) = task_group::task_group(connector, tasks, class_number) {
                let size = group.size();
                let handle = Rc::new(RefCell::new(group));
                for _ in 0..size {
                    all_groups.push(Rc::clone(&handle));
                }
            }
        }
    }

    let mut intermediate: BTreeMap<WorkerId, Vec<TaskGroupHandle>> =
        workers.iter().map(|w| (w.clone(), Vec::new())).collect();

    for (i, group) in all_groups.into_iter().enumerate() {
        let worker = &workers[i % workers.len()];
        // `worker` is drawn from the same sorted `workers` slice the map was seeded from above,
        // so the key is always present; debug_assert documents that without paying for a lookup
        // panic in release builds, and `entry` is a non-panicking fallback should it ever not be.
        debug_assert!(intermediate.contains_key(worker), "worker not seeded into intermediate map");
        intermediate.entry(worker.clone()).or_default().push(group);
    }

    intermediate
}

/// Connector Dealer (§4.6): plain round-robin of connectors over the sorted workforce.
pub fn deal_connectors(
    workers: &[WorkerId],
    connectors: &BTreeSet<ConnectorId>,
) -> BTreeMap<WorkerId, Vec<ConnectorId>> {
    debug_assert!(!workers.is_empty(), "dealer requires a non-empty workforce");

    let mut dealt: BTreeMap<WorkerId, Vec<ConnectorId>> =
        workers.iter().map(|w| (w.clone(), Vec::new())).collect();

    for (n, connector) in connectors.iter().enumerate() {
        let worker = &workers[n % workers.len()];
        debug_assert!(dealt.contains_key(worker), "worker not seeded into dealt map");
        dealt.entry(worker.clone()).or_default().push(connector.clone());
    }

    dealt
}

use std::collections::BTreeMap;

use crate::dealer::TaskGroupHandle;
use crate::diff::ConnectorsAndTasks;
use crate::ids::{TaskId, WorkerId};

/// Continuity Filter (§4.5): place concrete task ids onto workers, preserving whatever of a
/// worker's prior tasks still fits a group dealt to it this round, then filling any remaining
/// slots from the front of each leftover group appearance.
///
/// First pass: for each worker (sorted), for each task it currently owns (sorted), find the
/// *first* group appearance in that worker's dealt list containing the task; if found, remove it
/// from the group and drop that one appearance, and keep the task on the worker. If no group
/// appearance contains it, the task is not retained — it was dealt to someone else or dropped by
/// the class splitter's integer-division remainder.
///
/// Second pass: appearances are drained in the same round-robin order they were dealt in, i.e.
/// column-major across workers (every worker's 1st remaining appearance, then every worker's 2nd,
/// ...), not all of one worker's appearances before moving to the next. A group appearance shared
/// across workers (the single-class case, e.g. `ConnectorKind::Other`) has its tasks handed out in
/// round-robin order this way rather than all going to whichever worker is processed first.
pub fn place_tasks(
    workers: &[WorkerId],
    current_allocation: &BTreeMap<WorkerId, ConnectorsAndTasks>,
    mut intermediate: BTreeMap<WorkerId, Vec<TaskGroupHandle>>,
) -> BTreeMap<WorkerId, Vec<TaskId>> {
    let mut placed: BTreeMap<WorkerId, Vec<TaskId>> =
        workers.iter().map(|w| (w.clone(), Vec::new())).collect();

    let empty = ConnectorsAndTasks::empty();

    // First pass: retain continuity.
    //
    // `worker` is always drawn from the same sorted `workers` slice `intermediate`/`placed` were
    // seeded from by the caller, so these keys are always present; debug_assert documents that
    // invariant without paying for a lookup panic in release builds, and `entry`/`or_default` is
    // a non-panicking fallback should it ever not hold.
    for worker in workers {
        let current = current_allocation.get(worker).unwrap_or(&empty);
        debug_assert!(intermediate.contains_key(worker), "worker not seeded into intermediate map");
        let groups = intermediate.entry(worker.clone()).or_default();

        for task in &current.tasks {
            let first_match = groups.iter().position(|g| g.borrow().contains(task));
            if let Some(idx) = first_match {
                groups[idx].borrow_mut().remove(task);
                groups.remove(idx);
                debug_assert!(placed.contains_key(worker), "worker not seeded into placed map");
                placed.entry(worker.clone()).or_default().push(task.clone());
            }
        }
    }

    // Second pass: fill remaining slots column-major, preserving the original round-robin dealt
    // order so a group appearance shared across workers is drained in that same order.
    let max_remaining = intermediate.values().map(Vec::len).max().unwrap_or(0);
    for round in 0..max_remaining {
        for worker in workers {
            debug_assert!(intermediate.contains_key(worker), "worker not seeded into intermediate map");
            let groups = intermediate.entry(worker.clone()).or_default();
            if let Some(group) = groups.get(round) {
                if let Some(task) = group.borrow_mut().pop_front() {
                    debug_assert!(placed.contains_key(worker), "worker not seeded into placed map");
                    placed.entry(worker.clone()).or_default().push(task);
                }
            }
        }
    }

    placed
}

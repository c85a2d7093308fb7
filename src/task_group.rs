use std::collections::{BTreeSet, VecDeque};

use crate::ids::{ConnectorId, TaskId};

/// An ordered slice of one connector's task indices belonging to one class, mutable during
/// dealing (§3 "TaskGroup").
#[derive(Debug, Clone)]
pub struct TaskGroup {
    connector: ConnectorId,
    indices: VecDeque<u32>,
}

impl TaskGroup {
    fn new(connector: ConnectorId, indices: impl IntoIterator<Item = u32>) -> Self {
        Self {
            connector,
            indices: indices.into_iter().collect(),
        }
    }

    pub fn connector(&self) -> &ConnectorId {
        &self.connector
    }

    pub fn contains(&self, task: &TaskId) -> bool {
        task.connector == self.connector && self.indices.contains(&task.task_index)
    }

    pub fn remove(&mut self, task: &TaskId) -> bool {
        if task.connector != self.connector {
            return false;
        }
        if let Some(pos) = self.indices.iter().position(|&i| i == task.task_index) {
            self.indices.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn pop_front(&mut self) -> Option<TaskId> {
        self.indices
            .pop_front()
            .map(|index| TaskId::new(self.connector.clone(), index))
    }

    pub fn size(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Class Splitter (§4.3): given one connector and its configured task indices, produce the task
/// group for `class_number`, or `None` if that class does not apply to this connector or the
/// connector currently has zero tasks.
///
/// Integer division silently drops any remainder; this must not be "fixed" to round up or
/// distribute the remainder, per §4.3's explicit rationale.
pub fn task_group(
    connector: &ConnectorId,
    configured_tasks: &BTreeSet<u32>,
    class_number: u32,
) -> Option<TaskGroup> {
    let sorted_indices: Vec<u32> = configured_tasks.iter().copied().collect();
    let l = sorted_indices.len();

    let kind = connector.kind();
    let valid_classes = kind.valid_classes();
    if !valid_classes.contains(&class_number) {
        return None;
    }

    // The divisor is the connector kind's class count: 2 for s3 (classes {1,2}), 4 for es
    // (classes {1,2,3,4}), 1 for everything else (single class {1} holding all tasks).
    let tasks_per_group = valid_classes.len();
    if tasks_per_group == 0 {
        return None;
    }

    let group_len = l / tasks_per_group;
    let skip = group_len * (class_number as usize - 1);

    Some(TaskGroup::new(
        connector.clone(),
        sorted_indices[skip..skip + group_len].iter().copied(),
    ))
}

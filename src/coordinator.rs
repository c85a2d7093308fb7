use std::collections::{BTreeMap, BTreeSet};

use crate::ids::{ConnectorId, TaskId, WorkerId};

/// A point-in-time view of what is configured (§3 "ConfigSnapshot"): an offset plus the set of
/// connectors and, per connector, its tasks.
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    offset: u64,
    tasks_by_connector: BTreeMap<ConnectorId, BTreeSet<u32>>,
}

impl ConfigSnapshot {
    pub fn new(offset: u64, tasks_by_connector: BTreeMap<ConnectorId, BTreeSet<u32>>) -> Self {
        Self {
            offset,
            tasks_by_connector,
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn connectors(&self) -> BTreeSet<ConnectorId> {
        self.tasks_by_connector.keys().cloned().collect()
    }

    /// Task indices configured for `connector`, empty if the connector is unknown.
    pub fn task_indices(&self, connector: &ConnectorId) -> BTreeSet<u32> {
        self.tasks_by_connector.get(connector).cloned().unwrap_or_default()
    }

    pub fn tasks(&self, connector: &ConnectorId) -> BTreeSet<TaskId> {
        self.task_indices(connector)
            .into_iter()
            .map(|i| TaskId::new(connector.clone(), i))
            .collect()
    }

    /// The full map of connector -> configured task indices, as consumed by the dealer (§4.4).
    pub fn tasks_by_connector(&self) -> &BTreeMap<ConnectorId, BTreeSet<u32>> {
        &self.tasks_by_connector
    }
}

/// Leader-state publication payload (§4.1 step 9): what's consumed by external status endpoints.
/// The core builds this and hands it to the coordinator; it does not retain a copy itself.
#[derive(Debug, Clone, Default)]
pub struct LeaderState {
    pub member_urls: BTreeMap<WorkerId, String>,
    pub connector_allocation: BTreeMap<WorkerId, BTreeSet<ConnectorId>>,
    pub task_allocation: BTreeMap<WorkerId, BTreeSet<TaskId>>,
}

/// The group-membership/config-store collaborator the Assignor is built against (§6
/// "Coordinator interface"). Out of scope as an algorithmic subject; modeled here only at its
/// interface, with one in-process reference implementation for tests and the demo binary.
pub trait Coordinator {
    fn generation_id(&self) -> i64;
    fn last_completed_generation_id(&self) -> i64;
    fn member_id(&self) -> WorkerId;

    /// The cached snapshot, without forcing a refresh against the backing store.
    fn snapshot(&self) -> ConfigSnapshot;

    /// Force a refresh against the backing store and cache the result.
    fn fresh_snapshot(&mut self) -> ConfigSnapshot;

    fn set_snapshot(&mut self, snapshot: ConfigSnapshot);

    fn set_leader_state(&mut self, state: LeaderState);
}

/// In-process `Coordinator` good enough to drive the Assignor in tests and the demo binary,
/// without a real group-membership service. `authoritative_snapshot` models what a fresh read of
/// the backing config store would return; `cached_snapshot` models what this coordinator has
/// observed so far, which `fresh_snapshot` brings in line with the authoritative value.
#[derive(Debug, Clone)]
pub struct InMemoryCoordinator {
    generation_id: i64,
    last_completed_generation_id: i64,
    member_id: WorkerId,
    cached_snapshot: ConfigSnapshot,
    authoritative_snapshot: ConfigSnapshot,
    published_leader_state: Option<LeaderState>,
}

impl InMemoryCoordinator {
    pub fn new(member_id: WorkerId, snapshot: ConfigSnapshot) -> Self {
        Self {
            generation_id: 0,
            last_completed_generation_id: -1,
            member_id,
            cached_snapshot: snapshot.clone(),
            authoritative_snapshot: snapshot,
            published_leader_state: None,
        }
    }

    pub fn set_generation_id(&mut self, generation_id: i64) {
        self.generation_id = generation_id;
    }

    pub fn set_last_completed_generation_id(&mut self, generation_id: i64) {
        self.last_completed_generation_id = generation_id;
    }

    /// Update what the backing store would return on the next `fresh_snapshot` call, without
    /// updating the cached value this coordinator currently reports via `snapshot()`.
    pub fn set_authoritative_snapshot(&mut self, snapshot: ConfigSnapshot) {
        self.authoritative_snapshot = snapshot;
    }

    pub fn published_leader_state(&self) -> Option<&LeaderState> {
        self.published_leader_state.as_ref()
    }
}

impl Coordinator for InMemoryCoordinator {
    fn generation_id(&self) -> i64 {
        self.generation_id
    }

    fn last_completed_generation_id(&self) -> i64 {
        self.last_completed_generation_id
    }

    fn member_id(&self) -> WorkerId {
        self.member_id.clone()
    }

    fn snapshot(&self) -> ConfigSnapshot {
        self.cached_snapshot.clone()
    }

    fn fresh_snapshot(&mut self) -> ConfigSnapshot {
        self.cached_snapshot = self.authoritative_snapshot.clone();
        self.cached_snapshot.clone()
    }

    fn set_snapshot(&mut self, snapshot: ConfigSnapshot) {
        self.cached_snapshot = snapshot;
    }

    fn set_leader_state(&mut self, state: LeaderState) {
        self.published_leader_state = Some(state);
    }
}

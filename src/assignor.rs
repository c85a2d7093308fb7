use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::assignment::{Assignment, AssignmentError, ProtocolVersion};
use crate::clock::Clock;
use crate::config::AssignorConfig;
use crate::coordinator::{Coordinator, LeaderState};
use crate::dealer;
use crate::delay::DelayController;
use crate::diff::{self, ConnectorsAndTasks};
use crate::error::AssignorError;
use crate::ids::WorkerId;
use crate::member::MemberMetadata;

/// The stateful actor that computes one round of per-worker start/stop assignments (§4.1).
///
/// `Assignor` is single-threaded and non-reentrant (§5): `perform_assignment` must not be called
/// concurrently on the same instance. Wrap it in a `Mutex` if the caller cannot already guarantee
/// serialized invocation.
pub struct Assignor {
    config: AssignorConfig,
    delay_controller: DelayController,
    previous_generation_id: i64,
}

impl Assignor {
    pub fn new(config: AssignorConfig) -> Self {
        Self {
            config,
            delay_controller: DelayController::new(),
            previous_generation_id: -1,
        }
    }

    /// Run one rebalance round (§4.1).
    pub fn perform_assignment(
        &mut self,
        leader_id: &WorkerId,
        leader_url: &str,
        members: &BTreeMap<WorkerId, MemberMetadata>,
        coordinator: &mut dyn Coordinator,
        clock: &dyn Clock,
    ) -> Result<BTreeMap<WorkerId, Assignment>, AssignorError> {
        if members.is_empty() {
            return Err(AssignorError::EmptyWorkforce);
        }

        // Time is read exactly once per round (§5 "Time").
        let now = clock.now_millis();

        // Step 1: max offset and protocol version agreement.
        let max_offset = members
            .values()
            .map(|m| m.config_offset)
            .max()
            .expect("members is non-empty");
        let protocol_version = if members.values().all(|m| {
            matches!(
                m.prior_assignment.as_ref().map(|a| a.protocol_version),
                Some(ProtocolVersion::V4)
            )
        }) {
            ProtocolVersion::V4
        } else {
            ProtocolVersion::V3
        };

        // Step 2: leader-freshness check.
        let mut snapshot = coordinator.snapshot();
        if snapshot.offset() < max_offset {
            snapshot = coordinator.fresh_snapshot();
            if snapshot.offset() < max_offset {
                warn!(
                    leader_id = %leader_id,
                    cached_offset = snapshot.offset(),
                    max_offset,
                    "leader config snapshot is behind the highest member offset, emitting CONFIG_MISMATCH"
                );
                let mismatches = members
                    .keys()
                    .map(|worker| {
                        (
                            worker.clone(),
                            Assignment::config_mismatch(
                                protocol_version,
                                leader_id.clone(),
                                leader_url.to_string(),
                                max_offset,
                            ),
                        )
                    })
                    .collect();
                // State is deliberately not advanced on this path (§4.1 step 2, §7).
                return Ok(mismatches);
            }
        }

        // Step 3: generation-continuity check.
        if self.previous_generation_id != coordinator.last_completed_generation_id() {
            info!(
                cached_generation = self.previous_generation_id,
                coordinator_generation = coordinator.last_completed_generation_id(),
                "generation mismatch, resetting carried delay/membership state"
            );
            self.delay_controller.reset();
        }

        // Step 4: configured connectors/tasks.
        let configured_connectors = snapshot.connectors();
        let configured_tasks_by_connector = snapshot.tasks_by_connector().clone();

        // Step 5: current allocation from each member's prior assignment.
        let current_allocation: BTreeMap<WorkerId, ConnectorsAndTasks> = members
            .iter()
            .map(|(worker, meta)| {
                let allocation = match &meta.prior_assignment {
                    Some(prior) => ConnectorsAndTasks {
                        connectors: prior.connectors.clone(),
                        tasks: prior.tasks.clone(),
                    },
                    None => ConnectorsAndTasks::empty(),
                };
                (worker.clone(), allocation)
            })
            .collect();

        // Step 6: new allocation via the Delay Controller + dealers (§4.2-§4.5).
        let present_workers: BTreeSet<WorkerId> = members.keys().cloned().collect();
        let resolution = self
            .delay_controller
            .resolve(now, self.config.max_delay_millis, &present_workers);
        let dealing_workforce = resolution.dealing_workforce;

        let intermediate = dealer::deal_class_groups(&dealing_workforce, &configured_tasks_by_connector);
        let placed_tasks = crate::continuity::place_tasks(&dealing_workforce, &current_allocation, intermediate);
        let dealt_connectors = dealer::deal_connectors(&dealing_workforce, &configured_connectors);

        let mut new_allocation: BTreeMap<WorkerId, ConnectorsAndTasks> = BTreeMap::new();
        for worker in &dealing_workforce {
            let mut allocation = ConnectorsAndTasks::empty();
            if let Some(connectors) = dealt_connectors.get(worker) {
                allocation.connectors = connectors.iter().cloned().collect();
            }
            if let Some(tasks) = placed_tasks.get(worker) {
                allocation.tasks = tasks.iter().cloned().collect();
            }
            new_allocation.insert(worker.clone(), allocation);
        }
        // Missing (held-back) workers never receive an Assignment this round; their dealt share
        // is simply not produced for anyone (§4.2).
        new_allocation.retain(|worker, _| present_workers.contains(worker));

        // Step 7-8: diff engine, enforcing I4.
        let diff_result = diff::diff_allocations(&current_allocation, &new_allocation);

        // Step 9: publish leader state.
        let mut leader_state = LeaderState::default();
        for (worker, meta) in members {
            leader_state.member_urls.insert(worker.clone(), meta.url.clone());
        }
        for (worker, allocation) in &new_allocation {
            leader_state
                .connector_allocation
                .insert(worker.clone(), allocation.connectors.clone());
            leader_state
                .task_allocation
                .insert(worker.clone(), allocation.tasks.clone());
        }
        coordinator.set_leader_state(leader_state);

        // Step 10: assemble one Assignment per member.
        let empty = ConnectorsAndTasks::empty();
        let mut assignments = BTreeMap::new();
        for worker in members.keys() {
            let to_start = diff_result.to_start.get(worker).unwrap_or(&empty);
            let to_revoke = diff_result.to_revoke.get(worker).unwrap_or(&empty);
            let allocation = new_allocation.get(worker).unwrap_or(&empty);

            debug!(
                worker = %worker,
                connectors_to_start = to_start.connectors.len(),
                tasks_to_start = to_start.tasks.len(),
                connectors_to_stop = to_revoke.connectors.len(),
                tasks_to_stop = to_revoke.tasks.len(),
                "computed assignment"
            );

            assignments.insert(
                worker.clone(),
                Assignment {
                    protocol_version,
                    error: AssignmentError::NoError,
                    leader_id: leader_id.clone(),
                    leader_url: leader_url.to_string(),
                    config_offset: max_offset,
                    connectors_to_start: to_start.connectors.clone(),
                    tasks_to_start: to_start.tasks.clone(),
                    connectors_to_stop: to_revoke.connectors.clone(),
                    tasks_to_stop: to_revoke.tasks.clone(),
                    delay_millis: resolution.current_delay_millis,
                    connectors: allocation.connectors.clone(),
                    tasks: allocation.tasks.clone(),
                },
            );
        }

        // Step 11: advance generation bookkeeping.
        self.previous_generation_id = coordinator.generation_id();

        Ok(assignments)
    }
}

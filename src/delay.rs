use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::ids::WorkerId;

/// Outcome of resolving the Delay Controller for one round: the workforce to deal tasks to
/// (present members plus any missing members still inside their grace window) and the current
/// delay to report on every Assignment this round.
pub struct DelayResolution {
    pub dealing_workforce: Vec<WorkerId>,
    pub current_delay_millis: u64,
}

/// The delay-related slice of Assignor state (§3 "Assignor state"): `scheduledRebalanceAt`,
/// `currentDelayMillis`, and `previousMembers`. `previousGenerationId` lives on `Assignor` itself
/// since it gates a reset of this whole struct rather than being read by the case table below.
#[derive(Debug, Default)]
pub struct DelayController {
    scheduled_rebalance_at: i64,
    current_delay_millis: u64,
    previous_members: BTreeSet<WorkerId>,
}

impl DelayController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all carried delay/membership state. Called when the generation-continuity check
    /// (§4.1 step 3) finds our cached generation stale.
    pub fn reset(&mut self) {
        self.scheduled_rebalance_at = 0;
        self.current_delay_millis = 0;
        self.previous_members.clear();
    }

    pub fn current_delay_millis(&self) -> u64 {
        self.current_delay_millis
    }

    /// Resolve this round's case (§4.2) and return the dealing workforce, sorted ascending.
    pub fn resolve(
        &mut self,
        now: i64,
        max_delay_millis: u64,
        present_workers: &BTreeSet<WorkerId>,
    ) -> DelayResolution {
        let missing: BTreeSet<WorkerId> = self
            .previous_members
            .difference(present_workers)
            .cloned()
            .collect();

        let mut dealing: BTreeSet<WorkerId> = present_workers.clone();

        if missing.is_empty() {
            // Case A: no missing workers.
            self.previous_members = present_workers.clone();
            self.scheduled_rebalance_at = 0;
            self.current_delay_millis = 0;
        } else if self.scheduled_rebalance_at > 0 && now >= self.scheduled_rebalance_at {
            // Case B: grace window expired, evict missing workers.
            info!(
                missing = ?missing,
                "grace window expired, evicting missing workers"
            );
            self.previous_members = present_workers.clone();
            self.scheduled_rebalance_at = 0;
            self.current_delay_millis = 0;
        } else if now < self.scheduled_rebalance_at {
            // Case C: grace still active, extend it.
            let remaining = (self.scheduled_rebalance_at - now).max(0) as u64;
            self.current_delay_millis = remaining.min(max_delay_millis);
            self.scheduled_rebalance_at = now + self.current_delay_millis as i64;
            debug!(
                missing = ?missing,
                delay_millis = self.current_delay_millis,
                "grace window active, extending scheduled rebalance"
            );
            dealing.extend(missing);
        } else {
            // Case D: first observation of this missing set.
            self.current_delay_millis = max_delay_millis;
            self.scheduled_rebalance_at = now + max_delay_millis as i64;
            debug!(
                missing = ?missing,
                delay_millis = self.current_delay_millis,
                "missing workers observed, scheduling rebalance delay"
            );
            dealing.extend(missing);
        }

        DelayResolution {
            dealing_workforce: dealing.into_iter().collect(),
            current_delay_millis: self.current_delay_millis,
        }
    }
}

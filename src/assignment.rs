use std::collections::BTreeSet;

use crate::ids::{ConnectorId, TaskId};

/// Protocol version a member or assignment is speaking (§6 "Protocol metadata codec").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    V3,
    V4,
}

/// In-band outcome carried on every `Assignment` (§7 "Error surface outward"). The only non-success
/// value the core ever produces is `ConfigMismatch`, on the leader-freshness path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentError {
    NoError,
    ConfigMismatch,
}

/// The per-member output of one rebalance round (§3 "Assignment").
///
/// Besides the delta fields named directly in §3 (`*ToStart`/`*ToStop`), this also carries the
/// full post-round ownership (`connectors`/`tasks`) — the set the worker will be running once it
/// has applied `toStart`/`toStop`. This is what MemberMetadata's description of `priorAssignment`
/// ("containing protocolVersion, connectors set, tasks set") refers to, and it is exactly what
/// `currentAllocation` is rebuilt from on the following round (§4.1 step 5): a worker's current
/// allocation is always the previous round's full new allocation, never a delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub protocol_version: ProtocolVersion,
    pub error: AssignmentError,
    pub leader_id: crate::ids::WorkerId,
    pub leader_url: String,
    pub config_offset: u64,
    pub connectors_to_start: BTreeSet<ConnectorId>,
    pub tasks_to_start: BTreeSet<TaskId>,
    pub connectors_to_stop: BTreeSet<ConnectorId>,
    pub tasks_to_stop: BTreeSet<TaskId>,
    pub delay_millis: u64,
    /// Full connector ownership after this round (toStart ∪ retained, minus toStop).
    pub connectors: BTreeSet<ConnectorId>,
    /// Full task ownership after this round (toStart ∪ retained, minus toStop).
    pub tasks: BTreeSet<TaskId>,
}

impl Assignment {
    /// A `CONFIG_MISMATCH` assignment: empty action sets, zero delay, per §4.1 step 2.
    pub fn config_mismatch(
        protocol_version: ProtocolVersion,
        leader_id: crate::ids::WorkerId,
        leader_url: String,
        config_offset: u64,
    ) -> Self {
        Self {
            protocol_version,
            error: AssignmentError::ConfigMismatch,
            leader_id,
            leader_url,
            config_offset,
            connectors_to_start: BTreeSet::new(),
            tasks_to_start: BTreeSet::new(),
            connectors_to_stop: BTreeSet::new(),
            tasks_to_stop: BTreeSet::new(),
            delay_millis: 0,
            connectors: BTreeSet::new(),
            tasks: BTreeSet::new(),
        }
    }
}

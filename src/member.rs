use crate::assignment::Assignment;

/// Per-worker record submitted to the leader for one rebalance round (§3 "MemberMetadata").
#[derive(Debug, Clone)]
pub struct MemberMetadata {
    /// Externally reachable endpoint, propagated only — the core never interprets it.
    pub url: String,
    /// Highest config-snapshot offset this worker has observed.
    pub config_offset: u64,
    /// The `Assignment` last delivered to this worker, if any. `None` models a worker joining
    /// the group for the first time (empty prior connectors/tasks, no meaningful protocol
    /// version to contribute to the version-agreement check).
    pub prior_assignment: Option<Assignment>,
}

impl MemberMetadata {
    pub fn new(url: impl Into<String>, config_offset: u64, prior_assignment: Option<Assignment>) -> Self {
        Self {
            url: url.into(),
            config_offset,
            prior_assignment,
        }
    }
}

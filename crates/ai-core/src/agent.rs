use core::fmt::Debug;

/// Stable identifier for an actor driven by a behavior.
///
/// Deterministic simulation requires:
/// - stable ordering (`Ord`)
/// - a stable numeric ID (`stable_id`) for seeding, logs and actor references stored in
///   knowledge values
///
/// Behavior instances may be ticked from worker threads, so identifiers must be `Send + Sync`.
pub trait AgentId: Copy + Ord + Eq + Debug + Send + Sync + 'static {
    fn stable_id(self) -> u64;
}

impl AgentId for u64 {
    fn stable_id(self) -> u64 {
        self
    }
}

impl AgentId for u32 {
    fn stable_id(self) -> u64 {
        self as u64
    }
}

impl AgentId for usize {
    fn stable_id(self) -> u64 {
        self as u64
    }
}

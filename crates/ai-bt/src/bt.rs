use ai_nav::NavWorldMut;

use crate::context::UpdateContext;
use crate::memory::NodeState;

/// Result of a single node update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateResult {
    Success,
    Running,
    Failed,
}

impl UpdateResult {
    /// Interpret a raw result code produced outside Rust (0 = success, 1 = running).
    ///
    /// Any other value is coerced to `Failed`.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => UpdateResult::Success,
            1 => UpdateResult::Running,
            _ => UpdateResult::Failed,
        }
    }

    pub fn is_finished(self) -> bool {
        self != UpdateResult::Running
    }
}

/// Pre-order execution index of a node inside its tree.
///
/// Doubles as the relevance bit index and the state slot of the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A tree node: compound or leaf.
///
/// Nodes are immutable and shared by every instance running the tree; anything that changes
/// while a node runs lives in its [`NodeState`], constructed when the node becomes relevant and
/// released when it becomes irrelevant.
pub trait Node<W>: Send + Sync + 'static
where
    W: NavWorldMut + 'static,
{
    fn name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }

    /// Compound nodes may own children; leaves may not.
    fn is_compound(&self) -> bool {
        false
    }

    fn init_state(&self, _ctx: &mut UpdateContext<'_, W>, _id: NodeId) -> NodeState {
        NodeState::Empty
    }

    fn release_state(&self, _ctx: &mut UpdateContext<'_, W>, _id: NodeId) {}

    fn update(&self, ctx: &mut UpdateContext<'_, W>, id: NodeId) -> UpdateResult;
}

/// A decorator attached to a node.
///
/// Decorators are not wrappers: the driver composes `can_update` (entry filter), `update` (runs
/// every tick before the node) and `post_update` (may rewrite the node result).
pub trait Decorator<W>: Send + Sync + 'static
where
    W: NavWorldMut + 'static,
{
    fn name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }

    fn init_state(&self, _ctx: &mut UpdateContext<'_, W>, _id: NodeId) -> NodeState {
        NodeState::Empty
    }

    fn release_state(&self, _ctx: &mut UpdateContext<'_, W>, _id: NodeId) {}

    fn can_update(&self, _ctx: &mut UpdateContext<'_, W>, _id: NodeId) -> bool {
        true
    }

    fn update(&self, _ctx: &mut UpdateContext<'_, W>, _id: NodeId) -> UpdateResult {
        UpdateResult::Success
    }

    fn post_update(&self, _ctx: &mut UpdateContext<'_, W>, _id: NodeId, _result: &mut UpdateResult) {
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_codes_are_failures() {
        assert_eq!(UpdateResult::from_code(0), UpdateResult::Success);
        assert_eq!(UpdateResult::from_code(1), UpdateResult::Running);
        assert_eq!(UpdateResult::from_code(2), UpdateResult::Failed);
        assert_eq!(UpdateResult::from_code(-7), UpdateResult::Failed);
        assert_eq!(UpdateResult::from_code(i32::MAX), UpdateResult::Failed);
    }
}

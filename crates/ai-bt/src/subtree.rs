use std::sync::Arc;

use ai_nav::NavWorldMut;
use ai_tools::Diagnostic;

use crate::bt::{Node, NodeId, UpdateResult};
use crate::context::UpdateContext;
use crate::memory::{NodeMemory, NodeState};
use crate::tree::BehaviorTree;

pub const BLACKBOARD_MISMATCH: &str = "bt.subtree.blackboard_mismatch";

/// Nested memory of a running sub-tree.
#[derive(Debug, Default)]
pub struct SubTreeState {
    pub memory: NodeMemory,
}

/// Leaf that runs another tree over its own nested memory, sharing the host knowledge.
pub struct SubTree<W>
where
    W: NavWorldMut + 'static,
{
    tree: Option<Arc<BehaviorTree<W>>>,
}

impl<W> SubTree<W>
where
    W: NavWorldMut + 'static,
{
    pub fn new(tree: Arc<BehaviorTree<W>>) -> Self {
        Self { tree: Some(tree) }
    }

    /// Sub-tree whose asset is not available; always fails.
    pub fn unloaded() -> Self {
        Self { tree: None }
    }

    fn blackboard_accepted(
        &self,
        ctx: &mut UpdateContext<'_, W>,
        id: NodeId,
        tree: &BehaviorTree<W>,
    ) -> bool {
        let Some(expected) = tree.root_settings().blackboard_type.as_deref() else {
            return true;
        };
        let actual = ctx.knowledge.blackboard().type_name().to_string();
        if ctx.knowledge.types().is_assignable(&actual, expected) {
            return true;
        }

        let key = format!("{BLACKBOARD_MISMATCH}:{}:{}", ctx.tree().version(), id.0);
        let message = format!(
            "sub-tree '{}' expects blackboard '{expected}' but host provides '{actual}'",
            tree.name()
        );
        let diagnostic = Diagnostic::warning(BLACKBOARD_MISMATCH)
            .at(ctx.time)
            .with_message(message.clone());
        if ctx.knowledge.report_once(key, diagnostic) {
            tracing::warn!(subtree = %tree.name(), expected, actual = %actual, "{message}");
        }
        false
    }
}

impl<W> Node<W> for SubTree<W>
where
    W: NavWorldMut + 'static,
{
    fn name(&self) -> &'static str {
        "SubTree"
    }

    fn init_state(&self, _ctx: &mut UpdateContext<'_, W>, _id: NodeId) -> NodeState {
        let len = self.tree.as_ref().map(|t| t.len()).unwrap_or(0);
        NodeState::SubTree(Box::new(SubTreeState {
            memory: NodeMemory::new(len),
        }))
    }

    fn release_state(&self, ctx: &mut UpdateContext<'_, W>, id: NodeId) {
        let Some(tree) = self.tree.as_deref() else {
            return;
        };
        let Some(NodeState::SubTree(state)) = ctx.state_mut(id) else {
            return;
        };
        let mut memory = std::mem::take(&mut state.memory);
        if memory.len() == tree.len() {
            ctx.nested(tree, &mut memory).release_all();
        }
    }

    fn update(&self, ctx: &mut UpdateContext<'_, W>, id: NodeId) -> UpdateResult {
        let Some(tree) = self.tree.as_deref() else {
            return UpdateResult::Failed;
        };
        if tree.is_empty() || !self.blackboard_accepted(ctx, id, tree) {
            return UpdateResult::Failed;
        }

        let Some(NodeState::SubTree(state)) = ctx.state_mut(id) else {
            return UpdateResult::Failed;
        };
        let mut memory = std::mem::take(&mut state.memory);
        if memory.len() != tree.len() {
            memory = NodeMemory::new(tree.len());
        }

        let result = ctx.nested(tree, &mut memory).invoke_update(tree.root_id());

        if let Some(NodeState::SubTree(state)) = ctx.state_mut(id) {
            state.memory = memory;
        }
        result
    }
}

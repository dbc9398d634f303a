//! Update context and the node driver.
//!
//! The driver owns the decorator protocol and relevancy bookkeeping; nodes only see
//! `init_state` / `update` / `release_state` calls for their own execution index.

use ai_core::Variant;
use ai_nav::NavWorldMut;
use ai_tools::Diagnostic;

use crate::bt::{Node, NodeId, UpdateResult};
use crate::error::BehaviorError;
use crate::knowledge::Knowledge;
use crate::memory::{NodeMemory, NodeState};
use crate::tree::{BehaviorTree, NodeEntry, NodeKind};

pub const DEFAULT_MAX_CALL_DEPTH: usize = 100;

pub struct UpdateContext<'a, W>
where
    W: NavWorldMut + 'static,
{
    tree: &'a BehaviorTree<W>,
    memory: &'a mut NodeMemory,
    pub world: &'a mut W,
    pub agent: W::Agent,
    pub knowledge: &'a mut Knowledge,
    /// Length of the current period in seconds.
    pub delta_time: f32,
    /// Instance time at the start of the current period.
    pub time: f32,
    depth: usize,
    max_depth: usize,
}

impl<'a, W> UpdateContext<'a, W>
where
    W: NavWorldMut + 'static,
{
    pub fn new(
        tree: &'a BehaviorTree<W>,
        memory: &'a mut NodeMemory,
        world: &'a mut W,
        agent: W::Agent,
        knowledge: &'a mut Knowledge,
        delta_time: f32,
        time: f32,
    ) -> Self {
        Self {
            tree,
            memory,
            world,
            agent,
            knowledge,
            delta_time,
            time,
            depth: 0,
            max_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Context running `tree` over `memory` with the same world, agent, knowledge and clock.
    pub fn nested<'b>(
        &'b mut self,
        tree: &'b BehaviorTree<W>,
        memory: &'b mut NodeMemory,
    ) -> UpdateContext<'b, W> {
        UpdateContext {
            tree,
            memory,
            world: &mut *self.world,
            agent: self.agent,
            knowledge: &mut *self.knowledge,
            delta_time: self.delta_time,
            time: self.time,
            depth: self.depth,
            max_depth: self.max_depth,
        }
    }

    pub fn tree(&self) -> &'a BehaviorTree<W> {
        self.tree
    }

    pub fn memory(&self) -> &NodeMemory {
        self.memory
    }

    pub fn is_relevant(&self, id: NodeId) -> bool {
        self.memory.is_relevant(id)
    }

    pub fn state(&self, id: NodeId) -> Option<&NodeState> {
        self.memory.state(id)
    }

    pub fn state_mut(&mut self, id: NodeId) -> Option<&mut NodeState> {
        self.memory.state_mut(id)
    }

    /// World and node state borrowed together.
    pub fn world_and_state_mut(&mut self, id: NodeId) -> (&mut W, Option<&mut NodeState>) {
        (&mut *self.world, self.memory.state_mut(id))
    }

    /// Keep the state of `id` alive while it is being released.
    pub fn retain(&mut self, id: NodeId) {
        self.memory.retain(id);
    }

    /// Resolve a knowledge selector.
    pub fn get(&self, path: &str) -> Option<Variant> {
        self.knowledge.get(path)
    }

    /// Resolve an actor selector to an actor handle of this world.
    pub fn resolve_actor(&self, path: &str) -> Option<W::Agent> {
        let id = self.knowledge.get(path)?.as_actor()?;
        self.world.resolve_actor(id)
    }

    pub fn signal_event(&mut self, name: &str, is_async: bool) {
        self.knowledge.events_mut().signal(name, is_async);
    }

    pub fn request_stop(&mut self, result: UpdateResult) {
        self.knowledge.request_stop(result);
    }

    /// Run one update of node `id`, applying its decorators.
    pub fn invoke_update(&mut self, id: NodeId) -> UpdateResult {
        let tree = self.tree;
        let (Some(entry), Some(node)) = (tree.entry(id), tree.node(id)) else {
            return UpdateResult::Failed;
        };
        if self.depth >= self.max_depth {
            self.report_depth_overflow();
            return UpdateResult::Failed;
        }
        self.depth += 1;
        let result = self.update_node(id, entry, node);
        self.depth -= 1;
        result
    }

    fn update_node(
        &mut self,
        id: NodeId,
        entry: &'a NodeEntry<W>,
        node: &'a dyn Node<W>,
    ) -> UpdateResult {
        let tree = self.tree;

        if !self.memory.is_relevant(id) {
            for &decorator_id in &entry.decorators {
                let Some(decorator) = tree.decorator(decorator_id) else {
                    continue;
                };
                if !self.memory.is_relevant(decorator_id) {
                    let state = decorator.init_state(self, decorator_id);
                    self.memory.construct(decorator_id, state);
                }
                if !decorator.can_update(self, decorator_id) {
                    self.release_decorators(entry, None);
                    return UpdateResult::Failed;
                }
            }
            let state = node.init_state(self, id);
            self.memory.construct(id, state);
        }

        let mut decorators_passed = true;
        for &decorator_id in &entry.decorators {
            if let Some(decorator) = tree.decorator(decorator_id) {
                if decorator.update(self, decorator_id) == UpdateResult::Failed {
                    decorators_passed = false;
                }
            }
        }

        let mut result = if decorators_passed {
            node.update(self, id)
        } else {
            UpdateResult::Failed
        };

        for &decorator_id in &entry.decorators {
            if let Some(decorator) = tree.decorator(decorator_id) {
                decorator.post_update(self, decorator_id, &mut result);
            }
        }

        if result != UpdateResult::Running && self.memory.is_relevant(id) {
            self.become_irrelevant(id);
        }
        result
    }

    /// Release `id`, its relevant descendants (post-order) and its decorators.
    pub fn become_irrelevant(&mut self, id: NodeId) {
        self.release(id, None);
    }

    /// Release `id` like [`Self::become_irrelevant`] but keep decorator `keep` alive, so the node
    /// is entered again with fresh state on its next update.
    pub fn restage(&mut self, id: NodeId, keep: NodeId) {
        self.release(id, Some(keep));
    }

    /// Release every relevant node of this memory, then drop whatever states survived.
    pub fn release_all(&mut self) {
        let root = self.tree.root_id();
        if self.memory.is_relevant(root) {
            self.become_irrelevant(root);
        }
        *self.memory = NodeMemory::new(self.tree.len());
    }

    fn release(&mut self, id: NodeId, keep: Option<NodeId>) {
        let tree = self.tree;
        let Some(entry) = tree.entry(id) else {
            return;
        };
        match &entry.kind {
            NodeKind::Node(node) => {
                if self.memory.is_relevant(id) {
                    for &child in &entry.children {
                        if self.memory.is_relevant(child) {
                            self.release(child, None);
                        }
                    }
                    self.memory.clear_bit(id);
                    node.release_state(self, id);
                    self.memory.finish_release(id);
                }
                self.release_decorators(entry, keep);
            }
            NodeKind::Decorator(decorator) => {
                if self.memory.is_relevant(id) {
                    self.memory.clear_bit(id);
                    decorator.release_state(self, id);
                    self.memory.finish_release(id);
                }
            }
        }
    }

    fn release_decorators(&mut self, entry: &NodeEntry<W>, keep: Option<NodeId>) {
        for &decorator_id in &entry.decorators {
            if Some(decorator_id) != keep && self.memory.is_relevant(decorator_id) {
                self.release(decorator_id, None);
            }
        }
    }

    fn report_depth_overflow(&mut self) {
        let error = BehaviorError::CallDepthExceeded {
            limit: self.max_depth,
        };
        let message = error.to_string();
        let reported = self.knowledge.report_once(
            "bt.call_depth",
            Diagnostic::error("bt.call_depth")
                .at(self.time)
                .with_message(message.clone()),
        );
        if reported {
            tracing::error!(tree = %self.tree.name(), limit = self.max_depth, "{message}");
        }
    }
}

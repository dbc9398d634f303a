use std::any::Any;
use std::fmt;

use ai_nav::NavWorldMut;

use crate::bt::NodeId;
use crate::move_to::MoveToState;
use crate::subtree::SubTreeState;

/// Per-node runtime state, stored in the instance memory slot of the node.
pub enum NodeState {
    /// Slot without a constructed state (node is not relevant).
    Vacant,
    /// Relevant node that keeps no data.
    Empty,
    /// Compound cursor. `-1` marks a sequence that already failed.
    Compound { current: i32 },
    /// Remaining time of a delay or time limit.
    Timer { time_left: f32 },
    /// Remaining loop iterations; `None` loops forever.
    Loop { loops_left: Option<u32> },
    /// Absolute time from which the guarded node may run again.
    Cooldown { end_time: f32 },
    SubTree(Box<SubTreeState>),
    MoveTo(Box<MoveToState>),
    /// State of user-defined nodes.
    Custom(Box<dyn Any + Send>),
}

impl NodeState {
    pub fn is_vacant(&self) -> bool {
        matches!(self, NodeState::Vacant)
    }

    pub fn custom<T: Any + Send>(value: T) -> Self {
        NodeState::Custom(Box::new(value))
    }

    pub fn downcast_mut<T: Any + Send>(&mut self) -> Option<&mut T> {
        match self {
            NodeState::Custom(state) => state.downcast_mut::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Vacant => f.write_str("Vacant"),
            NodeState::Empty => f.write_str("Empty"),
            NodeState::Compound { current } => {
                f.debug_struct("Compound").field("current", current).finish()
            }
            NodeState::Timer { time_left } => {
                f.debug_struct("Timer").field("time_left", time_left).finish()
            }
            NodeState::Loop { loops_left } => {
                f.debug_struct("Loop").field("loops_left", loops_left).finish()
            }
            NodeState::Cooldown { end_time } => {
                f.debug_struct("Cooldown").field("end_time", end_time).finish()
            }
            NodeState::SubTree(state) => f.debug_tuple("SubTree").field(state).finish(),
            NodeState::MoveTo(state) => f.debug_tuple("MoveTo").field(state).finish(),
            NodeState::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Fixed-size relevance bitset indexed by execution index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelevanceBits {
    words: Vec<u64>,
    len: usize,
}

impl RelevanceBits {
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.words[index / 64] & (1 << (index % 64)) != 0
    }

    pub fn set(&mut self, index: usize, value: bool) {
        if index >= self.len {
            return;
        }
        let mask = 1u64 << (index % 64);
        if value {
            self.words[index / 64] |= mask;
        } else {
            self.words[index / 64] &= !mask;
        }
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_clear(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |i| self.get(*i))
    }
}

/// Instance memory of one tree: a state slot and a relevance bit per node.
///
/// A bit is set exactly when its slot holds a constructed state.
#[derive(Debug, Default)]
pub struct NodeMemory {
    states: Vec<NodeState>,
    relevant: RelevanceBits,
}

impl NodeMemory {
    pub fn new(len: usize) -> Self {
        Self {
            states: (0..len).map(|_| NodeState::Vacant).collect(),
            relevant: RelevanceBits::new(len),
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn is_relevant(&self, id: NodeId) -> bool {
        self.relevant.get(id.index())
    }

    pub fn relevance(&self) -> &RelevanceBits {
        &self.relevant
    }

    pub fn state(&self, id: NodeId) -> Option<&NodeState> {
        self.states.get(id.index())
    }

    pub fn state_mut(&mut self, id: NodeId) -> Option<&mut NodeState> {
        self.states.get_mut(id.index())
    }

    /// Install a freshly constructed state and mark the node relevant.
    pub(crate) fn construct(&mut self, id: NodeId, state: NodeState) {
        debug_assert!(!self.is_relevant(id), "node {id:?} constructed twice");
        if let Some(slot) = self.states.get_mut(id.index()) {
            *slot = state;
            self.relevant.set(id.index(), true);
        }
    }

    pub(crate) fn clear_bit(&mut self, id: NodeId) {
        self.relevant.set(id.index(), false);
    }

    /// Re-assert relevance of a node whose state is being released, keeping the state alive.
    pub(crate) fn retain(&mut self, id: NodeId) {
        let constructed = self
            .states
            .get(id.index())
            .is_some_and(|s| !s.is_vacant());
        if constructed {
            self.relevant.set(id.index(), true);
        }
    }

    /// Drop the state after `release_state`, unless the node re-asserted its bit.
    pub(crate) fn finish_release(&mut self, id: NodeId) {
        if self.is_relevant(id) {
            return;
        }
        if let Some(slot) = self.states.get_mut(id.index()) {
            *slot = NodeState::Vacant;
        }
    }

    /// Every constructed slot has its bit set and every set bit has a constructed slot.
    pub fn is_consistent(&self) -> bool {
        self.states
            .iter()
            .enumerate()
            .all(|(i, s)| s.is_vacant() != self.relevant.get(i))
    }

    /// Number of MoveTo states currently bound to the per-frame follower, sub-trees included.
    pub fn fine_tick_bindings(&self) -> usize {
        self.states
            .iter()
            .map(|s| match s {
                NodeState::MoveTo(m) if m.has_tick => 1,
                NodeState::SubTree(sub) => sub.memory.fine_tick_bindings(),
                _ => 0,
            })
            .sum()
    }

    /// Per-frame pass: advance every bound MoveTo, recursing into nested sub-tree memory.
    pub fn frame_update<W>(&mut self, world: &mut W, dt: f32)
    where
        W: NavWorldMut,
    {
        for state in self.states.iter_mut() {
            match state {
                NodeState::MoveTo(m) if m.has_tick => m.follow(world, dt),
                NodeState::SubTree(sub) => sub.memory.frame_update(world, dt),
                _ => {}
            }
        }
    }
}

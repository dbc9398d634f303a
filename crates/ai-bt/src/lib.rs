//! Behavior Tree runtime built on `ai-core`.
//!
//! Trees are immutable assets shared by every instance running them. Each [`Behavior`] owns the
//! per-instance side: a [`NodeMemory`] (one state slot and one relevance bit per execution
//! index) and a [`Knowledge`] store (blackboard, goals, sensors, events).

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod behavior;
pub mod bt;
pub mod config;
pub mod context;
pub mod decorators;
pub mod error;
pub mod events;
pub mod knowledge;
pub mod memory;
pub mod move_to;
pub mod nodes;
pub mod subtree;
pub mod system;
pub mod tree;

pub use behavior::{Behavior, LogicState};
pub use bt::{Decorator, Node, NodeId, UpdateResult};
pub use config::{BehaviorSettings, BehaviorSystemConfig};
pub use context::UpdateContext;
pub use decorators::{
    Cooldown, ForceFailed, ForceSuccess, HasGoal, HasTag, Invert, KnowledgeBoolean,
    KnowledgeConditional, KnowledgeValuesConditional, Loop, TimeLimit,
};
pub use error::BehaviorError;
pub use events::{ActiveEvent, EventPhase, EventQueue, OutgoingEvent};
pub use knowledge::Knowledge;
pub use memory::{NodeMemory, NodeState, RelevanceBits};
pub use move_to::{MoveTo, MoveToState};
pub use nodes::{Action, Condition, Delay, ForceFinish, Root, Selector, Sequence};
pub use subtree::{SubTree, SubTreeState};
pub use system::BehaviorSystem;
pub use tree::{BehaviorTree, BehaviorTreeBuilder, NodeSpec, RootSettings};

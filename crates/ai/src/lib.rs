//! Umbrella crate that re-exports the `ai-*` building blocks.
//!
//! `bt` is the behavior tree runtime; `core`, `nav` and `tools` are the
//! world contracts, navigation backend and diagnostics it is built on.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use ai_core as core;

#[cfg(feature = "tools")]
#[cfg_attr(docsrs, doc(cfg(feature = "tools")))]
pub use ai_tools as tools;

#[cfg(feature = "nav")]
#[cfg_attr(docsrs, doc(cfg(feature = "nav")))]
pub use ai_nav as nav;

#[cfg(feature = "bt")]
#[cfg_attr(docsrs, doc(cfg(feature = "bt")))]
pub use ai_bt as bt;

/// Common imports for building and running trees.
#[cfg(feature = "full")]
pub mod prelude {
    pub use ai_bt::{
        Behavior, BehaviorSystem, BehaviorSystemConfig, BehaviorTree, Decorator, Node, NodeId,
        NodeSpec, UpdateContext, UpdateResult,
    };
    pub use ai_core::{AgentId, Structure, TypeRegistry, Variant, Vec3, WorldMut, WorldView};
    pub use ai_nav::{NavGrid, NavWorldMut, NavWorldView, Navigator};
}

//! Engine-agnostic primitives for the behavior runtime: agent ids, deterministic RNG, dynamic
//! values, type assignability and the world contracts nodes act through.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod agent;
pub mod compare;
pub mod math;
pub mod rng;
pub mod types;
pub mod variant;
pub mod world;

pub use agent::AgentId;
pub use compare::{compare, CompareOp};
pub use math::Vec3;
pub use rng::{derive_seed, DeterministicRng, SplitMix64};
pub use types::TypeRegistry;
pub use variant::{Structure, Variant};
pub use world::{AgentGeometry, WorldMut, WorldView};

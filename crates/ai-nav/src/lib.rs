//! Navigation primitives (provider contract and a reference grid backend).

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod grid;
pub mod navigator;
pub mod world;

pub use ai_core::Vec3;
pub use grid::NavGrid;
pub use navigator::{NavMeshProperties, NavPathResult, Navigator, PathFlags};
pub use world::{NavWorldMut, NavWorldView};

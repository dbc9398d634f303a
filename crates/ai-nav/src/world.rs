use ai_core::{WorldMut, WorldView};

use crate::Navigator;

pub trait NavWorldView: WorldView {
    /// The active navigation provider, or `None` when no navmesh is available.
    fn navigator(&self) -> Option<&dyn Navigator>;
}

pub trait NavWorldMut: WorldMut + NavWorldView {}

impl<W> NavWorldMut for W where W: WorldMut + NavWorldView {}

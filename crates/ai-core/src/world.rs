use crate::{AgentId, Vec3};

/// Collision shape summary used to derive navigation agent geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgentGeometry {
    Capsule { radius: f32, height: f32 },
    /// Fallback when no capsule collider is identifiable.
    Bounds { sphere_radius: f32, box_height: f32 },
}

impl AgentGeometry {
    /// `(radius, height)` of the agent.
    pub fn radius_height(self) -> (f32, f32) {
        match self {
            AgentGeometry::Capsule { radius, height } => (radius, height),
            AgentGeometry::Bounds {
                sphere_radius,
                box_height,
            } => (sphere_radius, box_height),
        }
    }
}

/// Read-only world access.
///
/// The core crate only prescribes the actor queries behaviors need; specific subsystems (nav,
/// perception, etc.) should define extension traits.
pub trait WorldView {
    type Agent: AgentId;

    fn position(&self, agent: Self::Agent) -> Option<Vec3>;

    /// Disabled actors keep their behavior state but are not ticked.
    fn is_enabled(&self, _agent: Self::Agent) -> bool {
        true
    }

    fn has_tag(&self, _agent: Self::Agent, _tag: &str) -> bool {
        false
    }

    fn geometry(&self, _agent: Self::Agent) -> Option<AgentGeometry> {
        None
    }

    /// Map a stable id stored in knowledge (`Variant::Actor`) back to an actor handle.
    fn resolve_actor(&self, stable_id: u64) -> Option<Self::Agent>;
}

/// Write access / effect sink.
pub trait WorldMut: WorldView {
    /// Request a movement delta for `agent`. Returns `false` when the actor cannot move.
    fn add_movement(&mut self, agent: Self::Agent, delta: Vec3) -> bool;
}

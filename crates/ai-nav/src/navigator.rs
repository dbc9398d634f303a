use ai_core::Vec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bit flags describing a path query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathFlags(pub u8);

impl PathFlags {
    pub const NONE: PathFlags = PathFlags(0);
    /// The goal was unreachable; the path ends at the closest reachable point.
    pub const PARTIAL_PATH: PathFlags = PathFlags(1);

    pub fn contains(self, other: PathFlags) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn is_partial(self) -> bool {
        self.contains(PathFlags::PARTIAL_PATH)
    }
}

impl core::ops::BitOr for PathFlags {
    type Output = PathFlags;

    fn bitor(self, rhs: PathFlags) -> PathFlags {
        PathFlags(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavPathResult {
    pub points: Vec<Vec3>,
    pub flags: PathFlags,
}

impl NavPathResult {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self {
            points,
            flags: PathFlags::NONE,
        }
    }

    pub fn partial(points: Vec<Vec3>) -> Self {
        Self {
            points,
            flags: PathFlags::PARTIAL_PATH,
        }
    }

    pub fn is_partial(&self) -> bool {
        self.flags.is_partial()
    }
}

/// Properties of the navigation data an agent walks on.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavMeshProperties {
    /// Up axis of the navigation surface (derived from the navmesh rotation).
    pub up: Vec3,
    /// Radius of the agent the navigation data was baked for.
    pub agent_radius: f32,
}

impl Default for NavMeshProperties {
    fn default() -> Self {
        Self {
            up: Vec3::UP,
            agent_radius: 0.0,
        }
    }
}

/// Navigation provider.
///
/// Queried read-only from behavior worker threads, so implementations must be thread-safe.
pub trait Navigator: Send + Sync {
    /// Plan a path from `start` to `goal`. `None` when no path exists at all.
    fn find_path(&self, start: Vec3, goal: Vec3) -> Option<NavPathResult>;

    /// Project a point onto the nearest navigable surface.
    fn find_closest_point(&self, point: Vec3) -> Option<Vec3>;

    fn properties(&self) -> NavMeshProperties {
        NavMeshProperties::default()
    }
}

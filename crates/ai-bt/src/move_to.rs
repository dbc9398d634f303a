//! Navigation movement leaf.
//!
//! The tree update plans a path and reports progress; the actual movement happens in the
//! per-frame pass ([`crate::NodeMemory::frame_update`]) which advances every bound state.

use ai_core::{AgentId, Vec3};
use ai_nav::NavWorldMut;

use crate::bt::{Node, NodeId, UpdateResult};
use crate::context::UpdateContext;
use crate::memory::NodeState;

/// Used when the actor exposes no collision geometry.
pub const DEFAULT_AGENT_RADIUS: f32 = 0.5;
pub const DEFAULT_AGENT_HEIGHT: f32 = 2.0;

const MIN_MOVE: f32 = 1e-6;
/// Lower bound of the waypoint acceptance radius so exact arrivals always register.
const MIN_ACCEPT_RADIUS: f32 = 1e-3;

#[derive(Debug, Clone)]
pub struct MoveTo {
    agent_selector: Option<String>,
    target_selector: Option<String>,
    goal_selector: Option<String>,
    movement_speed: f32,
    acceptable_radius: f32,
    use_pathfinding: bool,
    use_partial_path: bool,
    use_target_goal_update: bool,
    target_goal_update_tolerance: f32,
}

impl MoveTo {
    fn new() -> Self {
        Self {
            agent_selector: None,
            target_selector: None,
            goal_selector: None,
            movement_speed: 4.0,
            acceptable_radius: 0.3,
            use_pathfinding: true,
            use_partial_path: true,
            use_target_goal_update: true,
            target_goal_update_tolerance: 4.0,
        }
    }

    /// Move towards a position read from knowledge.
    pub fn to_position(selector: impl Into<String>) -> Self {
        Self {
            goal_selector: Some(selector.into()),
            ..Self::new()
        }
    }

    /// Move towards the actor referenced by a knowledge value.
    pub fn to_actor(selector: impl Into<String>) -> Self {
        Self {
            target_selector: Some(selector.into()),
            ..Self::new()
        }
    }

    /// Move the actor referenced by `selector` instead of the behavior's owner.
    pub fn with_agent(mut self, selector: impl Into<String>) -> Self {
        self.agent_selector = Some(selector.into());
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.movement_speed = speed;
        self
    }

    pub fn with_acceptable_radius(mut self, radius: f32) -> Self {
        self.acceptable_radius = radius;
        self
    }

    pub fn with_pathfinding(mut self, enabled: bool) -> Self {
        self.use_pathfinding = enabled;
        self
    }

    pub fn with_partial_path(mut self, allowed: bool) -> Self {
        self.use_partial_path = allowed;
        self
    }

    /// Re-plan when the goal moved further than `tolerance` from the planned one.
    pub fn with_goal_update(mut self, enabled: bool, tolerance: f32) -> Self {
        self.use_target_goal_update = enabled;
        self.target_goal_update_tolerance = tolerance;
        self
    }

    fn resolve_goal<W>(&self, ctx: &UpdateContext<'_, W>) -> Option<Vec3>
    where
        W: NavWorldMut + 'static,
    {
        if let Some(selector) = &self.target_selector {
            let target = ctx.resolve_actor(selector)?;
            return ctx.world.position(target);
        }
        ctx.get(self.goal_selector.as_deref()?)?.as_vec3()
    }

    fn plan<W>(&self, world: &W, state: &mut MoveToState, start: Vec3, goal: Vec3) -> bool
    where
        W: NavWorldMut,
    {
        state.path.clear();
        state.has_path = false;
        state.path_index = 1;
        state.result = UpdateResult::Running;

        if self.use_pathfinding {
            let Some(navigator) = world.navigator() else {
                tracing::debug!("move-to: no navigation provider");
                return false;
            };
            let Some(found) = navigator.find_path(start, goal) else {
                tracing::debug!(?start, ?goal, "move-to: no path");
                return false;
            };
            if found.is_partial() && !self.use_partial_path {
                tracing::debug!(?start, ?goal, "move-to: partial path refused");
                return false;
            }
            let mut points = found.points;
            let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
                return false;
            };
            if points.len() == 1 {
                points.push(last);
            }
            let end = points.len() - 1;
            points[0] = navigator.find_closest_point(first).unwrap_or(first);
            points[end] = navigator.find_closest_point(last).unwrap_or(last);

            let properties = navigator.properties();
            state.up = properties.up;
            state.nav_agent_radius = properties.agent_radius;
            state.path = points;
        } else {
            state.up = Vec3::UP;
            state.nav_agent_radius = state.agent_radius;
            state.path = vec![start, goal];
        }

        state.agent_offset = state.path[0] - start;
        state.goal_location = goal;
        state.has_path = true;
        true
    }
}

/// Runtime state of a [`MoveTo`] entry, also read by the per-frame follower.
#[derive(Debug, Clone)]
pub struct MoveToState {
    /// Stable id of the moved actor.
    pub agent: Option<u64>,
    pub goal_location: Vec3,
    pub path: Vec<Vec3>,
    pub path_index: usize,
    /// Offset from the actor position to its path projection (feet).
    pub agent_offset: Vec3,
    pub up: Vec3,
    pub nav_agent_radius: f32,
    pub agent_radius: f32,
    pub agent_height: f32,
    pub has_path: bool,
    /// Bound to the per-frame follower.
    pub has_tick: bool,
    pub result: UpdateResult,
    movement_speed: f32,
    acceptable_radius: f32,
}

impl MoveToState {
    /// Per-frame step towards the current waypoint.
    pub fn follow<W>(&mut self, world: &mut W, dt: f32)
    where
        W: NavWorldMut,
    {
        if self.result != UpdateResult::Running || !self.has_path {
            return;
        }
        let Some(agent) = self.agent.and_then(|id| world.resolve_actor(id)) else {
            self.result = UpdateResult::Failed;
            return;
        };
        let Some(position) = world.position(agent) else {
            self.result = UpdateResult::Failed;
            return;
        };
        let Some(&target) = self.path.get(self.path_index) else {
            self.result = UpdateResult::Success;
            return;
        };

        let feet = position + self.agent_offset;
        let last_segment = self.path_index + 1 >= self.path.len();
        let test_radius = if last_segment {
            self.agent_radius + self.acceptable_radius
        } else {
            0.05 * self.agent_radius + (self.agent_radius - self.nav_agent_radius).max(0.0)
        }
        .max(MIN_ACCEPT_RADIUS);
        let test_height = self.agent_height * 1.05;

        let (vertical, planar) = (target - feet).split_along(self.up);
        if planar.length() <= test_radius && vertical.abs() <= test_height {
            self.path_index += 1;
            if self.path_index >= self.path.len() {
                self.result = UpdateResult::Success;
            }
            return;
        }

        let max_move = self.movement_speed * dt;
        if max_move <= MIN_MOVE {
            return;
        }
        let delta = feet.move_towards(target, max_move) - feet;
        if !world.add_movement(agent, delta) {
            self.result = UpdateResult::Failed;
        }
    }
}

impl<W> Node<W> for MoveTo
where
    W: NavWorldMut + 'static,
{
    fn name(&self) -> &'static str {
        "MoveTo"
    }

    fn init_state(&self, ctx: &mut UpdateContext<'_, W>, _id: NodeId) -> NodeState {
        let agent = match &self.agent_selector {
            Some(selector) => ctx.resolve_actor(selector),
            None => Some(ctx.agent),
        };
        let (agent_radius, agent_height) = agent
            .and_then(|a| ctx.world.geometry(a))
            .map(|g| g.radius_height())
            .unwrap_or((DEFAULT_AGENT_RADIUS, DEFAULT_AGENT_HEIGHT));

        NodeState::MoveTo(Box::new(MoveToState {
            agent: agent.map(AgentId::stable_id),
            goal_location: Vec3::ZERO,
            path: Vec::new(),
            path_index: 1,
            agent_offset: Vec3::ZERO,
            up: Vec3::UP,
            nav_agent_radius: agent_radius,
            agent_radius,
            agent_height,
            has_path: false,
            has_tick: false,
            result: UpdateResult::Running,
            movement_speed: self.movement_speed,
            acceptable_radius: self.acceptable_radius,
        }))
    }

    fn release_state(&self, ctx: &mut UpdateContext<'_, W>, id: NodeId) {
        if let Some(NodeState::MoveTo(state)) = ctx.state_mut(id) {
            state.has_tick = false;
        }
    }

    fn update(&self, ctx: &mut UpdateContext<'_, W>, id: NodeId) -> UpdateResult {
        let goal = self.resolve_goal(ctx);
        let agent_id = match ctx.state(id) {
            Some(NodeState::MoveTo(state)) => state.agent,
            _ => None,
        };
        let Some(agent) = agent_id.and_then(|stable| ctx.world.resolve_actor(stable)) else {
            return UpdateResult::Failed;
        };
        let Some(position) = ctx.world.position(agent) else {
            return UpdateResult::Failed;
        };
        let Some(goal) = goal else {
            return UpdateResult::Failed;
        };

        let (world, state) = ctx.world_and_state_mut(id);
        let Some(NodeState::MoveTo(state)) = state else {
            return UpdateResult::Failed;
        };
        let replan = !state.has_path
            || (self.use_target_goal_update
                && goal.distance(state.goal_location) > self.target_goal_update_tolerance);
        if replan && !self.plan(&*world, state, position, goal) {
            state.result = UpdateResult::Failed;
            return UpdateResult::Failed;
        }
        state.has_tick = true;
        state.result
    }
}

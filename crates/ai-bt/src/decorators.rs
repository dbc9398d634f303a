//! Decorators attached to nodes.
//!
//! Result rewriting happens in `post_update`; entry filters live in `can_update`.

use ai_core::{compare, CompareOp, Variant};
use ai_nav::NavWorldMut;

use crate::bt::{Decorator, NodeId, UpdateResult};
use crate::context::UpdateContext;
use crate::memory::NodeState;
use crate::nodes::{roll_duration, TIME_EPSILON};

/// Swaps `Success` and `Failed`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Invert;

impl<W> Decorator<W> for Invert
where
    W: NavWorldMut + 'static,
{
    fn name(&self) -> &'static str {
        "Invert"
    }

    fn post_update(&self, _ctx: &mut UpdateContext<'_, W>, _id: NodeId, result: &mut UpdateResult) {
        *result = match *result {
            UpdateResult::Success => UpdateResult::Failed,
            UpdateResult::Failed => UpdateResult::Success,
            UpdateResult::Running => UpdateResult::Running,
        };
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ForceSuccess;

impl<W> Decorator<W> for ForceSuccess
where
    W: NavWorldMut + 'static,
{
    fn name(&self) -> &'static str {
        "ForceSuccess"
    }

    fn post_update(&self, _ctx: &mut UpdateContext<'_, W>, _id: NodeId, result: &mut UpdateResult) {
        if *result != UpdateResult::Running {
            *result = UpdateResult::Success;
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ForceFailed;

impl<W> Decorator<W> for ForceFailed
where
    W: NavWorldMut + 'static,
{
    fn name(&self) -> &'static str {
        "ForceFailed"
    }

    fn post_update(&self, _ctx: &mut UpdateContext<'_, W>, _id: NodeId, result: &mut UpdateResult) {
        if *result != UpdateResult::Running {
            *result = UpdateResult::Failed;
        }
    }
}

/// Re-enters the decorated node until it succeeded `count` times (or forever).
#[derive(Debug, Clone)]
pub struct Loop {
    count: u32,
    infinite: bool,
    count_selector: Option<String>,
}

impl Loop {
    pub fn times(count: u32) -> Self {
        Self {
            count: count.max(1),
            infinite: false,
            count_selector: None,
        }
    }

    pub fn infinite() -> Self {
        Self {
            count: 1,
            infinite: true,
            count_selector: None,
        }
    }

    /// Read the iteration count from knowledge, falling back to the configured count.
    pub fn from_knowledge(mut self, selector: impl Into<String>) -> Self {
        self.count_selector = Some(selector.into());
        self
    }
}

impl<W> Decorator<W> for Loop
where
    W: NavWorldMut + 'static,
{
    fn name(&self) -> &'static str {
        "Loop"
    }

    fn init_state(&self, ctx: &mut UpdateContext<'_, W>, _id: NodeId) -> NodeState {
        if self.infinite {
            return NodeState::Loop { loops_left: None };
        }
        let count = self
            .count_selector
            .as_deref()
            .and_then(|path| ctx.knowledge.get_f32(path))
            .filter(|n| n.is_finite())
            .map(|n| n.max(1.0) as u32)
            .unwrap_or(self.count);
        NodeState::Loop {
            loops_left: Some(count),
        }
    }

    fn post_update(&self, ctx: &mut UpdateContext<'_, W>, id: NodeId, result: &mut UpdateResult) {
        if *result != UpdateResult::Success {
            return;
        }
        let Some(NodeState::Loop { loops_left }) = ctx.state_mut(id) else {
            return;
        };
        let again = match loops_left {
            Some(left) => {
                *left = left.saturating_sub(1);
                *left > 0
            }
            None => true,
        };
        if !again {
            return;
        }
        let Some(node) = ctx.tree().parent(id) else {
            return;
        };
        *result = UpdateResult::Running;
        ctx.restage(node, id);
    }
}

/// Fails the decorated node once a rolled duration has elapsed.
#[derive(Debug, Clone)]
pub struct TimeLimit {
    max_duration: f32,
    random_range: f32,
    duration_selector: Option<String>,
}

impl TimeLimit {
    pub fn new(max_duration: f32) -> Self {
        Self {
            max_duration,
            random_range: 0.0,
            duration_selector: None,
        }
    }

    pub fn with_random_range(mut self, range: f32) -> Self {
        self.random_range = range;
        self
    }

    pub fn from_knowledge(mut self, selector: impl Into<String>) -> Self {
        self.duration_selector = Some(selector.into());
        self
    }
}

impl<W> Decorator<W> for TimeLimit
where
    W: NavWorldMut + 'static,
{
    fn name(&self) -> &'static str {
        "TimeLimit"
    }

    fn init_state(&self, ctx: &mut UpdateContext<'_, W>, _id: NodeId) -> NodeState {
        NodeState::Timer {
            time_left: roll_duration(
                ctx,
                self.max_duration,
                self.random_range,
                self.duration_selector.as_deref(),
            ),
        }
    }

    fn update(&self, ctx: &mut UpdateContext<'_, W>, id: NodeId) -> UpdateResult {
        let dt = ctx.delta_time;
        let Some(NodeState::Timer { time_left }) = ctx.state_mut(id) else {
            return UpdateResult::Failed;
        };
        *time_left -= dt;
        if *time_left <= TIME_EPSILON {
            UpdateResult::Failed
        } else {
            UpdateResult::Success
        }
    }
}

/// Blocks re-entry of the decorated node for a rolled duration after it finished.
///
/// The cooldown keeps its state when its node is released, so the end time survives the parent
/// being re-entered.
#[derive(Debug, Clone)]
pub struct Cooldown {
    min_duration: f32,
    random_range: f32,
    duration_selector: Option<String>,
}

impl Cooldown {
    pub fn new(min_duration: f32) -> Self {
        Self {
            min_duration,
            random_range: 0.0,
            duration_selector: None,
        }
    }

    pub fn with_random_range(mut self, range: f32) -> Self {
        self.random_range = range;
        self
    }

    pub fn from_knowledge(mut self, selector: impl Into<String>) -> Self {
        self.duration_selector = Some(selector.into());
        self
    }
}

impl<W> Decorator<W> for Cooldown
where
    W: NavWorldMut + 'static,
{
    fn name(&self) -> &'static str {
        "Cooldown"
    }

    fn init_state(&self, _ctx: &mut UpdateContext<'_, W>, _id: NodeId) -> NodeState {
        NodeState::Cooldown {
            end_time: f32::NEG_INFINITY,
        }
    }

    fn release_state(&self, ctx: &mut UpdateContext<'_, W>, id: NodeId) {
        ctx.retain(id);
    }

    fn can_update(&self, ctx: &mut UpdateContext<'_, W>, id: NodeId) -> bool {
        match ctx.state(id) {
            Some(NodeState::Cooldown { end_time }) => *end_time <= ctx.time,
            _ => true,
        }
    }

    fn post_update(&self, ctx: &mut UpdateContext<'_, W>, id: NodeId, result: &mut UpdateResult) {
        if *result == UpdateResult::Running {
            return;
        }
        let duration = roll_duration(
            ctx,
            self.min_duration,
            self.random_range,
            self.duration_selector.as_deref(),
        );
        let now = ctx.time;
        if let Some(NodeState::Cooldown { end_time }) = ctx.state_mut(id) {
            *end_time = now + duration;
        }
    }
}

/// Compares a knowledge value against a constant.
#[derive(Debug, Clone)]
pub struct KnowledgeConditional {
    selector: String,
    op: CompareOp,
    value: f32,
}

impl KnowledgeConditional {
    pub fn new(selector: impl Into<String>, op: CompareOp, value: f32) -> Self {
        Self {
            selector: selector.into(),
            op,
            value,
        }
    }
}

impl<W> Decorator<W> for KnowledgeConditional
where
    W: NavWorldMut + 'static,
{
    fn name(&self) -> &'static str {
        "KnowledgeConditional"
    }

    fn can_update(&self, ctx: &mut UpdateContext<'_, W>, _id: NodeId) -> bool {
        match ctx.get(&self.selector) {
            Some(value) => compare(&value, &Variant::Float(self.value), self.op),
            None => false,
        }
    }
}

/// Compares two knowledge values.
#[derive(Debug, Clone)]
pub struct KnowledgeValuesConditional {
    a: String,
    b: String,
    op: CompareOp,
}

impl KnowledgeValuesConditional {
    pub fn new(a: impl Into<String>, op: CompareOp, b: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            op,
        }
    }
}

impl<W> Decorator<W> for KnowledgeValuesConditional
where
    W: NavWorldMut + 'static,
{
    fn name(&self) -> &'static str {
        "KnowledgeValuesConditional"
    }

    fn can_update(&self, ctx: &mut UpdateContext<'_, W>, _id: NodeId) -> bool {
        let (Some(a), Some(b)) = (ctx.get(&self.a), ctx.get(&self.b)) else {
            return false;
        };
        compare(&a, &b, self.op)
    }
}

/// Passes when a knowledge value is truthy (non-null, non-zero), XOR `invert`.
///
/// An unresolved selector never passes.
#[derive(Debug, Clone)]
pub struct KnowledgeBoolean {
    selector: String,
    invert: bool,
}

impl KnowledgeBoolean {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            invert: false,
        }
    }

    pub fn inverted(mut self) -> Self {
        self.invert = !self.invert;
        self
    }
}

impl<W> Decorator<W> for KnowledgeBoolean
where
    W: NavWorldMut + 'static,
{
    fn name(&self) -> &'static str {
        "KnowledgeBoolean"
    }

    fn can_update(&self, ctx: &mut UpdateContext<'_, W>, _id: NodeId) -> bool {
        match ctx.get(&self.selector) {
            Some(value) => value.is_truthy() != self.invert,
            None => false,
        }
    }
}

/// Passes when an actor carries a tag, XOR `invert`. Defaults to the behavior's owner.
#[derive(Debug, Clone)]
pub struct HasTag {
    tag: String,
    actor_selector: Option<String>,
    invert: bool,
}

impl HasTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            actor_selector: None,
            invert: false,
        }
    }

    pub fn on_actor(mut self, selector: impl Into<String>) -> Self {
        self.actor_selector = Some(selector.into());
        self
    }

    pub fn inverted(mut self) -> Self {
        self.invert = !self.invert;
        self
    }
}

impl<W> Decorator<W> for HasTag
where
    W: NavWorldMut + 'static,
{
    fn name(&self) -> &'static str {
        "HasTag"
    }

    fn can_update(&self, ctx: &mut UpdateContext<'_, W>, _id: NodeId) -> bool {
        let actor = match &self.actor_selector {
            Some(selector) => ctx.resolve_actor(selector),
            None => Some(ctx.agent),
        };
        match actor {
            Some(actor) => ctx.world.has_tag(actor, &self.tag) != self.invert,
            None => false,
        }
    }
}

/// Passes when a goal of the exact type is present.
#[derive(Debug, Clone)]
pub struct HasGoal {
    goal_type: String,
}

impl HasGoal {
    pub fn new(goal_type: impl Into<String>) -> Self {
        Self {
            goal_type: goal_type.into(),
        }
    }
}

impl<W> Decorator<W> for HasGoal
where
    W: NavWorldMut + 'static,
{
    fn name(&self) -> &'static str {
        "HasGoal"
    }

    fn can_update(&self, ctx: &mut UpdateContext<'_, W>, _id: NodeId) -> bool {
        ctx.knowledge.has_goal(&self.goal_type)
    }
}

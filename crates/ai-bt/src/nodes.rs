use ai_core::DeterministicRng;
use ai_nav::NavWorldMut;

use crate::bt::{Node, NodeId, UpdateResult};
use crate::context::UpdateContext;
use crate::memory::NodeState;

/// Remaining time at or below which a timer counts as elapsed.
pub const TIME_EPSILON: f32 = 1e-5;

/// Roll a duration, taking the base from `selector` when it resolves to a number.
pub(crate) fn roll_duration<W>(
    ctx: &mut UpdateContext<'_, W>,
    base: f32,
    spread: f32,
    selector: Option<&str>,
) -> f32
where
    W: NavWorldMut + 'static,
{
    let base = selector
        .and_then(|path| ctx.knowledge.get_f32(path))
        .unwrap_or(base);
    ctx.knowledge.rng_mut().roll_duration(base, spread)
}

fn current_child<W>(ctx: &UpdateContext<'_, W>, id: NodeId) -> Option<i32>
where
    W: NavWorldMut + 'static,
{
    match ctx.state(id) {
        Some(NodeState::Compound { current }) => Some(*current),
        _ => None,
    }
}

fn set_current_child<W>(ctx: &mut UpdateContext<'_, W>, id: NodeId, index: i32)
where
    W: NavWorldMut + 'static,
{
    if let Some(NodeState::Compound { current }) = ctx.state_mut(id) {
        *current = index;
    }
}

pub(crate) fn update_sequence<W>(ctx: &mut UpdateContext<'_, W>, id: NodeId) -> UpdateResult
where
    W: NavWorldMut + 'static,
{
    let Some(current) = current_child(ctx, id) else {
        return UpdateResult::Failed;
    };
    if current < 0 {
        return UpdateResult::Failed;
    }
    let children = ctx.tree().children(id);
    let Some(&child) = children.get(current as usize) else {
        return UpdateResult::Success;
    };

    match ctx.invoke_update(child) {
        UpdateResult::Success => {
            let next = current + 1;
            set_current_child(ctx, id, next);
            if (next as usize) < children.len() {
                UpdateResult::Running
            } else {
                UpdateResult::Success
            }
        }
        UpdateResult::Running => UpdateResult::Running,
        UpdateResult::Failed => {
            set_current_child(ctx, id, -1);
            UpdateResult::Failed
        }
    }
}

/// Tree root: a sequence over the top-level nodes.
pub struct Root;

impl<W> Node<W> for Root
where
    W: NavWorldMut + 'static,
{
    fn name(&self) -> &'static str {
        "Root"
    }

    fn is_compound(&self) -> bool {
        true
    }

    fn init_state(&self, _ctx: &mut UpdateContext<'_, W>, _id: NodeId) -> NodeState {
        NodeState::Compound { current: 0 }
    }

    fn update(&self, ctx: &mut UpdateContext<'_, W>, id: NodeId) -> UpdateResult {
        update_sequence(ctx, id)
    }
}

/// Runs children in order. Fails on the first failed child, succeeds when all succeed.
pub struct Sequence;

impl<W> Node<W> for Sequence
where
    W: NavWorldMut + 'static,
{
    fn name(&self) -> &'static str {
        "Sequence"
    }

    fn is_compound(&self) -> bool {
        true
    }

    fn init_state(&self, _ctx: &mut UpdateContext<'_, W>, _id: NodeId) -> NodeState {
        NodeState::Compound { current: 0 }
    }

    fn update(&self, ctx: &mut UpdateContext<'_, W>, id: NodeId) -> UpdateResult {
        update_sequence(ctx, id)
    }
}

/// Runs children in order. Succeeds on the first successful child, fails when all fail.
pub struct Selector;

impl<W> Node<W> for Selector
where
    W: NavWorldMut + 'static,
{
    fn name(&self) -> &'static str {
        "Selector"
    }

    fn is_compound(&self) -> bool {
        true
    }

    fn init_state(&self, _ctx: &mut UpdateContext<'_, W>, _id: NodeId) -> NodeState {
        NodeState::Compound { current: 0 }
    }

    fn update(&self, ctx: &mut UpdateContext<'_, W>, id: NodeId) -> UpdateResult {
        let Some(current) = current_child(ctx, id) else {
            return UpdateResult::Failed;
        };
        if current < 0 {
            return UpdateResult::Failed;
        }
        let children = ctx.tree().children(id);
        let Some(&child) = children.get(current as usize) else {
            return UpdateResult::Failed;
        };

        match ctx.invoke_update(child) {
            UpdateResult::Success => UpdateResult::Success,
            UpdateResult::Running => UpdateResult::Running,
            UpdateResult::Failed => {
                let next = current + 1;
                set_current_child(ctx, id, next);
                if (next as usize) < children.len() {
                    UpdateResult::Running
                } else {
                    UpdateResult::Failed
                }
            }
        }
    }
}

/// Waits for a duration rolled when the node is entered.
#[derive(Debug, Clone)]
pub struct Delay {
    wait_time: f32,
    random_range: f32,
    wait_time_selector: Option<String>,
}

impl Delay {
    pub fn new(wait_time: f32) -> Self {
        Self {
            wait_time,
            random_range: 0.0,
            wait_time_selector: None,
        }
    }

    /// Spread the wait uniformly over `wait_time ± range`.
    pub fn with_random_range(mut self, range: f32) -> Self {
        self.random_range = range;
        self
    }

    /// Read the wait time from knowledge, falling back to the configured value.
    pub fn from_knowledge(mut self, selector: impl Into<String>) -> Self {
        self.wait_time_selector = Some(selector.into());
        self
    }
}

impl<W> Node<W> for Delay
where
    W: NavWorldMut + 'static,
{
    fn name(&self) -> &'static str {
        "Delay"
    }

    fn init_state(&self, ctx: &mut UpdateContext<'_, W>, _id: NodeId) -> NodeState {
        NodeState::Timer {
            time_left: roll_duration(
                ctx,
                self.wait_time,
                self.random_range,
                self.wait_time_selector.as_deref(),
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
            UpdateResult::Success
        } else {
            UpdateResult::Running
        }
    }
}

/// Stops the owning behavior with a fixed result once the current period completes.
#[derive(Debug, Clone, Copy)]
pub struct ForceFinish {
    result: UpdateResult,
}

impl ForceFinish {
    pub fn success() -> Self {
        Self {
            result: UpdateResult::Success,
        }
    }

    pub fn failed() -> Self {
        Self {
            result: UpdateResult::Failed,
        }
    }
}

impl<W> Node<W> for ForceFinish
where
    W: NavWorldMut + 'static,
{
    fn name(&self) -> &'static str {
        "ForceFinish"
    }

    fn update(&self, ctx: &mut UpdateContext<'_, W>, _id: NodeId) -> UpdateResult {
        ctx.request_stop(self.result);
        self.result
    }
}

/// Leaf running a host closure.
pub struct Action<F> {
    name: &'static str,
    run: F,
}

impl<F> Action<F> {
    pub fn new<W>(name: &'static str, run: F) -> Self
    where
        W: NavWorldMut + 'static,
        F: Fn(&mut UpdateContext<'_, W>) -> UpdateResult + Send + Sync + 'static,
    {
        Self { name, run }
    }
}

impl<W, F> Node<W> for Action<F>
where
    W: NavWorldMut + 'static,
    F: Fn(&mut UpdateContext<'_, W>) -> UpdateResult + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn update(&self, ctx: &mut UpdateContext<'_, W>, _id: NodeId) -> UpdateResult {
        (self.run)(ctx)
    }
}

/// Leaf that succeeds when a host predicate holds.
pub struct Condition<F> {
    name: &'static str,
    predicate: F,
}

impl<F> Condition<F> {
    pub fn new<W>(name: &'static str, predicate: F) -> Self
    where
        W: NavWorldMut + 'static,
        F: Fn(&UpdateContext<'_, W>) -> bool + Send + Sync + 'static,
    {
        Self { name, predicate }
    }
}

impl<W, F> Node<W> for Condition<F>
where
    W: NavWorldMut + 'static,
    F: Fn(&UpdateContext<'_, W>) -> bool + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn update(&self, ctx: &mut UpdateContext<'_, W>, _id: NodeId) -> UpdateResult {
        if (self.predicate)(ctx) {
            UpdateResult::Success
        } else {
            UpdateResult::Failed
        }
    }
}

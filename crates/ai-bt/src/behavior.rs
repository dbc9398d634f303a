//! Behavior instance: one tree running for one actor.

use std::sync::Arc;

use ai_core::{derive_seed, AgentId, TypeRegistry};
use ai_nav::NavWorldMut;
use ai_tools::Diagnostic;

use crate::bt::UpdateResult;
use crate::config::BehaviorSettings;
use crate::context::UpdateContext;
use crate::error::{BehaviorError, Result};
use crate::events::OutgoingEvent;
use crate::knowledge::Knowledge;
use crate::memory::NodeMemory;
use crate::tree::BehaviorTree;

const RNG_STREAM: u64 = 0x6274;

pub const START_REFUSED: &str = "bt.start";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicState {
    Idle,
    Running,
    Stopped,
}

type FinishedCallback = Box<dyn FnMut(UpdateResult) + Send>;
type EventCallback = Box<dyn FnMut(&OutgoingEvent) + Send>;

pub struct Behavior<W>
where
    W: NavWorldMut + 'static,
{
    agent: W::Agent,
    tree: Option<Arc<BehaviorTree<W>>>,
    settings: BehaviorSettings,
    knowledge: Knowledge,
    knowledge_version: Option<u64>,
    memory: NodeMemory,
    state: LogicState,
    accumulated_time: f32,
    total_time: f32,
    last_result: UpdateResult,
    pending_stop: Option<UpdateResult>,
    finished_count: u64,
    on_finished: Option<FinishedCallback>,
    on_event: Option<EventCallback>,
}

impl<W> Behavior<W>
where
    W: NavWorldMut + 'static,
{
    pub fn new(agent: W::Agent, tree: Arc<BehaviorTree<W>>) -> Self {
        Self::with_settings(
            agent,
            Some(tree),
            BehaviorSettings::default(),
            Arc::new(TypeRegistry::new()),
        )
    }

    pub fn with_settings(
        agent: W::Agent,
        tree: Option<Arc<BehaviorTree<W>>>,
        settings: BehaviorSettings,
        types: Arc<TypeRegistry>,
    ) -> Self {
        let seed = derive_seed(settings.seed, agent.stable_id(), RNG_STREAM);
        let mut knowledge = Knowledge::new(types, seed);
        if let Some(tree) = &tree {
            knowledge.configure(tree.root_settings());
        }
        Self {
            agent,
            tree,
            settings,
            knowledge,
            knowledge_version: None,
            memory: NodeMemory::default(),
            state: LogicState::Idle,
            accumulated_time: 0.0,
            total_time: 0.0,
            last_result: UpdateResult::Success,
            pending_stop: None,
            finished_count: 0,
            on_finished: None,
            on_event: None,
        }
    }

    pub fn agent(&self) -> W::Agent {
        self.agent
    }

    pub fn tree(&self) -> Option<&Arc<BehaviorTree<W>>> {
        self.tree.as_ref()
    }

    pub fn settings(&self) -> &BehaviorSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut BehaviorSettings {
        &mut self.settings
    }

    pub fn knowledge(&self) -> &Knowledge {
        &self.knowledge
    }

    pub fn knowledge_mut(&mut self) -> &mut Knowledge {
        &mut self.knowledge
    }

    pub fn memory(&self) -> &NodeMemory {
        &self.memory
    }

    pub fn state(&self) -> LogicState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LogicState::Running
    }

    pub fn has_pending_stop(&self) -> bool {
        self.pending_stop.is_some()
    }

    pub fn last_result(&self) -> UpdateResult {
        self.last_result
    }

    /// How many times the tree finished (stops included).
    pub fn finished_count(&self) -> u64 {
        self.finished_count
    }

    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    pub fn accumulated_time(&self) -> f32 {
        self.accumulated_time
    }

    pub fn on_finished(&mut self, callback: impl FnMut(UpdateResult) + Send + 'static) {
        self.on_finished = Some(Box::new(callback));
    }

    /// Handler for outgoing events; async events are delivered right after each tick.
    pub fn on_event(&mut self, callback: impl FnMut(&OutgoingEvent) + Send + 'static) {
        self.on_event = Some(Box::new(callback));
    }

    /// Replace the tree. A running instance releases its nodes now and resets its knowledge
    /// before the next tick.
    pub fn set_tree(&mut self, world: &mut W, tree: Arc<BehaviorTree<W>>) {
        if self.is_running() {
            self.release_nodes(world);
        } else {
            self.knowledge.configure(tree.root_settings());
        }
        self.tree = Some(tree);
    }

    pub fn start_logic(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        let Some(tree) = self.tree.clone() else {
            return Err(self.refuse_start(BehaviorError::EmptyTree));
        };
        let root = tree.root_settings();
        self.knowledge.configure(root);
        self.knowledge.install_default_blackboard(root);
        if let Some(expected) = &root.blackboard_type {
            let actual = self.knowledge.blackboard().type_name().to_string();
            if !self.knowledge.types().is_assignable(&actual, expected) {
                return Err(self.refuse_start(BehaviorError::BlackboardTypeMismatch {
                    expected: expected.clone(),
                    actual,
                }));
            }
        }

        self.memory = NodeMemory::new(tree.len());
        self.knowledge_version = Some(tree.version());
        self.knowledge.take_stop_request();
        self.pending_stop = None;
        self.accumulated_time = 0.0;
        self.total_time = 0.0;
        self.state = LogicState::Running;
        tracing::debug!(agent = self.agent.stable_id(), tree = %tree.name(), "behavior started");
        Ok(())
    }

    fn refuse_start(&mut self, error: BehaviorError) -> BehaviorError {
        tracing::error!(agent = self.agent.stable_id(), %error, "behavior refused to start");
        self.knowledge.report(
            Diagnostic::error(START_REFUSED)
                .at(self.total_time)
                .with_message(error.to_string()),
        );
        error
    }

    /// Stop now: release every relevant node, end active events and fire `finished`.
    pub fn stop_logic(&mut self, world: &mut W, result: UpdateResult) {
        if !self.is_running() {
            return;
        }
        self.halt(world);
        self.last_result = result;
        self.state = LogicState::Stopped;
        self.dispatch_async();
        tracing::debug!(agent = self.agent.stable_id(), ?result, "behavior stopped");
        self.fire_finished(result);
    }

    /// Stop at the next tick boundary.
    pub fn request_stop(&mut self, result: UpdateResult) -> Result<()> {
        if !self.is_running() {
            return Err(BehaviorError::NotStarted);
        }
        self.pending_stop.get_or_insert(result);
        Ok(())
    }

    /// Return to a freshly created state: goals cleared, blackboard back to its default.
    ///
    /// A running instance is restarted without firing `finished`.
    pub fn reset_logic(&mut self, world: &mut W) -> Result<()> {
        let was_running = self.is_running();
        if was_running {
            self.halt(world);
        }
        match &self.tree {
            Some(tree) => self.knowledge.reset(tree.root_settings()),
            None => self.knowledge.clear_goals(),
        }
        self.memory = NodeMemory::default();
        self.knowledge_version = None;
        self.accumulated_time = 0.0;
        self.total_time = 0.0;
        self.last_result = UpdateResult::Success;
        self.state = LogicState::Idle;
        tracing::debug!(agent = self.agent.stable_id(), "behavior reset");
        if was_running {
            self.start_logic()?;
        }
        Ok(())
    }

    /// Advance the instance clock, running one tree update per elapsed period.
    pub fn tick(&mut self, world: &mut W, dt: f32) {
        if let Some(result) = self.pending_stop.take() {
            self.stop_logic(world, result);
            return;
        }
        if !self.is_running() {
            return;
        }
        let Some(tree) = self.tree.clone() else {
            return;
        };
        if self.knowledge_version != Some(tree.version()) {
            self.resync(&tree);
        }

        let scale = self.settings.update_rate_scale.max(0.0);
        self.accumulated_time += dt.max(0.0) * scale;
        let fps = tree.root_settings().update_fps;
        let period = if fps > 0.0 {
            1.0 / fps
        } else {
            self.accumulated_time
        };
        if period <= 0.0 {
            return;
        }

        let max_updates = self.settings.max_updates_per_tick.max(1);
        let mut updates = 0;
        while self.accumulated_time >= period {
            if updates >= max_updates {
                self.accumulated_time %= period;
                break;
            }
            self.accumulated_time -= period;
            let result = self.update_period(world, &tree, period);
            self.total_time += period;
            updates += 1;

            if let Some(stop) = self.knowledge.take_stop_request() {
                self.stop_logic(world, stop);
                break;
            }
            if result != UpdateResult::Running {
                if !self.settings.looping {
                    self.stop_logic(world, result);
                    break;
                }
                self.last_result = result;
                self.fire_finished(result);
            }
        }
        self.dispatch_async();
    }

    /// Per-frame pass driving movement of bound MoveTo nodes.
    pub fn frame_update(&mut self, world: &mut W, dt: f32) {
        if self.is_running() {
            self.memory.frame_update(world, dt);
        }
    }

    /// Buffer an externally raised event for the next tick. Ignored unless running.
    pub fn push_event(&mut self, name: impl Into<String>, is_async: bool) {
        if !self.is_running() {
            return;
        }
        self.knowledge.events_mut().push(name, is_async);
    }

    /// Deliver queued events to the `on_event` handler.
    pub fn dispatch_events(&mut self, on_main_thread: bool) -> usize {
        let Some(handler) = self.on_event.as_mut() else {
            return 0;
        };
        self.knowledge
            .events_mut()
            .dispatch(on_main_thread, |event| handler(event))
    }

    /// Deliver queued events to `deliver` instead of the `on_event` handler.
    pub fn dispatch_events_with(
        &mut self,
        on_main_thread: bool,
        deliver: impl FnMut(&OutgoingEvent),
    ) -> usize {
        self.knowledge.events_mut().dispatch(on_main_thread, deliver)
    }

    fn dispatch_async(&mut self) {
        self.dispatch_events(false);
    }

    fn update_period(&mut self, world: &mut W, tree: &BehaviorTree<W>, period: f32) -> UpdateResult {
        self.knowledge.events_mut().begin_tick();
        let result = UpdateContext::new(
            tree,
            &mut self.memory,
            world,
            self.agent,
            &mut self.knowledge,
            period,
            self.total_time,
        )
        .with_max_depth(self.settings.max_call_depth)
        .invoke_update(tree.root_id());
        self.knowledge.events_mut().end_tick();
        debug_assert!(self.memory.is_consistent());
        result
    }

    fn resync(&mut self, tree: &BehaviorTree<W>) {
        tracing::debug!(
            agent = self.agent.stable_id(),
            tree = %tree.name(),
            version = tree.version(),
            "tree changed, resetting knowledge"
        );
        self.memory = NodeMemory::new(tree.len());
        self.knowledge.reset(tree.root_settings());
        self.knowledge.events_mut().end_all();
        self.knowledge_version = Some(tree.version());
    }

    fn release_nodes(&mut self, world: &mut W) {
        let Some(tree) = self.tree.clone() else {
            return;
        };
        if self.memory.len() == tree.len() {
            UpdateContext::new(
                &tree,
                &mut self.memory,
                world,
                self.agent,
                &mut self.knowledge,
                0.0,
                self.total_time,
            )
            .with_max_depth(self.settings.max_call_depth)
            .release_all();
        }
        self.memory = NodeMemory::default();
    }

    fn halt(&mut self, world: &mut W) {
        self.release_nodes(world);
        self.knowledge.events_mut().end_all();
        self.knowledge.take_stop_request();
        self.pending_stop = None;
    }

    fn fire_finished(&mut self, result: UpdateResult) {
        self.finished_count += 1;
        tracing::debug!(agent = self.agent.stable_id(), ?result, "behavior finished");
        if let Some(callback) = self.on_finished.as_mut() {
            callback(result);
        }
    }
}

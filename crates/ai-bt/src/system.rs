//! Scheduler owning the behavior instances of a world.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use ai_core::{AgentId, TypeRegistry};
use ai_nav::NavWorldMut;

use crate::behavior::Behavior;
use crate::config::BehaviorSystemConfig;
use crate::events::OutgoingEvent;
use crate::tree::BehaviorTree;

/// Behavior instances keyed and ticked in agent stable-id order.
pub struct BehaviorSystem<W>
where
    W: NavWorldMut + 'static,
{
    config: BehaviorSystemConfig,
    types: Arc<TypeRegistry>,
    behaviors: BTreeMap<u64, Behavior<W>>,
    main_thread: ThreadId,
}

impl<W> BehaviorSystem<W>
where
    W: NavWorldMut + 'static,
{
    /// The calling thread becomes the main thread for synchronous event delivery.
    pub fn new(config: BehaviorSystemConfig) -> Self {
        Self {
            config,
            types: Arc::new(TypeRegistry::new()),
            behaviors: BTreeMap::new(),
            main_thread: thread::current().id(),
        }
    }

    pub fn with_types(mut self, types: TypeRegistry) -> Self {
        self.types = Arc::new(types);
        self
    }

    pub fn config(&self) -> &BehaviorSystemConfig {
        &self.config
    }

    /// Create an instance for `agent`, replacing any previous one.
    pub fn spawn(&mut self, agent: W::Agent, tree: Arc<BehaviorTree<W>>) -> &mut Behavior<W> {
        let behavior = Behavior::with_settings(
            agent,
            Some(tree),
            self.config.settings(),
            Arc::clone(&self.types),
        );
        match self.behaviors.entry(agent.stable_id()) {
            Entry::Occupied(mut entry) => {
                tracing::debug!(agent = agent.stable_id(), "behavior replaced");
                entry.insert(behavior);
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                tracing::debug!(agent = agent.stable_id(), "behavior spawned");
                entry.insert(behavior)
            }
        }
    }

    pub fn insert(&mut self, behavior: Behavior<W>) -> Option<Behavior<W>> {
        self.behaviors.insert(behavior.agent().stable_id(), behavior)
    }

    pub fn remove(&mut self, agent: W::Agent) -> Option<Behavior<W>> {
        self.behaviors.remove(&agent.stable_id())
    }

    pub fn get(&self, agent: W::Agent) -> Option<&Behavior<W>> {
        self.behaviors.get(&agent.stable_id())
    }

    pub fn get_mut(&mut self, agent: W::Agent) -> Option<&mut Behavior<W>> {
        self.behaviors.get_mut(&agent.stable_id())
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Behavior<W>> {
        self.behaviors.values()
    }

    /// Start every idle or stopped instance. Returns how many are running afterwards.
    pub fn start_all(&mut self) -> usize {
        self.behaviors
            .values_mut()
            .filter_map(|b| b.start_logic().ok())
            .count()
    }

    /// Tick every live instance: started and owned by an enabled actor.
    ///
    /// Deferred stops are applied even when the actor is disabled.
    pub fn tick(&mut self, world: &mut W, dt: f32) {
        for behavior in self.behaviors.values_mut() {
            if !behavior.is_running() {
                continue;
            }
            if world.is_enabled(behavior.agent()) || behavior.has_pending_stop() {
                behavior.tick(world, dt);
            }
        }
    }

    pub fn frame_update(&mut self, world: &mut W, dt: f32) {
        for behavior in self.behaviors.values_mut() {
            if world.is_enabled(behavior.agent()) {
                behavior.frame_update(world, dt);
            }
        }
    }

    /// Drain outgoing events. Synchronous events are only delivered on the main thread.
    pub fn dispatch_events(&mut self, mut deliver: impl FnMut(W::Agent, &OutgoingEvent)) -> usize {
        let on_main_thread = thread::current().id() == self.main_thread;
        let mut delivered = 0;
        for behavior in self.behaviors.values_mut() {
            let agent = behavior.agent();
            delivered +=
                behavior.dispatch_events_with(on_main_thread, |event| deliver(agent, event));
        }
        delivered
    }
}

use std::sync::{Arc, Mutex};

use ai_bt::{
    Action, Behavior, BehaviorSystem, BehaviorSystemConfig, BehaviorTree, Delay, EventPhase,
    NodeSpec, OutgoingEvent, UpdateContext, UpdateResult,
};
use ai_core::{Vec3, WorldMut, WorldView};
use ai_nav::{NavWorldView, Navigator};

#[derive(Default)]
struct TestWorld;

impl WorldView for TestWorld {
    type Agent = u64;

    fn position(&self, _agent: u64) -> Option<Vec3> {
        Some(Vec3::ZERO)
    }

    fn resolve_actor(&self, stable_id: u64) -> Option<u64> {
        Some(stable_id)
    }
}

impl WorldMut for TestWorld {
    fn add_movement(&mut self, _agent: u64, _delta: Vec3) -> bool {
        true
    }
}

impl NavWorldView for TestWorld {
    fn navigator(&self) -> Option<&dyn Navigator> {
        None
    }
}

fn waiting_tree() -> Arc<BehaviorTree<TestWorld>> {
    Arc::new(
        BehaviorTree::builder("wait")
            .build(vec![NodeSpec::new(Delay::new(100.0))])
            .unwrap(),
    )
}

fn phases(events: &[OutgoingEvent]) -> Vec<(String, EventPhase)> {
    events.iter().map(|e| (e.name.clone(), e.phase)).collect()
}

fn drain(behavior: &mut Behavior<TestWorld>) -> Vec<OutgoingEvent> {
    let mut out = Vec::new();
    behavior.dispatch_events_with(true, |e| out.push(e.clone()));
    out
}

#[test]
fn pushed_events_live_while_they_keep_arriving() {
    let mut world = TestWorld;
    let mut behavior = Behavior::new(1, waiting_tree());
    behavior.start_logic().unwrap();

    behavior.push_event("footstep", false);
    behavior.tick(&mut world, 0.1);
    assert!(behavior.knowledge().events().is_active("footstep"));

    behavior.push_event("footstep", false);
    behavior.tick(&mut world, 0.1);
    assert!(behavior.knowledge().events().is_active("footstep"));

    behavior.tick(&mut world, 0.1);
    assert!(!behavior.knowledge().events().is_active("footstep"));

    assert_eq!(
        phases(&drain(&mut behavior)),
        vec![
            ("footstep".to_string(), EventPhase::Start),
            ("footstep".to_string(), EventPhase::End),
        ]
    );
}

#[test]
fn nodes_signal_events_during_traversal() {
    let mut world = TestWorld;
    let shout = Action::new("shout", |ctx: &mut UpdateContext<'_, TestWorld>| {
        ctx.signal_event("shout", false);
        if ctx.time >= 0.25 {
            UpdateResult::Success
        } else {
            UpdateResult::Running
        }
    });
    let tree = BehaviorTree::builder("shout")
        .build(vec![
            NodeSpec::new(shout),
            NodeSpec::new(Delay::new(100.0)),
        ])
        .unwrap();
    let mut behavior = Behavior::new(1, Arc::new(tree));
    behavior.start_logic().unwrap();

    for _ in 0..3 {
        behavior.tick(&mut world, 0.1);
        assert!(behavior.knowledge().events().is_active("shout"));
    }
    behavior.tick(&mut world, 0.1);
    behavior.tick(&mut world, 0.1);
    assert!(!behavior.knowledge().events().is_active("shout"));
    assert_eq!(drain(&mut behavior).len(), 2);
}

#[test]
fn async_events_are_delivered_right_after_the_tick() {
    let mut world = TestWorld;
    let delivered = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&delivered);

    let mut behavior = Behavior::new(1, waiting_tree());
    behavior.on_event(move |e| sink.lock().unwrap().push(e.name.clone()));
    behavior.start_logic().unwrap();

    behavior.push_event("hit", true);
    behavior.push_event("anim", false);
    behavior.tick(&mut world, 0.1);

    assert_eq!(*delivered.lock().unwrap(), vec!["hit".to_string()]);
    assert_eq!(behavior.knowledge().events().outgoing().count(), 1);

    assert_eq!(behavior.dispatch_events(true), 1);
    assert_eq!(
        *delivered.lock().unwrap(),
        vec!["hit".to_string(), "anim".to_string()]
    );
}

#[test]
fn system_keeps_synchronous_events_for_the_main_thread() {
    let mut world = TestWorld;
    let mut system = BehaviorSystem::new(BehaviorSystemConfig::default());
    let behavior = system.spawn(7, waiting_tree());
    behavior.start_logic().unwrap();
    behavior.push_event("sync", false);
    behavior.push_event("async", true);
    system.tick(&mut world, 0.1);

    let mut background = Vec::new();
    std::thread::scope(|scope| {
        scope.spawn(|| {
            system.dispatch_events(|agent, e| background.push((agent, e.name.clone())));
        });
    });
    assert_eq!(background, vec![(7, "async".to_string())]);

    let mut main = Vec::new();
    assert_eq!(
        system.dispatch_events(|agent, e| main.push((agent, e.name.clone()))),
        1
    );
    assert_eq!(main, vec![(7, "sync".to_string())]);
}

#[test]
fn events_pushed_while_not_running_are_dropped() {
    let mut world = TestWorld;
    let mut behavior = Behavior::new(1, waiting_tree());

    behavior.push_event("early", false);
    behavior.start_logic().unwrap();
    behavior.tick(&mut world, 0.1);
    assert!(!behavior.knowledge().events().is_active("early"));

    behavior.stop_logic(&mut world, UpdateResult::Success);
    behavior.push_event("late", true);
    behavior.start_logic().unwrap();
    behavior.tick(&mut world, 0.1);
    assert!(behavior.knowledge().events().active().is_empty());
    assert!(drain(&mut behavior).is_empty());
}

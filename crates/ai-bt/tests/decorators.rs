use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ai_bt::{
    Action, Behavior, BehaviorTree, Condition, Cooldown, Decorator, Delay, ForceSuccess, HasGoal,
    HasTag, Invert, Knowledge, KnowledgeBoolean, KnowledgeConditional,
    KnowledgeValuesConditional, Loop, NodeId, NodeMemory, NodeSpec, NodeState, TimeLimit,
    UpdateContext, UpdateResult,
};
use ai_core::{CompareOp, Structure, TypeRegistry, Variant, Vec3, WorldMut, WorldView};
use ai_nav::{NavWorldView, Navigator};

#[derive(Default)]
struct TestWorld {
    positions: BTreeMap<u64, Vec3>,
    tags: BTreeMap<u64, Vec<&'static str>>,
}

impl TestWorld {
    fn new() -> Self {
        let mut world = Self::default();
        world.positions.insert(1, Vec3::ZERO);
        world.positions.insert(2, Vec3::new(3.0, 0.0, 0.0));
        world.tags.insert(1, vec!["guard"]);
        world.tags.insert(2, vec!["enemy"]);
        world
    }
}

impl WorldView for TestWorld {
    type Agent = u64;

    fn position(&self, agent: u64) -> Option<Vec3> {
        self.positions.get(&agent).copied()
    }

    fn has_tag(&self, agent: u64, tag: &str) -> bool {
        self.tags.get(&agent).is_some_and(|t| t.contains(&tag))
    }

    fn resolve_actor(&self, stable_id: u64) -> Option<u64> {
        self.positions.contains_key(&stable_id).then_some(stable_id)
    }
}

impl WorldMut for TestWorld {
    fn add_movement(&mut self, _agent: u64, _delta: Vec3) -> bool {
        false
    }
}

impl NavWorldView for TestWorld {
    fn navigator(&self) -> Option<&dyn Navigator> {
        None
    }
}

type Log = Arc<Mutex<Vec<&'static str>>>;

fn mark(log: &Log, label: &'static str) -> NodeSpec<TestWorld> {
    let log = Arc::clone(log);
    NodeSpec::new(Action::new(
        label,
        move |_ctx: &mut UpdateContext<'_, TestWorld>| {
            log.lock().unwrap().push(label);
            UpdateResult::Success
        },
    ))
}

fn counter(count: &Arc<AtomicUsize>) -> NodeSpec<TestWorld> {
    let count = Arc::clone(count);
    NodeSpec::new(Action::new(
        "count",
        move |_ctx: &mut UpdateContext<'_, TestWorld>| {
            count.fetch_add(1, Ordering::SeqCst);
            UpdateResult::Success
        },
    ))
}

fn board() -> Variant {
    Variant::Structure(
        Structure::new("Board")
            .with_field("Alert", 0.0f32)
            .with_field("Health", 30.0f32)
            .with_field("Threshold", 50.0f32)
            .with_field("Repeats", 2i32)
            .with_field("Target", Variant::Actor(2)),
    )
}

fn behavior(children: Vec<NodeSpec<TestWorld>>) -> Behavior<TestWorld> {
    let tree = BehaviorTree::builder("decorators")
        .blackboard("Board", board())
        .goal_type("Attack")
        .build(children)
        .unwrap();
    let mut behavior = Behavior::new(1, Arc::new(tree));
    behavior.start_logic().unwrap();
    behavior
}

/// Which branch of `Selector[guarded, fallback]` ran during one tick.
fn chosen(decorator: impl Decorator<TestWorld>, setup: impl FnOnce(&mut Knowledge)) -> &'static str {
    let log = Log::default();
    let mut world = TestWorld::new();
    let mut behavior = behavior(vec![NodeSpec::selector(vec![
        mark(&log, "guarded").decorate(decorator),
        mark(&log, "fallback"),
    ])]);
    setup(behavior.knowledge_mut());
    behavior.tick(&mut world, 0.1);
    let ran = log.lock().unwrap().clone();
    assert_eq!(ran.len(), 1, "{ran:?}");
    ran[0]
}

#[test]
fn loop_enters_its_node_exactly_n_times() {
    let mut world = TestWorld::new();
    let count = Arc::new(AtomicUsize::new(0));
    let mut behavior = behavior(vec![counter(&count).decorate(Loop::times(3))]);

    behavior.tick(&mut world, 0.1);
    behavior.tick(&mut world, 0.1);
    assert!(behavior.is_running());
    assert_eq!(count.load(Ordering::SeqCst), 2);

    behavior.tick(&mut world, 0.1);
    assert!(!behavior.is_running());
    assert_eq!(behavior.last_result(), UpdateResult::Success);
    assert_eq!(count.load(Ordering::SeqCst), 3);
}

#[test]
fn infinite_loop_keeps_running() {
    let mut world = TestWorld::new();
    let count = Arc::new(AtomicUsize::new(0));
    let mut behavior = behavior(vec![counter(&count).decorate(Loop::infinite())]);

    for _ in 0..10 {
        behavior.tick(&mut world, 0.1);
    }
    assert!(behavior.is_running());
    assert_eq!(count.load(Ordering::SeqCst), 10);
    assert!(behavior.memory().is_relevant(NodeId(2)));
}

#[test]
fn loop_count_can_come_from_knowledge() {
    let mut world = TestWorld::new();
    let count = Arc::new(AtomicUsize::new(0));
    let mut behavior = behavior(vec![
        counter(&count).decorate(Loop::times(5).from_knowledge("Blackboard.Repeats"))
    ]);

    for _ in 0..5 {
        behavior.tick(&mut world, 0.1);
    }
    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert!(!behavior.is_running());
}

#[test]
fn time_limit_fails_a_slow_node() {
    let mut world = TestWorld::new();
    let mut behavior = behavior(vec![
        NodeSpec::new(Delay::new(1.0)).decorate(TimeLimit::new(0.3))
    ]);

    behavior.tick(&mut world, 0.1);
    behavior.tick(&mut world, 0.1);
    assert!(behavior.is_running());

    behavior.tick(&mut world, 0.1);
    assert!(!behavior.is_running());
    assert_eq!(behavior.last_result(), UpdateResult::Failed);
}

#[test]
fn result_rewriting_decorators() {
    let mut world = TestWorld::new();
    let mut inverted = behavior(vec![NodeSpec::new(Delay::new(0.1)).decorate(Invert)]);
    inverted.tick(&mut world, 0.1);
    assert_eq!(inverted.last_result(), UpdateResult::Failed);

    let never = Condition::new("never", |_ctx: &UpdateContext<'_, TestWorld>| false);
    let mut forced = behavior(vec![NodeSpec::new(never).decorate(ForceSuccess)]);
    forced.tick(&mut world, 0.1);
    assert_eq!(forced.last_result(), UpdateResult::Success);
}

#[test]
fn knowledge_conditional_compares_against_a_constant() {
    let alert = || KnowledgeConditional::new("Blackboard.Alert", CompareOp::Greater, 0.5);

    assert_eq!(chosen(alert(), |_| {}), "fallback");
    assert_eq!(
        chosen(alert(), |k| {
            k.set("Blackboard.Alert", Variant::Float(0.9));
        }),
        "guarded"
    );
    assert_eq!(
        chosen(
            KnowledgeConditional::new("Blackboard.Missing", CompareOp::NotEqual, 0.0),
            |_| {}
        ),
        "fallback"
    );
}

#[test]
fn knowledge_values_conditional_compares_two_selectors() {
    let low_health = || {
        KnowledgeValuesConditional::new(
            "Blackboard.Health",
            CompareOp::LessEqual,
            "Blackboard.Threshold",
        )
    };
    assert_eq!(chosen(low_health(), |_| {}), "guarded");
    assert_eq!(
        chosen(low_health(), |k| {
            k.set("Blackboard.Health", Variant::Float(80.0));
        }),
        "fallback"
    );
}

#[test]
fn knowledge_boolean_tests_truthiness() {
    let sees = |k: &mut Knowledge| k.set_sensor("SeesEnemy", true);
    assert_eq!(chosen(KnowledgeBoolean::new("SeesEnemy"), sees), "guarded");
    assert_eq!(
        chosen(KnowledgeBoolean::new("SeesEnemy").inverted(), sees),
        "fallback"
    );
    assert_eq!(chosen(KnowledgeBoolean::new("SeesEnemy"), |_| {}), "fallback");
    assert_eq!(
        chosen(KnowledgeBoolean::new("SeesEnemy").inverted(), |_| {}),
        "fallback"
    );
}

#[test]
fn has_tag_checks_owner_or_selected_actor() {
    assert_eq!(chosen(HasTag::new("guard"), |_| {}), "guarded");
    assert_eq!(chosen(HasTag::new("civilian"), |_| {}), "fallback");
    assert_eq!(chosen(HasTag::new("civilian").inverted(), |_| {}), "guarded");
    assert_eq!(
        chosen(HasTag::new("enemy").on_actor("Blackboard.Target"), |_| {}),
        "guarded"
    );
    assert_eq!(
        chosen(HasTag::new("enemy").on_actor("Blackboard.Nobody"), |_| {}),
        "fallback"
    );
}

#[test]
fn has_goal_requires_the_exact_goal_type() {
    assert_eq!(chosen(HasGoal::new("Attack"), |_| {}), "fallback");
    assert_eq!(
        chosen(HasGoal::new("Attack"), |k| {
            assert!(k.add_goal(Variant::Structure(Structure::new("Attack"))));
        }),
        "guarded"
    );
    assert_eq!(
        chosen(HasGoal::new("Flee"), |k| {
            assert!(!k.add_goal(Variant::Structure(Structure::new("Flee"))));
        }),
        "fallback"
    );
}

#[test]
fn randomized_cooldown_stays_within_its_spread() {
    let mut world = TestWorld::new();
    let tree: BehaviorTree<TestWorld> = BehaviorTree::builder("cooldown")
        .build(vec![NodeSpec::new(Delay::new(0.0))
            .decorate(Cooldown::new(1.0).with_random_range(0.5))])
        .unwrap();
    let cooldown = NodeId(2);

    for seed in 0..64 {
        let mut memory = NodeMemory::new(tree.len());
        let mut knowledge = Knowledge::new(Arc::new(TypeRegistry::new()), seed);
        let result = UpdateContext::new(&tree, &mut memory, &mut world, 1, &mut knowledge, 0.1, 2.0)
            .invoke_update(tree.root_id());
        assert_eq!(result, UpdateResult::Success);

        let Some(NodeState::Cooldown { end_time }) = memory.state(cooldown) else {
            panic!("cooldown state should survive its node");
        };
        let duration = end_time - 2.0;
        assert!((0.5..=1.5).contains(&duration), "seed {seed}: {duration}");
    }
}

struct RefuseUpdate;

impl Decorator<TestWorld> for RefuseUpdate {
    fn update(&self, _ctx: &mut UpdateContext<'_, TestWorld>, _id: NodeId) -> UpdateResult {
        UpdateResult::Failed
    }
}

struct CountUpdates(Arc<AtomicUsize>);

impl Decorator<TestWorld> for CountUpdates {
    fn update(&self, _ctx: &mut UpdateContext<'_, TestWorld>, _id: NodeId) -> UpdateResult {
        self.0.fetch_add(1, Ordering::SeqCst);
        UpdateResult::Success
    }
}

#[test]
fn every_decorator_updates_after_an_earlier_one_failed() {
    let mut world = TestWorld::new();
    let runs = Arc::new(AtomicUsize::new(0));
    let updates = Arc::new(AtomicUsize::new(0));
    let mut behavior = behavior(vec![counter(&runs)
        .decorate(RefuseUpdate)
        .decorate(CountUpdates(Arc::clone(&updates)))]);

    behavior.tick(&mut world, 0.1);

    assert_eq!(updates.load(Ordering::SeqCst), 1);
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert!(!behavior.is_running());
    assert_eq!(behavior.last_result(), UpdateResult::Failed);
}

use std::collections::BTreeSet;
use std::io::Write;
use std::sync::Arc;

use ai_bt::{
    BehaviorSystem, BehaviorSystemConfig, BehaviorTree, Delay, NodeId, NodeSpec, NodeState,
};
use ai_core::{Vec3, WorldMut, WorldView};
use ai_nav::{NavWorldView, Navigator};

#[derive(Default)]
struct TestWorld {
    disabled: BTreeSet<u64>,
}

impl WorldView for TestWorld {
    type Agent = u64;

    fn position(&self, _agent: u64) -> Option<Vec3> {
        Some(Vec3::ZERO)
    }

    fn is_enabled(&self, agent: u64) -> bool {
        !self.disabled.contains(&agent)
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

fn random_wait() -> Arc<BehaviorTree<TestWorld>> {
    Arc::new(
        BehaviorTree::builder("wait")
            .build(vec![NodeSpec::new(
                Delay::new(5.0).with_random_range(2.0),
            )])
            .unwrap(),
    )
}

fn rolled_wait(system: &BehaviorSystem<TestWorld>, agent: u64) -> f32 {
    match system.get(agent).and_then(|b| b.memory().state(NodeId(1))) {
        Some(NodeState::Timer { time_left }) => *time_left,
        other => panic!("unexpected state {other:?}"),
    }
}

fn started(config: BehaviorSystemConfig, agents: &[u64]) -> BehaviorSystem<TestWorld> {
    let tree = random_wait();
    let mut system = BehaviorSystem::new(config);
    for &agent in agents {
        system.spawn(agent, Arc::clone(&tree));
    }
    assert_eq!(system.start_all(), agents.len());
    system
}

#[test]
fn instances_are_kept_in_stable_id_order() {
    let system = started(BehaviorSystemConfig::default(), &[30, 10, 20]);
    let order: Vec<u64> = system.iter().map(|b| b.agent()).collect();
    assert_eq!(order, vec![10, 20, 30]);
}

#[test]
fn disabled_actors_are_not_ticked() {
    let mut world = TestWorld::default();
    world.disabled.insert(2);
    let mut system = started(BehaviorSystemConfig::default(), &[1, 2]);

    for _ in 0..3 {
        system.tick(&mut world, 0.1);
    }
    assert!((system.get(1).unwrap().total_time() - 0.3).abs() < 1e-5);
    assert_eq!(system.get(2).unwrap().total_time(), 0.0);

    world.disabled.clear();
    system.tick(&mut world, 0.1);
    assert!((system.get(2).unwrap().total_time() - 0.1).abs() < 1e-6);
}

#[test]
fn disabled_actors_still_apply_requested_stops() {
    let mut world = TestWorld::default();
    world.disabled.insert(1);
    let mut system = started(BehaviorSystemConfig::default(), &[1]);

    system
        .get_mut(1)
        .unwrap()
        .request_stop(ai_bt::UpdateResult::Failed)
        .unwrap();
    system.tick(&mut world, 0.1);
    assert!(!system.get(1).unwrap().is_running());
}

#[test]
fn random_rolls_follow_the_configured_seed() {
    let mut world = TestWorld::default();
    let config = BehaviorSystemConfig {
        seed: 42,
        ..BehaviorSystemConfig::default()
    };
    let mut a = started(config.clone(), &[1, 2]);
    let mut b = started(config, &[1, 2]);
    a.tick(&mut world, 0.1);
    b.tick(&mut world, 0.1);

    assert_eq!(rolled_wait(&a, 1), rolled_wait(&b, 1));
    assert_ne!(rolled_wait(&a, 1), rolled_wait(&a, 2));
    for agent in [1, 2] {
        let wait = rolled_wait(&a, agent) + 0.1;
        assert!((3.0..=7.0).contains(&wait), "{wait}");
    }
}

#[test]
fn spawned_instances_inherit_config_settings() {
    let config = BehaviorSystemConfig {
        looping: true,
        default_rate_scale: 0.5,
        max_call_depth: 12,
        ..BehaviorSystemConfig::default()
    };
    let system = started(config, &[5]);
    let settings = system.get(5).unwrap().settings();
    assert!(settings.looping);
    assert_eq!(settings.update_rate_scale, 0.5);
    assert_eq!(settings.max_call_depth, 12);
    assert_eq!(settings.max_updates_per_tick, 8);
}

#[test]
fn config_loads_from_yaml_with_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "seed: 42").unwrap();
    writeln!(file, "looping: true").unwrap();

    let config = BehaviorSystemConfig::load(file.path()).unwrap();
    assert_eq!(config.seed, 42);
    assert!(config.looping);
    assert_eq!(config.max_call_depth, 100);
    assert_eq!(config.max_updates_per_tick, 8);
    assert_eq!(config.default_rate_scale, 1.0);
}

#[test]
fn missing_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = BehaviorSystemConfig::load_or_default(&dir.path().join("bt.yaml")).unwrap();
    assert_eq!(config, BehaviorSystemConfig::default());
}

#[test]
fn malformed_config_reports_its_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "seed: [not, a, number]").unwrap();

    let err = BehaviorSystemConfig::load(file.path()).unwrap_err();
    assert!(format!("{err}").contains("Failed to parse config"));
}

#[test]
fn zero_update_cap_still_runs_one_period_per_tick() {
    let mut world = TestWorld::default();
    let config = BehaviorSystemConfig {
        max_updates_per_tick: 0,
        ..BehaviorSystemConfig::default()
    };
    assert_eq!(config.settings().max_updates_per_tick, 1);

    let mut system = started(config, &[1]);
    system.tick(&mut world, 0.1);
    assert!((system.get(1).unwrap().total_time() - 0.1).abs() < 1e-6);

    system.tick(&mut world, 0.35);
    assert!((system.get(1).unwrap().total_time() - 0.2).abs() < 1e-6);
}

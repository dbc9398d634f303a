//! bt-sim - headless behavior tree simulation.
//!
//! Runs a handful of guards on a walled reference grid. Each guard walks to
//! its post, waits there, and heads home while the post is on cooldown.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use ai_bt::{
    Action, BehaviorSystem, BehaviorSystemConfig, BehaviorTree, Cooldown, Delay, EventPhase,
    MoveTo, NodeSpec, UpdateContext, UpdateResult,
};
use ai_core::{AgentGeometry, Structure, Variant, Vec3, WorldMut, WorldView};
use ai_nav::{NavGrid, NavWorldView, Navigator};

#[derive(Parser)]
#[command(name = "bt-sim")]
#[command(about = "Headless behavior tree simulation", version)]
struct Cli {
    /// Behavior system config (YAML); defaults apply when missing
    #[arg(short, long, default_value = "crates/bt-sim/config/demo.yaml")]
    config: PathBuf,

    /// Number of scheduler ticks to run
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Seconds per tick
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Number of guards
    #[arg(long, default_value_t = 3)]
    guards: u64,

    /// Print the final summary as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

struct SimWorld {
    grid: NavGrid,
    positions: BTreeMap<u64, Vec3>,
}

impl WorldView for SimWorld {
    type Agent = u64;

    fn position(&self, agent: u64) -> Option<Vec3> {
        self.positions.get(&agent).copied()
    }

    fn geometry(&self, _agent: u64) -> Option<AgentGeometry> {
        Some(AgentGeometry::Capsule {
            radius: 0.3,
            height: 1.8,
        })
    }

    fn resolve_actor(&self, stable_id: u64) -> Option<u64> {
        self.positions.contains_key(&stable_id).then_some(stable_id)
    }
}

impl WorldMut for SimWorld {
    fn add_movement(&mut self, agent: u64, delta: Vec3) -> bool {
        match self.positions.get_mut(&agent) {
            Some(position) => {
                *position += delta;
                true
            }
            None => false,
        }
    }
}

impl NavWorldView for SimWorld {
    fn navigator(&self) -> Option<&dyn Navigator> {
        Some(&self.grid)
    }
}

#[derive(Serialize)]
struct GuardSummary {
    agent: u64,
    position: [f32; 3],
    finished: u64,
    arrivals: u32,
    running: bool,
}

#[derive(Serialize)]
struct Summary {
    ticks: u32,
    simulated_seconds: f32,
    guards: Vec<GuardSummary>,
}

fn patrol_board(post: Vec3, home: Vec3) -> Variant {
    Variant::Structure(
        Structure::new("PatrolBoard")
            .with_field("Post", post)
            .with_field("Home", home),
    )
}

fn patrol_tree() -> Result<BehaviorTree<SimWorld>> {
    let to_post = NodeSpec::sequence(vec![
        NodeSpec::new(MoveTo::to_position("Blackboard.Post").with_speed(3.0)),
        NodeSpec::new(Action::new("arrive", |ctx: &mut UpdateContext<'_, SimWorld>| {
            ctx.signal_event("arrived", false);
            UpdateResult::Success
        })),
        NodeSpec::new(Delay::new(1.0).with_random_range(0.5)),
    ])
    .decorate(Cooldown::new(4.0).with_random_range(1.0));

    let to_home = NodeSpec::sequence(vec![
        NodeSpec::new(MoveTo::to_position("Blackboard.Home").with_speed(2.0)),
        NodeSpec::new(Delay::new(0.5)),
    ]);

    let tree = BehaviorTree::builder("patrol")
        .update_fps(20.0)
        .blackboard("PatrolBoard", patrol_board(Vec3::ZERO, Vec3::ZERO))
        .build(vec![NodeSpec::selector(vec![to_post, to_home])])?;
    Ok(tree)
}

fn walled_grid() -> NavGrid {
    let mut grid = NavGrid::new(16, 16, 1.0);
    for z in 0..16 {
        if z != 7 && z != 8 {
            grid.set_blocked(8, z, true);
        }
    }
    grid
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    fmt().with_env_filter(filter).with_target(false).init();

    let config = BehaviorSystemConfig::load_or_default(&cli.config)?;
    tracing::info!(config = %cli.config.display(), seed = config.seed, "config loaded");

    let tree = Arc::new(patrol_tree().context("Failed to build patrol tree")?);
    let mut world = SimWorld {
        grid: walled_grid(),
        positions: BTreeMap::new(),
    };
    let mut system = BehaviorSystem::new(config);

    for agent in 1..=cli.guards {
        let lane = (agent * 3 % 16) as f32 + 0.5;
        let home = Vec3::new(2.5, 0.0, lane);
        let post = Vec3::new(13.5, 0.0, 15.5 - lane);
        world.positions.insert(agent, home);

        let behavior = system.spawn(agent, Arc::clone(&tree));
        behavior.on_finished(move |result| {
            tracing::debug!(agent, ?result, "patrol round finished");
        });
        behavior
            .start_logic()
            .with_context(|| format!("Failed to start guard {agent}"))?;
        behavior
            .knowledge_mut()
            .set_blackboard(patrol_board(post, home));
    }

    let mut arrivals: BTreeMap<u64, u32> = BTreeMap::new();
    for tick in 0..cli.ticks {
        system.tick(&mut world, cli.dt);
        system.frame_update(&mut world, cli.dt);
        system.dispatch_events(|agent, event| {
            if event.name == "arrived" && event.phase == EventPhase::Start {
                *arrivals.entry(agent).or_default() += 1;
                tracing::info!(agent, tick, "guard reached post");
            }
        });
    }

    let summary = Summary {
        ticks: cli.ticks,
        simulated_seconds: cli.ticks as f32 * cli.dt,
        guards: system
            .iter()
            .map(|behavior| {
                let agent = behavior.agent();
                let p = world.position(agent).unwrap_or_default();
                GuardSummary {
                    agent,
                    position: [p.x, p.y, p.z],
                    finished: behavior.finished_count(),
                    arrivals: arrivals.get(&agent).copied().unwrap_or(0),
                    running: behavior.is_running(),
                }
            })
            .collect(),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "{} ticks ({:.1}s simulated)",
            summary.ticks, summary.simulated_seconds
        );
        for guard in &summary.guards {
            println!(
                "  guard {:>3}  at ({:>5.2}, {:>5.2})  arrivals {:>2}  rounds {:>2}",
                guard.agent,
                guard.position[0],
                guard.position[2],
                guard.arrivals,
                guard.finished
            );
        }
    }

    Ok(())
}

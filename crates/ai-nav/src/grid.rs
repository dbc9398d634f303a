use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::{NavMeshProperties, NavPathResult, Navigator, Vec3};

/// Neighbor offsets in a fixed order (N, E, S, W) so searches are deterministic.
const STEPS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// Deterministic grid navigator on the XZ plane at a fixed elevation.
///
/// Unreachable goals produce a partial path ending at the reachable cell closest to the goal.
#[derive(Debug, Clone)]
pub struct NavGrid {
    width: i32,
    depth: i32,
    cell_size: f32,
    elevation: f32,
    agent_radius: f32,
    blocked: Vec<bool>,
}

/// Cells visited by a search, start first.
struct Route {
    cells: Vec<usize>,
    reached: bool,
}

impl NavGrid {
    pub fn new(width: u32, depth: u32, cell_size: f32) -> Self {
        assert!(width > 0 && depth > 0, "grid must be non-empty");
        assert!(cell_size > 0.0, "cell_size must be > 0");
        Self {
            width: width as i32,
            depth: depth as i32,
            cell_size,
            elevation: 0.0,
            agent_radius: 0.0,
            blocked: vec![false; (width * depth) as usize],
        }
    }

    pub fn with_elevation(mut self, elevation: f32) -> Self {
        self.elevation = elevation;
        self
    }

    /// Radius of the agent the grid was laid out for, reported through [`Navigator::properties`].
    pub fn with_agent_radius(mut self, agent_radius: f32) -> Self {
        self.agent_radius = agent_radius.max(0.0);
        self
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn elevation(&self) -> f32 {
        self.elevation
    }

    pub fn set_blocked(&mut self, x: i32, z: i32, blocked: bool) {
        if let Some(index) = self.index(x, z) {
            self.blocked[index] = blocked;
        }
    }

    /// Cells outside the grid count as blocked.
    pub fn is_blocked(&self, x: i32, z: i32) -> bool {
        self.index(x, z).map_or(true, |index| self.blocked[index])
    }

    fn index(&self, x: i32, z: i32) -> Option<usize> {
        let inside = (0..self.width).contains(&x) && (0..self.depth).contains(&z);
        inside.then(|| (z * self.width + x) as usize)
    }

    fn coords(&self, index: usize) -> (i32, i32) {
        let index = index as i32;
        (index % self.width, index / self.width)
    }

    fn cell_of(&self, p: Vec3) -> (i32, i32) {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.z / self.cell_size).floor() as i32,
        )
    }

    fn center(&self, index: usize) -> Vec3 {
        let (x, z) = self.coords(index);
        Vec3::new(
            (x as f32 + 0.5) * self.cell_size,
            self.elevation,
            (z as f32 + 0.5) * self.cell_size,
        )
    }

    fn on_surface(&self, p: Vec3) -> Vec3 {
        Vec3::new(p.x, self.elevation, p.z)
    }

    fn manhattan(&self, index: usize, goal: (i32, i32)) -> u32 {
        let (x, z) = self.coords(index);
        x.abs_diff(goal.0) + z.abs_diff(goal.1)
    }

    fn walk_back(parents: &[Option<usize>], end: usize) -> Vec<usize> {
        let mut cells = vec![end];
        let mut current = end;
        while let Some(parent) = parents[current] {
            cells.push(parent);
            current = parent;
        }
        cells.reverse();
        cells
    }

    /// A* with unit step costs. Falls back to the explored cell nearest the goal (ties broken by
    /// path length) when the goal is blocked, outside the grid or unreachable.
    fn route(&self, start: (i32, i32), goal: (i32, i32)) -> Option<Route> {
        let start = self
            .index(start.0, start.1)
            .filter(|&index| !self.blocked[index])?;
        let target = self.index(goal.0, goal.1);

        let mut cost = vec![u32::MAX; self.blocked.len()];
        let mut parents: Vec<Option<usize>> = vec![None; self.blocked.len()];
        let mut open = BinaryHeap::new();
        let mut pushed = 0u64;

        cost[start] = 0;
        let mut closest = (self.manhattan(start, goal), 0, start);
        open.push(Reverse((closest.0, 0u32, pushed, start)));

        while let Some(Reverse((_, steps, _, current))) = open.pop() {
            if Some(current) == target {
                return Some(Route {
                    cells: Self::walk_back(&parents, current),
                    reached: true,
                });
            }
            if steps != cost[current] {
                continue;
            }

            let distance = self.manhattan(current, goal);
            if (distance, steps) < (closest.0, closest.1) {
                closest = (distance, steps, current);
            }

            let (x, z) = self.coords(current);
            for (dx, dz) in STEPS {
                let Some(next) = self.index(x + dx, z + dz) else {
                    continue;
                };
                let next_steps = steps + 1;
                if self.blocked[next] || next_steps >= cost[next] {
                    continue;
                }
                cost[next] = next_steps;
                parents[next] = Some(current);
                pushed += 1;
                let estimate = next_steps + self.manhattan(next, goal);
                open.push(Reverse((estimate, next_steps, pushed, next)));
            }
        }

        Some(Route {
            cells: Self::walk_back(&parents, closest.2),
            reached: false,
        })
    }
}

impl Navigator for NavGrid {
    fn find_path(&self, start: Vec3, goal: Vec3) -> Option<NavPathResult> {
        let route = self.route(self.cell_of(start), self.cell_of(goal))?;

        // Exact start point, then cell centers. A reached goal keeps its exact point too.
        let mut points = Vec::with_capacity(route.cells.len() + 1);
        points.push(self.on_surface(start));
        if route.reached {
            let inner = route.cells.len().saturating_sub(2);
            points.extend(route.cells.iter().skip(1).take(inner).map(|&c| self.center(c)));
            points.push(self.on_surface(goal));
            return Some(NavPathResult::new(points));
        }

        points.extend(route.cells.iter().skip(1).map(|&c| self.center(c)));
        if points.len() < 2 {
            points.push(self.on_surface(start));
        }
        Some(NavPathResult::partial(points))
    }

    fn find_closest_point(&self, point: Vec3) -> Option<Vec3> {
        let surface = self.on_surface(point);
        let (x, z) = self.cell_of(point);
        if !self.is_blocked(x, z) {
            return Some(surface);
        }

        let mut best: Option<(f32, usize)> = None;
        for index in (0..self.blocked.len()).filter(|&i| !self.blocked[i]) {
            let distance = self.center(index).distance(surface);
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, index));
            }
        }
        best.map(|(_, index)| self.center(index))
    }

    fn properties(&self) -> NavMeshProperties {
        NavMeshProperties {
            up: Vec3::UP,
            agent_radius: self.agent_radius,
        }
    }
}

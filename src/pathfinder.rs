use grid_util::point::Point;
use log::info;

use crate::agent::PathAgent;
use crate::grid::WorldGrid;
use crate::heap::OpenHeap;
use crate::octile_distance;
use crate::vec2::Vec2;
use crate::world::OverlapWorld;

const NO_PARENT: usize = usize::MAX;

/// Per-search scratch state, indexed by node. Kept outside the nodes so a
/// search never aliases state with obstacle bookkeeping or an earlier
/// search; every run starts from a full reset.
#[derive(Default)]
struct SearchScratch {
    g: Vec<i32>,
    h: Vec<i32>,
    parent: Vec<usize>,
    closed: Vec<bool>,
}

impl SearchScratch {
    fn reset(&mut self, len: usize) {
        self.g.clear();
        self.g.resize(len, i32::MAX);
        self.h.clear();
        self.h.resize(len, 0);
        self.parent.clear();
        self.parent.resize(len, NO_PARENT);
        self.closed.clear();
        self.closed.resize(len, false);
    }
}

/// A* search over a [WorldGrid] with octile step costs, optional sized-agent
/// filtering and a nearest-reachable-point fallback.
///
/// Holds reusable scratch allocations; a single `Pathfinder` runs one search
/// at a time. Drive it through
/// [PathRequestQueue](crate::request_queue::PathRequestQueue) to serialize
/// callers.
#[derive(Default)]
pub struct Pathfinder {
    scratch: SearchScratch,
    heap: OpenHeap,
}

impl Pathfinder {
    pub fn new() -> Pathfinder {
        Pathfinder::default()
    }

    /// Computes a shortest path between two world positions, returned as
    /// grid coordinates in traversal order, excluding the start node and
    /// including the target node. Returns an empty path when start and
    /// target map to the same node and [None] when no path exists.
    ///
    /// With `nearest_to_target`, an unreachable target is substituted once
    /// by the explored node closest to it (by octile heuristic) and the
    /// search reruns toward that node, so callers still get a usable
    /// partial path. The retry never falls back again, which bounds the
    /// search to two runs.
    ///
    /// Builds the grid on demand if it has not been built yet; building is
    /// idempotent and cheap relative to leaving the system unusable.
    pub fn find_path(
        &mut self,
        grid: &mut WorldGrid,
        world: &impl OverlapWorld,
        start: Vec2,
        target: Vec2,
        agent: Option<&PathAgent>,
        nearest_to_target: bool,
    ) -> Option<Vec<Point>> {
        if !grid.is_built() {
            grid.build(world);
        }
        let start_node = grid.node_from_world(start);
        let mut goal = grid.node_from_world(target);
        let mut allow_fallback = nearest_to_target;
        loop {
            if let Some(path) = self.run(grid, start_node, goal, agent) {
                return Some(path);
            }
            if !allow_fallback {
                info!("No path from {:?} to {:?}", start_node, goal);
                return None;
            }
            let Some(substitute) = self.nearest_closed_substitute(grid, start_node, agent) else {
                info!(
                    "No path from {:?} to {:?} and no closer reachable node",
                    start_node, goal
                );
                return None;
            };
            info!(
                "Goal {:?} not reachable from {:?}, retrying toward {:?}",
                goal, start_node, substitute
            );
            goal = substitute;
            allow_fallback = false;
        }
    }

    /// One A* run. [None] means the open set emptied without reaching the
    /// goal; the scratch state of the exhausted run is left intact for the
    /// fallback scan.
    fn run(
        &mut self,
        grid: &WorldGrid,
        start: Point,
        goal: Point,
        agent: Option<&PathAgent>,
    ) -> Option<Vec<Point>> {
        let len = grid.node_count();
        self.scratch.reset(len);
        self.heap.reset(len);
        let start_ix = grid.index(start);
        let goal_ix = grid.index(goal);
        let start_h = octile_distance(start, goal);
        self.scratch.g[start_ix] = 0;
        self.scratch.h[start_ix] = start_h;
        self.heap.push(start_ix, start_h, start_h);
        while let Some(current_ix) = self.heap.pop() {
            if current_ix == goal_ix {
                return Some(self.retrace(grid, start_ix, goal_ix));
            }
            self.scratch.closed[current_ix] = true;
            let current = grid.node(current_ix).grid_position;
            let current_g = self.scratch.g[current_ix];
            for neighbour in grid.neighbours(current) {
                let ix = grid.index(neighbour);
                if grid.is_blocked(ix) || self.scratch.closed[ix] {
                    continue;
                }
                if let Some(agent) = agent {
                    if !agent.can_move_on_node(neighbour, grid) {
                        continue;
                    }
                }
                let tentative = current_g + octile_distance(current, neighbour);
                let in_open = self.heap.contains(ix);
                if !in_open || tentative < self.scratch.g[ix] {
                    let h = octile_distance(neighbour, goal);
                    self.scratch.g[ix] = tentative;
                    self.scratch.h[ix] = h;
                    self.scratch.parent[ix] = current_ix;
                    if in_open {
                        self.heap.update(ix, tentative + h, h);
                    } else {
                        self.heap.push(ix, tentative + h, h);
                    }
                }
            }
        }
        None
    }

    /// Follows parent links from the goal back to the start, then reverses
    /// so the result runs start to goal.
    fn retrace(&self, grid: &WorldGrid, start_ix: usize, goal_ix: usize) -> Vec<Point> {
        let parents = &self.scratch.parent;
        let mut path: Vec<Point> = itertools::unfold(goal_ix, |ix| {
            (*ix != start_ix).then(|| {
                let p = grid.node(*ix).grid_position;
                *ix = parents[*ix];
                p
            })
        })
        .collect();
        path.reverse();
        path
    }

    /// After an exhausted run: the explored node strictly closest to the
    /// goal, to serve as a substitute target. The start itself never
    /// qualifies, and with an agent supplied the substitute must also pass
    /// the footprint check.
    fn nearest_closed_substitute(
        &self,
        grid: &WorldGrid,
        start: Point,
        agent: Option<&PathAgent>,
    ) -> Option<Point> {
        let start_ix = grid.index(start);
        let start_h = self.scratch.h[start_ix];
        let mut best: Option<(i32, usize)> = None;
        for ix in 0..grid.node_count() {
            if ix == start_ix || !self.scratch.closed[ix] || grid.is_blocked(ix) {
                continue;
            }
            let h = self.scratch.h[ix];
            if h >= start_h {
                continue;
            }
            if best.is_some_and(|(best_h, _)| best_h <= h) {
                continue;
            }
            if let Some(agent) = agent {
                if !agent.can_move_on_node(grid.node(ix).grid_position, grid) {
                    continue;
                }
            }
            best = Some((h, ix));
        }
        best.map(|(_, ix)| grid.node(ix).grid_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::footprint::Footprint;
    use crate::grid::GridConfig;
    use crate::obstacle::GridObstacle;
    use crate::world::{LayerMask, StaticWorld};
    use crate::C;

    const BLOCKING: LayerMask = LayerMask(0b01);
    const AGENT: LayerMask = LayerMask(0b11);

    fn config_10x10() -> GridConfig {
        GridConfig {
            world_center: Vec2::ZERO,
            world_size: Vec2::splat(10.0),
            node_diameter: 1.0,
            overlap_diameter: 0.9,
            blocking_mask: BLOCKING,
            agent_mask: AGENT,
        }
    }

    fn cell_center(x: i32, y: i32) -> Vec2 {
        Vec2::new(x as f32 - 4.5, y as f32 - 4.5)
    }

    /// Blocks exactly the named cells with per-cell rects.
    fn world_with_blocked(cells: &[(i32, i32)]) -> StaticWorld {
        let mut world = StaticWorld::new();
        for &(x, y) in cells {
            world.add_rect(cell_center(x, y), Vec2::splat(0.3), BLOCKING);
        }
        world
    }

    fn path_cost(path: &[Point], start: Point) -> i32 {
        let mut cost = 0;
        let mut previous = start;
        for &p in path {
            cost += octile_distance(previous, p);
            previous = p;
        }
        cost
    }

    #[test]
    fn diagonal_path_on_empty_grid_is_optimal() {
        let world = world_with_blocked(&[]);
        let mut grid = WorldGrid::new(config_10x10());
        let mut pathfinder = Pathfinder::new();
        let path = pathfinder
            .find_path(
                &mut grid,
                &world,
                cell_center(0, 0),
                cell_center(9, 9),
                None,
                true,
            )
            .unwrap();
        assert_eq!(path.len(), 9);
        assert_eq!(path_cost(&path, Point::new(0, 0)), 9 * 14);
        assert_eq!(*path.last().unwrap(), Point::new(9, 9));
    }

    #[test]
    fn grid_is_built_on_demand() {
        let world = world_with_blocked(&[]);
        let mut grid = WorldGrid::new(config_10x10());
        assert!(!grid.is_built());
        let mut pathfinder = Pathfinder::new();
        pathfinder.find_path(
            &mut grid,
            &world,
            cell_center(0, 0),
            cell_center(1, 1),
            None,
            false,
        );
        assert!(grid.is_built());
    }

    #[test]
    fn start_equals_target_yields_empty_path() {
        let world = world_with_blocked(&[]);
        let mut grid = WorldGrid::new(config_10x10());
        let mut pathfinder = Pathfinder::new();
        let path = pathfinder
            .find_path(
                &mut grid,
                &world,
                cell_center(3, 3),
                cell_center(3, 3),
                None,
                false,
            )
            .unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn path_steps_are_grid_neighbours() {
        let world = world_with_blocked(&[(4, 0), (4, 1), (4, 2), (4, 3), (4, 4), (4, 5), (4, 6)]);
        let mut grid = WorldGrid::new(config_10x10());
        let mut pathfinder = Pathfinder::new();
        let path = pathfinder
            .find_path(
                &mut grid,
                &world,
                cell_center(0, 0),
                cell_center(9, 0),
                None,
                false,
            )
            .unwrap();
        let mut previous = Point::new(0, 0);
        for &p in &path {
            assert!(grid.neighbours(previous).contains(&p));
            assert!(grid.node_at(p).walkable);
            previous = p;
        }
        assert_eq!(previous, Point::new(9, 0));
    }

    #[test]
    fn surrounded_target_falls_back_to_adjacent_node() {
        // Target (8, 8) is walkable but ringed by blocked cells.
        let ring = [
            (7, 7),
            (8, 7),
            (9, 7),
            (7, 8),
            (9, 8),
            (7, 9),
            (8, 9),
            (9, 9),
        ];
        let world = world_with_blocked(&ring);
        let mut grid = WorldGrid::new(config_10x10());
        let mut pathfinder = Pathfinder::new();
        let target = cell_center(8, 8);
        let path = pathfinder
            .find_path(&mut grid, &world, cell_center(0, 0), target, None, true)
            .unwrap();
        let last = *path.last().unwrap();
        assert_ne!(last, Point::new(8, 8));
        // Closest reachable cells sit two octile steps from the target.
        assert_eq!(octile_distance(last, Point::new(8, 8)), 2 * C);

        let mut pathfinder = Pathfinder::new();
        assert!(pathfinder
            .find_path(&mut grid, &world, cell_center(0, 0), target, None, false)
            .is_none());
    }

    #[test]
    fn fallback_from_inside_enclosure_reports_no_path() {
        // Start boxed in at (0, 0); nothing explored is closer to the target
        // than the start itself.
        let world = world_with_blocked(&[(1, 0), (0, 1), (1, 1)]);
        let mut grid = WorldGrid::new(config_10x10());
        let mut pathfinder = Pathfinder::new();
        assert!(pathfinder
            .find_path(
                &mut grid,
                &world,
                cell_center(0, 0),
                cell_center(9, 9),
                None,
                true,
            )
            .is_none());
    }

    #[test]
    fn obstacle_claims_block_search() {
        let world = world_with_blocked(&[]);
        let mut grid = WorldGrid::new(config_10x10());
        grid.build(&world);
        // Wall of obstacle claims across the full grid width at y = 5.
        let mut obstacle = GridObstacle::new(
            Vec2::new(0.0, 0.5),
            Footprint::Box {
                offset: Vec2::ZERO,
                half_extents: Vec2::new(5.0, 0.3),
            },
        );
        obstacle.take_partial_nodes = false;
        obstacle.update_position_on_grid(&mut grid);
        let mut pathfinder = Pathfinder::new();
        assert!(pathfinder
            .find_path(
                &mut grid,
                &world,
                cell_center(5, 0),
                cell_center(5, 9),
                None,
                false,
            )
            .is_none());
        // Releasing the obstacle reopens the route.
        obstacle.remove_from_previous_nodes(&mut grid);
        assert!(pathfinder
            .find_path(
                &mut grid,
                &world,
                cell_center(5, 0),
                cell_center(5, 9),
                None,
                false,
            )
            .is_some());
    }

    #[test]
    fn sized_agent_needs_a_wider_gap() {
        // A wall on the agent-only layer with a one-cell gap at (5, 5). The
        // gap admits a point mover but not a footprint spanning three cells.
        let mut world = StaticWorld::new();
        for x in 0..10 {
            if x == 5 {
                continue;
            }
            world.add_rect(cell_center(x, 5), Vec2::splat(0.3), LayerMask(0b10));
        }
        let mut grid = WorldGrid::new(config_10x10());
        let mut pathfinder = Pathfinder::new();
        let point_path = pathfinder.find_path(
            &mut grid,
            &world,
            cell_center(5, 0),
            cell_center(5, 9),
            None,
            false,
        );
        assert!(point_path.is_some());
        let wide = PathAgent::with_box(Vec2::splat(1.0));
        let wide_path = pathfinder.find_path(
            &mut grid,
            &world,
            cell_center(5, 0),
            cell_center(5, 9),
            Some(&wide),
            false,
        );
        assert!(wide_path.is_none());
    }

    #[test]
    fn detour_is_cheaper_than_blocked_straight_line() {
        let world = world_with_blocked(&[(4, 4), (5, 4), (6, 4), (4, 5), (5, 5), (6, 5)]);
        let mut grid = WorldGrid::new(config_10x10());
        let mut pathfinder = Pathfinder::new();
        let path = pathfinder
            .find_path(
                &mut grid,
                &world,
                cell_center(5, 2),
                cell_center(5, 7),
                None,
                false,
            )
            .unwrap();
        for &p in &path {
            assert!(grid.node_at(p).walkable);
        }
        // 5 straight steps would cost 50; the detour around a 3x2 block
        // costs 2 diagonals more on each side.
        assert_eq!(path_cost(&path, Point::new(5, 2)), 66);
    }
}

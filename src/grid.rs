use core::fmt;

use grid_util::point::Point;
use log::info;
use smallvec::SmallVec;

use crate::node::Node;
use crate::obstacle::ObstacleId;
use crate::vec2::Vec2;
use crate::world::{LayerMask, OverlapWorld};

/// Static configuration read once per [WorldGrid::build] call.
#[derive(Clone, Copy, Debug)]
pub struct GridConfig {
    /// Center of the covered world rectangle.
    pub world_center: Vec2,
    /// Extent of the covered world rectangle.
    pub world_size: Vec2,
    /// Edge length of one cell.
    pub node_diameter: f32,
    /// Diameter of the circular walkability probe. Independent from
    /// `node_diameter` so the classification footprint can be smaller than
    /// the full cell.
    pub overlap_diameter: f32,
    /// Geometry layers that make a cell unwalkable.
    pub blocking_mask: LayerMask,
    /// Geometry layers that make a cell off-limits for sized agents.
    pub agent_mask: LayerMask,
}

impl GridConfig {
    pub fn node_radius(&self) -> f32 {
        self.node_diameter / 2.0
    }

    pub fn overlap_radius(&self) -> f32 {
        self.overlap_diameter / 2.0
    }
}

/// Boundary nodes of a grid-space rectangle enclosing a world-space box,
/// as found by [WorldGrid::box_extremes].
#[derive(Clone, Copy, Debug)]
pub struct BoxExtremes {
    pub left: Point,
    pub right: Point,
    pub down: Point,
    pub up: Point,
}

/// Uniform axis-aligned grid over a world rectangle. Owns the node array and
/// the reverse node→obstacle association lists; the world-to-grid mapping is
/// purely affine.
///
/// [build](Self::build) fully replaces the node array: any node coordinates
/// and obstacle associations derived from the previous array are invalid
/// afterwards and must be recomputed by their owners. The grid `revision`
/// counter lets owners detect this.
pub struct WorldGrid {
    config: GridConfig,
    size: Point,
    nodes: Vec<Node>,
    node_obstacles: Vec<SmallVec<[ObstacleId; 2]>>,
    revision: u64,
    next_obstacle_id: u32,
}

impl WorldGrid {
    /// Creates an unbuilt grid; call [build](Self::build) before use. Grid
    /// dimensions are `round(world_size / node_diameter)` per axis, at
    /// least 1.
    pub fn new(config: GridConfig) -> WorldGrid {
        let size = Point::new(
            ((config.world_size.x / config.node_diameter).round() as i32).max(1),
            ((config.world_size.y / config.node_diameter).round() as i32).max(1),
        );
        WorldGrid {
            config,
            size,
            nodes: Vec::new(),
            node_obstacles: Vec::new(),
            revision: 0,
            next_obstacle_id: 0,
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn size(&self) -> Point {
        self.size
    }

    pub fn node_count(&self) -> usize {
        (self.size.x * self.size.y) as usize
    }

    pub fn is_built(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Bumped on every [build](Self::build); obstacle owners compare it to
    /// detect stale node associations.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn world_min(&self) -> Vec2 {
        self.config.world_center - self.config.world_size * 0.5
    }

    fn world_max(&self) -> Vec2 {
        self.config.world_center + self.config.world_size * 0.5
    }

    /// Min and max corners of the covered world rectangle.
    pub fn world_rect(&self) -> (Vec2, Vec2) {
        (self.world_min(), self.world_max())
    }

    /// (Re)builds the node array by probing the world at every cell center.
    /// Walkability and agent-overlap are classified with independent layer
    /// masks. All previous obstacle associations are dropped.
    pub fn build(&mut self, world: &impl OverlapWorld) {
        let min = self.world_min();
        let radius = self.config.overlap_radius();
        let diameter = self.config.node_diameter;
        self.nodes.clear();
        self.nodes.reserve(self.node_count());
        for y in 0..self.size.y {
            for x in 0..self.size.x {
                let center = Vec2::new(
                    min.x + (x as f32 + 0.5) * diameter,
                    min.y + (y as f32 + 0.5) * diameter,
                );
                let blocked = world.overlaps_circle(center, radius, self.config.blocking_mask);
                let agent_blocked = world.overlaps_circle(center, radius, self.config.agent_mask);
                self.nodes.push(Node {
                    grid_position: Point::new(x, y),
                    world_position: center,
                    walkable: !blocked,
                    agent_can_overlap: !agent_blocked,
                });
            }
        }
        self.node_obstacles.clear();
        self.node_obstacles
            .resize(self.nodes.len(), SmallVec::new());
        self.revision += 1;
        info!(
            "Built {}x{} grid (revision {})",
            self.size.x, self.size.y, self.revision
        );
    }

    pub fn in_bounds(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.size.x && p.y < self.size.y
    }

    /// Row-major node index for in-bounds coordinates.
    pub fn index(&self, p: Point) -> usize {
        debug_assert!(self.in_bounds(p));
        (p.y * self.size.x + p.x) as usize
    }

    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    /// Node lookup by coordinates. Out-of-bounds coordinates are a
    /// precondition violation; bounds-check with [in_bounds](Self::in_bounds)
    /// first.
    pub fn node_at(&self, p: Point) -> &Node {
        assert!(self.in_bounds(p), "node coordinates out of bounds: {:?}", p);
        &self.nodes[self.index(p)]
    }

    /// The up-to-eight grid-adjacent cells of `p` that lie within bounds.
    /// Out-of-bounds directions are omitted, not wrapped or clamped.
    pub fn neighbours(&self, p: Point) -> SmallVec<[Point; 8]> {
        let mut out = SmallVec::new();
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let n = Point::new(p.x + dx, p.y + dy);
                if self.in_bounds(n) {
                    out.push(n);
                }
            }
        }
        out
    }

    /// Maps a world point to the nearest node by linear interpolation across
    /// the grid extent, clamped into bounds on each axis. Points outside the
    /// grid resolve to the nearest edge node; this never fails.
    pub fn node_from_world(&self, pos: Vec2) -> Point {
        let min = self.world_min();
        let percent_x = ((pos.x - min.x) / self.config.world_size.x).clamp(0.0, 1.0);
        let percent_y = ((pos.y - min.y) / self.config.world_size.y).clamp(0.0, 1.0);
        let x = (percent_x * (self.size.x - 1) as f32).round() as i32;
        let y = (percent_y * (self.size.y - 1) as f32).round() as i32;
        Point::new(x.clamp(0, self.size.x - 1), y.clamp(0, self.size.y - 1))
    }

    /// Axis-aligned containment test against the grid's world rectangle.
    pub fn is_inside_grid(&self, pos: Vec2) -> bool {
        let min = self.world_min();
        let max = self.world_max();
        pos.x >= min.x && pos.x <= max.x && pos.y >= min.y && pos.y <= max.y
    }

    /// Walks outward from `center` along each axis while node centers stay
    /// within `center_pos ± half_extents`, yielding the four boundary nodes
    /// of the enclosing grid-space rectangle. Lets footprint scans avoid
    /// touching the whole grid.
    pub fn box_extremes(&self, center: Point, center_pos: Vec2, half_extents: Vec2) -> BoxExtremes {
        let mut left = center;
        while left.x > 0 {
            let next = Point::new(left.x - 1, left.y);
            if self.node_at(next).world_position.x < center_pos.x - half_extents.x {
                break;
            }
            left = next;
        }
        let mut right = center;
        while right.x < self.size.x - 1 {
            let next = Point::new(right.x + 1, right.y);
            if self.node_at(next).world_position.x > center_pos.x + half_extents.x {
                break;
            }
            right = next;
        }
        let mut down = center;
        while down.y > 0 {
            let next = Point::new(down.x, down.y - 1);
            if self.node_at(next).world_position.y < center_pos.y - half_extents.y {
                break;
            }
            down = next;
        }
        let mut up = center;
        while up.y < self.size.y - 1 {
            let next = Point::new(up.x, up.y + 1);
            if self.node_at(next).world_position.y > center_pos.y + half_extents.y {
                break;
            }
            up = next;
        }
        BoxExtremes {
            left,
            right,
            down,
            up,
        }
    }

    pub(crate) fn allocate_obstacle_id(&mut self) -> ObstacleId {
        let id = ObstacleId(self.next_obstacle_id);
        self.next_obstacle_id += 1;
        id
    }

    /// Adds `id` to the node's reverse obstacle list unless already present.
    /// Returns whether the list changed.
    pub(crate) fn add_obstacle_to_node(&mut self, index: usize, id: ObstacleId) -> bool {
        let list = &mut self.node_obstacles[index];
        if list.contains(&id) {
            return false;
        }
        list.push(id);
        true
    }

    pub(crate) fn remove_obstacle_from_node(&mut self, index: usize, id: ObstacleId) {
        self.node_obstacles[index].retain(|o| *o != id);
    }

    /// Obstacles currently claiming the node.
    pub fn obstacles_at(&self, index: usize) -> &[ObstacleId] {
        &self.node_obstacles[index]
    }

    /// Whether any dynamic obstacle currently claims the node.
    pub fn is_occupied(&self, index: usize) -> bool {
        !self.node_obstacles[index].is_empty()
    }

    /// The pathfinder's blocking test: statically unwalkable or claimed by a
    /// dynamic obstacle.
    pub fn is_blocked(&self, index: usize) -> bool {
        !self.nodes[index].walkable || self.is_occupied(index)
    }
}

impl fmt::Display for WorldGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if !self.is_built() {
            return writeln!(f, "Grid: (not built)");
        }
        writeln!(f, "Grid:")?;
        for y in (0..self.size.y).rev() {
            for x in 0..self.size.x {
                let ix = self.index(Point::new(x, y));
                let c = if !self.nodes[ix].walkable {
                    '#'
                } else if self.is_occupied(ix) {
                    'o'
                } else {
                    '.'
                };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

//! # grid_nav
//!
//! A grid-based pathfinding system for 2D worlds. Discretizes a rectangular
//! world region into a uniform grid of cells classified through a
//! caller-supplied overlap query, then computes shortest paths between
//! arbitrary world positions with [A*](https://en.wikipedia.org/wiki/A*_search_algorithm)
//! over an octile cost model. Supports sized agents (non-point movers),
//! dynamically moving obstacles that claim and release nodes, a
//! nearest-reachable-point fallback for blocked targets, and a serialized
//! request queue with debounced grid rebuilds.

pub mod agent;
pub mod footprint;
pub mod grid;
pub mod heap;
pub mod node;
pub mod obstacle;
pub mod pathfinder;
pub mod request_queue;
pub mod vec2;
pub mod world;

pub use agent::{AgentFootprint, PathAgent};
pub use footprint::{Footprint, OverlapShape};
pub use grid::{GridConfig, WorldGrid};
pub use node::Node;
pub use obstacle::{GridObstacle, ObstacleId};
pub use pathfinder::Pathfinder;
pub use request_queue::PathRequestQueue;
pub use vec2::Vec2;
pub use world::{Blocker, LayerMask, OverlapWorld, StaticWorld};

use grid_util::point::Point;

/// Cost of a cardinal step.
pub const C: i32 = 10;
/// Cost of a diagonal step, approximating sqrt(2) * [C].
pub const D: i32 = 14;

/// Octile distance between two grid coordinates: the cost of taking the
/// maximal number of diagonal steps before going straight. Admissible and
/// consistent on 8-directional uniform grids, so it doubles as both step
/// cost and heuristic.
pub fn octile_distance(a: Point, b: Point) -> i32 {
    let dx = (a.x - b.x).abs();
    let dy = (a.y - b.y).abs();
    D * dx.min(dy) + C * (dx.max(dy) - dx.min(dy))
}

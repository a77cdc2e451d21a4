use grid_util::point::Point;

use crate::footprint::box_nodes;
use crate::grid::WorldGrid;
use crate::vec2::Vec2;

/// Shape of a sized agent. Unlike obstacle footprints there is no external
/// collider form; agents are described directly.
#[derive(Clone, Copy, Debug)]
pub enum AgentFootprint {
    Box { half_extents: Vec2 },
    Circle { radius: f32 },
}

/// A non-point-sized mover. Supplying one to a search adds a per-node
/// footprint check on top of the grid's static walkability.
#[derive(Clone, Copy, Debug)]
pub struct PathAgent {
    pub footprint: AgentFootprint,
}

impl PathAgent {
    pub fn with_box(half_extents: Vec2) -> PathAgent {
        PathAgent {
            footprint: AgentFootprint::Box { half_extents },
        }
    }

    pub fn with_circle(radius: f32) -> PathAgent {
        PathAgent {
            footprint: AgentFootprint::Circle { radius },
        }
    }

    /// Whether the agent's full footprint fits at `node`'s position: every
    /// covered node must allow agent overlap. Advisory input to the search,
    /// re-evaluated per agent and per query; nothing is stored on nodes.
    /// Short-circuits on the first covered node that fails.
    pub fn can_move_on_node(&self, node: Point, grid: &WorldGrid) -> bool {
        let center = grid.node_at(node).world_position;
        match self.footprint {
            AgentFootprint::Box { half_extents } => box_nodes(grid, center, half_extents)
                .all(|p| grid.node_at(p).agent_can_overlap),
            AgentFootprint::Circle { radius } => {
                box_nodes(grid, center, Vec2::splat(radius))
                    .filter(|p| grid.node_at(*p).world_position.distance(center) <= radius)
                    .all(|p| grid.node_at(p).agent_can_overlap)
            }
        }
    }
}

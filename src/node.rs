use grid_util::point::Point;

use crate::vec2::Vec2;

/// One cell of the uniform grid: static classification data only.
///
/// Search-scratch state (costs, parent link, heap slot) deliberately does not
/// live here — it is kept in index-addressed arrays owned by the
/// [Pathfinder](crate::pathfinder::Pathfinder), so repeated or interleaved
/// searches never alias state through the node itself and no reference cycle
/// can form through parent links.
#[derive(Clone, Copy, Debug)]
pub struct Node {
    /// Unique, immutable coordinate of this node within its owning grid.
    pub grid_position: Point,
    /// World-space center of the cell.
    pub world_position: Vec2,
    /// Static blocking classification from the world-overlap probe.
    pub walkable: bool,
    /// Looser classification used when checking sized-agent footprints.
    pub agent_can_overlap: bool,
}

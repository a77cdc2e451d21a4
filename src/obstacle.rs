use fxhash::FxBuildHasher;
use indexmap::IndexSet;
use log::debug;

use crate::footprint::{footprint_nodes, Footprint};
use crate::grid::WorldGrid;
use crate::vec2::Vec2;

type FxIndexSet<T> = IndexSet<T, FxBuildHasher>;

/// Identifies one registered obstacle within a grid's reverse node lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObstacleId(pub(crate) u32);

/// A dynamic obstacle tracking which nodes its footprint currently covers.
///
/// The association is bidirectional: this struct holds the forward node list,
/// the grid holds the reverse per-node obstacle lists, and the two are kept
/// mutually consistent by always pairing a remove-from-previous step with an
/// add-to-new step. Register with
/// [update_position_on_grid](Self::update_position_on_grid) before anything
/// else; until then all updates are silent no-ops.
pub struct GridObstacle {
    position: Vec2,
    footprint: Footprint,
    /// Claim a node as soon as any part of the footprint touches it, rather
    /// than only once the footprint's edge reaches the node's center.
    pub take_partial_nodes: bool,
    nodes: FxIndexSet<usize>,
    id: Option<ObstacleId>,
    grid_revision: u64,
    scratch: Vec<usize>,
}

impl GridObstacle {
    pub fn new(position: Vec2, footprint: Footprint) -> GridObstacle {
        GridObstacle {
            position,
            footprint,
            take_partial_nodes: true,
            nodes: FxIndexSet::default(),
            id: None,
            grid_revision: 0,
            scratch: Vec::new(),
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn id(&self) -> Option<ObstacleId> {
        self.id
    }

    /// Node indices currently claimed, in claim order.
    pub fn nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes.iter().copied()
    }

    /// Registers the obstacle against `grid` (allocating an id on first use)
    /// and computes its initial node claim. Must be called once before
    /// [update_position](Self::update_position) has any effect.
    pub fn update_position_on_grid(&mut self, grid: &mut WorldGrid) {
        if self.id.is_none() {
            self.id = Some(grid.allocate_obstacle_id());
        }
        self.remove_from_previous_nodes(grid);
        self.set_new_nodes(grid);
    }

    /// Recomputes the node claim after a position change. A no-op until the
    /// obstacle has been registered with
    /// [update_position_on_grid](Self::update_position_on_grid).
    pub fn update_position(&mut self, grid: &mut WorldGrid) {
        if self.id.is_none() {
            debug!("Obstacle update before grid registration, skipping");
            return;
        }
        self.remove_from_previous_nodes(grid);
        self.set_new_nodes(grid);
    }

    /// Withdraws the obstacle from every node it previously claimed. If the
    /// grid was rebuilt since the claim, the stored indices refer to a
    /// discarded node array; the grid already dropped its reverse lists, so
    /// only the local list is cleared.
    pub fn remove_from_previous_nodes(&mut self, grid: &mut WorldGrid) {
        let Some(id) = self.id else {
            return;
        };
        if self.grid_revision == grid.revision() {
            for &ix in &self.nodes {
                grid.remove_obstacle_from_node(ix, id);
            }
        }
        self.nodes.clear();
    }

    /// Claims the nodes currently covered by the footprint. Idempotent
    /// against duplicate adds on both sides of the association.
    pub fn set_new_nodes(&mut self, grid: &mut WorldGrid) {
        let Some(id) = self.id else {
            return;
        };
        if !grid.is_built() {
            debug!("Obstacle update on unbuilt grid, skipping");
            return;
        }
        self.grid_revision = grid.revision();
        let mut covered = std::mem::take(&mut self.scratch);
        covered.clear();
        footprint_nodes(
            grid,
            self.position,
            &self.footprint,
            self.take_partial_nodes,
            &mut covered,
        );
        for &ix in &covered {
            if self.nodes.insert(ix) {
                grid.add_obstacle_to_node(ix, id);
            }
        }
        self.scratch = covered;
    }
}

use std::sync::Arc;

use grid_util::point::Point;

use crate::grid::WorldGrid;
use crate::vec2::Vec2;
use crate::world::Blocker;

/// An externally owned collision shape whose bounds and containment can be
/// queried. Lets obstacles track nodes for geometry the caller owns without
/// describing it as an explicit box or circle.
pub trait OverlapShape {
    /// Min and max corners of the shape's axis-aligned bounding box.
    fn bounds(&self) -> (Vec2, Vec2);
    /// The point on or inside the shape closest to `point`.
    fn closest_point(&self, point: Vec2) -> Vec2;
}

impl OverlapShape for Blocker {
    fn bounds(&self) -> (Vec2, Vec2) {
        match *self {
            Blocker::Rect {
                center,
                half_extents,
            } => (center - half_extents, center + half_extents),
            Blocker::Circle { center, radius } => {
                (center - Vec2::splat(radius), center + Vec2::splat(radius))
            }
        }
    }

    fn closest_point(&self, point: Vec2) -> Vec2 {
        match *self {
            Blocker::Rect {
                center,
                half_extents,
            } => point.clamp(center - half_extents, center + half_extents),
            Blocker::Circle { center, radius } => {
                let delta = point - center;
                let len = delta.length();
                if len <= radius {
                    point
                } else {
                    center + delta * (radius / len)
                }
            }
        }
    }
}

/// The shape an obstacle occupies, relative to its position. Shared between
/// the obstacle tracker and the agent checker so box, circle and collider-set
/// footprints all go through one nodes-in-footprint routine.
#[derive(Clone)]
pub enum Footprint {
    Box { offset: Vec2, half_extents: Vec2 },
    Circle { offset: Vec2, radius: f32 },
    Colliders(Vec<Arc<dyn OverlapShape>>),
}

/// Nodes whose centers lie within `center ± half_extents`, found by walking
/// extreme nodes outward instead of scanning the whole grid. Empty when the
/// box misses the grid rectangle entirely.
pub(crate) fn box_nodes<'a>(
    grid: &'a WorldGrid,
    center: Vec2,
    half_extents: Vec2,
) -> impl Iterator<Item = Point> + 'a {
    let (world_min, world_max) = grid.world_rect();
    let intersects = center.x - half_extents.x <= world_max.x
        && center.x + half_extents.x >= world_min.x
        && center.y - half_extents.y <= world_max.y
        && center.y + half_extents.y >= world_min.y;
    let extremes = intersects.then(|| {
        let center_node = grid.node_from_world(center);
        grid.box_extremes(center_node, center, half_extents)
    });
    extremes
        .into_iter()
        .flat_map(|e| {
            (e.down.y..=e.up.y)
                .flat_map(move |y| (e.left.x..=e.right.x).map(move |x| Point::new(x, y)))
        })
        .filter(move |p| {
            // The clamped center node can fall outside the box when the
            // footprint only grazes the grid border.
            let pos = grid.node_at(*p).world_position;
            (pos.x - center.x).abs() <= half_extents.x && (pos.y - center.y).abs() <= half_extents.y
        })
}

/// Node indices covered by a footprint placed at `position`. With
/// `take_partial` the tolerance is one node radius, claiming a node as soon
/// as any part of the footprint touches it; without, the footprint's edge
/// must reach the node's center.
pub(crate) fn footprint_nodes(
    grid: &WorldGrid,
    position: Vec2,
    footprint: &Footprint,
    take_partial: bool,
    out: &mut Vec<usize>,
) {
    let tolerance = if take_partial {
        grid.config().node_radius()
    } else {
        0.0
    };
    match footprint {
        Footprint::Box {
            offset,
            half_extents,
        } => {
            let center = position + *offset;
            let half = *half_extents + Vec2::splat(tolerance);
            out.extend(box_nodes(grid, center, half).map(|p| grid.index(p)));
        }
        Footprint::Circle { offset, radius } => {
            let center = position + *offset;
            let reach = *radius + tolerance;
            out.extend(
                box_nodes(grid, center, Vec2::splat(reach))
                    .filter(|p| grid.node_at(*p).world_position.distance(center) <= reach)
                    .map(|p| grid.index(p)),
            );
        }
        Footprint::Colliders(shapes) => {
            for shape in shapes {
                let (min, max) = shape.bounds();
                let center = (min + max) * 0.5;
                let half = (max - min) * 0.5 + Vec2::splat(tolerance);
                out.extend(
                    box_nodes(grid, center, half)
                        .filter(|p| {
                            let pos = grid.node_at(*p).world_position;
                            shape.closest_point(pos).distance(pos) <= tolerance
                        })
                        .map(|p| grid.index(p)),
                );
            }
        }
    }
}

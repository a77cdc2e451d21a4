use crate::vec2::Vec2;

/// Bitmask selecting which world geometry layers a probe should hit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    pub fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}

/// World-overlap query service consumed by the grid builder and the static
/// classification probes. Implementations must be side-effect-free: the same
/// probe may be issued at build time and again at arbitrary query time.
pub trait OverlapWorld {
    /// Does any geometry matching `mask` overlap the circle at `center`?
    fn overlaps_circle(&self, center: Vec2, radius: f32, mask: LayerMask) -> bool;
}

/// A blocker shape registered in a [StaticWorld].
#[derive(Clone, Copy, Debug)]
pub enum Blocker {
    Rect { center: Vec2, half_extents: Vec2 },
    Circle { center: Vec2, radius: f32 },
}

impl Blocker {
    fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        match *self {
            Blocker::Rect {
                center: c,
                half_extents,
            } => {
                let closest = center.clamp(c - half_extents, c + half_extents);
                closest.distance(center) <= radius
            }
            Blocker::Circle {
                center: c,
                radius: r,
            } => c.distance(center) <= radius + r,
        }
    }
}

/// A simple [OverlapWorld] backed by an explicit list of masked blocker
/// shapes. Enough to describe static level geometry for tests, demos and
/// benchmarks without pulling in a physics engine.
#[derive(Clone, Debug, Default)]
pub struct StaticWorld {
    blockers: Vec<(Blocker, LayerMask)>,
}

impl StaticWorld {
    pub fn new() -> StaticWorld {
        StaticWorld::default()
    }

    pub fn add_rect(&mut self, center: Vec2, half_extents: Vec2, mask: LayerMask) {
        self.blockers.push((
            Blocker::Rect {
                center,
                half_extents,
            },
            mask,
        ));
    }

    pub fn add_circle(&mut self, center: Vec2, radius: f32, mask: LayerMask) {
        self.blockers.push((Blocker::Circle { center, radius }, mask));
    }

    pub fn clear(&mut self) {
        self.blockers.clear();
    }
}

impl OverlapWorld for StaticWorld {
    fn overlaps_circle(&self, center: Vec2, radius: f32, mask: LayerMask) -> bool {
        self.blockers
            .iter()
            .filter(|(_, layer)| layer.intersects(mask))
            .any(|(blocker, _)| blocker.overlaps_circle(center, radius))
    }
}

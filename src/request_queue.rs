use std::collections::VecDeque;

use grid_util::point::Point;
use log::debug;

use crate::agent::PathAgent;
use crate::grid::WorldGrid;
use crate::pathfinder::Pathfinder;
use crate::vec2::Vec2;
use crate::world::OverlapWorld;

/// Invoked exactly once with the search result when a request completes.
pub type PathCallback = Box<dyn FnOnce(Option<Vec<Point>>)>;

struct PathRequest {
    start: Vec2,
    target: Vec2,
    agent: Option<PathAgent>,
    nearest_to_target: bool,
    callback: PathCallback,
}

/// Serializes path computation so at most one search runs at a time no
/// matter how many callers request paths, and coalesces bursts of grid
/// rebuild triggers into a single debounced rebuild.
///
/// The queue is a small state machine driven by [tick](Self::tick); the host
/// scheduler calls it once per cooperative step with the elapsed time.
/// Requests complete in FIFO submission order, one per tick.
pub struct PathRequestQueue {
    queue: VecDeque<PathRequest>,
    in_flight: bool,
    rebuild_timer: Option<f32>,
    debounce_delay: f32,
    pathfinder: Pathfinder,
}

impl PathRequestQueue {
    /// `debounce_delay` is how long a rebuild trigger waits for further
    /// triggers before the rebuild actually runs.
    pub fn new(debounce_delay: f32) -> PathRequestQueue {
        PathRequestQueue {
            queue: VecDeque::new(),
            in_flight: false,
            rebuild_timer: None,
            debounce_delay,
            pathfinder: Pathfinder::new(),
        }
    }

    /// Enqueues a path request; `callback` fires with the result once the
    /// request's turn comes up.
    pub fn process_path(
        &mut self,
        start: Vec2,
        target: Vec2,
        callback: impl FnOnce(Option<Vec<Point>>) + 'static,
        agent: Option<PathAgent>,
        nearest_to_target: bool,
    ) {
        self.queue.push_back(PathRequest {
            start,
            target,
            agent,
            nearest_to_target,
            callback: Box::new(callback),
        });
    }

    /// Requests queued but not yet completed.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Arms the debounce timer if it is not already running; further calls
    /// while the timer is pending are no-ops, so a burst of triggers (many
    /// obstacles moving in the same tick) causes one rebuild.
    pub fn update_grid(&mut self) {
        if self.rebuild_timer.is_none() {
            debug!("Grid rebuild scheduled in {}s", self.debounce_delay);
            self.rebuild_timer = Some(self.debounce_delay);
        }
    }

    pub fn rebuild_pending(&self) -> bool {
        self.rebuild_timer.is_some()
    }

    /// Cancels any pending debounced rebuild and rebuilds synchronously.
    pub fn update_grid_immediately(&mut self, grid: &mut WorldGrid, world: &impl OverlapWorld) {
        self.rebuild_timer = None;
        grid.build(world);
    }

    /// Advances the debounce timer by `dt` (rebuilding on expiry) and, when
    /// no search is in flight, runs the head request to completion and fires
    /// its callback.
    pub fn tick(&mut self, grid: &mut WorldGrid, world: &impl OverlapWorld, dt: f32) {
        if let Some(remaining) = self.rebuild_timer.as_mut() {
            *remaining -= dt;
        }
        if self.rebuild_timer.is_some_and(|t| t <= 0.0) {
            self.rebuild_timer = None;
            grid.build(world);
        }
        if self.in_flight {
            return;
        }
        if let Some(request) = self.queue.pop_front() {
            self.in_flight = true;
            let result = self.pathfinder.find_path(
                grid,
                world,
                request.start,
                request.target,
                request.agent.as_ref(),
                request.nearest_to_target,
            );
            (request.callback)(result);
            self.in_flight = false;
        }
    }
}

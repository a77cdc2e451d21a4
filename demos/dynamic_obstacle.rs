use grid_nav::{
    Footprint, GridConfig, GridObstacle, LayerMask, PathRequestQueue, StaticWorld, Vec2, WorldGrid,
};

// A crate slides across an empty 10x10 room while two path requests are
// queued. The first request runs with the crate parked on the straight
// line and has to detour; after the crate moves away, the second request
// takes the direct diagonal.
fn main() {
    let blocking = LayerMask(0b01);
    let world = StaticWorld::new();
    let mut grid = WorldGrid::new(GridConfig {
        world_center: Vec2::ZERO,
        world_size: Vec2::splat(10.0),
        node_diameter: 1.0,
        overlap_diameter: 0.9,
        blocking_mask: blocking,
        agent_mask: blocking,
    });
    grid.build(&world);

    let mut crate_obstacle = GridObstacle::new(
        Vec2::ZERO,
        Footprint::Box {
            offset: Vec2::ZERO,
            half_extents: Vec2::splat(1.0),
        },
    );
    crate_obstacle.update_position_on_grid(&mut grid);
    println!("{}", grid);

    let mut queue = PathRequestQueue::new(0.2);
    let start = Vec2::new(-4.5, -4.5);
    let goal = Vec2::new(4.5, 4.5);
    queue.process_path(
        start,
        goal,
        |path| println!("With the crate in the way: {:?}", path),
        None,
        true,
    );
    queue.process_path(
        start,
        goal,
        |path| println!("After the crate moved: {:?}", path),
        None,
        true,
    );

    // First tick serves the first request while the crate blocks the center.
    queue.tick(&mut grid, &world, 0.016);

    crate_obstacle.set_position(Vec2::new(-4.0, 4.0));
    crate_obstacle.update_position(&mut grid);
    println!("{}", grid);

    queue.tick(&mut grid, &world, 0.016);
}

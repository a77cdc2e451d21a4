use grid_nav::{GridConfig, LayerMask, Pathfinder, StaticWorld, Vec2, WorldGrid};

// In this demo a path is found on a 5x5 grid with shape
// .....
// .###.
// ...#.
// S..#G
// .....
// S marks the start
// G marks the goal
// The wall forces the path underneath the #-block.
fn main() {
    let blocking = LayerMask(0b01);
    let mut world = StaticWorld::new();
    world.add_rect(Vec2::new(0.0, 1.0), Vec2::new(1.4, 0.4), blocking);
    world.add_rect(Vec2::new(1.0, 0.0), Vec2::new(0.4, 1.4), blocking);
    let mut grid = WorldGrid::new(GridConfig {
        world_center: Vec2::ZERO,
        world_size: Vec2::splat(5.0),
        node_diameter: 1.0,
        overlap_diameter: 0.9,
        blocking_mask: blocking,
        agent_mask: blocking,
    });
    grid.build(&world);
    println!("{}", grid);

    let mut pathfinder = Pathfinder::new();
    let start = Vec2::new(-2.0, -1.0);
    let goal = Vec2::new(2.0, -1.0);
    if let Some(path) = pathfinder.find_path(&mut grid, &world, start, goal, None, true) {
        println!("A path has been found:");
        for p in path {
            println!("{:?}", p);
        }
    }
}

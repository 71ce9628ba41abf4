//! Spatial grid benchmarks: rebuild cost and query throughput at arena
//! entity counts.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use riftline_sim::grid::SpatialGrid;
use riftline_world::math::Vec2;
use riftline_world::prelude::*;
use riftline_world::store::World;

fn populated_world(count: u32) -> World {
    let mut world = World::new();
    for i in 0..count {
        // Deterministic scatter over a 4000x4000 arena.
        let x = (i as f64 * 97.0) % 4000.0 - 2000.0;
        let y = (i as f64 * 57.0) % 4000.0 - 2000.0;
        world.insert(EntityRecord::new(
            EntityKind::Minion,
            if i % 2 == 0 { Team::Blue } else { Team::Red },
            Vec2::new(x, y),
            Collider::circle(20.0),
        ));
    }
    world
}

fn bench_rebuild(c: &mut Criterion) {
    let world = populated_world(500);
    let mut grid = SpatialGrid::new(100.0);
    c.bench_function("grid_rebuild_500", |b| {
        b.iter(|| {
            grid.rebuild(black_box(&world));
        })
    });
}

fn bench_nearby(c: &mut Criterion) {
    let world = populated_world(500);
    let mut grid = SpatialGrid::new(100.0);
    grid.rebuild(&world);
    c.bench_function("grid_nearby_r800", |b| {
        b.iter(|| {
            let hits = grid.nearby(black_box(Vec2::ZERO), 800.0, |id| {
                world.get(id).map(|r| r.position)
            });
            black_box(hits)
        })
    });
}

criterion_group!(benches, bench_rebuild, bench_nearby);
criterion_main!(benches);

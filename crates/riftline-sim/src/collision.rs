//! Collision resolution: narrow phase dispatch plus mass-weighted separation.
//!
//! Candidate pairs come from the rebuilt [`SpatialGrid`]; overlap is a
//! strictly negative [`signed_gap`]. Overlapping alive, collidable pairs are
//! pushed apart along the center-to-center axis, each body moving inversely
//! proportional to its mass. Infinite-mass entities (towers, nexus) never
//! move and push the counterpart the full overlap. Co-located pairs take a
//! separation direction from the session PRNG so runs stay deterministic.
//!
//! One pass per tick is enough: the grid is rebuilt next tick and the
//! integration step is small.

use tracing::warn;

use riftline_world::math::Vec2;
use riftline_world::rng::SessionRng;
use riftline_world::shape::signed_gap;
use riftline_world::store::World;

use crate::grid::SpatialGrid;

// ---------------------------------------------------------------------------
// CollisionReport
// ---------------------------------------------------------------------------

/// Counters from one resolution pass, surfaced as metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// Candidate pairs that reached the narrow phase.
    pub pairs_tested: usize,
    /// Pairs that overlapped and were separated.
    pub resolved: usize,
    /// Positions that came out non-finite and were clamped back.
    pub clamped: usize,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Run one separation pass over every collidable, alive pair.
///
/// Dead, intangible, and opt-out entities are skipped entirely. Pairs are
/// visited in ascending id order, so identical worlds resolve identically.
pub fn resolve(world: &mut World, grid: &SpatialGrid, rng: &mut SessionRng) -> CollisionReport {
    let mut report = CollisionReport::default();

    // Gather candidate pairs before mutating positions. Each unordered pair
    // appears once, keyed (low id, high id).
    let mut pairs: Vec<(riftline_world::entity::EntityId, riftline_world::entity::EntityId)> =
        Vec::new();
    for a in world.ids() {
        let Some(ra) = world.get(a) else { continue };
        if !ra.blocks_collision() {
            continue;
        }
        let center = ra.collider.center(ra.position);
        let search = ra.collider.shape.bounding_radius() + grid.max_bounding_radius();
        for b in grid.nearby(center, search, |id| {
            world.get(id).map(|r| r.collider.center(r.position))
        }) {
            if b.to_raw() <= a.to_raw() {
                continue;
            }
            let Some(rb) = world.get(b) else { continue };
            if !rb.blocks_collision() {
                continue;
            }
            pairs.push((a, b));
        }
    }
    pairs.sort_unstable();
    pairs.dedup();

    for (a, b) in pairs {
        let Ok((ra, rb)) = world.get_pair_mut(a, b) else {
            continue;
        };
        report.pairs_tested += 1;

        let gap = signed_gap(ra.position, &ra.collider, rb.position, &rb.collider);
        if gap >= 0.0 {
            continue;
        }
        let overlap = -gap;

        // Mass weighting. Both infinite: neither yields.
        let (wa, wb) = match (ra.mass.is_infinite(), rb.mass.is_infinite()) {
            (true, true) => continue,
            (true, false) => (0.0, 1.0),
            (false, true) => (1.0, 0.0),
            (false, false) => {
                let total = ra.mass + rb.mass;
                (rb.mass / total, ra.mass / total)
            }
        };

        let axis = rb.collider.center(rb.position) - ra.collider.center(ra.position);
        let mut dir = axis.normalized_or_zero();
        if dir == Vec2::ZERO {
            // Co-located centers: deterministic PRNG direction.
            dir = rng.unit_dir();
        }

        let new_a = ra.position - dir * (overlap * wa);
        let new_b = rb.position + dir * (overlap * wb);

        if new_a.is_finite() {
            ra.position = new_a;
        } else {
            warn!(entity = %a, "collision produced non-finite position; clamping");
            report.clamped += 1;
        }
        if new_b.is_finite() {
            rb.position = new_b;
        } else {
            warn!(entity = %b, "collision produced non-finite position; clamping");
            report.clamped += 1;
        }
        report.resolved += 1;
    }

    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use riftline_world::prelude::*;

    fn circle_body(x: f64, mass: f64) -> EntityRecord {
        let mut record = EntityRecord::new(
            EntityKind::Champion,
            Team::Blue,
            Vec2::new(x, 0.0),
            Collider::circle(25.0),
        );
        record.mass = mass;
        record
    }

    fn resolve_world(world: &mut World) -> CollisionReport {
        let mut grid = SpatialGrid::new(100.0);
        grid.rebuild(world);
        let mut rng = SessionRng::new(42);
        resolve(world, &grid, &mut rng)
    }

    #[test]
    fn mass_weighted_separation() {
        // Reference scenario: circles r=25 at (0,0) mass 50 and (20,0) mass 100.
        // Overlap 30; the lighter body takes 2/3 of it.
        let mut world = World::new();
        let a = world.insert(circle_body(0.0, 50.0));
        let b = world.insert(circle_body(20.0, 100.0));

        let report = resolve_world(&mut world);
        assert_eq!(report.resolved, 1);
        assert!((world.get(a).unwrap().position.x - (-20.0)).abs() < 1e-9);
        assert!((world.get(b).unwrap().position.x - 30.0).abs() < 1e-9);
    }

    #[test]
    fn infinite_mass_stays_put() {
        let mut world = World::new();
        let tower = {
            let mut r = circle_body(0.0, f64::INFINITY);
            r.kind = EntityKind::Tower;
            world.insert(r)
        };
        let minion = world.insert(circle_body(20.0, 50.0));

        resolve_world(&mut world);
        assert_eq!(world.get(tower).unwrap().position.x, 0.0);
        // The finite body moves the full overlap.
        assert!((world.get(minion).unwrap().position.x - 50.0).abs() < 1e-9);
    }

    #[test]
    fn both_infinite_skipped() {
        let mut world = World::new();
        let a = world.insert(circle_body(0.0, f64::INFINITY));
        let b = world.insert(circle_body(20.0, f64::INFINITY));
        let report = resolve_world(&mut world);
        assert_eq!(report.resolved, 0);
        assert_eq!(world.get(a).unwrap().position.x, 0.0);
        assert_eq!(world.get(b).unwrap().position.x, 20.0);
    }

    #[test]
    fn exact_touch_not_resolved() {
        let mut world = World::new();
        world.insert(circle_body(0.0, 50.0));
        world.insert(circle_body(50.0, 50.0));
        let report = resolve_world(&mut world);
        assert_eq!(report.resolved, 0);
    }

    #[test]
    fn dead_and_intangible_skipped() {
        let mut world = World::new();
        let a = world.insert(circle_body(0.0, 50.0));
        let b = world.insert(circle_body(20.0, 50.0));
        world.get_mut(a).unwrap().dead = true;
        world.get_mut(b).unwrap().intangible = true;
        let report = resolve_world(&mut world);
        assert_eq!(report.pairs_tested, 0);
    }

    #[test]
    fn co_located_pair_separates_deterministically() {
        let run = |seed: u64| {
            let mut world = World::new();
            let a = world.insert(circle_body(100.0, 50.0));
            let b = world.insert(circle_body(100.0, 50.0));
            let mut grid = SpatialGrid::new(100.0);
            grid.rebuild(&world);
            let mut rng = SessionRng::new(seed);
            resolve(&mut world, &grid, &mut rng);
            (world.get(a).unwrap().position, world.get(b).unwrap().position)
        };
        let (a1, b1) = run(7);
        let (a2, b2) = run(7);
        assert_eq!(a1, a2);
        assert_eq!(b1, b2);
        // They did separate.
        assert!(a1.distance(b1) > 1.0);
    }

    #[test]
    fn separation_clears_the_overlap() {
        let mut world = World::new();
        let a = world.insert(circle_body(0.0, 50.0));
        let b = world.insert(circle_body(20.0, 100.0));
        resolve_world(&mut world);
        let (ra, rb) = (world.get(a).unwrap(), world.get(b).unwrap());
        let gap = signed_gap(ra.position, &ra.collider, rb.position, &rb.collider);
        assert!(gap >= -1e-9, "pair still overlapping: gap {gap}");
    }
}

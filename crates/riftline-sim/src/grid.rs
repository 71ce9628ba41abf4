//! Uniform spatial grid: the collision broad phase and range-query index.
//!
//! The grid maps cell coordinates to entity id lists and is rebuilt from
//! scratch every tick after integration -- no incremental updates, so its
//! cost is bounded and predictable. Two insertion modes exist: point
//! insertion (the cell containing the entity center) and radius insertion
//! (every cell the bounding box overlaps, for large bodies and range
//! queries).
//!
//! Query results are sorted by entity id before returning so that downstream
//! iteration never depends on hash-map ordering.

use std::collections::HashMap;

use riftline_world::entity::EntityId;
use riftline_world::math::Vec2;
use riftline_world::store::World;

/// Default cell size in world units.
pub const DEFAULT_CELL_SIZE: f64 = 100.0;

// ---------------------------------------------------------------------------
// SpatialGrid
// ---------------------------------------------------------------------------

/// A uniform grid over the map plane.
#[derive(Debug)]
pub struct SpatialGrid {
    cell_size: f64,
    cells: HashMap<(i64, i64), Vec<EntityId>>,
    /// Largest bounding radius inserted since the last clear. Pair queries
    /// widen by this much so no candidate is missed.
    max_bounding_radius: f64,
}

impl SpatialGrid {
    /// Create a grid with the given cell size.
    ///
    /// # Panics
    ///
    /// Panics if `cell_size` is not positive and finite.
    pub fn new(cell_size: f64) -> Self {
        assert!(
            cell_size > 0.0 && cell_size.is_finite(),
            "cell_size must be positive and finite, got {cell_size}"
        );
        Self {
            cell_size,
            cells: HashMap::new(),
            max_bounding_radius: 0.0,
        }
    }

    /// The configured cell size.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Largest bounding radius currently inserted.
    pub fn max_bounding_radius(&self) -> f64 {
        self.max_bounding_radius
    }

    /// Drop all entries, keeping allocations for the next rebuild.
    pub fn clear(&mut self) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
        self.max_bounding_radius = 0.0;
    }

    #[inline]
    fn cell_of(&self, p: Vec2) -> (i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
        )
    }

    /// Point insertion: the entity lands in the cell containing its center.
    pub fn insert_point(&mut self, id: EntityId, position: Vec2) {
        let cell = self.cell_of(position);
        self.cells.entry(cell).or_default().push(id);
    }

    /// Radius insertion: the entity lands in every cell its bounding box
    /// overlaps.
    pub fn insert_radius(&mut self, id: EntityId, position: Vec2, radius: f64) {
        let (min_cx, min_cy) = self.cell_of(position - Vec2::new(radius, radius));
        let (max_cx, max_cy) = self.cell_of(position + Vec2::new(radius, radius));
        for cx in min_cx..=max_cx {
            for cy in min_cy..=max_cy {
                self.cells.entry((cx, cy)).or_default().push(id);
            }
        }
        if radius > self.max_bounding_radius {
            self.max_bounding_radius = radius;
        }
    }

    /// Rebuild from the world: every non-removed entity is inserted with its
    /// collider's bounding radius.
    pub fn rebuild(&mut self, world: &World) {
        self.clear();
        for record in world.iter() {
            let radius = record.collider.shape.bounding_radius();
            self.insert_radius(record.id, record.collider.center(record.position), radius);
        }
    }

    /// Entities whose *centers* fall within `radius` of `position`
    /// (squared-distance check), gathered from the covering cell range.
    ///
    /// The caller supplies the position lookup because the grid stores only
    /// ids; stale ids (removed since the rebuild) are skipped.
    pub fn nearby(
        &self,
        position: Vec2,
        radius: f64,
        center_of: impl Fn(EntityId) -> Option<Vec2>,
    ) -> Vec<EntityId> {
        let (min_cx, min_cy) = self.cell_of(position - Vec2::new(radius, radius));
        let (max_cx, max_cy) = self.cell_of(position + Vec2::new(radius, radius));
        let radius_sq = radius * radius;

        let mut out = Vec::new();
        for cx in min_cx..=max_cx {
            for cy in min_cy..=max_cy {
                let Some(bucket) = self.cells.get(&(cx, cy)) else {
                    continue;
                };
                for &id in bucket {
                    let Some(center) = center_of(id) else { continue };
                    if center.distance_sq(position) <= radius_sq {
                        out.push(id);
                    }
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Union of the cell containing `position` and its 8 neighbors,
    /// deduplicated and sorted.
    pub fn adjacent(&self, position: Vec2) -> Vec<EntityId> {
        let (cx, cy) = self.cell_of(position);
        let mut out = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Map geometry: bounds, lane waypoints, and the deterministic bush layout.
//!
//! Bush groups are authored as compact descriptors `(center, spread, count,
//! padding)`; the individual bush rectangles are *derived*, not stored. The
//! derivation runs on a PCG32 stream selected by
//! `(map seed, group index, count, spread)` via
//! [`riftline_world::rng::derive_stream`], so the server and any client
//! mirroring the algorithm produce identical rectangles and vision rules
//! match rendering exactly.

use serde::{Deserialize, Serialize};

use rand::Rng;
use riftline_world::math::Vec2;
use riftline_world::rng::derive_stream;

/// Half-width of a single bush rectangle.
pub const BUSH_HALF_WIDTH: f64 = 80.0;
/// Half-height of a single bush rectangle.
pub const BUSH_HALF_HEIGHT: f64 = 60.0;

// ---------------------------------------------------------------------------
// Bounds and lanes
// ---------------------------------------------------------------------------

/// Axis-aligned map bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    /// Lower-left corner.
    pub min: Vec2,
    /// Upper-right corner.
    pub max: Vec2,
}

impl MapBounds {
    /// Whether a point lies inside the bounds (inclusive).
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Clamp a point into the bounds.
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }
}

/// An ordered waypoint path down one lane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    /// Waypoints from the blue base toward the red base.
    pub waypoints: Vec<Vec2>,
}

// ---------------------------------------------------------------------------
// Bush descriptors
// ---------------------------------------------------------------------------

/// How a bush group's rectangles are laid out around its center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BushSpread {
    /// Bushes in a row along +x.
    Horizontal,
    /// Bushes in a column along +y.
    Vertical,
    /// Bushes along the (1, 1) diagonal.
    Diagonal,
    /// Bushes on a jittered ring around the center.
    Cluster,
}

/// An authored bush group descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BushGroupDef {
    /// Group center.
    pub center: Vec2,
    /// Layout pattern.
    pub spread: BushSpread,
    /// Number of bushes in the group.
    pub count: u32,
    /// Gap between adjacent bushes.
    pub padding: f64,
}

// ---------------------------------------------------------------------------
// Derived rectangles
// ---------------------------------------------------------------------------

/// One derived bush rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BushRect {
    /// Rectangle center.
    pub center: Vec2,
    /// Half-extents.
    pub half: Vec2,
}

impl BushRect {
    /// Point-in-rectangle membership (inclusive edges).
    pub fn contains(&self, p: Vec2) -> bool {
        (p.x - self.center.x).abs() <= self.half.x && (p.y - self.center.y).abs() <= self.half.y
    }

    /// Distance from a point to the rectangle; zero inside or on the edge.
    pub fn distance_to(&self, p: Vec2) -> f64 {
        let min = self.center - self.half;
        let max = self.center + self.half;
        p.distance(p.clamp(min, max))
    }
}

/// A derived bush with its owning group index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bush {
    /// The rectangle.
    pub rect: BushRect,
    /// Index of the authoring group.
    pub group: usize,
}

/// All derived bushes for a map, in group order then intra-group order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BushLayout {
    /// Derived bushes.
    pub bushes: Vec<Bush>,
}

impl BushLayout {
    /// Derive the layout for the given groups and map seed.
    ///
    /// The per-group stream label is `bush-group-{index}-{count}-{spread}`,
    /// so any change to the descriptor reshuffles only that group.
    pub fn derive(groups: &[BushGroupDef], seed: u64) -> Self {
        let mut bushes = Vec::new();
        for (group_index, group) in groups.iter().enumerate() {
            let label = format!(
                "bush-group-{}-{}-{:?}",
                group_index, group.count, group.spread
            );
            let mut stream = derive_stream(seed, &label);
            let half = Vec2::new(BUSH_HALF_WIDTH, BUSH_HALF_HEIGHT);
            let step = match group.spread {
                BushSpread::Horizontal => Vec2::new(2.0 * half.x + group.padding, 0.0),
                BushSpread::Vertical => Vec2::new(0.0, 2.0 * half.y + group.padding),
                BushSpread::Diagonal => {
                    let d = std::f64::consts::FRAC_1_SQRT_2;
                    Vec2::new(d * (2.0 * half.x + group.padding), d * (2.0 * half.y + group.padding))
                }
                BushSpread::Cluster => Vec2::ZERO,
            };
            let mid = (group.count.saturating_sub(1)) as f64 / 2.0;
            for k in 0..group.count {
                let center = match group.spread {
                    BushSpread::Cluster => {
                        // Ring placement with PRNG angular jitter; count 1
                        // sits exactly on the center.
                        if group.count == 1 {
                            group.center
                        } else {
                            let base = std::f64::consts::TAU * k as f64 / group.count as f64;
                            let jitter = stream.gen_range(-0.2..0.2);
                            let ring = half.length() + group.padding;
                            group.center + Vec2::from_angle(base + jitter) * ring
                        }
                    }
                    _ => group.center + step * (k as f64 - mid),
                };
                bushes.push(Bush {
                    rect: BushRect { center, half },
                    group: group_index,
                });
            }
        }
        Self { bushes }
    }

    /// Index of the bush containing the point, if any. Overlapping bushes
    /// resolve to the first in derivation order.
    pub fn bush_containing(&self, p: Vec2) -> Option<usize> {
        self.bushes.iter().position(|b| b.rect.contains(p))
    }

    /// Distance from a point to a bush rectangle.
    pub fn distance_to(&self, bush: usize, p: Vec2) -> f64 {
        self.bushes[bush].rect.distance_to(p)
    }
}

// ---------------------------------------------------------------------------
// MapGeometry
// ---------------------------------------------------------------------------

/// The authored map: bounds, lanes, bush group descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapGeometry {
    /// Playable bounds.
    pub bounds: MapBounds,
    /// Lane waypoint paths.
    pub lanes: Vec<Lane>,
    /// Authored bush groups; rectangles derive via [`BushLayout::derive`].
    pub bush_groups: Vec<BushGroupDef>,
}

impl MapGeometry {
    /// Derive the bush layout for this map under the given seed.
    pub fn bush_layout(&self, seed: u64) -> BushLayout {
        BushLayout::derive(&self.bush_groups, seed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let groups = vec![
            BushGroupDef {
                center: Vec2::new(500.0, 0.0),
                spread: BushSpread::Horizontal,
                count: 3,
                padding: 40.0,
            },
            BushGroupDef {
                center: Vec2::new(-200.0, 300.0),
                spread: BushSpread::Cluster,
                count: 4,
                padding: 25.0,
            },
        ];
        let a = BushLayout::derive(&groups, 1234);
        let b = BushLayout::derive(&groups, 1234);
        assert_eq!(a, b);
        // A different seed moves cluster bushes.
        let c = BushLayout::derive(&groups, 9999);
        assert_ne!(a, c);
    }

    #[test]
    fn single_bush_sits_on_group_center() {
        let groups = vec![BushGroupDef {
            center: Vec2::new(500.0, 0.0),
            spread: BushSpread::Horizontal,
            count: 1,
            padding: 0.0,
        }];
        let layout = BushLayout::derive(&groups, 7);
        assert_eq!(layout.bushes.len(), 1);
        assert_eq!(layout.bushes[0].rect.center, Vec2::new(500.0, 0.0));
        assert!(layout.bushes[0].rect.contains(Vec2::new(500.0, 0.0)));
    }

    #[test]
    fn row_layout_is_centered_and_spaced() {
        let groups = vec![BushGroupDef {
            center: Vec2::ZERO,
            spread: BushSpread::Horizontal,
            count: 3,
            padding: 40.0,
        }];
        let layout = BushLayout::derive(&groups, 7);
        let xs: Vec<f64> = layout.bushes.iter().map(|b| b.rect.center.x).collect();
        let step = 2.0 * BUSH_HALF_WIDTH + 40.0;
        assert_eq!(xs, vec![-step, 0.0, step]);
    }

    #[test]
    fn membership_and_distance() {
        let rect = BushRect {
            center: Vec2::new(500.0, 0.0),
            half: Vec2::new(BUSH_HALF_WIDTH, BUSH_HALF_HEIGHT),
        };
        assert!(rect.contains(Vec2::new(500.0, 0.0)));
        assert!(rect.contains(Vec2::new(420.0, 0.0))); // on the edge
        assert!(!rect.contains(Vec2::new(419.0, 0.0)));
        assert_eq!(rect.distance_to(Vec2::new(500.0, 10.0)), 0.0);
        assert!((rect.distance_to(Vec2::new(400.0, 0.0)) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn bounds_clamp() {
        let bounds = MapBounds {
            min: Vec2::new(-100.0, -100.0),
            max: Vec2::new(100.0, 100.0),
        };
        assert!(bounds.contains(Vec2::ZERO));
        assert!(!bounds.contains(Vec2::new(150.0, 0.0)));
        assert_eq!(bounds.clamp(Vec2::new(150.0, -150.0)), Vec2::new(100.0, -100.0));
    }
}

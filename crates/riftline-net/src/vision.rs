//! Per-team vision: sight ranges plus bush occlusion.
//!
//! Vision is computed once per team per tick -- never per client -- and
//! cached for the delta step. A team's sources are its live champions,
//! wards, structures and minions; an entity is visible when any source has
//! it in sight range and no bush occludes it. An entity inside a bush is
//! visible only to sources inside the same bush or within the configured
//! reveal range of the bush rectangle.
//!
//! Frozen policy: projectiles are visible to both teams once airborne.

use std::collections::BTreeSet;

use riftline_world::entity::EntityId;
use riftline_world::records::{EntityKind, Team};
use riftline_world::store::World;

use riftline_catalog::config::SessionConfig;
use riftline_catalog::map::BushLayout;
use riftline_sim::grid::SpatialGrid;

// ---------------------------------------------------------------------------
// VisionSnapshot
// ---------------------------------------------------------------------------

/// The cached per-team visible sets for one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisionSnapshot {
    /// Entities the blue team can see.
    pub blue: BTreeSet<EntityId>,
    /// Entities the red team can see.
    pub red: BTreeSet<EntityId>,
}

impl VisionSnapshot {
    /// The visible set for a player team. Neutral observers (spectators)
    /// see everything either team sees.
    pub fn for_team(&self, team: Team) -> &BTreeSet<EntityId> {
        match team {
            Team::Blue => &self.blue,
            Team::Red => &self.red,
            Team::Neutral => &self.blue,
        }
    }

    /// Compute both teams' vision for the tick.
    pub fn compute(
        world: &World,
        grid: &SpatialGrid,
        bushes: &BushLayout,
        config: &SessionConfig,
    ) -> Self {
        Self {
            blue: compute_team_vision(world, grid, bushes, config, Team::Blue),
            red: compute_team_vision(world, grid, bushes, config, Team::Red),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-team computation
// ---------------------------------------------------------------------------

/// The set of entity ids visible to one team this tick.
pub fn compute_team_vision(
    world: &World,
    grid: &SpatialGrid,
    bushes: &BushLayout,
    config: &SessionConfig,
    team: Team,
) -> BTreeSet<EntityId> {
    let mut visible = BTreeSet::new();

    // Own entities, all structures, and airborne projectiles need no source.
    for record in world.iter() {
        if record.team == team
            || record.kind.is_structure()
            || record.kind == EntityKind::Projectile
        {
            visible.insert(record.id);
        }
    }

    // Sources: live own-team champions, wards, structures and minions.
    for source in world.iter() {
        if source.team != team || source.dead || source.sight_range <= 0.0 {
            continue;
        }
        if !matches!(
            source.kind,
            EntityKind::Champion | EntityKind::Ward | EntityKind::Minion
        ) && !source.kind.is_structure()
        {
            continue;
        }
        let source_pos = source.position;
        let source_bush = bushes.bush_containing(source_pos);

        for id in grid.nearby(source_pos, source.sight_range, |id| {
            world.get(id).map(|r| r.position)
        }) {
            if visible.contains(&id) {
                continue;
            }
            let Some(target) = world.get(id) else { continue };
            // Bush occlusion: a target inside a bush is seen only from
            // inside the same bush or within reveal range of it.
            if let Some(bush) = bushes.bush_containing(target.position) {
                let revealed = source_bush == Some(bush)
                    || bushes.distance_to(bush, source_pos) <= config.bush_reveal_range;
                if !revealed {
                    continue;
                }
            }
            visible.insert(id);
        }
    }

    visible
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use riftline_catalog::map::{BushGroupDef, BushSpread};
    use riftline_world::math::Vec2;
    use riftline_world::prelude::*;

    fn champion(team: Team, position: Vec2, sight: f64) -> EntityRecord {
        let mut record = EntityRecord::new(
            EntityKind::Champion,
            team,
            position,
            Collider::circle(25.0),
        );
        record.sight_range = sight;
        record
    }

    fn scene() -> (World, SpatialGrid, BushLayout, SessionConfig) {
        let world = World::new();
        let grid = SpatialGrid::new(100.0);
        // One bush centered at (500, 0); half extents 80x60.
        let layout = BushLayout::derive(
            &[BushGroupDef {
                center: Vec2::new(500.0, 0.0),
                spread: BushSpread::Horizontal,
                count: 1,
                padding: 0.0,
            }],
            1,
        );
        (world, grid, layout, SessionConfig::default())
    }

    fn rebuild(world: &World, grid: &mut SpatialGrid) {
        grid.rebuild(world);
    }

    #[test]
    fn sight_range_gates_visibility() {
        let (mut world, mut grid, layout, config) = scene();
        let observer = world.insert(champion(Team::Blue, Vec2::ZERO, 800.0));
        let near = world.insert(champion(Team::Red, Vec2::new(700.0, 0.0), 800.0));
        let far = world.insert(champion(Team::Red, Vec2::new(1200.0, 0.0), 800.0));
        rebuild(&world, &mut grid);

        let blue = compute_team_vision(&world, &grid, &layout, &config, Team::Blue);
        assert!(blue.contains(&observer));
        assert!(blue.contains(&near));
        assert!(!blue.contains(&far));
    }

    #[test]
    fn bush_hides_until_reveal_range() {
        // Reference scenario: observer at (0,0) sight 800; target at (500,0)
        // inside the bush centered there. Not visible until the observer
        // closes within reveal range (100) of the bush rectangle.
        let (mut world, mut grid, layout, config) = scene();
        let observer = world.insert(champion(Team::Blue, Vec2::ZERO, 800.0));
        let hidden = world.insert(champion(Team::Red, Vec2::new(500.0, 0.0), 800.0));
        rebuild(&world, &mut grid);

        let blue = compute_team_vision(&world, &grid, &layout, &config, Team::Blue);
        assert!(!blue.contains(&hidden), "bush must occlude at range 500");

        // Move the observer to (420, 0): on the bush edge, inside reveal
        // range; the target appears that tick.
        world.get_mut(observer).unwrap().position = Vec2::new(420.0, 0.0);
        rebuild(&world, &mut grid);
        let blue = compute_team_vision(&world, &grid, &layout, &config, Team::Blue);
        assert!(blue.contains(&hidden));
    }

    #[test]
    fn sources_inside_the_same_bush_see_each_other() {
        let (mut world, mut grid, layout, config) = scene();
        world.insert(champion(Team::Blue, Vec2::new(480.0, 10.0), 800.0));
        let lurker = world.insert(champion(Team::Red, Vec2::new(520.0, -10.0), 800.0));
        rebuild(&world, &mut grid);

        let blue = compute_team_vision(&world, &grid, &layout, &config, Team::Blue);
        assert!(blue.contains(&lurker));
    }

    #[test]
    fn own_team_structures_and_projectiles_are_always_visible() {
        let (mut world, mut grid, layout, config) = scene();
        let ally = world.insert(champion(Team::Blue, Vec2::new(3000.0, 3000.0), 800.0));
        let enemy_tower = {
            let mut tower = EntityRecord::new(
                EntityKind::Tower,
                Team::Red,
                Vec2::new(-3000.0, -3000.0),
                Collider::rect(80.0, 80.0),
            );
            tower.sight_range = 800.0;
            world.insert(tower)
        };
        let enemy_bolt = world.insert(EntityRecord::new(
            EntityKind::Projectile,
            Team::Red,
            Vec2::new(-2000.0, 0.0),
            Collider::circle(30.0),
        ));
        rebuild(&world, &mut grid);

        let blue = compute_team_vision(&world, &grid, &layout, &config, Team::Blue);
        assert!(blue.contains(&ally));
        assert!(blue.contains(&enemy_tower));
        assert!(blue.contains(&enemy_bolt));
    }

    #[test]
    fn dead_sources_grant_no_vision() {
        let (mut world, mut grid, layout, config) = scene();
        let corpse = world.insert(champion(Team::Blue, Vec2::ZERO, 800.0));
        world.get_mut(corpse).unwrap().dead = true;
        let enemy = world.insert(champion(Team::Red, Vec2::new(400.0, 0.0), 800.0));
        rebuild(&world, &mut grid);

        let blue = compute_team_vision(&world, &grid, &layout, &config, Team::Blue);
        assert!(!blue.contains(&enemy));
    }

    #[test]
    fn wards_are_sources() {
        let (mut world, mut grid, layout, config) = scene();
        let mut ward = EntityRecord::new(
            EntityKind::Ward,
            Team::Blue,
            Vec2::new(1000.0, 0.0),
            Collider::circle(10.0),
        );
        ward.sight_range = 600.0;
        ward.ward = Some(WardState {
            remaining: 180.0,
            placed_by: PlayerId(1),
        });
        world.insert(ward);
        let enemy = world.insert(champion(Team::Red, Vec2::new(1400.0, 0.0), 800.0));
        rebuild(&world, &mut grid);

        let blue = compute_team_vision(&world, &grid, &layout, &config, Team::Blue);
        assert!(blue.contains(&enemy));
    }

    #[test]
    fn snapshot_computes_both_teams_once() {
        let (mut world, mut grid, layout, config) = scene();
        world.insert(champion(Team::Blue, Vec2::ZERO, 800.0));
        world.insert(champion(Team::Red, Vec2::new(400.0, 0.0), 800.0));
        rebuild(&world, &mut grid);

        let snapshot = VisionSnapshot::compute(&world, &grid, &layout, &config);
        assert_eq!(snapshot.for_team(Team::Blue), &snapshot.blue);
        assert_eq!(snapshot.for_team(Team::Red), &snapshot.red);
        assert_eq!(snapshot.blue.len(), 2);
        assert_eq!(snapshot.red.len(), 2);
    }
}

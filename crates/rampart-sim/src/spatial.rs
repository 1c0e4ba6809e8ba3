//! Spatial query collaborator.
//!
//! Targeting and the placement validator only ever ask "what is within this
//! sphere"; the answer comes through `SpatialQuery` so a grid or BVH can
//! replace the brute-force scan without touching either caller.

use hecs::{Entity, World};

use rampart_core::components::{Collider, Enemy, Lifecycle, NoBuildZone, Tower};
use rampart_core::enums::SpatialCategory;
use rampart_core::types::Position;

use crate::enemy::is_alive;

pub trait SpatialQuery: Send {
    /// Entities of `category` whose volume touches the sphere at `center`.
    ///
    /// For `Enemy` the result is ordered by enemy id, so "first found" is
    /// stable across runs.
    fn find_within_radius(
        &self,
        world: &World,
        center: &Position,
        radius: f64,
        category: SpatialCategory,
    ) -> Vec<Entity>;
}

/// Linear scan over the world. Fine for the entity counts of one match.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceQuery;

impl SpatialQuery for BruteForceQuery {
    fn find_within_radius(
        &self,
        world: &World,
        center: &Position,
        radius: f64,
        category: SpatialCategory,
    ) -> Vec<Entity> {
        match category {
            SpatialCategory::Enemy => enemies_within(world, center, radius),
            SpatialCategory::NoBuild => no_build_within(world, center, radius),
        }
    }
}

fn enemies_within(world: &World, center: &Position, radius: f64) -> Vec<Entity> {
    let mut found: Vec<(u32, Entity)> = world
        .query::<(&Enemy, &Position, &Collider, &Lifecycle)>()
        .iter()
        .filter(|(_, (_, pos, collider, life))| {
            is_alive(life) && pos.distance_to(center) <= radius + collider.radius
        })
        .map(|(entity, (enemy, ..))| (enemy.id, entity))
        .collect();

    found.sort_by_key(|(id, _)| *id);
    found.into_iter().map(|(_, entity)| entity).collect()
}

fn no_build_within(world: &World, center: &Position, radius: f64) -> Vec<Entity> {
    let mut found: Vec<Entity> = world
        .query::<&NoBuildZone>()
        .iter()
        .filter(|(_, zone)| zone.shape.overlaps_sphere(center, radius))
        .map(|(entity, _)| entity)
        .collect();

    found.extend(
        world
            .query::<(&Tower, &Position)>()
            .iter()
            .filter(|(_, (tower, pos))| pos.distance_to(center) < radius + tower.footprint_radius)
            .map(|(entity, _)| entity),
    );
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_core::components::{EnemyStats, PathFollower};
    use rampart_core::enums::{EnemyKind, EnemyPhase, TowerKind};
    use rampart_core::types::ZoneShape;

    fn spawn_enemy(world: &mut World, id: u32, x: f64, phase: EnemyPhase) -> Entity {
        world.spawn((
            Enemy {
                id,
                kind: EnemyKind::Grunt,
            },
            Position::ground(x, 0.0),
            EnemyStats {
                health: 10.0,
                max_health: 10.0,
                move_speed: 1.0,
                money_on_kill: 1,
                damage_on_reach_end: 1,
            },
            PathFollower::default(),
            Collider { radius: 0.5 },
            Lifecycle {
                phase,
                ..Default::default()
            },
        ))
    }

    #[test]
    fn enemy_query_counts_collider_and_skips_dying() {
        let mut world = World::new();
        let near = spawn_enemy(&mut world, 2, 3.4, EnemyPhase::Alive);
        let edge = spawn_enemy(&mut world, 1, 3.5, EnemyPhase::Alive);
        spawn_enemy(&mut world, 3, 1.0, EnemyPhase::Dying);
        spawn_enemy(&mut world, 4, 3.6, EnemyPhase::Alive);

        let found =
            BruteForceQuery.find_within_radius(&world, &Position::ORIGIN, 3.0, SpatialCategory::Enemy);
        assert_eq!(found, vec![edge, near], "ordered by enemy id");
    }

    #[test]
    fn no_build_query_sees_zones_and_towers() {
        let mut world = World::new();
        let zone = world.spawn((NoBuildZone {
            shape: ZoneShape::Circle {
                center: Position::ground(10.0, 0.0),
                radius: 1.0,
            },
        },));
        let tower = world.spawn((
            Tower {
                id: 0,
                kind: TowerKind::Cannon,
                cost: 100,
                footprint_radius: 1.0,
            },
            Position::ground(0.0, 5.0),
        ));

        let query = BruteForceQuery;
        let at = |x, z| query.find_within_radius(&world, &Position::ground(x, z), 1.0, SpatialCategory::NoBuild);

        assert_eq!(at(8.5, 0.0), vec![zone]);
        assert_eq!(at(0.0, 6.5), vec![tower]);
        // Footprints exactly touching do not collide.
        assert!(at(0.0, 7.0).is_empty());
        assert!(at(5.0, 0.0).is_empty());
    }
}

//! Snapshot system: queries the ECS world and builds a complete GameStateSnapshot.
//!
//! This system is read-only and never modifies the world.

use hecs::World;

use rampart_core::components::*;
use rampart_core::config::MatchConfig;
use rampart_core::events::SimEvent;
use rampart_core::state::*;
use rampart_core::types::{Position, SimTime};

use crate::economy::Economy;
use crate::placement::Interaction;
use crate::systems::wave_scheduler::RoundScheduler;

/// Everything outside the world that the snapshot reports on.
pub struct SnapshotInputs<'a> {
    pub time: SimTime,
    pub paused: bool,
    pub config: &'a MatchConfig,
    pub economy: &'a Economy,
    pub scheduler: &'a RoundScheduler,
    pub interaction: &'a Interaction,
}

/// Build a complete GameStateSnapshot from the current world state.
pub fn build_snapshot(world: &World, inputs: SnapshotInputs<'_>, events: Vec<SimEvent>) -> GameStateSnapshot {
    let SnapshotInputs {
        time,
        paused,
        config,
        economy,
        scheduler,
        interaction,
    } = inputs;

    GameStateSnapshot {
        time,
        phase: scheduler.phase(),
        paused,
        economy: EconomyView {
            health: economy.health(),
            money: economy.money(),
        },
        round: RoundView {
            current_round: scheduler.current_round(),
            wave_count: config.wave_count(),
            enemies_remaining: scheduler.enemies_remaining(),
            pending_spawns: scheduler.pending_spawns(&config.waves),
        },
        interaction: interaction.view(),
        enemies: build_enemies(world),
        towers: build_towers(world, config),
        projectiles: build_projectiles(world),
        events,
    }
}

fn build_enemies(world: &World) -> Vec<EnemyView> {
    let mut enemies: Vec<EnemyView> = world
        .query::<(&Enemy, &Position, &EnemyStats, &PathFollower, &Lifecycle)>()
        .iter()
        .map(|(_, (enemy, pos, stats, follower, life))| EnemyView {
            enemy_id: enemy.id,
            kind: enemy.kind,
            position: *pos,
            health: stats.health,
            max_health: stats.max_health,
            phase: life.phase,
            waypoint: follower.waypoint,
        })
        .collect();

    enemies.sort_by_key(|e| e.enemy_id);
    enemies
}

fn build_towers(world: &World, config: &MatchConfig) -> Vec<TowerView> {
    let mut towers: Vec<TowerView> = world
        .query::<(&Tower, &Position, &Weapon, &FireControl)>()
        .iter()
        .map(|(_, (tower, pos, weapon, fire_control))| TowerView {
            tower_id: tower.id,
            kind: tower.kind,
            position: *pos,
            attack_range: weapon.attack_range,
            target: fire_control.target,
            sell_value: config.refund_for(tower.cost),
        })
        .collect();

    towers.sort_by_key(|t| t.tower_id);
    towers
}

fn build_projectiles(world: &World) -> Vec<ProjectileView> {
    let mut projectiles: Vec<ProjectileView> = world
        .query::<(&Projectile, &Position)>()
        .iter()
        .map(|(_, (projectile, pos))| ProjectileView {
            projectile_id: projectile.id,
            position: *pos,
            remaining_lifetime_secs: projectile.remaining_lifetime_secs,
        })
        .collect();

    projectiles.sort_by_key(|p| p.projectile_id);
    projectiles
}

//! Tests for the simulation engine: match flow, spawning, targeting, combat,
//! placement and the economy.

use proptest::prelude::*;

use rampart_core::commands::PlayerCommand;
use rampart_core::components::{EnemyStats, Lifecycle};
use rampart_core::config::*;
use rampart_core::enums::*;
use rampart_core::error::Rejection;
use rampart_core::events::SimEvent;
use rampart_core::state::GameStateSnapshot;
use rampart_core::types::{GroundRect, Position};

use crate::economy::Economy;
use crate::enemy::{apply_damage, DamageOutcome};
use crate::engine::{SimConfig, SimulationEngine};
use crate::placement::Interaction;

/// Straight 20-unit path along +x, open ground either side, two short waves.
fn straight_config() -> MatchConfig {
    use EnemyKind::*;

    MatchConfig {
        starting_health: 10,
        starting_money: 500,
        refund_percentage: 0.5,
        initial_wave_delay: 1.0,
        spawn_interval: 0.5,
        intermission_delay: 3.0,
        death_effect_secs: 0.0,
        arrival_tolerance: 0.05,
        spawn_spread: 0.0,
        level: Level {
            path: vec![Position::ground(0.0, 0.0), Position::ground(20.0, 0.0)],
            corridor_half_width: 1.0,
            buildable: vec![GroundRect::new(-10.0, -10.0, 30.0, 10.0)],
            no_build_zones: Vec::new(),
        },
        waves: vec![
            Wave::new(vec![EnemyGroup::new(Grunt, 3), EnemyGroup::new(Runner, 2)]),
            Wave::new(vec![EnemyGroup::new(Brute, 1)]),
        ],
        enemies: default_enemy_catalog(),
        towers: default_tower_catalog(),
    }
}

fn started(config: MatchConfig) -> SimulationEngine {
    let mut engine = SimulationEngine::new(SimConfig::default(), config);
    engine.start_match().expect("fresh engine starts");
    engine
}

/// Step with a fixed `dt` until `done` or `max_steps`, collecting every
/// event together with the simulation time at the start of its step.
fn run_collecting(
    engine: &mut SimulationEngine,
    dt: f64,
    max_steps: usize,
    mut done: impl FnMut(&SimulationEngine) -> bool,
) -> Vec<(f64, SimEvent)> {
    let mut events = Vec::new();
    for _ in 0..max_steps {
        let now = engine.time().elapsed_secs;
        let snapshot = engine.step(dt);
        events.extend(snapshot.events.into_iter().map(|e| (now, e)));
        if done(engine) {
            break;
        }
    }
    events
}

fn count(events: &[(f64, SimEvent)], pred: impl Fn(&SimEvent) -> bool) -> usize {
    events.iter().filter(|(_, e)| pred(e)).count()
}

fn notices(snapshot: &GameStateSnapshot) -> Vec<Rejection> {
    snapshot
        .events
        .iter()
        .filter_map(|e| match e {
            SimEvent::Notice { rejection, .. } => Some(*rejection),
            _ => None,
        })
        .collect()
}

// ---- Determinism ----

#[test]
fn test_determinism_same_seed() {
    let build = || {
        let mut engine = SimulationEngine::new(SimConfig::default().with_seed(12345), MatchConfig::default_match());
        engine.queue_commands([
            PlayerCommand::StartMatch,
            PlayerCommand::StartPlacingTower {
                kind: TowerKind::Cannon,
            },
            PlayerCommand::PointerMoved {
                point: Some(Position::ground(20.0, 9.0)),
            },
            PlayerCommand::CommitPlacement,
            PlayerCommand::StartRound,
        ]);
        engine
    };
    let mut engine_a = build();
    let mut engine_b = build();

    for _ in 0..600 {
        let json_a = serde_json::to_string(&engine_a.tick()).unwrap();
        let json_b = serde_json::to_string(&engine_b.tick()).unwrap();
        assert_eq!(json_a, json_b, "Snapshots diverged with same seed");
    }
}

#[test]
fn test_determinism_different_seeds() {
    let mut engine_a = SimulationEngine::new(SimConfig::default().with_seed(111), MatchConfig::default_match());
    let mut engine_b = SimulationEngine::new(SimConfig::default().with_seed(222), MatchConfig::default_match());
    engine_a.queue_commands([PlayerCommand::StartMatch, PlayerCommand::StartRound]);
    engine_b.queue_commands([PlayerCommand::StartMatch, PlayerCommand::StartRound]);

    // Spawn spread is the only random input; positions differ after the first spawn.
    let mut diverged = false;
    for _ in 0..120 {
        let json_a = serde_json::to_string(&engine_a.tick().enemies).unwrap();
        let json_b = serde_json::to_string(&engine_b.tick().enemies).unwrap();
        if json_a != json_b {
            diverged = true;
            break;
        }
    }
    assert!(diverged, "Different seeds should produce different spawn positions");
}

// ---- Match lifecycle ----

#[test]
fn test_start_match_prepares_first_round() {
    let mut engine = SimulationEngine::new(SimConfig::default(), straight_config());
    assert_eq!(engine.phase(), RoundPhase::NotStarted);

    engine.queue_command(PlayerCommand::StartMatch);
    let snap = engine.tick();

    assert_eq!(snap.phase, RoundPhase::AwaitingStart);
    assert_eq!(snap.round.current_round, 1);
    assert_eq!(snap.round.wave_count, 2);
    assert_eq!(snap.round.enemies_remaining, 5);
    assert_eq!(snap.economy.health, 10);
    assert_eq!(snap.economy.money, 500);
    assert!(snap.events.contains(&SimEvent::RoundReady { round: 1, enemies: 5 }));
}

#[test]
fn test_commands_before_match_are_rejected() {
    let mut engine = SimulationEngine::new(SimConfig::default(), straight_config());
    engine.queue_commands([
        PlayerCommand::StartRound,
        PlayerCommand::StartPlacingTower {
            kind: TowerKind::Cannon,
        },
    ]);
    let snap = engine.tick();
    assert_eq!(notices(&snap), vec![Rejection::MatchOver, Rejection::MatchOver]);
    assert_eq!(snap.economy.money, 500);
    assert_eq!(snap.time.tick, 0, "Clock must not run before the match starts");
}

#[test]
fn test_second_start_match_is_rejected() {
    let mut engine = started(straight_config());
    engine.queue_command(PlayerCommand::StartMatch);
    let snap = engine.tick();
    assert_eq!(notices(&snap), vec![Rejection::MatchInProgress]);
    assert_eq!(snap.round.current_round, 1);
}

#[test]
fn test_invalid_config_does_not_start() {
    let mut config = straight_config();
    config.level.path.truncate(1);
    let mut engine = SimulationEngine::new(SimConfig::default(), config);

    assert_eq!(engine.start_match(), Ok(()));
    assert_eq!(engine.phase(), RoundPhase::NotStarted);
    let snap = engine.tick();
    assert!(snap.events.is_empty());
}

#[test]
fn test_pause_stops_simulation() {
    let mut engine = started(straight_config());
    for _ in 0..10 {
        engine.tick();
    }
    assert_eq!(engine.time().tick, 10);

    engine.queue_command(PlayerCommand::Pause);
    for _ in 0..10 {
        let snap = engine.tick();
        assert!(snap.paused);
    }
    assert_eq!(engine.time().tick, 10, "Time should not advance while paused");

    engine.queue_command(PlayerCommand::Resume);
    for _ in 0..10 {
        engine.tick();
    }
    assert_eq!(engine.time().tick, 20);
}

#[test]
fn test_tick_timing_30_ticks_one_second() {
    let mut engine = started(straight_config());
    for _ in 0..30 {
        engine.tick();
    }
    assert_eq!(engine.time().tick, 30);
    assert!(
        (engine.time().elapsed_secs - 1.0).abs() < 1e-10,
        "30 ticks should equal 1.0 seconds, got {}",
        engine.time().elapsed_secs
    );
}

#[test]
fn test_time_scale_is_clamped() {
    let mut engine = SimulationEngine::new(SimConfig::default().with_time_scale(2.0), straight_config());
    assert_eq!(engine.time_scale(), 2.0);

    engine.queue_command(PlayerCommand::SetTimeScale { scale: 10.0 });
    engine.tick();
    assert_eq!(engine.time_scale(), 4.0);

    engine.queue_command(PlayerCommand::SetTimeScale { scale: -1.0 });
    engine.tick();
    assert_eq!(engine.time_scale(), 0.0);

    engine.queue_command(PlayerCommand::SetTimeScale { scale: f64::NAN });
    engine.tick();
    assert_eq!(engine.time_scale(), 0.0);
}

// ---- Round / wave scheduling ----

#[test]
fn test_wave_spawns_in_order_with_interval() {
    let mut engine = started(straight_config());
    engine.start_round().unwrap();

    let events = run_collecting(&mut engine, 0.25, 40, |_| false);
    let spawns: Vec<(f64, EnemyKind)> = events
        .iter()
        .filter_map(|(t, e)| match e {
            SimEvent::EnemySpawned { kind, .. } => Some((*t, *kind)),
            _ => None,
        })
        .collect();

    use EnemyKind::*;
    assert_eq!(
        spawns,
        vec![(1.0, Grunt), (1.5, Grunt), (2.0, Grunt), (2.5, Runner), (3.0, Runner)],
        "Groups spawn in declaration order, one every spawn interval after the initial delay"
    );
}

#[test]
fn test_spawn_interval_holds_at_fixed_tick_rate() {
    let mut engine = started(straight_config());
    engine.start_round().unwrap();

    // 1/30 never sums to exactly 0.5, so spawns must not slip a tick late.
    let mut spawn_ticks = Vec::new();
    for _ in 0..120 {
        let tick = engine.time().tick;
        let snap = engine.tick();
        spawn_ticks.extend(
            snap.events
                .iter()
                .filter(|e| matches!(e, SimEvent::EnemySpawned { .. }))
                .map(|_| tick),
        );
    }

    assert_eq!(spawn_ticks, vec![30, 45, 60, 75, 90]);
}

#[test]
fn test_start_round_rejected_while_round_active() {
    let mut engine = started(straight_config());
    engine.start_round().unwrap();
    assert_eq!(engine.start_round(), Err(Rejection::RoundAlreadyActive));

    // All five spawned but still walking: the round is still active.
    run_collecting(&mut engine, 0.25, 13, |_| false);
    assert!(engine.enemies_remaining() > 0);
    engine.queue_command(PlayerCommand::StartRound);
    let snap = engine.step(0.25);
    assert_eq!(notices(&snap), vec![Rejection::RoundAlreadyActive]);
    assert_eq!(snap.round.current_round, 1);
    assert_eq!(
        snap.enemies.len() + snap.round.pending_spawns as usize,
        5,
        "A rejected start must not spawn a second wave"
    );
}

#[test]
fn test_leaks_damage_player_and_clear_round() {
    let mut config = straight_config();
    config.waves = vec![
        Wave::new(vec![EnemyGroup::new(EnemyKind::Grunt, 2)]),
        Wave::new(vec![EnemyGroup::new(EnemyKind::Grunt, 1)]),
    ];
    let mut engine = started(config);
    engine.start_round().unwrap();

    let events = run_collecting(&mut engine, 0.1, 200, |e| e.phase() == RoundPhase::Intermission);

    assert_eq!(engine.health(), 8);
    assert_eq!(engine.enemies_remaining(), 0);
    assert_eq!(count(&events, |e| matches!(e, SimEvent::EnemyLeaked { .. })), 2);
    assert_eq!(count(&events, |e| matches!(e, SimEvent::EnemyRemoved { .. })), 2);
    assert!(events
        .iter()
        .any(|(_, e)| *e == SimEvent::PlayerDamaged { amount: 1, health: 8 }));
    assert!(events.iter().any(|(_, e)| *e == SimEvent::RoundCleared { round: 1 }));

    // The next round is prepared after the intermission delay.
    run_collecting(&mut engine, 0.1, 40, |e| e.phase() == RoundPhase::AwaitingStart);
    assert_eq!(engine.phase(), RoundPhase::AwaitingStart);
    assert_eq!(engine.current_round(), 2);
    assert_eq!(engine.enemies_remaining(), 1);
}

#[test]
fn test_health_depletion_halts_spawning_and_defeats() {
    let mut config = straight_config();
    config.starting_health = 2;
    config.level.path = vec![Position::ground(0.0, 0.0), Position::ground(2.0, 0.0)];
    config.waves = vec![Wave::new(vec![EnemyGroup::new(EnemyKind::Grunt, 5)])];
    let mut engine = started(config);
    engine.start_round().unwrap();

    let events = run_collecting(&mut engine, 0.05, 400, |e| e.phase().is_terminal());

    assert_eq!(engine.phase(), RoundPhase::Defeat);
    assert_eq!(engine.health(), 0);
    assert_eq!(
        count(&events, |e| matches!(e, SimEvent::EnemySpawned { .. })),
        3,
        "Spawns at 1.0, 1.5 and 2.0; the second leak at ~2.17 ends the match"
    );
    assert_eq!(count(&events, |e| *e == SimEvent::GameOver { won: false }), 1);
    assert!(
        engine.enemies_remaining() > 0,
        "Defeat happens regardless of enemies remaining"
    );

    // Nothing moves any more and no further spawns happen.
    let tick = engine.time().tick;
    let later = run_collecting(&mut engine, 0.05, 100, |_| false);
    assert_eq!(engine.time().tick, tick);
    assert!(later.is_empty());
}

#[test]
fn test_defeat_tick_stops_combat() {
    let mut config = straight_config();
    config.starting_health = 1;
    let mut engine = started(config);
    engine.start_round().unwrap();

    // One grunt a step from the exit, another squarely in a sniper's sights.
    engine.spawn_test_enemy(EnemyKind::Grunt, Position::ground(19.9, 0.0));
    engine.spawn_test_enemy(EnemyKind::Grunt, Position::ground(10.0, 0.0));
    engine.spawn_test_tower(TowerKind::Sniper, Position::ground(10.0, 3.0));
    let money = engine.money();

    let snap = engine.step(0.25);

    assert_eq!(engine.phase(), RoundPhase::Defeat);
    assert!(snap.events.contains(&SimEvent::GameOver { won: false }));
    assert!(!snap
        .events
        .iter()
        .any(|e| matches!(e, SimEvent::ProjectileFired { .. } | SimEvent::EnemyKilled { .. })));
    assert_eq!(engine.money(), money, "No bounty after the match is lost");
}

#[test]
fn test_full_match_victory() {
    let mut config = straight_config();
    config.waves = vec![
        Wave::new(vec![EnemyGroup::new(EnemyKind::Grunt, 1)]),
        Wave::new(vec![EnemyGroup::new(EnemyKind::Grunt, 2)]),
    ];
    let mut engine = started(config);

    // Sniper past the end of the path, firing head-on along it.
    engine.pointer_moved(Some(Position::ground(25.0, 0.0)));
    engine.start_placing_tower(TowerKind::Sniper).unwrap();
    engine.commit_placement().unwrap();
    assert_eq!(engine.money(), 350);

    let mut events = Vec::new();
    for _ in 0..3000 {
        if engine.phase() == RoundPhase::AwaitingStart {
            engine.start_round().unwrap();
        }
        let now = engine.time().elapsed_secs;
        events.extend(engine.tick().events.into_iter().map(|e| (now, e)));
        if engine.phase().is_terminal() {
            break;
        }
    }

    assert_eq!(engine.phase(), RoundPhase::Victory);
    assert_eq!(engine.health(), 10, "Every enemy should have been shot");
    assert_eq!(engine.money(), 350 + 3 * 5);
    assert_eq!(count(&events, |e| matches!(e, SimEvent::EnemyKilled { .. })), 3);
    assert_eq!(count(&events, |e| *e == SimEvent::GameOver { won: true }), 1);
    assert_eq!(engine.current_round(), 2, "Victory never indexes past the last wave");
}

#[test]
fn test_restart_after_game_over() {
    let mut config = straight_config();
    config.starting_health = 1;
    config.waves = vec![Wave::new(vec![EnemyGroup::new(EnemyKind::Runner, 1)])];
    let mut engine = started(config);
    engine.start_round().unwrap();
    run_collecting(&mut engine, 0.1, 200, |e| e.phase().is_terminal());
    assert_eq!(engine.phase(), RoundPhase::Defeat);

    engine.queue_command(PlayerCommand::StartMatch);
    let snap = engine.tick();
    assert_eq!(snap.phase, RoundPhase::AwaitingStart);
    assert_eq!(snap.economy.health, 1);
    assert_eq!(snap.round.current_round, 1);
    assert!(snap.enemies.is_empty(), "Restart clears the world");
}

// ---- Targeting & fire control ----

/// Config whose enemies barely move, for targeting tests.
fn static_config() -> MatchConfig {
    let mut config = straight_config();
    for spec in config.enemies.values_mut() {
        spec.move_speed = 0.001;
    }
    config
}

#[test]
fn test_fire_rate_two_shots_per_time_unit() {
    let mut config = static_config();
    if let Some(spec) = config.towers.get_mut(&TowerKind::Cannon) {
        spec.fire_rate = 2.0;
        spec.projectile_damage = 0.0;
    }
    let mut engine = started(config);
    engine.spawn_test_tower(TowerKind::Cannon, Position::ground(5.0, 3.0));
    engine.spawn_test_enemy(EnemyKind::Brute, Position::ground(5.0, 0.0));

    let events = run_collecting(&mut engine, 0.25, 8, |_| false);
    let fire_times: Vec<f64> = events
        .iter()
        .filter(|(_, e)| matches!(e, SimEvent::ProjectileFired { .. }))
        .map(|(t, _)| *t)
        .collect();

    assert_eq!(fire_times, vec![0.0, 0.5, 1.0, 1.5]);
}

#[test]
fn test_fire_rate_holds_at_fixed_tick_rate() {
    let mut config = static_config();
    if let Some(spec) = config.towers.get_mut(&TowerKind::Cannon) {
        spec.fire_rate = 2.0;
        spec.projectile_damage = 0.0;
    }
    let mut engine = started(config);
    engine.spawn_test_tower(TowerKind::Cannon, Position::ground(5.0, 3.0));
    engine.spawn_test_enemy(EnemyKind::Brute, Position::ground(5.0, 0.0));

    // Ten seconds of real ticks at two shots per second.
    let mut fire_ticks = Vec::new();
    for _ in 0..300 {
        let tick = engine.time().tick;
        let snap = engine.tick();
        if snap
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::ProjectileFired { .. }))
        {
            fire_ticks.push(tick);
        }
    }

    assert_eq!(fire_ticks.len(), 20);
    let expected: Vec<u64> = (0..20).map(|i| i * 15).collect();
    assert_eq!(fire_ticks, expected, "One shot every 15 ticks, no drift");
}

#[test]
fn test_tower_targets_nearest_enemy() {
    let mut config = static_config();
    if let Some(spec) = config.towers.get_mut(&TowerKind::Cannon) {
        spec.projectile_damage = 0.0;
    }
    let mut engine = started(config);
    let tower = engine.spawn_test_tower(TowerKind::Cannon, Position::ground(10.0, 5.0));
    let far = engine.spawn_test_enemy(EnemyKind::Grunt, Position::ground(10.0, 0.0));
    let near = engine.spawn_test_enemy(EnemyKind::Grunt, Position::ground(12.0, 3.0));

    let snap = engine.step(0.1);
    let view = snap.towers.iter().find(|t| t.tower_id == tower).unwrap();
    assert_eq!(view.target, Some(near));
    assert_ne!(view.target, Some(far));
}

#[test]
fn test_equidistant_enemies_resolve_to_lower_id() {
    let mut config = straight_config();
    for spec in config.enemies.values_mut() {
        spec.move_speed = 1.0;
    }
    if let Some(spec) = config.towers.get_mut(&TowerKind::Cannon) {
        spec.projectile_damage = 0.0;
    }
    let mut engine = started(config);

    // Both walk straight at the tower on the path's end, so they stay
    // exactly equidistant from it.
    engine.spawn_test_tower(TowerKind::Cannon, Position::ground(20.0, 0.0));
    let first = engine.spawn_test_enemy(EnemyKind::Grunt, Position::ground(20.0, 3.0));
    let second = engine.spawn_test_enemy(EnemyKind::Grunt, Position::ground(17.0, 0.0));
    assert!(first < second);

    for _ in 0..4 {
        let snap = engine.step(0.25);
        assert_eq!(snap.towers[0].target, Some(first));
    }
}

#[test]
fn test_target_cleared_when_out_of_range() {
    let mut engine = started(static_config());
    engine.spawn_test_tower(TowerKind::Cannon, Position::ground(-8.0, 8.0));
    engine.spawn_test_enemy(EnemyKind::Grunt, Position::ground(10.0, 0.0));

    let snap = engine.step(0.1);
    assert_eq!(snap.towers[0].target, None);
    assert!(!snap
        .events
        .iter()
        .any(|e| matches!(e, SimEvent::ProjectileFired { .. })));
}

#[test]
fn test_simultaneous_lethal_hits_kill_once() {
    let mut engine = started(static_config());
    engine.spawn_test_tower(TowerKind::Sniper, Position::ground(10.0, 5.0));
    engine.spawn_test_tower(TowerKind::Sniper, Position::ground(10.0, -5.0));
    let enemy = engine.spawn_test_enemy(EnemyKind::Grunt, Position::ground(10.0, 0.0));
    let money = engine.money();

    // Both shots leave on the first step and arrive in the same step.
    let events = run_collecting(&mut engine, 0.25, 3, |_| false);

    assert_eq!(count(&events, |e| matches!(e, SimEvent::ProjectileFired { .. })), 2);
    assert_eq!(count(&events, |e| matches!(e, SimEvent::ProjectileHit { .. })), 1);
    assert_eq!(
        count(&events, |e| matches!(e, SimEvent::EnemyKilled { enemy_id, .. } if *enemy_id == enemy)),
        1
    );
    assert_eq!(engine.money(), money + 5);
}

#[test]
fn test_dead_target_is_dropped() {
    let mut engine = started(static_config());
    engine.spawn_test_tower(TowerKind::Sniper, Position::ground(10.0, 5.0));
    engine.spawn_test_enemy(EnemyKind::Grunt, Position::ground(10.0, 0.0));

    run_collecting(&mut engine, 0.25, 2, |_| false);
    let snap = engine.step(0.25);
    assert!(snap.enemies.is_empty());
    assert_eq!(snap.towers[0].target, None);
}

#[test]
fn test_missed_projectile_expires() {
    let mut config = static_config();
    if let Some(spec) = config.towers.get_mut(&TowerKind::Cannon) {
        spec.fire_rate = 0.1;
        spec.projectile_speed = 1.0;
        spec.projectile_lifetime_secs = 0.5;
    }
    let mut engine = started(config);
    engine.spawn_test_tower(TowerKind::Cannon, Position::ground(10.0, 5.0));
    engine.spawn_test_enemy(EnemyKind::Grunt, Position::ground(10.0, 0.0));

    // Travels half a unit before its lifetime runs out.
    let events = run_collecting(&mut engine, 0.1, 10, |_| false);
    assert_eq!(count(&events, |e| matches!(e, SimEvent::ProjectileFired { .. })), 1);
    assert_eq!(count(&events, |e| matches!(e, SimEvent::ProjectileHit { .. })), 0);
    assert_eq!(count(&events, |e| matches!(e, SimEvent::ProjectileExpired { .. })), 1);
    assert!(engine.tick().projectiles.is_empty());
}

// ---- Placement & selling ----

#[test]
fn test_placement_round_trip_restores_money() {
    let mut engine = started(straight_config());
    engine.queue_command(PlayerCommand::StartPlacingTower {
        kind: TowerKind::Rapid,
    });
    let snap = engine.tick();
    assert_eq!(snap.economy.money, 380);
    assert_eq!(snap.interaction.mode, InteractionMode::Placing);
    assert_eq!(snap.interaction.preview_kind, Some(TowerKind::Rapid));

    engine.queue_command(PlayerCommand::CancelPlacement);
    let snap = engine.tick();
    assert_eq!(snap.economy.money, 500);
    assert_eq!(snap.interaction.mode, InteractionMode::Idle);
}

#[test]
fn test_insufficient_money_is_a_notice() {
    let mut config = straight_config();
    config.starting_money = 90;
    let mut engine = started(config);
    engine.queue_command(PlayerCommand::StartPlacingTower {
        kind: TowerKind::Cannon,
    });
    let snap = engine.tick();
    assert_eq!(
        notices(&snap),
        vec![Rejection::InsufficientMoney { cost: 100, money: 90 }]
    );
    assert_eq!(snap.economy.money, 90);
    assert_eq!(snap.interaction.mode, InteractionMode::Idle);
}

#[test]
fn test_illegal_commit_keeps_preview() {
    let mut engine = started(straight_config());
    engine.queue_commands([
        PlayerCommand::StartPlacingTower {
            kind: TowerKind::Cannon,
        },
        PlayerCommand::PointerMoved {
            point: Some(Position::ground(10.0, 0.5)),
        },
        PlayerCommand::CommitPlacement,
    ]);
    let snap = engine.tick();
    assert_eq!(notices(&snap), vec![Rejection::IllegalPlacement]);
    assert_eq!(snap.interaction.mode, InteractionMode::Placing);
    assert_eq!(snap.interaction.preview_position, Some(Position::ground(10.0, 0.5)));
    assert!(!snap.interaction.preview_legal);
    assert!(snap.towers.is_empty());

    engine.queue_commands([
        PlayerCommand::PointerMoved {
            point: Some(Position::ground(10.0, 4.0)),
        },
        PlayerCommand::CommitPlacement,
    ]);
    let snap = engine.tick();
    assert!(notices(&snap).is_empty());
    assert_eq!(snap.towers.len(), 1);
    assert_eq!(snap.towers[0].position, Position::ground(10.0, 4.0));
    assert_eq!(snap.economy.money, 400);
}

#[test]
fn test_sell_refunds_floor_of_cost() {
    let mut config = straight_config();
    if let Some(spec) = config.towers.get_mut(&TowerKind::Cannon) {
        spec.cost = 101;
    }
    let mut engine = started(config);
    engine.pointer_moved(Some(Position::ground(10.0, 4.0)));
    engine.start_placing_tower(TowerKind::Cannon).unwrap();
    let tower = engine.commit_placement().unwrap();
    assert_eq!(engine.money(), 399);

    engine.queue_commands([
        PlayerCommand::StartSellMode,
        PlayerCommand::SellHoveredTower,
        PlayerCommand::HoverTower {
            tower_id: Some(tower),
        },
        PlayerCommand::SellHoveredTower,
    ]);
    let snap = engine.tick();
    assert_eq!(notices(&snap), vec![Rejection::NothingHovered]);
    assert!(snap.events.contains(&SimEvent::TowerSold {
        tower_id: tower,
        refund: 50
    }));
    assert_eq!(snap.economy.money, 449);
    assert!(snap.towers.is_empty());
    assert_eq!(snap.interaction.mode, InteractionMode::Selling);
}

#[test]
fn test_modes_are_mutually_exclusive() {
    let mut engine = started(straight_config());
    engine.start_placing_tower(TowerKind::Sniper).unwrap();
    assert_eq!(engine.money(), 350);

    engine.start_sell_mode().unwrap();
    assert_eq!(engine.interaction().mode(), InteractionMode::Selling);
    assert_eq!(engine.money(), 500, "Entering sell mode cancels and refunds the preview");

    engine.start_placing_tower(TowerKind::Cannon).unwrap();
    assert_eq!(engine.interaction().mode(), InteractionMode::Placing);
    assert_eq!(engine.exit_sell_mode(), Err(Rejection::NotSelling));
}

#[test]
fn test_sell_value_in_snapshot() {
    let mut engine = started(straight_config());
    engine.spawn_test_tower(TowerKind::Sniper, Position::ground(5.0, 5.0));
    let snap = engine.tick();
    assert_eq!(snap.towers[0].sell_value, 75);
}

#[test]
fn test_snapshot_serializes_mid_round() {
    let mut engine = started(MatchConfig::default_match());
    engine.start_round().unwrap();
    let mut snap = engine.tick();
    for _ in 0..90 {
        snap = engine.tick();
    }
    assert!(!snap.enemies.is_empty());
    let json = serde_json::to_string(&snap).unwrap();
    let back: GameStateSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back.enemies.len(), snap.enemies.len());
}

// ---- Properties ----

proptest! {
    #[test]
    fn prop_lethal_damage_latches_exactly_once(
        health in 1u32..100,
        hits in prop::collection::vec(0u32..50, 1..12),
    ) {
        let mut stats = EnemyStats {
            health: health as f64,
            max_health: health as f64,
            move_speed: 1.0,
            money_on_kill: 1,
            damage_on_reach_end: 1,
        };
        let mut life = Lifecycle::default();

        let kills = hits
            .iter()
            .filter(|&&hit| apply_damage(&mut stats, &mut life, hit as f64, 0.0) == DamageOutcome::Killed)
            .count();
        let lethal = hits.iter().sum::<u32>() >= health;

        prop_assert_eq!(kills, usize::from(lethal));
        prop_assert_eq!(life.phase == EnemyPhase::Dying, lethal);
        prop_assert!(stats.health >= 0.0);
    }

    #[test]
    fn prop_refund_is_floor_of_percentage(cost in 0u32..100_000, percent in 0u32..=100) {
        let config = MatchConfig {
            refund_percentage: percent as f64 / 100.0,
            ..straight_config()
        };
        let expected = (cost as u64 * percent as u64 / 100) as u32;
        prop_assert_eq!(config.refund_for(cost), expected);
    }

    #[test]
    fn prop_placement_round_trip(money in 0u32..400, kind_index in 0usize..3) {
        let kind = [TowerKind::Cannon, TowerKind::Sniper, TowerKind::Rapid][kind_index];
        let config = straight_config();
        let mut economy = Economy::new(10, money);
        let mut interaction = Interaction::Idle;
        let mut events = Vec::new();

        match interaction.start_placement(kind, &config, &mut economy, &mut events) {
            Ok(()) => {
                prop_assert!(economy.money() < money || config.towers[&kind].cost == 0);
                interaction.cancel(&mut economy, &mut events).unwrap();
            }
            Err(rejection) => {
                let is_insufficient = matches!(rejection, Rejection::InsufficientMoney { .. });
                prop_assert!(is_insufficient);
            }
        }
        prop_assert_eq!(economy.money(), money);
        prop_assert_eq!(interaction, Interaction::Idle);
    }
}

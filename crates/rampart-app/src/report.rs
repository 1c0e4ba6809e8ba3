//! Turns simulation events into log lines.

use tracing::{debug, info, trace, warn};

use rampart_core::events::SimEvent;
use rampart_core::state::GameStateSnapshot;

/// Log one event at a level matching its importance.
pub fn log_event(tick: u64, event: &SimEvent) {
    match event {
        SimEvent::RoundReady { round, enemies } => info!(tick, round, enemies, "round ready"),
        SimEvent::RoundStarted { round } => info!(tick, round, "round started"),
        SimEvent::RoundCleared { round } => info!(tick, round, "round cleared"),
        SimEvent::GameOver { won } => info!(tick, won, "game over"),
        SimEvent::PlayerDamaged { amount, health } => info!(tick, amount, health, "player damaged"),
        SimEvent::TowerPlaced {
            tower_id,
            kind,
            position,
        } => info!(
            tick,
            tower = tower_id,
            ?kind,
            x = position.0.x,
            z = position.0.z,
            "tower placed"
        ),
        SimEvent::TowerSold { tower_id, refund } => info!(tick, tower = tower_id, refund, "tower sold"),
        SimEvent::Notice { message, .. } => warn!(tick, "{message}"),
        SimEvent::EnemySpawned { enemy_id, kind, .. } => debug!(tick, enemy = enemy_id, ?kind, "enemy spawned"),
        SimEvent::EnemyKilled {
            enemy_id, reward, ..
        } => debug!(tick, enemy = enemy_id, reward, "enemy killed"),
        SimEvent::EnemyLeaked { enemy_id, damage } => debug!(tick, enemy = enemy_id, damage, "enemy leaked"),
        other => trace!(tick, event = ?other),
    }
}

/// One-line end-of-run summary.
pub fn log_summary(snapshot: &GameStateSnapshot) {
    info!(
        tick = snapshot.time.tick,
        elapsed = snapshot.time.elapsed_secs,
        phase = ?snapshot.phase,
        round = snapshot.round.current_round,
        waves = snapshot.round.wave_count,
        health = snapshot.economy.health,
        money = snapshot.economy.money,
        towers = snapshot.towers.len(),
        "run finished"
    );
}

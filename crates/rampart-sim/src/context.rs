//! Match context handed to systems each tick.
//!
//! Bundles the shared match state (economy, scheduler, config, event sink)
//! so systems receive it explicitly instead of reaching for globals.

use tracing::{debug, info};

use rampart_core::config::MatchConfig;
use rampart_core::enums::EnemyKind;
use rampart_core::events::SimEvent;
use rampart_core::types::Position;

use crate::economy::Economy;
use crate::systems::wave_scheduler::RoundScheduler;

pub struct MatchContext<'a> {
    pub config: &'a MatchConfig,
    pub economy: &'a mut Economy,
    pub scheduler: &'a mut RoundScheduler,
    pub events: &'a mut Vec<SimEvent>,
    /// Simulation time at the start of this tick.
    pub now: f64,
}

impl MatchContext<'_> {
    /// An enemy's health crossed zero: pay the bounty and tell the scheduler.
    pub fn enemy_killed(&mut self, enemy_id: u32, kind: EnemyKind, reward: u32, position: Position) {
        self.economy.earn(reward);
        debug!(enemy = enemy_id, reward, money = self.economy.money(), "enemy killed");
        self.events.push(SimEvent::EnemyKilled {
            enemy_id,
            kind,
            reward,
            position,
        });
        self.scheduler
            .on_enemy_defeated(self.now, self.config.intermission_delay, self.events);
    }

    /// An enemy walked off the end of the path: damage the player and tell
    /// the scheduler. Depleting health ends the match.
    pub fn enemy_leaked(&mut self, enemy_id: u32, damage: u32) {
        let health = self.economy.damage(damage);
        info!(enemy = enemy_id, damage, health, "enemy leaked");
        self.events.push(SimEvent::EnemyLeaked { enemy_id, damage });
        self.events.push(SimEvent::PlayerDamaged {
            amount: damage,
            health,
        });

        if self.economy.is_depleted() {
            self.scheduler.defeat(self.events);
        }
        self.scheduler
            .on_enemy_defeated(self.now, self.config.intermission_delay, self.events);
    }
}

//! Round/wave scheduler: drives round progression and the spawn cadence.
//!
//! `AwaitingStart -> Spawning -> Intermission -> AwaitingStart (next round)`,
//! with `Victory` and `Defeat` as terminal states.
//!
//! The spawn sequence is a resumable task: it records the simulation time at
//! which it next wants to act and is advanced by the tick loop. It carries a
//! cancellation flag that is checked before every resumption.

use hecs::World;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use rampart_core::config::{MatchConfig, Wave};
use rampart_core::constants::TIME_EPSILON;
use rampart_core::enums::{EnemyKind, RoundPhase};
use rampart_core::error::Rejection;
use rampart_core::events::SimEvent;

use crate::context::MatchContext;

/// Suspended spawn continuation for one round.
#[derive(Debug, Clone)]
pub struct SpawnSequence {
    /// Index into the match's waves.
    wave_index: usize,
    /// Group currently being emitted.
    group: usize,
    /// Enemies already emitted from `group`.
    emitted_in_group: u32,
    /// Simulation time of the next resumption.
    resume_at: f64,
    cancelled: bool,
}

/// Round state machine. References the authored waves, never copies them.
#[derive(Debug, Clone, Default)]
pub struct RoundScheduler {
    phase: RoundPhase,
    /// 1-based; 0 until the first round is prepared.
    current_round: u32,
    enemies_remaining: u32,
    spawn: Option<SpawnSequence>,
    /// When the intermission ends and the next round is prepared.
    intermission_until: Option<f64>,
}

impl SpawnSequence {
    fn new(wave_index: usize, resume_at: f64) -> Self {
        Self {
            wave_index,
            group: 0,
            emitted_in_group: 0,
            resume_at,
            cancelled: false,
        }
    }

    /// Enemies of the wave not emitted yet.
    fn pending(&self, wave: &Wave) -> u32 {
        wave.groups
            .iter()
            .skip(self.group)
            .map(|g| g.count)
            .sum::<u32>()
            .saturating_sub(self.emitted_in_group)
    }
}

impl RoundScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn enemies_remaining(&self) -> u32 {
        self.enemies_remaining
    }

    /// Whether a spawn sequence is still suspended.
    pub fn is_spawning(&self) -> bool {
        self.spawn.as_ref().is_some_and(|s| !s.cancelled)
    }

    /// Enemies of the current wave not spawned yet.
    pub fn pending_spawns(&self, waves: &[Wave]) -> u32 {
        self.spawn
            .as_ref()
            .filter(|s| !s.cancelled)
            .and_then(|s| waves.get(s.wave_index).map(|w| s.pending(w)))
            .unwrap_or(0)
    }

    /// Advance to the next round, or declare victory after the last one.
    pub fn prepare_round(&mut self, waves: &[Wave], events: &mut Vec<SimEvent>) {
        if self.phase.is_terminal() {
            return;
        }

        // Bounds check before indexing: past the last wave means victory.
        let Some(wave) = waves.get(self.current_round as usize) else {
            self.finish(true, events);
            return;
        };

        self.current_round += 1;
        self.enemies_remaining = wave.total_enemies();
        self.intermission_until = None;
        self.phase = RoundPhase::AwaitingStart;

        info!(
            round = self.current_round,
            enemies = self.enemies_remaining,
            "round ready"
        );
        events.push(SimEvent::RoundReady {
            round: self.current_round,
            enemies: self.enemies_remaining,
        });
    }

    /// Begin spawning the prepared round after `initial_delay`.
    pub fn start_round(
        &mut self,
        now: f64,
        initial_delay: f64,
        events: &mut Vec<SimEvent>,
    ) -> Result<(), Rejection> {
        match self.phase {
            RoundPhase::Spawning => return Err(Rejection::RoundAlreadyActive),
            RoundPhase::Victory | RoundPhase::Defeat | RoundPhase::NotStarted => {
                return Err(Rejection::MatchOver)
            }
            RoundPhase::Intermission => return Err(Rejection::RoundNotReady),
            RoundPhase::AwaitingStart => {}
        }

        if let Some(stale) = self.spawn.take() {
            debug!(
                wave = stale.wave_index + 1,
                "stopping stale spawn sequence before starting a new one"
            );
        }

        let wave_index = self.current_round.saturating_sub(1) as usize;
        self.spawn = Some(SpawnSequence::new(wave_index, now + initial_delay));
        self.phase = RoundPhase::Spawning;

        info!(round = self.current_round, "round started");
        events.push(SimEvent::RoundStarted {
            round: self.current_round,
        });
        Ok(())
    }

    /// Resume the spawn sequence if it is due. Returns the kinds to spawn
    /// this tick, in order.
    pub fn poll_spawns(
        &mut self,
        now: f64,
        waves: &[Wave],
        spawn_interval: f64,
        player_alive: bool,
    ) -> Vec<EnemyKind> {
        let mut due = Vec::new();
        let Some(seq) = self.spawn.as_mut() else {
            return due;
        };

        if seq.cancelled {
            self.spawn = None;
            return due;
        }
        if !player_alive {
            debug!("player health depleted, spawn sequence cancelled");
            self.spawn = None;
            return due;
        }

        let Some(wave) = waves.get(seq.wave_index) else {
            warn!(wave = seq.wave_index + 1, "spawn sequence refers to a missing wave");
            self.spawn = None;
            return due;
        };

        let mut finished = false;
        while now + TIME_EPSILON >= seq.resume_at {
            let Some(group) = wave.groups.get(seq.group) else {
                finished = true;
                break;
            };

            due.push(group.kind);
            seq.emitted_in_group += 1;
            if seq.emitted_in_group >= group.count {
                seq.group += 1;
                seq.emitted_in_group = 0;
            }
            if seq.group >= wave.groups.len() {
                finished = true;
                break;
            }
            seq.resume_at += spawn_interval;
        }

        if finished {
            self.spawn = None;
        }
        due
    }

    /// Stop the spawn sequence at its next resumption point.
    pub fn cancel_spawns(&mut self) {
        if let Some(seq) = self.spawn.as_mut() {
            seq.cancelled = true;
        }
    }

    /// One enemy reached a terminal event (killed or leaked).
    pub fn on_enemy_defeated(&mut self, now: f64, intermission_delay: f64, events: &mut Vec<SimEvent>) {
        self.enemies_remaining = self.enemies_remaining.saturating_sub(1);

        if self.enemies_remaining == 0 && self.phase == RoundPhase::Spawning {
            self.phase = RoundPhase::Intermission;
            self.intermission_until = Some(now + intermission_delay);
            info!(round = self.current_round, "round cleared");
            events.push(SimEvent::RoundCleared {
                round: self.current_round,
            });
        }
    }

    /// Prepare the next round once the intermission has elapsed.
    pub fn poll_intermission(&mut self, now: f64, waves: &[Wave], events: &mut Vec<SimEvent>) {
        if self.phase != RoundPhase::Intermission {
            return;
        }
        if self.intermission_until.is_some_and(|until| now + TIME_EPSILON >= until) {
            self.prepare_round(waves, events);
        }
    }

    /// Player health reached zero. Valid from any non-terminal state.
    pub fn defeat(&mut self, events: &mut Vec<SimEvent>) {
        if self.phase.is_terminal() {
            return;
        }
        self.finish(false, events);
    }

    fn finish(&mut self, won: bool, events: &mut Vec<SimEvent>) {
        self.cancel_spawns();
        self.intermission_until = None;
        self.phase = if won {
            RoundPhase::Victory
        } else {
            RoundPhase::Defeat
        };
        info!(won, round = self.current_round, "game over");
        events.push(SimEvent::GameOver { won });
    }
}

/// Scheduler system: finish intermissions, then spawn every enemy that is due.
pub fn run(
    world: &mut World,
    rng: &mut ChaCha8Rng,
    ctx: &mut MatchContext<'_>,
    next_enemy_id: &mut u32,
) {
    let config: &MatchConfig = ctx.config;
    ctx.scheduler
        .poll_intermission(ctx.now, &config.waves, ctx.events);

    let due = ctx.scheduler.poll_spawns(
        ctx.now,
        &config.waves,
        config.spawn_interval,
        !ctx.economy.is_depleted(),
    );

    for kind in due {
        let id = *next_enemy_id;
        *next_enemy_id += 1;
        match crate::world_setup::spawn_enemy(world, rng, config, kind, id) {
            Some(position) => {
                debug!(enemy = id, ?kind, "enemy spawned");
                ctx.events.push(SimEvent::EnemySpawned {
                    enemy_id: id,
                    kind,
                    position,
                });
            }
            None => {
                // Count it as gone so the round can still clear.
                warn!(?kind, "no stats configured for enemy kind, spawn skipped");
                ctx.scheduler
                    .on_enemy_defeated(ctx.now, config.intermission_delay, ctx.events);
            }
        }
    }
}

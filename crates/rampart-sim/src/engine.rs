//! Simulation engine: the core of the game.
//!
//! `SimulationEngine` owns the hecs ECS world, processes player commands,
//! runs all systems, and produces `GameStateSnapshot`s. Completely headless,
//! enabling deterministic testing.

use std::collections::VecDeque;

use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use rampart_core::commands::PlayerCommand;
use rampart_core::config::MatchConfig;
use rampart_core::constants::{DT, MAX_TIME_SCALE};
use rampart_core::enums::{RoundPhase, TowerKind};
use rampart_core::error::Rejection;
use rampart_core::events::SimEvent;
use rampart_core::state::GameStateSnapshot;
use rampart_core::types::{Position, SimTime};

use crate::context::MatchContext;
use crate::economy::Economy;
use crate::placement::Interaction;
use crate::spatial::{BruteForceQuery, SpatialQuery};
use crate::systems;
use crate::systems::snapshot::SnapshotInputs;
use crate::systems::wave_scheduler::RoundScheduler;
use crate::world_setup;

/// Configuration for starting a new simulation.
#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same simulation.
    pub seed: u64,
    /// Initial time scale (1.0 = normal).
    pub time_scale: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            time_scale: 1.0,
        }
    }
}

impl SimConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.time_scale = time_scale;
        self
    }
}

/// The simulation engine. Owns the ECS world and all match state.
pub struct SimulationEngine {
    world: World,
    time: SimTime,
    paused: bool,
    time_scale: f64,
    seed: u64,
    rng: ChaCha8Rng,
    next_enemy_id: u32,
    next_tower_id: u32,
    next_projectile_id: u32,
    command_queue: VecDeque<PlayerCommand>,
    despawn_buffer: Vec<Entity>,
    events: Vec<SimEvent>,

    config: MatchConfig,
    economy: Economy,
    scheduler: RoundScheduler,
    interaction: Interaction,
    /// Last ground point reported by the pointer raycast.
    pointer: Option<Position>,
    spatial: Box<dyn SpatialQuery>,
}

impl SimulationEngine {
    /// Create an engine for `config`. Nothing happens until `StartMatch`.
    pub fn new(sim: SimConfig, config: MatchConfig) -> Self {
        Self {
            world: World::new(),
            time: SimTime::default(),
            paused: false,
            time_scale: clamp_time_scale(sim.time_scale, 1.0),
            seed: sim.seed,
            rng: ChaCha8Rng::seed_from_u64(sim.seed),
            next_enemy_id: 0,
            next_tower_id: 0,
            next_projectile_id: 0,
            command_queue: VecDeque::new(),
            despawn_buffer: Vec::new(),
            events: Vec::new(),
            economy: Economy::new(config.starting_health, config.starting_money),
            config,
            scheduler: RoundScheduler::new(),
            interaction: Interaction::Idle,
            pointer: None,
            spatial: Box::new(BruteForceQuery),
        }
    }

    /// Replace the spatial query collaborator.
    pub fn with_spatial_query(mut self, spatial: Box<dyn SpatialQuery>) -> Self {
        self.spatial = spatial;
        self
    }

    /// Queue a player command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: PlayerCommand) {
        self.command_queue.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = PlayerCommand>) {
        self.command_queue.extend(commands);
    }

    /// Advance the simulation by one fixed tick and return the resulting snapshot.
    pub fn tick(&mut self) -> GameStateSnapshot {
        self.step(DT)
    }

    /// Advance by an arbitrary `dt`. Commands are processed first; systems
    /// and the clock only run while a match is in progress and not paused.
    pub fn step(&mut self, dt: f64) -> GameStateSnapshot {
        self.process_commands();

        if !self.paused && self.scheduler.phase().is_active() {
            self.run_systems(dt);
            self.time.advance(dt);
        }

        self.snapshot()
    }

    pub fn phase(&self) -> RoundPhase {
        self.scheduler.phase()
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn health(&self) -> u32 {
        self.economy.health()
    }

    pub fn money(&self) -> u32 {
        self.economy.money()
    }

    pub fn current_round(&self) -> u32 {
        self.scheduler.current_round()
    }

    pub fn wave_count(&self) -> u32 {
        self.config.wave_count()
    }

    pub fn enemies_remaining(&self) -> u32 {
        self.scheduler.enemies_remaining()
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Get a read-only reference to the ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    // --- Player operations. Each mirrors one `PlayerCommand`. ---

    /// Build the match world and prepare round 1. Also restarts a finished
    /// match. An invalid configuration is logged and nothing starts.
    pub fn start_match(&mut self) -> Result<(), Rejection> {
        if self.scheduler.phase().is_active() {
            return Err(Rejection::MatchInProgress);
        }
        if let Err(error) = self.config.validate() {
            warn!(%error, "match configuration is invalid, not starting");
            return Ok(());
        }

        self.world.clear();
        world_setup::setup_match(&mut self.world, &self.config);
        self.time = SimTime::default();
        self.paused = false;
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.next_enemy_id = 0;
        self.next_tower_id = 0;
        self.next_projectile_id = 0;
        self.economy = Economy::new(self.config.starting_health, self.config.starting_money);
        self.scheduler = RoundScheduler::new();
        self.interaction = Interaction::Idle;

        info!(
            waves = self.config.wave_count(),
            health = self.economy.health(),
            money = self.economy.money(),
            "match started"
        );
        self.scheduler.prepare_round(&self.config.waves, &mut self.events);
        Ok(())
    }

    pub fn start_round(&mut self) -> Result<(), Rejection> {
        self.scheduler.start_round(
            self.time.elapsed_secs,
            self.config.initial_wave_delay,
            &mut self.events,
        )
    }

    pub fn start_placing_tower(&mut self, kind: TowerKind) -> Result<(), Rejection> {
        self.require_match()?;
        self.interaction
            .start_placement(kind, &self.config, &mut self.economy, &mut self.events)?;
        self.interaction
            .refresh_preview(self.pointer, &self.world, &self.config, self.spatial.as_ref());
        Ok(())
    }

    /// Result of the external pointer raycast against the ground.
    pub fn pointer_moved(&mut self, point: Option<Position>) {
        self.pointer = point;
        self.interaction
            .refresh_preview(point, &self.world, &self.config, self.spatial.as_ref());
    }

    /// Place the previewed tower. Returns the new tower's id.
    pub fn commit_placement(&mut self) -> Result<u32, Rejection> {
        self.require_match()?;
        self.interaction.commit(
            &mut self.world,
            &self.config,
            self.spatial.as_ref(),
            &mut self.next_tower_id,
            &mut self.events,
        )
    }

    pub fn cancel_placement(&mut self) -> Result<(), Rejection> {
        self.interaction.cancel(&mut self.economy, &mut self.events)
    }

    pub fn start_sell_mode(&mut self) -> Result<(), Rejection> {
        self.require_match()?;
        self.interaction
            .start_sell_mode(&mut self.economy, &mut self.events);
        Ok(())
    }

    pub fn exit_sell_mode(&mut self) -> Result<(), Rejection> {
        self.interaction.exit_sell_mode(&mut self.events)
    }

    /// Result of the external tower raycast while selling.
    pub fn hover_tower(&mut self, tower_id: Option<u32>) {
        self.interaction.hover(tower_id);
    }

    /// Sell the hovered tower. Returns the refund.
    pub fn sell_hovered_tower(&mut self) -> Result<u32, Rejection> {
        self.require_match()?;
        self.interaction.sell_hovered(
            &mut self.world,
            &self.config,
            &mut self.economy,
            &mut self.events,
        )
    }

    pub fn set_time_scale(&mut self, scale: f64) {
        self.time_scale = clamp_time_scale(scale, self.time_scale);
    }

    pub fn pause(&mut self) {
        if self.scheduler.phase().is_active() {
            self.paused = true;
        }
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    fn require_match(&self) -> Result<(), Rejection> {
        if self.scheduler.phase().is_active() {
            Ok(())
        } else {
            Err(Rejection::MatchOver)
        }
    }

    /// Process all queued commands.
    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            if let Err(rejection) = self.handle_command(&command) {
                debug!(?command, %rejection, "command rejected");
                self.events.push(SimEvent::notice(rejection));
            }
        }
    }

    /// Handle a single player command.
    fn handle_command(&mut self, command: &PlayerCommand) -> Result<(), Rejection> {
        match *command {
            PlayerCommand::StartMatch => self.start_match(),
            PlayerCommand::StartRound => self.start_round(),
            PlayerCommand::StartPlacingTower { kind } => self.start_placing_tower(kind),
            PlayerCommand::PointerMoved { point } => {
                self.pointer_moved(point);
                Ok(())
            }
            PlayerCommand::CommitPlacement => self.commit_placement().map(|_| ()),
            PlayerCommand::CancelPlacement => self.cancel_placement(),
            PlayerCommand::StartSellMode => self.start_sell_mode(),
            PlayerCommand::ExitSellMode => self.exit_sell_mode(),
            PlayerCommand::HoverTower { tower_id } => {
                self.hover_tower(tower_id);
                Ok(())
            }
            PlayerCommand::SellHoveredTower => self.sell_hovered_tower().map(|_| ()),
            PlayerCommand::SetTimeScale { scale } => {
                self.set_time_scale(scale);
                Ok(())
            }
            PlayerCommand::Pause => {
                self.pause();
                Ok(())
            }
            PlayerCommand::Resume => {
                self.resume();
                Ok(())
            }
        }
    }

    /// Run all systems in order.
    fn run_systems(&mut self, dt: f64) {
        let now = self.time.elapsed_secs;
        let mut ctx = MatchContext {
            config: &self.config,
            economy: &mut self.economy,
            scheduler: &mut self.scheduler,
            events: &mut self.events,
            now,
        };

        // 1. Intermission timer and due spawns
        systems::wave_scheduler::run(&mut self.world, &mut self.rng, &mut ctx, &mut self.next_enemy_id);
        // 2. Placement preview follows the pointer
        self.interaction
            .refresh_preview(self.pointer, &self.world, ctx.config, self.spatial.as_ref());
        // 3. Enemies walk the path; leaks report here
        systems::movement::run(&mut self.world, &mut ctx, dt);
        if ctx.scheduler.phase().is_terminal() {
            // A leak ended the match: nothing fires or pays out after GameOver.
            return;
        }
        // 4. Target selection and firing
        systems::fire_control::run(
            &mut self.world,
            self.spatial.as_ref(),
            now,
            &mut self.next_projectile_id,
            ctx.events,
        );
        // 5. Projectile travel and hits; kills report here
        systems::projectiles::run(&mut self.world, &mut ctx, dt, &mut self.despawn_buffer);
        // 6. Remove enemies whose death effect finished
        systems::cleanup::run(&mut self.world, dt, &mut self.despawn_buffer, ctx.events);
    }

    fn snapshot(&mut self) -> GameStateSnapshot {
        let events = std::mem::take(&mut self.events);
        systems::snapshot::build_snapshot(
            &self.world,
            SnapshotInputs {
                time: self.time,
                paused: self.paused,
                config: &self.config,
                economy: &self.economy,
                scheduler: &self.scheduler,
                interaction: &self.interaction,
            },
            events,
        )
    }

    // --- Test helpers ---

    /// Spawn an enemy directly, bypassing the scheduler. The scheduler's
    /// remaining count is not touched. Returns the enemy id.
    #[cfg(test)]
    pub fn spawn_test_enemy(
        &mut self,
        kind: rampart_core::enums::EnemyKind,
        position: Position,
    ) -> u32 {
        let id = self.next_enemy_id;
        self.next_enemy_id += 1;
        let mut config = self.config.clone();
        config.spawn_spread = 0.0;
        config.level.path[0] = position;
        world_setup::spawn_enemy(&mut self.world, &mut self.rng, &config, kind, id);
        id
    }

    /// Spawn a tower directly, bypassing placement and the economy.
    #[cfg(test)]
    pub fn spawn_test_tower(&mut self, kind: TowerKind, position: Position) -> u32 {
        let id = self.next_tower_id;
        self.next_tower_id += 1;
        if let Some(spec) = self.config.towers.get(&kind).copied() {
            world_setup::spawn_tower(&mut self.world, id, kind, &spec, position);
        }
        id
    }
}

fn clamp_time_scale(scale: f64, fallback: f64) -> f64 {
    if scale.is_nan() {
        return fallback;
    }
    scale.clamp(0.0, MAX_TIME_SCALE)
}

//! Simulation constants and tuning defaults.

/// Simulation tick rate (Hz).
pub const TICK_RATE: u32 = 30;

/// Time units per tick at 1x.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

/// Upper bound for the time scale multiplier.
pub const MAX_TIME_SCALE: f64 = 4.0;

/// Slack for "is this scheduled time due" checks. The clock is a running sum
/// of `DT`, so 15 ticks land a hair below 0.5.
pub const TIME_EPSILON: f64 = 1e-9;

// --- Economy ---

pub const DEFAULT_STARTING_HEALTH: u32 = 20;

pub const DEFAULT_STARTING_MONEY: u32 = 250;

/// Fraction of the purchase cost returned on sale.
pub const DEFAULT_REFUND_PERCENTAGE: f64 = 0.5;

// --- Rounds ---

/// Delay between `StartRound` and the first spawn.
pub const DEFAULT_INITIAL_WAVE_DELAY: f64 = 1.0;

/// Delay after each spawned enemy.
pub const DEFAULT_SPAWN_INTERVAL: f64 = 0.8;

/// Delay between a cleared round and the next `prepare_round`.
pub const DEFAULT_INTERMISSION_DELAY: f64 = 3.0;

// --- Enemies ---

/// Distance at which an enemy counts as having reached its waypoint.
pub const DEFAULT_ARRIVAL_TOLERANCE: f64 = 0.05;

/// Time a dying enemy lingers before removal (death effect).
pub const DEFAULT_DEATH_EFFECT_SECS: f64 = 0.5;

/// Lateral jitter applied to spawn positions.
pub const DEFAULT_SPAWN_SPREAD: f64 = 0.3;

// --- Level ---

/// Half-width of the no-build corridor around the enemy path.
pub const DEFAULT_PATH_CORRIDOR_HALF_WIDTH: f64 = 1.0;

//! Authored match configuration: level geometry, waves and the
//! enemy/tower catalogs. Loaded once at match start, never mutated.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::enums::{EnemyKind, TowerKind};
use crate::error::{RampartError, RampartResult};
use crate::types::{GroundRect, Position, ZoneShape};

/// One kind of enemy spawned `count` times in a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyGroup {
    pub kind: EnemyKind,
    pub count: u32,
}

/// One round's content: groups spawned in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wave {
    pub groups: Vec<EnemyGroup>,
}

/// Per-kind enemy stats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemySpec {
    pub health: f64,
    pub move_speed: f64,
    pub money_on_kill: u32,
    pub damage_on_reach_end: u32,
    pub collision_radius: f64,
}

/// Per-kind tower stats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TowerSpec {
    pub cost: u32,
    pub attack_range: f64,
    /// Shots per time unit.
    pub fire_rate: f64,
    pub projectile_speed: f64,
    pub projectile_damage: f64,
    pub projectile_lifetime_secs: f64,
    /// Radius of the no-build test volume around the tower.
    pub footprint_radius: f64,
}

/// Static level geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// Ordered waypoints; enemies spawn on the first and leak past the last.
    pub path: Vec<Position>,
    /// Half-width of the no-build corridor laid along the path.
    #[serde(default = "default_corridor_half_width")]
    pub corridor_half_width: f64,
    /// Buildable ground. A point outside every area is not buildable.
    pub buildable: Vec<GroundRect>,
    /// Additional authored no-build volumes.
    #[serde(default)]
    pub no_build_zones: Vec<ZoneShape>,
}

/// Complete authored description of a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    #[serde(default = "default_starting_health")]
    pub starting_health: u32,
    #[serde(default = "default_starting_money")]
    pub starting_money: u32,
    #[serde(default = "default_refund_percentage")]
    pub refund_percentage: f64,
    #[serde(default = "default_initial_wave_delay")]
    pub initial_wave_delay: f64,
    #[serde(default = "default_spawn_interval")]
    pub spawn_interval: f64,
    #[serde(default = "default_intermission_delay")]
    pub intermission_delay: f64,
    #[serde(default = "default_death_effect_secs")]
    pub death_effect_secs: f64,
    #[serde(default = "default_arrival_tolerance")]
    pub arrival_tolerance: f64,
    #[serde(default = "default_spawn_spread")]
    pub spawn_spread: f64,
    pub level: Level,
    pub waves: Vec<Wave>,
    #[serde(default = "default_enemy_catalog")]
    pub enemies: BTreeMap<EnemyKind, EnemySpec>,
    #[serde(default = "default_tower_catalog")]
    pub towers: BTreeMap<TowerKind, TowerSpec>,
}

impl Wave {
    pub fn new(groups: Vec<EnemyGroup>) -> Self {
        Self { groups }
    }

    /// Sum of all group counts.
    pub fn total_enemies(&self) -> u32 {
        self.groups.iter().map(|g| g.count).sum()
    }
}

impl EnemyGroup {
    pub fn new(kind: EnemyKind, count: u32) -> Self {
        Self { kind, count }
    }
}

impl Level {
    /// Whether the ground point lies inside any buildable area.
    pub fn is_buildable(&self, pos: &Position) -> bool {
        self.buildable.iter().any(|area| area.contains(pos))
    }

    /// Capsules covering each path segment, the enemy corridor.
    pub fn corridor_zones(&self) -> Vec<ZoneShape> {
        if self.corridor_half_width <= 0.0 {
            return Vec::new();
        }
        self.path
            .windows(2)
            .map(|seg| ZoneShape::Capsule {
                a: seg[0],
                b: seg[1],
                radius: self.corridor_half_width,
            })
            .collect()
    }
}

impl MatchConfig {
    /// Parse and validate a JSON match description.
    pub fn from_json_str(json: &str) -> RampartResult<Self> {
        let config: MatchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON match file.
    pub fn from_path(path: impl AsRef<Path>) -> RampartResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| RampartError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn wave_count(&self) -> u32 {
        self.waves.len() as u32
    }

    /// Money returned when selling a tower bought for `cost` (rounded down).
    pub fn refund_for(&self, cost: u32) -> u32 {
        let product = cost as f64 * self.refund_percentage;
        // Snap only products within a few ulps of an integer (100 * 0.29 is
        // 28.999999999999996); anything further below keeps its true floor.
        let nearest = product.round();
        if (product - nearest).abs() <= nearest.abs().max(1.0) * 4.0 * f64::EPSILON {
            nearest as u32
        } else {
            product.floor() as u32
        }
    }

    /// Check every authoring invariant the simulation relies on.
    pub fn validate(&self) -> RampartResult<()> {
        if self.waves.is_empty() {
            return Err(RampartError::NoWaves);
        }
        for (w, wave) in self.waves.iter().enumerate() {
            if wave.groups.is_empty() {
                return Err(RampartError::EmptyWave { wave: w + 1 });
            }
            for (g, group) in wave.groups.iter().enumerate() {
                if group.count == 0 {
                    return Err(RampartError::EmptyGroup {
                        wave: w + 1,
                        group: g + 1,
                    });
                }
                if !self.enemies.contains_key(&group.kind) {
                    return Err(RampartError::MissingEnemy(group.kind));
                }
            }
        }

        if self.level.path.len() < 2 {
            return Err(RampartError::PathTooShort(self.level.path.len()));
        }
        if !(0.0..=1.0).contains(&self.refund_percentage) {
            return Err(RampartError::RefundOutOfRange(self.refund_percentage));
        }
        if self.starting_health == 0 {
            return Err(RampartError::NonPositive {
                field: "starting_health",
                value: 0.0,
            });
        }

        positive("arrival_tolerance", self.arrival_tolerance)?;
        non_negative("initial_wave_delay", self.initial_wave_delay)?;
        non_negative("spawn_interval", self.spawn_interval)?;
        non_negative("intermission_delay", self.intermission_delay)?;
        non_negative("death_effect_secs", self.death_effect_secs)?;
        non_negative("spawn_spread", self.spawn_spread)?;
        non_negative("corridor_half_width", self.level.corridor_half_width)?;

        for spec in self.enemies.values() {
            positive("enemy.health", spec.health)?;
            positive("enemy.move_speed", spec.move_speed)?;
            positive("enemy.collision_radius", spec.collision_radius)?;
        }

        if self.towers.is_empty() {
            return Err(RampartError::NoTowers);
        }
        for spec in self.towers.values() {
            positive("tower.attack_range", spec.attack_range)?;
            positive("tower.fire_rate", spec.fire_rate)?;
            positive("tower.projectile_speed", spec.projectile_speed)?;
            positive("tower.projectile_lifetime_secs", spec.projectile_lifetime_secs)?;
            non_negative("tower.projectile_damage", spec.projectile_damage)?;
            non_negative("tower.footprint_radius", spec.footprint_radius)?;
        }

        Ok(())
    }

    /// Built-in five-round match on a 40 x 30 field with a zig-zag path.
    pub fn default_match() -> Self {
        use EnemyKind::*;

        Self {
            starting_health: DEFAULT_STARTING_HEALTH,
            starting_money: DEFAULT_STARTING_MONEY,
            refund_percentage: DEFAULT_REFUND_PERCENTAGE,
            initial_wave_delay: DEFAULT_INITIAL_WAVE_DELAY,
            spawn_interval: DEFAULT_SPAWN_INTERVAL,
            intermission_delay: DEFAULT_INTERMISSION_DELAY,
            death_effect_secs: DEFAULT_DEATH_EFFECT_SECS,
            arrival_tolerance: DEFAULT_ARRIVAL_TOLERANCE,
            spawn_spread: DEFAULT_SPAWN_SPREAD,
            level: Level {
                path: vec![
                    Position::ground(0.0, 5.0),
                    Position::ground(30.0, 5.0),
                    Position::ground(30.0, 15.0),
                    Position::ground(10.0, 15.0),
                    Position::ground(10.0, 25.0),
                    Position::ground(40.0, 25.0),
                ],
                corridor_half_width: DEFAULT_PATH_CORRIDOR_HALF_WIDTH,
                buildable: vec![GroundRect::new(0.0, 0.0, 40.0, 30.0)],
                no_build_zones: vec![ZoneShape::Circle {
                    center: Position::ground(36.0, 10.0),
                    radius: 2.5,
                }],
            },
            waves: vec![
                Wave::new(vec![EnemyGroup::new(Grunt, 5)]),
                Wave::new(vec![EnemyGroup::new(Grunt, 6), EnemyGroup::new(Runner, 3)]),
                Wave::new(vec![EnemyGroup::new(Runner, 6), EnemyGroup::new(Grunt, 4)]),
                Wave::new(vec![EnemyGroup::new(Grunt, 6), EnemyGroup::new(Brute, 2)]),
                Wave::new(vec![
                    EnemyGroup::new(Runner, 8),
                    EnemyGroup::new(Brute, 3),
                    EnemyGroup::new(Grunt, 6),
                ]),
            ],
            enemies: default_enemy_catalog(),
            towers: default_tower_catalog(),
        }
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self::default_match()
    }
}

fn positive(field: &'static str, value: f64) -> RampartResult<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(RampartError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> RampartResult<()> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(RampartError::Negative { field, value })
    }
}

pub fn default_enemy_catalog() -> BTreeMap<EnemyKind, EnemySpec> {
    BTreeMap::from([
        (
            EnemyKind::Grunt,
            EnemySpec {
                health: 10.0,
                move_speed: 3.0,
                money_on_kill: 5,
                damage_on_reach_end: 1,
                collision_radius: 0.5,
            },
        ),
        (
            EnemyKind::Runner,
            EnemySpec {
                health: 6.0,
                move_speed: 5.5,
                money_on_kill: 6,
                damage_on_reach_end: 1,
                collision_radius: 0.4,
            },
        ),
        (
            EnemyKind::Brute,
            EnemySpec {
                health: 45.0,
                move_speed: 1.8,
                money_on_kill: 20,
                damage_on_reach_end: 4,
                collision_radius: 0.8,
            },
        ),
    ])
}

pub fn default_tower_catalog() -> BTreeMap<TowerKind, TowerSpec> {
    BTreeMap::from([
        (
            TowerKind::Cannon,
            TowerSpec {
                cost: 100,
                attack_range: 6.0,
                fire_rate: 1.0,
                projectile_speed: 20.0,
                projectile_damage: 5.0,
                projectile_lifetime_secs: 1.0,
                footprint_radius: 1.0,
            },
        ),
        (
            TowerKind::Sniper,
            TowerSpec {
                cost: 150,
                attack_range: 12.0,
                fire_rate: 0.4,
                projectile_speed: 40.0,
                projectile_damage: 15.0,
                projectile_lifetime_secs: 0.6,
                footprint_radius: 1.0,
            },
        ),
        (
            TowerKind::Rapid,
            TowerSpec {
                cost: 120,
                attack_range: 4.5,
                fire_rate: 4.0,
                projectile_speed: 25.0,
                projectile_damage: 1.5,
                projectile_lifetime_secs: 0.5,
                footprint_radius: 0.8,
            },
        ),
    ])
}

fn default_corridor_half_width() -> f64 {
    DEFAULT_PATH_CORRIDOR_HALF_WIDTH
}

fn default_starting_health() -> u32 {
    DEFAULT_STARTING_HEALTH
}

fn default_starting_money() -> u32 {
    DEFAULT_STARTING_MONEY
}

fn default_refund_percentage() -> f64 {
    DEFAULT_REFUND_PERCENTAGE
}

fn default_initial_wave_delay() -> f64 {
    DEFAULT_INITIAL_WAVE_DELAY
}

fn default_spawn_interval() -> f64 {
    DEFAULT_SPAWN_INTERVAL
}

fn default_intermission_delay() -> f64 {
    DEFAULT_INTERMISSION_DELAY
}

fn default_death_effect_secs() -> f64 {
    DEFAULT_DEATH_EFFECT_SECS
}

fn default_arrival_tolerance() -> f64 {
    DEFAULT_ARRIVAL_TOLERANCE
}

fn default_spawn_spread() -> f64 {
    DEFAULT_SPAWN_SPREAD
}

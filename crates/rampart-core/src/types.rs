//! Fundamental geometric and simulation types.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Position in world space (world units).
/// x = East, y = Up, z = North. The ground plane is y = 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(pub DVec3);

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each simulated tick).
    pub tick: u64,
    /// Elapsed simulation time in time units (seconds at 1x).
    pub elapsed_secs: f64,
}

/// Axis-aligned rectangle on the ground plane (x/z).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundRect {
    pub min_x: f64,
    pub min_z: f64,
    pub max_x: f64,
    pub max_z: f64,
}

/// Shape of a no-build volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape")]
pub enum ZoneShape {
    /// Sphere around a point.
    Circle { center: Position, radius: f64 },
    /// Swept sphere along a segment (used for path corridors).
    Capsule { a: Position, b: Position, radius: f64 },
}

impl Position {
    pub const ORIGIN: Position = Position(DVec3::ZERO);

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self(DVec3::new(x, y, z))
    }

    /// A point on the ground plane.
    pub fn ground(x: f64, z: f64) -> Self {
        Self(DVec3::new(x, 0.0, z))
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        self.0.distance(other.0)
    }

    pub fn distance_squared_to(&self, other: &Position) -> f64 {
        self.0.distance_squared(other.0)
    }

    /// Unit vector pointing at `other`, or `None` when the points coincide.
    pub fn direction_to(&self, other: &Position) -> Option<DVec3> {
        (other.0 - self.0).try_normalize()
    }

    /// Move toward `target` by at most `max_step`.
    /// Returns the distance still separating the two points after the move.
    pub fn step_toward(&mut self, target: &Position, max_step: f64) -> f64 {
        let offset = target.0 - self.0;
        let distance = offset.length();
        if distance <= max_step || distance <= f64::EPSILON {
            self.0 = target.0;
            return 0.0;
        }
        self.0 += offset / distance * max_step;
        distance - max_step
    }
}

impl From<DVec3> for Position {
    fn from(v: DVec3) -> Self {
        Self(v)
    }
}

impl SimTime {
    /// Advance by one tick of `dt` time units.
    pub fn advance(&mut self, dt: f64) {
        self.tick += 1;
        self.elapsed_secs += dt;
    }
}

impl GroundRect {
    pub fn new(min_x: f64, min_z: f64, max_x: f64, max_z: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_z: min_z.min(max_z),
            max_x: min_x.max(max_x),
            max_z: min_z.max(max_z),
        }
    }

    /// Whether the ground projection of `pos` lies inside (edges inclusive).
    pub fn contains(&self, pos: &Position) -> bool {
        let p = pos.0;
        p.x >= self.min_x && p.x <= self.max_x && p.z >= self.min_z && p.z <= self.max_z
    }
}

impl ZoneShape {
    /// Whether a sphere of `radius` centred at `center` touches this zone.
    pub fn overlaps_sphere(&self, center: &Position, radius: f64) -> bool {
        match *self {
            ZoneShape::Circle {
                center: zone_center,
                radius: zone_radius,
            } => zone_center.distance_to(center) <= zone_radius + radius,
            ZoneShape::Capsule {
                a,
                b,
                radius: zone_radius,
            } => {
                let closest = closest_point_on_segment(a.0, b.0, center.0);
                closest.distance(center.0) <= zone_radius + radius
            }
        }
    }
}

/// Closest point to `p` on the segment `a..b`.
pub fn closest_point_on_segment(a: DVec3, b: DVec3, p: DVec3) -> DVec3 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f64::EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Swept-point test: the earliest fraction `t` in `[0, 1]` at which the moving
/// point `start -> end` lies within `radius` of `center`.
pub fn segment_sphere_entry(start: DVec3, end: DVec3, center: DVec3, radius: f64) -> Option<f64> {
    let f = start - center;
    let c = f.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }

    let d = end - start;
    let a = d.length_squared();
    if a <= f64::EPSILON {
        return None;
    }

    let b = 2.0 * f.dot(d);
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    (0.0..=1.0).contains(&t).then_some(t)
}

//! Enemy lifecycle state machine: `Alive -> Dying -> Removed`.
//!
//! Pure functions over plain component data, no ECS dependency.
//! `Dying` is entered at most once per enemy, by either lethal damage or
//! walking past the final waypoint; whichever comes first wins and the other
//! becomes a no-op. Removal happens after the death effect (see cleanup).

use rampart_core::components::{EnemyStats, Lifecycle, PathFollower};
use rampart_core::enums::{EnemyPhase, TerminalCause};
use rampart_core::types::Position;

/// Result of applying damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Enemy was already dying; nothing changed.
    Ignored,
    /// Health reduced, still alive.
    Wounded,
    /// This hit crossed zero; the caller must report the kill.
    Killed,
}

/// Result of advancing along the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathProgress {
    Walking,
    /// The cursor moved past the final waypoint.
    ReachedEnd,
}

pub fn is_alive(lifecycle: &Lifecycle) -> bool {
    lifecycle.phase == EnemyPhase::Alive
}

/// Subtract `amount` from health; latch into `Dying` if it crosses zero.
pub fn apply_damage(
    stats: &mut EnemyStats,
    lifecycle: &mut Lifecycle,
    amount: f64,
    death_effect_secs: f64,
) -> DamageOutcome {
    if !is_alive(lifecycle) {
        return DamageOutcome::Ignored;
    }

    stats.health = (stats.health - amount).max(0.0);
    if stats.health <= 0.0 && enter_dying(lifecycle, TerminalCause::Killed, death_effect_secs) {
        DamageOutcome::Killed
    } else {
        DamageOutcome::Wounded
    }
}

/// Latch into `Dying` because the enemy leaked. Returns false if it was
/// already dying, in which case the leak must not be reported.
pub fn mark_leaked(lifecycle: &mut Lifecycle, death_effect_secs: f64) -> bool {
    enter_dying(lifecycle, TerminalCause::Leaked, death_effect_secs)
}

fn enter_dying(lifecycle: &mut Lifecycle, cause: TerminalCause, death_effect_secs: f64) -> bool {
    if !is_alive(lifecycle) {
        return false;
    }
    lifecycle.phase = EnemyPhase::Dying;
    lifecycle.cause = Some(cause);
    lifecycle.removal_in_secs = death_effect_secs.max(0.0);
    true
}

/// Walk toward the current waypoint at `speed * dt`. Movement left over after
/// reaching a waypoint carries on toward the next one.
pub fn advance_along_path(
    position: &mut Position,
    follower: &mut PathFollower,
    path: &[Position],
    speed: f64,
    dt: f64,
    arrival_tolerance: f64,
) -> PathProgress {
    let mut budget = speed * dt;

    loop {
        let Some(target) = path.get(follower.waypoint) else {
            return PathProgress::ReachedEnd;
        };

        let before = position.distance_to(target);
        let remaining = position.step_toward(target, budget);
        if remaining > arrival_tolerance {
            return PathProgress::Walking;
        }

        follower.waypoint += 1;
        if follower.waypoint >= path.len() {
            return PathProgress::ReachedEnd;
        }

        budget -= before.min(budget);
        if budget <= 0.0 {
            return PathProgress::Walking;
        }
    }
}

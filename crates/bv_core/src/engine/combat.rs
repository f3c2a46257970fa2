//! Combat resolution
//!
//! Pure functions: no collaborator access, no state. The match gathers the
//! inputs (masses, wall probe, invulnerability) and applies the result.
//!
//! ## Rules
//! - **Against-wall pop:** a hit on a target pinned against level geometry pops
//!   it outright, unless the target is still respawn-invulnerable.
//! - **Knockback:** `attacker_mass / target_mass * strength`, applied as a
//!   velocity change along the attacker's facing. Lighter targets fly further.
//! - **Vulnerability:** a knocked-back target can be popped by a hard impact
//!   for `pop_vulnerable_secs`.
//! - **Pop:** the opponent scores; below the win score the popped fighter
//!   respawns, at the win score it is eliminated.

use serde::{Deserialize, Serialize};

use super::config::FighterConfig;
use super::types::{AttackKind, PlayerId, Vec3};

/// Masses are floored here before dividing.
pub const MIN_MASS: f32 = 0.01;

/// Impact impulse needed to pop a vulnerable fighter of vertical scale `scale_y`.
pub fn pop_threshold(scale_y: f32) -> f32 {
    3.0 * scale_y.sin() - 4.0 * scale_y.cos() + 7.0
}

pub fn hit_force(attacker_mass: f32, target_mass: f32, strength: f32) -> f32 {
    attacker_mass.max(MIN_MASS) * (1.0 / target_mass.max(MIN_MASS)) * strength
}

/// Upward velocity change of a jump. Heavier fighters jump lower.
pub fn jump_velocity(jump_strength: f32, mass: f32) -> f32 {
    jump_strength * (1.0 / mass.max(MIN_MASS)).sqrt()
}

/// An attack collider overlapping the opponent. Consumed immediately.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackEvent {
    pub attacker: PlayerId,
    pub target: PlayerId,
    pub kind: AttackKind,
    pub attacker_mass: f32,
    pub target_mass: f32,
    pub attacker_facing: Vec3,
}

impl AttackEvent {
    pub fn is_punch(&self) -> bool {
        self.kind.is_punch()
    }

    pub fn strength(&self, cfg: &FighterConfig) -> f32 {
        match self.kind {
            AttackKind::Punch => cfg.punch_strength,
            AttackKind::Kick => cfg.kick_strength,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttackResolution {
    /// Target was pinned against a wall.
    WallPop { target: PlayerId },
    Knockback {
        target: PlayerId,
        force: f32,
        impulse: Vec3,
        vulnerable_secs: f32,
    },
}

pub fn resolve_attack(
    event: &AttackEvent,
    cfg: &FighterConfig,
    target_against_wall: bool,
    target_respawn_invulnerable: bool,
) -> AttackResolution {
    if target_against_wall && !target_respawn_invulnerable {
        return AttackResolution::WallPop { target: event.target };
    }

    let force = hit_force(event.attacker_mass, event.target_mass, event.strength(cfg));
    AttackResolution::Knockback {
        target: event.target,
        force,
        impulse: event.attacker_facing * force,
        vulnerable_secs: cfg.pop_vulnerable_secs,
    }
}

/// What happens to a popped fighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PopOutcome {
    Respawn { popped: PlayerId, scorer: PlayerId, scorer_score: u32 },
    Eliminated { popped: PlayerId, scorer: PlayerId, scorer_score: u32 },
}

impl PopOutcome {
    pub fn scorer(&self) -> PlayerId {
        match *self {
            PopOutcome::Respawn { scorer, .. } | PopOutcome::Eliminated { scorer, .. } => scorer,
        }
    }

    pub fn is_match_point(&self) -> bool {
        matches!(self, PopOutcome::Eliminated { .. })
    }
}

/// Decide a pop given the scorer's score *after* the point was awarded.
pub fn resolve_pop(popped: PlayerId, scorer_score: u32, win_score: u32) -> PopOutcome {
    let scorer = popped.opponent();
    if scorer_score < win_score {
        PopOutcome::Respawn { popped, scorer, scorer_score }
    } else {
        PopOutcome::Eliminated { popped, scorer, scorer_score }
    }
}

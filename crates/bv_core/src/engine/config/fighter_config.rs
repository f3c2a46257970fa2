//! Fighter movement and combat configuration

use serde::{Deserialize, Serialize};

/// Per-bubbleman tuning for the fighting stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FighterConfig {
    // === Movement ===
    /// Lateral speed in units per second (default: 5.0)
    pub speed: f32,
    /// Jump velocity change before the mass factor (default: 7.0)
    pub jump_strength: f32,
    /// Gap under the feet that still counts as grounded (default: 0.1)
    pub airborne_height: f32,

    // === Combat ===
    /// Knockback strength of a punch (default: 6.0)
    pub punch_strength: f32,
    /// Knockback strength of a kick (default: 9.0)
    pub kick_strength: f32,
    /// Seconds a punch collider stays live (default: 0.35)
    pub punch_window_secs: f32,
    /// Seconds a kick collider stays live (default: 0.45)
    pub kick_window_secs: f32,
    /// Vulnerability window after taking a hit (default: 1.5)
    pub pop_vulnerable_secs: f32,
    /// Invulnerability after respawning; 0 disables it (default: 0.5)
    pub respawn_invulnerable_secs: f32,

    // === Body ===
    /// Capsule height at scale 1 (default: 2.0)
    pub capsule_height: f32,
    /// Capsule radius at scale 1 (default: 0.5)
    pub capsule_radius: f32,
    /// Respawn point height above the fight start position (default: 3.0)
    pub respawn_offset: f32,
    /// Extra reach of the wall probes beyond the radius (default: 0.05)
    pub wall_probe_margin: f32,
}

impl Default for FighterConfig {
    fn default() -> Self {
        Self {
            speed: 5.0,
            jump_strength: 7.0,
            airborne_height: 0.1,

            punch_strength: 6.0,
            kick_strength: 9.0,
            punch_window_secs: 0.35,
            kick_window_secs: 0.45,
            pop_vulnerable_secs: 1.5,
            respawn_invulnerable_secs: 0.5,

            capsule_height: 2.0,
            capsule_radius: 0.5,
            respawn_offset: 3.0,
            wall_probe_margin: 0.05,
        }
    }
}

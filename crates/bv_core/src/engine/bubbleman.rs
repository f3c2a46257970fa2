//! Per-player match entity

use serde::{Deserialize, Serialize};

use super::combat;
use super::config::FighterConfig;
use super::timer::tick_down;
use super::types::{lane_right, up, AttackKind, PlayerId, Vec3};

/// Smallest uniform scale a bubbleman can have.
pub const MIN_SIZE: f32 = 0.01;

/// Body measurements captured once, when the fight controller is first enabled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FighterProfile {
    pub mass: f32,
    /// Capsule height scaled by size
    pub height: f32,
    /// Capsule radius scaled by size
    pub radius: f32,
    /// Impact impulse that pops a vulnerable fighter
    pub pop_threshold: f32,
    pub respawn_point: Vec3,
}

impl FighterProfile {
    pub fn capture(size: f32, position: Vec3, cfg: &FighterConfig) -> Self {
        Self {
            mass: size,
            height: cfg.capsule_height * size,
            radius: cfg.capsule_radius * size,
            pop_threshold: combat::pop_threshold(size),
            respawn_point: position + up() * cfg.respawn_offset,
        }
    }
}

/// A live attack: which collider is enabled and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackWindow {
    pub kind: AttackKind,
    pub remaining: f32,
    /// A collider lands at most one hit per window.
    pub hit_landed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BubblemanState {
    pub id: PlayerId,
    size: f32,
    score: u32,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Unit vector along the lane
    pub facing: Vec3,
    pop_vulnerable: f32,
    respawn_invulnerable: f32,
    attack: Option<AttackWindow>,
    profile: Option<FighterProfile>,
    eliminated: bool,
    footsteps_playing: bool,
}

impl BubblemanState {
    pub fn new(id: PlayerId, spawn: Vec3, base_size: f32) -> Self {
        let facing = match id {
            PlayerId::One => lane_right(),
            PlayerId::Two => -lane_right(),
        };
        Self {
            id,
            size: base_size.max(MIN_SIZE),
            score: 0,
            position: spawn,
            velocity: Vec3::zeros(),
            facing,
            pop_vulnerable: 0.0,
            respawn_invulnerable: 0.0,
            attack: None,
            profile: None,
            eliminated: false,
            footsteps_playing: false,
        }
    }

    // ========================
    // Size & score
    // ========================

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn scale(&self) -> Vec3 {
        Vec3::new(self.size, self.size, self.size)
    }

    /// Grow uniformly; negative steps are ignored so size never shrinks.
    pub fn grow(&mut self, step: f32) -> f32 {
        if step.is_finite() && step > 0.0 {
            self.size += step;
        }
        self.size = self.size.max(MIN_SIZE);
        self.size
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn award_point(&mut self) -> u32 {
        self.score = self.score.saturating_add(1);
        self.score
    }

    // ========================
    // Timers
    // ========================

    pub fn pop_vulnerable(&self) -> f32 {
        self.pop_vulnerable
    }

    pub fn respawn_invulnerable(&self) -> f32 {
        self.respawn_invulnerable
    }

    pub fn is_respawn_invulnerable(&self) -> bool {
        self.respawn_invulnerable > 0.0
    }

    pub fn make_pop_vulnerable(&mut self, secs: f32) {
        self.pop_vulnerable = secs.max(0.0);
    }

    pub fn tick_timers(&mut self, dt: f32) {
        tick_down(&mut self.pop_vulnerable, dt);
        tick_down(&mut self.respawn_invulnerable, dt);
    }

    // ========================
    // Attacks
    // ========================

    pub fn is_attacking(&self) -> bool {
        self.attack.is_some()
    }

    pub fn is_punching(&self) -> bool {
        matches!(self.attack, Some(AttackWindow { kind: AttackKind::Punch, .. }))
    }

    /// The collider currently enabled, if any.
    pub fn active_attack(&self) -> Option<AttackKind> {
        self.attack.map(|a| a.kind)
    }

    pub fn attack_window(&self) -> Option<&AttackWindow> {
        self.attack.as_ref()
    }

    pub(crate) fn start_attack(&mut self, kind: AttackKind, window_secs: f32) {
        self.attack = Some(AttackWindow { kind, remaining: window_secs, hit_landed: false });
    }

    /// Tick the attack window; returns the kind that just closed.
    pub(crate) fn tick_attack(&mut self, dt: f32) -> Option<AttackKind> {
        let window = self.attack.as_mut()?;
        tick_down(&mut window.remaining, dt);
        if window.remaining <= 0.0 {
            let kind = window.kind;
            self.attack = None;
            Some(kind)
        } else {
            None
        }
    }

    /// Claim the hit for the live window of `kind`. False if there is no such
    /// window or it already landed.
    pub(crate) fn claim_hit(&mut self, kind: AttackKind) -> bool {
        match self.attack.as_mut() {
            Some(window) if window.kind == kind && !window.hit_landed => {
                window.hit_landed = true;
                true
            }
            _ => false,
        }
    }

    // ========================
    // Lifecycle
    // ========================

    pub fn profile(&self) -> Option<&FighterProfile> {
        self.profile.as_ref()
    }

    pub(crate) fn capture_profile(&mut self, cfg: &FighterConfig) -> FighterProfile {
        let profile = FighterProfile::capture(self.size, self.position, cfg);
        self.profile = Some(profile);
        profile
    }

    pub fn mass(&self) -> f32 {
        self.profile.map(|p| p.mass).unwrap_or(self.size)
    }

    pub fn is_eliminated(&self) -> bool {
        self.eliminated
    }

    /// Back to the respawn point with fresh timers. Returns the respawn point.
    pub(crate) fn respawn(&mut self, invulnerable_secs: f32) -> Vec3 {
        let point = self.profile.map(|p| p.respawn_point).unwrap_or(self.position);
        self.position = point;
        self.velocity = Vec3::zeros();
        self.pop_vulnerable = 0.0;
        self.respawn_invulnerable = invulnerable_secs.max(0.0);
        self.attack = None;
        point
    }

    pub(crate) fn eliminate(&mut self) {
        self.eliminated = true;
        self.attack = None;
        self.velocity = Vec3::zeros();
        self.footsteps_playing = false;
    }

    pub(crate) fn footsteps_playing(&self) -> bool {
        self.footsteps_playing
    }

    /// Returns true when the flag actually changed.
    pub(crate) fn set_footsteps(&mut self, playing: bool) -> bool {
        let changed = self.footsteps_playing != playing;
        self.footsteps_playing = playing;
        changed
    }
}

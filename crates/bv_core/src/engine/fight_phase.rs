//! Fighting stage controller for one bubbleman
//!
//! Per tick, while enabled:
//! 1. tick the pop/respawn timers and the attack window
//! 2. pull the body state from physics
//! 3. jump (grounded, not attacking) or attack (not attacking)
//! 4. lateral movement, unless punching
//! 5. footstep loop bookkeeping
//!
//! Attack windows are timed here instead of by animation callbacks: the
//! collider opens when the attack starts and closes when its window runs out.

use super::bubbleman::BubblemanState;
use super::combat;
use super::config::FighterConfig;
use super::debug_flags;
use super::events::StateChange;
use super::ports::{InputFrame, Physics};
use super::types::{lane_right, up, AttackKind, LayerMask, PlayerId, SoundEffect, Vec3};

#[derive(Debug, Clone, PartialEq)]
pub struct FightPhaseController {
    player: PlayerId,
    enabled: bool,
}

impl FightPhaseController {
    pub fn new(player: PlayerId) -> Self {
        Self { player, enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// First enable: capture the body profile and hand the body to physics.
    pub fn activate(
        &mut self,
        state: &mut BubblemanState,
        cfg: &FighterConfig,
        physics: &mut dyn Physics,
    ) -> f32 {
        if let Some(body) = physics.body_state(self.player) {
            state.position = body.position;
        }
        let profile = state.capture_profile(cfg);
        physics.activate_body(self.player, profile.mass, state.size());
        physics.face(self.player, state.facing);
        self.enabled = true;
        log::debug!(
            "{} activated: mass {:.3}, pop threshold {:.3}",
            self.player,
            profile.mass,
            profile.pop_threshold
        );
        profile.mass
    }

    pub fn update(
        &mut self,
        dt: f32,
        frame: &InputFrame,
        state: &mut BubblemanState,
        cfg: &FighterConfig,
        physics: &mut dyn Physics,
        out: &mut Vec<StateChange>,
    ) {
        if !self.enabled || state.is_eliminated() {
            return;
        }

        state.tick_timers(dt);
        if let Some(kind) = state.tick_attack(dt) {
            log::trace!("{} {:?} window closed", self.player, kind);
        }
        if let Some(body) = physics.body_state(self.player) {
            state.position = body.position;
            state.velocity = body.velocity;
        }

        let airborne = is_airborne(state, cfg, physics);

        if frame.jump_pressed && !state.is_attacking() && !airborne {
            self.jump(state, cfg, physics, out);
        } else if frame.attack_pressed && !state.is_attacking() {
            self.attack(state, cfg, airborne, out);
        }

        self.move_lateral(dt, frame.axis(), airborne, state, cfg, physics, out);

        if airborne && state.footsteps_playing() {
            self.set_footsteps(state, false, out);
        }

        if debug_flags::fight_debug_enabled() {
            log::debug!(
                "[fight] {} pos=({:.2},{:.2}) vel=({:.2},{:.2}) air={} atk={:?} vuln={:.2}",
                self.player,
                state.position.x,
                state.position.y,
                state.velocity.x,
                state.velocity.y,
                airborne,
                state.active_attack(),
                state.pop_vulnerable()
            );
        }
    }

    fn jump(
        &self,
        state: &mut BubblemanState,
        cfg: &FighterConfig,
        physics: &mut dyn Physics,
        out: &mut Vec<StateChange>,
    ) {
        let dv = combat::jump_velocity(cfg.jump_strength, state.mass());
        physics.set_velocity(self.player, Vec3::zeros());
        physics.apply_impulse(self.player, up() * dv);
        state.velocity = up() * dv;
        out.push(StateChange::Sfx { player: self.player, sfx: SoundEffect::Jump });
        log::debug!("{} jumps with {:.2}", self.player, dv);
    }

    fn attack(
        &self,
        state: &mut BubblemanState,
        cfg: &FighterConfig,
        airborne: bool,
        out: &mut Vec<StateChange>,
    ) {
        let (kind, window, sfx) = if airborne {
            (AttackKind::Kick, cfg.kick_window_secs, SoundEffect::Kick)
        } else {
            (AttackKind::Punch, cfg.punch_window_secs, SoundEffect::Punch)
        };
        state.start_attack(kind, window);
        out.push(StateChange::Sfx { player: self.player, sfx });
        log::debug!("{} starts {:?}", self.player, kind);
    }

    fn move_lateral(
        &self,
        dt: f32,
        axis: f32,
        airborne: bool,
        state: &mut BubblemanState,
        cfg: &FighterConfig,
        physics: &mut dyn Physics,
        out: &mut Vec<StateChange>,
    ) {
        if state.is_punching() || axis == 0.0 {
            if state.footsteps_playing() {
                self.set_footsteps(state, false, out);
            }
            return;
        }

        if !state.is_attacking() && !airborne && !state.footsteps_playing() {
            self.set_footsteps(state, true, out);
        }

        let delta = lane_right() * (axis * cfg.speed * dt);
        if delta != Vec3::zeros() {
            physics.move_by(self.player, delta);
            state.position += delta;
            state.facing = lane_right() * axis.signum();
            physics.face(self.player, state.facing);
            out.push(StateChange::Moved {
                player: self.player,
                position: state.position,
                facing: state.facing,
            });
        }
    }

    fn set_footsteps(&self, state: &mut BubblemanState, playing: bool, out: &mut Vec<StateChange>) {
        if state.set_footsteps(playing) {
            out.push(StateChange::Footsteps { player: self.player, playing });
        }
    }
}

/// Raycast that fails open: a collaborator error reads as "no hit".
fn probe(physics: &dyn Physics, origin: Vec3, direction: Vec3, max_distance: f32) -> bool {
    match physics.raycast(origin, direction, max_distance, LayerMask::IgnorePlayers) {
        Ok(hit) => hit,
        Err(err) => {
            log::warn!("raycast treated as no hit: {}", err);
            false
        }
    }
}

fn body_dims(state: &BubblemanState, cfg: &FighterConfig) -> (f32, f32) {
    match state.profile() {
        Some(p) => (p.height, p.radius),
        None => (cfg.capsule_height * state.size(), cfg.capsule_radius * state.size()),
    }
}

/// Nothing under the feet within `airborne_height`.
pub fn is_airborne(state: &BubblemanState, cfg: &FighterConfig, physics: &dyn Physics) -> bool {
    let (height, _) = body_dims(state, cfg);
    let origin = state.position + up() * (height / 2.0);
    !probe(physics, origin, -up(), height / 2.0 + cfg.airborne_height)
}

/// Level geometry directly in front of or behind the body at quarter height.
pub fn is_against_wall(state: &BubblemanState, cfg: &FighterConfig, physics: &dyn Physics) -> bool {
    let (height, radius) = body_dims(state, cfg);
    let origin = state.position + up() * (height / 4.0);
    let reach = radius + cfg.wall_probe_margin;
    probe(physics, origin, state.facing, reach) || probe(physics, origin, -state.facing, reach)
}

//! Collaborator seams
//!
//! The engine owns no rendering, audio, physics integration or device
//! polling. Hosts hand it implementations of these traits at construction:
//!
//! - [`Presentation`]: fire-and-forget text, announcer cues and effects
//! - [`Physics`]: synchronous raycasts and body commands
//! - [`InputSource`]: one sampled [`InputFrame`] per player per tick

use serde::{Deserialize, Serialize};

use super::types::{
    AnnouncerCue, BlowSide, LayerMask, PlayerId, SoundEffect, Stage, TextAnchor, TopText, Vec3,
};
use crate::error::Result;

// ============================================
// Presentation
// ============================================

pub trait Presentation {
    fn show_text(&mut self, text: TopText, anchor: TextAnchor);
    fn play_cue(&mut self, cue: AnnouncerCue);
    fn set_controls_visible(&mut self, visible: bool);

    fn set_blow_highlight(&mut self, _side: BlowSide) {}
    fn play_sfx(&mut self, _player: PlayerId, _sfx: SoundEffect) {}
    fn set_footsteps(&mut self, _player: PlayerId, _playing: bool) {}
    fn play_hit_reaction(&mut self, _player: PlayerId) {}
    fn set_player_scale(&mut self, _player: PlayerId, _size: f32) {}
    fn set_player_visible(&mut self, _player: PlayerId, _visible: bool) {}
    fn return_to_lobby(&mut self) {}
}

/// Presentation that drops everything (headless runs).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresentation;

impl Presentation for NullPresentation {
    fn show_text(&mut self, _text: TopText, _anchor: TextAnchor) {}
    fn play_cue(&mut self, _cue: AnnouncerCue) {}
    fn set_controls_visible(&mut self, _visible: bool) {}
}

// ============================================
// Physics
// ============================================

/// Kinematic state of a body as the physics collaborator sees it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    pub position: Vec3,
    pub velocity: Vec3,
}

pub trait Physics {
    /// Whether anything matching `mask` lies within `max_distance` along the ray.
    /// An `Err` means the collaborator could not answer this tick.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: LayerMask)
        -> Result<bool>;

    /// Instantaneous velocity change.
    fn apply_impulse(&mut self, body: PlayerId, impulse: Vec3);
    fn set_velocity(&mut self, body: PlayerId, velocity: Vec3);
    fn teleport(&mut self, body: PlayerId, position: Vec3);
    /// Kinematic move (no velocity change).
    fn move_by(&mut self, body: PlayerId, delta: Vec3);
    fn face(&mut self, body: PlayerId, forward: Vec3);
    /// Place a kinematic, gravity-free body at its spawn point.
    fn spawn_body(&mut self, body: PlayerId, position: Vec3, size: f32);
    /// Switch a body to dynamic simulation: set mass, enable gravity, match scale.
    fn activate_body(&mut self, body: PlayerId, mass: f32, size: f32);
    fn remove_body(&mut self, body: PlayerId);
    fn body_state(&self, body: PlayerId) -> Option<BodyState>;
}

// ============================================
// Input
// ============================================

/// Everything the engine reads from one player in one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InputFrame {
    /// Lateral axis in [-1, 1]
    pub move_axis: f32,
    pub jump_pressed: bool,
    pub attack_pressed: bool,
    pub blow_left_released: bool,
    pub blow_right_released: bool,
}

impl InputFrame {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn blow_released(&self, side: BlowSide) -> bool {
        match side {
            BlowSide::Left => self.blow_left_released,
            BlowSide::Right => self.blow_right_released,
        }
    }

    /// Axis clamped to [-1, 1]; non-finite values read as centered.
    pub fn axis(&self) -> f32 {
        if self.move_axis.is_finite() {
            self.move_axis.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }
}

pub trait InputSource {
    fn sample(&mut self, player: PlayerId, stage: Stage) -> InputFrame;
}

/// Named-button device API, as exposed by engine input managers.
pub trait ButtonInput {
    fn button_down(&self, name: &str) -> bool;
    fn button_up(&self, name: &str) -> bool;
    fn axis(&self, name: &str) -> f32;
}

/// Button names for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputBindings {
    pub move_axis: String,
    pub jump: String,
    pub attack: String,
    pub blow_left: String,
    pub blow_right: String,
}

impl InputBindings {
    pub fn for_player(player: PlayerId) -> Self {
        let n = player.index() + 1;
        Self {
            move_axis: format!("Horizontal{}", n),
            jump: format!("Jump{}", n),
            attack: format!("Punch{}", n),
            blow_left: format!("BlowLeft{}", n),
            blow_right: format!("BlowRight{}", n),
        }
    }
}

/// Adapts a [`ButtonInput`] device to per-player frames through bindings.
pub struct BoundInput<B> {
    device: B,
    bindings: [InputBindings; 2],
}

impl<B: ButtonInput> BoundInput<B> {
    pub fn new(device: B) -> Self {
        Self {
            device,
            bindings: [
                InputBindings::for_player(PlayerId::One),
                InputBindings::for_player(PlayerId::Two),
            ],
        }
    }

    pub fn with_bindings(mut self, player: PlayerId, bindings: InputBindings) -> Self {
        self.bindings[player.index()] = bindings;
        self
    }

    pub fn device_mut(&mut self) -> &mut B {
        &mut self.device
    }
}

impl<B: ButtonInput> InputSource for BoundInput<B> {
    fn sample(&mut self, player: PlayerId, _stage: Stage) -> InputFrame {
        let b = &self.bindings[player.index()];
        InputFrame {
            move_axis: self.device.axis(&b.move_axis),
            jump_pressed: self.device.button_down(&b.jump),
            attack_pressed: self.device.button_down(&b.attack),
            blow_left_released: self.device.button_up(&b.blow_left),
            blow_right_released: self.device.button_up(&b.blow_right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[derive(Default)]
    struct FakeDevice {
        down: HashSet<String>,
        up: HashSet<String>,
        axes: HashMap<String, f32>,
    }

    impl ButtonInput for FakeDevice {
        fn button_down(&self, name: &str) -> bool {
            self.down.contains(name)
        }
        fn button_up(&self, name: &str) -> bool {
            self.up.contains(name)
        }
        fn axis(&self, name: &str) -> f32 {
            self.axes.get(name).copied().unwrap_or(0.0)
        }
    }

    #[test]
    fn test_bound_input_reads_player_bindings() {
        let mut device = FakeDevice::default();
        device.down.insert("Jump2".into());
        device.up.insert("BlowLeft1".into());
        device.axes.insert("Horizontal2".into(), -0.5);

        let mut input = BoundInput::new(device);
        let one = input.sample(PlayerId::One, Stage::BubbleBlowing);
        let two = input.sample(PlayerId::Two, Stage::Fighting);

        assert!(one.blow_left_released);
        assert!(!one.jump_pressed);
        assert!(two.jump_pressed);
        assert_eq!(two.move_axis, -0.5);
    }

    #[test]
    fn test_axis_is_clamped() {
        let frame = InputFrame { move_axis: 3.0, ..InputFrame::idle() };
        assert_eq!(frame.axis(), 1.0);
        let frame = InputFrame { move_axis: f32::NAN, ..InputFrame::idle() };
        assert_eq!(frame.axis(), 0.0);
    }
}

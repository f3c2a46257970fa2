//! Blowing minigame: alternate the two blow buttons to inflate.
//!
//! Only a release of the expected side counts. Wrong-side releases are
//! ignored outright: no penalty, and the expected side does not reset.

use super::bubbleman::BubblemanState;
use super::ports::InputFrame;
use super::types::{BlowSide, PlayerId};

#[derive(Debug, Clone, PartialEq)]
pub struct BlowPhaseController {
    player: PlayerId,
    next: BlowSide,
    step: f32,
    enabled: bool,
}

impl BlowPhaseController {
    pub fn new(player: PlayerId, step: f32) -> Self {
        Self { player, next: BlowSide::Left, step: step.max(0.0), enabled: false }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn next_expected(&self) -> BlowSide {
        self.next
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Returns the new size when the release counted.
    pub fn on_key_released(&mut self, side: BlowSide, state: &mut BubblemanState) -> Option<f32> {
        if !self.enabled || side != self.next {
            return None;
        }
        let size = state.grow(self.step);
        self.next = self.next.flipped();
        log::debug!("{} blew up to {:.3}", self.player, size);
        Some(size)
    }

    /// Per-tick poll: only the expected side is looked at.
    pub fn update(&mut self, frame: &InputFrame, state: &mut BubblemanState) -> Option<f32> {
        if frame.blow_released(self.next) {
            self.on_key_released(self.next, state)
        } else {
            None
        }
    }
}

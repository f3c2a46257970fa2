//! Input sources for headless runs
//!
//! - [`ScriptedInput`]: fixed per-player frame queues (tests, replays)
//! - [`SeededBotInput`]: deterministic button mashing from a ChaCha8 stream

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::ports::{InputFrame, InputSource};
use super::types::{BlowSide, PlayerId, Stage};

/// Replays queued frames; an empty queue samples as idle.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    queues: [VecDeque<InputFrame>; 2],
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, player: PlayerId, frame: InputFrame) {
        self.queues[player.index()].push_back(frame);
    }

    pub fn extend<T: IntoIterator<Item = InputFrame>>(&mut self, player: PlayerId, frames: T) {
        self.queues[player.index()].extend(frames);
    }

    pub fn pending(&self, player: PlayerId) -> usize {
        self.queues[player.index()].len()
    }

    pub fn clear(&mut self) {
        for q in &mut self.queues {
            q.clear();
        }
    }
}

impl InputSource for ScriptedInput {
    fn sample(&mut self, player: PlayerId, _stage: Stage) -> InputFrame {
        self.queues[player.index()].pop_front().unwrap_or_default()
    }
}

const BLOW_RELEASE_CHANCE: f64 = 0.35;
const BLOW_CORRECT_SIDE_CHANCE: f64 = 0.9;
const JUMP_CHANCE: f64 = 0.02;
const ATTACK_CHANCE: f64 = 0.06;
const HOLD_TICKS_MIN: u32 = 10;
const HOLD_TICKS_MAX: u32 = 40;

#[derive(Debug, Clone, Copy)]
struct BotMind {
    next_blow: BlowSide,
    held_axis: f32,
    hold_ticks: u32,
}

impl Default for BotMind {
    fn default() -> Self {
        Self { next_blow: BlowSide::Left, held_axis: 0.0, hold_ticks: 0 }
    }
}

/// Deterministic bot for both players. Same seed, same frames.
#[derive(Debug, Clone)]
pub struct SeededBotInput {
    rng: ChaCha8Rng,
    minds: [BotMind; 2],
}

impl SeededBotInput {
    pub fn new(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed), minds: [BotMind::default(); 2] }
    }

    fn blow(&mut self, player: PlayerId) -> InputFrame {
        let mind = &mut self.minds[player.index()];
        let mut frame = InputFrame::idle();
        if !self.rng.gen_bool(BLOW_RELEASE_CHANCE) {
            return frame;
        }
        let side = if self.rng.gen_bool(BLOW_CORRECT_SIDE_CHANCE) {
            let side = mind.next_blow;
            mind.next_blow = side.flipped();
            side
        } else {
            mind.next_blow.flipped()
        };
        match side {
            BlowSide::Left => frame.blow_left_released = true,
            BlowSide::Right => frame.blow_right_released = true,
        }
        frame
    }

    fn fight(&mut self, player: PlayerId) -> InputFrame {
        // P1 spawns on the left, P2 on the right
        let toward = match player {
            PlayerId::One => 1.0,
            PlayerId::Two => -1.0,
        };
        let mind = &mut self.minds[player.index()];
        if mind.hold_ticks == 0 {
            let roll: f64 = self.rng.gen();
            mind.held_axis = if roll < 0.7 {
                toward
            } else if roll < 0.9 {
                -toward
            } else {
                0.0
            };
            mind.hold_ticks = self.rng.gen_range(HOLD_TICKS_MIN..HOLD_TICKS_MAX);
        }
        mind.hold_ticks -= 1;

        InputFrame {
            move_axis: mind.held_axis,
            jump_pressed: self.rng.gen_bool(JUMP_CHANCE),
            attack_pressed: self.rng.gen_bool(ATTACK_CHANCE),
            ..InputFrame::idle()
        }
    }
}

impl InputSource for SeededBotInput {
    fn sample(&mut self, player: PlayerId, stage: Stage) -> InputFrame {
        match stage {
            Stage::BubbleBlowing => self.blow(player),
            Stage::Fighting | Stage::PostFighting => self.fight(player),
            Stage::Setup | Stage::PreBubbleBlowing | Stage::Finished => {
                self.minds[player.index()] = BotMind::default();
                InputFrame::idle()
            }
        }
    }
}

//! State-change broadcasts
//!
//! Every externally visible effect of a tick is expressed as a [`StateChange`].
//! The authoritative match emits them in order; the transport delivers them to
//! the local presentation and, when networked, to remote projections.

use serde::{Deserialize, Serialize};

use super::ports::Presentation;
use super::types::{AnnouncerCue, BlowSide, PlayerId, SoundEffect, Stage, TextAnchor, TopText, Vec3};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateChange {
    StageChanged(Stage),
    Cue(AnnouncerCue),
    Text { text: TopText, anchor: TextAnchor },
    ControlsVisible(bool),
    BlowHighlight(BlowSide),
    BlowControllersActive(bool),
    FightersActivated { masses: [f32; 2] },
    Grew { player: PlayerId, size: f32 },
    Sfx { player: PlayerId, sfx: SoundEffect },
    Footsteps { player: PlayerId, playing: bool },
    Moved { player: PlayerId, position: Vec3, facing: Vec3 },
    Knockback { target: PlayerId, impulse: Vec3 },
    HitReaction { player: PlayerId },
    Respawned { player: PlayerId, position: Vec3 },
    Eliminated { player: PlayerId },
    Score { one: u32, two: u32 },
    MatchWon { winner: PlayerId },
    MatchTerminated,
}

impl StateChange {
    /// Changes that start a new life for a player open a new broadcast round.
    pub fn opens_round(&self) -> bool {
        matches!(self, StateChange::Respawned { .. } | StateChange::StageChanged(Stage::Setup))
    }
}

/// Forward a change to a presentation. Changes with no presentational side
/// (stage bookkeeping, physics echoes) are ignored here.
pub fn present(change: &StateChange, presentation: &mut dyn Presentation) {
    match *change {
        StateChange::Cue(cue) => presentation.play_cue(cue),
        StateChange::Text { text, anchor } => presentation.show_text(text, anchor),
        StateChange::ControlsVisible(visible) => presentation.set_controls_visible(visible),
        StateChange::BlowHighlight(side) => presentation.set_blow_highlight(side),
        StateChange::Grew { player, size } => presentation.set_player_scale(player, size),
        StateChange::Sfx { player, sfx } => presentation.play_sfx(player, sfx),
        StateChange::Footsteps { player, playing } => presentation.set_footsteps(player, playing),
        StateChange::HitReaction { player } => presentation.play_hit_reaction(player),
        StateChange::Respawned { player, .. } => presentation.set_player_visible(player, true),
        StateChange::Eliminated { player } => presentation.set_player_visible(player, false),
        StateChange::MatchTerminated => presentation.return_to_lobby(),
        StateChange::StageChanged(_)
        | StateChange::BlowControllersActive(_)
        | StateChange::FightersActivated { .. }
        | StateChange::Moved { .. }
        | StateChange::Knockback { .. }
        | StateChange::Score { .. }
        | StateChange::MatchWon { .. } => {}
    }
}

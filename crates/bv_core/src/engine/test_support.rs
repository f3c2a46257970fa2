//! Recording doubles shared by the engine tests.

use super::config::MatchConfig;
use super::input::ScriptedInput;
use super::match_machine::Match;
use super::ports::{BodyState, Physics, Presentation};
use super::types::{
    AnnouncerCue, BlowSide, LayerMask, PlayerId, SoundEffect, Stage, TextAnchor, TopText, Vec3,
};
use crate::error::{MatchError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum PresentationCall {
    Text(TopText, TextAnchor),
    Cue(AnnouncerCue),
    ControlsVisible(bool),
    Highlight(BlowSide),
    Sfx(PlayerId, SoundEffect),
    Footsteps(PlayerId, bool),
    HitReaction(PlayerId),
    Scale(PlayerId, f32),
    Visible(PlayerId, bool),
    ReturnToLobby,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingPresentation {
    pub calls: Vec<PresentationCall>,
}

impl RecordingPresentation {
    pub fn cues(&self) -> Vec<AnnouncerCue> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PresentationCall::Cue(cue) => Some(*cue),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<TopText> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PresentationCall::Text(text, _) => Some(*text),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &PresentationCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }
}

impl Presentation for RecordingPresentation {
    fn show_text(&mut self, text: TopText, anchor: TextAnchor) {
        self.calls.push(PresentationCall::Text(text, anchor));
    }
    fn play_cue(&mut self, cue: AnnouncerCue) {
        self.calls.push(PresentationCall::Cue(cue));
    }
    fn set_controls_visible(&mut self, visible: bool) {
        self.calls.push(PresentationCall::ControlsVisible(visible));
    }
    fn set_blow_highlight(&mut self, side: BlowSide) {
        self.calls.push(PresentationCall::Highlight(side));
    }
    fn play_sfx(&mut self, player: PlayerId, sfx: SoundEffect) {
        self.calls.push(PresentationCall::Sfx(player, sfx));
    }
    fn set_footsteps(&mut self, player: PlayerId, playing: bool) {
        self.calls.push(PresentationCall::Footsteps(player, playing));
    }
    fn play_hit_reaction(&mut self, player: PlayerId) {
        self.calls.push(PresentationCall::HitReaction(player));
    }
    fn set_player_scale(&mut self, player: PlayerId, size: f32) {
        self.calls.push(PresentationCall::Scale(player, size));
    }
    fn set_player_visible(&mut self, player: PlayerId, visible: bool) {
        self.calls.push(PresentationCall::Visible(player, visible));
    }
    fn return_to_lobby(&mut self) {
        self.calls.push(PresentationCall::ReturnToLobby);
    }
}

/// Physics double with scripted probe answers. A downward ray is a ground
/// probe, anything else a wall probe; the ray belongs to the body nearest
/// its origin along the lane.
#[derive(Debug, Clone)]
pub struct ScriptedPhysics {
    pub grounded: [bool; 2],
    pub against_wall: [bool; 2],
    pub fail_raycasts: bool,
    pub bodies: [Option<BodyState>; 2],
    pub spawned: Vec<(PlayerId, Vec3)>,
    pub activated: Vec<(PlayerId, f32, f32)>,
    pub impulses: Vec<(PlayerId, Vec3)>,
    pub teleports: Vec<(PlayerId, Vec3)>,
    pub removed: Vec<PlayerId>,
}

impl Default for ScriptedPhysics {
    fn default() -> Self {
        Self {
            grounded: [true, true],
            against_wall: [false, false],
            fail_raycasts: false,
            bodies: [None, None],
            spawned: Vec::new(),
            activated: Vec::new(),
            impulses: Vec::new(),
            teleports: Vec::new(),
            removed: Vec::new(),
        }
    }
}

impl ScriptedPhysics {
    fn nearest_body(&self, x: f32) -> Option<PlayerId> {
        PlayerId::ALL
            .into_iter()
            .filter_map(|id| self.bodies[id.index()].map(|b| (id, (b.position.x - x).abs())))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}

impl Physics for ScriptedPhysics {
    fn raycast(&self, origin: Vec3, direction: Vec3, _max: f32, _mask: LayerMask) -> Result<bool> {
        if self.fail_raycasts {
            return Err(MatchError::MissingCollaboratorResponse("raycast".into()));
        }
        let Some(id) = self.nearest_body(origin.x) else { return Ok(false) };
        if direction.y < -0.5 {
            Ok(self.grounded[id.index()])
        } else {
            Ok(self.against_wall[id.index()])
        }
    }

    fn apply_impulse(&mut self, body: PlayerId, impulse: Vec3) {
        self.impulses.push((body, impulse));
        if let Some(b) = self.bodies[body.index()].as_mut() {
            b.velocity += impulse;
        }
    }

    fn set_velocity(&mut self, body: PlayerId, velocity: Vec3) {
        if let Some(b) = self.bodies[body.index()].as_mut() {
            b.velocity = velocity;
        }
    }

    fn teleport(&mut self, body: PlayerId, position: Vec3) {
        self.teleports.push((body, position));
        if let Some(b) = self.bodies[body.index()].as_mut() {
            b.position = position;
        }
    }

    fn move_by(&mut self, body: PlayerId, delta: Vec3) {
        if let Some(b) = self.bodies[body.index()].as_mut() {
            b.position += delta;
        }
    }

    fn face(&mut self, _body: PlayerId, _forward: Vec3) {}

    fn spawn_body(&mut self, body: PlayerId, position: Vec3, _size: f32) {
        self.spawned.push((body, position));
        self.bodies[body.index()] = Some(BodyState { position, velocity: Vec3::zeros() });
    }

    fn activate_body(&mut self, body: PlayerId, mass: f32, size: f32) {
        self.activated.push((body, mass, size));
    }

    fn remove_body(&mut self, body: PlayerId) {
        self.removed.push(body);
        self.bodies[body.index()] = None;
    }

    fn body_state(&self, body: PlayerId) -> Option<BodyState> {
        self.bodies[body.index()]
    }
}

pub type ScriptedMatch = Match<RecordingPresentation, ScriptedPhysics, ScriptedInput>;

pub fn scripted_match_with(config: MatchConfig) -> ScriptedMatch {
    Match::new(config, RecordingPresentation::default(), ScriptedPhysics::default(), ScriptedInput::new())
        .expect("valid test config")
}

pub fn scripted_match() -> ScriptedMatch {
    scripted_match_with(MatchConfig::default())
}

/// Run setup, the countdown and the blowing stage with idle input.
pub fn advance_to_fighting(m: &mut ScriptedMatch) {
    m.advance(0.0);
    let step = m.config().stage.countdown_step_secs;
    let mut guard = 0;
    while m.current_stage() != Stage::Fighting {
        m.advance(step);
        guard += 1;
        assert!(guard < 1_000, "match never reached Fighting");
    }
}

//! Shared value types for the match engine.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// World-space vector (y is up, x is the fighting lane).
pub type Vec3 = Vector3<f32>;

pub fn up() -> Vec3 {
    Vec3::new(0.0, 1.0, 0.0)
}

pub fn lane_right() -> Vec3 {
    Vec3::new(1.0, 0.0, 0.0)
}

/// One of the two bubblemen in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    pub const ALL: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    pub fn opponent(self) -> Self {
        match self {
            PlayerId::One => PlayerId::Two,
            PlayerId::Two => PlayerId::One,
        }
    }

    pub fn index(self) -> usize {
        match self {
            PlayerId::One => 0,
            PlayerId::Two => 1,
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            PlayerId::One => "P1",
            PlayerId::Two => "P2",
        }
    }

    pub fn long_label(self) -> &'static str {
        match self {
            PlayerId::One => "Player One",
            PlayerId::Two => "Player Two",
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.short_label())
    }
}

/// Match stages. Transitions only move forward, apart from the
/// restart loop back into `Setup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Setup,
    PreBubbleBlowing,
    BubbleBlowing,
    Fighting,
    PostFighting,
    /// Terminal: the match has signalled its return to the lobby.
    Finished,
}

impl Stage {
    pub fn can_transition_to(self, next: Stage) -> bool {
        matches!(
            (self, next),
            (Stage::Setup, Stage::PreBubbleBlowing)
                | (Stage::PreBubbleBlowing, Stage::BubbleBlowing)
                | (Stage::BubbleBlowing, Stage::Fighting)
                | (Stage::Fighting, Stage::PostFighting)
                | (Stage::PostFighting, Stage::Finished)
                | (Stage::PostFighting, Stage::Setup)
                | (Stage::Finished, Stage::Setup)
        )
    }
}

/// Which blow button a player must release next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlowSide {
    Left,
    Right,
}

impl BlowSide {
    pub fn flipped(self) -> Self {
        match self {
            BlowSide::Left => BlowSide::Right,
            BlowSide::Right => BlowSide::Left,
        }
    }
}

/// Announcer clips, in the order of the announcer clip table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnouncerCue {
    Three,
    Two,
    One,
    Blow,
    Fight,
}

impl AnnouncerCue {
    pub fn index(self) -> usize {
        match self {
            AnnouncerCue::Three => 0,
            AnnouncerCue::Two => 1,
            AnnouncerCue::One => 2,
            AnnouncerCue::Blow => 3,
            AnnouncerCue::Fight => 4,
        }
    }

    /// Cue for a countdown value; only 3, 2, 1 and 0 have one.
    pub fn for_countdown(value: i32) -> Option<Self> {
        match value {
            3 => Some(AnnouncerCue::Three),
            2 => Some(AnnouncerCue::Two),
            1 => Some(AnnouncerCue::One),
            0 => Some(AnnouncerCue::Blow),
            _ => None,
        }
    }
}

/// Where the top text sits on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAnchor {
    /// Middle of the arena (countdown, FIGHT!, winner).
    Center,
    /// Top edge while blowing.
    TopBar,
    /// Top edge, smaller font, for the scoreboard.
    ScoreBar,
}

/// Content of the top text element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopText {
    Empty,
    Countdown(u8),
    Blow,
    TimeUp,
    Fight,
    Scoreboard { one: u32, two: u32 },
    Winner(PlayerId),
}

impl TopText {
    /// Render for a viewer. `perspective` is the local player of a
    /// networked observer; `None` renders the shared-screen wording.
    pub fn render(&self, perspective: Option<PlayerId>) -> String {
        match (*self, perspective) {
            (TopText::Empty, _) => String::new(),
            (TopText::Countdown(n), _) => n.to_string(),
            (TopText::Blow, _) => "BLOW!".to_string(),
            (TopText::TimeUp, _) => "Time is up!".to_string(),
            (TopText::Fight, _) => "FIGHT!".to_string(),
            (TopText::Scoreboard { one, two }, None) => {
                format!("P1: {}\t\t\tP2: {}", one, two)
            }
            (TopText::Scoreboard { one, two }, Some(me)) => {
                let (mine, theirs) = if me == PlayerId::One { (one, two) } else { (two, one) };
                format!("You: {}\t\t\tOpponent: {}", mine, theirs)
            }
            (TopText::Winner(winner), None) => format!("{} Wins!", winner.long_label()),
            (TopText::Winner(winner), Some(me)) => {
                if winner == me { "You Win!".to_string() } else { "You Lose!".to_string() }
            }
        }
    }
}

impl fmt::Display for TopText {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.render(None))
    }
}

/// Per-player sound effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    Jump,
    Punch,
    Kick,
    Pop,
    Bump,
    Blow,
}

/// Raycast filter. The engine only ever asks for "anything that is not a player".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerMask {
    All,
    IgnorePlayers,
}

/// What a bubbleman's body bumped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Contact {
    Player(PlayerId),
    Environment,
}

/// Kind of attack; exactly one collider is live during an attack window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackKind {
    Punch,
    Kick,
}

impl AttackKind {
    pub fn is_punch(self) -> bool {
        matches!(self, AttackKind::Punch)
    }

    pub fn from_punch_flag(is_punch: bool) -> Self {
        if is_punch { AttackKind::Punch } else { AttackKind::Kick }
    }
}

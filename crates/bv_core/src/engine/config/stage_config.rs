//! Stage timing configuration

use serde::{Deserialize, Serialize};

/// Match stage timers and the win condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Countdown value at setup; the first cue fires one step later (default: 4)
    pub countdown_start: i32,
    /// Seconds between countdown steps (default: 1.0)
    pub countdown_step_secs: f32,
    /// Length of the blowing minigame (default: 5.0)
    pub blow_duration_secs: f32,
    /// FIGHT! banner before the scoreboard shows (default: 0.9)
    pub fight_banner_secs: f32,
    /// Winner text hold before the match ends (default: 5.0)
    pub post_fight_secs: f32,
    /// Blow key highlight alternation period (default: 0.5)
    pub highlight_period_secs: f32,
    /// Pops needed to win (default: 5)
    pub win_score: u32,
    /// Loop back to setup instead of returning to the lobby (default: false)
    pub auto_restart: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            countdown_start: 4,
            countdown_step_secs: 1.0,
            blow_duration_secs: 5.0,
            fight_banner_secs: 0.9,
            post_fight_secs: 5.0,
            highlight_period_secs: 0.5,
            win_score: 5,
            auto_restart: false,
        }
    }
}

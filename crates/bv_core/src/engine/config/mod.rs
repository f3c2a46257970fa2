//! # Match Configuration
//!
//! Every tuning constant of a match lives here so presets and config files
//! can change balance without touching the engine.
//!
//! ```rust
//! use bv_core::engine::config::MatchConfig;
//!
//! let config = MatchConfig::default();
//! let quick = MatchConfig::quick_play();
//! assert!(quick.stage.win_score < config.stage.win_score);
//! ```

mod blow_config;
mod fighter_config;
mod stage_config;

pub use blow_config::BlowConfig;
pub use fighter_config::FighterConfig;
pub use stage_config::StageConfig;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{MatchError, Result};

/// Full match configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MatchConfig {
    #[serde(default)]
    pub stage: StageConfig,
    #[serde(default)]
    pub blow: BlowConfig,
    #[serde(default)]
    pub fighter: FighterConfig,
}

pub const PRESET_NAMES: [&str; 4] = ["classic", "quick_play", "endurance", "deterministic"];

impl MatchConfig {
    /// The shipped game balance (default)
    pub fn classic() -> Self {
        Self::default()
    }

    /// Shorter countdown and blowing, first to three
    pub fn quick_play() -> Self {
        let mut cfg = Self::default();
        cfg.stage.countdown_step_secs = 0.5;
        cfg.stage.blow_duration_secs = 3.0;
        cfg.stage.post_fight_secs = 2.0;
        cfg.stage.win_score = 3;
        cfg.blow.blow_step = 0.03;
        cfg
    }

    /// Long blowing phase, first to ten, lighter knockback
    pub fn endurance() -> Self {
        let mut cfg = Self::default();
        cfg.stage.blow_duration_secs = 8.0;
        cfg.stage.win_score = 10;
        cfg.fighter.punch_strength = 5.0;
        cfg.fighter.kick_strength = 7.5;
        cfg
    }

    /// For tests: no respawn invulnerability and whole-second timers
    pub fn deterministic() -> Self {
        let mut cfg = Self::default();
        cfg.stage.fight_banner_secs = 1.0;
        cfg.fighter.respawn_invulnerable_secs = 0.0;
        cfg
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "classic" => Some(Self::classic()),
            "quick_play" => Some(Self::quick_play()),
            "endurance" => Some(Self::endurance()),
            "deterministic" => Some(Self::deterministic()),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let s = &self.stage;
        positive("stage.countdown_step_secs", s.countdown_step_secs)?;
        non_negative("stage.blow_duration_secs", s.blow_duration_secs)?;
        non_negative("stage.fight_banner_secs", s.fight_banner_secs)?;
        non_negative("stage.post_fight_secs", s.post_fight_secs)?;
        positive("stage.highlight_period_secs", s.highlight_period_secs)?;
        if s.countdown_start < 1 {
            return Err(MatchError::InvalidConfig("stage.countdown_start must be >= 1".into()));
        }
        if s.win_score == 0 {
            return Err(MatchError::InvalidConfig("stage.win_score must be >= 1".into()));
        }

        positive("blow.base_size", self.blow.base_size)?;
        non_negative("blow.blow_step", self.blow.blow_step)?;

        let f = &self.fighter;
        non_negative("fighter.speed", f.speed)?;
        non_negative("fighter.jump_strength", f.jump_strength)?;
        non_negative("fighter.airborne_height", f.airborne_height)?;
        non_negative("fighter.punch_strength", f.punch_strength)?;
        non_negative("fighter.kick_strength", f.kick_strength)?;
        positive("fighter.punch_window_secs", f.punch_window_secs)?;
        positive("fighter.kick_window_secs", f.kick_window_secs)?;
        non_negative("fighter.pop_vulnerable_secs", f.pop_vulnerable_secs)?;
        non_negative("fighter.respawn_invulnerable_secs", f.respawn_invulnerable_secs)?;
        positive("fighter.capsule_height", f.capsule_height)?;
        positive("fighter.capsule_radius", f.capsule_radius)?;
        non_negative("fighter.respawn_offset", f.respawn_offset)?;
        non_negative("fighter.wall_probe_margin", f.wall_probe_margin)?;
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(yaml)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| MatchError::Serialization(e.to_string()))
    }
}

fn positive(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(MatchError::InvalidConfig(format!("{} must be a positive number, got {}", name, value)))
    }
}

fn non_negative(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(MatchError::InvalidConfig(format!("{} must be >= 0, got {}", name, value)))
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("yaml") | Some("yml"))
}

/// Load a config file; `.yaml`/`.yml` are read as YAML, anything else as JSON.
pub fn load_config_file<P: AsRef<Path>>(path: P) -> anyhow::Result<MatchConfig> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading match config {}", path.display()))?;
    let cfg = if is_yaml(path) {
        MatchConfig::from_yaml_str(&data)
    } else {
        MatchConfig::from_json_str(&data)
    }
    .with_context(|| format!("parsing match config {}", path.display()))?;
    Ok(cfg)
}

pub fn save_config_file<P: AsRef<Path>>(config: &MatchConfig, path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    let data = if is_yaml(path) {
        config.to_yaml_string()?
    } else {
        serde_json::to_string_pretty(config)?
    };
    std::fs::write(path, data).with_context(|| format!("writing match config {}", path.display()))?;
    Ok(())
}

// ========== Tests ==========

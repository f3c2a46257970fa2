//! Blowing minigame configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlowConfig {
    /// Uniform scale every bubbleman starts the match with (default: 1.0)
    pub base_size: f32,
    /// Scale added per correct alternating release (default: 0.02)
    pub blow_step: f32,
}

impl Default for BlowConfig {
    fn default() -> Self {
        Self { base_size: 1.0, blow_step: 0.02 }
    }
}

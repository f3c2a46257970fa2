//! # bv_core - Bubblemen VS match engine
//!
//! Deterministic core of a two-player party brawler: a countdown, a
//! button-mashing blow phase that inflates each bubbleman, then a physics
//! fight where every pop scores a point for the opponent.
//!
//! ## Features
//! - Frame-rate independent stage machine (same cues at 16 ms or 5 s frames)
//! - Collaborator traits for presentation, physics and input
//! - Local or networked delivery of state changes, with read-only projections
//! - Reference arena physics and seeded bots for headless runs
//! - JSON API for simulation from other hosts

// Game engine APIs often require many parameters for physics, state, etc.
#![allow(clippy::too_many_arguments)]
// Struct initialization pattern used intentionally
#![allow(clippy::field_reassign_with_default)]
#![allow(clippy::new_without_default)]

pub mod api;
pub mod engine;
pub mod error;

pub use api::{simulate_match, simulate_match_json, SimulationRequest, SimulationResponse};
pub use engine::config::{load_config_file, save_config_file, MatchConfig};
pub use engine::{
    ArenaHost, ArenaPhysics, Match, NullPresentation, PlayerId, Presentation, Stage, StateChange,
    Transport,
};
pub use error::{MatchError, Result};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// JSON API schema version
pub const SCHEMA_VERSION: u8 = api::SCHEMA_VERSION;

pub mod arena; // Reference physics for headless runs
pub mod blow_phase;
pub mod bubbleman;
pub mod combat;
pub mod config;
pub mod debug_flags; // Debug output gating (env-based)
pub mod events;
pub mod fight_phase;
pub mod input;
pub mod match_machine;
pub mod ports; // Presentation / Physics / Input seams
pub mod timer;
pub mod transport; // Local vs networked broadcast delivery
pub mod types;

#[cfg(test)]
mod scenario_tests;
#[cfg(test)]
pub(crate) mod test_support;

pub use arena::{ArenaHost, ArenaPhysics, ArenaSpec};
pub use blow_phase::BlowPhaseController;
pub use bubbleman::{BubblemanState, FighterProfile};
pub use combat::{AttackEvent, AttackResolution, PopOutcome};
pub use config::MatchConfig;
pub use events::StateChange;
pub use fight_phase::FightPhaseController;
pub use input::{ScriptedInput, SeededBotInput};
pub use match_machine::{Match, SpawnPoints};
pub use ports::{InputFrame, InputSource, NullPresentation, Physics, Presentation};
pub use transport::{Envelope, PlayerCommand, Projection, RemoteInput, Transport};
pub use types::{PlayerId, Stage};

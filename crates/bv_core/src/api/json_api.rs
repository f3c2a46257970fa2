use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::engine::arena::{ArenaHost, ArenaPhysics, ArenaSpec};
use crate::engine::config::MatchConfig;
use crate::engine::input::SeededBotInput;
use crate::engine::match_machine::Match;
use crate::engine::ports::NullPresentation;
use crate::engine::transport::{Envelope, Transport};
use crate::engine::types::{PlayerId, Stage};
use crate::error::{MatchError, Result};

pub const SCHEMA_VERSION: u8 = 1;

fn default_dt() -> f32 {
    1.0 / 60.0
}

fn default_max_seconds() -> f32 {
    120.0
}

/// Headless bot-vs-bot match request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub schema_version: u8,
    pub seed: u64,
    /// Named preset; ignored when `config` is given.
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub config: Option<MatchConfig>,
    #[serde(default = "default_dt")]
    pub dt: f32,
    /// Wall-clock cap on simulated time
    #[serde(default = "default_max_seconds")]
    pub max_seconds: f32,
    /// Attach every broadcast envelope to the response
    #[serde(default)]
    pub include_events: bool,
}

impl SimulationRequest {
    pub fn new(seed: u64) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            seed,
            preset: None,
            config: None,
            dt: default_dt(),
            max_seconds: default_max_seconds(),
            include_events: false,
        }
    }

    fn resolve_config(&self) -> Result<MatchConfig> {
        if let Some(config) = &self.config {
            return Ok(config.clone());
        }
        match self.preset.as_deref() {
            None => Ok(MatchConfig::default()),
            Some(name) => MatchConfig::preset(name)
                .ok_or_else(|| MatchError::InvalidConfig(format!("unknown preset '{}'", name))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResponse {
    pub schema_version: u8,
    pub seed: u64,
    pub winner: Option<PlayerId>,
    pub scores: [u32; 2],
    pub sizes: [f32; 2],
    pub ticks: u64,
    pub elapsed_seconds: f64,
    pub terminated: bool,
    pub final_stage: Stage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<Envelope>>,
}

pub fn simulate_match(request: &SimulationRequest) -> Result<SimulationResponse> {
    if request.schema_version != SCHEMA_VERSION {
        warn!("rejecting request with schema version {}", request.schema_version);
        return Err(MatchError::UnsupportedSchemaVersion {
            found: request.schema_version,
            expected: SCHEMA_VERSION,
        });
    }
    if !(request.dt.is_finite() && request.dt > 0.0) {
        return Err(MatchError::InvalidConfig(format!("dt must be positive, got {}", request.dt)));
    }
    if !(request.max_seconds.is_finite() && request.max_seconds > 0.0) {
        return Err(MatchError::InvalidConfig(format!(
            "max_seconds must be positive, got {}",
            request.max_seconds
        )));
    }

    let config = request.resolve_config()?;
    debug!("simulation config: {:?}", config);

    let mut game = Match::new(
        config,
        NullPresentation,
        ArenaPhysics::new(ArenaSpec::default()),
        SeededBotInput::new(request.seed),
    )?;
    let events = if request.include_events {
        game = game.with_transport(Transport::networked());
        game.subscribe()
    } else {
        None
    };

    let mut host = ArenaHost::new(game);
    let max_ticks = (request.max_seconds / request.dt).ceil() as u64;
    let mut ticks = 0u64;
    while ticks < max_ticks && !host.game().is_terminated() {
        host.step(request.dt);
        ticks += 1;
    }

    let game = host.into_inner();
    let response = SimulationResponse {
        schema_version: SCHEMA_VERSION,
        seed: request.seed,
        winner: game.winner(),
        scores: game.scores(),
        sizes: [game.bubbleman(PlayerId::One).size(), game.bubbleman(PlayerId::Two).size()],
        ticks,
        elapsed_seconds: ticks as f64 * request.dt as f64,
        terminated: game.is_terminated(),
        final_stage: game.current_stage(),
        events: events.map(|rx| rx.try_iter().collect()),
    };

    info!(
        seed = request.seed,
        ticks,
        terminated = response.terminated,
        "simulation finished: {:?} {}-{}",
        response.winner,
        response.scores[0],
        response.scores[1]
    );
    Ok(response)
}

/// JSON in, JSON out.
pub fn simulate_match_json(request_json: &str) -> Result<String> {
    let request: SimulationRequest = serde_json::from_str(request_json)?;
    let response = simulate_match(&request)?;
    serde_json::to_string(&response).map_err(|e| MatchError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::events::StateChange;
    use sha2::{Digest, Sha256};

    fn short_request(seed: u64) -> SimulationRequest {
        SimulationRequest { max_seconds: 12.0, ..SimulationRequest::new(seed) }
    }

    #[test]
    fn test_same_seed_same_response_hash() {
        let json = serde_json::to_string(&short_request(1234)).unwrap();
        let a = simulate_match_json(&json).unwrap();
        let b = simulate_match_json(&json).unwrap();
        assert_eq!(Sha256::digest(a.as_bytes()), Sha256::digest(b.as_bytes()));
    }

    #[test]
    fn test_short_run_reaches_fighting_and_respects_cap() {
        let response = simulate_match(&short_request(9)).unwrap();
        assert_eq!(response.ticks, (12.0f32 / default_dt()).ceil() as u64);
        assert!(response.sizes[0] >= 1.0 && response.sizes[1] >= 1.0);
        assert!(matches!(
            response.final_stage,
            Stage::Fighting | Stage::PostFighting | Stage::Finished
        ));
        assert!(response.events.is_none());
    }

    #[test]
    fn test_events_are_ordered_envelopes() {
        let request = SimulationRequest { include_events: true, ..short_request(5) };
        let response = simulate_match(&request).unwrap();
        let events = response.events.expect("events requested");
        assert!(events.iter().enumerate().all(|(i, e)| e.seq == i as u64));
        assert!(events.iter().any(|e| e.change == StateChange::StageChanged(Stage::Fighting)));
    }

    #[test]
    fn test_rejects_bad_requests() {
        let mut request = short_request(1);
        request.schema_version = 2;
        assert_eq!(
            simulate_match(&request),
            Err(MatchError::UnsupportedSchemaVersion { found: 2, expected: 1 })
        );

        let request = SimulationRequest { preset: Some("sudden_death".into()), ..short_request(1) };
        assert!(matches!(simulate_match(&request), Err(MatchError::InvalidConfig(_))));

        let request = SimulationRequest { dt: 0.0, ..short_request(1) };
        assert!(matches!(simulate_match(&request), Err(MatchError::InvalidConfig(_))));

        assert!(matches!(simulate_match_json("{"), Err(MatchError::Deserialization(_))));
    }

    #[test]
    fn test_request_defaults_from_minimal_json() {
        let request: SimulationRequest =
            serde_json::from_str(r#"{"schema_version":1,"seed":3,"preset":"quick_play"}"#).unwrap();
        assert_eq!(request.dt, default_dt());
        assert_eq!(request.max_seconds, 120.0);
        assert!(!request.include_events);
        assert_eq!(request.resolve_config().unwrap(), MatchConfig::quick_play());
    }
}

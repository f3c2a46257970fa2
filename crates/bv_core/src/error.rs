use thiserror::Error;

use crate::engine::types::Stage;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("Invalid stage transition: {from:?} -> {to:?}")]
    InvalidStageTransition { from: Stage, to: Stage },

    #[error("Collaborator did not respond: {0}")]
    MissingCollaboratorResponse(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unsupported schema version: found {found}, expected {expected}")]
    UnsupportedSchemaVersion { found: u8, expected: u8 },

    #[error("Out of order broadcast: expected seq {expected}, found {found}")]
    OutOfOrderBroadcast { expected: u64, found: u64 },

    #[error("Stale round in broadcast: last applied {last}, found {found}")]
    StaleRound { last: u32, found: u32 },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl MatchError {
    /// Whether the caller can keep ticking after seeing this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            MatchError::MissingCollaboratorResponse(_) => true,
            MatchError::OutOfOrderBroadcast { .. } => true,
            MatchError::StaleRound { .. } => true,
            MatchError::InvalidStageTransition { .. } => false,
            MatchError::InvalidConfig(_) => false,
            MatchError::UnsupportedSchemaVersion { .. } => false,
            MatchError::Serialization(_) | MatchError::Deserialization(_) => false,
        }
    }
}

impl From<serde_json::Error> for MatchError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            MatchError::Deserialization(err.to_string())
        } else {
            MatchError::Serialization(err.to_string())
        }
    }
}

impl From<serde_yaml::Error> for MatchError {
    fn from(err: serde_yaml::Error) -> Self {
        MatchError::Deserialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MatchError>;

//! Error types and result aliases for the Quorum library.
//!
//! This module defines the core error type [`QuorumError`] and the [`Result`] type alias
//! used throughout the library. All public APIs that can fail return `Result<T>` for
//! consistent error handling.
//!
//! Participant-level failures ([`QuorumError::ParticipantError`] and
//! [`QuorumError::MalformedContribution`]) are recovered inside the collaboration
//! loops and never escape a `run()` call; only [`QuorumError::ConfigError`] is
//! surfaced to the caller before a loop starts.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuorumError {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Participant error: {0}")]
    ParticipantError(String),

    #[error("Malformed contribution: {0}")]
    MalformedContribution(String),

    #[error("Completion gateway error: {0}")]
    GatewayError(String),

    #[error("Search error: {0}")]
    SearchError(String),

    #[error("Routing error: {0}")]
    RoutingError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QuorumError>;

//! Error types for the boundaries of the game.
//!
//! The simulation itself never fails: degenerate geometry becomes a no-motion
//! frame and defeat is a normal phase change. Errors only exist where the game
//! touches the outside world (config files, the oracle service).

use thiserror::Error;

/// Failure to load or validate a [`crate::SimConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Failure talking to the oracle text service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdvisoryError {
    #[error("no API key configured")]
    MissingCredentials,

    #[error("oracle request failed: {0}")]
    Transport(String),

    #[error("oracle returned an empty answer")]
    EmptyResponse,
}

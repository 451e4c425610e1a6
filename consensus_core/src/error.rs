//! Error types for the consensus simulation core.

use std::path::PathBuf;
use thiserror::Error;

/// A configuration field violated its constraint.
///
/// Raised while building a [`Configuration`](crate::Configuration), before any
/// simulation object exists.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `number_of_agents` must be greater than 1
    #[error("number_of_agents must be > 1, got {0}")]
    TooFewAgents(usize),

    /// `connection_probability` must lie in [0, 1]
    #[error("connection_probability must be in [0, 1], got {0}")]
    ConnectionProbabilityOutOfRange(f64),

    /// `noise_level` must be finite and non-negative
    #[error("noise_level must be >= 0, got {0}")]
    NoiseLevelOutOfRange(f64),

    /// `max_steps` must be greater than 0
    #[error("max_steps must be > 0")]
    ZeroMaxSteps,

    /// `epsilon` must lie in (0, 1]
    #[error("epsilon must be in (0, 1], got {0}")]
    EpsilonOutOfRange(f64),

    /// The configuration document could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration file could not be read
    #[error("Failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced while constructing or resetting a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The protocol kind has no implementation
    #[error("Unknown protocol type: {0}")]
    UnknownProtocol(String),

    /// Construction was attempted before a configuration was supplied
    #[error("Configuration has not been set")]
    Unconfigured,

    /// An explicit edge referenced a node outside the graph
    #[error("Edge ({from}, {to}) is out of range for a graph of {nodes} nodes")]
    InvalidEdge { from: usize, to: usize, nodes: usize },

    /// An explicit graph does not match `number_of_agents`
    #[error("Graph has {got} nodes but the configuration expects {expected}")]
    GraphSizeMismatch { expected: usize, got: usize },

    /// Explicit initial values do not match `number_of_agents`
    #[error("Got {got} initial values but the configuration expects {expected}")]
    InitialValuesMismatch { expected: usize, got: usize },
}

impl SimError {
    /// Creates an unknown-protocol error.
    pub fn unknown_protocol(kind: impl std::fmt::Display) -> Self {
        Self::UnknownProtocol(kind.to_string())
    }
}

//! Simulation configuration.
//!
//! A [`Configuration`] is validated once when it is built and is read-only
//! afterwards. The engine and the protocol factory take it by value or by
//! reference; there is no process-wide holder.
//!
//! Topology and protocol names that do not match a known variant are carried
//! through as `Unrecognized` rather than rejected here. The topology builder
//! recovers from them with a warning, while the protocol factory refuses them.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Graph shape connecting the agents.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TopologyKind {
    /// Erdős–Rényi graph, each edge present with `connection_probability`
    #[default]
    Random,

    /// Cycle through all agents in id order
    Ring,

    /// Complete graph
    FullyConnected,

    /// A name with no generator behind it
    Unrecognized(String),
}

impl TopologyKind {
    /// Returns the recognised topologies.
    pub fn all() -> Vec<TopologyKind> {
        vec![
            TopologyKind::Random,
            TopologyKind::Ring,
            TopologyKind::FullyConnected,
        ]
    }

    /// Returns the topology name.
    pub fn name(&self) -> &str {
        match self {
            TopologyKind::Random => "random",
            TopologyKind::Ring => "ring",
            TopologyKind::FullyConnected => "fully_connected",
            TopologyKind::Unrecognized(name) => name,
        }
    }
}

impl From<&str> for TopologyKind {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "random" | "erdos_renyi" => TopologyKind::Random,
            "ring" | "cycle" => TopologyKind::Ring,
            "fully_connected" | "complete" => TopologyKind::FullyConnected,
            _ => TopologyKind::Unrecognized(s.to_string()),
        }
    }
}

impl From<String> for TopologyKind {
    fn from(s: String) -> Self {
        TopologyKind::from(s.as_str())
    }
}

impl From<TopologyKind> for String {
    fn from(kind: TopologyKind) -> Self {
        kind.name().to_string()
    }
}

impl std::fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Update rule applied by every agent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProtocolKind {
    /// Discretised Laplacian flow towards the mean
    #[default]
    Linear,

    /// Flooding of the maximum value
    MaxConsensus,

    /// A name with no implementation behind it
    Unrecognized(String),
}

impl ProtocolKind {
    /// Returns the recognised protocols.
    pub fn all() -> Vec<ProtocolKind> {
        vec![ProtocolKind::Linear, ProtocolKind::MaxConsensus]
    }

    /// Returns the protocol name.
    pub fn name(&self) -> &str {
        match self {
            ProtocolKind::Linear => "linear",
            ProtocolKind::MaxConsensus => "max_consensus",
            ProtocolKind::Unrecognized(name) => name,
        }
    }
}

impl From<&str> for ProtocolKind {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "linear" => ProtocolKind::Linear,
            "max_consensus" | "max" => ProtocolKind::MaxConsensus,
            _ => ProtocolKind::Unrecognized(s.to_string()),
        }
    }
}

impl From<String> for ProtocolKind {
    fn from(s: String) -> Self {
        ProtocolKind::from(s.as_str())
    }
}

impl From<ProtocolKind> for String {
    fn from(kind: ProtocolKind) -> Self {
        kind.name().to_string()
    }
}

impl std::fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn default_connection_probability() -> f64 {
    0.3
}

fn default_noise_level() -> f64 {
    0.0
}

fn default_max_steps() -> u64 {
    100
}

fn default_epsilon() -> f64 {
    0.1
}

/// Unvalidated configuration fields.
///
/// This is the shape read from JSON and assembled by command-line overrides.
/// Turn it into a [`Configuration`] with [`SimulationParams::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Number of agents (nodes) in the network
    pub number_of_agents: usize,

    /// Network topology
    #[serde(default)]
    pub topology: TopologyKind,

    /// Edge probability for the random topology
    #[serde(default = "default_connection_probability")]
    pub connection_probability: f64,

    /// Consensus protocol
    #[serde(default)]
    pub protocol_type: ProtocolKind,

    /// Standard deviation of the additive measurement noise
    #[serde(default = "default_noise_level")]
    pub noise_level: f64,

    /// Step budget
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,

    /// Step size for linear consensus
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            number_of_agents: 10,
            topology: TopologyKind::default(),
            connection_probability: default_connection_probability(),
            protocol_type: ProtocolKind::default(),
            noise_level: default_noise_level(),
            max_steps: default_max_steps(),
            epsilon: default_epsilon(),
        }
    }
}

impl SimulationParams {
    /// Parses a JSON document without validating it.
    ///
    /// Omitted fields take their defaults; `number_of_agents` is required.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON file without validating it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Checks every field constraint and freezes the result.
    pub fn validate(self) -> Result<Configuration, ConfigError> {
        if self.number_of_agents <= 1 {
            return Err(ConfigError::TooFewAgents(self.number_of_agents));
        }
        if !(0.0..=1.0).contains(&self.connection_probability) {
            return Err(ConfigError::ConnectionProbabilityOutOfRange(
                self.connection_probability,
            ));
        }
        if !self.noise_level.is_finite() || self.noise_level < 0.0 {
            return Err(ConfigError::NoiseLevelOutOfRange(self.noise_level));
        }
        if self.max_steps == 0 {
            return Err(ConfigError::ZeroMaxSteps);
        }
        // NaN fails both comparisons
        if !(self.epsilon > 0.0 && self.epsilon <= 1.0) {
            return Err(ConfigError::EpsilonOutOfRange(self.epsilon));
        }

        Ok(Configuration { params: self })
    }
}

/// Validated, immutable simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Configuration {
    params: SimulationParams,
}

impl Configuration {
    /// Validates the given fields.
    pub fn new(params: SimulationParams) -> Result<Self, ConfigError> {
        params.validate()
    }

    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        SimulationParams::from_json_str(json)?.validate()
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        SimulationParams::from_json_file(path)?.validate()
    }

    pub fn number_of_agents(&self) -> usize {
        self.params.number_of_agents
    }

    pub fn topology(&self) -> &TopologyKind {
        &self.params.topology
    }

    pub fn connection_probability(&self) -> f64 {
        self.params.connection_probability
    }

    pub fn protocol_type(&self) -> &ProtocolKind {
        &self.params.protocol_type
    }

    pub fn noise_level(&self) -> f64 {
        self.params.noise_level
    }

    pub fn max_steps(&self) -> u64 {
        self.params.max_steps
    }

    pub fn epsilon(&self) -> f64 {
        self.params.epsilon
    }

    /// Returns the validated fields.
    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Unfreezes the configuration so fields can be overridden and re-validated.
    pub fn into_params(self) -> SimulationParams {
        self.params
    }
}

impl std::fmt::Display for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "agents={} topology={} p={} protocol={} epsilon={} noise={} max_steps={}",
            self.params.number_of_agents,
            self.params.topology,
            self.params.connection_probability,
            self.params.protocol_type,
            self.params.epsilon,
            self.params.noise_level,
            self.params.max_steps,
        )
    }
}

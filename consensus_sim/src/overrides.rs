//! Run parameters assembled from a base (file, scenario or defaults) plus
//! individual field overrides.

use crate::scenarios::ScenarioId;

use consensus_core::{ConfigError, Configuration, ProtocolKind, SimulationParams, TopologyKind};
use std::path::PathBuf;
use thiserror::Error;

/// Agent count for scenarios when none is given.
pub const DEFAULT_SCENARIO_AGENTS: usize = 10;

/// Failure to assemble run parameters.
#[derive(Debug, Error)]
pub enum OverrideError {
    #[error("a configuration file and a scenario are mutually exclusive")]
    ConflictingBase,

    #[error("{0}")]
    UnknownScenario(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Base selection plus per-field overrides. `None` keeps the base value.
#[derive(Debug, Clone, Default)]
pub struct ParamOverrides {
    /// JSON configuration file used as the base
    pub config: Option<PathBuf>,

    /// Preset scenario used as the base
    pub scenario: Option<String>,

    pub agents: Option<usize>,
    pub topology: Option<String>,
    pub probability: Option<f64>,
    pub protocol: Option<String>,
    pub noise: Option<f64>,
    pub epsilon: Option<f64>,
    pub steps: Option<u64>,
}

impl ParamOverrides {
    /// Loads the base without validating it, so an override can repair a
    /// field the base got wrong.
    fn base(&self) -> Result<SimulationParams, OverrideError> {
        match (&self.config, &self.scenario) {
            (Some(_), Some(_)) => Err(OverrideError::ConflictingBase),
            (Some(path), None) => Ok(SimulationParams::from_json_file(path)?),
            (None, Some(name)) => {
                let scenario: ScenarioId = name.parse().map_err(OverrideError::UnknownScenario)?;
                Ok(scenario.params(self.agents.unwrap_or(DEFAULT_SCENARIO_AGENTS)))
            }
            (None, None) => Ok(SimulationParams::default()),
        }
    }

    /// Applies the overrides to the base without validating.
    pub fn merge(&self) -> Result<SimulationParams, OverrideError> {
        let mut params = self.base()?;

        if let Some(agents) = self.agents {
            params.number_of_agents = agents;
        }
        if let Some(topology) = &self.topology {
            params.topology = TopologyKind::from(topology.as_str());
        }
        if let Some(p) = self.probability {
            params.connection_probability = p;
        }
        if let Some(protocol) = &self.protocol {
            params.protocol_type = ProtocolKind::from(protocol.as_str());
        }
        if let Some(noise) = self.noise {
            params.noise_level = noise;
        }
        if let Some(epsilon) = self.epsilon {
            params.epsilon = epsilon;
        }
        if let Some(steps) = self.steps {
            params.max_steps = steps;
        }

        Ok(params)
    }

    /// Merges, then validates the merged result.
    pub fn resolve(&self) -> Result<Configuration, OverrideError> {
        Ok(self.merge()?.validate()?)
    }
}

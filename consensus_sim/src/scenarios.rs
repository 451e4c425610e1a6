//! Preset simulation scenarios.

use consensus_core::{ProtocolKind, SimulationParams, TopologyKind};

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// Linear consensus on a sparse random graph
    Baseline,

    /// Linear consensus around a cycle
    RingLinear,

    /// Max-consensus on a complete graph (one-step agreement)
    CompleteMax,

    /// Max-consensus around a cycle (maximum travels one hop per step)
    RingMax,

    /// Linear consensus with Gaussian measurement noise
    NoisyLinear,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Baseline,
            ScenarioId::RingLinear,
            ScenarioId::CompleteMax,
            ScenarioId::RingMax,
            ScenarioId::NoisyLinear,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "baseline",
            ScenarioId::RingLinear => "ring_linear",
            ScenarioId::CompleteMax => "complete_max",
            ScenarioId::RingMax => "ring_max",
            ScenarioId::NoisyLinear => "noisy_linear",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "Random graph (p=0.3), linear consensus, epsilon 0.1",
            ScenarioId::RingLinear => "Ring, linear consensus, epsilon 0.3",
            ScenarioId::CompleteMax => "Fully connected, max-consensus, agrees after one step",
            ScenarioId::RingMax => "Ring, max-consensus, agrees within ceil(n/2) steps",
            ScenarioId::NoisyLinear => "Random graph, linear consensus with noise sigma 0.5",
        }
    }

    /// Returns the simulation parameters for `agents` agents.
    pub fn params(&self, agents: usize) -> SimulationParams {
        let base = SimulationParams {
            number_of_agents: agents,
            max_steps: 200,
            ..Default::default()
        };

        match self {
            ScenarioId::Baseline => base,
            ScenarioId::RingLinear => SimulationParams {
                topology: TopologyKind::Ring,
                epsilon: 0.3,
                max_steps: 300,
                ..base
            },
            ScenarioId::CompleteMax => SimulationParams {
                topology: TopologyKind::FullyConnected,
                protocol_type: ProtocolKind::MaxConsensus,
                max_steps: 10,
                ..base
            },
            ScenarioId::RingMax => SimulationParams {
                topology: TopologyKind::Ring,
                protocol_type: ProtocolKind::MaxConsensus,
                max_steps: agents.div_ceil(2).max(1) as u64,
                ..base
            },
            ScenarioId::NoisyLinear => SimulationParams {
                noise_level: 0.5,
                ..base
            },
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baseline" | "default" => Ok(ScenarioId::Baseline),
            "ring_linear" | "ringlinear" => Ok(ScenarioId::RingLinear),
            "complete_max" | "completemax" => Ok(ScenarioId::CompleteMax),
            "ring_max" | "ringmax" => Ok(ScenarioId::RingMax),
            "noisy_linear" | "noisylinear" | "noisy" => Ok(ScenarioId::NoisyLinear),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

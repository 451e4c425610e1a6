//! Consensus update rules.
//!
//! Each rule maps an agent's current state and its neighbours' current
//! states to the agent's next value. Rules never see values written during
//! the step being computed; the engine guarantees that.
//!
//! # Variants
//!
//! ```text
//! Linear:  x_i(k+1) = x_i(k) + ε Σ_j (x_j(k) - x_i(k)) + η,   η ~ N(0, σ²)
//! Max:     x_i(k+1) = max(x_i(k), max_j x_j(k))
//! ```
//!
//! An agent without neighbours keeps its value under every rule.

use crate::agent::AgentState;
use crate::config::ProtocolKind;
use crate::error::ConfigError;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// A local update rule.
pub trait UpdateRule {
    /// Computes the agent's next value.
    ///
    /// `rng` is only consulted by rules with a stochastic term.
    fn next_value<R: Rng + ?Sized>(
        &self,
        current: &AgentState,
        neighbors: &[&AgentState],
        rng: &mut R,
    ) -> f64;
}

/// Discretised Laplacian flow with optional Gaussian measurement noise.
#[derive(Debug, Clone)]
pub struct LinearConsensus {
    /// Step size
    epsilon: f64,

    /// Noise distribution, absent when the noise level is zero
    noise: Option<Normal<f64>>,
}

impl LinearConsensus {
    /// Creates a linear rule with step size `epsilon` and noise standard
    /// deviation `noise_level`.
    pub fn new(epsilon: f64, noise_level: f64) -> Result<Self, ConfigError> {
        let noise = if noise_level > 0.0 {
            let normal = Normal::new(0.0, noise_level)
                .map_err(|_| ConfigError::NoiseLevelOutOfRange(noise_level))?;
            Some(normal)
        } else if noise_level == 0.0 {
            None
        } else {
            return Err(ConfigError::NoiseLevelOutOfRange(noise_level));
        };

        Ok(Self { epsilon, noise })
    }

    /// Returns the step size.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Returns the noise standard deviation (0 when noiseless).
    pub fn noise_level(&self) -> f64 {
        self.noise.map_or(0.0, |n| n.std_dev())
    }
}

impl UpdateRule for LinearConsensus {
    fn next_value<R: Rng + ?Sized>(
        &self,
        current: &AgentState,
        neighbors: &[&AgentState],
        rng: &mut R,
    ) -> f64 {
        if neighbors.is_empty() {
            return current.value;
        }

        let diff_sum: f64 = neighbors.iter().map(|n| n.value - current.value).sum();
        let noise = self.noise.map_or(0.0, |normal| normal.sample(rng));

        current.value + self.epsilon * diff_sum + noise
    }
}

/// Max-consensus: every agent adopts the largest value it can see.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxConsensus;

impl UpdateRule for MaxConsensus {
    fn next_value<R: Rng + ?Sized>(
        &self,
        current: &AgentState,
        neighbors: &[&AgentState],
        _rng: &mut R,
    ) -> f64 {
        neighbors
            .iter()
            .map(|n| n.value)
            .fold(current.value, f64::max)
    }
}

/// The protocol attached to an agent.
#[derive(Debug, Clone)]
pub enum ConsensusProtocol {
    Linear(LinearConsensus),
    MaxConsensus(MaxConsensus),
}

impl ConsensusProtocol {
    /// Returns the kind this protocol implements.
    pub fn kind(&self) -> ProtocolKind {
        match self {
            ConsensusProtocol::Linear(_) => ProtocolKind::Linear,
            ConsensusProtocol::MaxConsensus(_) => ProtocolKind::MaxConsensus,
        }
    }
}

impl UpdateRule for ConsensusProtocol {
    fn next_value<R: Rng + ?Sized>(
        &self,
        current: &AgentState,
        neighbors: &[&AgentState],
        rng: &mut R,
    ) -> f64 {
        match self {
            ConsensusProtocol::Linear(rule) => rule.next_value(current, neighbors, rng),
            ConsensusProtocol::MaxConsensus(rule) => rule.next_value(current, neighbors, rng),
        }
    }
}

//! Protocol construction from configuration.

use crate::config::{Configuration, ProtocolKind};
use crate::error::SimError;
use crate::protocol::{ConsensusProtocol, LinearConsensus, MaxConsensus};
use tracing::error;

/// Maps a protocol kind to a ready-to-use [`ConsensusProtocol`].
///
/// Unlike topology selection there is no fallback: an unrecognised kind is a
/// fatal configuration error.
#[derive(Debug, Clone)]
pub struct ProtocolFactory {
    epsilon: f64,
    noise_level: f64,
}

impl ProtocolFactory {
    /// Binds the factory to a run's configuration.
    pub fn new(config: &Configuration) -> Self {
        Self {
            epsilon: config.epsilon(),
            noise_level: config.noise_level(),
        }
    }

    /// Creates a protocol instance of the given kind.
    pub fn create(&self, kind: &ProtocolKind) -> Result<ConsensusProtocol, SimError> {
        match kind {
            ProtocolKind::Linear => Ok(ConsensusProtocol::Linear(LinearConsensus::new(
                self.epsilon,
                self.noise_level,
            )?)),
            ProtocolKind::MaxConsensus => Ok(ConsensusProtocol::MaxConsensus(MaxConsensus)),
            ProtocolKind::Unrecognized(name) => {
                error!("Unknown protocol type: {}", name);
                Err(SimError::unknown_protocol(name))
            }
        }
    }
}

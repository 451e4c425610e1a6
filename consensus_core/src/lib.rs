//! Consensus Core - Synchronous Consensus Simulation Engine
//!
//! Simulates distributed consensus on a network of agents. Each agent holds a
//! scalar value and repeatedly updates it from its neighbours' values:
//! 1. **Topology**: Erdős–Rényi, ring or complete graphs over the agents
//! 2. **Protocols**: linear (average) consensus and max-consensus update rules
//! 3. **Engine**: a two-phase step that updates all agents simultaneously

pub mod agent;
pub mod config;
pub mod engine;
pub mod error;
pub mod factory;
pub mod metrics;
pub mod protocol;
pub mod topology;

// Re-export key types for convenience
pub use agent::AgentState;
pub use config::{Configuration, ProtocolKind, SimulationParams, TopologyKind};
pub use engine::{EngineBuilder, EngineState, SimulationEngine};
pub use error::{ConfigError, SimError};
pub use factory::ProtocolFactory;
pub use metrics::ConsensusMetrics;
pub use protocol::{ConsensusProtocol, LinearConsensus, MaxConsensus, UpdateRule};
pub use topology::{Graph, TopologyBuilder};

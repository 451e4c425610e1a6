//! Per-agent state record.

use serde::{Deserialize, Serialize};

/// State of one agent in the network.
///
/// The id and neighbour list are fixed for the agent's lifetime; only `value`
/// changes, and only through the engine's step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// Unique identifier, equal to the agent's node index
    pub agent_id: usize,

    /// Current scalar value
    pub value: f64,

    /// Ids of adjacent agents, ascending
    pub neighbor_ids: Vec<usize>,
}

impl AgentState {
    /// Creates a new agent state.
    pub fn new(agent_id: usize, value: f64, neighbor_ids: Vec<usize>) -> Self {
        Self {
            agent_id,
            value,
            neighbor_ids,
        }
    }

    /// Returns true if the agent has no neighbours.
    pub fn is_isolated(&self) -> bool {
        self.neighbor_ids.is_empty()
    }
}

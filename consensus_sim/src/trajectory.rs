//! In-memory value history of a run.
//!
//! Frames are kept in memory and serialize with the run report; nothing is
//! written to disk.

use consensus_core::SimulationEngine;
use serde::{Deserialize, Serialize};

/// Value of one agent at one step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentValue {
    pub agent_id: usize,
    pub value: f64,
}

/// Snapshot of all agents after a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFrame {
    /// Steps taken when the snapshot was recorded (0 = initial values)
    pub step: u64,

    /// Agent values, ordered by id
    pub values: Vec<AgentValue>,

    /// max - min over the values
    pub spread: f64,
}

/// Ordered sequence of snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub frames: Vec<StepFrame>,
}

impl Trajectory {
    /// Creates an empty trajectory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the engine's current values.
    pub fn record(&mut self, engine: &SimulationEngine) {
        let values = engine
            .values()
            .into_iter()
            .map(|(agent_id, value)| AgentValue { agent_id, value })
            .collect();

        self.frames.push(StepFrame {
            step: engine.step_count(),
            values,
            spread: engine.metrics().spread,
        });
    }

    /// Returns the number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns the latest frame.
    pub fn last(&self) -> Option<&StepFrame> {
        self.frames.last()
    }

    /// Returns `(step, value)` pairs for one agent across all frames.
    pub fn series(&self, agent_id: usize) -> Vec<(u64, f64)> {
        self.frames
            .iter()
            .filter_map(|frame| {
                frame
                    .values
                    .get(agent_id)
                    .map(|v| (frame.step, v.value))
            })
            .collect()
    }
}

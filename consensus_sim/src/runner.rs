//! Scenario runner - drives engines to completion and reports on them.

use crate::scenarios::ScenarioId;
use crate::trajectory::Trajectory;

use consensus_core::{
    ConsensusMetrics, Configuration, EngineBuilder, ProtocolKind, SimError, SimulationParams,
    TopologyKind,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Results from one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Protocol the agents ran
    pub protocol: ProtocolKind,

    /// Configured topology
    pub topology: TopologyKind,

    /// Seed used
    pub seed: u64,

    /// Total steps executed
    pub steps: u64,

    /// Number of edges in the sampled graph
    pub edges: usize,

    /// Whether the sampled graph was connected
    pub connected: bool,

    /// First step at which the spread was within tolerance
    pub converged_at: Option<u64>,

    /// Metrics of the initial values
    pub initial: ConsensusMetrics,

    /// Metrics after the last step
    pub final_metrics: ConsensusMetrics,

    /// Recorded values
    #[serde(skip_serializing_if = "Trajectory::is_empty")]
    pub trajectory: Trajectory,
}

impl RunReport {
    /// Returns true if the agents agreed before the budget ran out.
    pub fn converged(&self) -> bool {
        self.converged_at.is_some()
    }
}

/// Runs configurations to their step budget.
pub struct ScenarioRunner {
    /// Master seed
    seed: u64,

    /// Spread at or below which the agents count as agreed
    tolerance: f64,

    /// Record a frame every N steps (0 = do not record)
    record_every: u64,
}

impl ScenarioRunner {
    /// Creates a new runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            tolerance: 1e-3,
            record_every: 0,
        }
    }

    /// Sets the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the trajectory recording interval.
    pub fn with_record_every(mut self, steps: u64) -> Self {
        self.record_every = steps;
        self
    }

    /// Runs one configuration until its step budget is exhausted.
    pub fn run(&self, config: Configuration) -> Result<RunReport, SimError> {
        info!(
            "Starting run: {} on {} (seed={})",
            config.protocol_type(),
            config.topology(),
            self.seed
        );

        let mut engine = EngineBuilder::new()
            .with_config(config)
            .with_seed(self.seed)
            .build()?;

        if !engine.graph().is_connected() {
            warn!("Graph is disconnected; agents may not reach agreement");
        }

        let mut trajectory = Trajectory::new();
        if self.record_every > 0 {
            trajectory.record(&engine);
        }

        let initial = engine.metrics();
        let mut converged_at = initial.has_converged(self.tolerance).then_some(0);

        while engine.running() {
            engine.step();
            let step = engine.step_count();

            if converged_at.is_none() && engine.metrics().has_converged(self.tolerance) {
                debug!("Agreement within {} at step {}", self.tolerance, step);
                converged_at = Some(step);
            }

            if self.record_every > 0 && (step % self.record_every == 0 || !engine.running()) {
                trajectory.record(&engine);
            }
        }

        Ok(RunReport {
            protocol: engine.protocol_kind(),
            topology: engine.config().topology().clone(),
            seed: engine.seed(),
            steps: engine.step_count(),
            edges: engine.graph().edge_count(),
            connected: engine.graph().is_connected(),
            converged_at,
            initial,
            final_metrics: engine.metrics(),
            trajectory,
        })
    }

    /// Runs a preset scenario.
    pub fn run_scenario(&self, scenario: ScenarioId, agents: usize) -> Result<RunReport, SimError> {
        info!("Scenario: {} - {}", scenario.name(), scenario.description());
        let config = Configuration::new(scenario.params(agents))?;
        self.run(config)
    }

    /// Runs the same parameters and seed once per protocol.
    ///
    /// With a shared seed every run starts from the same graph and values.
    pub fn compare(
        &self,
        params: &SimulationParams,
        protocols: &[ProtocolKind],
    ) -> Result<Vec<RunReport>, SimError> {
        protocols
            .iter()
            .map(|protocol| {
                let config = Configuration::new(SimulationParams {
                    protocol_type: protocol.clone(),
                    ..params.clone()
                })?;
                self.run(config)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SimulationParams {
        SimulationParams {
            number_of_agents: 10,
            topology: TopologyKind::FullyConnected,
            epsilon: 0.05,
            max_steps: 60,
            ..Default::default()
        }
    }

    #[test]
    fn test_run_reaches_budget() {
        let runner = ScenarioRunner::new(42);
        let report = runner.run(Configuration::new(params()).unwrap()).unwrap();

        assert_eq!(report.seed, 42);
        assert_eq!(report.protocol, ProtocolKind::Linear);
        assert_eq!(report.topology, TopologyKind::FullyConnected);
        assert_eq!(report.steps, 60);
        assert_eq!(report.edges, 45);
        assert!(report.connected);
        assert!(report.converged());
        assert!((report.final_metrics.mean - report.initial.mean).abs() < 1e-9);
        assert!(report.trajectory.is_empty());
    }

    #[test]
    fn test_recording_interval() {
        let runner = ScenarioRunner::new(42).with_record_every(25);
        let report = runner.run(Configuration::new(params()).unwrap()).unwrap();

        let steps: Vec<u64> = report.trajectory.frames.iter().map(|f| f.step).collect();
        assert_eq!(steps, vec![0, 25, 50, 60]);
    }

    #[test]
    fn test_compare_starts_from_same_values() {
        let runner = ScenarioRunner::new(7);
        let reports = runner.compare(&params(), &ProtocolKind::all()).unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].protocol, ProtocolKind::Linear);
        assert_eq!(reports[1].protocol, ProtocolKind::MaxConsensus);
        assert_eq!(reports[0].initial, reports[1].initial);

        // Linear settles on the mean, max on the maximum
        assert!((reports[0].final_metrics.mean - reports[0].initial.mean).abs() < 1e-9);
        assert_eq!(reports[1].final_metrics.min, reports[1].initial.max);
        assert_eq!(reports[1].converged_at, Some(1));
    }

    #[test]
    fn test_compare_rejects_unknown_protocol() {
        let runner = ScenarioRunner::new(7);
        let result = runner.compare(&params(), &[ProtocolKind::from("median")]);

        assert!(matches!(result, Err(SimError::UnknownProtocol(_))));
    }

    #[test]
    fn test_scenarios_run() {
        let runner = ScenarioRunner::new(3);

        for scenario in ScenarioId::all() {
            let report = runner.run_scenario(scenario, 8).unwrap();
            assert!(report.steps > 0, "{} took no steps", scenario);
        }

        let ring_max = runner.run_scenario(ScenarioId::RingMax, 9).unwrap();
        assert!(ring_max.converged());
    }
}

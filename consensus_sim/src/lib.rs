//! Consensus Simulation Harness
//!
//! Drives [`consensus_core`] engines the way an interactive front end would:
//! build a configuration, step the engine to its budget, and observe the
//! agents' values after every step.
//!
//! # Usage
//!
//! ```ignore
//! use consensus_sim::{ScenarioRunner, ScenarioId};
//!
//! let runner = ScenarioRunner::new(42).with_record_every(10);
//! let report = runner.run_scenario(ScenarioId::RingLinear, 12)?;
//! println!("converged at {:?}", report.converged_at);
//! ```

mod overrides;
mod runner;
mod trajectory;
pub mod scenarios;

pub use overrides::{OverrideError, ParamOverrides, DEFAULT_SCENARIO_AGENTS};
pub use runner::{RunReport, ScenarioRunner};
pub use scenarios::ScenarioId;
pub use trajectory::{AgentValue, StepFrame, Trajectory};

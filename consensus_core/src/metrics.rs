//! Consensus Metrics Module
//! ========================
//!
//! Summary statistics over the agents' values:
//! - **Mean**: invariant under noiseless linear consensus on undirected graphs
//! - **Spread**: max - min, zero exactly when all agents agree
//! - **Variance**: population variance, the usual disagreement measure
//!
//! These drive convergence detection in the engine and the run reports.

use serde::{Deserialize, Serialize};

/// Statistics over one snapshot of agent values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConsensusMetrics {
    /// Number of values summarised
    pub count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
    /// `max - min`
    pub spread: f64,
    /// Population variance
    pub variance: f64,
}

impl ConsensusMetrics {
    /// Summarises a set of values. An empty set yields all-zero metrics.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let values: Vec<f64> = values.into_iter().collect();
        if values.is_empty() {
            return Self::default();
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        Self {
            count,
            mean,
            min,
            max,
            spread: max - min,
            variance,
        }
    }

    /// Sum of all values.
    pub fn sum(&self) -> f64 {
        self.mean * self.count as f64
    }

    /// Returns true when every value lies within `tolerance` of every other.
    pub fn has_converged(&self, tolerance: f64) -> bool {
        self.spread <= tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_metrics_from_values() {
        let m = ConsensusMetrics::from_values([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);

        assert_eq!(m.count, 8);
        assert_relative_eq!(m.mean, 5.0);
        assert_eq!(m.min, 2.0);
        assert_eq!(m.max, 9.0);
        assert_eq!(m.spread, 7.0);
        assert_relative_eq!(m.variance, 4.0);
        assert_relative_eq!(m.sum(), 40.0);
    }

    #[test]
    fn test_empty_metrics() {
        let m = ConsensusMetrics::from_values(Vec::new());
        assert_eq!(m, ConsensusMetrics::default());
    }

    #[test]
    fn test_convergence_threshold() {
        let agreed = ConsensusMetrics::from_values([20.0, 20.0, 20.0]);
        assert!(agreed.has_converged(0.0));

        let close = ConsensusMetrics::from_values([1.0, 1.0005]);
        assert!(close.has_converged(1e-3));
        assert!(!close.has_converged(1e-4));
    }
}

//! Benchmark knobs shared by the CLI and the harnesses.

use serde::{Deserialize, Serialize};

use crate::Scalar;

/// Settings driving one benchmark invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchOptions {
    /// Outer trial count: independent timed trials for the single-shot
    /// harness, refinement restarts for the iterative harness.
    pub iterations: u32,
    /// Tolerance for floating-point comparisons (convergence and the
    /// optional correctness check).
    pub delta: Scalar,
    /// Per-trial accumulated kernel-time budget in milliseconds; once a
    /// trial reaches it no further trials run. `0.0` disables the bound.
    pub timeout_ms: f64,
}

impl Default for BenchOptions {
    fn default() -> Self {
        Self {
            iterations: 10,
            delta: 0.0001,
            timeout_ms: 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_cli_surface() {
        let opts = BenchOptions::default();
        assert_eq!(opts.iterations, 10);
        assert_eq!(opts.delta, 0.0001);
        assert_eq!(opts.timeout_ms, 100.0);
    }
}

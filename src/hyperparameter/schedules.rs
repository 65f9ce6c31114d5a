//! Parameter schedules for deterministic control
//!
//! The mutation magnitude is annealed geometrically: after every generation the
//! per-gene standard deviations are multiplied by a fixed factor.

use serde::{Deserialize, Serialize};

use crate::error::OperatorError;

/// Default per-gene standard deviations for the deepmd schema
pub const DEFAULT_INITIAL_STD: [f64; 7] = [0.001, 0.0001, 0.0625, 0.0625, 0.0625, 0.0625, 0.0625];

/// Default annealing factor
pub const DEFAULT_ANNEAL_FACTOR: f64 = 0.85;

/// Parameter schedule trait
///
/// Defines how a parameter changes over the course of evolution.
pub trait ParameterSchedule: Send + Sync {
    /// Get the parameter value at a given generation
    fn value_at(&self, generation: usize) -> f64;
}

/// Per-gene standard deviations for the current generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MutationStep {
    std: Vec<f64>,
}

impl MutationStep {
    pub fn new(std: Vec<f64>) -> Self {
        Self { std }
    }

    /// Check that the step fits a genome of `dimension` genes
    pub fn validate(&self, dimension: usize) -> Result<(), OperatorError> {
        if self.std.len() != dimension {
            return Err(OperatorError::InvalidConfiguration(format!(
                "mutation step has {} entries, genome has {} genes",
                self.std.len(),
                dimension
            )));
        }
        if let Some((i, s)) = self
            .std
            .iter()
            .enumerate()
            .find(|(_, s)| !s.is_finite() || **s < 0.0)
        {
            return Err(OperatorError::InvalidConfiguration(format!(
                "std for gene {i} must be finite and non-negative, got {s}"
            )));
        }
        Ok(())
    }

    pub fn std(&self) -> &[f64] {
        &self.std
    }

    pub fn len(&self) -> usize {
        self.std.len()
    }

    pub fn is_empty(&self) -> bool {
        self.std.is_empty()
    }

    /// Scale every entry by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            std: self.std.iter().map(|s| s * factor).collect(),
        }
    }
}

impl Default for MutationStep {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_STD.to_vec())
    }
}

/// Geometric annealing: σ(t) = σ₀ · factorᵗ
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometricAnnealing {
    /// Multiplier applied once per generation, in (0, 1]
    pub factor: f64,
}

impl GeometricAnnealing {
    /// Create a new geometric annealing schedule
    pub fn new(factor: f64) -> Result<Self, OperatorError> {
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(OperatorError::InvalidConfiguration(format!(
                "anneal factor must be in (0, 1], got {factor}"
            )));
        }
        Ok(Self { factor })
    }

    /// The step used after `generation` annealings of `initial`
    pub fn step_at(&self, initial: &MutationStep, generation: usize) -> MutationStep {
        initial.scaled(self.value_at(generation))
    }
}

impl Default for GeometricAnnealing {
    fn default() -> Self {
        Self {
            factor: DEFAULT_ANNEAL_FACTOR,
        }
    }
}

impl ParameterSchedule for GeometricAnnealing {
    fn value_at(&self, generation: usize) -> f64 {
        self.factor.powi(generation as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_step() {
        let step = MutationStep::default();
        assert_eq!(step.len(), 7);
        assert_eq!(step.std()[0], 0.001);
        assert_eq!(step.std()[1], 0.0001);
        assert!(step.std()[2..].iter().all(|&s| s == 0.0625));
        assert!(step.validate(7).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_steps() {
        assert!(MutationStep::new(vec![0.1; 3]).validate(7).is_err());
        assert!(MutationStep::new(vec![0.1, -0.1]).validate(2).is_err());
        assert!(MutationStep::new(vec![0.1, f64::NAN]).validate(2).is_err());
        assert!(MutationStep::new(vec![0.0, 0.0]).validate(2).is_ok());
    }

    #[test]
    fn test_anneal_once() {
        let annealing = GeometricAnnealing::default();
        let step = MutationStep::new(vec![1.0, 0.5]);
        assert_eq!(annealing.step_at(&step, 0), step);
        assert_eq!(annealing.step_at(&step, 1), MutationStep::new(vec![0.85, 0.425]));
    }

    #[test]
    fn test_repeated_anneal_matches_schedule() {
        let annealing = GeometricAnnealing::new(0.85).unwrap();
        let initial = MutationStep::default();

        let mut step = initial.clone();
        for _ in 0..5 {
            step = step.scaled(0.85);
        }

        let scheduled = annealing.step_at(&initial, 5);
        for (s, expected) in scheduled.std().iter().zip(step.std()) {
            assert!((s - expected).abs() < 1e-15);
        }
    }

    #[test]
    fn test_factor_validation() {
        assert!(GeometricAnnealing::new(1.0).is_ok());
        assert!(GeometricAnnealing::new(0.0).is_err());
        assert!(GeometricAnnealing::new(1.5).is_err());
        assert!(GeometricAnnealing::new(f64::NAN).is_err());
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&MutationStep::new(vec![0.5, 0.25])).unwrap();
        assert_eq!(json, "[0.5,0.25]");
    }
}

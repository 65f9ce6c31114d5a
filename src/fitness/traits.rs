//! Fitness values
//!
//! Both objectives are minimized. An evaluation either yields two usable
//! objectives or is invalid; invalid fitness reads as `(BAD_FITNESS, BAD_FITNESS)`
//! so that ranking needs no special case for it.

use serde::{Deserialize, Serialize};

/// Sentinel objective value for individuals that could not be evaluated
pub const BAD_FITNESS: f64 = i32::MAX as f64;

/// Objective pair: energy RMSE and force RMSE on the validation set
pub type Objectives = [f64; 2];

/// Outcome of evaluating one individual
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Fitness {
    /// Two finite objective values below the sentinel
    Valid { objectives: Objectives },
    /// Evaluation failed; the cause is kept for diagnostics
    Invalid { cause: String },
}

impl Fitness {
    /// Build a fitness from raw evaluator output.
    ///
    /// Non-finite values or values at or beyond the sentinel are not usable and
    /// yield `None`.
    pub fn from_objectives(objectives: Objectives) -> Option<Self> {
        let usable = objectives
            .iter()
            .all(|o| o.is_finite() && *o < BAD_FITNESS);
        usable.then_some(Self::Valid { objectives })
    }

    /// Invalid fitness with the given cause
    pub fn invalid(cause: impl Into<String>) -> Self {
        Self::Invalid {
            cause: cause.into(),
        }
    }

    /// Objective values used for ranking
    pub fn objectives(&self) -> Objectives {
        match self {
            Self::Valid { objectives } => *objectives,
            Self::Invalid { .. } => [BAD_FITNESS, BAD_FITNESS],
        }
    }

    /// Whether the evaluation produced usable objectives
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Failure cause, if invalid
    pub fn cause(&self) -> Option<&str> {
        match self {
            Self::Valid { .. } => None,
            Self::Invalid { cause } => Some(cause),
        }
    }
}

/// Pareto domination for minimization: `a` is no worse everywhere and strictly
/// better somewhere
pub fn dominates(a: &Objectives, b: &Objectives) -> bool {
    let at_least_as_good = a.iter().zip(b.iter()).all(|(x, y)| x <= y);
    let strictly_better = a.iter().zip(b.iter()).any(|(x, y)| x < y);
    at_least_as_good && strictly_better
}

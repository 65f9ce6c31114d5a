//! Operator traits
//!
//! This module defines the operator seams used by the tuning loop.

use rand::Rng;

use crate::error::OperatorResult;
use crate::genome::bounds::MultiBounds;
use crate::genome::real_vector::Genome;
use crate::hyperparameter::schedules::MutationStep;

/// Selection operator trait
///
/// Picks parents by index from a population of the given size.
pub trait SelectionOperator: Send + Sync {
    /// Select a single individual from a population of `len` individuals
    ///
    /// Returns the index of the selected individual.
    fn select<R: Rng>(&self, len: usize, rng: &mut R) -> OperatorResult<usize>;

    /// Select multiple individuals from the population
    fn select_many<R: Rng>(
        &self,
        len: usize,
        count: usize,
        rng: &mut R,
    ) -> OperatorResult<Vec<usize>> {
        (0..count).map(|_| self.select(len, rng)).collect()
    }
}

/// Bounded mutation operator trait
///
/// Applies a random change to a genome in place, scaled by the current
/// mutation step and kept inside the given bounds.
pub trait MutationOperator: Send + Sync {
    fn mutate<R: Rng>(
        &self,
        genome: &mut Genome,
        step: &MutationStep,
        bounds: &MultiBounds,
        rng: &mut R,
    ) -> OperatorResult<()>;
}

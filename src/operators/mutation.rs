//! Mutation operators
//!
//! This module provides the bounds-aware Gaussian mutation used by the tuner.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{OperatorError, OperatorResult};
use crate::genome::bounds::MultiBounds;
use crate::genome::real_vector::Genome;
use crate::hyperparameter::schedules::MutationStep;
use crate::operators::traits::MutationOperator;

/// Isotropic Gaussian mutation with wraparound bounds
///
/// Every gene receives an independent zero-mean Gaussian perturbation whose
/// standard deviation is the matching entry of the [`MutationStep`]. The result
/// is wrapped back into the gene's interval using the plain interval width.
#[derive(Clone, Debug, Default)]
pub struct IsotropicGaussianMutation;

impl IsotropicGaussianMutation {
    /// Create a new isotropic Gaussian mutation
    pub fn new() -> Self {
        Self
    }
}

impl MutationOperator for IsotropicGaussianMutation {
    fn mutate<R: Rng>(
        &self,
        genome: &mut Genome,
        step: &MutationStep,
        bounds: &MultiBounds,
        rng: &mut R,
    ) -> OperatorResult<()> {
        let n = genome.dimension();
        if bounds.dimension() != n {
            return Err(OperatorError::InvalidConfiguration(format!(
                "genome has {} genes but bounds have {}",
                n,
                bounds.dimension()
            )));
        }
        step.validate(n)?;

        let genes = genome.genes_mut();
        for (i, (gene, &sigma)) in genes.iter_mut().zip(step.std()).enumerate() {
            let normal = Normal::new(0.0, sigma).map_err(|e| {
                OperatorError::InvalidConfiguration(format!("std for gene {i}: {e}"))
            })?;
            *gene += normal.sample(rng);
        }
        bounds.wrap_vec(genes);

        Ok(())
    }
}

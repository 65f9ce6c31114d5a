//! Individual wrapper type
//!
//! An individual owns its genome for life; fitness and the per-generation
//! rank/crowding annotations are filled in after creation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GenomeError;
use crate::fitness::traits::{Fitness, Objectives, BAD_FITNESS};
use crate::genome::phenotype::Configuration;
use crate::genome::real_vector::Genome;

/// One candidate hyperparameter set
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Individual {
    /// Evaluation identity, unique within a run
    pub id: Uuid,
    /// Creation order within a run
    pub birth_id: usize,
    /// The genome of this individual
    genome: Genome,
    /// The fitness (None if not yet evaluated)
    pub fitness: Option<Fitness>,
    /// Pareto rank (0 = first front); `usize::MAX` until ranked
    pub rank: usize,
    /// Crowding distance within its front
    pub crowding_distance: f64,
    /// Wall-clock time spent evaluating, in milliseconds
    pub evaluation_ms: Option<f64>,
}

impl Individual {
    /// Create a new, unevaluated individual
    pub fn new(genome: Genome, id: Uuid, birth_id: usize) -> Self {
        Self {
            id,
            birth_id,
            genome,
            fitness: None,
            rank: usize::MAX,
            crowding_distance: 0.0,
            evaluation_ms: None,
        }
    }

    /// Create an individual with a known fitness
    pub fn with_fitness(genome: Genome, id: Uuid, birth_id: usize, fitness: Fitness) -> Self {
        let mut individual = Self::new(genome, id, birth_id);
        individual.fitness = Some(fitness);
        individual
    }

    /// Clone a parent into a fresh offspring.
    ///
    /// The genome is deep-copied; fitness, rank and crowding are not inherited.
    pub fn offspring_of(parent: &Individual, id: Uuid, birth_id: usize) -> Self {
        Self::new(parent.genome.clone(), id, birth_id)
    }

    /// Get a reference to the genome
    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    /// Get a mutable reference to the genome (only before evaluation)
    pub(crate) fn genome_mut(&mut self) -> &mut Genome {
        &mut self.genome
    }

    /// Decode the genome; cheap and pure, so it is not cached
    pub fn configuration(&self) -> Result<Configuration, GenomeError> {
        Configuration::decode(&self.genome)
    }

    /// Check if this individual has been evaluated
    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    /// Evaluated with usable objectives
    pub fn is_valid(&self) -> bool {
        self.fitness.as_ref().map_or(false, Fitness::is_valid)
    }

    /// Objectives used for ranking; unevaluated individuals read as the sentinel
    pub fn objectives(&self) -> Objectives {
        self.fitness
            .as_ref()
            .map_or([BAD_FITNESS, BAD_FITNESS], Fitness::objectives)
    }

    /// Set the fitness value
    pub fn set_fitness(&mut self, fitness: Fitness) {
        self.fitness = Some(fitness);
    }

    /// Pareto domination on objectives (minimization)
    pub fn dominates(&self, other: &Self) -> bool {
        crate::fitness::traits::dominates(&self.objectives(), &other.objectives())
    }
}

//! Population type
//!
//! This module provides the Population container type.

use rand::Rng;

use crate::genome::bounds::MultiBounds;
use crate::genome::real_vector::Genome;
use crate::population::identity::IdentityAllocator;
use crate::population::individual::Individual;

/// A population of individuals
#[derive(Clone, Debug, Default)]
pub struct Population {
    /// The individuals in this population
    individuals: Vec<Individual>,
    /// Current generation number
    generation: usize,
}

impl Population {
    /// Create a population from a vector of individuals
    pub fn from_individuals(individuals: Vec<Individual>, generation: usize) -> Self {
        Self {
            individuals,
            generation,
        }
    }

    /// Create a random population, sampling each gene uniformly within its bounds
    pub fn random<R: Rng>(
        size: usize,
        bounds: &MultiBounds,
        rng: &mut R,
        identities: &mut IdentityAllocator,
    ) -> Self {
        let individuals = (0..size)
            .map(|_| {
                let genome = Genome::generate(rng, bounds);
                let (id, birth_id) = identities.issue();
                Individual::new(genome, id, birth_id)
            })
            .collect();
        Self {
            individuals,
            generation: 0,
        }
    }

    /// Get the current generation
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Get the population size
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    /// Check if the population is empty
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Get an iterator over the individuals
    pub fn iter(&self) -> impl Iterator<Item = &Individual> {
        self.individuals.iter()
    }

    /// Get the underlying slice of individuals
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    /// Take the individuals out of this population
    pub fn into_individuals(self) -> Vec<Individual> {
        self.individuals
    }

    /// Individuals on the first non-dominated front (as last ranked)
    pub fn pareto_front(&self) -> Vec<&Individual> {
        self.individuals.iter().filter(|i| i.rank == 0).collect()
    }

    /// Count individuals with usable objectives
    pub fn valid_count(&self) -> usize {
        self.individuals.iter().filter(|i| i.is_valid()).count()
    }

    /// Per-objective minimum over valid individuals
    pub fn best_objectives(&self) -> Option<[f64; 2]> {
        self.individuals
            .iter()
            .filter(|i| i.is_valid())
            .map(Individual::objectives)
            .fold(None, |acc, o| match acc {
                None => Some(o),
                Some(best) => Some([best[0].min(o[0]), best[1].min(o[1])]),
            })
    }

    /// Compute population diversity (average pairwise genome distance)
    pub fn diversity(&self) -> f64 {
        let n = self.len();
        if n < 2 {
            return 0.0;
        }

        let mut total_distance = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                total_distance += self.individuals[i]
                    .genome()
                    .distance(self.individuals[j].genome());
            }
        }
        total_distance / (n * (n - 1) / 2) as f64
    }
}

impl std::ops::Index<usize> for Population {
    type Output = Individual;

    fn index(&self, index: usize) -> &Self::Output {
        &self.individuals[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::traits::Fitness;
    use crate::genome::schema::GenomeSchema;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_random_population() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut identities = IdentityAllocator::new();
        let bounds = GenomeSchema::deepmd().bounds();
        let population = Population::random(10, &bounds, &mut rng, &mut identities);

        assert_eq!(population.len(), 10);
        assert_eq!(population.generation(), 0);
        assert!(population.iter().all(|i| !i.is_evaluated()));
        for individual in population.iter() {
            assert!(bounds.contains_vec(individual.genome().genes()));
        }

        let ids: HashSet<_> = population.iter().map(|i| i.id).collect();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn test_valid_count_and_best() {
        let genome = Genome::new(vec![0.0; 7]);
        let individuals = vec![
            Individual::with_fitness(
                genome.clone(),
                uuid::Uuid::new_v4(),
                0,
                Fitness::Valid {
                    objectives: [0.5, 0.1],
                },
            ),
            Individual::with_fitness(
                genome.clone(),
                uuid::Uuid::new_v4(),
                1,
                Fitness::Valid {
                    objectives: [0.2, 0.9],
                },
            ),
            Individual::with_fitness(genome, uuid::Uuid::new_v4(), 2, Fitness::invalid("x")),
        ];
        let population = Population::from_individuals(individuals, 3);

        assert_eq!(population.generation(), 3);
        assert_eq!(population.valid_count(), 2);
        assert_eq!(population.best_objectives(), Some([0.2, 0.1]));
    }

    #[test]
    fn test_best_objectives_none_when_all_invalid() {
        let individual = Individual::with_fitness(
            Genome::new(vec![0.0; 7]),
            uuid::Uuid::new_v4(),
            0,
            Fitness::invalid("x"),
        );
        let population = Population::from_individuals(vec![individual], 0);
        assert_eq!(population.best_objectives(), None);
    }

    #[test]
    fn test_diversity() {
        let individuals = vec![
            Individual::new(Genome::new(vec![0.0, 0.0]), uuid::Uuid::new_v4(), 0),
            Individual::new(Genome::new(vec![3.0, 4.0]), uuid::Uuid::new_v4(), 1),
        ];
        let population = Population::from_individuals(individuals, 0);
        assert!((population.diversity() - 5.0).abs() < 1e-12);
        assert_eq!(Population::default().diversity(), 0.0);
    }
}

//! Diagnostics and statistics
//!
//! This module provides statistics collection for tuning runs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::fitness::traits::Objectives;
use crate::population::individual::Individual;
use crate::population::population::Population;

/// Statistics for a single generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation number (0 is the initial population)
    pub generation: usize,
    /// Total evaluations so far
    pub evaluations: usize,
    /// Individuals evaluated in this generation
    pub evaluated: usize,
    /// Of those, how many came back invalid
    pub invalid: usize,
    /// Size of the first front among the survivors
    pub front_size: usize,
    /// Per-objective minimum over valid survivors
    pub best_objectives: Option<Objectives>,
    /// Population diversity
    pub diversity: f64,
    /// Mutation step in effect after this generation
    pub mutation_std: Vec<f64>,
    /// Timing information
    pub timing: TimingStats,
}

/// Timing statistics
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TimingStats {
    /// Time spent waiting on the evaluation batch (ms)
    pub evaluation_ms: f64,
    /// Time spent on parent selection and survivor truncation (ms)
    pub selection_ms: f64,
    /// Time spent on mutation (ms)
    pub mutation_ms: f64,
    /// Total generation time (ms)
    pub total_ms: f64,
}

impl TimingStats {
    /// Create new timing stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Set evaluation time
    pub fn with_evaluation(mut self, duration: Duration) -> Self {
        self.evaluation_ms = duration.as_secs_f64() * 1000.0;
        self
    }

    /// Set selection time
    pub fn with_selection(mut self, duration: Duration) -> Self {
        self.selection_ms = duration.as_secs_f64() * 1000.0;
        self
    }

    /// Set mutation time
    pub fn with_mutation(mut self, duration: Duration) -> Self {
        self.mutation_ms = duration.as_secs_f64() * 1000.0;
        self
    }

    /// Set total time
    pub fn with_total(mut self, duration: Duration) -> Self {
        self.total_ms = duration.as_secs_f64() * 1000.0;
        self
    }
}

impl GenerationStats {
    /// Compute statistics from the surviving population and the batch that
    /// was evaluated to produce it
    pub fn from_population(
        population: &Population,
        evaluated: &[Individual],
        evaluations: usize,
        mutation_std: &[f64],
    ) -> Self {
        Self {
            generation: population.generation(),
            evaluations,
            evaluated: evaluated.len(),
            invalid: evaluated.iter().filter(|i| !i.is_valid()).count(),
            front_size: population.pareto_front().len(),
            best_objectives: population.best_objectives(),
            diversity: population.diversity(),
            mutation_std: mutation_std.to_vec(),
            timing: TimingStats::default(),
        }
    }

    /// Set timing information
    pub fn with_timing(mut self, timing: TimingStats) -> Self {
        self.timing = timing;
        self
    }
}

/// Statistics collector for an entire tuning run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TuningStats {
    /// Statistics per generation
    pub generations: Vec<GenerationStats>,
    /// Total runtime in milliseconds
    pub total_runtime_ms: f64,
}

impl TuningStats {
    /// Create a new stats collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a generation's statistics
    pub fn record(&mut self, stats: GenerationStats) {
        self.generations.push(stats);
    }

    /// Get the number of generations recorded
    pub fn num_generations(&self) -> usize {
        self.generations.len()
    }

    /// Total invalid evaluations across the run
    pub fn total_invalid(&self) -> usize {
        self.generations.iter().map(|g| g.invalid).sum()
    }

    /// Set the total runtime
    pub fn set_runtime(&mut self, duration: Duration) {
        self.total_runtime_ms = duration.as_secs_f64() * 1000.0;
    }
}

/// Result of a tuning run
#[derive(Clone, Debug)]
pub struct TuningResult {
    /// The final parent population
    pub population: Population,
    /// Number of generations completed after initialization
    pub generations: usize,
    /// Total evaluations
    pub evaluations: usize,
    /// Statistics for the run
    pub stats: TuningStats,
}

impl TuningResult {
    /// Create a new tuning result
    pub fn new(population: Population, generations: usize, evaluations: usize) -> Self {
        Self {
            population,
            generations,
            evaluations,
            stats: TuningStats::new(),
        }
    }

    /// Add statistics to the result
    pub fn with_stats(mut self, stats: TuningStats) -> Self {
        self.stats = stats;
        self
    }

    /// Rank-0 members of the final population
    pub fn pareto_front(&self) -> Vec<&Individual> {
        self.population.pareto_front()
    }
}

pub mod prelude {
    pub use super::{GenerationStats, TimingStats, TuningResult, TuningStats};
}

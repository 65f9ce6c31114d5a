//! Real-valued genome
//!
//! This module provides the fixed-length real-valued vector evolved by the tuner.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::genome::bounds::MultiBounds;

/// Fixed-length real-valued vector genome
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    /// The genes (values) of this genome
    genes: Vec<f64>,
}

impl Genome {
    /// Create a new genome with the given genes
    pub fn new(genes: Vec<f64>) -> Self {
        Self { genes }
    }

    /// Generate a random genome uniformly within the given bounds
    pub fn generate<R: Rng>(rng: &mut R, bounds: &MultiBounds) -> Self {
        let genes = bounds
            .bounds
            .iter()
            .map(|b| rng.gen_range(b.min..=b.max))
            .collect();
        Self { genes }
    }

    /// Get the genes as a slice
    pub fn genes(&self) -> &[f64] {
        &self.genes
    }

    /// Get the genes as a mutable slice
    pub fn genes_mut(&mut self) -> &mut [f64] {
        &mut self.genes
    }

    /// Number of genes
    pub fn dimension(&self) -> usize {
        self.genes.len()
    }

    /// Euclidean distance to another genome
    pub fn distance(&self, other: &Self) -> f64 {
        self.genes
            .iter()
            .zip(other.genes.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

impl std::ops::Index<usize> for Genome {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.genes[index]
    }
}

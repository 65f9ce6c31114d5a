//! Gene schema
//!
//! The single declaration of gene names, bounds and option lists shared by the
//! codec, the initializer and the mutation operator.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::GenomeError;
use crate::genome::bounds::{Bounds, MultiBounds};
use crate::genome::phenotype::{ActivationFunction, ScaleByWorker};

/// Number of genes in a deepmd-kit genome
pub const GENE_COUNT: usize = 7;

pub const GENE_START_LR: usize = 0;
pub const GENE_STOP_LR: usize = 1;
pub const GENE_RCUT_SMTH: usize = 2;
pub const GENE_RCUT: usize = 3;
pub const GENE_SCALE_BY_WORKER: usize = 4;
pub const GENE_DESC_ACTIV_FUNC: usize = 5;
pub const GENE_FITTING_ACTIV_FUNC: usize = 6;

/// Field names in gene order
pub const GENE_NAMES: [&str; GENE_COUNT] = [
    "start_lr",
    "stop_lr",
    "rcut_smth",
    "rcut",
    "scale_by_worker",
    "desc_activ_func",
    "fitting_activ_func",
];

/// How a gene is interpreted by the codec
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GeneKind {
    /// Used as-is
    Continuous,
    /// Floored and wrapped into an ordered option list
    Categorical(Vec<&'static str>),
}

/// One gene: its name, interval, and interpretation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneSpec {
    pub name: &'static str,
    pub bounds: Bounds,
    pub kind: GeneKind,
}

impl GeneSpec {
    fn continuous(name: &'static str, min: f64, max: f64) -> Self {
        Self {
            name,
            bounds: Bounds::new(min, max),
            kind: GeneKind::Continuous,
        }
    }

    fn categorical(name: &'static str, min: f64, max: f64, options: Vec<&'static str>) -> Self {
        Self {
            name,
            bounds: Bounds::new(min, max),
            kind: GeneKind::Categorical(options),
        }
    }
}

/// Ordered gene table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenomeSchema {
    genes: Vec<GeneSpec>,
}

impl GenomeSchema {
    /// The deepmd-kit `se_e2_a` hyperparameter table
    pub fn deepmd() -> Self {
        let scale_options: Vec<&'static str> =
            ScaleByWorker::ALL.iter().map(|o| o.as_str()).collect();
        let activ_options = || -> Vec<&'static str> {
            ActivationFunction::ALL.iter().map(|o| o.as_str()).collect()
        };

        Self {
            genes: vec![
                GeneSpec::continuous("start_lr", 3.51e-8, 0.01),
                GeneSpec::continuous("stop_lr", 3.51e-8, 0.0001),
                GeneSpec::continuous("rcut_smth", 2.0, 6.0),
                GeneSpec::continuous("rcut", 6.0, 12.0),
                GeneSpec::categorical("scale_by_worker", 0.0, 3.0, scale_options),
                GeneSpec::categorical("desc_activ_func", 0.0, 5.0, activ_options()),
                GeneSpec::categorical("fitting_activ_func", 0.0, 5.0, activ_options()),
            ],
        }
    }

    /// Build a schema from an explicit gene list (validate before use)
    pub fn from_genes(genes: Vec<GeneSpec>) -> Self {
        Self { genes }
    }

    /// Number of genes
    pub fn dimension(&self) -> usize {
        self.genes.len()
    }

    /// Gene specifications in order
    pub fn genes(&self) -> &[GeneSpec] {
        &self.genes
    }

    /// Interval table for initialization and mutation
    pub fn bounds(&self) -> MultiBounds {
        self.genes.iter().map(|g| g.bounds).collect()
    }

    /// Check the table against the typed configuration it decodes into
    pub fn validate(&self) -> Result<(), GenomeError> {
        if self.genes.len() != GENE_COUNT {
            return Err(GenomeError::DimensionMismatch {
                expected: GENE_COUNT,
                actual: self.genes.len(),
            });
        }

        let mut seen = HashSet::new();
        for (i, (gene, expected)) in self.genes.iter().zip(GENE_NAMES.iter()).enumerate() {
            if !seen.insert(gene.name) {
                return Err(GenomeError::SchemaViolation(format!(
                    "duplicate gene {}",
                    gene.name
                )));
            }
            if gene.name != *expected {
                return Err(GenomeError::SchemaViolation(format!(
                    "gene {} is {}, expected {}",
                    i, gene.name, expected
                )));
            }
            if !(gene.bounds.min < gene.bounds.max) {
                return Err(GenomeError::SchemaViolation(format!(
                    "gene {} has an empty interval [{}, {}]",
                    gene.name, gene.bounds.min, gene.bounds.max
                )));
            }

            let expected_options = match i {
                GENE_SCALE_BY_WORKER => Some(ScaleByWorker::ALL.len()),
                GENE_DESC_ACTIV_FUNC | GENE_FITTING_ACTIV_FUNC => {
                    Some(ActivationFunction::ALL.len())
                }
                _ => None,
            };
            match (&gene.kind, expected_options) {
                (GeneKind::Continuous, None) => {}
                (GeneKind::Categorical(options), Some(count)) if options.len() == count => {}
                (GeneKind::Categorical(options), Some(count)) => {
                    return Err(GenomeError::SchemaViolation(format!(
                        "gene {} lists {} options, expected {}",
                        gene.name,
                        options.len(),
                        count
                    )));
                }
                (GeneKind::Continuous, Some(_)) => {
                    return Err(GenomeError::SchemaViolation(format!(
                        "gene {} must be categorical",
                        gene.name
                    )));
                }
                (GeneKind::Categorical(_), None) => {
                    return Err(GenomeError::SchemaViolation(format!(
                        "gene {} must be continuous",
                        gene.name
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for GenomeSchema {
    fn default() -> Self {
        Self::deepmd()
    }
}

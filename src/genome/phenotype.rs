//! Decoded deepmd-kit training configuration
//!
//! A [`Configuration`] is a pure function of a [`Genome`]: continuous genes are
//! copied through, categorical genes are floored and wrapped into their option
//! lists.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EvaluationError, GenomeError};
use crate::genome::bounds::categorical_index;
use crate::genome::real_vector::Genome;
use crate::genome::schema::{
    GENE_COUNT, GENE_DESC_ACTIV_FUNC, GENE_FITTING_ACTIV_FUNC, GENE_RCUT, GENE_RCUT_SMTH,
    GENE_SCALE_BY_WORKER, GENE_START_LR, GENE_STOP_LR,
};

/// Learning-rate scaling across data-parallel workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleByWorker {
    Linear,
    Sqrt,
    None,
}

impl ScaleByWorker {
    /// All options, in gene-index order
    pub const ALL: [ScaleByWorker; 3] = [Self::Linear, Self::Sqrt, Self::None];

    /// Select the option for a raw gene value
    pub fn from_gene(gene: f64) -> Self {
        Self::ALL[categorical_index(gene, Self::ALL.len())]
    }

    /// Name as understood by deepmd-kit
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Sqrt => "sqrt",
            Self::None => "none",
        }
    }
}

impl fmt::Display for ScaleByWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Activation function for the descriptor and fitting networks
///
/// `gelu` and `gelu_tf` are left out; they destabilise training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationFunction {
    Relu,
    Relu6,
    Softplus,
    Sigmoid,
    Tanh,
}

impl ActivationFunction {
    /// All options, in gene-index order
    pub const ALL: [ActivationFunction; 5] = [
        Self::Relu,
        Self::Relu6,
        Self::Softplus,
        Self::Sigmoid,
        Self::Tanh,
    ];

    /// Select the option for a raw gene value
    pub fn from_gene(gene: f64) -> Self {
        Self::ALL[categorical_index(gene, Self::ALL.len())]
    }

    /// Name as understood by deepmd-kit
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relu => "relu",
            Self::Relu6 => "relu6",
            Self::Softplus => "softplus",
            Self::Sigmoid => "sigmoid",
            Self::Tanh => "tanh",
        }
    }
}

impl fmt::Display for ActivationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Hyperparameters handed to one deepmd-kit training run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Starting learning rate
    pub start_lr: f64,
    /// Final learning rate
    pub stop_lr: f64,
    /// Radius where the smoothing of the descriptor starts
    pub rcut_smth: f64,
    /// Cut-off radius
    pub rcut: f64,
    pub scale_by_worker: ScaleByWorker,
    pub desc_activ_func: ActivationFunction,
    pub fitting_activ_func: ActivationFunction,
}

impl Configuration {
    /// Decode a genome into its configuration.
    ///
    /// Total for any genome of the schema's length; a wrong length means the
    /// genome and schema disagree and is reported as an error.
    pub fn decode(genome: &Genome) -> Result<Self, GenomeError> {
        let genes = genome.genes();
        if genes.len() != GENE_COUNT {
            return Err(GenomeError::DimensionMismatch {
                expected: GENE_COUNT,
                actual: genes.len(),
            });
        }

        Ok(Self {
            start_lr: genes[GENE_START_LR],
            stop_lr: genes[GENE_STOP_LR],
            rcut_smth: genes[GENE_RCUT_SMTH],
            rcut: genes[GENE_RCUT],
            scale_by_worker: ScaleByWorker::from_gene(genes[GENE_SCALE_BY_WORKER]),
            desc_activ_func: ActivationFunction::from_gene(genes[GENE_DESC_ACTIV_FUNC]),
            fitting_activ_func: ActivationFunction::from_gene(genes[GENE_FITTING_ACTIV_FUNC]),
        })
    }

    /// Semantic sanity check run before any expensive evaluation
    pub fn check(&self) -> Result<(), EvaluationError> {
        if !(self.start_lr > self.stop_lr) {
            return Err(EvaluationError::InvalidConfiguration(format!(
                "start_lr ({}) must be greater than stop_lr ({})",
                self.start_lr, self.stop_lr
            )));
        }
        if !(self.rcut_smth < self.rcut) {
            return Err(EvaluationError::InvalidConfiguration(format!(
                "rcut_smth ({}) must be less than rcut ({})",
                self.rcut_smth, self.rcut
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "start_lr={:.3e} stop_lr={:.3e} rcut_smth={:.3} rcut={:.3} scale_by_worker={} desc_activ_func={} fitting_activ_func={}",
            self.start_lr,
            self.stop_lr,
            self.rcut_smth,
            self.rcut,
            self.scale_by_worker,
            self.desc_activ_func,
            self.fitting_activ_func
        )
    }
}

//! # deepmd-tuner
//!
//! Multi-objective evolutionary hyperparameter search for deepmd-kit training runs.
//!
//! Candidates are fixed-length real vectors decoded into typed training
//! configurations. An external evaluator scores each configuration on two
//! objectives (energy and force error), and NSGA-II rank/crowding selection with
//! an annealed Gaussian mutation step refines the population.
//!
//! ## Core Concepts
//!
//! - **Wraparound bounds**: mutated genes re-enter their interval from the other side
//! - **Invalid, not fatal**: any evaluation failure scores `(BAD_FITNESS, BAD_FITNESS)`
//! - **Generational barrier**: each generation's offspring are evaluated as one batch
//!
//! ## Quick Start
//!
//! ```rust
//! use deepmd_tuner::prelude::*;
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//!
//! let result = Nsga2Tuner::builder()
//!     .population_size(8)
//!     .max_generations(3)
//!     .build()?
//!     .run(&DryRunEvaluator::new(42), &SequentialExecutor, &NoopTelemetry, &mut rng)?;
//!
//! assert_eq!(result.population.len(), 8);
//! # Ok::<(), deepmd_tuner::error::EvolutionError>(())
//! ```

pub mod algorithms;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod execution;
pub mod fitness;
pub mod genome;
pub mod hyperparameter;
pub mod operators;
pub mod population;
pub mod telemetry;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::algorithms::prelude::*;
    pub use crate::config::*;
    pub use crate::diagnostics::prelude::*;
    pub use crate::error::*;
    pub use crate::execution::*;
    pub use crate::fitness::prelude::*;
    pub use crate::genome::prelude::*;
    pub use crate::hyperparameter::prelude::*;
    pub use crate::operators::prelude::*;
    pub use crate::population::prelude::*;
    pub use crate::telemetry::*;
}

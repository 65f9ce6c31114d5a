//! Fitness evaluation
//!
//! This module provides the two-objective fitness value, the evaluator contract,
//! and the deepmd-kit input and learning-curve handling.

pub mod deepmd;
pub mod evaluator;
pub mod traits;

pub mod prelude {
    pub use super::deepmd::*;
    pub use super::evaluator::*;
    pub use super::traits::*;
}

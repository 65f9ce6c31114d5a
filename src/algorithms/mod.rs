//! Evolutionary algorithms
//!
//! This module provides NSGA-II survivor selection and the generational tuner
//! built on it.

pub mod nsga2;
pub mod tuner;

pub mod prelude {
    pub use super::nsga2::*;
    pub use super::tuner::*;
}

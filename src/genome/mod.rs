//! Genome representation and decoding
//!
//! This module provides the real-valued genome, its bounds, the shared gene
//! schema, and the decoded training configuration.

pub mod bounds;
pub mod phenotype;
pub mod real_vector;
pub mod schema;

pub mod prelude {
    pub use super::bounds::*;
    pub use super::phenotype::*;
    pub use super::real_vector::*;
    pub use super::schema::*;
}

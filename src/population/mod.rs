//! Population management
//!
//! This module provides the Individual and Population types and the identity
//! allocator that names them.

pub mod identity;
pub mod individual;
#[allow(clippy::module_inception)]
pub mod population;

pub mod prelude {
    pub use super::identity::*;
    pub use super::individual::*;
    pub use super::population::*;
}

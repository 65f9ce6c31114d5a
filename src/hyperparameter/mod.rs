//! Hyperparameter control
//!
//! The tuner uses deterministic control: the mutation step follows a
//! predetermined geometric schedule over generations.

pub mod schedules;

pub mod prelude {
    pub use super::schedules::*;
}

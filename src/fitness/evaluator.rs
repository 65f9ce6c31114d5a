//! Evaluator contract
//!
//! An [`Evaluator`] scores a [`Configuration`] by whatever external means it
//! likes (a deepmd-kit training run in production). [`evaluate_configuration`]
//! is the boundary where every way that can go wrong becomes an invalid
//! [`Fitness`] instead of an error.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::EvaluationError;
use crate::fitness::traits::Fitness;
use crate::genome::phenotype::Configuration;

/// Scores one configuration.
///
/// `identity` is unique per evaluation within a run; implementations use it to
/// isolate their working directories and output files.
pub trait Evaluator: Send + Sync {
    /// Evaluate both objectives (minimized)
    fn evaluate(
        &self,
        configuration: &Configuration,
        identity: Uuid,
    ) -> Result<(f64, f64), EvaluationError>;
}

impl<F> Evaluator for F
where
    F: Fn(&Configuration, Uuid) -> Result<(f64, f64), EvaluationError> + Send + Sync,
{
    fn evaluate(
        &self,
        configuration: &Configuration,
        identity: Uuid,
    ) -> Result<(f64, f64), EvaluationError> {
        self(configuration, identity)
    }
}

/// Stand-in evaluator that returns two uniform random objectives in `[0, 1)`.
///
/// Used to exercise the search loop without launching training runs. The draw is
/// seeded from the run seed and the configuration's bits, so results do not
/// depend on which worker picks up which request, and a seeded run replays
/// exactly even though identities differ between runs.
#[derive(Clone, Debug, Default)]
pub struct DryRunEvaluator {
    seed: u64,
}

impl DryRunEvaluator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl Evaluator for DryRunEvaluator {
    fn evaluate(
        &self,
        configuration: &Configuration,
        _identity: Uuid,
    ) -> Result<(f64, f64), EvaluationError> {
        let mut rng = StdRng::seed_from_u64(fingerprint(self.seed, configuration));
        Ok((rng.gen::<f64>(), rng.gen::<f64>()))
    }
}

fn fingerprint(seed: u64, c: &Configuration) -> u64 {
    [
        c.start_lr.to_bits(),
        c.stop_lr.to_bits(),
        c.rcut_smth.to_bits(),
        c.rcut.to_bits(),
        c.scale_by_worker as u64,
        c.desc_activ_func as u64,
        c.fitting_activ_func as u64,
    ]
    .iter()
    .fold(seed, |h, &x| {
        (h ^ x).wrapping_mul(0x9E37_79B9_7F4A_7C15).rotate_left(31)
    })
}

/// Evaluate a configuration, folding every failure into an invalid fitness.
///
/// The semantic pre-check runs first so that a configuration that is known to
/// be wrong never reaches the evaluator. Panics, errors, missed deadlines and
/// unusable objective values all produce [`Fitness::Invalid`].
pub fn evaluate_configuration<E: Evaluator + ?Sized>(
    evaluator: &E,
    configuration: &Configuration,
    identity: Uuid,
    timeout: Option<Duration>,
) -> (Fitness, Duration) {
    let start = Instant::now();
    let result = run_checked(evaluator, configuration, identity, timeout, start);
    let elapsed = start.elapsed();

    let fitness = match result {
        Ok(fitness) => {
            debug!(%identity, ?fitness, "evaluation finished");
            fitness
        }
        Err(err) => {
            warn!(%identity, cause = %err, "individual marked invalid");
            Fitness::invalid(err.to_string())
        }
    };
    (fitness, elapsed)
}

fn run_checked<E: Evaluator + ?Sized>(
    evaluator: &E,
    configuration: &Configuration,
    identity: Uuid,
    timeout: Option<Duration>,
    start: Instant,
) -> Result<Fitness, EvaluationError> {
    configuration.check()?;

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        evaluator.evaluate(configuration, identity)
    }));

    // a late result is a timeout whatever the evaluator reported
    if let Some(limit) = timeout {
        let elapsed = start.elapsed();
        if elapsed > limit {
            return Err(EvaluationError::Timeout {
                elapsed_secs: elapsed.as_secs_f64(),
                limit_secs: limit.as_secs_f64(),
            });
        }
    }

    let (energy, force) = outcome
        .map_err(|payload| EvaluationError::Panicked(panic_message(payload.as_ref())))??;

    Fitness::from_objectives([energy, force]).ok_or(EvaluationError::NonFinite(energy, force))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

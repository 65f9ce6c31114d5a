//! Batch evaluation
//!
//! An [`ExecutionFacility`] evaluates one generation's requests and returns only
//! when every request has resolved. Outcomes come back in request order.

use std::time::Duration;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
#[cfg(feature = "parallel")]
use tracing::debug;
use uuid::Uuid;

#[cfg(feature = "parallel")]
use crate::error::{EvoResult, EvolutionError};
use crate::fitness::evaluator::{evaluate_configuration, Evaluator};
use crate::fitness::traits::Fitness;
use crate::genome::phenotype::Configuration;

/// One unit of work for the evaluator
#[derive(Clone, Debug)]
pub struct EvaluationRequest {
    pub identity: Uuid,
    pub configuration: Configuration,
    pub timeout: Option<Duration>,
}

/// Resolved request
#[derive(Clone, Debug)]
pub struct EvaluationOutcome {
    pub identity: Uuid,
    pub fitness: Fitness,
    pub elapsed: Duration,
}

impl EvaluationRequest {
    fn resolve<E: Evaluator + ?Sized>(&self, evaluator: &E) -> EvaluationOutcome {
        let (fitness, elapsed) =
            evaluate_configuration(evaluator, &self.configuration, self.identity, self.timeout);
        EvaluationOutcome {
            identity: self.identity,
            fitness,
            elapsed,
        }
    }
}

/// Synchronous barrier over a batch of evaluations
pub trait ExecutionFacility: Send + Sync {
    /// Evaluate every request; `batch_size` caps how many run at once
    /// (`None` means no cap)
    fn evaluate_batch<E: Evaluator + ?Sized>(
        &self,
        evaluator: &E,
        requests: &[EvaluationRequest],
        batch_size: Option<usize>,
    ) -> Vec<EvaluationOutcome>;
}

/// Evaluates requests one after another on the calling thread
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialExecutor;

impl ExecutionFacility for SequentialExecutor {
    fn evaluate_batch<E: Evaluator + ?Sized>(
        &self,
        evaluator: &E,
        requests: &[EvaluationRequest],
        _batch_size: Option<usize>,
    ) -> Vec<EvaluationOutcome> {
        requests.iter().map(|r| r.resolve(evaluator)).collect()
    }
}

/// Evaluates requests on a dedicated rayon thread pool (requires `parallel` feature)
#[cfg(feature = "parallel")]
#[derive(Debug)]
pub struct ParallelExecutor {
    pool: rayon::ThreadPool,
}

#[cfg(feature = "parallel")]
impl ParallelExecutor {
    /// Build a pool with `num_workers` threads, or rayon's default when `None`
    pub fn new(num_workers: Option<usize>) -> EvoResult<Self> {
        if num_workers == Some(0) {
            return Err(EvolutionError::Configuration(
                "num_workers must be at least 1".to_string(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_workers.unwrap_or(0))
            .thread_name(|i| format!("evaluator-{i}"))
            .build()
            .map_err(|e| EvolutionError::Configuration(format!("thread pool: {e}")))?;
        Ok(Self { pool })
    }

    /// Number of worker threads
    pub fn num_workers(&self) -> usize {
        self.pool.current_num_threads()
    }
}

#[cfg(feature = "parallel")]
impl ExecutionFacility for ParallelExecutor {
    fn evaluate_batch<E: Evaluator + ?Sized>(
        &self,
        evaluator: &E,
        requests: &[EvaluationRequest],
        batch_size: Option<usize>,
    ) -> Vec<EvaluationOutcome> {
        let chunk = batch_size.filter(|&b| b > 0).unwrap_or(requests.len()).max(1);
        let mut outcomes = Vec::with_capacity(requests.len());
        for (i, batch) in requests.chunks(chunk).enumerate() {
            debug!(batch = i, size = batch.len(), "dispatching evaluation batch");
            let resolved: Vec<EvaluationOutcome> = self
                .pool
                .install(|| batch.par_iter().map(|r| r.resolve(evaluator)).collect());
            outcomes.extend(resolved);
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvaluationError;
    use crate::genome::real_vector::Genome;

    type Raw = Result<(f64, f64), EvaluationError>;

    fn requests(n: usize) -> Vec<EvaluationRequest> {
        let configuration =
            Configuration::decode(&Genome::new(vec![0.005, 0.00005, 3.0, 8.0, 0.5, 2.2, 4.9]))
                .unwrap();
        (0..n)
            .map(|_| EvaluationRequest {
                identity: Uuid::new_v4(),
                configuration,
                timeout: None,
            })
            .collect()
    }

    fn by_identity(_: &Configuration, identity: Uuid) -> Raw {
        let (hi, _) = identity.as_u64_pair();
        Ok(((hi % 1000) as f64, 1.0))
    }

    #[test]
    fn test_sequential_preserves_order() {
        let requests = requests(8);
        let outcomes = SequentialExecutor.evaluate_batch(&by_identity, &requests, None);

        assert_eq!(outcomes.len(), 8);
        for (request, outcome) in requests.iter().zip(&outcomes) {
            assert_eq!(request.identity, outcome.identity);
            let (hi, _) = request.identity.as_u64_pair();
            assert_eq!(outcome.fitness.objectives(), [(hi % 1000) as f64, 1.0]);
        }
    }

    #[test]
    fn test_failures_do_not_abort_batch() {
        let requests = requests(4);
        let failing = requests[1].identity;
        let evaluator = move |_: &Configuration, identity: Uuid| -> Raw {
            if identity == failing {
                Err(EvaluationError::MissingOutput("lcurve.out".to_string()))
            } else {
                Ok((0.5, 0.5))
            }
        };

        let outcomes = SequentialExecutor.evaluate_batch(&evaluator, &requests, None);
        let valid: Vec<bool> = outcomes.iter().map(|o| o.fitness.is_valid()).collect();
        assert_eq!(valid, vec![true, false, true, true]);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_preserves_order() {
        let executor = ParallelExecutor::new(Some(3)).unwrap();
        assert_eq!(executor.num_workers(), 3);

        let requests = requests(17);
        let outcomes = executor.evaluate_batch(&by_identity, &requests, Some(4));

        assert_eq!(outcomes.len(), 17);
        for (request, outcome) in requests.iter().zip(&outcomes) {
            assert_eq!(request.identity, outcome.identity);
        }
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let executor = ParallelExecutor::new(None).unwrap();
        let requests = requests(10);

        let parallel = executor.evaluate_batch(&by_identity, &requests, None);
        let sequential = SequentialExecutor.evaluate_batch(&by_identity, &requests, None);
        for (p, s) in parallel.iter().zip(&sequential) {
            assert_eq!(p.fitness, s.fitness);
        }
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_zero_workers_rejected() {
        assert!(ParallelExecutor::new(Some(0)).is_err());
    }

    #[test]
    fn test_empty_batch() {
        let outcomes = SequentialExecutor.evaluate_batch(&by_identity, &[], Some(2));
        assert!(outcomes.is_empty());
    }
}

//! Generational NSGA-II tuner
//!
//! Each generation selects parents uniformly, clones and mutates them, evaluates
//! the offspring as one batch, merges them with the parents, and truncates the
//! pool back to the population size by rank and crowding distance. The mutation
//! step is annealed after every generation.

use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, info};

use crate::algorithms::nsga2::{rank_and_crowd, select_survivors};
use crate::diagnostics::{GenerationStats, TimingStats, TuningResult, TuningStats};
use crate::error::{EvoResult, EvolutionError};
use crate::execution::{EvaluationRequest, ExecutionFacility};
use crate::fitness::evaluator::Evaluator;
use crate::genome::bounds::MultiBounds;
use crate::genome::schema::GenomeSchema;
use crate::hyperparameter::schedules::{
    GeometricAnnealing, MutationStep, DEFAULT_ANNEAL_FACTOR,
};
use crate::operators::mutation::IsotropicGaussianMutation;
use crate::operators::selection::RandomSelection;
use crate::operators::traits::{MutationOperator, SelectionOperator};
use crate::population::identity::IdentityAllocator;
use crate::population::individual::Individual;
use crate::population::population::Population;
use crate::telemetry::TelemetrySink;

/// Configuration for the tuner
#[derive(Clone, Debug)]
pub struct Nsga2TunerConfig {
    /// Population size (parents kept per generation)
    pub population_size: usize,
    /// Generations to run after the initial population
    pub max_generations: usize,
    /// Mutation step for the first generation
    pub initial_step: MutationStep,
    /// Annealing factor applied to the step after each generation
    pub anneal_factor: f64,
    /// Evaluations running longer than this are invalid
    pub evaluation_timeout: Option<Duration>,
    /// Cap on concurrently running evaluations
    pub batch_size: Option<usize>,
}

impl Default for Nsga2TunerConfig {
    fn default() -> Self {
        Self {
            population_size: 10,
            max_generations: 5,
            initial_step: MutationStep::default(),
            anneal_factor: DEFAULT_ANNEAL_FACTOR,
            evaluation_timeout: None,
            batch_size: None,
        }
    }
}

/// Builder for [`Nsga2Tuner`]
#[derive(Clone, Debug, Default)]
pub struct Nsga2TunerBuilder {
    config: Nsga2TunerConfig,
    schema: GenomeSchema,
}

impl Nsga2TunerBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the population size
    pub fn population_size(mut self, size: usize) -> Self {
        self.config.population_size = size;
        self
    }

    /// Set the number of generations
    pub fn max_generations(mut self, generations: usize) -> Self {
        self.config.max_generations = generations;
        self
    }

    /// Set the initial per-gene mutation std
    pub fn initial_step(mut self, step: MutationStep) -> Self {
        self.config.initial_step = step;
        self
    }

    /// Set the annealing factor
    pub fn anneal_factor(mut self, factor: f64) -> Self {
        self.config.anneal_factor = factor;
        self
    }

    /// Set the evaluation timeout
    pub fn evaluation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.evaluation_timeout = timeout;
        self
    }

    /// Set the evaluation batch size
    pub fn batch_size(mut self, batch_size: Option<usize>) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Replace the gene schema
    pub fn schema(mut self, schema: GenomeSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Validate and build the tuner
    pub fn build(self) -> EvoResult<Nsga2Tuner> {
        self.schema.validate()?;

        if self.config.population_size == 0 {
            return Err(EvolutionError::Configuration(
                "Population size must be at least 1".to_string(),
            ));
        }
        self.config.initial_step.validate(self.schema.dimension())?;
        let annealing = GeometricAnnealing::new(self.config.anneal_factor)?;
        if self.config.evaluation_timeout == Some(Duration::ZERO) {
            return Err(EvolutionError::Configuration(
                "Evaluation timeout must be positive".to_string(),
            ));
        }
        if self.config.batch_size == Some(0) {
            return Err(EvolutionError::Configuration(
                "Batch size must be at least 1".to_string(),
            ));
        }

        let bounds = self.schema.bounds();
        Ok(Nsga2Tuner {
            config: self.config,
            schema: self.schema,
            bounds,
            annealing,
            selection: RandomSelection::new(),
            mutation: IsotropicGaussianMutation::new(),
        })
    }
}

/// Where a session is in its run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TunerState {
    /// No individual has been created yet
    Initializing,
    /// The initial population and `generation` generations have been evaluated
    Running { generation: usize },
    /// All generations are complete
    Done,
}

/// Multi-objective tuner over the deepmd-kit gene schema
#[derive(Clone, Debug)]
pub struct Nsga2Tuner {
    config: Nsga2TunerConfig,
    schema: GenomeSchema,
    bounds: MultiBounds,
    annealing: GeometricAnnealing,
    selection: RandomSelection,
    mutation: IsotropicGaussianMutation,
}

impl Nsga2Tuner {
    /// Create a builder for the tuner
    pub fn builder() -> Nsga2TunerBuilder {
        Nsga2TunerBuilder::new()
    }

    pub fn config(&self) -> &Nsga2TunerConfig {
        &self.config
    }

    pub fn schema(&self) -> &GenomeSchema {
        &self.schema
    }

    /// Open a session that can be stepped one generation at a time
    pub fn session<'a, X, R>(
        &'a self,
        evaluator: &'a dyn Evaluator,
        executor: &'a X,
        telemetry: &'a dyn TelemetrySink,
        rng: &'a mut R,
    ) -> TuningSession<'a, X, R>
    where
        X: ExecutionFacility,
        R: Rng,
    {
        TuningSession {
            tuner: self,
            evaluator,
            executor,
            telemetry,
            rng,
            identities: IdentityAllocator::new(),
            state: TunerState::Initializing,
            parents: Population::default(),
            step: self.config.initial_step.clone(),
            evaluations: 0,
            stats: TuningStats::new(),
            started: Instant::now(),
        }
    }

    /// Run to completion
    pub fn run<X, R>(
        &self,
        evaluator: &dyn Evaluator,
        executor: &X,
        telemetry: &dyn TelemetrySink,
        rng: &mut R,
    ) -> EvoResult<TuningResult>
    where
        X: ExecutionFacility,
        R: Rng,
    {
        self.session(evaluator, executor, telemetry, rng).finish()
    }
}

/// A tuning run in progress
pub struct TuningSession<'a, X, R> {
    tuner: &'a Nsga2Tuner,
    evaluator: &'a dyn Evaluator,
    executor: &'a X,
    telemetry: &'a dyn TelemetrySink,
    rng: &'a mut R,
    identities: IdentityAllocator,
    state: TunerState,
    parents: Population,
    step: MutationStep,
    evaluations: usize,
    stats: TuningStats,
    started: Instant,
}

impl<'a, X, R> TuningSession<'a, X, R>
where
    X: ExecutionFacility,
    R: Rng,
{
    pub fn state(&self) -> TunerState {
        self.state
    }

    /// Current parent population
    pub fn parents(&self) -> &Population {
        &self.parents
    }

    /// Mutation step that the next generation will use
    pub fn mutation_step(&self) -> &MutationStep {
        &self.step
    }

    /// Total evaluations so far
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Advance by one state transition
    pub fn step(&mut self) -> EvoResult<TunerState> {
        let max_generations = self.tuner.config.max_generations;
        self.state = match self.state {
            TunerState::Initializing => {
                self.initialize()?;
                if max_generations == 0 {
                    TunerState::Done
                } else {
                    TunerState::Running { generation: 0 }
                }
            }
            TunerState::Running { generation } => {
                let next = generation + 1;
                self.generation(next)?;
                if next >= max_generations {
                    TunerState::Done
                } else {
                    TunerState::Running { generation: next }
                }
            }
            TunerState::Done => TunerState::Done,
        };
        Ok(self.state)
    }

    /// Run any remaining generations and return the result
    pub fn finish(mut self) -> EvoResult<TuningResult> {
        while self.state != TunerState::Done {
            self.step()?;
        }

        self.stats.set_runtime(self.started.elapsed());
        info!(
            generations = self.parents.generation(),
            evaluations = self.evaluations,
            front_size = self.parents.pareto_front().len(),
            "tuning finished"
        );

        let generations = self.parents.generation();
        Ok(TuningResult::new(self.parents, generations, self.evaluations).with_stats(self.stats))
    }

    fn initialize(&mut self) -> EvoResult<()> {
        let start = Instant::now();
        let config = &self.tuner.config;
        info!(
            population_size = config.population_size,
            max_generations = config.max_generations,
            std = ?self.step.std(),
            "tuning started"
        );

        let mut individuals = Population::random(
            config.population_size,
            &self.tuner.bounds,
            self.rng,
            &mut self.identities,
        )
        .into_individuals();

        let eval_start = Instant::now();
        self.evaluate(&mut individuals)?;
        let eval_time = eval_start.elapsed();

        self.telemetry.on_evaluated(0, &individuals);
        rank_and_crowd(&mut individuals);
        self.parents = Population::from_individuals(individuals.clone(), 0);
        self.telemetry.on_population(0, &self.parents);

        let timing = TimingStats::new()
            .with_evaluation(eval_time)
            .with_total(start.elapsed());
        self.record(&individuals, timing);
        Ok(())
    }

    fn generation(&mut self, generation: usize) -> EvoResult<()> {
        let start = Instant::now();
        let n = self.tuner.config.population_size;

        let sel_start = Instant::now();
        let picks = self
            .tuner
            .selection
            .select_many(self.parents.len(), n, self.rng)?;
        let mut selection_time = sel_start.elapsed();

        let mut_start = Instant::now();
        let mut offspring = Vec::with_capacity(n);
        for idx in picks {
            let (id, birth_id) = self.identities.issue();
            let mut child = Individual::offspring_of(&self.parents[idx], id, birth_id);
            self.tuner.mutation.mutate(
                child.genome_mut(),
                &self.step,
                &self.tuner.bounds,
                self.rng,
            )?;
            offspring.push(child);
        }
        let mutation_time = mut_start.elapsed();

        let eval_start = Instant::now();
        self.evaluate(&mut offspring)?;
        let eval_time = eval_start.elapsed();
        self.telemetry.on_evaluated(generation, &offspring);

        let sel_start = Instant::now();
        let mut pool = std::mem::take(&mut self.parents).into_individuals();
        pool.extend(offspring.iter().cloned());
        let survivors = select_survivors(pool, n)?;
        self.parents = Population::from_individuals(survivors, generation);
        selection_time += sel_start.elapsed();

        self.step = self
            .tuner
            .annealing
            .step_at(&self.tuner.config.initial_step, generation);
        self.telemetry.on_population(generation, &self.parents);

        let timing = TimingStats::new()
            .with_selection(selection_time)
            .with_mutation(mutation_time)
            .with_evaluation(eval_time)
            .with_total(start.elapsed());
        self.record(&offspring, timing);
        Ok(())
    }

    fn evaluate(&mut self, individuals: &mut [Individual]) -> EvoResult<()> {
        let requests = individuals
            .iter()
            .map(|individual| -> EvoResult<EvaluationRequest> {
                Ok(EvaluationRequest {
                    identity: individual.id,
                    configuration: individual.configuration()?,
                    timeout: self.tuner.config.evaluation_timeout,
                })
            })
            .collect::<EvoResult<Vec<_>>>()?;

        let outcomes =
            self.executor
                .evaluate_batch(self.evaluator, &requests, self.tuner.config.batch_size);
        if outcomes.len() != individuals.len() {
            return Err(EvolutionError::FitnessEvaluation(format!(
                "executor returned {} outcomes for {} requests",
                outcomes.len(),
                individuals.len()
            )));
        }

        for (individual, outcome) in individuals.iter_mut().zip(outcomes) {
            if outcome.identity != individual.id {
                return Err(EvolutionError::FitnessEvaluation(format!(
                    "outcome for {} returned in place of {}",
                    outcome.identity, individual.id
                )));
            }
            individual.set_fitness(outcome.fitness);
            individual.evaluation_ms = Some(outcome.elapsed.as_secs_f64() * 1000.0);
        }
        self.evaluations += individuals.len();
        debug!(count = individuals.len(), "batch evaluated");
        Ok(())
    }

    fn record(&mut self, evaluated: &[Individual], timing: TimingStats) {
        let stats = GenerationStats::from_population(
            &self.parents,
            evaluated,
            self.evaluations,
            self.step.std(),
        )
        .with_timing(timing);
        info!(
            generation = stats.generation,
            evaluated = stats.evaluated,
            invalid = stats.invalid,
            front_size = stats.front_size,
            best = ?stats.best_objectives,
            std = ?stats.mutation_std,
            "generation complete"
        );
        self.stats.record(stats);
    }
}

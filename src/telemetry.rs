//! Run telemetry
//!
//! A [`TelemetrySink`] sees every evaluated individual before selection and the
//! surviving parent population after it.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::fitness::traits::Objectives;
use crate::genome::phenotype::Configuration;
use crate::population::individual::Individual;
use crate::population::population::Population;

/// Receives per-generation reports from the tuner
pub trait TelemetrySink: Send + Sync {
    /// Every individual evaluated in `generation`, before selection
    fn on_evaluated(&self, generation: usize, individuals: &[Individual]);

    /// The parent population after selection in `generation`
    fn on_population(&self, generation: usize, population: &Population);
}

/// Which probe produced a record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Probe {
    Evaluated,
    Population,
}

/// One flattened row of telemetry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub probe: Probe,
    pub generation: usize,
    pub id: Uuid,
    pub birth_id: usize,
    pub configuration: Option<Configuration>,
    pub objectives: Objectives,
    pub valid: bool,
    pub cause: Option<String>,
    pub rank: Option<usize>,
    pub crowding_distance: Option<f64>,
    pub evaluation_ms: Option<f64>,
}

impl TelemetryRecord {
    pub fn new(probe: Probe, generation: usize, individual: &Individual) -> Self {
        let ranked = individual.rank != usize::MAX;
        Self {
            probe,
            generation,
            id: individual.id,
            birth_id: individual.birth_id,
            configuration: individual.configuration().ok(),
            objectives: individual.objectives(),
            valid: individual.is_valid(),
            cause: individual
                .fitness
                .as_ref()
                .and_then(|f| f.cause())
                .map(str::to_string),
            rank: ranked.then_some(individual.rank),
            crowding_distance: ranked.then_some(individual.crowding_distance),
            evaluation_ms: individual.evaluation_ms,
        }
    }
}

/// Discards everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn on_evaluated(&self, _generation: usize, _individuals: &[Individual]) {}

    fn on_population(&self, _generation: usize, _population: &Population) {}
}

/// Emits one structured `tracing` event per individual
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingTelemetry;

impl TracingTelemetry {
    fn emit(record: &TelemetryRecord) {
        let [energy, force] = record.objectives;
        info!(
            target: "deepmd_tuner::telemetry",
            probe = ?record.probe,
            generation = record.generation,
            id = %record.id,
            birth_id = record.birth_id,
            energy,
            force,
            valid = record.valid,
            cause = record.cause.as_deref().unwrap_or(""),
            rank = record.rank,
            crowding_distance = record.crowding_distance,
            evaluation_ms = record.evaluation_ms,
            configuration = %record
                .configuration
                .map(|c| c.to_string())
                .unwrap_or_default(),
        );
    }
}

impl TelemetrySink for TracingTelemetry {
    fn on_evaluated(&self, generation: usize, individuals: &[Individual]) {
        for individual in individuals {
            Self::emit(&TelemetryRecord::new(Probe::Evaluated, generation, individual));
        }
    }

    fn on_population(&self, generation: usize, population: &Population) {
        for individual in population.iter() {
            Self::emit(&TelemetryRecord::new(Probe::Population, generation, individual));
        }
    }
}

/// Keeps every record in memory
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    records: Mutex<Vec<TelemetryRecord>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TelemetryRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of all records so far
    pub fn records(&self) -> Vec<TelemetryRecord> {
        self.lock().clone()
    }

    /// Records from one probe only
    pub fn records_for(&self, probe: Probe) -> Vec<TelemetryRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.probe == probe)
            .collect()
    }

    fn push_all<'a>(
        &self,
        probe: Probe,
        generation: usize,
        individuals: impl Iterator<Item = &'a Individual>,
    ) {
        self.lock()
            .extend(individuals.map(|i| TelemetryRecord::new(probe, generation, i)));
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn on_evaluated(&self, generation: usize, individuals: &[Individual]) {
        self.push_all(Probe::Evaluated, generation, individuals.iter());
    }

    fn on_population(&self, generation: usize, population: &Population) {
        self.push_all(Probe::Population, generation, population.iter());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::traits::{Fitness, BAD_FITNESS};
    use crate::genome::real_vector::Genome;

    fn evaluated() -> Vec<Individual> {
        let genome = Genome::new(vec![0.005, 0.00005, 3.0, 8.0, 0.5, 2.2, 4.9]);
        vec![
            Individual::with_fitness(
                genome.clone(),
                Uuid::new_v4(),
                0,
                Fitness::Valid {
                    objectives: [0.1, 0.2],
                },
            ),
            Individual::with_fitness(genome, Uuid::new_v4(), 1, Fitness::invalid("crashed")),
        ]
    }

    #[test]
    fn test_recording_telemetry() {
        let sink = RecordingTelemetry::new();
        let individuals = evaluated();
        sink.on_evaluated(0, &individuals);
        sink.on_population(0, &Population::from_individuals(individuals, 0));

        assert_eq!(sink.records().len(), 4);
        let evaluated = sink.records_for(Probe::Evaluated);
        assert_eq!(evaluated.len(), 2);
        assert!(evaluated[0].valid);
        assert_eq!(evaluated[0].objectives, [0.1, 0.2]);
        assert!(!evaluated[1].valid);
        assert_eq!(evaluated[1].objectives, [BAD_FITNESS, BAD_FITNESS]);
        assert_eq!(evaluated[1].cause.as_deref(), Some("crashed"));
    }

    #[test]
    fn test_record_rank_only_when_ranked() {
        let mut individual = evaluated().remove(0);
        let record = TelemetryRecord::new(Probe::Evaluated, 1, &individual);
        assert_eq!(record.rank, None);
        assert!(record.configuration.is_some());

        individual.rank = 0;
        individual.crowding_distance = f64::INFINITY;
        let record = TelemetryRecord::new(Probe::Population, 1, &individual);
        assert_eq!(record.rank, Some(0));
        assert_eq!(record.crowding_distance, Some(f64::INFINITY));
    }

    #[test]
    fn test_recording_survives_poisoned_lock() {
        let sink = std::sync::Arc::new(RecordingTelemetry::new());
        sink.on_evaluated(0, &evaluated());

        let poisoner = std::sync::Arc::clone(&sink);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.records.lock().unwrap();
            panic!("sink holder crashed");
        })
        .join();
        assert!(sink.records.is_poisoned());

        sink.on_evaluated(1, &evaluated());
        let records = sink.records();
        assert_eq!(records.len(), 4);
        assert_eq!(records[3].generation, 1);
    }

    #[test]
    fn test_tracing_and_noop_sinks_accept_reports() {
        let individuals = evaluated();
        let population = Population::from_individuals(individuals.clone(), 0);

        TracingTelemetry.on_evaluated(0, &individuals);
        TracingTelemetry.on_population(0, &population);
        NoopTelemetry.on_evaluated(0, &individuals);
        NoopTelemetry.on_population(0, &population);
    }
}

//! Run configuration
//!
//! Settings come from one or more YAML files merged in order, so a shared file
//! of defaults can be overridden by site- and run-specific ones.

use std::path::Path;
use std::time::Duration;

use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::algorithms::tuner::Nsga2TunerBuilder;
use crate::error::{EvoResult, EvolutionError};
use crate::genome::schema::GENE_COUNT;
use crate::hyperparameter::schedules::{MutationStep, DEFAULT_ANNEAL_FACTOR, DEFAULT_INITIAL_STD};

/// Top-level run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// Label attached to logs and telemetry
    pub job_id: Option<String>,
    /// Debug-level logging
    pub verbose: bool,
    /// Score with random objectives instead of training runs
    pub test: bool,
    /// Seed for the run's random number generator
    pub seed: Option<u64>,
    pub ea: EaConfig,
    pub distributed: DistributedConfig,
}

/// Evolutionary algorithm settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EaConfig {
    pub pop_size: usize,
    pub max_generations: usize,
    /// Per-gene standard deviation for the first generation
    pub initial_std: Vec<f64>,
    pub anneal_factor: f64,
    pub evaluation_timeout_minutes: Option<f64>,
}

/// Evaluation fan-out settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributedConfig {
    /// Worker threads; all cores when unset
    pub num_workers: Option<usize>,
    /// Evaluations in flight at once; the whole generation when unset
    pub batch_size: Option<usize>,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            job_id: None,
            verbose: false,
            test: false,
            seed: None,
            ea: EaConfig::default(),
            distributed: DistributedConfig::default(),
        }
    }
}

impl Default for EaConfig {
    fn default() -> Self {
        Self {
            pop_size: 10,
            max_generations: 5,
            initial_std: DEFAULT_INITIAL_STD.to_vec(),
            anneal_factor: DEFAULT_ANNEAL_FACTOR,
            evaluation_timeout_minutes: None,
        }
    }
}

impl TunerConfig {
    /// Load and merge YAML files; later files override earlier ones
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> EvoResult<Self> {
        let builder = paths.iter().fold(Config::builder(), |builder, path| {
            builder.add_source(File::from(path.as_ref()).format(FileFormat::Yaml))
        });

        let config: TunerConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| EvolutionError::Configuration(format!("Failed to load config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> EvoResult<()> {
        let ea = &self.ea;
        if ea.pop_size == 0 {
            return Err(EvolutionError::Configuration(
                "ea.pop_size must be at least 1".to_string(),
            ));
        }
        if ea.initial_std.len() != GENE_COUNT {
            return Err(EvolutionError::Configuration(format!(
                "ea.initial_std must have {} entries, got {}",
                GENE_COUNT,
                ea.initial_std.len()
            )));
        }
        if ea.initial_std.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(EvolutionError::Configuration(
                "ea.initial_std entries must be finite and non-negative".to_string(),
            ));
        }
        if !(ea.anneal_factor > 0.0 && ea.anneal_factor <= 1.0) {
            return Err(EvolutionError::Configuration(format!(
                "ea.anneal_factor must be in (0, 1], got {}",
                ea.anneal_factor
            )));
        }
        if let Some(minutes) = ea.evaluation_timeout_minutes {
            if !(minutes > 0.0 && minutes.is_finite()) {
                return Err(EvolutionError::Configuration(format!(
                    "ea.evaluation_timeout_minutes must be positive, got {minutes}"
                )));
            }
        }
        if self.distributed.num_workers == Some(0) {
            return Err(EvolutionError::Configuration(
                "distributed.num_workers must be at least 1".to_string(),
            ));
        }
        if self.distributed.batch_size == Some(0) {
            return Err(EvolutionError::Configuration(
                "distributed.batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Per-evaluation deadline
    pub fn evaluation_timeout(&self) -> Option<Duration> {
        self.ea
            .evaluation_timeout_minutes
            .map(|minutes| Duration::from_secs_f64(minutes * 60.0))
    }

    /// Tuner builder preloaded with these settings
    pub fn tuner_builder(&self) -> Nsga2TunerBuilder {
        Nsga2TunerBuilder::new()
            .population_size(self.ea.pop_size)
            .max_generations(self.ea.max_generations)
            .initial_step(MutationStep::new(self.ea.initial_std.clone()))
            .anneal_factor(self.ea.anneal_factor)
            .evaluation_timeout(self.evaluation_timeout())
            .batch_size(self.distributed.batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = TunerConfig::default();
        assert_eq!(config.ea.pop_size, 10);
        assert_eq!(config.ea.max_generations, 5);
        assert_eq!(config.ea.anneal_factor, 0.85);
        assert_eq!(config.ea.initial_std.len(), 7);
        assert!(config.validate().is_ok());
        assert_eq!(config.evaluation_timeout(), None);
    }

    #[test]
    fn test_load_single_file() {
        let file = yaml_file(
            "job_id: smoke\ntest: true\nseed: 7\nea:\n  pop_size: 4\n  max_generations: 2\n",
        );
        let config = TunerConfig::load(&[file.path()]).unwrap();

        assert_eq!(config.job_id.as_deref(), Some("smoke"));
        assert!(config.test);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.ea.pop_size, 4);
        assert_eq!(config.ea.max_generations, 2);
        // untouched keys keep their defaults
        assert_eq!(config.ea.anneal_factor, 0.85);
        assert_eq!(config.distributed, DistributedConfig::default());
    }

    #[test]
    fn test_later_files_override_earlier() {
        let general = yaml_file(
            "verbose: false\nea:\n  pop_size: 20\n  max_generations: 8\ndistributed:\n  num_workers: 4\n",
        );
        let this_run = yaml_file("verbose: true\nea:\n  pop_size: 6\n");

        let config = TunerConfig::load(&[general.path(), this_run.path()]).unwrap();
        assert!(config.verbose);
        assert_eq!(config.ea.pop_size, 6);
        assert_eq!(config.ea.max_generations, 8);
        assert_eq!(config.distributed.num_workers, Some(4));
    }

    #[test]
    fn test_timeout_conversion() {
        let file = yaml_file("ea:\n  evaluation_timeout_minutes: 1.5\n");
        let config = TunerConfig::load(&[file.path()]).unwrap();
        assert_eq!(config.evaluation_timeout(), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for contents in [
            "ea:\n  pop_size: 0\n",
            "ea:\n  initial_std: [0.1, 0.1]\n",
            "ea:\n  initial_std: [0.1, 0.1, 0.1, -0.1, 0.1, 0.1, 0.1]\n",
            "ea:\n  anneal_factor: 1.5\n",
            "ea:\n  evaluation_timeout_minutes: 0\n",
            "distributed:\n  num_workers: 0\n",
            "distributed:\n  batch_size: 0\n",
        ] {
            let file = yaml_file(contents);
            assert!(
                TunerConfig::load(&[file.path()]).is_err(),
                "accepted: {contents}"
            );
        }
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = TunerConfig::load(&["/nonexistent/deepmd-tuner.yaml"]);
        assert!(matches!(result, Err(EvolutionError::Configuration(_))));
    }

    #[test]
    fn test_tuner_builder_from_config() {
        let mut config = TunerConfig::default();
        config.ea.pop_size = 3;
        config.distributed.batch_size = Some(2);

        let tuner = config.tuner_builder().build().unwrap();
        assert_eq!(tuner.config().population_size, 3);
        assert_eq!(tuner.config().batch_size, Some(2));
    }
}

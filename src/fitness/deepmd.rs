//! deepmd-kit training inputs and outputs
//!
//! Each evaluation runs in a working directory named after its identity. The
//! directory receives an `input.json` rendered from a template, and once
//! training has finished the last row of `lcurve.out` supplies the energy and
//! force validation errors. Launching `dp train` is left to a [`Trainer`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::EvaluationError;
use crate::fitness::evaluator::Evaluator;
use crate::genome::phenotype::Configuration;

/// Training input written into every working directory
pub const INPUT_FILE: &str = "input.json";

/// Learning curve written by `dp train`
pub const LCURVE_FILE: &str = "lcurve.out";

const ENERGY_COLUMN: &str = "rmse_e_val";
const FORCE_COLUMN: &str = "rmse_f_val";

const PLACEHOLDER: &str = r"\$(?:(?P<escaped>\$)|\{(?P<braced>[_A-Za-z][_A-Za-z0-9]*)\}|(?P<named>[_A-Za-z][_A-Za-z0-9]*)|(?P<invalid>))";

/// Value a placeholder stands for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    StartLr,
    StopLr,
    RcutSmth,
    Rcut,
    ScaleByWorker,
    DescActivFunc,
    FittingActivFunc,
    Seed,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "start_lr" => Some(Self::StartLr),
            "stop_lr" => Some(Self::StopLr),
            "rcut_smth" => Some(Self::RcutSmth),
            "rcut" => Some(Self::Rcut),
            "scale_by_worker" => Some(Self::ScaleByWorker),
            "desc_activ_func" => Some(Self::DescActivFunc),
            "fitting_activ_func" => Some(Self::FittingActivFunc),
            "seed" => Some(Self::Seed),
            _ => None,
        }
    }

    fn render(self, c: &Configuration, seed: u64) -> String {
        match self {
            Self::StartLr => c.start_lr.to_string(),
            Self::StopLr => c.stop_lr.to_string(),
            Self::RcutSmth => c.rcut_smth.to_string(),
            Self::Rcut => c.rcut.to_string(),
            Self::ScaleByWorker => c.scale_by_worker.to_string(),
            Self::DescActivFunc => c.desc_activ_func.to_string(),
            Self::FittingActivFunc => c.fitting_activ_func.to_string(),
            Self::Seed => seed.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Segment {
    Text(String),
    Field(Field),
}

/// A parsed `input.json` template.
///
/// `$name` and `${name}` are placeholders for the seven configuration fields
/// and `seed`; `$$` is a literal dollar sign. Unknown names and stray `$` are
/// rejected when the template is parsed, not when it is rendered.
#[derive(Clone, Debug, PartialEq)]
pub struct InputTemplate {
    segments: Vec<Segment>,
}

impl InputTemplate {
    pub fn parse(source: &str) -> Result<Self, EvaluationError> {
        let pattern =
            Regex::new(PLACEHOLDER).map_err(|e| EvaluationError::Template(e.to_string()))?;

        let mut segments = Vec::new();
        let mut last = 0;
        for caps in pattern.captures_iter(source) {
            let Some(whole) = caps.get(0) else { continue };
            push_text(&mut segments, &source[last..whole.start()]);
            last = whole.end();

            if caps.name("escaped").is_some() {
                push_text(&mut segments, "$");
                continue;
            }
            let Some(name) = caps.name("braced").or_else(|| caps.name("named")) else {
                return Err(EvaluationError::Template(format!(
                    "invalid placeholder at byte {}",
                    whole.start()
                )));
            };
            let field = Field::from_name(name.as_str()).ok_or_else(|| {
                EvaluationError::Template(format!("unknown placeholder ${{{}}}", name.as_str()))
            })?;
            segments.push(Segment::Field(field));
        }
        push_text(&mut segments, &source[last..]);

        Ok(Self { segments })
    }

    /// Read and parse a template file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EvaluationError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        Self::parse(&source)
    }

    /// Substitute a configuration and training seed
    pub fn render(&self, configuration: &Configuration, seed: u64) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field(field) => out.push_str(&field.render(configuration, seed)),
            }
        }
        out
    }
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    match segments.last_mut() {
        Some(Segment::Text(prev)) => prev.push_str(text),
        _ => segments.push(Segment::Text(text.to_string())),
    }
}

fn io_error(path: &Path, err: io::Error) -> EvaluationError {
    EvaluationError::Io(format!("{}: {err}", path.display()))
}

/// Training seed for an evaluation, below `i64::MAX` as deepmd-kit expects
pub fn training_seed(identity: Uuid) -> u64 {
    identity.as_u64_pair().0 >> 1
}

/// Create `run_dir/<identity>` and write the rendered `input.json` into it.
///
/// The working directory must not exist yet: an identity is never evaluated
/// twice, so an existing directory means two evaluations would share output.
pub fn prepare_work_dir(
    run_dir: &Path,
    identity: Uuid,
    template: &InputTemplate,
    configuration: &Configuration,
) -> Result<PathBuf, EvaluationError> {
    fs::create_dir_all(run_dir).map_err(|e| io_error(run_dir, e))?;

    let work_dir = run_dir.join(identity.to_string());
    fs::create_dir(&work_dir).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => EvaluationError::Io(format!(
            "working directory {} already exists",
            work_dir.display()
        )),
        _ => io_error(&work_dir, e),
    })?;

    let input = work_dir.join(INPUT_FILE);
    fs::write(&input, template.render(configuration, training_seed(identity)))
        .map_err(|e| io_error(&input, e))?;
    debug!(%identity, path = %input.display(), "wrote training input");
    Ok(work_dir)
}

/// Last `(rmse_e_val, rmse_f_val)` from the contents of an `lcurve.out`.
///
/// The first non-blank line is the `#`-prefixed column header.
pub fn parse_lcurve(contents: &str) -> Result<(f64, f64), EvaluationError> {
    let mut lines = contents.lines().map(str::trim).filter(|l| !l.is_empty());
    let header = lines
        .next()
        .ok_or_else(|| EvaluationError::MissingOutput(format!("{LCURVE_FILE} is empty")))?;
    let columns: Vec<&str> = header.trim_start_matches('#').split_whitespace().collect();
    let column = |name: &str| {
        columns.iter().position(|c| *c == name).ok_or_else(|| {
            EvaluationError::MissingOutput(format!("{LCURVE_FILE} has no {name} column"))
        })
    };
    let energy_at = column(ENERGY_COLUMN)?;
    let force_at = column(FORCE_COLUMN)?;

    let row = lines
        .filter(|l| !l.starts_with('#'))
        .last()
        .ok_or_else(|| EvaluationError::MissingOutput(format!("{LCURVE_FILE} has no data rows")))?;
    let values: Vec<&str> = row.split_whitespace().collect();
    let value = |at: usize, name: &str| {
        values
            .get(at)
            .and_then(|v| v.parse::<f64>().ok())
            .ok_or_else(|| {
                EvaluationError::Failed(format!("unreadable {name} in {LCURVE_FILE} row: {row}"))
            })
    };
    let energy = value(energy_at, ENERGY_COLUMN)?;
    let force = value(force_at, FORCE_COLUMN)?;

    if !(energy.is_finite() && force.is_finite()) {
        return Err(EvaluationError::NonFinite(energy, force));
    }
    Ok((energy, force))
}

/// Read the learning curve left in a working directory
pub fn read_lcurve(work_dir: &Path) -> Result<(f64, f64), EvaluationError> {
    let path = work_dir.join(LCURVE_FILE);
    let contents = fs::read_to_string(&path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => EvaluationError::MissingOutput(path.display().to_string()),
        _ => io_error(&path, e),
    })?;
    parse_lcurve(&contents)
}

/// Runs deepmd-kit training inside a prepared working directory
pub trait Trainer: Send + Sync {
    /// Train using the `input.json` already in `work_dir`
    fn train(&self, work_dir: &Path) -> Result<(), EvaluationError>;
}

impl<F> Trainer for F
where
    F: Fn(&Path) -> Result<(), EvaluationError> + Send + Sync,
{
    fn train(&self, work_dir: &Path) -> Result<(), EvaluationError> {
        self(work_dir)
    }
}

/// Evaluator backed by deepmd-kit training runs
#[derive(Clone, Debug)]
pub struct DeepmdEvaluator<T> {
    run_dir: PathBuf,
    template: InputTemplate,
    trainer: T,
}

impl<T: Trainer> DeepmdEvaluator<T> {
    pub fn new<P: Into<PathBuf>>(run_dir: P, template: InputTemplate, trainer: T) -> Self {
        Self {
            run_dir: run_dir.into(),
            template,
            trainer,
        }
    }

    /// Where the evaluation named `identity` writes its files
    pub fn work_dir(&self, identity: Uuid) -> PathBuf {
        self.run_dir.join(identity.to_string())
    }
}

impl<T: Trainer> Evaluator for DeepmdEvaluator<T> {
    fn evaluate(
        &self,
        configuration: &Configuration,
        identity: Uuid,
    ) -> Result<(f64, f64), EvaluationError> {
        let work_dir = prepare_work_dir(&self.run_dir, identity, &self.template, configuration)?;
        info!(%identity, work_dir = %work_dir.display(), "starting training");
        self.trainer.train(&work_dir)?;
        read_lcurve(&work_dir)
    }
}

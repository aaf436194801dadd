use crate::{derive_seed, score, AccuracyError, AccuracyResult, ClusteringAdapter, PointSet, RandomClusterGenerator, Result, SizeRange, memory::*};
use std::io::Write;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use rand::prelude::*;
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Parameter grid and execution settings of an accuracy experiment.
///
/// Every field has a default, so partial configurations can be deserialized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Dimensionalities to sweep
    pub dims: Vec<usize>,
    /// Spread multipliers to sweep
    pub sd_mults: Vec<f64>,
    /// Cluster counts, [`ExperimentRunner::run`] runs the whole grid once per entry
    pub cluster_counts: Vec<usize>,
    /// Possible sizes of a generated cluster
    pub sizes: SizeRange,
    /// Trials per (dim, sd_mult, k) cell
    pub trials: usize,
    /// Seed all trial seeds are derived from
    pub base_seed: u64,
    /// How often a failed trial is re-clustered on the same data before it is recorded as failure
    pub retries: usize,
    /// Run trials on the rayon thread pool
    pub parallel: bool,
}
impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            dims: (1..=9).map(|e| 1 << e).collect(),
            sd_mults: vec![1.0, 2.0, 3.0, 4.0],
            cluster_counts: vec![4, 8],
            sizes: SizeRange::default(),
            trials: 10,
            base_seed: 42,
            retries: 0,
            parallel: true,
        }
    }
}
impl ExperimentConfig {
    pub fn build() -> ExperimentConfigBuilder {
        ExperimentConfigBuilder { config: ExperimentConfig::default() }
    }

    /// Check that every grid cell can be generated.
    ///
    /// ## Errors
    /// - [`AccuracyError::InvalidParameter`] for an empty grid axis or `trials == 0`
    /// - whatever [`RandomClusterGenerator::new`] reports for a single cell
    pub fn validate(&self) -> Result<()> {
        if self.dims.is_empty() || self.sd_mults.is_empty() || self.cluster_counts.is_empty() {
            return Err(AccuracyError::InvalidParameter("dims, sd_mults and cluster_counts must not be empty".to_string()));
        }
        if self.trials == 0 {
            return Err(AccuracyError::InvalidParameter("trials must be at least 1".to_string()));
        }
        for &k in self.cluster_counts.iter() {
            for &dim in self.dims.iter() {
                for &sd_mult in self.sd_mults.iter() {
                    RandomClusterGenerator::new(k, dim, sd_mult, self.sizes)?;
                }
            }
        }
        Ok(())
    }
}

pub struct ExperimentConfigBuilder {
    config: ExperimentConfig,
}
impl ExperimentConfigBuilder {
    pub fn dims(mut self, dims: Vec<usize>) -> Self {
        self.config.dims = dims;
        self
    }
    pub fn sd_mults(mut self, sd_mults: Vec<f64>) -> Self {
        self.config.sd_mults = sd_mults;
        self
    }
    pub fn cluster_counts(mut self, cluster_counts: Vec<usize>) -> Self {
        self.config.cluster_counts = cluster_counts;
        self
    }
    pub fn sizes(mut self, sizes: SizeRange) -> Self {
        self.config.sizes = sizes;
        self
    }
    pub fn trials(mut self, trials: usize) -> Self {
        self.config.trials = trials;
        self
    }
    pub fn base_seed(mut self, base_seed: u64) -> Self {
        self.config.base_seed = base_seed;
        self
    }
    pub fn retries(mut self, retries: usize) -> Self {
        self.config.retries = retries;
        self
    }
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }
    pub fn build(self) -> ExperimentConfig { self.config }
}


/// Cooperative cancellation flag shared between an [`ExperimentRunner`] and its controller.
///
/// Once cancelled, no new trial is started. Trials that already run are finished and kept.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}
impl CancelHandle {
    pub fn new() -> Self { Self::default() }
    pub fn cancel(&self) { self.cancelled.store(true, Ordering::Release); }
    pub fn is_cancelled(&self) -> bool { self.cancelled.load(Ordering::Acquire) }
}


/// What came out of a single trial.
#[derive(Clone, Debug, PartialEq)]
pub enum TrialOutcome {
    Scored(AccuracyResult),
    /// Every attempt ended in an expected clustering failure, the last one is kept.
    Failed { error: AccuracyError, attempts: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrialRecord {
    pub dim: usize,
    pub sd_mult: f64,
    pub k: usize,
    pub trial: usize,
    pub seed: u64,
    pub outcome: TrialOutcome,
}
impl TrialRecord {
    pub fn accuracy(&self) -> Option<f64> {
        match &self.outcome {
            TrialOutcome::Scored(result) => Some(result.accuracy),
            TrialOutcome::Failed { .. } => None,
        }
    }
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, TrialOutcome::Failed { .. })
    }
}

/// Aggregate over the trials of one (dim, sd_mult, k) cell.
#[derive(Clone, Debug, PartialEq)]
pub struct CellSummary {
    pub dim: usize,
    pub sd_mult: f64,
    pub k: usize,
    pub trials: usize,
    pub failures: usize,
    /// Mean accuracy of the successful trials, `None` if every trial failed
    pub mean_accuracy: Option<f64>,
}

#[derive(Serialize)]
struct CsvRow {
    dim: usize,
    sd_mult: f64,
    k: usize,
    trial: usize,
    seed: u64,
    accuracy: Option<f64>,
    failure: Option<String>,
}

/// Trial records in grid order: k, then dim, then sd_mult, then trial.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultTable {
    rows: Vec<TrialRecord>,
    cancelled: bool,
}
impl ResultTable {
    pub fn rows(&self) -> &[TrialRecord] { &self.rows }
    pub fn len(&self) -> usize { self.rows.len() }
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }
    /// Whether the run was cancelled before every trial was started.
    pub fn is_cancelled(&self) -> bool { self.cancelled }
    pub fn failures(&self) -> impl Iterator<Item = &TrialRecord> + '_ {
        self.rows.iter().filter(|r| r.is_failure())
    }

    fn append(&mut self, other: ResultTable) {
        self.rows.extend(other.rows);
        self.cancelled |= other.cancelled;
    }

    /// One summary per grid cell, in order of first appearance.
    pub fn summaries(&self) -> Vec<CellSummary> {
        let mut summaries: Vec<(CellSummary, f64)> = Vec::new();
        for row in self.rows.iter() {
            let idx = match summaries.iter().position(|(s, _)| s.dim == row.dim && s.sd_mult == row.sd_mult && s.k == row.k) {
                Some(idx) => idx,
                None => {
                    summaries.push((CellSummary {
                        dim: row.dim, sd_mult: row.sd_mult, k: row.k, trials: 0, failures: 0, mean_accuracy: None
                    }, 0.0));
                    summaries.len() - 1
                }
            };
            let (summary, accuracy_sum) = &mut summaries[idx];
            summary.trials += 1;
            match row.accuracy() {
                Some(accuracy) => *accuracy_sum += accuracy,
                None => summary.failures += 1,
            }
        }
        summaries.into_iter()
            .map(|(mut summary, accuracy_sum)| {
                let scored = summary.trials - summary.failures;
                if scored > 0 {
                    summary.mean_accuracy = Some(accuracy_sum / scored as f64);
                }
                summary
            })
            .collect()
    }

    /// Write all rows as CSV with the header `dim,sd_mult,k,trial,seed,accuracy,failure`.
    /// Failed trials have an empty accuracy, scored trials an empty failure.
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for row in self.rows.iter() {
            let failure = match &row.outcome {
                TrialOutcome::Failed { error, .. } => Some(error.to_string()),
                TrialOutcome::Scored(_) => None,
            };
            wtr.serialize(CsvRow {
                dim: row.dim, sd_mult: row.sd_mult, k: row.k, trial: row.trial, seed: row.seed,
                accuracy: row.accuracy(), failure,
            })?;
        }
        wtr.flush()?;
        Ok(())
    }
}


/// Runs repeated generate, cluster and score trials over a parameter grid.
///
/// Each trial owns a random number generator seeded from
/// `derive_seed(base_seed, [k, dim, sd_mult bits, trial])`, so results do not depend on
/// scheduling. The data of a trial is generated from that seed, clustering attempt `n` (starting at 0)
/// uses `derive_seed(seed, [n + 1])`.
///
/// ## Example
/// ```rust
/// use cluster_accuracy::*;
///
/// let config = ExperimentConfig::build()
///     .dims(vec![2, 4])
///     .sd_mults(vec![0.5])
///     .cluster_counts(vec![3])
///     .trials(2)
///     .build();
/// let runner = ExperimentRunner::<f64, _>::new(config, KMeansAdapter::default()).unwrap();
/// let table = runner.run().unwrap();
///
/// assert_eq!(table.len(), 4);
/// for summary in table.summaries() {
///     println!("dim {} sd {}: {:?}", summary.dim, summary.sd_mult, summary.mean_accuracy);
/// }
/// ```
pub struct ExperimentRunner<T: Primitive, A: ClusteringAdapter<T>> {
    config: ExperimentConfig,
    adapter: A,
    cancel: CancelHandle,
    _p: PhantomData<T>,
}
impl<T: Primitive, A: ClusteringAdapter<T>> ExperimentRunner<T, A> where StandardNormal: Distribution<T> {
    /// ## Errors
    /// Everything [`ExperimentConfig::validate`] reports.
    pub fn new(config: ExperimentConfig, adapter: A) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, adapter, cancel: CancelHandle::new(), _p: PhantomData })
    }

    /// Use an externally created cancellation flag.
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle { self.cancel.clone() }
    pub fn config(&self) -> &ExperimentConfig { &self.config }
    pub fn adapter(&self) -> &A { &self.adapter }

    /// Run the configured grid once for every configured cluster count.
    pub fn run(&self) -> Result<ResultTable> {
        let mut table = ResultTable::default();
        for &k in self.config.cluster_counts.iter() {
            if self.cancel.is_cancelled() {
                table.cancelled = true;
                break;
            }
            table.append(self.run_grid(&self.config.dims, &self.config.sd_mults, k, self.config.trials)?);
        }
        Ok(table)
    }

    /// Run `trials` trials for every (dim, sd_mult) combination with `k` clusters.
    ///
    /// Expected clustering failures ([`AccuracyError::is_trial_failure`]) are recorded as
    /// [`TrialOutcome::Failed`]. Any other error aborts the grid.
    pub fn run_grid(&self, dims: &[usize], sd_mults: &[f64], k: usize, trials: usize) -> Result<ResultTable> {
        let mut generators = Vec::with_capacity(dims.len() * sd_mults.len());
        for &dim in dims.iter() {
            for &sd_mult in sd_mults.iter() {
                generators.push(RandomClusterGenerator::new(k, dim, sd_mult, self.config.sizes)?);
            }
        }
        let jobs: Vec<(&RandomClusterGenerator, usize)> = generators.iter()
            .flat_map(|generator| (0..trials).map(move |trial| (generator, trial)))
            .collect();
        tracing::info!(k, cells = generators.len(), trials = jobs.len(), "starting accuracy grid");

        let run_job = |&(generator, trial): &(&RandomClusterGenerator, usize)| -> Result<Option<TrialRecord>> {
            if self.cancel.is_cancelled() {
                return Ok(None);
            }
            self.run_trial(generator, trial).map(Some)
        };
        let results: Vec<Option<TrialRecord>> = if self.config.parallel {
            jobs.par_iter().map(run_job).collect::<Result<_>>()?
        } else {
            jobs.iter().map(run_job).collect::<Result<_>>()?
        };

        let started = results.len();
        let rows: Vec<TrialRecord> = results.into_iter().flatten().collect();
        let cancelled = rows.len() != started;
        if cancelled {
            tracing::info!(k, finished = rows.len(), total = started, "accuracy grid cancelled");
        } else {
            tracing::info!(k, trials = rows.len(), "accuracy grid finished");
        }
        Ok(ResultTable { rows, cancelled })
    }

    fn run_trial(&self, generator: &RandomClusterGenerator, trial: usize) -> Result<TrialRecord> {
        let (k, dim, sd_mult) = (generator.k(), generator.sample_dims(), generator.sd_mult());
        let seed = derive_seed(self.config.base_seed, &[k as u64, dim as u64, sd_mult.to_bits(), trial as u64]);
        let points: PointSet<T> = generator.generate(&mut StdRng::seed_from_u64(seed))?;

        let mut attempt = 0;
        let outcome = loop {
            let mut rnd = StdRng::seed_from_u64(derive_seed(seed, &[attempt as u64 + 1]));
            attempt += 1;
            let scored = self.adapter.cluster(&points, k, &mut rnd)
                .and_then(|prediction| score(points.true_labels(), prediction.labels(), k));
            match scored {
                Ok(result) => {
                    tracing::debug!(dim, sd_mult, k, trial, accuracy = result.accuracy, "trial scored");
                    break TrialOutcome::Scored(result);
                },
                Err(error) if error.is_trial_failure() => {
                    tracing::warn!(dim, sd_mult, k, trial, attempt, %error, "trial failed");
                    if attempt > self.config.retries {
                        break TrialOutcome::Failed { error, attempts: attempt };
                    }
                },
                Err(error) => return Err(error),
            }
        };
        Ok(TrialRecord { dim, sd_mult, k, trial, seed, outcome })
    }
}

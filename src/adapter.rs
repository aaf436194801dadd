use crate::{AccuracyError, KMeans, KMeansConfig, KMeansState, PointSet, PredictionSet, Result, memory::*};
use std::time::{Duration, Instant};
use rand::RngCore;

/// Wall-clock budget of a single clustering call.
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    start: Instant,
    limit: Duration,
}
impl Deadline {
    /// Start counting now.
    pub fn start(limit: Duration) -> Self {
        Self { start: Instant::now(), limit }
    }

    pub fn limit(&self) -> Duration { self.limit }
    pub fn elapsed(&self) -> Duration { self.start.elapsed() }

    /// ## Errors
    /// [`AccuracyError::ClusteringTimeout`] once the elapsed time is at least the limit.
    pub fn check(&self) -> Result<()> {
        let elapsed = self.start.elapsed();
        if elapsed >= self.limit {
            return Err(AccuracyError::ClusteringTimeout { elapsed, limit: self.limit });
        }
        Ok(())
    }
}


/// Seam between the accuracy harness and a clustering algorithm.
///
/// Implementations have to be deterministic given the passed random number generator. They must
/// not pad or otherwise repair their output: a clustering that ends up using fewer than `k`
/// labels is reported as [`AccuracyError::DegenerateClustering`].
pub trait ClusteringAdapter<T: Primitive>: Send + Sync {
    fn cluster(&self, points: &PointSet<T>, k: usize, rnd: &mut dyn RngCore) -> Result<PredictionSet>;
}


/// [`ClusteringAdapter`] running Lloyd's k-means with multiple restarts.
///
/// Every restart runs [`KMeans::kmeans_lloyd`] with the configured initialization. The restart
/// with the lowest distance sum wins, earlier restarts win ties.
///
/// ## Example
/// ```rust
/// use cluster_accuracy::*;
/// use rand::prelude::*;
///
/// let mut rnd = StdRng::seed_from_u64(7);
/// let points: PointSet<f64> = RandomClusterGenerator::new(3, 2, 0.1, SizeRange::single(20)).unwrap()
///     .generate(&mut rnd).unwrap();
///
/// let adapter = KMeansAdapter::new(KMeansConfig::build().restarts(5).build());
/// let prediction = adapter.cluster(&points, 3, &mut rnd).unwrap();
/// assert_eq!(prediction.len(), 60);
/// ```
#[derive(Debug, Default)]
pub struct KMeansAdapter<T: Primitive> {
    config: KMeansConfig<T>,
}
impl<T: Primitive> KMeansAdapter<T> {
    pub fn new(config: KMeansConfig<T>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KMeansConfig<T> { &self.config }

    /// Run all restarts and return the best final k-means state.
    ///
    /// ## Errors
    /// - [`AccuracyError::InvalidClusterCount`] if `k == 0`
    /// - [`AccuracyError::DegenerateClustering`] if there are fewer points than `k`
    /// - [`AccuracyError::ClusteringTimeout`] if the configured time limit passed
    pub fn fit(&self, points: &PointSet<T>, k: usize, rnd: &mut dyn RngCore) -> Result<KMeansState<T>> {
        if k == 0 {
            return Err(AccuracyError::InvalidClusterCount);
        }
        if points.len() < k {
            return Err(AccuracyError::DegenerateClustering { distinct: points.len(), k });
        }
        let deadline = self.config.time_limit.map(Deadline::start);
        let kmean = KMeans::new(points.samples(), points.len(), points.sample_dims())?;
        let init = self.config.init;

        let mut best: Option<KMeansState<T>> = None;
        for restart in 0..self.config.restarts {
            let state = kmean.kmeans_lloyd(k, self.config.max_iter, |km, st, rnd| init.apply(km, st, rnd),
                &self.config, rnd, deadline.as_ref())?;
            tracing::debug!(restart, distsum = %state.distsum, "k-means restart finished");
            best = match best {
                Some(prev) if prev.distsum <= state.distsum => Some(prev),
                _ => Some(state),
            };
        }
        // restarts is clamped to at least one by the config builder
        best.ok_or_else(|| AccuracyError::InvalidParameter("restarts must be at least 1".to_string()))
    }
}
impl<T: Primitive> ClusteringAdapter<T> for KMeansAdapter<T> {
    fn cluster(&self, points: &PointSet<T>, k: usize, rnd: &mut dyn RngCore) -> Result<PredictionSet> {
        let state = self.fit(points, k, rnd)?;
        PredictionSet::from_labels(state.assignments, k)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{score, KMeansInit, RandomClusterGenerator, SizeRange};
    use rand::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn well_separated(seed: u64) -> PointSet<f64> {
        let mut rnd = StdRng::seed_from_u64(seed);
        RandomClusterGenerator::new(4, 3, 0.05, SizeRange::single(25)).unwrap()
            .generate(&mut rnd).unwrap()
    }

    #[test]
    fn recovers_well_separated_clusters() {
        let points = well_separated(3);
        for init in [KMeansInit::KMeanPlusPlus, KMeansInit::RandomSample, KMeansInit::RandomPartition].iter() {
            let adapter = KMeansAdapter::new(KMeansConfig::build().init(*init).build());
            let prediction = adapter.cluster(&points, 4, &mut StdRng::seed_from_u64(11)).unwrap();
            let result = score(points.true_labels(), prediction.labels(), 4).unwrap();
            assert!(result.accuracy > 0.95, "{:?}: {}", init, result.accuracy);
        }
    }

    #[test]
    fn deterministic_for_equal_seeds() {
        let points = well_separated(5);
        let adapter = KMeansAdapter::<f64>::default();
        let a = adapter.cluster(&points, 4, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = adapter.cluster(&points, 4, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn runs_every_restart() {
        let points = well_separated(2);
        let inits = Arc::new(AtomicUsize::new(0));
        let counter = inits.clone();
        let adapter = KMeansAdapter::new(KMeansConfig::build()
            .restarts(7)
            .init_done(move |_| { counter.fetch_add(1, Ordering::Relaxed); })
            .build());
        adapter.fit(&points, 4, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(inits.load(Ordering::Relaxed), 7);
    }

    #[test]
    fn fewer_points_than_clusters() {
        let points = PointSet::new(vec![0.0f64, 1.0, 2.0], 1, vec![0, 1, 2]).unwrap();
        let adapter = KMeansAdapter::<f64>::default();
        assert_eq!(
            adapter.cluster(&points, 5, &mut StdRng::seed_from_u64(1)),
            Err(AccuracyError::DegenerateClustering { distinct: 3, k: 5 })
        );
        assert_eq!(adapter.cluster(&points, 0, &mut StdRng::seed_from_u64(1)), Err(AccuracyError::InvalidClusterCount));
    }

    #[test]
    fn identical_points_still_use_every_label() {
        // empty clusters are repaired by moving points, so only too few points can degenerate
        let points = PointSet::new(vec![1.0f32; 8], 2, vec![0, 0, 1, 1]).unwrap();
        let adapter = KMeansAdapter::new(KMeansConfig::build().restarts(1).build());
        let prediction = adapter.cluster(&points, 2, &mut StdRng::seed_from_u64(1)).unwrap();
        assert!(prediction.labels().contains(&0));
        assert!(prediction.labels().contains(&1));
    }

    #[test]
    fn zero_time_limit_times_out() {
        let points = well_separated(1);
        let adapter = KMeansAdapter::new(KMeansConfig::build().time_limit(Duration::ZERO).build());
        match adapter.cluster(&points, 4, &mut StdRng::seed_from_u64(1)) {
            Err(err @ AccuracyError::ClusteringTimeout { .. }) => assert!(err.is_trial_failure()),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn deadline() {
        assert!(Deadline::start(Duration::from_secs(3600)).check().is_ok());
        let expired = Deadline::start(Duration::ZERO);
        assert_eq!(expired.limit(), Duration::ZERO);
        assert!(expired.check().is_err());
    }
}

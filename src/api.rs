use crate::{memory::*, AbortStrategy, Deadline, Result};
use std::sync::Arc;
use std::time::Duration;
use rayon::prelude::*;
use rand::RngCore;
use serde::{Deserialize, Serialize};

pub type InitDoneCallbackFn<T> = Arc<dyn Fn(&KMeansState<T>) + Send + Sync>;
pub type IterationDoneCallbackFn<T> = Arc<dyn Fn(&KMeansState<T>, usize, T) + Send + Sync>;

/// Centroid initialization method used at the start of every k-means run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum KMeansInit {
    /// K-Mean++ [`KMeans::init_kmeanplusplus`]
    #[serde(alias = "kmeans++")]
    KMeanPlusPlus,
    /// Random-Sample (a.k.a. Forgy) [`KMeans::init_random_sample`]
    #[default]
    RandomSample,
    /// Random-Partition [`KMeans::init_random_partition`]
    RandomPartition,
}
impl KMeansInit {
    pub fn apply<T: Primitive>(&self, kmean: &KMeans<'_, T>, state: &mut KMeansState<T>, rnd: &mut dyn RngCore) {
        match self {
            KMeansInit::KMeanPlusPlus => KMeans::init_kmeanplusplus(kmean, state, rnd),
            KMeansInit::RandomSample => KMeans::init_random_sample(kmean, state, rnd),
            KMeansInit::RandomPartition => KMeans::init_random_partition(kmean, state, rnd),
        }
    }
}


/// This is a structure holding the configuration of the bundled k-means clustering: the amount of restarts,
/// the iteration cap, the initialization, the abort-strategy, an optional time limit and a couple of callbacks,
/// that can be set to get status information from a running k-means calculation.
///
/// For a more detailed information about all possible options, have a look at [`KMeansConfigBuilder`].
pub struct KMeansConfig<T: Primitive> {
    /// Callback that is called, when the initialization phase finished
    /// ## Arguments
    /// - **state**: Current [`KMeansState`] after the initialization
    pub(crate) init_done: InitDoneCallbackFn<T>,
    /// Callback that is called after each iteration
    /// ## Arguments
    /// - **state**: Current[`KMeansState`] after the iteration
    /// - **iteration_id**: Number of the current iteration
    /// - **distsum**: New distance sum (**state** contains the distsum from the previous iteration)
    pub(crate) iteration_done: IterationDoneCallbackFn<T>,
    /// The abort-strategy to use for the running calculation
    pub(crate) abort_strategy: AbortStrategy<T>,
    pub(crate) init: KMeansInit,
    pub(crate) max_iter: usize,
    pub(crate) restarts: usize,
    pub(crate) time_limit: Option<Duration>,
}
impl<T: Primitive> Default for KMeansConfig<T> {
    fn default() -> Self {
        Self {
            init_done: Arc::new(|_: &KMeansState<T>| {}),
            iteration_done: Arc::new(|_: &KMeansState<T>, _: usize, _: T| {}),
            abort_strategy: AbortStrategy::NoImprovement {
                threshold: T::from(0.0005).unwrap_or_else(T::zero)
            },
            init: KMeansInit::default(),
            max_iter: 20,
            restarts: 10,
            time_limit: None,
        }
    }
}
impl<T: Primitive> KMeansConfig<T> {
    /// Use the [`KMeansConfigBuilder`] to build a [`KMeansConfig`] instance.
    pub fn build() -> KMeansConfigBuilder<T> {
        KMeansConfigBuilder { config: KMeansConfig::default() }
    }
    pub fn init(&self) -> KMeansInit { self.init }
    pub fn max_iter(&self) -> usize { self.max_iter }
    pub fn restarts(&self) -> usize { self.restarts }
    pub fn time_limit(&self) -> Option<Duration> { self.time_limit }
}
impl<T: Primitive> std::fmt::Debug for KMeansConfig<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KMeansConfig")
            .field("abort_strategy", &self.abort_strategy)
            .field("init", &self.init)
            .field("max_iter", &self.max_iter)
            .field("restarts", &self.restarts)
            .field("time_limit", &self.time_limit)
            .finish()
    }
}

pub struct KMeansConfigBuilder<T: Primitive> {
    config: KMeansConfig<T>
}
impl<T: Primitive> KMeansConfigBuilder<T> {
    /// Set the callback that should be called after the centroid initialization, before the iteration starts.
    pub fn init_done(mut self, init_done: impl Fn(&KMeansState<T>) + Send + Sync + 'static) -> Self {
        self.config.init_done = Arc::new(init_done); self
    }
    /// Set the callback that should be called after each iteration during a running k-means calculation.
    pub fn iteration_done(mut self, iteration_done: impl Fn(&KMeansState<T>, usize, T) + Send + Sync + 'static) -> Self {
        self.config.iteration_done = Arc::new(iteration_done); self
    }
    /// Set the abort-strategy to use during a running k-means calculation. For more information,
    /// see documentation of [`AbortStrategy`].
    /// ## Default
    /// [`AbortStrategy::NoImprovement`] `{ threshold: 0.0005 }`
    pub fn abort_strategy(mut self, abort_strategy: AbortStrategy<T>) -> Self {
        self.config.abort_strategy = abort_strategy; self
    }
    /// Set the centroid initialization method.
    /// ## Default
    /// [`KMeansInit::RandomSample`]
    pub fn init(mut self, init: KMeansInit) -> Self {
        self.config.init = init; self
    }
    /// Limit the amount of iterations per run. Reaching the limit is not an error. At least one iteration is done.
    /// ## Default
    /// 20
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.config.max_iter = max_iter.max(1); self
    }
    /// Amount of independently initialized runs, the one with the lowest distance sum wins. At least one run is done.
    /// ## Default
    /// 10
    pub fn restarts(mut self, restarts: usize) -> Self {
        self.config.restarts = restarts.max(1); self
    }
    /// Wall-clock limit for all runs of one clustering together. Exceeding it fails the clustering with
    /// [`AccuracyError::ClusteringTimeout`](crate::AccuracyError::ClusteringTimeout).
    /// ## Default
    /// No limit
    pub fn time_limit(mut self, time_limit: Duration) -> Self {
        self.config.time_limit = Some(time_limit); self
    }
    /// Return the internally built configuration structure.
    pub fn build(self) -> KMeansConfig<T> { self.config }
}


/// This is the internally used data-structure, storing the current state during calculation, as
/// well as the final result, as returned by the API.
/// All mutations are done in this structure, making [`KMeans`] immutable, and therefore allowing
/// it to be used in parallel, without having to duplicate the input-data.
///
/// ## Generics
/// - **T**: Underlying primitive type that was used for the calculation
///
/// ## Fields
/// - **k**: The amount of clusters that were requested when calculating this k-means result
/// - **distsum**: The total sum of (squared) distances from all samples to their respective centroids
/// - **centroids**: Calculated cluster centers [row-major] = [<centroid0>,<centroid1>,<centroid2>,...]
/// - **centroid_frequency**: Amount of samples in each centroid
/// - **assignments**: Vector mapping each sample to its respective nearest cluster
/// - **centroid_distances**: Vector containing each sample's (squared) distance to its centroid
#[derive(Clone, Debug)]
pub struct KMeansState<T: Primitive> {
    pub k: usize,
    pub distsum: T,
    pub centroids: Vec<T>,
    pub centroid_frequency: Vec<usize>,
    pub assignments: Vec<usize>,
    pub centroid_distances: Vec<T>,

    pub(crate) sample_dims: usize
}
impl<T: Primitive> KMeansState<T> {
    pub(crate) fn new(sample_cnt: usize, sample_dims: usize, k: usize) -> Self {
        Self {
            k,
            distsum: T::zero(),
            centroids: vec![T::zero(); sample_dims * k],
            centroid_frequency: vec![0usize;k],
            assignments: vec![0usize;sample_cnt],
            centroid_distances: vec![T::infinity();sample_cnt],
            sample_dims
        }
    }
    pub(crate) fn set_centroid_from_iter(&mut self, idx: usize, src: impl Iterator<Item = T>) {
        self.centroids.iter_mut().skip(self.sample_dims * idx).take(self.sample_dims)
                .zip(src)
                .for_each(|(c,s)| *c = s);
    }
    pub fn sample_dims(&self) -> usize { self.sample_dims }
}




/// Lloyd k-means over a borrowed set of samples.
///
/// The struct itself is never mutated by a calculation, all intermediate data lives in a [`KMeansState`].
/// Multiple calculations over the same samples can therefore run in parallel.
///
/// ## Supported initialization methods
/// - K-Mean++ [`KMeans::init_kmeanplusplus`]
/// - Random-Sample [`KMeans::init_random_sample`]
/// - Random-Partition [`KMeans::init_random_partition`]
pub struct KMeans<'s, T: Primitive> {
    pub(crate) sample_cnt: usize,
    pub(crate) sample_dims: usize,
    pub(crate) samples: &'s [T]
}
impl<'s, T: Primitive> KMeans<'s, T> {
    /// Create a new instance of the [`KMeans`] structure.
    ///
    /// ## Arguments
    /// - **samples**: Slice of samples [row-major] = [<sample0>,<sample1>,<sample2>,...]
    /// - **sample_cnt**: Amount of samples, contained in the passed **samples** slice
    /// - **sample_dims**: Amount of dimensions each sample from the **samples** slice has
    ///
    /// ## Errors
    /// [`AccuracyError::DimensionMismatch`](crate::AccuracyError::DimensionMismatch) if the slice's length is not
    /// `sample_cnt * sample_dims`, or `sample_dims` is zero.
    pub fn new(samples: &'s [T], sample_cnt: usize, sample_dims: usize) -> Result<Self> {
        if sample_dims == 0 {
            return Err(crate::AccuracyError::DimensionMismatch { expected: 1, actual: 0 });
        }
        if samples.len() != sample_cnt * sample_dims {
            return Err(crate::AccuracyError::DimensionMismatch { expected: sample_cnt * sample_dims, actual: samples.len() });
        }
        Ok(Self { sample_cnt, sample_dims, samples })
    }

    #[inline(always)]
    pub(crate) fn sample(&self, idx: usize) -> &[T] {
        &self.samples[idx * self.sample_dims..(idx + 1) * self.sample_dims]
    }

    pub(crate) fn update_centroid_distances(&self, state: &mut KMeansState<T>) {
        let centroids = &state.centroids;
        let sample_dims = self.sample_dims;

        // manually calculate work-packet size, because rayon does not do static scheduling (which is more apropriate here)
        let work_packet_size = (self.sample_cnt / rayon::current_num_threads()).max(1);
        self.samples.par_chunks_exact(sample_dims)
            .with_min_len(work_packet_size)
            .zip(state.assignments.par_iter().cloned())
            .zip(state.centroid_distances.par_iter_mut())
            .for_each(|((s, assignment), centroid_dist)| {
                let centroid = &centroids[assignment * sample_dims..(assignment + 1) * sample_dims];
                *centroid_dist = squared_distance(s, centroid);
            });
    }

    pub(crate) fn update_cluster_assignments(&self, state: &mut KMeansState<T>, limit_k: Option<usize>) {
        let centroids = &state.centroids;
        let k = limit_k.unwrap_or(state.k);
        let sample_dims = self.sample_dims;

        let work_packet_size = (self.sample_cnt / rayon::current_num_threads()).max(1);
        self.samples.par_chunks_exact(sample_dims)
            .with_min_len(work_packet_size)
            .zip(state.assignments.par_iter_mut())
            .zip(state.centroid_distances.par_iter_mut())
            .for_each(|((s, assignment), centroid_dist)| {
                let (best_idx, best_dist) = centroids.chunks_exact(sample_dims).take(k)
                    .map(|c| squared_distance(s, c))
                    .enumerate()
                    .fold((0, T::infinity()), |best, (idx, dist)| if dist < best.1 { (idx, dist) } else { best });
                *assignment = best_idx;
                *centroid_dist = best_dist;
            });
    }

    pub(crate) fn update_cluster_frequencies(&self, assignments: &[usize], centroid_frequency: &mut[usize]) -> usize {
        centroid_frequency.iter_mut().for_each(|v| *v = 0);
        let mut used_centroids_cnt = 0;
        assignments.iter().cloned()
            .for_each(|centroid_id| {
                if centroid_frequency[centroid_id] == 0 {
                    used_centroids_cnt += 1; // Count the amount of centroids with more than 0 samples
                }
                centroid_frequency[centroid_id] += 1;
            });
        used_centroids_cnt
    }



    /// Normal K-Means algorithm implementation (Lloyd, one-phase).
    ///
    /// ## Arguments
    /// - **k**: Amount of clusters to search for
    /// - **max_iter**: Limit the maximum amount of iterations
    /// - **init**: Initialization-Method to use for the initialization of the **k** centroids
    /// - **config**: [`KMeansConfig`] instance, providing callbacks and the abort-strategy
    /// - **rnd**: Random number generator used by the initialization
    /// - **deadline**: Optional deadline, checked after every iteration
    ///
    /// ## Returns
    /// Instance of [`KMeansState`], containing the final state (result).
    ///
    /// ## Errors
    /// - [`AccuracyError::InvalidClusterCount`](crate::AccuracyError::InvalidClusterCount) if `k == 0`
    /// - [`AccuracyError::DegenerateClustering`](crate::AccuracyError::DegenerateClustering) if there are fewer samples than `k`
    /// - [`AccuracyError::ClusteringTimeout`](crate::AccuracyError::ClusteringTimeout) if the deadline passed
    ///
    /// ## Example
    /// ```rust
    /// use cluster_accuracy::*;
    /// use rand::prelude::*;
    ///
    /// let samples = vec![0.0f64, 0.0, 0.1, 0.1, 10.0, 10.0, 10.1, 10.1];
    /// let kmean = KMeans::new(&samples, 4, 2).unwrap();
    /// let mut rnd = StdRng::seed_from_u64(1);
    /// let result = kmean.kmeans_lloyd(2, 20, KMeans::init_kmeanplusplus, &KMeansConfig::default(), &mut rnd, None).unwrap();
    ///
    /// assert_eq!(result.assignments[0], result.assignments[1]);
    /// assert_ne!(result.assignments[1], result.assignments[2]);
    /// ```
    pub fn kmeans_lloyd<F>(&self, k: usize, max_iter: usize, init: F, config: &KMeansConfig<T>,
                rnd: &mut dyn RngCore, deadline: Option<&Deadline>) -> Result<KMeansState<T>>
                where F: FnOnce(&KMeans<'s, T>, &mut KMeansState<T>, &mut dyn RngCore) {
        crate::variants::Lloyd::calculate(self, k, max_iter, init, config, rnd, deadline)
    }

    /// K-Means++ initialization method
    ///
    /// ## Description
    /// This initialization method starts by selecting one sample as first centroid.
    /// Proceeding from there, the method iteratively selects one new centroid (per iteration) by calculating
    /// each sample's probability of "being a centroid". This probability is bigger, the farther away a sample
    /// is from its centroid. Then, one sample is randomly selected, while taking their probability of being
    /// the next centroid into account. This leads to a tendency of selecting centroids, that are far away from
    /// their currently assigned cluster's centroid.
    ///
    /// ## Note
    /// This method is not meant for direct invocation. Pass a reference to it, to [`KMeans::kmeans_lloyd`].
    pub fn init_kmeanplusplus(kmean: &KMeans<'_, T>, state: &mut KMeansState<T>, rnd: &mut dyn RngCore) {
        crate::inits::kmeanplusplus::calculate(kmean, state, rnd);
    }

    /// Random-Parition initialization method
    ///
    /// ## Description
    /// This initialization method randomly partitions the samples into k partitions, and then calculates these partion's means.
    /// These means are then used as initial clusters.
    pub fn init_random_partition(kmean: &KMeans<'_, T>, state: &mut KMeansState<T>, rnd: &mut dyn RngCore) {
        crate::inits::randompartition::calculate(kmean, state, rnd);
    }

    /// Random sample initialization method (a.k.a. Forgy)
    ///
    /// ## Description
    /// This initialization method randomly selects k centroids from the samples as initial centroids.
    ///
    /// ## Note
    /// This method is not meant for direct invocation. Pass a reference to it, to [`KMeans::kmeans_lloyd`].
    pub fn init_random_sample(kmean: &KMeans<'_, T>, state: &mut KMeansState<T>, rnd: &mut dyn RngCore) {
        crate::inits::randomsample::calculate(kmean, state, rnd);
    }
}

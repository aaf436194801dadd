//! # cluster-accuracy - API documentation
//!
//! cluster-accuracy measures how well a clustering algorithm recovers known clusters.
//!
//! ## Design target
//! Synthetic gaussian clusters with known labels are generated, clustered, and the predicted labels are
//! matched to the true ones. Because the label values of a clustering are arbitrary, the matching searches
//! the one-to-one relabeling with the most agreeing points, and accuracy is the fraction of points that
//! agree under it. Repeating this over a grid of dimensionalities and cluster spreads shows where an
//! algorithm starts to break down.
//!
//! The pipeline of a single trial is:
//! 1. [`RandomClusterGenerator`] draws centers (latin hypercube), spreads and sizes, then samples a [`PointSet`]
//! 2. a [`ClusteringAdapter`] (e.g. [`KMeansAdapter`]) produces a [`PredictionSet`]
//! 3. [`ConfusionMatrix::build`] counts true/predicted label pairs
//! 4. [`align`] finds the optimal [`LabelMapping`] in O(k³) and reports an [`AccuracyResult`]
//!
//! [`ExperimentRunner`] runs many such trials in parallel, each with its own derived seed.
//!
//! ## Supported primitive types
//! - [`f32`]
//! - [`f64`]
//!
//! ## Example
//! ```rust
//! use cluster_accuracy::*;
//! use rand::prelude::*;
//!
//! let mut rnd = StdRng::seed_from_u64(42);
//! let points: PointSet<f64> = RandomClusterGenerator::new(4, 8, 1.0, SizeRange::default()).unwrap()
//!     .generate(&mut rnd).unwrap();
//!
//! let prediction = KMeansAdapter::default().cluster(&points, 4, &mut rnd).unwrap();
//! let result = score(points.true_labels(), prediction.labels(), 4).unwrap();
//!
//! println!("Accuracy: {:.3}", result.accuracy);
//! println!("Predicted -> true: {:?}", result.mapping.as_slice());
//! ```
//!
//! ## Example (a whole experiment grid)
//! ```rust
//! use cluster_accuracy::*;
//!
//! let config = ExperimentConfig::build()
//!     .dims(vec![2, 16])
//!     .sd_mults(vec![1.0, 4.0])
//!     .cluster_counts(vec![4])
//!     .trials(3)
//!     .build();
//! let adapter = KMeansAdapter::new(KMeansConfig::build().restarts(3).build());
//! let table = ExperimentRunner::<f64, _>::new(config, adapter).unwrap().run().unwrap();
//!
//! for summary in table.summaries() {
//!     println!("dim {:>3} sd {:.1}: {:?}", summary.dim, summary.sd_mult, summary.mean_accuracy);
//! }
//! let mut csv = Vec::new();
//! table.write_csv(&mut csv).unwrap();
//! ```
//!
//! ## Short API-Overview / Description
//! Label alignment works on a [`ConfusionMatrix`] alone, so it can score any clustering. [`align_exhaustive`]
//! checks every permutation and exists to validate [`align`] for small `k`.
//!
//! Clustering is plugged in through the [`ClusteringAdapter`] trait. The provided [`KMeansAdapter`] runs
//! Lloyd's algorithm ([`KMeans::kmeans_lloyd`]) with restarts, a selectable initialization ([`KMeansInit`]),
//! an [`AbortStrategy`] and an optional time limit.
//!
//! All randomness is passed in explicitly. Given the same seed, every step produces the same result.

#[macro_use] mod helpers;
mod memory;
mod error;
mod data;
mod confusion;
pub mod alignment;
pub mod generator;
mod api;
mod variants;
mod inits;
mod abort_strategy;
mod adapter;
mod runner;

pub use abort_strategy::AbortStrategy;
pub use adapter::{ClusteringAdapter, Deadline, KMeansAdapter};
pub use alignment::{align, align_exhaustive, score, AccuracyResult, LabelMapping, Permutations};
pub use api::{InitDoneCallbackFn, IterationDoneCallbackFn, KMeans, KMeansConfig, KMeansConfigBuilder, KMeansInit, KMeansState};
pub use confusion::ConfusionMatrix;
pub use data::{ClusterSpec, PointSet, PredictionSet};
pub use error::{AccuracyError, Result};
pub use generator::{RandomClusterGenerator, SizeRange};
pub use helpers::derive_seed;
pub use memory::Primitive;
pub use runner::{CancelHandle, CellSummary, ExperimentConfig, ExperimentConfigBuilder, ExperimentRunner, ResultTable, TrialOutcome, TrialRecord};


#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    #[test]
    fn swapped_labels_scenario() {
        let result = score(&[0, 0, 0, 1, 1, 1], &[1, 1, 1, 0, 0, 0], 2).unwrap();
        assert_eq!(result.confusion.to_rows(), vec![vec![0, 3], vec![3, 0]]);
        assert_eq!(result.mapping.as_slice(), &[1, 0]);
        assert_eq!(result.accuracy, 1.0);
    }

    #[test]
    fn end_to_end_f32() {
        let mut rnd = StdRng::seed_from_u64(3);
        let points: PointSet<f32> = RandomClusterGenerator::new(3, 5, 0.2, SizeRange::single(30)).unwrap()
            .generate(&mut rnd).unwrap();
        let adapter = KMeansAdapter::new(KMeansConfig::build().init(KMeansInit::KMeanPlusPlus).build());
        let prediction = adapter.cluster(&points, 3, &mut rnd).unwrap();
        let confusion = ConfusionMatrix::build(points.true_labels(), prediction.labels(), 3).unwrap();

        let fast = align(&confusion).unwrap();
        let reference = align_exhaustive(&confusion).unwrap();
        assert_eq!(fast, reference);
        assert_eq!(confusion.total(), 90);
        assert!(fast.accuracy > 0.9);

        // relabeled predictions agree with the truth exactly where the mapping matched
        let relabeled = fast.mapping.relabel(prediction.labels()).unwrap();
        let agreeing = relabeled.iter().zip(points.true_labels()).filter(|(p, t)| p == t).count();
        assert_eq!(agreeing, fast.matched);
    }
}

//! Synthetic, labeled Gaussian point clouds.

mod lhs;

pub use lhs::latin_hypercube;

use crate::{memory::*, AccuracyError, ClusterSpec, PointSet, Result};
use rand::prelude::*;
use rand_distr::{Normal, StandardNormal};
use serde::{Deserialize, Serialize};

/// Inclusive range of cluster sizes `min, min + step, ..., <= max`, from which each cluster's size is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: usize,
    pub max: usize,
    pub step: usize,
}
impl Default for SizeRange {
    fn default() -> Self {
        Self { min: 15, max: 60, step: 5 }
    }
}
impl SizeRange {
    pub fn new(min: usize, max: usize, step: usize) -> Result<Self> {
        let range = Self { min, max, step };
        range.validate()?;
        Ok(range)
    }

    /// Range containing just `size`.
    pub fn single(size: usize) -> Self {
        Self { min: size, max: size, step: 1 }
    }

    pub fn validate(&self) -> Result<()> {
        if self.min == 0 {
            return Err(AccuracyError::InvalidParameter("cluster sizes must be positive".to_owned()));
        }
        if self.max < self.min {
            return Err(AccuracyError::InvalidParameter(format!(
                "size range max ({}) is smaller than min ({})", self.max, self.min)));
        }
        if self.step == 0 {
            return Err(AccuracyError::InvalidParameter("size range step must be positive".to_owned()));
        }
        Ok(())
    }

    /// All sizes contained in this range, in ascending order.
    pub fn choices(&self) -> Vec<usize> {
        (self.min..=self.max).step_by(self.step.max(1)).collect()
    }
}


/// Generator for `k` Gaussian clusters in `sample_dims` dimensions.
///
/// ## Description
/// - Cluster centers are a latin hypercube sample scaled by `k`, i.e. they lie in `[0, k]^sample_dims`. The expected
///   separation between centers therefore grows with the cluster count.
/// - Each cluster's spread (standard deviation) is drawn uniformly from `(0, 1]` and multiplied by `sd_mult`.
/// - Each cluster's size is drawn uniformly from the [`SizeRange`].
/// - Each coordinate of a point is drawn from `Normal(center[d], spread)`.
///
/// Points are ordered cluster-major, the true label of a point is the index of its cluster.
/// All randomness comes from the passed generator, so a seeded generator yields reproducible data.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomClusterGenerator {
    k: usize,
    sample_dims: usize,
    sd_mult: f64,
    sizes: SizeRange,
}
impl RandomClusterGenerator {
    /// ## Errors
    /// - [`AccuracyError::InvalidClusterCount`] if `k == 0`
    /// - [`AccuracyError::DimensionMismatch`] if `sample_dims == 0`
    /// - [`AccuracyError::InvalidParameter`] if `sd_mult` is not a positive finite number, or `sizes` is invalid
    pub fn new(k: usize, sample_dims: usize, sd_mult: f64, sizes: SizeRange) -> Result<Self> {
        if k == 0 {
            return Err(AccuracyError::InvalidClusterCount);
        }
        if sample_dims == 0 {
            return Err(AccuracyError::DimensionMismatch { expected: 1, actual: 0 });
        }
        if !(sd_mult.is_finite() && sd_mult > 0.0) {
            return Err(AccuracyError::InvalidParameter(format!("sd_mult must be positive, got {}", sd_mult)));
        }
        sizes.validate()?;
        Ok(Self { k, sample_dims, sd_mult, sizes })
    }

    pub fn k(&self) -> usize { self.k }
    pub fn sample_dims(&self) -> usize { self.sample_dims }
    pub fn sd_mult(&self) -> f64 { self.sd_mult }
    pub fn sizes(&self) -> SizeRange { self.sizes }

    /// Draw the ground-truth description (center, spread, size) of all clusters.
    pub fn generate_specs<T: Primitive, R: Rng + ?Sized>(&self, rnd: &mut R) -> Vec<ClusterSpec<T>> {
        let scale = T::from(self.k).unwrap_or_else(T::one);
        let sd_mult = T::from(self.sd_mult).unwrap_or_else(T::one);
        let centers: Vec<T> = latin_hypercube::<T, R>(self.k, self.sample_dims, rnd).into_iter()
            .map(|v| v * scale)
            .collect();
        let spreads: Vec<T> = (0..self.k)
            // uniform in (0, 1]
            .map(|_| (T::one() - rnd.gen_range(T::zero()..T::one())) * sd_mult)
            .collect();
        let choices = self.sizes.choices();
        let sizes: Vec<usize> = (0..self.k)
            .map(|_| choices[rnd.gen_range(0..choices.len())])
            .collect();

        centers.chunks_exact(self.sample_dims)
            .zip(spreads.into_iter())
            .zip(sizes.into_iter())
            .enumerate()
            .map(|(label, ((center, spread), size))| ClusterSpec { center: center.to_vec(), spread, size, label })
            .collect()
    }

    /// Generate a complete labeled point set.
    pub fn generate<T: Primitive, R: Rng + ?Sized>(&self, rnd: &mut R) -> Result<PointSet<T>>
                where StandardNormal: Distribution<T> {
        let specs = self.generate_specs(rnd);
        sample_points(&specs, rnd)
    }
}


/// Draw the points of the given clusters, cluster-major, labeled with each cluster's label.
///
/// ## Errors
/// - [`AccuracyError::DimensionMismatch`] if the clusters don't share one positive dimension count
/// - [`AccuracyError::InvalidParameter`] if a spread is not a positive finite number
pub fn sample_points<T: Primitive, R: Rng + ?Sized>(specs: &[ClusterSpec<T>], rnd: &mut R) -> Result<PointSet<T>>
            where StandardNormal: Distribution<T> {
    let sample_dims = specs.first().map(|s| s.sample_dims()).unwrap_or(0);
    if let Some(spec) = specs.iter().find(|s| s.sample_dims() != sample_dims) {
        return Err(AccuracyError::DimensionMismatch { expected: sample_dims, actual: spec.sample_dims() });
    }
    let sample_cnt: usize = specs.iter().map(|s| s.size).sum();
    let mut samples = Vec::with_capacity(sample_cnt * sample_dims);
    let mut labels = Vec::with_capacity(sample_cnt);
    for spec in specs.iter() {
        if !(spec.spread.is_finite() && spec.spread > T::zero()) {
            return Err(AccuracyError::InvalidParameter(
                format!("cluster {}: spread must be positive, got {}", spec.label, spec.spread)));
        }
        let normals = spec.center.iter()
            .map(|&c| Normal::new(c, spec.spread))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AccuracyError::InvalidParameter(format!("cluster {}: {}", spec.label, e)))?;
        for _ in 0..spec.size {
            samples.extend(normals.iter().map(|n| n.sample(rnd)));
            labels.push(spec.label);
        }
    }
    PointSet::new(samples, sample_dims, labels)
}

/// Generate `k` Gaussian clusters in `sample_dims` dimensions, see [`RandomClusterGenerator`].
pub fn generate<T: Primitive, R: Rng + ?Sized>(k: usize, sample_dims: usize, sd_mult: f64, sizes: SizeRange, rnd: &mut R)
            -> Result<PointSet<T>> where StandardNormal: Distribution<T> {
    RandomClusterGenerator::new(k, sample_dims, sd_mult, sizes)?.generate(rnd)
}

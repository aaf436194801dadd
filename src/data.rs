use crate::{memory::*, AccuracyError, Result};

/// Ground-truth description of a single generated cluster.
///
/// ## Fields
/// - **center**: Cluster center, one coordinate per dimension
/// - **spread**: Standard deviation used for every coordinate of this cluster's points
/// - **size**: Amount of points drawn for this cluster
/// - **label**: True label of this cluster, in `[0, k)`
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterSpec<T: Primitive> {
    pub center: Vec<T>,
    pub spread: T,
    pub size: usize,
    pub label: usize,
}
impl<T: Primitive> ClusterSpec<T> {
    pub fn sample_dims(&self) -> usize { self.center.len() }
}


/// Labeled point cloud. Coordinates are stored row-major:
/// `[<sample0>,<sample1>,<sample2>,...]`, each sample being `sample_dims` long.
#[derive(Clone, Debug, PartialEq)]
pub struct PointSet<T: Primitive> {
    samples: Vec<T>,
    sample_dims: usize,
    labels: Vec<usize>,
}
impl<T: Primitive> PointSet<T> {
    /// Create a point set from raw row-major coordinates and one true label per sample.
    ///
    /// ## Errors
    /// - [`AccuracyError::DimensionMismatch`] if `sample_dims` is zero, or the amount of coordinates
    ///   does not match `labels.len() * sample_dims`
    pub fn new(samples: Vec<T>, sample_dims: usize, labels: Vec<usize>) -> Result<Self> {
        if sample_dims == 0 {
            return Err(AccuracyError::DimensionMismatch { expected: 1, actual: 0 });
        }
        if samples.len() != labels.len() * sample_dims {
            return Err(AccuracyError::DimensionMismatch {
                expected: labels.len() * sample_dims,
                actual: samples.len(),
            });
        }
        Ok(Self { samples, sample_dims, labels })
    }

    pub fn len(&self) -> usize { self.labels.len() }
    pub fn is_empty(&self) -> bool { self.labels.is_empty() }
    pub fn sample_dims(&self) -> usize { self.sample_dims }
    pub fn samples(&self) -> &[T] { &self.samples }
    pub fn true_labels(&self) -> &[usize] { &self.labels }

    /// Coordinates of the sample at `idx`.
    pub fn point(&self, idx: usize) -> &[T] {
        &self.samples[idx * self.sample_dims..(idx + 1) * self.sample_dims]
    }

    /// Iterate over `(coordinates, true_label)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (&[T], usize)> + '_ {
        self.samples.chunks_exact(self.sample_dims).zip(self.labels.iter().cloned())
    }
}


/// Cluster assignment produced by a [`ClusteringAdapter`](crate::ClusteringAdapter).
///
/// A [`PredictionSet`] always uses every label in `[0, k)` at least once; label values themselves carry no
/// correspondence to the true labels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PredictionSet {
    labels: Vec<usize>,
    k: usize,
}
impl PredictionSet {
    /// Validate and wrap raw predicted labels.
    ///
    /// ## Errors
    /// - [`AccuracyError::InvalidClusterCount`] if `k == 0`
    /// - [`AccuracyError::LabelOutOfRange`] if any label is `>= k`
    /// - [`AccuracyError::DegenerateClustering`] if fewer than `k` distinct labels are used
    pub fn from_labels(labels: Vec<usize>, k: usize) -> Result<Self> {
        if k == 0 {
            return Err(AccuracyError::InvalidClusterCount);
        }
        let mut used = vec![false; k];
        for &label in labels.iter() {
            if label >= k {
                return Err(AccuracyError::LabelOutOfRange { label, k });
            }
            used[label] = true;
        }
        let distinct = used.iter().filter(|&&u| u).count();
        if distinct != k {
            return Err(AccuracyError::DegenerateClustering { distinct, k });
        }
        Ok(Self { labels, k })
    }

    pub fn k(&self) -> usize { self.k }
    pub fn len(&self) -> usize { self.labels.len() }
    pub fn is_empty(&self) -> bool { self.labels.is_empty() }
    pub fn labels(&self) -> &[usize] { &self.labels }
    pub fn into_labels(self) -> Vec<usize> { self.labels }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_set_layout() {
        let points = PointSet::new(vec![0.0f64, 1.0, 2.0, 3.0, 4.0, 5.0], 2, vec![0, 0, 1]).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points.point(1), &[2.0, 3.0]);
        let collected: Vec<(Vec<f64>, usize)> = points.iter().map(|(p, l)| (p.to_vec(), l)).collect();
        assert_eq!(collected[2], (vec![4.0, 5.0], 1));
    }

    #[test]
    fn point_set_rejects_bad_shapes() {
        assert_eq!(
            PointSet::new(vec![0.0f32; 5], 2, vec![0, 0, 1]),
            Err(AccuracyError::DimensionMismatch { expected: 6, actual: 5 })
        );
        assert_eq!(
            PointSet::<f64>::new(vec![], 0, vec![]),
            Err(AccuracyError::DimensionMismatch { expected: 1, actual: 0 })
        );
    }

    #[test]
    fn prediction_set_validation() {
        assert!(PredictionSet::from_labels(vec![1, 0, 2, 2], 3).is_ok());
        assert_eq!(PredictionSet::from_labels(vec![0, 1], 0), Err(AccuracyError::InvalidClusterCount));
        assert_eq!(
            PredictionSet::from_labels(vec![0, 3, 1], 3),
            Err(AccuracyError::LabelOutOfRange { label: 3, k: 3 })
        );
        assert_eq!(
            PredictionSet::from_labels(vec![0, 0, 2, 2], 3),
            Err(AccuracyError::DegenerateClustering { distinct: 2, k: 3 })
        );
    }
}

//! Optimal correspondence between predicted and true labels.
//!
//! Clustering assigns arbitrary label numbers, so a clustering is scored by the relabeling (bijection
//! predicted -> true) that maximizes the amount of points ending up with their true label. This is the
//! assignment problem on the confusion matrix, solved exactly in O(k³) by [`align`].
//!
//! When more than one relabeling reaches the optimum, the lexicographically smallest mapping
//! `(mapping(0), mapping(1), ..., mapping(k-1))` is returned. [`align_exhaustive`] enumerates all `k!`
//! mappings in lexicographic order and returns the same result; it only exists as a reference for small `k`.

mod exhaustive;
mod hungarian;

pub use exhaustive::Permutations;

use crate::{AccuracyError, ConfusionMatrix, Result};

/// Bijection from the predicted label space onto the true label space.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LabelMapping {
    pred_to_true: Vec<usize>,
}
impl LabelMapping {
    /// Wrap a permutation, where `pred_to_true[p]` is the true label predicted label `p` maps to.
    ///
    /// ## Errors
    /// - [`AccuracyError::InvalidClusterCount`] if the vector is empty
    /// - [`AccuracyError::LabelOutOfRange`] if an entry is `>= len`
    /// - [`AccuracyError::InvalidParameter`] if a true label is targeted twice
    pub fn from_vec(pred_to_true: Vec<usize>) -> Result<Self> {
        let k = pred_to_true.len();
        if k == 0 {
            return Err(AccuracyError::InvalidClusterCount);
        }
        let mut seen = vec![false; k];
        for &t in pred_to_true.iter() {
            if t >= k {
                return Err(AccuracyError::LabelOutOfRange { label: t, k });
            }
            if seen[t] {
                return Err(AccuracyError::InvalidParameter(format!("true label {} is mapped to twice", t)));
            }
            seen[t] = true;
        }
        Ok(Self { pred_to_true })
    }

    pub fn identity(k: usize) -> Self {
        Self { pred_to_true: (0..k).collect() }
    }

    pub fn k(&self) -> usize { self.pred_to_true.len() }

    /// True label the predicted label `pred_label` corresponds to.
    pub fn true_label(&self, pred_label: usize) -> usize { self.pred_to_true[pred_label] }

    pub fn as_slice(&self) -> &[usize] { &self.pred_to_true }

    /// The reverse bijection: `inverse()[t]` is the predicted label mapped onto true label `t`.
    pub fn inverse(&self) -> Vec<usize> {
        let mut true_to_pred = vec![0usize; self.k()];
        self.pred_to_true.iter().enumerate().for_each(|(p, &t)| true_to_pred[t] = p);
        true_to_pred
    }

    /// Translate predicted labels into the true label space.
    pub fn relabel(&self, pred_labels: &[usize]) -> Result<Vec<usize>> {
        let k = self.k();
        pred_labels.iter()
            .map(|&p| self.pred_to_true.get(p).cloned().ok_or(AccuracyError::LabelOutOfRange { label: p, k }))
            .collect()
    }

    /// Amount of points whose predicted label maps onto their true label.
    pub fn matched(&self, confusion: &ConfusionMatrix) -> Result<usize> {
        if confusion.k() != self.k() {
            return Err(AccuracyError::DimensionMismatch { expected: self.k(), actual: confusion.k() });
        }
        Ok(self.pred_to_true.iter().enumerate().map(|(p, &t)| confusion.get(t, p)).sum())
    }
}


/// Outcome of scoring one clustering against the ground truth.
///
/// ## Fields
/// - **mapping**: Optimal relabeling predicted -> true
/// - **accuracy**: `matched / total`, in `[0, 1]`
/// - **matched**: Amount of points carrying their true label after relabeling
/// - **total**: Amount of points
/// - **confusion**: The confusion matrix the mapping was computed from
#[derive(Clone, Debug, PartialEq)]
pub struct AccuracyResult {
    pub mapping: LabelMapping,
    pub accuracy: f64,
    pub matched: usize,
    pub total: usize,
    pub confusion: ConfusionMatrix,
}
impl AccuracyResult {
    fn from_mapping(mapping: LabelMapping, confusion: ConfusionMatrix) -> Result<Self> {
        let total = confusion.total();
        if total == 0 {
            return Err(AccuracyError::InvalidParameter("cannot score an empty confusion matrix".to_owned()));
        }
        let matched = mapping.matched(&confusion)?;
        Ok(Self {
            accuracy: matched as f64 / total as f64,
            mapping, matched, total, confusion
        })
    }
}


/// Compute the optimal relabeling for a confusion matrix, and the resulting accuracy.
///
/// Runs in O(k³). Among equally good relabelings the lexicographically smallest one is returned.
///
/// ## Errors
/// - [`AccuracyError::InvalidParameter`] if the matrix contains no points
///
/// ## Example
/// ```rust
/// use cluster_accuracy::*;
///
/// let confusion = ConfusionMatrix::build(&[0, 0, 0, 1, 1, 1], &[1, 1, 1, 0, 0, 0], 2).unwrap();
/// let result = align(&confusion).unwrap();
/// assert_eq!(result.mapping.as_slice(), &[1, 0]);
/// assert_eq!(result.accuracy, 1.0);
/// ```
pub fn align(confusion: &ConfusionMatrix) -> Result<AccuracyResult> {
    let pred_to_true = hungarian::Solution::solve(confusion).into_lexicographic_min();
    AccuracyResult::from_mapping(LabelMapping { pred_to_true }, confusion.clone())
}

/// Reference implementation of [`align`], trying every one of the `k!` relabelings.
///
/// Permutations are visited in lexicographic order and only strict improvements replace the best
/// mapping, so ties resolve exactly like [`align`]. Unusable beyond `k ≈ 10`.
pub fn align_exhaustive(confusion: &ConfusionMatrix) -> Result<AccuracyResult> {
    let mut best: Option<(usize, Vec<usize>)> = None;
    for perm in Permutations::new(confusion.k()) {
        let matched: usize = perm.iter().enumerate().map(|(p, &t)| confusion.get(t, p)).sum();
        if best.as_ref().map_or(true, |(best_matched, _)| matched > *best_matched) {
            best = Some((matched, perm));
        }
    }
    let (_, pred_to_true) = best.ok_or(AccuracyError::InvalidClusterCount)?;
    AccuracyResult::from_mapping(LabelMapping { pred_to_true }, confusion.clone())
}

/// Score predicted labels against true labels: build the confusion matrix and [`align`] it.
pub fn score(true_labels: &[usize], pred_labels: &[usize], k: usize) -> Result<AccuracyResult> {
    align(&ConfusionMatrix::build(true_labels, pred_labels, k)?)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::testing;
    use rand::prelude::*;

    #[test]
    fn swapped_two_clusters() {
        let res = score(&[0, 0, 0, 1, 1, 1], &[1, 1, 1, 0, 0, 0], 2).unwrap();
        assert_eq!(res.confusion.to_rows(), vec![vec![0, 3], vec![3, 0]]);
        assert_eq!(res.mapping.true_label(1), 0);
        assert_eq!(res.mapping.true_label(0), 1);
        assert_eq!(res.accuracy, 1.0);
        assert_eq!((res.matched, res.total), (6, 6));
    }

    #[test]
    fn single_cluster_is_always_perfect() {
        let res = score(&[0; 17], &[0; 17], 1).unwrap();
        assert_eq!(res.mapping, LabelMapping::identity(1));
        assert_eq!(res.accuracy, 1.0);
    }

    #[test]
    fn perfect_correspondence_under_any_relabeling() {
        let mut rnd = StdRng::seed_from_u64(1337);
        for k in 1..=12 {
            let truth: Vec<usize> = (0..k * 7).map(|_| rnd.gen_range(0..k)).collect();
            let predicted = testing::shuffle_labels(&mut rnd, &truth, k);
            let res = score(&truth, &predicted, k).unwrap();
            assert_eq!(res.accuracy, 1.0);
            assert_eq!(res.mapping.relabel(&predicted).unwrap(), truth);
        }
    }

    #[test]
    fn matches_exhaustive_search() {
        let mut rnd = StdRng::seed_from_u64(42);
        for k in 1..=8 {
            let rounds = if k <= 6 { 60 } else { 6 };
            for _ in 0..rounds {
                let cm = testing::random_confusion(&mut rnd, k, 3);
                let fast = align(&cm).unwrap();
                let reference = align_exhaustive(&cm).unwrap();
                assert_eq!(fast.matched, reference.matched, "k = {}, confusion = {:?}", k, cm.to_rows());
                assert_eq!(fast.mapping, reference.mapping, "k = {}, confusion = {:?}", k, cm.to_rows());
                assert_approx_eq!(fast.accuracy, reference.accuracy, 1e-12);
            }
        }
    }

    #[test]
    fn deterministic_mapping() {
        let mut rnd = StdRng::seed_from_u64(7);
        let cm = testing::random_confusion(&mut rnd, 9, 2);
        let first = align(&cm).unwrap();
        for _ in 0..10 {
            assert_eq!(align(&cm).unwrap().mapping, first.mapping);
        }
    }

    #[test]
    fn ties_resolve_to_smallest_mapping() {
        // Both mappings [0, 1] and [1, 0] match 4 points.
        let cm = ConfusionMatrix::from_rows(&[vec![2, 2], vec![2, 2]]).unwrap();
        assert_eq!(align(&cm).unwrap().mapping.as_slice(), &[0, 1]);
        let cm = ConfusionMatrix::from_rows(&[vec![0, 3, 1], vec![3, 0, 0], vec![0, 2, 3]]).unwrap();
        let res = align(&cm).unwrap();
        assert_eq!(res.matched, align_exhaustive(&cm).unwrap().matched);
        assert_eq!(res.mapping, align_exhaustive(&cm).unwrap().mapping);
    }

    #[test]
    fn large_k_stays_optimal() {
        // Block structure with known optimum; far beyond what enumeration could handle.
        let k = 64;
        let mut rnd = StdRng::seed_from_u64(99);
        let mut perm: Vec<usize> = (0..k).collect();
        perm.shuffle(&mut rnd);
        let mut rows = vec![vec![0usize; k]; k];
        for t in 0..k {
            rows[t][perm[t]] = 10;
            rows[t][(perm[t] + 1) % k] = 3;
        }
        let cm = ConfusionMatrix::from_rows(&rows).unwrap();
        let res = align(&cm).unwrap();
        assert_eq!(res.matched, 10 * k);
        for t in 0..k {
            assert_eq!(res.mapping.true_label(perm[t]), t);
        }
    }

    #[test]
    fn mapping_validation() {
        assert!(LabelMapping::from_vec(vec![2, 0, 1]).is_ok());
        assert_eq!(LabelMapping::from_vec(vec![]), Err(AccuracyError::InvalidClusterCount));
        assert_eq!(LabelMapping::from_vec(vec![0, 3, 1]), Err(AccuracyError::LabelOutOfRange { label: 3, k: 3 }));
        assert!(matches!(LabelMapping::from_vec(vec![0, 0, 1]), Err(AccuracyError::InvalidParameter(_))));
        let m = LabelMapping::from_vec(vec![2, 0, 1]).unwrap();
        assert_eq!(m.inverse(), vec![1, 2, 0]);
        assert_eq!(m.relabel(&[0, 1, 2, 2]).unwrap(), vec![2, 0, 1, 1]);
        assert_eq!(m.relabel(&[3]), Err(AccuracyError::LabelOutOfRange { label: 3, k: 3 }));
    }

    #[test]
    fn empty_matrix_is_rejected() {
        let cm = ConfusionMatrix::build(&[], &[], 3).unwrap();
        assert!(matches!(align(&cm), Err(AccuracyError::InvalidParameter(_))));
    }
}

use crate::{AccuracyError, Result};

/// k×k contingency table between true and predicted labels.
///
/// Cell `(i, j)` holds the amount of points with true label `i` that were predicted as `j`.
/// Counts are stored row-major (one row per true label).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfusionMatrix {
    k: usize,
    counts: Vec<usize>,
}
impl ConfusionMatrix {
    /// Count co-occurrences of true and predicted labels.
    ///
    /// ## Arguments
    /// - **true_labels**: Ground-truth label per point, each in `[0, k)`
    /// - **pred_labels**: Predicted label per point, each in `[0, k)`
    /// - **k**: Cardinality of both label spaces
    ///
    /// ## Errors
    /// - [`AccuracyError::InvalidClusterCount`] if `k == 0`
    /// - [`AccuracyError::DimensionMismatch`] if both sequences differ in length
    /// - [`AccuracyError::LabelOutOfRange`] if a label of either sequence is `>= k`
    pub fn build(true_labels: &[usize], pred_labels: &[usize], k: usize) -> Result<Self> {
        if k == 0 {
            return Err(AccuracyError::InvalidClusterCount);
        }
        if true_labels.len() != pred_labels.len() {
            return Err(AccuracyError::DimensionMismatch {
                expected: true_labels.len(),
                actual: pred_labels.len(),
            });
        }
        let mut counts = vec![0usize; k * k];
        for (&t, &p) in true_labels.iter().zip(pred_labels.iter()) {
            if t >= k {
                return Err(AccuracyError::LabelOutOfRange { label: t, k });
            }
            if p >= k {
                return Err(AccuracyError::LabelOutOfRange { label: p, k });
            }
            counts[t * k + p] += 1;
        }
        Ok(Self { k, counts })
    }

    /// Create a matrix from row-major counts (`rows[true][pred]`).
    pub fn from_rows(rows: &[Vec<usize>]) -> Result<Self> {
        let k = rows.len();
        if k == 0 {
            return Err(AccuracyError::InvalidClusterCount);
        }
        if let Some(row) = rows.iter().find(|r| r.len() != k) {
            return Err(AccuracyError::DimensionMismatch { expected: k, actual: row.len() });
        }
        Ok(Self { k, counts: rows.iter().flatten().cloned().collect() })
    }

    pub fn k(&self) -> usize { self.k }

    /// Amount of points with true label `true_label` that were predicted as `pred_label`.
    #[inline(always)]
    pub fn get(&self, true_label: usize, pred_label: usize) -> usize {
        self.counts[true_label * self.k + pred_label]
    }

    /// Row of counts for a single true label.
    pub fn row(&self, true_label: usize) -> &[usize] {
        &self.counts[true_label * self.k..(true_label + 1) * self.k]
    }

    /// Point count per true label.
    pub fn row_sums(&self) -> Vec<usize> {
        self.counts.chunks_exact(self.k).map(|r| r.iter().sum()).collect()
    }

    /// Point count per predicted label.
    pub fn column_sums(&self) -> Vec<usize> {
        let mut sums = vec![0usize; self.k];
        self.counts.chunks_exact(self.k)
            .for_each(|r| r.iter().zip(sums.iter_mut()).for_each(|(c, s)| *s += c));
        sums
    }

    /// Total amount of points.
    pub fn total(&self) -> usize { self.counts.iter().sum() }

    pub fn to_rows(&self) -> Vec<Vec<usize>> {
        self.counts.chunks_exact(self.k).map(|r| r.to_vec()).collect()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    #[test]
    fn swapped_labels() {
        let cm = ConfusionMatrix::build(&[0, 0, 0, 1, 1, 1], &[1, 1, 1, 0, 0, 0], 2).unwrap();
        assert_eq!(cm.to_rows(), vec![vec![0, 3], vec![3, 0]]);
        assert_eq!(cm.row_sums(), vec![3, 3]);
        assert_eq!(cm.column_sums(), vec![3, 3]);
    }

    #[test]
    fn total_equals_point_count() {
        let mut rnd = StdRng::seed_from_u64(1337);
        for k in 1..10 {
            let n = rnd.gen_range(0..200);
            let t: Vec<usize> = (0..n).map(|_| rnd.gen_range(0..k)).collect();
            let p: Vec<usize> = (0..n).map(|_| rnd.gen_range(0..k)).collect();
            let cm = ConfusionMatrix::build(&t, &p, k).unwrap();
            assert_eq!(cm.total(), n);
            for label in 0..k {
                assert_eq!(cm.row_sums()[label], t.iter().filter(|&&l| l == label).count());
                assert_eq!(cm.column_sums()[label], p.iter().filter(|&&l| l == label).count());
            }
        }
    }

    #[test]
    fn invalid_input() {
        assert_eq!(ConfusionMatrix::build(&[], &[], 0), Err(AccuracyError::InvalidClusterCount));
        assert_eq!(
            ConfusionMatrix::build(&[0, 1], &[0], 2),
            Err(AccuracyError::DimensionMismatch { expected: 2, actual: 1 })
        );
        assert_eq!(
            ConfusionMatrix::build(&[0, 2], &[0, 1], 2),
            Err(AccuracyError::LabelOutOfRange { label: 2, k: 2 })
        );
        assert_eq!(
            ConfusionMatrix::build(&[0, 1], &[5, 1], 2),
            Err(AccuracyError::LabelOutOfRange { label: 5, k: 2 })
        );
        assert_eq!(
            ConfusionMatrix::from_rows(&[vec![1, 2], vec![3]]),
            Err(AccuracyError::DimensionMismatch { expected: 2, actual: 1 })
        );
    }
}

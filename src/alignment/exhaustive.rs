/// Iterator over all permutations of `0..n` in lexicographic order.
///
/// Yields `n!` permutations, starting with the identity. Only meant for very small `n`.
pub struct Permutations {
    current: Option<Vec<usize>>,
}
impl Permutations {
    pub fn new(n: usize) -> Self {
        Self { current: Some((0..n).collect()) }
    }
}
impl Iterator for Permutations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.current.take()?;
        let mut successor = current.clone();
        if next_permutation(&mut successor) {
            self.current = Some(successor);
        }
        Some(current)
    }
}

/// Rearrange `v` into its lexicographic successor. Returns `false` (leaving `v` untouched)
/// if `v` already is the last permutation.
fn next_permutation(v: &mut [usize]) -> bool {
    if v.len() < 2 {
        return false;
    }
    // Longest non-increasing suffix starts at `pivot + 1`
    let pivot = match (0..v.len() - 1).rev().find(|&i| v[i] < v[i + 1]) {
        Some(pivot) => pivot,
        None => return false,
    };
    let successor = (pivot + 1..v.len()).rev().find(|&i| v[i] > v[pivot]).unwrap_or(pivot + 1);
    v.swap(pivot, successor);
    v[pivot + 1..].reverse();
    true
}


#[cfg(test)]
mod tests {
    use super::*;

    fn factorial(n: usize) -> usize { (1..=n).product() }

    #[test]
    fn counts() {
        for n in 0..=7 {
            assert_eq!(Permutations::new(n).count(), factorial(n));
        }
    }

    #[test]
    fn lexicographic_order() {
        let all: Vec<Vec<usize>> = Permutations::new(3).collect();
        assert_eq!(all, vec![
            vec![0, 1, 2], vec![0, 2, 1], vec![1, 0, 2],
            vec![1, 2, 0], vec![2, 0, 1], vec![2, 1, 0],
        ]);
        let big: Vec<Vec<usize>> = Permutations::new(5).collect();
        assert!(big.windows(2).all(|w| w[0] < w[1]));
    }
}

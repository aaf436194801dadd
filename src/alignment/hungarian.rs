use crate::ConfusionMatrix;
use std::collections::VecDeque;

/// Result of the primal-dual solve: an optimal assignment together with the dual potentials proving its optimality.
///
/// Rows are true labels, columns are predicted labels. The cost of assigning column `j` to row `i` is
/// `-confusion[i][j]`, so minimizing cost maximizes the matched diagonal mass.
pub(crate) struct Solution<'a> {
    confusion: &'a ConfusionMatrix,
    /// Row potentials `u[i]` (1-based, index 0 unused)
    u: Vec<i64>,
    /// Column potentials `v[j]` (1-based, index 0 unused)
    v: Vec<i64>,
    /// Row assigned to each column (0-based)
    pub(crate) assignment: Vec<usize>,
}
impl<'a> Solution<'a> {
    #[inline(always)]
    fn cost(confusion: &ConfusionMatrix, row: usize, col: usize) -> i64 {
        -(confusion.get(row, col) as i64)
    }

    /// Whether the edge (row, col) has zero reduced cost. Every optimal assignment only uses such edges.
    #[inline(always)]
    fn tight(&self, row: usize, col: usize) -> bool {
        Self::cost(self.confusion, row, col) - self.u[row + 1] - self.v[col + 1] == 0
    }

    /// Shortest augmenting path solver (Hungarian algorithm with potentials), O(k³).
    /// All arithmetic is done on integers, so tightness checks are exact.
    pub(crate) fn solve(confusion: &'a ConfusionMatrix) -> Self {
        let k = confusion.k();
        let mut u = vec![0i64; k + 1];
        let mut v = vec![0i64; k + 1];
        // p[j]: row (1-based) currently assigned to column j, 0 = free. Column 0 is a virtual start column.
        let mut p = vec![0usize; k + 1];
        let mut way = vec![0usize; k + 1];

        for i in 1..=k {
            p[0] = i;
            let mut j0 = 0usize;
            let mut minv = vec![i64::MAX; k + 1];
            let mut used = vec![false; k + 1];
            loop {
                used[j0] = true;
                let i0 = p[j0];
                let mut delta = i64::MAX;
                let mut j1 = 0usize;
                for j in 1..=k {
                    if used[j] { continue; }
                    let cur = Self::cost(confusion, i0 - 1, j - 1) - u[i0] - v[j];
                    if cur < minv[j] {
                        minv[j] = cur;
                        way[j] = j0;
                    }
                    if minv[j] < delta {
                        delta = minv[j];
                        j1 = j;
                    }
                }
                for j in 0..=k {
                    if used[j] {
                        u[p[j]] += delta;
                        v[j] -= delta;
                    } else {
                        minv[j] -= delta;
                    }
                }
                j0 = j1;
                if p[j0] == 0 {
                    break;
                }
            }
            // Flip the augmenting path
            while j0 != 0 {
                let j1 = way[j0];
                p[j0] = p[j1];
                j0 = j1;
            }
        }

        let assignment = p.iter().skip(1).map(|&row| row - 1).collect();
        Self { confusion, u, v, assignment }
    }

    /// Turn the optimal assignment into the lexicographically smallest optimal assignment
    /// (ordered by the row assigned to column 0, then column 1, ...).
    ///
    /// Columns are fixed one after another. For column `j`, the rows that could take it in some optimal
    /// assignment (agreeing with all fixed columns) are exactly the rows from which an alternating cycle of
    /// tight edges leads back to the row currently assigned to `j`. One reverse BFS per column finds all of
    /// them, the smallest is chosen and the cycle is rotated. O(k²) per column, O(k³) in total.
    pub(crate) fn into_lexicographic_min(mut self) -> Vec<usize> {
        let k = self.assignment.len();
        let mut col_of = vec![0usize; k];
        self.assignment.iter().enumerate().for_each(|(col, &row)| col_of[row] = col);

        let mut reach = vec![false; k];
        let mut next = vec![usize::MAX; k];
        let mut queue = VecDeque::with_capacity(k);
        for j in 0..k {
            let r = self.assignment[j];
            reach.iter_mut().for_each(|v| *v = false);
            reach[r] = true;
            queue.clear();
            queue.push_back(r);
            // x -> y: the column of x can take row y instead, freeing x
            while let Some(y) = queue.pop_front() {
                for x in 0..k {
                    if !reach[x] && col_of[x] > j && self.tight(y, col_of[x]) {
                        reach[x] = true;
                        next[x] = y;
                        queue.push_back(x);
                    }
                }
            }

            let best = (0..k).find(|&i| reach[i] && self.tight(i, j)).unwrap_or(r);
            if best == r {
                continue;
            }

            // Rotate the alternating cycle j -> best -> next[best] -> ... -> r
            let mut path = vec![best];
            let mut x = best;
            while x != r {
                x = next[x];
                path.push(x);
            }
            let freed_cols: Vec<usize> = path.iter().map(|&row| col_of[row]).collect();
            self.assignment[j] = best;
            col_of[best] = j;
            for (step, &col) in freed_cols.iter().enumerate().take(path.len() - 1) {
                let row = path[step + 1];
                self.assignment[col] = row;
                col_of[row] = col;
            }
        }
        self.assignment
    }
}

//! Symmetric pentadiagonal systems, as produced by a second-difference
//! smoothness penalty.

/// A symmetric matrix with non-zero entries only on the main diagonal and the
/// two diagonals below (and, by symmetry, above) it.
///
/// `sub1[i]` holds `A[i + 1][i]`, `sub2[i]` holds `A[i + 2][i]`.
#[derive(Debug, Clone)]
pub(crate) struct Pentadiagonal {
    diag: Vec<f64>,
    sub1: Vec<f64>,
    sub2: Vec<f64>,
}

impl Pentadiagonal {
    /// `lambda * D * D^T` where `D` is the `n x (n - 2)` second-difference
    /// operator with columns `[1, -2, 1]`.
    pub fn second_difference_penalty(n: usize, lambda: f64) -> Self {
        let mut out = Self {
            diag: vec![0.0; n],
            sub1: vec![0.0; n.saturating_sub(1)],
            sub2: vec![0.0; n.saturating_sub(2)],
        };
        for j in 0..n.saturating_sub(2) {
            out.diag[j] += lambda;
            out.diag[j + 1] += 4.0 * lambda;
            out.diag[j + 2] += lambda;
            out.sub1[j] -= 2.0 * lambda;
            out.sub1[j + 1] -= 2.0 * lambda;
            out.sub2[j] += lambda;
        }
        out
    }

    pub fn len(&self) -> usize {
        self.diag.len()
    }

    /// A copy of this matrix with `weights` added to the main diagonal.
    pub fn with_added_diagonal(&self, weights: &[f64]) -> Self {
        assert_eq!(weights.len(), self.len());
        let mut out = self.clone();
        for (d, w) in out.diag.iter_mut().zip(weights) {
            *d += w;
        }
        out
    }

    /// Solves `A x = rhs` through a banded Cholesky factorization.
    ///
    /// Returns `None` when a pivot is not strictly positive, i.e. the matrix is
    /// not (numerically) positive definite.
    pub fn solve(&self, rhs: &[f64]) -> Option<Vec<f64>> {
        let n = self.len();
        assert_eq!(rhs.len(), n);
        let mut l0 = vec![0.0; n];
        let mut l1 = vec![0.0; n.saturating_sub(1)];
        let mut l2 = vec![0.0; n.saturating_sub(2)];

        for i in 0..n {
            let mut pivot = self.diag[i];
            if i >= 2 {
                l2[i - 2] = self.sub2[i - 2] / l0[i - 2];
                pivot -= l2[i - 2] * l2[i - 2];
            }
            if i >= 1 {
                let mut s = self.sub1[i - 1];
                if i >= 2 {
                    s -= l2[i - 2] * l1[i - 2];
                }
                l1[i - 1] = s / l0[i - 1];
                pivot -= l1[i - 1] * l1[i - 1];
            }
            if pivot <= 0.0 || !pivot.is_finite() {
                return None;
            }
            l0[i] = pivot.sqrt();
        }

        let mut y = vec![0.0; n];
        for i in 0..n {
            let mut s = rhs[i];
            if i >= 1 {
                s -= l1[i - 1] * y[i - 1];
            }
            if i >= 2 {
                s -= l2[i - 2] * y[i - 2];
            }
            y[i] = s / l0[i];
        }

        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let mut s = y[i];
            if i + 1 < n {
                s -= l1[i] * x[i + 1];
            }
            if i + 2 < n {
                s -= l2[i] * x[i + 2];
            }
            x[i] = s / l0[i];
        }
        Some(x)
    }

    #[cfg(test)]
    fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        let n = self.len();
        let mut out = vec![0.0; n];
        for i in 0..n {
            out[i] += self.diag[i] * x[i];
            if i + 1 < n {
                out[i] += self.sub1[i] * x[i + 1];
                out[i + 1] += self.sub1[i] * x[i];
            }
            if i + 2 < n {
                out[i] += self.sub2[i] * x[i + 2];
                out[i + 2] += self.sub2[i] * x[i];
            }
        }
        out
    }
}

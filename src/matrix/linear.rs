//! Exact inversion by Gauss-Jordan elimination.

use num_rational::BigRational;
use num_traits::Zero;

use super::RationalMatrix;

impl RationalMatrix {
    /// Exact inverse, or `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<RationalMatrix> {
        let n = self.n;
        let mut a = self.clone();
        let mut inv = RationalMatrix::identity(n);

        for k in 0..n {
            // any non-zero pivot is exact; take the first one
            let pivot_row = (k..n).find(|&i| !a[(i, k)].is_zero())?;
            if pivot_row != k {
                for j in 0..n {
                    a.data.swap(k * n + j, pivot_row * n + j);
                    inv.data.swap(k * n + j, pivot_row * n + j);
                }
            }

            let pivot = a[(k, k)].clone();
            for j in 0..n {
                a[(k, j)] = &a[(k, j)] / &pivot;
                inv[(k, j)] = &inv[(k, j)] / &pivot;
            }

            for i in 0..n {
                if i == k || a[(i, k)].is_zero() {
                    continue;
                }
                let factor: BigRational = a[(i, k)].clone();
                for j in 0..n {
                    let da = &factor * &a[(k, j)];
                    a[(i, j)] -= da;
                    let di = &factor * &inv[(k, j)];
                    inv[(i, j)] -= di;
                }
            }
        }
        Some(inv)
    }
}
